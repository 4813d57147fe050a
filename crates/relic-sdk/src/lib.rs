// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The public-facing API of the relic decoder.
//!
//! [`Decoder`] bundles the decoding limits with the two entry points most
//! consumers need: a generic decode into a [`SerializedAsset`], and the
//! texture path that ends in an RGBA image.
//!
//! A `Decoder` holds no mutable state. Containers may be decoded on as many
//! threads as needed, each with its own input buffer.

pub use relic_core::{DecodeError, DecodeLimits, Result, Value};
pub use relic_io::SerializedAsset;
pub use relic_lanes::asset_lane::{Texture, TextureFormat};

use relic_lanes::asset_lane::{AssetLoaderLane, TextureExtractorLane};

pub mod prelude {
    //! Re-exports for `use relic_sdk::prelude::*`.
    pub use crate::Decoder;
    pub use relic_core::{DecodeError, DecodeLimits, Fields, Value};
    pub use relic_io::{
        ClassSchema, Container, ContainerInfo, Dialect, FileTable, ObjectEntry, ObjectInfo,
        SerializedAsset,
    };
    pub use relic_lanes::asset_lane::{StreamedDataSource, Texture, TextureFormat};
}

/// Entry point for decoding containers.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    limits: DecodeLimits,
    textures: TextureExtractorLane,
}

impl Decoder {
    /// Creates a decoder enforcing `limits` on every count read from input.
    pub fn new(limits: DecodeLimits) -> Self {
        Self {
            limits,
            textures: TextureExtractorLane::new(limits),
        }
    }

    /// The limits in force.
    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Decodes a container and all of its objects.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<SerializedAsset<'a>> {
        SerializedAsset::decode(bytes, &self.limits)
    }

    /// Decodes a container and returns its first convertible texture.
    pub fn extract_texture(&self, bytes: &[u8]) -> Result<Texture> {
        self.textures.load(bytes)
    }

    /// Returns the first convertible texture of an already decoded asset.
    pub fn texture_of(&self, asset: &SerializedAsset<'_>) -> Result<Texture> {
        self.textures.extract(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_io::test_prelude::{
        raw_container, SerializedFileBuilder, TextureFixture, TEXTURE2D_CLASS_ID,
    };

    fn texture_container(name: &str) -> Vec<u8> {
        let mut builder = SerializedFileBuilder::new(22);
        let ty = builder.class(TEXTURE2D_CLASS_ID, TextureFixture::nodes());
        let fixture = TextureFixture::new(name, 1, 1, 13, vec![0xff, 0xff]);
        raw_container(1, &builder.object(1, ty, fixture.encode()).build())
    }

    #[test]
    fn test_decode_then_extract() {
        let decoder = Decoder::default();
        let bytes = texture_container("icon");
        let asset = decoder.decode(&bytes).unwrap();
        assert_eq!(asset.header.generation, 22);

        let texture = decoder.texture_of(&asset).unwrap();
        assert_eq!(texture.name, "icon");
        assert_eq!(texture.image.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_decoders_share_across_threads() {
        let decoder = Decoder::default();
        let inputs: Vec<Vec<u8>> = (0..4).map(|i| texture_container(&format!("t{i}"))).collect();
        let names: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|bytes| scope.spawn(|| decoder.extract_texture(bytes).map(|t| t.name)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap().unwrap())
                .collect()
        });
        assert_eq!(names, ["t0", "t1", "t2", "t3"]);
    }

    #[test]
    fn test_limits_reach_the_texture_path() {
        let decoder = Decoder::new(DecodeLimits {
            max_objects: 0,
            ..DecodeLimits::default()
        });
        assert!(matches!(
            decoder.extract_texture(&texture_container("icon")),
            Err(DecodeError::CorruptLength { .. })
        ));
    }
}
