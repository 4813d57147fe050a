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

//! Texture extraction from decoded objects.

use super::pixel_format::TextureFormat;
use super::streamed::{StreamedDataSource, StreamingInfo};
use super::AssetLoaderLane;
use image::RgbaImage;
use relic_core::{DecodeError, DecodeLimits, Result, Value};
use relic_io::{ObjectEntry, SerializedAsset};

/// Field holding inline pixel data; its presence marks an object as a texture.
pub const IMAGE_DATA_FIELD: &str = "image data";
/// Field describing pixel data stored in another file.
pub const STREAM_DATA_FIELD: &str = "m_StreamData";

/// A texture converted to RGBA, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// The texture object's `m_Name`, empty when absent.
    pub name: String,
    /// Path id of the source object.
    pub path_id: i64,
    /// Stored pixel format.
    pub format: TextureFormat,
    /// The converted pixels.
    pub image: RgbaImage,
}

/// A lane dedicated to pulling the first convertible texture out of a container.
#[derive(Debug, Clone, Default)]
pub struct TextureExtractorLane {
    limits: DecodeLimits,
}

impl TextureExtractorLane {
    /// Creates a lane that decodes containers under `limits`.
    pub fn new(limits: DecodeLimits) -> Self {
        Self { limits }
    }

    /// Extracts the first texture with a supported format from a decoded asset.
    ///
    /// Streamed pixel data resolves against the bundle's file table; raw
    /// containers have none.
    pub fn extract(&self, asset: &SerializedAsset<'_>) -> Result<Texture> {
        let source = asset
            .file_table()
            .map(|table| table as &dyn StreamedDataSource);
        extract_texture(&asset.objects, source)
    }
}

impl AssetLoaderLane<Texture> for TextureExtractorLane {
    fn load(&self, bytes: &[u8]) -> Result<Texture> {
        let asset = SerializedAsset::decode(bytes, &self.limits)?;
        self.extract(&asset)
    }
}

/// Scans `objects` in order and converts the first texture whose format is supported.
///
/// Candidates without pixel data or with an unsupported format are skipped.
/// Only running out of candidates is an error.
pub fn extract_texture(
    objects: &[ObjectEntry],
    streamed: Option<&dyn StreamedDataSource>,
) -> Result<Texture> {
    let mut candidates = 0;
    for entry in objects {
        let value = &entry.value;
        if !value.contains_field(IMAGE_DATA_FIELD) {
            continue;
        }
        candidates += 1;

        let Some(data) = pixel_data(entry, streamed)? else {
            continue;
        };

        let width = dimension(value, "m_Width")?;
        let height = dimension(value, "m_Height")?;
        let code = value
            .get("m_TextureFormat")
            .and_then(Value::as_i64)
            .ok_or_else(|| missing_field(entry, "m_TextureFormat"))?;
        let Some(format) = TextureFormat::from_code(code) else {
            log::warn!(
                "texture {} uses unsupported format {code}; skipping",
                entry.info.path_id
            );
            continue;
        };

        let image = format.decode(data, width, height)?;
        let name = value
            .get("m_Name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        log::debug!(
            "extracted texture {:?} ({}), {width}x{height} {format}",
            name,
            entry.info.path_id
        );
        return Ok(Texture {
            name,
            path_id: entry.info.path_id,
            format,
            image,
        });
    }
    Err(DecodeError::UnsupportedPixelFormat { candidates })
}

/// The inline pixels, else the streamed ones, else `None`.
fn pixel_data<'a>(
    entry: &'a ObjectEntry,
    streamed: Option<&'a dyn StreamedDataSource>,
) -> Result<Option<&'a [u8]>> {
    let value = &entry.value;
    let inline = value
        .get(IMAGE_DATA_FIELD)
        .and_then(Value::as_bytes)
        .unwrap_or_default();
    if !inline.is_empty() {
        return Ok(Some(inline));
    }

    let Some(info) = value
        .get(STREAM_DATA_FIELD)
        .and_then(StreamingInfo::from_value)
        .filter(StreamingInfo::is_set)
    else {
        log::debug!("texture {} has no pixel data", entry.info.path_id);
        return Ok(None);
    };
    let Some(source) = streamed else {
        log::warn!(
            "texture {} streams from {:?}, which a raw container cannot supply; skipping",
            entry.info.path_id,
            info.path
        );
        return Ok(None);
    };

    let data = info.resolve(source)?;
    Ok((!data.is_empty()).then_some(data))
}

fn dimension(value: &Value, field: &'static str) -> Result<u32> {
    value
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            DecodeError::schema(
                "texture",
                format!("{field} is missing or not a valid dimension"),
            )
        })
}

fn missing_field(entry: &ObjectEntry, field: &str) -> DecodeError {
    DecodeError::schema(
        "texture",
        format!("object {} has no integer {field}", entry.info.path_id),
    )
}
