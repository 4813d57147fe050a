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

//! Storage-block and header codecs.

use relic_core::{CompressionSite, DecodeError, Result};
use std::borrow::Cow;

/// Low bits of a flag word that select the codec.
pub const CODEC_MASK: u32 = 0x3f;

/// The codec table shared by bundle headers and storage blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionCodec {
    /// Stored as is.
    None,
    /// LZMA. Recognised but not decoded.
    Lzma,
    /// LZ4 raw block.
    Lz4,
    /// LZ4 high-compression; same block format as [`CompressionCodec::Lz4`].
    Lz4Hc,
    /// LZHAM. Recognised but not decoded.
    Lzham,
}

impl CompressionCodec {
    /// Selects the codec named by the low six bits of `flags`.
    ///
    /// Returns the raw code when it is outside the table.
    pub fn from_flags(flags: u32) -> std::result::Result<Self, u32> {
        match flags & CODEC_MASK {
            0 => Ok(Self::None),
            1 => Ok(Self::Lzma),
            2 => Ok(Self::Lz4),
            3 => Ok(Self::Lz4Hc),
            4 => Ok(Self::Lzham),
            other => Err(other),
        }
    }

    /// The code written in a flag word.
    pub fn code(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Lzma => 1,
            Self::Lz4 => 2,
            Self::Lz4Hc => 3,
            Self::Lzham => 4,
        }
    }

    /// Whether this decoder can expand payloads in this codec.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::None | Self::Lz4 | Self::Lz4Hc)
    }
}

/// Expands `input` according to the codec in `flags`.
///
/// The result must be exactly `size` bytes long. Stored payloads are
/// returned borrowed.
pub fn decompress(
    flags: u32,
    input: &[u8],
    size: usize,
    site: CompressionSite,
) -> Result<Cow<'_, [u8]>> {
    let codec = CompressionCodec::from_flags(flags)
        .ok()
        .filter(|codec| codec.is_supported())
        .ok_or(DecodeError::UnsupportedCompressionCodec {
            codec: flags & CODEC_MASK,
            site,
        })?;

    let output = match codec {
        CompressionCodec::None => Cow::Borrowed(input),
        _ => {
            // The stored block has no size prefix, so the target size is
            // handed to the decompressor explicitly.
            let expanded = lz4_flex::block::decompress(input, size).map_err(|e| {
                DecodeError::corrupt_length("lz4 block", format!("{site}: {e}"))
            })?;
            Cow::Owned(expanded)
        }
    };

    if output.len() != size {
        return Err(DecodeError::corrupt_length(
            "decompressed payload",
            format!("{site}: declared {size} bytes, produced {}", output.len()),
        ));
    }
    log::trace!("{site}: {:?} {} -> {} bytes", codec, input.len(), size);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_table() {
        assert_eq!(CompressionCodec::from_flags(0x43), Ok(CompressionCodec::Lz4Hc));
        assert_eq!(CompressionCodec::from_flags(0x80), Ok(CompressionCodec::None));
        assert_eq!(CompressionCodec::from_flags(9), Err(9));
        assert!(!CompressionCodec::Lzma.is_supported());
        assert!(CompressionCodec::Lz4.is_supported());
    }

    #[test]
    fn test_stored_payload_is_borrowed() {
        let data = [1u8, 2, 3];
        let out = decompress(0, &data, 3, CompressionSite::Header).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, &data);
    }

    #[test]
    fn test_lz4_roundtrip_and_size_check() {
        let plain = b"texture texture texture texture".repeat(8);
        let packed = lz4_flex::block::compress(&plain);

        let out = decompress(2, &packed, plain.len(), CompressionSite::Block(0)).unwrap();
        assert_eq!(&*out, plain.as_slice());

        let err = decompress(3, &packed, plain.len() + 1, CompressionSite::Block(1)).unwrap_err();
        assert!(
            matches!(err, DecodeError::CorruptLength { .. }),
            "a size mismatch must be reported as a corrupt length, got {err}"
        );
    }

    #[test]
    fn test_stored_size_mismatch() {
        let err = decompress(0, &[0u8; 4], 5, CompressionSite::Header).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptLength { .. }));
    }

    #[test]
    fn test_unsupported_codecs_name_their_site() {
        for flags in [1u32, 4, 0x3f] {
            let err = decompress(flags, &[], 0, CompressionSite::Block(2)).unwrap_err();
            match err {
                DecodeError::UnsupportedCompressionCodec { codec, site } => {
                    assert_eq!(codec, flags);
                    assert_eq!(site, CompressionSite::Block(2));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }
}
