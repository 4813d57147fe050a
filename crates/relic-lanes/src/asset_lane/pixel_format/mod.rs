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

//! Conversion of stored pixel encodings into normalized RGBA images.

mod abgr4444;
mod astc;
mod bgr565;

use image::RgbaImage;
use relic_core::{DecodeError, Result};
use std::fmt;

/// The stored pixel encodings the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Format code 7: 16-bit 5/6/5, red in the high bits.
    Bgr565,
    /// Format code 13: 16-bit 4/4/4/4, red in the high nibble.
    Abgr4444,
    /// Format code 50: ASTC with a 6x6 block footprint.
    Astc6x6,
}

impl TextureFormat {
    /// Maps a stored format code; `None` for formats this crate does not convert.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            7 => Some(Self::Bgr565),
            13 => Some(Self::Abgr4444),
            50 => Some(Self::Astc6x6),
            _ => None,
        }
    }

    /// The stored format code.
    pub fn code(self) -> i32 {
        match self {
            Self::Bgr565 => 7,
            Self::Abgr4444 => 13,
            Self::Astc6x6 => 50,
        }
    }

    /// Bytes the base image level occupies.
    pub fn data_len(self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width as usize, height as usize);
        match self {
            Self::Bgr565 | Self::Abgr4444 => w.checked_mul(h)?.checked_mul(2),
            Self::Astc6x6 => w
                .div_ceil(astc::BLOCK_DIM)
                .checked_mul(h.div_ceil(astc::BLOCK_DIM))?
                .checked_mul(astc::BLOCK_BYTES),
        }
    }

    /// Converts the base level stored in `data` to RGBA, rows top to bottom.
    ///
    /// Stored rows run bottom to top, so the result is flipped vertically.
    /// Bytes past the base level (further mip levels) are ignored.
    pub fn decode(self, data: &[u8], width: u32, height: u32) -> Result<RgbaImage> {
        let len = self.data_len(width, height).ok_or_else(|| {
            DecodeError::corrupt_length("texture", format!("{width}x{height} is too large"))
        })?;
        let base = data.get(..len).ok_or_else(|| {
            DecodeError::corrupt_length(
                "texture",
                format!(
                    "{self} {width}x{height} needs {len} bytes, found {}",
                    data.len()
                ),
            )
        })?;

        let rgba = match self {
            Self::Bgr565 => bgr565::decode(base),
            Self::Abgr4444 => abgr4444::decode(base),
            Self::Astc6x6 => astc::decode(base, width, height)?,
        };
        let mut image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            DecodeError::corrupt_length("texture", format!("{self} produced a short image"))
        })?;
        flip_vertical(&mut image);
        Ok(image)
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bgr565 => "BGR565",
            Self::Abgr4444 => "ABGR4444",
            Self::Astc6x6 => "ASTC 6x6",
        };
        f.write_str(name)
    }
}

/// Reverses the row order in place.
pub fn flip_vertical(image: &mut RgbaImage) {
    image::imageops::flip_vertical_in_place(image);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        for format in [TextureFormat::Bgr565, TextureFormat::Abgr4444, TextureFormat::Astc6x6] {
            assert_eq!(TextureFormat::from_code(format.code().into()), Some(format));
        }
        assert_eq!(TextureFormat::from_code(4), None);
        assert_eq!(TextureFormat::from_code(34), None);
    }

    #[test]
    fn test_565_scenario_red_then_green() {
        // Little-endian 0xF800, 0x07E0.
        let data = [0x00, 0xf8, 0xe0, 0x07];
        let image = TextureFormat::Bgr565.decode(&data, 2, 1).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_rows_are_flipped() {
        // Bottom row blue, top row white.
        let data = [0x1f, 0x00, 0xff, 0xff];
        let image = TextureFormat::Bgr565.decode(&data, 1, 2).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(0, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let data: Vec<u8> = (0..3 * 4 * 2).map(|i| (i * 37 % 251) as u8).collect();
        for format in [TextureFormat::Bgr565, TextureFormat::Abgr4444] {
            let image = format.decode(&data, 3, 4).unwrap();
            let again = format.decode(&data, 3, 4).unwrap();
            assert_eq!(image, again, "{format} must be deterministic");

            let mut twice = image.clone();
            flip_vertical(&mut twice);
            flip_vertical(&mut twice);
            assert_eq!(twice, image);
        }
    }

    #[test]
    fn test_short_and_long_data() {
        let err = TextureFormat::Abgr4444.decode(&[0; 7], 2, 2).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptLength { .. }), "{err}");

        // A trailing mip level is ignored.
        let image = TextureFormat::Abgr4444.decode(&[0xff; 8 + 2], 2, 2).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
    }

    #[test]
    fn test_astc_block_math() {
        assert_eq!(TextureFormat::Astc6x6.data_len(6, 6), Some(16));
        assert_eq!(TextureFormat::Astc6x6.data_len(7, 6), Some(32));
        assert_eq!(TextureFormat::Astc6x6.data_len(12, 13), Some(16 * 2 * 3));
        assert_eq!(TextureFormat::Bgr565.data_len(u32::MAX, u32::MAX), None);
    }
}
