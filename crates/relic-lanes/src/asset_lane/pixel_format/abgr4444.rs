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

//! 16-bit 4/4/4/4 pixels, stored little-endian.
//!
//! Reading the nibbles from the low end gives alpha, blue, green, red; the
//! output is reordered to RGBA.

/// Expands every pixel to RGBA8. `data` holds whole pixels only.
pub(super) fn decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    for px in data.chunks_exact(2) {
        let p = u16::from_le_bytes([px[0], px[1]]);
        let nibble = |shift: u16| ((p >> shift) & 0xf) as u8 * 17;
        out.extend_from_slice(&[nibble(12), nibble(8), nibble(4), nibble(0)]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order() {
        assert_eq!(decode(&0xf000u16.to_le_bytes()), [255, 0, 0, 0]);
        assert_eq!(decode(&0x0f00u16.to_le_bytes()), [0, 255, 0, 0]);
        assert_eq!(decode(&0x00f0u16.to_le_bytes()), [0, 0, 255, 0]);
        assert_eq!(decode(&0x000fu16.to_le_bytes()), [0, 0, 0, 255]);
        assert_eq!(decode(&0x8421u16.to_le_bytes()), [136, 68, 34, 17]);
    }
}
