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

//! 16-bit 5/6/5 pixels, stored little-endian with red in the top five bits.

/// Expands every pixel to opaque RGBA8. `data` holds whole pixels only.
pub(super) fn decode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 2);
    for px in data.chunks_exact(2) {
        let p = u16::from_le_bytes([px[0], px[1]]);
        let r = (p >> 11) as u8;
        let g = ((p >> 5) & 0x3f) as u8;
        let b = (p & 0x1f) as u8;
        out.extend_from_slice(&[expand5(r), expand6(g), expand5(b), 0xff]);
    }
    out
}

fn expand5(v: u8) -> u8 {
    (u16::from(v) * 255 / 31) as u8
}

fn expand6(v: u8) -> u8 {
    (u16::from(v) * 255 / 63) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_extremes() {
        assert_eq!(decode(&0xffffu16.to_le_bytes()), [255, 255, 255, 255]);
        assert_eq!(decode(&0x0000u16.to_le_bytes()), [0, 0, 0, 255]);
        assert_eq!(decode(&0x001fu16.to_le_bytes()), [0, 0, 255, 255]);
    }

    #[test]
    fn test_mid_values_scale_down() {
        assert_eq!(expand5(16), 131, "5-bit channels scale by 255/31, truncating");
        assert_eq!(expand6(32), 129, "6-bit channels scale by 255/63, truncating");
        assert_eq!(decode(&(16u16 << 11).to_le_bytes()), [131, 0, 0, 255]);
    }

    #[test]
    fn test_expansion_is_monotonic() {
        for v in 1..32u8 {
            assert!(expand5(v) > expand5(v - 1));
        }
        for v in 1..64u8 {
            assert!(expand6(v) > expand6(v - 1));
        }
    }
}
