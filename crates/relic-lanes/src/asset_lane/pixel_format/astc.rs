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

//! ASTC blocks with a 6x6 footprint.

use relic_core::{DecodeError, Result};

/// Block width and height in pixels.
pub(super) const BLOCK_DIM: usize = 6;
/// Every ASTC block is 128 bits.
pub(super) const BLOCK_BYTES: usize = 16;

/// Decompresses the blocks covering a `width` x `height` image to RGBA8.
pub(super) fn decode(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    let mut pixels = vec![0u32; w * h];
    if !pixels.is_empty() {
        texture2ddecoder::decode_astc(data, w, h, BLOCK_DIM, BLOCK_DIM, &mut pixels)
            .map_err(|e| DecodeError::corrupt_length("astc blocks", e.to_string()))?;
    }

    // The decoder packs each pixel as 0xAARRGGBB.
    let mut out = Vec::with_capacity(pixels.len() * 4);
    for px in pixels {
        let [b, g, r, a] = px.to_le_bytes();
        out.extend_from_slice(&[r, g, b, a]);
    }
    Ok(out)
}
