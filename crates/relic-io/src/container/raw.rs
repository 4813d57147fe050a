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

//! The uncompressed single-stream dialect.

use relic_core::{ByteCursor, DecodeError, Result};

/// Fixed fields following the version labels of a raw container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHeader {
    /// Size of the whole container, header included.
    pub total_size: u32,
    /// Offset of the payload from the start of the container.
    pub header_size: u32,
    /// First level-count field. Unused.
    pub level_count: u32,
    /// Number of eight-byte level entries that follow.
    pub index_count: u32,
}

/// Reads the raw envelope and returns its payload window.
///
/// `cursor` must sit just after the version labels and read big-endian.
pub(crate) fn decode<'a>(cursor: &mut ByteCursor<'a>, stream_version: u32) -> Result<&'a [u8]> {
    let header = RawHeader {
        total_size: cursor.read_u32()?,
        header_size: cursor.read_u32()?,
        level_count: cursor.read_u32()?,
        index_count: cursor.read_u32()?,
    };
    log::trace!("raw header: {header:?}");

    cursor.skip((header.index_count as usize).saturating_mul(8))?;

    let mut start = header.header_size as usize;
    if stream_version >= 2 {
        cursor.skip(4)?;
    }
    if stream_version >= 3 {
        let data_header_size = cursor.read_u32()? as usize;
        start = start.checked_add(data_header_size).ok_or_else(|| {
            DecodeError::corrupt_length("raw header", "payload offset overflows")
        })?;
    }

    if start < cursor.position() {
        return Err(DecodeError::corrupt_length(
            "raw header",
            format!(
                "payload offset {start} lies inside the header ending at {}",
                cursor.position()
            ),
        ));
    }

    let end = header.total_size as usize;
    if end > cursor.len() {
        return Err(DecodeError::corrupt_length(
            "raw container",
            format!("declared {end} bytes, buffer holds {}", cursor.len()),
        ));
    }
    if end < start {
        return Err(DecodeError::corrupt_length(
            "raw container",
            format!("declared {end} bytes, payload starts at {start}"),
        ));
    }

    cursor.seek(start)?;
    cursor.read(end - start)
}
