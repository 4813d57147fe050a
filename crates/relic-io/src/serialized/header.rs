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

use super::layout::HeaderShape;
use relic_core::{ByteCursor, Endian, Result};

/// The fixed header and metadata preamble of a serialized file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedHeader {
    /// Size of the metadata section (type table and object directory).
    pub metadata_size: u64,
    /// Size of the whole file.
    pub file_size: u64,
    /// Format generation.
    pub generation: u32,
    /// Offset of the object data section from the start of the stream.
    pub data_offset: u64,
    /// Byte order of the metadata and the object data.
    pub endian: Endian,
    /// Layout family selected by the generation.
    pub shape: HeaderShape,
    /// Engine version that wrote the file.
    pub engine_version: String,
    /// Target platform code.
    pub target_platform: u32,
    /// Whether class records carry type trees.
    pub has_type_tree: bool,
}

impl SerializedHeader {
    /// Reads the header from the start of the primary stream and switches the
    /// cursor to the metadata byte order.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        cursor.set_endian(Endian::Big);
        let mut metadata_size = u64::from(cursor.read_u32()?);
        let mut file_size = u64::from(cursor.read_u32()?);
        let generation = cursor.read_u32()?;
        let mut data_offset = u64::from(cursor.read_u32()?);
        let shape = HeaderShape::for_generation(generation)?;

        let endian = if cursor.read_u8()? == 0 {
            Endian::Little
        } else {
            Endian::Big
        };
        cursor.skip(3)?;

        if shape.wide_header() {
            metadata_size = u64::from(cursor.read_u32()?);
            file_size = cursor.read_u64()?;
            data_offset = cursor.read_u64()?;
            cursor.skip(8)?;
        }

        cursor.set_endian(endian);
        let engine_version = cursor.read_cstring_lossy()?;
        let target_platform = cursor.read_u32()?;
        let has_type_tree = cursor.read_u8()? != 0;

        let header = Self {
            metadata_size,
            file_size,
            generation,
            data_offset,
            endian,
            shape,
            engine_version,
            target_platform,
            has_type_tree,
        };
        log::debug!(
            "serialized file: generation {} ({}), {:?}, engine {}, data at {:#x}",
            header.generation,
            header.shape,
            header.endian,
            header.engine_version,
            header.data_offset
        );
        Ok(header)
    }
}
