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

//! Ceilings on counts and sizes read from untrusted input.

use serde::Deserialize;

/// Sanity ceilings applied to counts read from untrusted input before they are
/// used to size allocations or drive loops.
///
/// Every field has a default, so a configuration file only needs to name the
/// ceilings it wants to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// Storage blocks in a bundle's block table.
    pub max_blocks: u32,
    /// Named file nodes in a bundle's directory.
    pub max_file_nodes: u32,
    /// Sum of the declared uncompressed sizes of all storage blocks, in bytes.
    pub max_block_data: u64,
    /// Declared uncompressed size of a bundle's block-info header, in bytes.
    pub max_header_size: u32,
    /// Class records in a serialized file's type table.
    pub max_classes: u32,
    /// Attribute records in one class's type tree.
    pub max_attributes: u32,
    /// Deepest nesting level accepted in a type tree.
    pub max_nesting: u8,
    /// Records in the object directory.
    pub max_objects: u32,
    /// Elements in a single decoded array.
    pub max_array_len: u64,
    /// Values produced while decoding one object, counting every array
    /// element and record field. Byte buffers count once.
    pub max_values: u64,
    /// Entries in a class's type-dependency list.
    pub max_type_dependencies: u32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_blocks: 4096,
            max_file_nodes: 4096,
            max_block_data: 1 << 30,
            max_header_size: 64 << 20,
            max_classes: 4096,
            max_attributes: 65_536,
            max_nesting: 64,
            max_objects: 1 << 20,
            max_array_len: 10_000_000,
            max_values: 1 << 22,
            max_type_dependencies: 65_536,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let limits: DecodeLimits = toml::from_str("max_objects = 16\nmax_nesting = 8\n").unwrap();
        assert_eq!(limits.max_objects, 16);
        assert_eq!(limits.max_nesting, 8);
        assert_eq!(limits.max_array_len, DecodeLimits::default().max_array_len);
    }
}
