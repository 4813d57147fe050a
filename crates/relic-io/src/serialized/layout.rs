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

//! Generation-gated layouts of the serialized file, resolved once per file.

use relic_core::{DecodeError, Result};
use std::fmt;

/// Oldest generation this decoder reads.
pub const MIN_GENERATION: u32 = 14;

/// The layout family a serialized file's generation falls into.
///
/// Every generation-dependent read asks the shape instead of comparing
/// generation numbers, so each layout can be built and tested on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeaderShape {
    /// Generation 14.
    V14,
    /// Generation 15: object records gain a stripped byte.
    V15,
    /// Generation 16: objects resolve their class through the type table.
    V16,
    /// Generations 17 and 18: compact object records.
    V17,
    /// Generations 19 and 20: type-tree nodes gain a reference hash.
    V19,
    /// Generation 21: classes carry a type-dependency list.
    V21,
    /// Generation 22 and later: 64-bit offsets throughout.
    V22,
}

impl HeaderShape {
    /// Selects the shape for a generation.
    pub fn for_generation(generation: u32) -> Result<Self> {
        Ok(match generation {
            0..=13 => {
                return Err(DecodeError::schema(
                    "serialized header",
                    format!("generation {generation} predates {MIN_GENERATION}"),
                ))
            }
            14 => Self::V14,
            15 => Self::V15,
            16 => Self::V16,
            17 | 18 => Self::V17,
            19 | 20 => Self::V19,
            21 => Self::V21,
            22 => Self::V22,
            _ => {
                log::debug!("generation {generation} read with the generation 22 layout");
                Self::V22
            }
        })
    }

    /// The header repeats its size fields as 64-bit values.
    pub fn wide_header(self) -> bool {
        self >= Self::V22
    }

    /// Class records carry a stripped flag.
    pub fn class_has_stripped_flag(self) -> bool {
        self >= Self::V16
    }

    /// Class records carry a script-type index.
    pub fn class_has_script_index(self) -> bool {
        self >= Self::V17
    }

    /// Whether a class record with this id carries a script identifier before its hash.
    pub fn class_has_script_id(self, class_id: i32) -> bool {
        if self >= Self::V16 {
            class_id == crate::schema::MONO_BEHAVIOUR_CLASS_ID
        } else {
            class_id < 0
        }
    }

    /// Width of one stored type-tree node.
    pub fn node_record_width(self) -> usize {
        if self >= Self::V19 {
            32
        } else {
            24
        }
    }

    /// Type trees are followed by a type-dependency list.
    pub fn has_type_dependencies(self) -> bool {
        self >= Self::V21
    }

    /// Object records store their data offset as 64 bits.
    pub fn wide_object_offset(self) -> bool {
        self >= Self::V22
    }

    /// Object records store the class id directly.
    pub fn object_has_class_id(self) -> bool {
        self < Self::V16
    }

    /// Object records carry a script-type index.
    pub fn object_has_script_index(self) -> bool {
        self <= Self::V16
    }

    /// Object records end with a stripped byte.
    pub fn object_has_stripped_byte(self) -> bool {
        matches!(self, Self::V15 | Self::V16)
    }

    /// The record's type id is a position in the type table rather than a class id.
    pub fn resolves_by_type_index(self) -> bool {
        self >= Self::V16
    }

    /// Width of one object directory record, alignment excluded.
    pub fn object_record_width(self) -> usize {
        let mut width = 8 + 4 + 4; // path id, byte size, type id
        width += if self.wide_object_offset() { 8 } else { 4 };
        if self.object_has_class_id() {
            width += 2;
        }
        if self.object_has_script_index() {
            width += 2;
        }
        if self.object_has_stripped_byte() {
            width += 1;
        }
        width
    }
}

impl fmt::Display for HeaderShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
