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

//! The type table of a serialized file: one record per class present.

pub mod common_strings;
mod primitive;
mod type_tree;

pub use primitive::PrimitiveKind;
pub use type_tree::{FieldDef, NodeId, NodeKind, NodeRecord, TypeTree, ALIGN_BYTES_FLAG};

use crate::serialized::HeaderShape;
use relic_core::{ByteCursor, DecodeError, DecodeLimits, Result};

/// Class id of script-backed objects, whose records carry a script identifier.
pub const MONO_BEHAVIOUR_CLASS_ID: i32 = 114;

/// One entry of the type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSchema {
    /// Engine class id; negative for script types in older generations.
    pub class_id: i32,
    /// Whether the type was stripped at build time.
    pub stripped: bool,
    /// Index into the file's script-type list, when present.
    pub script_type_index: Option<i16>,
    /// Script identifier, for script classes only.
    pub script_id: Option<[u8; 16]>,
    /// Hash of the type layout.
    pub type_hash: [u8; 16],
    /// The field hierarchy, absent when the file was written without type trees.
    pub tree: Option<TypeTree>,
    /// Type-dependency list (newest generations only).
    pub type_dependencies: Vec<i32>,
}

impl ClassSchema {
    fn read(
        cursor: &mut ByteCursor<'_>,
        shape: HeaderShape,
        has_type_tree: bool,
        limits: &DecodeLimits,
    ) -> Result<Self> {
        let class_id = cursor.read_i32()?;
        let stripped = if shape.class_has_stripped_flag() {
            cursor.read_u8()? != 0
        } else {
            false
        };
        let script_type_index = if shape.class_has_script_index() {
            Some(cursor.read_i16()?)
        } else {
            None
        };
        let script_id = if shape.class_has_script_id(class_id) {
            Some(cursor.read_array::<16>()?)
        } else {
            None
        };
        let type_hash = cursor.read_array::<16>()?;

        let tree = if has_type_tree {
            Some(TypeTree::read(cursor, shape, limits)?)
        } else {
            None
        };

        let mut type_dependencies = Vec::new();
        if has_type_tree && shape.has_type_dependencies() {
            let count = cursor.read_i32()?;
            let count = u32::try_from(count).map_err(|_| {
                DecodeError::corrupt_length("type dependencies", format!("declared {count}"))
            })?;
            DecodeError::check_ceiling(
                "type dependencies",
                count.into(),
                limits.max_type_dependencies.into(),
            )?;
            type_dependencies.reserve(count as usize);
            for _ in 0..count {
                type_dependencies.push(cursor.read_i32()?);
            }
        }

        log::trace!(
            "class {class_id}: {} node(s), {} type dependencies",
            tree.as_ref().map_or(0, TypeTree::len),
            type_dependencies.len()
        );
        Ok(Self {
            class_id,
            stripped,
            script_type_index,
            script_id,
            type_hash,
            tree,
            type_dependencies,
        })
    }

    /// The type tree, or an error naming the class when the file has none.
    pub fn require_tree(&self) -> Result<&TypeTree> {
        self.tree.as_ref().ok_or_else(|| {
            DecodeError::schema(
                "type table",
                format!("class {} carries no type tree", self.class_id),
            )
        })
    }

    /// Name of the root type, e.g. `Texture2D`.
    pub fn type_name(&self) -> Option<&str> {
        self.tree
            .as_ref()
            .map(|tree| tree.node(tree.root()).type_name.as_str())
    }
}

/// Classes in the order they were declared; object records refer to them by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaTable {
    classes: Vec<ClassSchema>,
}

impl SchemaTable {
    /// Reads the class count and every class record.
    pub fn read(
        cursor: &mut ByteCursor<'_>,
        shape: HeaderShape,
        has_type_tree: bool,
        limits: &DecodeLimits,
    ) -> Result<Self> {
        let count = cursor.read_u32()?;
        DecodeError::check_ceiling("type table", count.into(), limits.max_classes.into())?;
        let mut classes = Vec::with_capacity(count as usize);
        for _ in 0..count {
            classes.push(ClassSchema::read(cursor, shape, has_type_tree, limits)?);
        }
        log::debug!("type table: {} class(es)", classes.len());
        Ok(Self { classes })
    }

    /// The class at a type index.
    pub fn get(&self, type_index: usize) -> Option<&ClassSchema> {
        self.classes.get(type_index)
    }

    /// The position of the first class with the given class id.
    pub fn position_of(&self, class_id: i32) -> Option<usize> {
        self.classes.iter().position(|c| c.class_id == class_id)
    }

    /// All classes in declared order.
    pub fn classes(&self) -> &[ClassSchema] {
        &self.classes
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the table declares no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
