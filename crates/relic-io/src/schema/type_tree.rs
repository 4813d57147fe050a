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

//! Type trees: the per-class field-definition hierarchy.
//!
//! On disk a type tree is a flat, pre-order list of node records where each
//! record's nesting level says where it hangs. [`TypeTree::build`] turns that
//! list into an arena of [`FieldDef`]s and resolves every node once into a
//! [`NodeKind`], so the object decoder never compares type names again.

use super::common_strings::{self, COMMON_STRING_FLAG};
use super::primitive::PrimitiveKind;
use crate::serialized::HeaderShape;
use relic_core::{ByteCursor, DecodeError, DecodeLimits, Result};

/// Meta flag: realign the stream to four bytes after this field.
pub const ALIGN_BYTES_FLAG: u32 = 0x4000;

/// Index of a node within its [`TypeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A type-tree node as stored, before the hierarchy is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    /// Per-node format version.
    pub version: u16,
    /// Nesting depth; roots are at zero.
    pub level: u8,
    /// Whether the node is an array (length + element template).
    pub is_array: bool,
    /// Declared type name.
    pub type_name: String,
    /// Field name.
    pub name: String,
    /// Fixed byte size, or `None` when the size follows from the children.
    pub size: Option<u32>,
    /// Pre-order index.
    pub index: i32,
    /// Meta flags.
    pub flags: u32,
}

/// How a node decodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf with a fixed size.
    Scalar(PrimitiveKind),
    /// A length followed by that many elements.
    Array {
        /// Child holding the element count.
        length: NodeId,
        /// Child describing each element.
        element: NodeId,
    },
    /// Named children decoded in order.
    Record {
        /// Decodes as its single child's value instead of a one-entry mapping.
        collapse_string: bool,
    },
}

/// A field definition within a type tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name.
    pub name: String,
    /// Declared type name.
    pub type_name: String,
    /// Fixed byte size, or `None` when derived from the children.
    pub size: Option<u32>,
    /// Meta flags.
    pub flags: u32,
    /// Nesting depth.
    pub level: u8,
    /// Pre-order index as stored.
    pub index: i32,
    /// Whether the record marked this node as an array.
    pub is_array: bool,
    /// Children in declared order.
    pub children: Vec<NodeId>,
    /// Resolved decoding behaviour.
    pub kind: NodeKind,
}

impl FieldDef {
    /// Whether the stream realigns to four bytes after this field.
    pub fn aligns_after(&self) -> bool {
        self.flags & ALIGN_BYTES_FLAG != 0
    }
}

/// One class's field hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTree {
    nodes: Vec<FieldDef>,
    root: NodeId,
}

impl TypeTree {
    /// Reads a type-tree blob: node count, string-table size, the node
    /// records, then the string table.
    pub fn read(
        cursor: &mut ByteCursor<'_>,
        shape: HeaderShape,
        limits: &DecodeLimits,
    ) -> Result<Self> {
        let node_count = cursor.read_i32()?;
        let strings_len = cursor.read_i32()?;
        if node_count < 0 || strings_len < 0 {
            return Err(DecodeError::corrupt_length(
                "type tree",
                format!("negative node count {node_count} or string table size {strings_len}"),
            ));
        }
        DecodeError::check_ceiling(
            "type tree nodes",
            node_count as u64,
            limits.max_attributes.into(),
        )?;

        let width = shape.node_record_width();
        let record_bytes = cursor.read(node_count as usize * width)?;
        let strings = cursor.read(strings_len as usize)?;

        let mut records = Vec::with_capacity(node_count as usize);
        let mut rc = ByteCursor::with_endian(record_bytes, cursor.endian());
        for _ in 0..node_count {
            let start = rc.position();
            let version = rc.read_u16()?;
            let level = rc.read_u8()?;
            let is_array = rc.read_u8()? != 0;
            let type_offset = rc.read_u32()?;
            let name_offset = rc.read_u32()?;
            let size = rc.read_i32()?;
            let index = rc.read_i32()?;
            let flags = rc.read_u32()?;
            // Trailing fields of wider records (reference type hash) are unused.
            rc.seek(start + width)?;

            records.push(NodeRecord {
                version,
                level,
                is_array,
                type_name: lookup_string(strings, type_offset)?,
                name: lookup_string(strings, name_offset)?,
                size: u32::try_from(size).ok(),
                index,
                flags,
            });
        }
        Self::build(records, limits)
    }

    /// Rebuilds the hierarchy from pre-order records.
    ///
    /// Several level-zero records are kept as siblings under an implicit,
    /// unnamed root.
    pub fn build(records: Vec<NodeRecord>, limits: &DecodeLimits) -> Result<Self> {
        let mut nodes: Vec<FieldDef> = Vec::with_capacity(records.len() + 1);
        let mut roots = Vec::new();
        // stack[level] is the most recent node emitted at that level.
        let mut stack: Vec<NodeId> = Vec::new();

        for record in records {
            let level = record.level as usize;
            if record.level > limits.max_nesting {
                return Err(DecodeError::schema(
                    "type tree",
                    format!(
                        "node {:?} nests at level {level}, ceiling {}",
                        record.name, limits.max_nesting
                    ),
                ));
            }
            if level > stack.len() {
                return Err(DecodeError::schema(
                    "type tree",
                    format!(
                        "node {:?} at level {level} has no parent at level {}",
                        record.name,
                        level - 1
                    ),
                ));
            }

            let id = NodeId(nodes.len() as u32);
            stack.truncate(level);
            match stack.last() {
                Some(parent) => nodes[parent.index()].children.push(id),
                None => roots.push(id),
            }
            stack.push(id);

            nodes.push(FieldDef {
                name: record.name,
                type_name: record.type_name,
                size: record.size,
                flags: record.flags,
                level: record.level,
                index: record.index,
                is_array: record.is_array,
                children: Vec::new(),
                kind: NodeKind::Record {
                    collapse_string: false,
                },
            });
        }

        let root = match roots.as_slice() {
            [] => return Err(DecodeError::schema("type tree", "no nodes")),
            [single] => *single,
            _ => {
                log::warn!(
                    "type tree has {} root fields; grouping them under an implicit root",
                    roots.len()
                );
                let id = NodeId(nodes.len() as u32);
                nodes.push(FieldDef {
                    name: String::new(),
                    type_name: String::new(),
                    size: None,
                    flags: 0,
                    level: 0,
                    index: -1,
                    is_array: false,
                    children: roots,
                    kind: NodeKind::Record {
                        collapse_string: false,
                    },
                });
                id
            }
        };

        // Children always follow their parent, so resolving back to front
        // sees every child's kind before its parent's.
        for i in (0..nodes.len()).rev() {
            let kind = resolve_kind(&nodes, &nodes[i])?;
            nodes[i].kind = kind;
        }

        Ok(Self { nodes, root })
    }

    /// The top-level field.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Looks up a node.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &FieldDef {
        &self.nodes[id.index()]
    }

    /// All nodes; the implicit root, if any, comes last.
    pub fn nodes(&self) -> &[FieldDef] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. Always false for a built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn resolve_kind(nodes: &[FieldDef], field: &FieldDef) -> Result<NodeKind> {
    if field.is_array {
        let [length, element] = field.children[..] else {
            return Err(DecodeError::schema(
                "type tree",
                format!(
                    "array {:?} has {} children, expected length and element",
                    field.name,
                    field.children.len()
                ),
            ));
        };
        match nodes[length.index()].kind {
            NodeKind::Scalar(kind) if kind.is_integer() => {}
            _ => {
                return Err(DecodeError::schema(
                    "type tree",
                    format!("length of array {:?} is not an integer", field.name),
                ))
            }
        }
        return Ok(NodeKind::Array { length, element });
    }

    if !field.children.is_empty() {
        return Ok(NodeKind::Record {
            collapse_string: field.children.len() == 1 && field.type_name == "string",
        });
    }

    let size = field.size.ok_or_else(|| {
        DecodeError::schema(
            "type tree",
            format!("leaf {:?} of type {:?} has no fixed size", field.name, field.type_name),
        )
    })?;
    Ok(NodeKind::Scalar(PrimitiveKind::classify(&field.type_name, size)))
}

fn lookup_string(local: &[u8], offset: u32) -> Result<String> {
    if offset & COMMON_STRING_FLAG != 0 {
        let masked = offset & !COMMON_STRING_FLAG;
        return common_strings::resolve(masked)
            .map(str::to_owned)
            .ok_or_else(|| {
                DecodeError::schema(
                    "type tree strings",
                    format!("no well-known string at offset {masked}"),
                )
            });
    }

    let rest = local.get(offset as usize..).ok_or_else(|| {
        DecodeError::schema(
            "type tree strings",
            format!("offset {offset} past string table of {} bytes", local.len()),
        )
    })?;
    let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
    Ok(String::from_utf8_lossy(&rest[..end]).into_owned())
}
