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

//! The serialized file inside a container: header, type table, object
//! directory and object data.

mod header;
mod layout;

pub use header::SerializedHeader;
pub use layout::{HeaderShape, MIN_GENERATION};

use crate::container::{Container, FileTable};
use crate::object::ObjectDecoder;
use crate::schema::SchemaTable;
use relic_core::{ByteCursor, DecodeError, DecodeLimits, Result, Value};

/// One object directory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Per-file unique object id.
    pub path_id: i64,
    /// Offset of the object's data, relative to the data section.
    pub byte_start: u64,
    /// Declared size of the object's data.
    pub byte_size: u32,
    /// The stored type reference: a type-table position or, in older
    /// generations, a class id.
    pub type_id: i32,
    /// Position of the object's class in the type table.
    pub type_index: usize,
    /// The object's class id.
    pub class_id: i32,
}

/// A decoded object with its directory record.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    /// Where the object came from.
    pub info: ObjectInfo,
    /// The decoded field tree.
    pub value: Value,
}

/// A fully decoded container.
///
/// Everything is produced in one pass by [`SerializedAsset::decode`] and is
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct SerializedAsset<'a> {
    /// The unwrapped envelope, including the bundle file table when present.
    pub container: Container<'a>,
    /// The serialized file's header.
    pub header: SerializedHeader,
    /// Type table, indexed by type position.
    pub schema: SchemaTable,
    /// Decoded objects in directory order.
    pub objects: Vec<ObjectEntry>,
}

impl<'a> SerializedAsset<'a> {
    /// Decodes a container and every object in its primary stream.
    pub fn decode(bytes: &'a [u8], limits: &DecodeLimits) -> Result<Self> {
        let container = Container::decode(bytes, limits)?;
        let (header, schema, objects) = decode_stream(container.primary(), limits)?;
        Ok(Self {
            container,
            header,
            schema,
            objects,
        })
    }

    /// The bundle's named-file table; `None` for raw containers.
    pub fn file_table(&self) -> Option<&FileTable> {
        self.container.file_table()
    }

    /// Decoded objects whose class has the given root type name.
    pub fn objects_of_type<'s>(
        &'s self,
        type_name: &'s str,
    ) -> impl Iterator<Item = &'s ObjectEntry> + 's {
        self.objects.iter().filter(move |entry| {
            self.schema
                .get(entry.info.type_index)
                .and_then(|class| class.type_name())
                == Some(type_name)
        })
    }
}

fn decode_stream(
    stream: &[u8],
    limits: &DecodeLimits,
) -> Result<(SerializedHeader, SchemaTable, Vec<ObjectEntry>)> {
    let mut cursor = ByteCursor::new(stream);
    let header = SerializedHeader::read(&mut cursor)?;
    let schema = SchemaTable::read(&mut cursor, header.shape, header.has_type_tree, limits)?;
    let directory = read_directory(&mut cursor, &header, &schema, limits)?;

    let mut objects = Vec::with_capacity(directory.len());
    for info in directory {
        let tree = schema
            .get(info.type_index)
            .ok_or_else(|| unknown_type(&info))?
            .require_tree()?;
        let start = header
            .data_offset
            .checked_add(info.byte_start)
            .and_then(|start| usize::try_from(start).ok())
            .ok_or_else(|| {
                DecodeError::corrupt_length(
                    "object directory",
                    format!("object {} starts past addressable memory", info.path_id),
                )
            })?;

        // Each object reads from its own seek; the directory has already
        // been consumed.
        let mut object_cursor = cursor.clone();
        object_cursor.seek(start)?;
        let value = ObjectDecoder::new(tree, limits).decode(&mut object_cursor)?;

        let consumed = object_cursor.position() - start;
        if consumed != info.byte_size as usize {
            log::debug!(
                "object {} consumed {consumed} bytes, directory declares {}",
                info.path_id,
                info.byte_size
            );
        }
        objects.push(ObjectEntry { info, value });
    }
    log::debug!("decoded {} object(s)", objects.len());
    Ok((header, schema, objects))
}

fn read_directory(
    cursor: &mut ByteCursor<'_>,
    header: &SerializedHeader,
    schema: &SchemaTable,
    limits: &DecodeLimits,
) -> Result<Vec<ObjectInfo>> {
    let shape = header.shape;
    let count = cursor.read_u32()?;
    DecodeError::check_ceiling("object directory", count.into(), limits.max_objects.into())?;

    let mut objects = Vec::with_capacity(count as usize);
    for _ in 0..count {
        cursor.align(4)?;
        let path_id = cursor.read_i64()?;
        let byte_start = if shape.wide_object_offset() {
            cursor.read_u64()?
        } else {
            u64::from(cursor.read_u32()?)
        };
        let byte_size = cursor.read_u32()?;
        let type_id = cursor.read_i32()?;
        let stored_class_id = if shape.object_has_class_id() {
            Some(cursor.read_u16()?)
        } else {
            None
        };
        if shape.object_has_script_index() {
            cursor.skip(2)?;
        }
        if shape.object_has_stripped_byte() {
            cursor.skip(1)?;
        }

        let type_index = if shape.resolves_by_type_index() {
            usize::try_from(type_id)
                .ok()
                .filter(|&index| index < schema.len())
        } else {
            schema
                .position_of(type_id)
                .or_else(|| stored_class_id.and_then(|id| schema.position_of(id.into())))
        };

        let mut info = ObjectInfo {
            path_id,
            byte_start,
            byte_size,
            type_id,
            type_index: 0,
            class_id: 0,
        };
        let type_index = type_index.ok_or_else(|| unknown_type(&info))?;
        info.type_index = type_index;
        info.class_id = schema
            .get(type_index)
            .map_or(type_id, |class| class.class_id);
        log::trace!("object {info:?}");
        objects.push(info);
    }
    Ok(objects)
}

fn unknown_type(info: &ObjectInfo) -> DecodeError {
    DecodeError::schema(
        "object directory",
        format!(
            "object {} refers to type {}, absent from the type table",
            info.path_id, info.type_id
        ),
    )
}
