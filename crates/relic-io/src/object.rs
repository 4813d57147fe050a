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

//! Schema-driven decoding of object data into [`Value`] trees.

use crate::schema::{NodeId, NodeKind, TypeTree};
use relic_core::{ByteCursor, DecodeError, DecodeLimits, Fields, Result, Value};
use std::cell::Cell;

/// Decodes object data by walking one class's [`TypeTree`].
///
/// Every produced value is charged against [`DecodeLimits::max_values`], so
/// arrays of elements that occupy no input bytes cannot grow without bound.
pub struct ObjectDecoder<'t> {
    tree: &'t TypeTree,
    limits: &'t DecodeLimits,
    produced: Cell<u64>,
}

impl<'t> ObjectDecoder<'t> {
    /// Creates a decoder for objects of the class described by `tree`.
    pub fn new(tree: &'t TypeTree, limits: &'t DecodeLimits) -> Self {
        Self {
            tree,
            limits,
            produced: Cell::new(0),
        }
    }

    /// Decodes one object starting at the cursor's position.
    ///
    /// Leaf alignment is computed relative to the cursor's alignment origin.
    pub fn decode(&self, cursor: &mut ByteCursor<'_>) -> Result<Value> {
        self.produced.set(0);
        self.decode_node(self.tree.root(), cursor)
    }

    fn values_left(&self) -> u64 {
        self.limits.max_values.saturating_sub(self.produced.get())
    }

    fn reserve_values(&self, count: u64) -> Result<()> {
        let left = self.values_left();
        if count > left {
            return Err(DecodeError::corrupt_length(
                "decoded values",
                format!(
                    "{count} more value(s) requested, {left} left of {}",
                    self.limits.max_values
                ),
            ));
        }
        Ok(())
    }

    fn decode_node(&self, id: NodeId, cursor: &mut ByteCursor<'_>) -> Result<Value> {
        self.reserve_values(1)?;
        self.produced.set(self.produced.get() + 1);

        let field = self.tree.node(id);
        let value = match &field.kind {
            NodeKind::Scalar(kind) => {
                // Resolved leaves always have a fixed size.
                let size = field.size.unwrap_or(0) as usize;
                cursor.align(size.min(4))?;
                kind.read(cursor, size)?
            }
            NodeKind::Array { length, element } => {
                self.decode_array(&field.name, *length, *element, cursor)?
            }
            NodeKind::Record { collapse_string } => {
                let mut fields = Fields::with_capacity(field.children.len());
                for &child in &field.children {
                    let value = self.decode_node(child, cursor)?;
                    fields.insert(self.tree.node(child).name.clone(), value);
                }
                if *collapse_string && fields.len() == 1 {
                    fields
                        .into_iter()
                        .next()
                        .map(|(_, value)| value)
                        .unwrap_or(Value::Map(Fields::new()))
                } else {
                    Value::Map(fields)
                }
            }
        };
        if field.aligns_after() {
            cursor.align(4)?;
        }
        Ok(value)
    }

    fn decode_array(
        &self,
        name: &str,
        length: NodeId,
        element: NodeId,
        cursor: &mut ByteCursor<'_>,
    ) -> Result<Value> {
        let count = self
            .decode_node(length, cursor)?
            .as_u64()
            .ok_or_else(|| {
                DecodeError::schema("object data", format!("array {name:?} has a negative length"))
            })?;
        DecodeError::check_ceiling("array length", count, self.limits.max_array_len)?;
        let count = count as usize;

        let template = self.tree.node(element);
        if let NodeKind::Scalar(kind) = template.kind {
            if kind.is_byte() {
                return Ok(Value::Bytes(cursor.read(count)?.to_vec()));
            }
        }

        let width = self.min_width(element) as u64;
        if width > 0 && count as u64 > cursor.remaining() as u64 / width {
            return Err(DecodeError::OutOfBounds {
                offset: cursor.position(),
                need: (count as u64).saturating_mul(width).try_into().unwrap_or(usize::MAX),
                len: cursor.len(),
            });
        }
        self.reserve_values(count as u64)?;

        // Preallocate by what the buffer could hold, not by the declared count.
        let mut items = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            items.push(self.decode_node(element, cursor)?);
        }
        Ok(Value::Array(items))
    }

    /// The fewest input bytes one instance of a node can occupy, alignment aside.
    fn min_width(&self, id: NodeId) -> usize {
        let field = self.tree.node(id);
        match field.kind {
            NodeKind::Scalar(_) => field.size.unwrap_or(0) as usize,
            NodeKind::Array { length, .. } => self.min_width(length),
            NodeKind::Record { .. } => field
                .children
                .iter()
                .fold(0usize, |sum, &child| sum.saturating_add(self.min_width(child))),
        }
    }
}
