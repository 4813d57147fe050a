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

//! The generic result of schema-driven object decoding.
//!
//! A decoded object is a pure tree: scalars at the leaves, ordered sequences
//! for array fields and named mappings for records. There are no back
//! references, so the tree is freely clonable and owns all of its data.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Named record fields in schema order.
pub type Fields = IndexMap<String, Value>;

/// A decoded object, or any part of one.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A signed integer primitive.
    Int(i64),
    /// An unsigned integer primitive.
    UInt(u64),
    /// A floating point primitive (32-bit values are widened).
    Float(f64),
    /// A boolean primitive.
    Bool(bool),
    /// Raw bytes: byte arrays, strings, and leaves with unrecognised type names.
    Bytes(Vec<u8>),
    /// An array field decoded element by element.
    Array(Vec<Value>),
    /// A record, one entry per child field.
    Map(Fields),
}

impl Value {
    /// Looks up a record field by name. Returns `None` for non-records.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Whether this is a record holding a field with the given name.
    pub fn contains_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The value as a signed integer, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// The value as an unsigned integer, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Int(v) => u64::try_from(v).ok(),
            Value::UInt(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a float, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Int(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    /// The value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// The raw bytes of a byte buffer or string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The value as UTF-8 text, for byte buffers holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// The elements of an array field.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The fields of a record.
    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Value::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Whether a byte buffer, array or record has no content. Scalars are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Bytes(b) => b.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Map(fields) => fields.is_empty(),
            _ => false,
        }
    }

    /// Returns a copy in which every byte buffer longer than `max` is cut to `max` bytes.
    pub fn truncated(&self, max: usize) -> Value {
        match self {
            Value::Bytes(b) if b.len() > max => Value::Bytes(b[..max].to_vec()),
            Value::Array(items) => Value::Array(items.iter().map(|v| v.truncated(max)).collect()),
            Value::Map(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.truncated(max)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

/// Byte buffers serialize as text when they hold valid UTF-8 and as a number
/// sequence otherwise.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::UInt(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(text) => serializer.serialize_str(text),
                Err(_) => {
                    let mut seq = serializer.serialize_seq(Some(b.len()))?;
                    for byte in b {
                        seq.serialize_element(byte)?;
                    }
                    seq.end()
                }
            },
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}
