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

use relic_core::{ByteCursor, Result, Value};

/// How a leaf field's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// One byte, non-zero is true.
    Bool,
    /// One byte of text, kept as bytes.
    Char,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 64-bit integer.
    I64,
    /// Unsigned 64-bit integer.
    U64,
    /// IEEE single.
    F32,
    /// IEEE double.
    F64,
    /// Anything else: the declared number of bytes, uninterpreted.
    Opaque,
}

impl PrimitiveKind {
    /// Classifies a leaf by its type name and declared size.
    ///
    /// A known name whose size disagrees with its natural width is opaque.
    pub fn classify(type_name: &str, size: u32) -> Self {
        let kind = match type_name {
            "bool" => Self::Bool,
            "char" => Self::Char,
            "SInt8" => Self::I8,
            "UInt8" => Self::U8,
            "SInt16" | "short" => Self::I16,
            "UInt16" | "unsigned short" => Self::U16,
            "int" | "SInt32" => Self::I32,
            "unsigned int" | "UInt32" => Self::U32,
            "int64" | "SInt64" | "long long" => Self::I64,
            "UInt64" | "unsigned long long" | "FileSize" => Self::U64,
            "float" => Self::F32,
            "double" => Self::F64,
            _ => return Self::Opaque,
        };
        if kind.width() == Some(size as usize) {
            kind
        } else {
            Self::Opaque
        }
    }

    /// Natural width in bytes; `None` for opaque data.
    pub fn width(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Char | Self::I8 | Self::U8 => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 => Some(4),
            Self::I64 | Self::U64 | Self::F64 => Some(8),
            Self::Opaque => None,
        }
    }

    /// Whether arrays of this kind are read as one byte buffer.
    pub fn is_byte(self) -> bool {
        matches!(self, Self::Char | Self::I8 | Self::U8)
    }

    /// Whether the decoded value is an integer, usable as an array length.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::U8 | Self::I16 | Self::U16 | Self::I32 | Self::U32 | Self::I64 | Self::U64
        )
    }

    /// Reads one value of this kind, `size` bytes long, in the cursor's byte order.
    pub fn read(self, cursor: &mut ByteCursor<'_>, size: usize) -> Result<Value> {
        Ok(match self {
            Self::Bool => Value::Bool(cursor.read_u8()? != 0),
            Self::Char => Value::Bytes(cursor.read(1)?.to_vec()),
            Self::I8 => Value::Int(cursor.read_i8()?.into()),
            Self::U8 => Value::UInt(cursor.read_u8()?.into()),
            Self::I16 => Value::Int(cursor.read_i16()?.into()),
            Self::U16 => Value::UInt(cursor.read_u16()?.into()),
            Self::I32 => Value::Int(cursor.read_i32()?.into()),
            Self::U32 => Value::UInt(cursor.read_u32()?.into()),
            Self::I64 => Value::Int(cursor.read_i64()?),
            Self::U64 => Value::UInt(cursor.read_u64()?),
            Self::F32 => Value::Float(cursor.read_f32()?.into()),
            Self::F64 => Value::Float(cursor.read_f64()?),
            Self::Opaque => Value::Bytes(cursor.read(size)?.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_core::Endian;

    #[test]
    fn test_classify() {
        assert_eq!(PrimitiveKind::classify("int", 4), PrimitiveKind::I32);
        assert_eq!(PrimitiveKind::classify("int64", 8), PrimitiveKind::I64);
        assert_eq!(PrimitiveKind::classify("SInt64", 8), PrimitiveKind::I64);
        assert_eq!(PrimitiveKind::classify("unsigned int", 4), PrimitiveKind::U32);
        assert_eq!(PrimitiveKind::classify("char", 1), PrimitiveKind::Char);
        assert_eq!(PrimitiveKind::classify("GUID", 16), PrimitiveKind::Opaque);
        assert_eq!(
            PrimitiveKind::classify("int", 2),
            PrimitiveKind::Opaque,
            "size mismatches fall back to raw bytes"
        );
    }

    #[test]
    fn test_read_respects_byte_order() {
        let data = [0xff, 0xfe, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x3f];
        let mut le = ByteCursor::new(&data);
        assert_eq!(PrimitiveKind::I16.read(&mut le, 2).unwrap(), Value::Int(-257));
        assert_eq!(PrimitiveKind::U16.read(&mut le, 2).unwrap(), Value::UInt(0));
        assert_eq!(PrimitiveKind::F32.read(&mut le, 4).unwrap(), Value::Float(1.5));

        let mut be = ByteCursor::with_endian(&data, Endian::Big);
        assert_eq!(PrimitiveKind::U16.read(&mut be, 2).unwrap(), Value::UInt(0xfffe));
        assert_eq!(PrimitiveKind::Bool.read(&mut be, 1).unwrap(), Value::Bool(false));
        assert_eq!(
            PrimitiveKind::Opaque.read(&mut be, 3).unwrap(),
            Value::Bytes(vec![0, 0, 0])
        );
    }
}
