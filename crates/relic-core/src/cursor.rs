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

//! A bounds-checked reader over an in-memory byte buffer.

use crate::error::{DecodeError, Result};

/// Byte order used by the width-typed reads of a [`ByteCursor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first.
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Forward and random-access reader over a borrowed byte slice.
///
/// The cursor never copies the buffer. Its position never exceeds the buffer
/// length; every read, skip or seek that would do so fails with
/// [`DecodeError::OutOfBounds`] and leaves the position untouched.
///
/// Alignment is always computed relative to an *alignment origin*, which
/// defaults to zero and is moved with [`ByteCursor::set_align_origin`].
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
    align_origin: usize,
    endian: Endian,
}

impl<'a> ByteCursor<'a> {
    /// Creates a little-endian cursor at position zero.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            align_origin: 0,
            endian: Endian::Little,
        }
    }

    /// Creates a cursor at position zero using the given byte order.
    pub fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self {
            endian,
            ..Self::new(data)
        }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The full underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Byte order of the width-typed reads.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Switches the byte order of subsequent width-typed reads.
    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    /// Offset that all [`align`](Self::align) calls are relative to.
    pub fn align_origin(&self) -> usize {
        self.align_origin
    }

    /// Moves the alignment origin.
    pub fn set_align_origin(&mut self, origin: usize) {
        self.align_origin = origin;
    }

    /// Seeks to an absolute position. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(DecodeError::OutOfBounds {
                offset: pos,
                need: 0,
                len: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Seeks to `n` bytes before the end of the buffer.
    pub fn seek_from_end(&mut self, n: usize) -> Result<()> {
        let pos = self
            .data
            .len()
            .checked_sub(n)
            .ok_or(DecodeError::OutOfBounds {
                offset: 0,
                need: n,
                len: self.data.len(),
            })?;
        self.pos = pos;
        Ok(())
    }

    /// Skips `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Rounds the position up to the next multiple of `boundary`, measured from
    /// the alignment origin. Boundaries of 0 and 1 are no-ops.
    pub fn align(&mut self, boundary: usize) -> Result<()> {
        if boundary <= 1 || self.pos < self.align_origin {
            return Ok(());
        }
        let relative = self.pos - self.align_origin;
        let padding = (boundary - relative % boundary) % boundary;
        self.skip(padding)
    }

    /// Reads the next `n` bytes without copying.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads every byte from the position to the end of the buffer.
    pub fn read_all_remaining(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    /// Reads a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads up to the next NUL byte, consuming the NUL. The returned slice excludes it.
    pub fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let rest = &self.data[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::OutOfBounds {
                offset: self.pos,
                need: rest.len() + 1,
                len: self.data.len(),
            })?;
        let s = &rest[..end];
        self.pos += end + 1;
        Ok(s)
    }

    /// Reads a NUL-terminated string, replacing invalid UTF-8 sequences.
    pub fn read_cstring_lossy(&mut self) -> Result<String> {
        Ok(String::from_utf8_lossy(self.read_cstring()?).into_owned())
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a single signed byte.
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a `u16` in the cursor's byte order.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_array()?;
        Ok(match self.endian {
            Endian::Little => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        })
    }

    /// Reads a `i16` in the cursor's byte order.
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Reads a `u32` in the cursor's byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_array()?;
        Ok(match self.endian {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Reads a `i32` in the cursor's byte order.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads a `u64` in the cursor's byte order.
    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_array()?;
        Ok(match self.endian {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
        })
    }

    /// Reads a `i64` in the cursor's byte order.
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Reads a `f32` in the cursor's byte order.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads a `f64` in the cursor's byte order.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a big-endian `u16` regardless of the cursor's byte order.
    pub fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `u32` regardless of the cursor's byte order.
    pub fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Reads a big-endian `u64` regardless of the cursor's byte order.
    pub fn read_u64_be(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(DecodeError::OutOfBounds {
                offset: self.pos,
                need: n,
                len: self.data.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_advances_and_fails_past_end() {
        let data = [1u8, 2, 3, 4, 5];
        let mut c = ByteCursor::new(&data);

        assert_eq!(c.read(2).unwrap(), &[1, 2]);
        assert_eq!(c.position(), 2);

        let err = c.read(4).unwrap_err();
        assert!(
            matches!(err, DecodeError::OutOfBounds { offset: 2, need: 4, len: 5 }),
            "unexpected error: {err}"
        );
        assert_eq!(c.position(), 2, "a failed read must not move the cursor");
        assert_eq!(c.read_all_remaining(), &[3, 4, 5]);
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn test_seek_and_seek_from_end() {
        let data = [0u8; 8];
        let mut c = ByteCursor::new(&data);

        c.seek(8).unwrap();
        assert!(c.seek(9).is_err());

        c.seek_from_end(3).unwrap();
        assert_eq!(c.position(), 5);
        assert!(c.seek_from_end(9).is_err());
    }

    #[test]
    fn test_align_is_relative_to_origin() {
        let data = [0u8; 32];
        let mut c = ByteCursor::new(&data);
        c.set_align_origin(2);
        c.seek(3).unwrap();
        c.align(4).unwrap();
        assert_eq!(c.position(), 6);

        // Already aligned stays put.
        c.align(4).unwrap();
        assert_eq!(c.position(), 6);

        // Degenerate boundaries are no-ops.
        c.skip(1).unwrap();
        c.align(0).unwrap();
        c.align(1).unwrap();
        assert_eq!(c.position(), 7);

        c.align(2).unwrap();
        assert_eq!(c.position(), 8);
    }

    #[test]
    fn test_align_leaf_sizes_property() {
        let data = [0u8; 64];
        for origin in 0..4 {
            for start in origin..24 {
                for size in 1..=4usize {
                    let mut c = ByteCursor::new(&data);
                    c.set_align_origin(origin);
                    c.seek(start).unwrap();
                    c.align(size.min(4)).unwrap();
                    assert_eq!(
                        (c.position() - origin) % size,
                        0,
                        "origin={origin} start={start} size={size}"
                    );
                    assert!(c.position() - start < size);
                }
            }
        }
    }

    #[test]
    fn test_align_past_end_fails() {
        let data = [0u8; 5];
        let mut c = ByteCursor::new(&data);
        c.seek(5).unwrap();
        assert!(c.align(4).is_err());
    }

    #[test]
    fn test_read_cstring() {
        let data = b"UnityFS\0rest";
        let mut c = ByteCursor::new(data);
        assert_eq!(c.read_cstring().unwrap(), b"UnityFS");
        assert_eq!(c.position(), 8);
        assert!(c.read_cstring().is_err(), "missing terminator must fail");
        assert_eq!(c.position(), 8);
    }

    #[test]
    fn test_endian_reads() {
        let data = [0x12, 0x34, 0x56, 0x78];
        let mut le = ByteCursor::new(&data);
        assert_eq!(le.read_u32().unwrap(), 0x7856_3412);

        let mut be = ByteCursor::with_endian(&data, Endian::Big);
        assert_eq!(be.read_u32().unwrap(), 0x1234_5678);

        let mut forced = ByteCursor::new(&data);
        assert_eq!(forced.read_u16_be().unwrap(), 0x1234);
        assert_eq!(forced.read_u16().unwrap(), 0x7856);
    }

    #[test]
    fn test_float_reads() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-2.25f64).to_le_bytes());
        let mut c = ByteCursor::new(&bytes);
        assert_eq!(c.read_f32().unwrap(), 1.5);
        assert_eq!(c.read_f64().unwrap(), -2.25);
    }
}
