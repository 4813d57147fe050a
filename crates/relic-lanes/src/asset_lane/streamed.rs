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

//! Resolution of texture payloads stored outside the primary stream.

use relic_core::{DecodeError, Result, Value};
use relic_io::FileTable;

/// Supplies the contents of files referenced by streamed texture data.
pub trait StreamedDataSource {
    /// Returns the file with the given base name, if present.
    fn resolve(&self, name: &str) -> Option<&[u8]>;
}

impl StreamedDataSource for FileTable {
    fn resolve(&self, name: &str) -> Option<&[u8]> {
        self.get(name)
    }
}

/// The `m_StreamData` record of a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingInfo {
    /// Path of the external file, e.g. `archive:/CAB-1234/CAB-1234.resS`.
    pub path: String,
    /// Offset of the payload within that file.
    pub offset: u64,
    /// Length of the payload.
    pub size: u64,
}

impl StreamingInfo {
    /// Reads the record from a decoded `m_StreamData` value.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            path: value.get("path")?.as_str()?.to_owned(),
            offset: value.get("offset")?.as_u64()?,
            size: value.get("size")?.as_u64()?,
        })
    }

    /// Whether the record points anywhere.
    pub fn is_set(&self) -> bool {
        !self.path.is_empty()
    }

    /// The last path component, which is how bundle files are named.
    pub fn base_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Slices the payload out of `source`.
    pub fn resolve<'s>(&self, source: &'s dyn StreamedDataSource) -> Result<&'s [u8]> {
        let name = self.base_name();
        let file = source
            .resolve(name)
            .ok_or_else(|| DecodeError::UnresolvedStreamedAsset {
                name: name.to_owned(),
            })?;
        let out_of_bounds = || DecodeError::OutOfBounds {
            offset: usize::try_from(self.offset).unwrap_or(usize::MAX),
            need: usize::try_from(self.size).unwrap_or(usize::MAX),
            len: file.len(),
        };
        let start = usize::try_from(self.offset).map_err(|_| out_of_bounds())?;
        let end = self
            .offset
            .checked_add(self.size)
            .and_then(|end| usize::try_from(end).ok())
            .ok_or_else(out_of_bounds)?;
        file.get(start..end).ok_or_else(out_of_bounds)
    }
}
