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

//! # Relic IO
//!
//! Decoding of serialized asset containers, from raw bytes to a tree of
//! decoded objects.
//!
//! The pipeline runs in three stages, each owning one submodule:
//!
//! 1. [`container`] detects the envelope dialect and produces the primary
//!    stream (plus, for bundles, the table of named files).
//! 2. [`schema`] parses the embedded type trees that describe every class.
//! 3. [`object`] walks the object directory and decodes each record through
//!    its class's type tree.
//!
//! [`SerializedAsset::decode`] ties the stages together.

#![warn(missing_docs)]

pub mod container;
pub mod object;
pub mod schema;
pub mod serialized;

#[cfg(any(test, feature = "test-prelude"))]
pub mod test_prelude;

pub use container::{CompressionCodec, Container, ContainerInfo, Dialect, FileNode, FileTable};
pub use object::ObjectDecoder;
pub use schema::{ClassSchema, FieldDef, NodeId, NodeKind, PrimitiveKind, SchemaTable, TypeTree};
pub use serialized::{HeaderShape, ObjectEntry, ObjectInfo, SerializedAsset, SerializedHeader};
