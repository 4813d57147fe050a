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

//! # Relic Core
//!
//! Foundational crate containing the primitive types every decoding stage
//! shares: the in-memory [`ByteCursor`], the typed [`DecodeError`], the
//! generic [`Value`] tree produced by schema-driven decoding, and the
//! [`DecodeLimits`] that bound every count read from untrusted input.

#![warn(missing_docs)]

pub mod cursor;
pub mod error;
pub mod limits;
pub mod value;

pub use cursor::{ByteCursor, Endian};
pub use error::{CompressionSite, DecodeError, Result};
pub use limits::DecodeLimits;
pub use value::{Fields, Value};
