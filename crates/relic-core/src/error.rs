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

//! Defines the error type shared by every decoding stage.
//!
//! All kinds are unrecoverable for the container being decoded: they abort the
//! decode and surface to the caller. Nothing in this workspace retries.

use std::fmt;
use thiserror::Error;

/// Where a compressed payload was found when its codec was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionSite {
    /// The bundle's block-info header.
    Header,
    /// A storage block, by its position in the block table.
    Block(usize),
}

impl fmt::Display for CompressionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionSite::Header => write!(f, "bundle header"),
            CompressionSite::Block(index) => write!(f, "storage block {index}"),
        }
    }
}

/// An error raised while decoding a container, its schema, its objects or a texture.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The leading signature names neither of the known container dialects.
    #[error("unsupported container format {signature:?}")]
    UnsupportedContainerFormat {
        /// The signature string as read (lossily decoded).
        signature: String,
    },

    /// A header or block codec outside {none, LZ4, LZ4HC}.
    #[error("unsupported compression codec {codec} in {site}")]
    UnsupportedCompressionCodec {
        /// The raw codec code (low 6 bits of the flag word).
        codec: u32,
        /// Which payload carried it.
        site: CompressionSite,
    },

    /// A decompressed size mismatch, or a count exceeding its sanity ceiling.
    #[error("corrupt length in {context}: {detail}")]
    CorruptLength {
        /// The structure whose length was wrong.
        context: &'static str,
        /// What was declared versus what was found or allowed.
        detail: String,
    },

    /// A read or slice past the end of its buffer.
    #[error("out of bounds at offset {offset:#x} (need {need} bytes, buffer holds {len})")]
    OutOfBounds {
        /// Position the access started at.
        offset: usize,
        /// Number of bytes requested.
        need: usize,
        /// Length of the underlying buffer.
        len: usize,
    },

    /// A texture's streamed payload names a file missing from the bundle's file table.
    #[error("streamed asset {name:?} is not present in the bundle file table")]
    UnresolvedStreamedAsset {
        /// Base name of the referenced file.
        name: String,
    },

    /// No image object exposes a supported pixel format.
    #[error("no supported image format among {candidates} texture candidate(s)")]
    UnsupportedPixelFormat {
        /// How many image-bearing objects were examined.
        candidates: usize,
    },

    /// The embedded type tree or a decoded object does not have the expected shape.
    #[error("schema inconsistency in {context}: {detail}")]
    SchemaInconsistency {
        /// The structure being decoded.
        context: &'static str,
        /// What was wrong with it.
        detail: String,
    },
}

impl DecodeError {
    /// Convenience constructor for [`DecodeError::CorruptLength`].
    pub fn corrupt_length(context: &'static str, detail: impl Into<String>) -> Self {
        DecodeError::CorruptLength {
            context,
            detail: detail.into(),
        }
    }

    /// Convenience constructor for [`DecodeError::SchemaInconsistency`].
    pub fn schema(context: &'static str, detail: impl Into<String>) -> Self {
        DecodeError::SchemaInconsistency {
            context,
            detail: detail.into(),
        }
    }

    /// Checks a count read from the stream against its ceiling.
    pub fn check_ceiling(context: &'static str, count: u64, ceiling: u64) -> Result<()> {
        if count > ceiling {
            return Err(Self::corrupt_length(
                context,
                format!("declared {count}, ceiling {ceiling}"),
            ));
        }
        Ok(())
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_accepts_equal_and_rejects_above() {
        assert!(DecodeError::check_ceiling("objects", 1024, 1024).is_ok());
        let err = DecodeError::check_ceiling("objects", 1025, 1024).unwrap_err();
        assert!(
            matches!(err, DecodeError::CorruptLength { context: "objects", .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_messages_name_the_site() {
        let err = DecodeError::UnsupportedCompressionCodec {
            codec: 1,
            site: CompressionSite::Block(3),
        };
        assert_eq!(err.to_string(), "unsupported compression codec 1 in storage block 3");

        let err = DecodeError::OutOfBounds {
            offset: 0x10,
            need: 4,
            len: 18,
        };
        assert_eq!(
            err.to_string(),
            "out of bounds at offset 0x10 (need 4 bytes, buffer holds 18)"
        );
    }
}
