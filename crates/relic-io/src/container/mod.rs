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

//! Envelope detection and unwrapping.

mod bundle;
mod compression;
mod raw;

pub use bundle::{BundleHeader, FileNode, FileTable, StorageBlock};
pub use compression::{decompress, CompressionCodec, CODEC_MASK};
pub use raw::RawHeader;

use relic_core::{ByteCursor, DecodeError, DecodeLimits, Endian, Result};
use std::fmt;

/// The two envelope dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Uncompressed, one stream.
    Raw,
    /// Block-compressed, several named files.
    Bundle,
}

impl Dialect {
    /// The signature string that introduces this dialect.
    pub fn signature(self) -> &'static str {
        match self {
            Dialect::Raw => "UnityRaw",
            Dialect::Bundle => "UnityFS",
        }
    }

    fn from_signature(signature: &[u8]) -> Option<Self> {
        match signature {
            b"UnityRaw" => Some(Dialect::Raw),
            b"UnityFS" => Some(Dialect::Bundle),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

/// Envelope fields kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Which envelope was found.
    pub dialect: Dialect,
    /// Format generation of the envelope.
    pub stream_version: u32,
    /// Engine version label, e.g. `5.x.x`.
    pub engine_version: String,
    /// Engine revision label.
    pub engine_revision: String,
}

/// What the envelope wraps.
#[derive(Debug, Clone)]
pub enum Payload<'a> {
    /// The raw dialect's single stream, borrowed from the input.
    Raw(&'a [u8]),
    /// The bundle dialect's expanded files.
    Bundle(FileTable),
}

/// A decoded envelope.
#[derive(Debug, Clone)]
pub struct Container<'a> {
    /// Diagnostic fields.
    pub info: ContainerInfo,
    /// The unwrapped content.
    pub payload: Payload<'a>,
}

impl<'a> Container<'a> {
    /// Detects the dialect of `bytes` and unwraps it.
    pub fn decode(bytes: &'a [u8], limits: &DecodeLimits) -> Result<Self> {
        let mut cursor = ByteCursor::with_endian(bytes, Endian::Big);
        let signature = cursor.read_cstring().map_err(|_| {
            DecodeError::UnsupportedContainerFormat {
                signature: String::from_utf8_lossy(&bytes[..bytes.len().min(16)]).into_owned(),
            }
        })?;
        let dialect = Dialect::from_signature(signature).ok_or_else(|| {
            DecodeError::UnsupportedContainerFormat {
                signature: String::from_utf8_lossy(signature).into_owned(),
            }
        })?;

        let info = ContainerInfo {
            dialect,
            stream_version: cursor.read_u32()?,
            engine_version: cursor.read_cstring_lossy()?,
            engine_revision: cursor.read_cstring_lossy()?,
        };
        log::debug!(
            "{} container, stream version {}, engine {} ({})",
            info.dialect,
            info.stream_version,
            info.engine_version,
            info.engine_revision
        );

        let payload = match dialect {
            Dialect::Raw => Payload::Raw(raw::decode(&mut cursor, info.stream_version)?),
            Dialect::Bundle => {
                Payload::Bundle(bundle::decode(&mut cursor, info.stream_version, limits)?)
            }
        };
        Ok(Self { info, payload })
    }

    /// The stream holding the serialized file.
    pub fn primary(&self) -> &[u8] {
        match &self.payload {
            Payload::Raw(data) => data,
            Payload::Bundle(table) => table.primary(),
        }
    }

    /// The named-file table, present only for bundles.
    pub fn file_table(&self) -> Option<&FileTable> {
        match &self.payload {
            Payload::Raw(_) => None,
            Payload::Bundle(table) => Some(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::{raw_container, BundleBuilder};

    #[test]
    fn test_raw_payload_window() {
        let bytes = raw_container(1, &[1, 2, 3, 4]);
        let container = Container::decode(&bytes, &DecodeLimits::default()).unwrap();
        assert_eq!(container.info.dialect, Dialect::Raw);
        assert_eq!(container.primary(), &[1, 2, 3, 4]);
        assert!(container.file_table().is_none());
    }

    #[test]
    fn test_raw_versions_add_data_header() {
        for version in 1..=3 {
            let bytes = raw_container(version, b"payload");
            let container = Container::decode(&bytes, &DecodeLimits::default()).unwrap();
            assert_eq!(container.primary(), b"payload", "stream version {version}");
        }
    }

    #[test]
    fn test_raw_total_size_past_end() {
        let mut bytes = raw_container(1, &[1, 2, 3, 4]);
        bytes.truncate(bytes.len() - 1);
        let err = Container::decode(&bytes, &DecodeLimits::default()).unwrap_err();
        assert!(
            matches!(err, DecodeError::CorruptLength { .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_unknown_signature() {
        let err = Container::decode(b"UnityWeb\0\0\0\0\x06", &DecodeLimits::default()).unwrap_err();
        match err {
            DecodeError::UnsupportedContainerFormat { signature } => {
                assert_eq!(signature, "UnityWeb")
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = Container::decode(b"garbage", &DecodeLimits::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedContainerFormat { .. }));
    }

    #[test]
    fn test_bundle_single_stored_block() {
        let block: Vec<u8> = (0u8..=200).collect();
        let bytes = BundleBuilder::new(6)
            .block(&block, CompressionCodec::None)
            .node("CAB-primary", 0, block.len() as u64)
            .build();

        let container = Container::decode(&bytes, &DecodeLimits::default()).unwrap();
        assert_eq!(container.info.dialect, Dialect::Bundle);
        assert_eq!(container.primary(), block.as_slice());
        let table = container.file_table().unwrap();
        assert_eq!(table.primary_name(), "CAB-primary");
        assert_eq!(table.blocks().len(), 1);
    }

    #[test]
    fn test_bundle_file_slicing_across_blocks() {
        let bytes = BundleBuilder::new(6)
            .header_codec(CompressionCodec::Lz4Hc)
            .block(b"aaaabbbb", CompressionCodec::Lz4)
            .block(b"ccccdddd", CompressionCodec::None)
            .node("first", 0, 4)
            .node("middle", 4, 8)
            .node("empty", 16, 0)
            .build();

        let container = Container::decode(&bytes, &DecodeLimits::default()).unwrap();
        let table = container.file_table().unwrap();
        assert_eq!(container.primary(), b"aaaa");
        assert_eq!(table.get("middle"), Some(&b"bbbbcccc"[..]));
        assert_eq!(table.get("empty"), Some(&b""[..]));
        assert_eq!(table.get("missing"), None);
        assert_eq!(table.block_data().len(), 16);
    }

    #[test]
    fn test_bundle_directory_at_end_with_padding() {
        for version in [6, 7] {
            let bytes = BundleBuilder::new(version)
                .directory_at_end()
                .block_padding()
                .header_codec(CompressionCodec::Lz4)
                .block(b"stream bytes", CompressionCodec::Lz4Hc)
                .node("CAB-tail", 0, 12)
                .build();
            let container = Container::decode(&bytes, &DecodeLimits::default()).unwrap();
            assert_eq!(container.primary(), b"stream bytes", "stream version {version}");
        }
    }

    #[test]
    fn test_bundle_node_past_block_data() {
        let bytes = BundleBuilder::new(6)
            .block(b"1234", CompressionCodec::None)
            .node("overrun", 2, 3)
            .build();
        let err = Container::decode(&bytes, &DecodeLimits::default()).unwrap_err();
        assert!(
            matches!(err, DecodeError::OutOfBounds { offset: 2, need: 3, len: 4 }),
            "unexpected error: {err}"
        );

        let bytes = BundleBuilder::new(6)
            .block(b"1234", CompressionCodec::None)
            .node("wraps", u64::MAX, 2)
            .build();
        assert!(matches!(
            Container::decode(&bytes, &DecodeLimits::default()),
            Err(DecodeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_bundle_rejects_unsupported_block_codec() {
        let bytes = BundleBuilder::new(6)
            .block(b"1234", CompressionCodec::None)
            .block(b"5678", CompressionCodec::Lzma)
            .node("f", 0, 8)
            .build();
        let err = Container::decode(&bytes, &DecodeLimits::default()).unwrap_err();
        assert!(
            matches!(
                err,
                DecodeError::UnsupportedCompressionCodec {
                    codec: 1,
                    site: relic_core::CompressionSite::Block(1)
                }
            ),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_bundle_ceilings() {
        let bytes = BundleBuilder::new(6)
            .block(b"12", CompressionCodec::None)
            .block(b"34", CompressionCodec::None)
            .node("f", 0, 4)
            .build();
        let limits = DecodeLimits {
            max_blocks: 1,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            Container::decode(&bytes, &limits),
            Err(DecodeError::CorruptLength { context: "storage block table", .. })
        ));

        let limits = DecodeLimits {
            max_block_data: 3,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            Container::decode(&bytes, &limits),
            Err(DecodeError::CorruptLength { context: "storage block data", .. })
        ));
    }

    #[test]
    fn test_file_node_ceiling() {
        let bytes = BundleBuilder::new(6)
            .block(b"1234", CompressionCodec::None)
            .node("a", 0, 2)
            .node("b", 2, 2)
            .build();
        let limits = DecodeLimits {
            max_file_nodes: 1,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            Container::decode(&bytes, &limits),
            Err(DecodeError::CorruptLength { context: "bundle file directory", .. })
        ));
    }

    #[test]
    fn test_oversized_header_rejected_before_decompression() {
        let mut bytes = b"UnityFS\0".to_vec();
        bytes.extend_from_slice(&6u32.to_be_bytes());
        bytes.extend_from_slice(b"5.x.x\02019.4.40f1\0");
        bytes.extend_from_slice(&52u64.to_be_bytes());
        bytes.extend_from_slice(&4u32.to_be_bytes());
        bytes.extend_from_slice(&0xffff_fff0u32.to_be_bytes());
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0x40, 0, 0, 0]);

        let err = Container::decode(&bytes, &DecodeLimits::default()).unwrap_err();
        assert!(
            matches!(err, DecodeError::CorruptLength { context: "bundle block-info header", .. }),
            "a 4 GiB header must be refused up front, got {err}"
        );
    }

    #[test]
    fn test_bundle_without_files() {
        let bytes = BundleBuilder::new(6)
            .block(b"12", CompressionCodec::None)
            .build();
        assert!(matches!(
            Container::decode(&bytes, &DecodeLimits::default()),
            Err(DecodeError::CorruptLength { .. })
        ));
    }
}
