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

//! The block-compressed multi-file dialect.
//!
//! A bundle carries a small directory (the "block info" header, itself
//! optionally compressed and optionally stored at the end of the file) that
//! lists the storage blocks making up the data area and the named files
//! living inside the concatenation of those blocks.

use super::compression::{self, CompressionCodec};
use relic_core::{ByteCursor, CompressionSite, DecodeError, DecodeLimits, Endian, Result};
use std::ops::Range;

/// The directory sits at the end of the file instead of after the header.
pub const FLAG_INFO_AT_END: u32 = 0x80;
/// Block data starts on a 16-byte boundary.
pub const FLAG_BLOCK_PADDING: u32 = 0x200;

/// Fixed fields following the version labels of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleHeader {
    /// Size of the whole bundle.
    pub total_size: u64,
    /// Stored size of the directory.
    pub compressed_info_size: u32,
    /// Expanded size of the directory.
    pub uncompressed_info_size: u32,
    /// Codec in the low six bits, layout flags above.
    pub flags: u32,
}

impl BundleHeader {
    fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            total_size: cursor.read_u64()?,
            compressed_info_size: cursor.read_u32()?,
            uncompressed_info_size: cursor.read_u32()?,
            flags: cursor.read_u32()?,
        })
    }

    /// Whether the directory is stored at the end of the file.
    pub fn info_at_end(&self) -> bool {
        self.flags & FLAG_INFO_AT_END != 0
    }

    /// Whether block data is padded to 16 bytes.
    pub fn block_padding(&self) -> bool {
        self.flags & FLAG_BLOCK_PADDING != 0
    }
}

/// One entry of the storage-block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageBlock {
    /// Size once expanded.
    pub uncompressed_size: u32,
    /// Size as stored in the file.
    pub compressed_size: u32,
    /// Codec in the low six bits. The upper bits carry no meaning here.
    pub flags: u16,
}

impl StorageBlock {
    /// The block's codec, or the raw code when it is outside the table.
    pub fn codec(&self) -> std::result::Result<CompressionCodec, u32> {
        CompressionCodec::from_flags(u32::from(self.flags))
    }
}

/// A named byte range inside the block data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// File name as stored in the directory.
    pub name: String,
    /// Offset into the block data.
    pub offset: u64,
    /// Length in bytes.
    pub size: u64,
    /// Status word. Unused by the decoder.
    pub status: u32,
}

impl FileNode {
    fn range(&self) -> Range<usize> {
        // Validated against the block data when the table was built.
        self.offset as usize..(self.offset + self.size) as usize
    }
}

/// The decoded contents of a bundle: the expanded block data and the files it holds.
///
/// A table always holds at least one file; the first is the primary stream.
#[derive(Debug, Clone)]
pub struct FileTable {
    guid: [u8; 16],
    blocks: Vec<StorageBlock>,
    nodes: Vec<FileNode>,
    data: Vec<u8>,
}

impl FileTable {
    /// Looks up a file by its exact name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.nodes
            .iter()
            .find(|node| node.name == name)
            .map(|node| &self.data[node.range()])
    }

    /// The payload of the first file.
    pub fn primary(&self) -> &[u8] {
        &self.data[self.nodes[0].range()]
    }

    /// Name of the first file.
    pub fn primary_name(&self) -> &str {
        &self.nodes[0].name
    }

    /// Directory entries in stored order.
    pub fn nodes(&self) -> &[FileNode] {
        &self.nodes
    }

    /// Storage blocks in stored order.
    pub fn blocks(&self) -> &[StorageBlock] {
        &self.blocks
    }

    /// The concatenation of all expanded blocks.
    pub fn block_data(&self) -> &[u8] {
        &self.data
    }

    /// The bundle's 16-byte identifier.
    pub fn guid(&self) -> &[u8; 16] {
        &self.guid
    }

    /// Iterates over `(name, payload)` pairs in stored order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.nodes
            .iter()
            .map(|node| (node.name.as_str(), &self.data[node.range()]))
    }
}

/// Reads the bundle envelope and expands its blocks.
///
/// `cursor` must sit just after the version labels and read big-endian.
pub(crate) fn decode(
    cursor: &mut ByteCursor<'_>,
    stream_version: u32,
    limits: &DecodeLimits,
) -> Result<FileTable> {
    let header = BundleHeader::read(cursor)?;
    log::trace!("bundle header: {header:?}");
    if stream_version >= 7 {
        cursor.align(16)?;
    }

    DecodeError::check_ceiling(
        "bundle block-info header",
        header.uncompressed_info_size.into(),
        limits.max_header_size.into(),
    )?;

    let info_len = header.compressed_info_size as usize;
    let stored_info = if header.info_at_end() {
        let resume = cursor.position();
        cursor.seek_from_end(info_len)?;
        let info = cursor.read(info_len)?;
        cursor.seek(resume)?;
        info
    } else {
        cursor.read(info_len)?
    };
    let info = compression::decompress(
        header.flags,
        stored_info,
        header.uncompressed_info_size as usize,
        CompressionSite::Header,
    )?;
    if header.block_padding() {
        cursor.align(16)?;
    }

    let mut directory = ByteCursor::with_endian(&info, Endian::Big);
    let guid = directory.read_array::<16>()?;

    let block_count = directory.read_u32()?;
    DecodeError::check_ceiling(
        "storage block table",
        block_count.into(),
        limits.max_blocks.into(),
    )?;
    let mut blocks = Vec::with_capacity(block_count as usize);
    for _ in 0..block_count {
        blocks.push(StorageBlock {
            uncompressed_size: directory.read_u32()?,
            compressed_size: directory.read_u32()?,
            flags: directory.read_u16()?,
        });
    }
    let data_len: u64 = blocks
        .iter()
        .map(|block| u64::from(block.uncompressed_size))
        .sum();
    DecodeError::check_ceiling("storage block data", data_len, limits.max_block_data)?;

    let node_count = directory.read_u32()?;
    DecodeError::check_ceiling(
        "bundle file directory",
        node_count.into(),
        limits.max_file_nodes.into(),
    )?;
    if node_count == 0 {
        return Err(DecodeError::corrupt_length(
            "bundle file directory",
            "no file nodes",
        ));
    }
    let mut nodes = Vec::with_capacity(node_count as usize);
    for _ in 0..node_count {
        nodes.push(FileNode {
            offset: directory.read_u64()?,
            size: directory.read_u64()?,
            status: directory.read_u32()?,
            name: directory.read_cstring_lossy()?,
        });
    }
    log::debug!(
        "bundle: {} storage block(s), {} file(s), {} bytes of block data",
        blocks.len(),
        nodes.len(),
        data_len
    );

    let mut data = Vec::with_capacity(data_len as usize);
    for (index, block) in blocks.iter().enumerate() {
        let stored = cursor.read(block.compressed_size as usize)?;
        let expanded = compression::decompress(
            u32::from(block.flags),
            stored,
            block.uncompressed_size as usize,
            CompressionSite::Block(index),
        )?;
        data.extend_from_slice(&expanded);
    }

    for node in &nodes {
        let end = node.offset.checked_add(node.size);
        if end.map_or(true, |end| end > data.len() as u64) {
            return Err(DecodeError::OutOfBounds {
                offset: usize::try_from(node.offset).unwrap_or(usize::MAX),
                need: usize::try_from(node.size).unwrap_or(usize::MAX),
                len: data.len(),
            });
        }
        log::trace!("file {:?}: {} bytes at {}", node.name, node.size, node.offset);
    }

    Ok(FileTable {
        guid,
        blocks,
        nodes,
        data,
    })
}
