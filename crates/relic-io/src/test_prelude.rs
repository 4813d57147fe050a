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

//! Builders for synthetic containers, shared by tests across the workspace.
//!
//! Everything here writes the same layouts the decoders read, so fixtures
//! can be assembled field by field instead of checked in as binary blobs.

use crate::container::CompressionCodec;
use crate::schema::{common_strings, ALIGN_BYTES_FLAG};
use crate::serialized::HeaderShape;
use relic_core::Endian;

/// Class id of `Texture2D` objects.
pub const TEXTURE2D_CLASS_ID: i32 = 28;

struct Writer {
    buf: Vec<u8>,
    endian: Endian,
    base: usize,
}

impl Writer {
    fn new(endian: Endian, base: usize) -> Self {
        Self {
            buf: Vec::new(),
            endian,
            base,
        }
    }

    fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        match self.endian {
            Endian::Little => self.bytes(&v.to_le_bytes()),
            Endian::Big => self.bytes(&v.to_be_bytes()),
        }
    }

    fn u32(&mut self, v: u32) {
        match self.endian {
            Endian::Little => self.bytes(&v.to_le_bytes()),
            Endian::Big => self.bytes(&v.to_be_bytes()),
        }
    }

    fn u64(&mut self, v: u64) {
        match self.endian {
            Endian::Little => self.bytes(&v.to_le_bytes()),
            Endian::Big => self.bytes(&v.to_be_bytes()),
        }
    }

    fn i16(&mut self, v: i16) {
        self.u16(v as u16);
    }

    fn i32(&mut self, v: i32) {
        self.u32(v as u32);
    }

    fn i64(&mut self, v: i64) {
        self.u64(v as u64);
    }

    fn cstr(&mut self, s: &str) {
        self.bytes(s.as_bytes());
        self.u8(0);
    }

    fn align(&mut self, boundary: usize) {
        while (self.base + self.buf.len()) % boundary != 0 {
            self.u8(0);
        }
    }
}

/// One type-tree node to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    /// Nesting level.
    pub level: u8,
    /// Type name.
    pub type_name: String,
    /// Field name.
    pub name: String,
    /// Declared size; `-1` for variable.
    pub size: i32,
    /// Array marker.
    pub is_array: bool,
    /// Meta flags.
    pub flags: u32,
}

/// A plain node.
pub fn node(level: u8, type_name: &str, name: &str, size: i32) -> NodeRow {
    NodeRow {
        level,
        type_name: type_name.to_owned(),
        name: name.to_owned(),
        size,
        is_array: false,
        flags: 0,
    }
}

impl NodeRow {
    /// Marks the node as an array.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Sets the realign-after flag.
    pub fn align_after(mut self) -> Self {
        self.flags |= ALIGN_BYTES_FLAG;
        self
    }
}

/// The four nodes of a `string` field: the record, its array, length and chars.
pub fn string_nodes(level: u8, name: &str) -> Vec<NodeRow> {
    vec![
        node(level, "string", name, -1).align_after(),
        node(level + 1, "Array", "Array", -1).array(),
        node(level + 2, "int", "size", 4),
        node(level + 2, "char", "data", 1),
    ]
}

/// Encodes a length-prefixed, 4-aligned byte field in little-endian order.
pub fn encode_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
    out.extend_from_slice(bytes);
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Where a texture's pixels live when they are not inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRef {
    /// Path of the file holding the pixels.
    pub path: String,
    /// Offset within that file.
    pub offset: u32,
    /// Length in bytes.
    pub size: u32,
}

/// A `Texture2D`-shaped object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureFixture {
    /// Object name.
    pub name: String,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Pixel format code.
    pub format: i32,
    /// Inline pixel data.
    pub image_data: Vec<u8>,
    /// External pixel data.
    pub stream: Option<StreamRef>,
}

impl TextureFixture {
    /// A texture with inline pixels.
    pub fn new(name: &str, width: i32, height: i32, format: i32, image_data: Vec<u8>) -> Self {
        Self {
            name: name.to_owned(),
            width,
            height,
            format,
            image_data,
            stream: None,
        }
    }

    /// Points the texture at external pixels and clears the inline ones.
    pub fn streamed(mut self, path: &str, offset: u32, size: u32) -> Self {
        self.image_data.clear();
        self.stream = Some(StreamRef {
            path: path.to_owned(),
            offset,
            size,
        });
        self
    }

    /// The type tree all fixtures share.
    pub fn nodes() -> Vec<NodeRow> {
        let mut nodes = vec![node(0, "Texture2D", "Base", -1)];
        nodes.extend(string_nodes(1, "m_Name"));
        nodes.extend([
            node(1, "int", "m_Width", 4),
            node(1, "int", "m_Height", 4),
            node(1, "int", "m_TextureFormat", 4),
            node(1, "bool", "m_IsReadable", 1).align_after(),
            node(1, "TypelessData", "image data", -1).array().align_after(),
            node(2, "int", "size", 4),
            node(2, "UInt8", "data", 1),
            node(1, "StreamingInfo", "m_StreamData", -1),
            node(2, "unsigned int", "offset", 4),
            node(2, "unsigned int", "size", 4),
        ]);
        nodes.extend(string_nodes(2, "path"));
        nodes
    }

    /// Little-endian object data matching [`TextureFixture::nodes`].
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        encode_bytes(&mut out, self.name.as_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.format.to_le_bytes());
        out.extend_from_slice(&[1, 0, 0, 0]);
        encode_bytes(&mut out, &self.image_data);
        let (path, offset, size) = match &self.stream {
            Some(s) => (s.path.as_str(), s.offset, s.size),
            None => ("", 0, 0),
        };
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        encode_bytes(&mut out, path.as_bytes());
        out
    }
}

/// Assembles a serialized file: header, type table, object directory and data.
#[derive(Debug, Clone)]
pub struct SerializedFileBuilder {
    generation: u32,
    endian: Endian,
    type_trees: bool,
    common_strings: bool,
    type_dependencies: Vec<i32>,
    classes: Vec<(i32, Vec<NodeRow>)>,
    objects: Vec<(i64, usize, Vec<u8>)>,
}

impl SerializedFileBuilder {
    /// A little-endian file of the given generation with type trees.
    pub fn new(generation: u32) -> Self {
        Self {
            generation,
            endian: Endian::Little,
            type_trees: true,
            common_strings: false,
            type_dependencies: Vec::new(),
            classes: Vec::new(),
            objects: Vec::new(),
        }
    }

    /// Writes metadata and object data big-endian.
    pub fn big_endian(mut self) -> Self {
        self.endian = Endian::Big;
        self
    }

    /// Omits type trees from class records.
    pub fn without_type_trees(mut self) -> Self {
        self.type_trees = false;
        self
    }

    /// Refers to well-known names through the built-in string table.
    pub fn with_common_strings(mut self) -> Self {
        self.common_strings = true;
        self
    }

    /// Lists `deps` as every class's type dependencies (generation 21 and later).
    pub fn with_type_dependencies(mut self, deps: &[i32]) -> Self {
        self.type_dependencies = deps.to_vec();
        self
    }

    /// Declares a class and returns its type index.
    pub fn class(&mut self, class_id: i32, nodes: Vec<NodeRow>) -> usize {
        self.classes.push((class_id, nodes));
        self.classes.len() - 1
    }

    /// Adds an object of the class at `type_index`.
    pub fn object(mut self, path_id: i64, type_index: usize, data: Vec<u8>) -> Self {
        self.objects.push((path_id, type_index, data));
        self
    }

    /// Serializes the file.
    ///
    /// # Panics
    /// Panics if the generation is older than the decoder supports.
    pub fn build(&self) -> Vec<u8> {
        let shape = HeaderShape::for_generation(self.generation)
            .expect("builder generation must be supported");
        let header_len = if shape.wide_header() { 48 } else { 20 };

        let mut meta = Writer::new(self.endian, header_len);
        meta.cstr("2019.4.40f1");
        meta.u32(5);
        meta.u8(self.type_trees as u8);
        meta.u32(self.classes.len() as u32);
        for (class_id, nodes) in &self.classes {
            meta.i32(*class_id);
            if shape.class_has_stripped_flag() {
                meta.u8(0);
            }
            if shape.class_has_script_index() {
                meta.i16(-1);
            }
            if shape.class_has_script_id(*class_id) {
                meta.bytes(&[0x11; 16]);
            }
            meta.bytes(&[0x22; 16]);
            if self.type_trees {
                self.write_tree(&mut meta, shape, nodes);
                if shape.has_type_dependencies() {
                    meta.i32(self.type_dependencies.len() as i32);
                    for &dep in &self.type_dependencies {
                        meta.i32(dep);
                    }
                }
            }
        }

        let mut starts = Vec::with_capacity(self.objects.len());
        let mut data_len = 0usize;
        for (_, _, data) in &self.objects {
            data_len = data_len.next_multiple_of(8);
            starts.push(data_len);
            data_len += data.len();
        }

        meta.u32(self.objects.len() as u32);
        for ((path_id, type_index, data), start) in self.objects.iter().zip(&starts) {
            let class_id = self.classes.get(*type_index).map_or(-1, |c| c.0);
            meta.align(4);
            meta.i64(*path_id);
            if shape.wide_object_offset() {
                meta.u64(*start as u64);
            } else {
                meta.u32(*start as u32);
            }
            meta.u32(data.len() as u32);
            if shape.resolves_by_type_index() {
                meta.i32(*type_index as i32);
            } else {
                meta.i32(class_id);
            }
            if shape.object_has_class_id() {
                meta.u16(class_id as u16);
            }
            if shape.object_has_script_index() {
                meta.i16(-1);
            }
            if shape.object_has_stripped_byte() {
                meta.u8(0);
            }
        }
        // Script types, externals and user info; never read by the decoder.
        meta.i32(0);
        meta.i32(0);
        meta.cstr("");

        let metadata = meta.buf;
        let data_offset = (header_len + metadata.len()).next_multiple_of(16);
        let file_size = data_offset + data_len;

        let mut out = Writer::new(Endian::Big, 0);
        if shape.wide_header() {
            out.u32(0);
            out.u32(0);
            out.u32(self.generation);
            out.u32(0);
        } else {
            out.u32(metadata.len() as u32);
            out.u32(file_size as u32);
            out.u32(self.generation);
            out.u32(data_offset as u32);
        }
        out.u8(u8::from(self.endian == Endian::Big));
        out.bytes(&[0; 3]);
        if shape.wide_header() {
            out.u32(metadata.len() as u32);
            out.u64(file_size as u64);
            out.u64(data_offset as u64);
            out.u64(0);
        }
        out.bytes(&metadata);
        out.align(16);
        for ((_, _, data), start) in self.objects.iter().zip(&starts) {
            out.bytes(&vec![0; data_offset + start - out.buf.len()]);
            out.bytes(data);
        }
        out.buf
    }

    fn write_tree(&self, meta: &mut Writer, shape: HeaderShape, nodes: &[NodeRow]) {
        let mut strings = Vec::new();
        let mut offsets = Vec::with_capacity(nodes.len());
        for row in nodes {
            let type_offset = self.intern(&mut strings, &row.type_name);
            let name_offset = self.intern(&mut strings, &row.name);
            offsets.push((type_offset, name_offset));
        }

        meta.i32(nodes.len() as i32);
        meta.i32(strings.len() as i32);
        for (index, (row, (type_offset, name_offset))) in nodes.iter().zip(offsets).enumerate() {
            meta.u16(1);
            meta.u8(row.level);
            meta.u8(row.is_array as u8);
            meta.u32(type_offset);
            meta.u32(name_offset);
            meta.i32(row.size);
            meta.i32(index as i32);
            meta.u32(row.flags);
            if shape.node_record_width() == 32 {
                meta.u64(0);
            }
        }
        meta.bytes(&strings);
    }

    fn intern(&self, strings: &mut Vec<u8>, s: &str) -> u32 {
        if self.common_strings {
            if let Some(offset) = common_strings::offset_of(s) {
                return offset | common_strings::COMMON_STRING_FLAG;
            }
        }
        let offset = strings.len() as u32;
        strings.extend_from_slice(s.as_bytes());
        strings.push(0);
        offset
    }
}

/// Wraps a stream in a raw container of the given stream version.
pub fn raw_container(stream_version: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Writer::new(Endian::Big, 0);
    out.cstr("UnityRaw");
    out.u32(stream_version);
    out.cstr("5.x.x");
    out.cstr("5.6.7f1");

    let prefix_len = out.buf.len();
    let mut header_end = prefix_len + 16;
    if stream_version >= 2 {
        header_end += 4;
    }
    if stream_version >= 3 {
        header_end += 4;
    }

    out.u32((header_end + payload.len()) as u32);
    // From version 3 the payload offset is split into header and data-header sizes.
    if stream_version >= 3 {
        out.u32(prefix_len as u32);
    } else {
        out.u32(header_end as u32);
    }
    out.u32(1);
    out.u32(0);
    if stream_version >= 2 {
        out.u32(0);
    }
    if stream_version >= 3 {
        out.u32((header_end - prefix_len) as u32);
    }
    out.bytes(payload);
    out.buf
}

/// Assembles a bundle from storage blocks and file nodes.
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    stream_version: u32,
    header_codec: CompressionCodec,
    directory_at_end: bool,
    block_padding: bool,
    blocks: Vec<(Vec<u8>, CompressionCodec)>,
    nodes: Vec<(String, u64, u64)>,
}

impl BundleBuilder {
    /// An empty bundle with a stored directory.
    pub fn new(stream_version: u32) -> Self {
        Self {
            stream_version,
            header_codec: CompressionCodec::None,
            directory_at_end: false,
            block_padding: false,
            blocks: Vec::new(),
            nodes: Vec::new(),
        }
    }

    /// Compresses the directory with `codec`.
    pub fn header_codec(mut self, codec: CompressionCodec) -> Self {
        self.header_codec = codec;
        self
    }

    /// Stores the directory at the end of the file.
    pub fn directory_at_end(mut self) -> Self {
        self.directory_at_end = true;
        self
    }

    /// Pads block data to 16 bytes.
    pub fn block_padding(mut self) -> Self {
        self.block_padding = true;
        self
    }

    /// Appends a storage block holding `data`.
    pub fn block(mut self, data: &[u8], codec: CompressionCodec) -> Self {
        self.blocks.push((data.to_vec(), codec));
        self
    }

    /// Appends a directory entry.
    pub fn node(mut self, name: &str, offset: u64, size: u64) -> Self {
        self.nodes.push((name.to_owned(), offset, size));
        self
    }

    /// Appends `data` as its own LZ4 block and a node spanning exactly that block.
    pub fn file(self, name: &str, data: &[u8]) -> Self {
        let offset: u64 = self.blocks.iter().map(|(b, _)| b.len() as u64).sum();
        self.block(data, CompressionCodec::Lz4)
            .node(name, offset, data.len() as u64)
    }

    /// Serializes the bundle.
    pub fn build(&self) -> Vec<u8> {
        let mut dir = Writer::new(Endian::Big, 0);
        dir.bytes(&[0x5a; 16]);
        dir.u32(self.blocks.len() as u32);
        let stored: Vec<Vec<u8>> = self
            .blocks
            .iter()
            .map(|(data, codec)| compress(data, *codec))
            .collect();
        for ((data, codec), stored) in self.blocks.iter().zip(&stored) {
            dir.u32(data.len() as u32);
            dir.u32(stored.len() as u32);
            dir.u16(codec.code() as u16);
        }
        dir.u32(self.nodes.len() as u32);
        for (name, offset, size) in &self.nodes {
            dir.u64(*offset);
            dir.u64(*size);
            dir.u32(4);
            dir.cstr(name);
        }
        let directory = dir.buf;
        let stored_directory = compress(&directory, self.header_codec);

        let mut flags = self.header_codec.code() | 0x40;
        if self.directory_at_end {
            flags |= 0x80;
        }
        if self.block_padding {
            flags |= 0x200;
        }

        let mut out = Writer::new(Endian::Big, 0);
        out.cstr("UnityFS");
        out.u32(self.stream_version);
        out.cstr("5.x.x");
        out.cstr("2019.4.40f1");
        let total_at = out.buf.len();
        out.u64(0);
        out.u32(stored_directory.len() as u32);
        out.u32(directory.len() as u32);
        out.u32(flags);
        if self.stream_version >= 7 {
            out.align(16);
        }
        if !self.directory_at_end {
            out.bytes(&stored_directory);
        }
        if self.block_padding {
            out.align(16);
        }
        for block in &stored {
            out.bytes(block);
        }
        if self.directory_at_end {
            out.bytes(&stored_directory);
        }

        let total = out.buf.len() as u64;
        out.buf[total_at..total_at + 8].copy_from_slice(&total.to_be_bytes());
        out.buf
    }
}

fn compress(data: &[u8], codec: CompressionCodec) -> Vec<u8> {
    match codec {
        CompressionCodec::Lz4 | CompressionCodec::Lz4Hc => lz4_flex::block::compress(data),
        // Codecs the decoder rejects are written as is.
        _ => data.to_vec(),
    }
}
