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

//! Implementations of the `relic` subcommands.
//!
//! Each command works on bytes already read into memory and returns what it
//! would print, so `main` owns all I/O.

use anyhow::{Context, Result};
use image::ImageFormat;
use relic_sdk::prelude::*;
use serde_json::json;
use std::fmt::Write;
use std::path::Path;

/// Summarises a container: dialect, serialized header, classes and objects.
pub fn info(decoder: &Decoder, bytes: &[u8]) -> Result<String> {
    let asset = decoder.decode(bytes).context("Failed to decode container")?;
    let mut out = String::new();
    let info = &asset.container.info;
    writeln!(
        out,
        "container: {} (stream version {}, engine {} / {})",
        info.dialect, info.stream_version, info.engine_version, info.engine_revision
    )?;
    if let Some(table) = asset.file_table() {
        for node in table.nodes() {
            writeln!(
                out,
                "  file {:?}: {} bytes at {:#x}",
                node.name, node.size, node.offset
            )?;
        }
    }

    let header = &asset.header;
    writeln!(
        out,
        "serialized file: generation {} ({}), {:?} endian, engine {:?}, platform {}",
        header.generation, header.shape, header.endian, header.engine_version, header.target_platform
    )?;
    writeln!(out, "classes: {}", asset.schema.len())?;
    for (index, class) in asset.schema.classes().iter().enumerate() {
        let objects = asset
            .objects
            .iter()
            .filter(|entry| entry.info.type_index == index)
            .count();
        writeln!(
            out,
            "  [{index}] class {} {}: {objects} object(s)",
            class.class_id,
            class.type_name().unwrap_or("<no type tree>")
        )?;
    }
    writeln!(out, "objects: {}", asset.objects.len())?;
    Ok(out)
}

/// Renders every decoded object, or only `path_id`, as pretty JSON.
///
/// Byte buffers longer than `max_bytes` are cut.
pub fn dump(
    decoder: &Decoder,
    bytes: &[u8],
    path_id: Option<i64>,
    max_bytes: usize,
) -> Result<String> {
    let asset = decoder.decode(bytes).context("Failed to decode container")?;
    let objects: Vec<_> = asset
        .objects
        .iter()
        .filter(|entry| path_id.map_or(true, |id| entry.info.path_id == id))
        .map(|entry| {
            let type_name = asset
                .schema
                .get(entry.info.type_index)
                .and_then(ClassSchema::type_name);
            json!({
                "path_id": entry.info.path_id,
                "class_id": entry.info.class_id,
                "type": type_name,
                "value": entry.value.truncated(max_bytes),
            })
        })
        .collect();
    if let (Some(id), true) = (path_id, objects.is_empty()) {
        anyhow::bail!("No object with path id {id}");
    }
    Ok(serde_json::to_string_pretty(&objects)?)
}

/// Extracts the first convertible texture.
pub fn extract(decoder: &Decoder, bytes: &[u8]) -> Result<Texture> {
    decoder
        .extract_texture(bytes)
        .context("Failed to extract a texture")
}

/// Encodes `texture` to `output` in the format named by its extension.
pub fn write_texture(texture: &Texture, output: &Path) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(output)
        .with_context(|| format!("Cannot tell the image format from '{}'", output.display()))?;
    texture
        .image
        .save_with_format(output, format)
        .with_context(|| format!("Failed to write image to '{}'", output.display()))?;
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_io::test_prelude::{
        node, raw_container, SerializedFileBuilder, TextureFixture, TEXTURE2D_CLASS_ID,
    };

    fn sample() -> Vec<u8> {
        let mut builder = SerializedFileBuilder::new(17);
        let tex = builder.class(TEXTURE2D_CLASS_ID, TextureFixture::nodes());
        let counter = builder.class(
            114,
            vec![node(0, "Counter", "Base", -1), node(1, "int", "m_Count", 4)],
        );
        let fixture = TextureFixture::new("logo", 1, 1, 7, vec![0x00, 0xf8]);
        let bytes = builder
            .object(10, tex, fixture.encode())
            .object(11, counter, 5i32.to_le_bytes().to_vec())
            .build();
        raw_container(2, &bytes)
    }

    #[test]
    fn test_info_lists_classes_and_objects() {
        let text = info(&Decoder::default(), &sample()).unwrap();
        assert!(text.starts_with("container: UnityRaw"), "{text}");
        assert!(text.contains("class 28 Texture2D: 1 object(s)"), "{text}");
        assert!(text.contains("class 114 Counter: 1 object(s)"), "{text}");
        assert!(text.contains("objects: 2"), "{text}");
    }

    #[test]
    fn test_dump_selects_and_truncates() {
        let text = dump(&Decoder::default(), &sample(), Some(11), 4).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["value"]["m_Count"], 5);
        assert_eq!(parsed[0]["type"], "Counter");

        let text = dump(&Decoder::default(), &sample(), None, 1).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["value"]["m_Name"], "l");
    }

    #[test]
    fn test_dump_unknown_path_id_fails() {
        assert!(dump(&Decoder::default(), &sample(), Some(99), 4).is_err());
    }

    #[test]
    fn test_extract_returns_first_texture() {
        let texture = extract(&Decoder::default(), &sample()).unwrap();
        assert_eq!(texture.name, "logo");
        assert_eq!(texture.image.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_write_texture_picks_format_from_extension() {
        let texture = extract(&Decoder::default(), &sample()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let png = dir.path().join("logo.png");
        assert_eq!(write_texture(&texture, &png).unwrap(), ImageFormat::Png);
        let reread = image::open(&png).unwrap().to_rgba8();
        assert_eq!(reread, texture.image);

        let err = write_texture(&texture, &dir.path().join("logo.unknown")).unwrap_err();
        assert!(err.to_string().contains("Cannot tell the image format"), "{err}");
    }

    #[test]
    fn test_garbage_input_reports_context() {
        let err = info(&Decoder::default(), b"NotAUnityFile\0").unwrap_err();
        assert_eq!(err.to_string(), "Failed to decode container");
        assert!(err.root_cause().to_string().contains("unsupported container format"));
    }
}
