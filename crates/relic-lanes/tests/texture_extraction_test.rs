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

use relic_core::{DecodeError, DecodeLimits};
use relic_io::test_prelude::{
    node, raw_container, BundleBuilder, SerializedFileBuilder, TextureFixture, TEXTURE2D_CLASS_ID,
};
use relic_io::SerializedAsset;
use relic_lanes::asset_lane::{AssetLoaderLane, TextureExtractorLane, TextureFormat};

const RED_GREEN_565: [u8; 4] = [0x00, 0xf8, 0xe0, 0x07];

fn texture_stream(textures: &[TextureFixture]) -> Vec<u8> {
    let mut builder = SerializedFileBuilder::new(17);
    let ty = builder.class(TEXTURE2D_CLASS_ID, TextureFixture::nodes());
    for (i, texture) in textures.iter().enumerate() {
        builder = builder.object(i as i64 + 1, ty, texture.encode());
    }
    builder.build()
}

#[test]
fn test_inline_texture_from_raw_container() {
    let stream = texture_stream(&[TextureFixture::new("card", 2, 1, 7, RED_GREEN_565.to_vec())]);
    let bytes = raw_container(3, &stream);

    let texture = TextureExtractorLane::default()
        .load(&bytes)
        .expect("an inline BGR565 texture must extract");
    assert_eq!(texture.name, "card");
    assert_eq!(texture.format, TextureFormat::Bgr565);
    assert_eq!(texture.image.dimensions(), (2, 1));
    assert_eq!(texture.image.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(texture.image.get_pixel(1, 0).0, [0, 255, 0, 255]);
}

#[test]
fn test_streamed_texture_resolves_through_the_bundle() {
    // Pixels live at offset 4 of the resource file, stored bottom row first.
    let mut resource = vec![0xee; 4];
    resource.extend_from_slice(&0x000fu16.to_le_bytes());
    resource.extend_from_slice(&0xf00fu16.to_le_bytes());
    let fixture = TextureFixture::new("emblem", 1, 2, 13, Vec::new()).streamed(
        "archive:/CAB-emblem/CAB-emblem.resS",
        4,
        4,
    );
    let bytes = BundleBuilder::new(6)
        .file("CAB-emblem", &texture_stream(&[fixture]))
        .file("CAB-emblem.resS", &resource)
        .build();

    let texture = TextureExtractorLane::default().load(&bytes).unwrap();
    assert_eq!(texture.format, TextureFormat::Abgr4444);
    assert_eq!(texture.image.get_pixel(0, 0).0, [255, 0, 0, 255], "top row");
    assert_eq!(texture.image.get_pixel(0, 1).0, [0, 0, 0, 255], "bottom row");
}

#[test]
fn test_missing_streamed_file_is_reported_by_name() {
    let fixture = TextureFixture::new("emblem", 1, 1, 7, Vec::new()).streamed(
        "archive:/CAB-emblem/CAB-absent.resS",
        0,
        2,
    );
    let bytes = BundleBuilder::new(6)
        .file("CAB-emblem", &texture_stream(&[fixture]))
        .file("CAB-emblem.resS", &[0; 2])
        .build();

    let err = TextureExtractorLane::default().load(&bytes).unwrap_err();
    match err {
        DecodeError::UnresolvedStreamedAsset { name } => assert_eq!(name, "CAB-absent.resS"),
        other => panic!("expected an unresolved streamed asset, got {other}"),
    }
}

#[test]
fn test_streamed_data_in_raw_container_is_unavailable() {
    let fixture = TextureFixture::new("emblem", 1, 1, 7, Vec::new()).streamed("CAB-x.resS", 0, 2);
    let bytes = raw_container(1, &texture_stream(&[fixture]));

    let err = TextureExtractorLane::default().load(&bytes).unwrap_err();
    assert!(
        matches!(err, DecodeError::UnsupportedPixelFormat { candidates: 1 }),
        "unexpected error: {err}"
    );
}

#[test]
fn test_unsupported_formats_are_skipped() {
    let stream = texture_stream(&[
        TextureFixture::new("dxt", 4, 4, 10, vec![0; 8]),
        TextureFixture::new("empty", 1, 1, 7, Vec::new()),
        TextureFixture::new("fallback", 2, 1, 7, RED_GREEN_565.to_vec()),
    ]);
    let bytes = raw_container(1, &stream);
    let asset = SerializedAsset::decode(&bytes, &DecodeLimits::default()).unwrap();

    let texture = TextureExtractorLane::default().extract(&asset).unwrap();
    assert_eq!(texture.name, "fallback");
    assert_eq!(texture.path_id, 3);
}

#[test]
fn test_no_supported_candidate() {
    let stream = texture_stream(&[
        TextureFixture::new("dxt1", 4, 4, 10, vec![0; 8]),
        TextureFixture::new("etc2", 4, 4, 45, vec![0; 8]),
    ]);
    let bytes = raw_container(1, &stream);
    let err = TextureExtractorLane::default().load(&bytes).unwrap_err();
    assert!(
        matches!(err, DecodeError::UnsupportedPixelFormat { candidates: 2 }),
        "unexpected error: {err}"
    );

    let mut builder = SerializedFileBuilder::new(17);
    let ty = builder.class(1, vec![node(0, "GameObject", "Base", -1), node(1, "int", "m_Layer", 4)]);
    let bytes = raw_container(1, &builder.object(1, ty, vec![0; 4]).build());
    let err = TextureExtractorLane::default().load(&bytes).unwrap_err();
    assert!(matches!(err, DecodeError::UnsupportedPixelFormat { candidates: 0 }));
}

#[test]
fn test_short_pixel_data_is_corrupt() {
    let stream = texture_stream(&[TextureFixture::new("short", 4, 4, 7, vec![0; 6])]);
    let bytes = raw_container(1, &stream);
    let err = TextureExtractorLane::default().load(&bytes).unwrap_err();
    assert!(matches!(err, DecodeError::CorruptLength { .. }), "{err}");
}
