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

//! Lanes that load assets out of decoded containers.

mod loader;
pub mod pixel_format;
mod streamed;
mod texture_extractor_lane;

pub use loader::AssetLoaderLane;
pub use pixel_format::TextureFormat;
pub use streamed::{StreamedDataSource, StreamingInfo};
pub use texture_extractor_lane::{extract_texture, Texture, TextureExtractorLane};
