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

use relic_core::Result;

/// A trait for types that can load a specific kind of asset from a byte slice.
///
/// Implementors own the CPU-bound work of decoding a container buffer that is
/// already fully resident in memory. Each loader is specialized for a single
/// asset type `A`.
pub trait AssetLoaderLane<A> {
    /// Decodes `bytes` into an instance of `A`.
    ///
    /// # Parameters
    /// - `bytes`: The raw bytes of one container file.
    fn load(&self, bytes: &[u8]) -> Result<A>;
}
