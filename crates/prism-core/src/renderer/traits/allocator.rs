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

//! The seam through which backend-agnostic resources reach the native device.

use std::fmt;

use crate::renderer::api::{
    GpuBufferDesc, GpuBufferViewDesc, RawHandle, TextureDesc, TextureViewDesc,
};
use crate::renderer::error::RenderError;

/// Creates and destroys native resources on behalf of the generic resource types.
///
/// Buffers, textures and their views are defined once in the core crate; each
/// backend's device implements this trait so those generic types can allocate
/// their native counterparts on demand. Every method is core-thread-only.
pub trait NativeResourceAllocator: fmt::Debug + Send + Sync {
    /// The name of the backend that owns the native objects.
    fn backend_name(&self) -> &'static str;

    /// Creates a native buffer.
    fn create_buffer(&self, desc: &GpuBufferDesc) -> Result<RawHandle, RenderError>;

    /// Creates a typed view over a native buffer.
    fn create_buffer_view(
        &self,
        buffer: RawHandle,
        buffer_desc: &GpuBufferDesc,
        view: &GpuBufferViewDesc,
    ) -> Result<RawHandle, RenderError>;

    /// Creates a native texture.
    fn create_texture(&self, desc: &TextureDesc) -> Result<RawHandle, RenderError>;

    /// Creates a view over a native texture.
    fn create_texture_view(
        &self,
        texture: RawHandle,
        texture_desc: &TextureDesc,
        view: &TextureViewDesc,
    ) -> Result<RawHandle, RenderError>;

    /// Destroys any native object previously returned by this allocator.
    fn release(&self, handle: RawHandle);
}
