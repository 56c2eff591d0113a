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

//! Creates buffers, textures and vertex declarations for one backend.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use super::api::{
    BufferUsage, GpuBuffer, GpuBufferDesc, GpuParamBlockBuffer, IndexBuffer, IndexType,
    RenderTexture, RenderTextureDesc, Texture, TextureDesc, VertexBuffer, VertexColorFormat,
    VertexDeclaration, VertexElement,
};
use super::error::RenderError;
use super::traits::NativeResourceAllocator;
use crate::utils::sync;

/// Allocates hardware resources through a backend's native allocator.
///
/// Vertex declarations are deduplicated: structurally equal element lists
/// share one declaration, and therefore one id, while any holder keeps it
/// alive. Backend caches keyed by declaration id rely on this.
pub struct HardwareBufferManager {
    allocator: Arc<dyn NativeResourceAllocator>,
    color_format: VertexColorFormat,
    declarations: Mutex<Vec<Weak<VertexDeclaration>>>,
}

impl HardwareBufferManager {
    /// Creates a manager allocating through `allocator`, resolving vertex
    /// colors to `color_format`.
    pub fn new(
        allocator: Arc<dyn NativeResourceAllocator>,
        color_format: VertexColorFormat,
    ) -> Self {
        Self {
            allocator,
            color_format,
            declarations: Mutex::new(Vec::new()),
        }
    }

    /// The native allocator.
    pub fn allocator(&self) -> &Arc<dyn NativeResourceAllocator> {
        &self.allocator
    }

    /// The packed vertex color layout of this backend.
    pub fn color_format(&self) -> VertexColorFormat {
        self.color_format
    }

    /// Returns the declaration for `elements`, reusing a live equal one.
    pub fn create_vertex_declaration(&self, elements: Vec<VertexElement>) -> Arc<VertexDeclaration> {
        let candidate = VertexDeclaration::new(elements, self.color_format);
        let mut declarations = sync::lock(&self.declarations);
        declarations.retain(|d| d.strong_count() > 0);
        if let Some(existing) = declarations
            .iter()
            .filter_map(Weak::upgrade)
            .find(|d| **d == candidate)
        {
            return existing;
        }
        let declaration = Arc::new(candidate);
        declarations.push(Arc::downgrade(&declaration));
        declaration
    }

    /// Creates a vertex buffer.
    pub fn create_vertex_buffer(
        &self,
        vertex_size: u32,
        num_vertices: u32,
        usage: BufferUsage,
    ) -> Result<Arc<VertexBuffer>, RenderError> {
        Ok(Arc::new(VertexBuffer::new(
            vertex_size,
            num_vertices,
            usage,
            &self.allocator,
        )?))
    }

    /// Creates an index buffer.
    pub fn create_index_buffer(
        &self,
        index_type: IndexType,
        num_indices: u32,
        usage: BufferUsage,
    ) -> Result<Arc<IndexBuffer>, RenderError> {
        Ok(Arc::new(IndexBuffer::new(
            index_type,
            num_indices,
            usage,
            &self.allocator,
        )?))
    }

    /// Creates a parameter block buffer of `size_bytes` bytes.
    pub fn create_param_block_buffer(
        &self,
        size_bytes: u32,
        usage: BufferUsage,
    ) -> Result<Arc<GpuParamBlockBuffer>, RenderError> {
        Ok(Arc::new(GpuParamBlockBuffer::new(
            size_bytes,
            usage,
            &self.allocator,
        )?))
    }

    /// Creates a generic buffer.
    pub fn create_gpu_buffer(&self, desc: GpuBufferDesc) -> Result<Arc<GpuBuffer>, RenderError> {
        Ok(Arc::new(GpuBuffer::new(desc, &self.allocator)?))
    }

    /// Creates a texture.
    pub fn create_texture(&self, desc: TextureDesc) -> Result<Arc<Texture>, RenderError> {
        Ok(Arc::new(Texture::new(desc, &self.allocator)?))
    }

    /// Creates a render texture with at most `max_render_targets` color attachments.
    pub fn create_render_texture(
        &self,
        desc: RenderTextureDesc,
        max_render_targets: u32,
    ) -> Result<Arc<RenderTexture>, RenderError> {
        Ok(Arc::new(RenderTexture::new(
            desc,
            max_render_targets,
            &self.allocator,
        )?))
    }
}

impl fmt::Debug for HardwareBufferManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareBufferManager")
            .field("backend", &self.allocator.backend_name())
            .field("color_format", &self.color_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::{VertexElementSemantic, VertexElementType};
    use crate::renderer::testing::RecordingAllocator;

    fn position() -> VertexElement {
        VertexElement::new(
            0,
            0,
            VertexElementType::Float3,
            VertexElementSemantic::Position,
            0,
        )
    }

    #[test]
    fn test_equal_declarations_share_an_id() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let manager = HardwareBufferManager::new(allocator, VertexColorFormat::Abgr);

        let a = manager.create_vertex_declaration(vec![position()]);
        let b = manager.create_vertex_declaration(vec![position()]);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_dropped_declaration_is_not_reused() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let manager = HardwareBufferManager::new(allocator, VertexColorFormat::Abgr);

        let first_id = manager.create_vertex_declaration(vec![position()]).id();
        let second = manager.create_vertex_declaration(vec![position()]);
        assert_ne!(first_id, second.id());
    }

    #[test]
    fn test_colors_resolve_to_backend_format() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let manager = HardwareBufferManager::new(allocator, VertexColorFormat::Argb);
        let decl = manager.create_vertex_declaration(vec![VertexElement::new(
            0,
            0,
            VertexElementType::Color,
            VertexElementSemantic::Color,
            0,
        )]);
        assert_eq!(decl.elements()[0].ty, VertexElementType::ColorArgb);
    }
}
