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

//! GPU buffers and their views.

use std::fmt;
use std::sync::{Arc, Mutex};

use super::view::{ResourceView, ViewCache, ViewLease};
use super::{BufferUsage, GpuViewUsage, IndexType, NativeObject, RawHandle};
use crate::renderer::error::RenderError;
use crate::renderer::traits::NativeResourceAllocator;
use crate::utils::{sync, IdGenerator};

static BUFFER_IDS: IdGenerator = IdGenerator::new();

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuBufferKind {
    /// Per-vertex data.
    Vertex,
    /// Indices of the given width.
    Index(IndexType),
    /// A constant (uniform) block.
    ParamBlock,
    /// A generic buffer read or written through typed views.
    Generic(GpuBufferType),
}

/// Layout of a generic buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuBufferType {
    /// Elements are typed by [`GpuBufferFormat`].
    Standard,
    /// Elements are structs of `element_size` bytes.
    Structured,
}

/// Element format of a standard generic buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GpuBufferFormat {
    /// Untyped, used for vertex, index, param-block and structured buffers.
    #[default]
    Unknown,
    /// One 32-bit float.
    R32Float,
    /// Two 32-bit floats.
    R32G32Float,
    /// Four 32-bit floats.
    R32G32B32A32Float,
    /// One 32-bit unsigned integer.
    R32Uint,
    /// One 32-bit signed integer.
    R32Sint,
    /// Four 8-bit normalized channels.
    R8G8B8A8Unorm,
}

impl GpuBufferFormat {
    /// Size of one element in bytes, or 0 for [`GpuBufferFormat::Unknown`].
    pub const fn element_size(self) -> u32 {
        match self {
            GpuBufferFormat::Unknown => 0,
            GpuBufferFormat::R32Float
            | GpuBufferFormat::R32Uint
            | GpuBufferFormat::R32Sint
            | GpuBufferFormat::R8G8B8A8Unorm => 4,
            GpuBufferFormat::R32G32Float => 8,
            GpuBufferFormat::R32G32B32A32Float => 16,
        }
    }
}

/// Describes a [`GpuBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuBufferDesc {
    /// What the buffer is bound as.
    pub kind: GpuBufferKind,
    /// Number of elements.
    pub element_count: u32,
    /// Size of one element in bytes.
    pub element_size: u32,
    /// Element format for standard generic buffers.
    pub format: GpuBufferFormat,
    /// Update frequency.
    pub usage: BufferUsage,
    /// Whether random-write (load/store) views can be created.
    pub random_write: bool,
    /// Whether views may carry a hidden append/consume counter.
    pub use_counter: bool,
}

impl GpuBufferDesc {
    /// Total size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.element_count as u64 * self.element_size as u64
    }
}

/// Describes a view over a range of buffer elements. Also the view cache key.
///
/// The counter flag is part of the key, because a view without a hidden
/// counter cannot serve a request for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuBufferViewDesc {
    /// First element in the view.
    pub first_element: u32,
    /// Width of one element in bytes, as seen through the view.
    pub element_width: u32,
    /// Number of elements in the view.
    pub num_elements: u32,
    /// Whether the view carries an append/consume counter.
    pub use_counter: bool,
    /// How the view is bound.
    pub usage: GpuViewUsage,
}

/// A view over a [`GpuBuffer`].
pub type GpuBufferView = ResourceView<GpuBufferViewDesc>;

/// A GPU buffer with a CPU-visible shadow of its contents.
pub struct GpuBuffer {
    id: u32,
    desc: GpuBufferDesc,
    native: NativeObject,
    allocator: Arc<dyn NativeResourceAllocator>,
    views: Arc<ViewCache<GpuBufferViewDesc>>,
    data: Mutex<Vec<u8>>,
}

impl GpuBuffer {
    /// Allocates a buffer through `allocator`.
    pub fn new(
        desc: GpuBufferDesc,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        if desc.element_count == 0 || desc.element_size == 0 {
            return Err(RenderError::InvalidParameters(format!(
                "Buffer must have a non-zero size, got {} elements of {} bytes",
                desc.element_count, desc.element_size
            )));
        }
        let handle = allocator.create_buffer(&desc)?;
        let id = BUFFER_IDS.next_id();
        Ok(Self {
            id,
            desc,
            native: NativeObject::new(handle, allocator),
            allocator: allocator.clone(),
            views: Arc::new(ViewCache::new(id)),
            data: Mutex::new(vec![0; desc.size_bytes() as usize]),
        })
    }

    /// A process-unique id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The creation descriptor.
    pub fn desc(&self) -> &GpuBufferDesc {
        &self.desc
    }

    /// The native buffer handle.
    pub fn native_handle(&self) -> RawHandle {
        self.native.handle()
    }

    /// Total size in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.desc.size_bytes()
    }

    /// Returns the shared view for the given range and usage, creating it on first request.
    ///
    /// Every call adds one reference that must be returned with [`GpuBuffer::release_view`].
    pub fn request_view(
        &self,
        first_element: u32,
        element_width: u32,
        num_elements: u32,
        use_counter: bool,
        usage: GpuViewUsage,
    ) -> Result<Arc<GpuBufferView>, RenderError> {
        let key = self.view_key(first_element, element_width, num_elements, use_counter, usage)?;
        self.views.request(key, |key| self.create_native_view(key))
    }

    /// Like [`GpuBuffer::request_view`], but the reference is released when the lease drops.
    pub fn lease_view(
        &self,
        first_element: u32,
        element_width: u32,
        num_elements: u32,
        use_counter: bool,
        usage: GpuViewUsage,
    ) -> Result<ViewLease<GpuBufferViewDesc>, RenderError> {
        let key = self.view_key(first_element, element_width, num_elements, use_counter, usage)?;
        ViewLease::acquire(&self.views, key, |key| self.create_native_view(key))
    }

    /// Releases one reference obtained from [`GpuBuffer::request_view`].
    pub fn release_view(&self, view: &GpuBufferView) -> Result<(), RenderError> {
        self.views.release(view)
    }

    /// Destroys every view of this buffer regardless of outstanding references.
    pub fn clear_buffer_views(&self) {
        self.views.clear();
    }

    /// The number of live views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// The outstanding references on the view matching `key`.
    pub fn view_ref_count(&self, key: &GpuBufferViewDesc) -> Option<u32> {
        self.views.ref_count(key)
    }

    /// Copies `bytes` into the buffer at `offset`.
    ///
    /// With `discard` the previous contents are zeroed first.
    pub fn write_data(&self, offset: u64, bytes: &[u8], discard: bool) -> Result<(), RenderError> {
        let range = self.checked_range(offset, bytes.len() as u64)?;
        let mut data = sync::lock(&self.data);
        if discard {
            data.fill(0);
        }
        data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Reads `len` bytes starting at `offset`.
    pub fn read_data(&self, offset: u64, len: u64) -> Result<Vec<u8>, RenderError> {
        let range = self.checked_range(offset, len)?;
        Ok(sync::lock(&self.data)[range].to_vec())
    }

    fn checked_range(&self, offset: u64, len: u64) -> Result<std::ops::Range<usize>, RenderError> {
        let end = offset.checked_add(len).filter(|end| *end <= self.size_bytes());
        match end {
            Some(end) => Ok(offset as usize..end as usize),
            None => Err(RenderError::InvalidParameters(format!(
                "Range {offset}..{} is outside buffer {} of {} bytes",
                offset.saturating_add(len),
                self.id,
                self.size_bytes()
            ))),
        }
    }

    fn view_key(
        &self,
        first_element: u32,
        element_width: u32,
        num_elements: u32,
        use_counter: bool,
        usage: GpuViewUsage,
    ) -> Result<GpuBufferViewDesc, RenderError> {
        let in_range = first_element
            .checked_add(num_elements)
            .is_some_and(|end| end <= self.desc.element_count);
        if !in_range || num_elements == 0 {
            return Err(RenderError::InvalidParameters(format!(
                "View range {first_element}+{num_elements} is outside buffer {} of {} elements",
                self.id, self.desc.element_count
            )));
        }
        if usage.contains(GpuViewUsage::RANDOM_WRITE) && !self.desc.random_write {
            return Err(RenderError::InvalidParameters(format!(
                "Buffer {} was not created with random write support",
                self.id
            )));
        }
        if use_counter && !self.desc.use_counter {
            return Err(RenderError::InvalidParameters(format!(
                "Buffer {} was not created with counter support",
                self.id
            )));
        }
        Ok(GpuBufferViewDesc {
            first_element,
            element_width,
            num_elements,
            use_counter,
            usage,
        })
    }

    fn create_native_view(&self, key: &GpuBufferViewDesc) -> Result<NativeObject, RenderError> {
        let handle = self
            .allocator
            .create_buffer_view(self.native.handle(), &self.desc, key)?;
        Ok(NativeObject::new(handle, &self.allocator))
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.views.clear();
    }
}

impl fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .field("native", &self.native)
            .field("views", &self.views.len())
            .finish()
    }
}

/// A buffer of per-vertex data bound to an input-assembler stream.
#[derive(Debug)]
pub struct VertexBuffer {
    buffer: GpuBuffer,
}

impl VertexBuffer {
    /// Allocates a vertex buffer of `num_vertices` vertices, `vertex_size` bytes each.
    pub fn new(
        vertex_size: u32,
        num_vertices: u32,
        usage: BufferUsage,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        let desc = GpuBufferDesc {
            kind: GpuBufferKind::Vertex,
            element_count: num_vertices,
            element_size: vertex_size,
            format: GpuBufferFormat::Unknown,
            usage,
            random_write: false,
            use_counter: false,
        };
        Ok(Self {
            buffer: GpuBuffer::new(desc, allocator)?,
        })
    }

    /// Size of one vertex in bytes.
    pub fn vertex_size(&self) -> u32 {
        self.buffer.desc.element_size
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.buffer.desc.element_count
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}

/// A buffer of vertex indices.
#[derive(Debug)]
pub struct IndexBuffer {
    index_type: IndexType,
    buffer: GpuBuffer,
}

impl IndexBuffer {
    /// Allocates an index buffer holding `num_indices` indices.
    pub fn new(
        index_type: IndexType,
        num_indices: u32,
        usage: BufferUsage,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        let desc = GpuBufferDesc {
            kind: GpuBufferKind::Index(index_type),
            element_count: num_indices,
            element_size: index_type.size(),
            format: GpuBufferFormat::Unknown,
            usage,
            random_write: false,
            use_counter: false,
        };
        Ok(Self {
            index_type,
            buffer: GpuBuffer::new(desc, allocator)?,
        })
    }

    /// Width of the indices.
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Number of indices.
    pub fn index_count(&self) -> u32 {
        self.buffer.desc.element_count
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}

/// A block of shader constants.
#[derive(Debug)]
pub struct GpuParamBlockBuffer {
    buffer: GpuBuffer,
}

impl GpuParamBlockBuffer {
    /// Allocates a parameter block of `size_bytes` bytes.
    pub fn new(
        size_bytes: u32,
        usage: BufferUsage,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        let desc = GpuBufferDesc {
            kind: GpuBufferKind::ParamBlock,
            element_count: 1,
            element_size: size_bytes,
            format: GpuBufferFormat::Unknown,
            usage,
            random_write: false,
            use_counter: false,
        };
        Ok(Self {
            buffer: GpuBuffer::new(desc, allocator)?,
        })
    }

    /// Size of the block in bytes.
    pub fn size_bytes(&self) -> u32 {
        self.buffer.desc.element_size
    }

    /// Writes `bytes` at byte `offset`.
    pub fn write(&self, offset: u32, bytes: &[u8]) -> Result<(), RenderError> {
        self.buffer.write_data(offset as u64, bytes, false)
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::testing::RecordingAllocator;

    fn structured_buffer(allocator: &Arc<dyn NativeResourceAllocator>) -> GpuBuffer {
        let desc = GpuBufferDesc {
            kind: GpuBufferKind::Generic(GpuBufferType::Structured),
            element_count: 64,
            element_size: 16,
            format: GpuBufferFormat::Unknown,
            usage: BufferUsage::Static,
            random_write: true,
            use_counter: false,
        };
        GpuBuffer::new(desc, allocator).expect("buffer")
    }

    #[test]
    fn test_identical_requests_share_one_view() {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let buffer = structured_buffer(&allocator);

        let a = buffer
            .request_view(0, 16, 32, false, GpuViewUsage::DEFAULT)
            .expect("view");
        let b = buffer
            .request_view(0, 16, 32, false, GpuViewUsage::DEFAULT)
            .expect("view");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(buffer.view_ref_count(&a.key()), Some(2));
        assert_eq!(recorder.views_created(), 1);
    }

    #[test]
    fn test_distinct_keys_get_distinct_views() {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let buffer = structured_buffer(&allocator);

        let a = buffer
            .request_view(0, 16, 32, false, GpuViewUsage::DEFAULT)
            .expect("view");
        let b = buffer
            .request_view(32, 16, 32, false, GpuViewUsage::DEFAULT)
            .expect("view");
        let c = buffer
            .request_view(0, 16, 32, false, GpuViewUsage::RANDOM_WRITE)
            .expect("view");

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(buffer.view_count(), 3);
        assert_eq!(recorder.views_created(), 3);
    }

    #[test]
    fn test_release_to_zero_destroys_exactly_once() {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let buffer = structured_buffer(&allocator);

        let view = buffer
            .request_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
            .expect("view");
        let again = buffer
            .request_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
            .expect("view");
        let native = view.native_handle().expect("live view");

        buffer.release_view(&view).expect("first release");
        assert!(!view.is_destroyed());
        assert_eq!(buffer.view_count(), 1);

        buffer.release_view(&again).expect("second release");
        assert!(view.is_destroyed());
        assert_eq!(buffer.view_count(), 0);
        assert_eq!(recorder.release_count(native), 1);

        let err = buffer.release_view(&view).unwrap_err();
        assert!(matches!(err, RenderError::InternalError(_)));
        assert_eq!(recorder.release_count(native), 1);
    }

    #[test]
    fn test_releasing_foreign_view_is_an_internal_error() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let a = structured_buffer(&allocator);
        let b = structured_buffer(&allocator);

        let view = a
            .request_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
            .expect("view");
        // Same key exists on `b`, but the instance is not `b`'s.
        let _other = b
            .request_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
            .expect("view");

        let err = b.release_view(&view).unwrap_err();
        assert!(matches!(err, RenderError::InternalError(_)));
        assert_eq!(a.view_ref_count(&view.key()), Some(1));
    }

    #[test]
    fn test_clear_buffer_views_force_destroys() {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let buffer = structured_buffer(&allocator);

        let view = buffer
            .request_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
            .expect("view");
        let _ = buffer
            .request_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
            .expect("view");
        let native = view.native_handle().expect("live view");

        buffer.clear_buffer_views();

        assert!(view.is_destroyed());
        assert_eq!(buffer.view_count(), 0);
        assert_eq!(recorder.release_count(native), 1);
    }

    #[test]
    fn test_lease_releases_on_drop() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let buffer = structured_buffer(&allocator);

        {
            let lease = buffer
                .lease_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
                .expect("lease");
            assert!(lease.native_handle().is_some());
            assert_eq!(buffer.view_count(), 1);
        }
        assert_eq!(buffer.view_count(), 0);
    }

    #[test]
    fn test_lease_outliving_buffer_is_harmless() {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let buffer = structured_buffer(&allocator);
        let lease = buffer
            .lease_view(0, 16, 8, false, GpuViewUsage::DEFAULT)
            .expect("lease");
        let native = lease.native_handle().expect("live view");

        drop(buffer);
        assert!(lease.is_destroyed());
        drop(lease);
        assert_eq!(recorder.release_count(native), 1);
    }

    #[test]
    fn test_view_range_and_capability_validation() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let buffer = structured_buffer(&allocator);

        assert!(matches!(
            buffer.request_view(60, 16, 8, false, GpuViewUsage::DEFAULT),
            Err(RenderError::InvalidParameters(_))
        ));
        assert!(matches!(
            buffer.request_view(0, 16, 8, true, GpuViewUsage::DEFAULT),
            Err(RenderError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_write_and_read_back_data() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let vb = VertexBuffer::new(12, 3, BufferUsage::Static, &allocator).expect("vb");
        let positions: [f32; 9] = [0.0, 0.5, 0.0, -0.5, -0.5, 0.0, 0.5, -0.5, 0.0];

        vb.buffer()
            .write_data(0, bytemuck::cast_slice(&positions), false)
            .expect("write");
        let back = vb.buffer().read_data(12, 12).expect("read");

        assert_eq!(back, bytemuck::cast_slice::<f32, u8>(&positions[3..6]));
        assert!(vb.buffer().write_data(30, &[0u8; 8], false).is_err());
    }
}
