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

//! The emulated native device shared by every backend.
//!
//! Each backend drives one [`NativeDevice`] the way it would drive its real
//! API: objects are created and released through it and every state change,
//! clear and draw is recorded as a [`NativeCall`] in submission order. Tests
//! inspect the call log and inject creation failures to exercise the error
//! paths a driver can take.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use prism_core::math::Rect2I;
use prism_core::renderer::{
    DrawOperation, FrameBufferType, GpuBufferDesc, GpuBufferViewDesc, GpuProgramType,
    NativeResourceAllocator, RawHandle, RenderError, RenderStateObject, TextureDesc,
    TextureViewDesc,
};
use prism_core::utils::sync;

/// The kind of a native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeObjectKind {
    /// The device itself.
    Device,
    /// A rendering context (OpenGL).
    Context,
    /// An OS window.
    Window,
    /// A swap chain.
    SwapChain,
    /// A buffer.
    Buffer,
    /// A buffer view.
    BufferView,
    /// A texture.
    Texture,
    /// A texture view.
    TextureView,
    /// A blend state.
    BlendState,
    /// A rasterizer state.
    RasterizerState,
    /// A depth-stencil state.
    DepthStencilState,
    /// A sampler state.
    SamplerState,
    /// A compiled shader.
    Shader,
    /// A vertex input layout.
    InputLayout,
    /// A program pipeline object (OpenGL).
    Pipeline,
    /// A vertex array object (OpenGL).
    VertexArray,
    /// A framebuffer object (OpenGL).
    Framebuffer,
}

/// A binding slot kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindPoint {
    /// Blend state.
    BlendState,
    /// Rasterizer state.
    RasterizerState,
    /// Depth-stencil state.
    DepthStencilState,
    /// Sampler slot.
    Sampler,
    /// Shader resource (texture) slot.
    ShaderResource,
    /// Unordered access (load/store) slot.
    UnorderedAccess,
    /// Constant buffer or uniform block slot.
    ConstantBuffer,
    /// Vertex stream.
    VertexBuffer,
    /// Index buffer.
    IndexBuffer,
    /// Input layout or vertex declaration.
    InputLayout,
    /// A single-stage shader.
    Program,
    /// A program pipeline (OpenGL).
    Pipeline,
    /// A vertex array object (OpenGL).
    VertexArray,
    /// A framebuffer object (OpenGL).
    Framebuffer,
}

/// One command issued to the native device.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    /// An object was created.
    Create {
        /// What was created.
        kind: NativeObjectKind,
        /// Its handle.
        handle: RawHandle,
    },
    /// An object was released.
    Release {
        /// The released handle.
        handle: RawHandle,
    },
    /// A binding changed.
    Bind {
        /// What was bound.
        point: BindPoint,
        /// The stage, for per-stage slots.
        stage: Option<GpuProgramType>,
        /// The slot index.
        slot: u32,
        /// The bound object, `None` for an unbind.
        handle: Option<RawHandle>,
    },
    /// The output merger targets changed.
    SetRenderTargets {
        /// Color views.
        color: Vec<RawHandle>,
        /// Depth-stencil view.
        depth: Option<RawHandle>,
    },
    /// The viewport changed.
    SetViewport(Rect2I),
    /// The scissor rectangle changed.
    SetScissor(Rect2I),
    /// The primitive topology changed.
    SetTopology(DrawOperation),
    /// The stencil reference changed.
    SetStencilRef(u32),
    /// Fixed-function state applied from a descriptor, for APIs without
    /// native state objects.
    ApplyState {
        /// Which state.
        point: BindPoint,
        /// The stage, for per-stage samplers.
        stage: Option<GpuProgramType>,
        /// The slot index.
        slot: u32,
        /// The id of the applied state object.
        state_id: u32,
    },
    /// A rendering context was made current (OpenGL).
    MakeCurrent {
        /// The context.
        context: RawHandle,
    },
    /// A clear, of the whole target when `area` is `None`.
    Clear {
        /// Cleared buffers.
        buffers: FrameBufferType,
        /// The cleared view or framebuffer, `None` for the device's current targets.
        target: Option<RawHandle>,
        /// Restricting rectangle.
        area: Option<Rect2I>,
    },
    /// A non-indexed draw.
    Draw {
        /// First vertex.
        vertex_offset: u32,
        /// Number of vertices.
        vertex_count: u32,
    },
    /// An indexed draw.
    DrawIndexed {
        /// First index.
        start_index: u32,
        /// Number of indices.
        index_count: u32,
        /// Value added to each index.
        vertex_offset: u32,
    },
    /// An individual uniform was uploaded.
    SetUniform {
        /// The program the uniform belongs to.
        program: RawHandle,
        /// Offset in 4-byte words into the CPU block.
        offset: u32,
        /// Number of 4-byte words uploaded.
        words: u32,
    },
    /// The number of enabled user clip distances changed.
    EnableClipDistances(u32),
    /// A back buffer was presented.
    Present {
        /// The presenting swap chain or window.
        target: RawHandle,
    },
    /// The device was reset.
    Reset,
}

/// An emulated native device.
pub struct NativeDevice {
    backend: &'static str,
    next_handle: AtomicU64,
    live: Mutex<HashMap<RawHandle, NativeObjectKind>>,
    release_counts: Mutex<HashMap<RawHandle, usize>>,
    calls: Mutex<Vec<NativeCall>>,
    injected_failures: Mutex<HashMap<NativeObjectKind, String>>,
}

impl NativeDevice {
    /// Creates a device for the named backend.
    pub fn new(backend: &'static str) -> Arc<Self> {
        Arc::new(Self {
            backend,
            next_handle: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
            release_counts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            injected_failures: Mutex::new(HashMap::new()),
        })
    }

    /// The backend name.
    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// Creates an object of `kind`.
    ///
    /// Fails with [`RenderError::RenderingApi`] if a failure was injected for
    /// `kind`; no handle is issued in that case.
    pub fn create(&self, kind: NativeObjectKind) -> Result<RawHandle, RenderError> {
        if let Some(message) = sync::lock(&self.injected_failures).remove(&kind) {
            return Err(RenderError::rendering_api(
                self.backend,
                format!("Failed to create {kind:?}: {message}"),
            ));
        }
        let handle = RawHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        sync::lock(&self.live).insert(handle, kind);
        self.record(NativeCall::Create { kind, handle });
        log::trace!("{}: created {kind:?} {}", self.backend, handle.0);
        Ok(handle)
    }

    /// Records a command.
    pub fn record(&self, call: NativeCall) {
        sync::lock(&self.calls).push(call);
    }

    /// Records a binding change.
    pub fn bind(
        &self,
        point: BindPoint,
        stage: Option<GpuProgramType>,
        slot: u32,
        handle: Option<RawHandle>,
    ) {
        self.record(NativeCall::Bind {
            point,
            stage,
            slot,
            handle,
        });
    }

    /// Makes the next creation of `kind` fail with `message`.
    pub fn inject_failure(&self, kind: NativeObjectKind, message: impl Into<String>) {
        sync::lock(&self.injected_failures).insert(kind, message.into());
    }

    /// A copy of every recorded command.
    pub fn calls(&self) -> Vec<NativeCall> {
        sync::lock(&self.calls).clone()
    }

    /// Removes and returns every recorded command.
    pub fn take_calls(&self) -> Vec<NativeCall> {
        std::mem::take(&mut *sync::lock(&self.calls))
    }

    /// Counts recorded commands matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&NativeCall) -> bool) -> usize {
        sync::lock(&self.calls).iter().filter(|c| predicate(c)).count()
    }

    /// The number of live objects.
    pub fn live_count(&self) -> usize {
        sync::lock(&self.live).len()
    }

    /// The number of live objects of `kind`.
    pub fn live_count_of(&self, kind: NativeObjectKind) -> usize {
        sync::lock(&self.live).values().filter(|k| **k == kind).count()
    }

    /// Returns `true` if `handle` has been created and not released.
    pub fn is_live(&self, handle: RawHandle) -> bool {
        sync::lock(&self.live).contains_key(&handle)
    }

    /// How many times `handle` was released.
    pub fn release_count(&self, handle: RawHandle) -> usize {
        sync::lock(&self.release_counts)
            .get(&handle)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the native handle of a state object, creating it on first bind.
    pub fn realize_state<D>(
        self: &Arc<Self>,
        state: &RenderStateObject<D>,
        kind: NativeObjectKind,
    ) -> Result<RawHandle, RenderError> {
        let owner = as_allocator(self);
        state.realize(&owner, |_| self.create(kind))
    }

    /// Releases every live object. Used when the device itself goes away.
    pub fn release_all(&self) {
        let handles: Vec<RawHandle> = sync::lock(&self.live).keys().copied().collect();
        for handle in handles {
            self.release(handle);
        }
    }
}

impl NativeResourceAllocator for NativeDevice {
    fn backend_name(&self) -> &'static str {
        self.backend
    }

    fn create_buffer(&self, desc: &GpuBufferDesc) -> Result<RawHandle, RenderError> {
        if desc.size_bytes() == 0 {
            return Err(RenderError::rendering_api(
                self.backend,
                "Cannot create a zero-sized buffer",
            ));
        }
        self.create(NativeObjectKind::Buffer)
    }

    fn create_buffer_view(
        &self,
        buffer: RawHandle,
        _buffer_desc: &GpuBufferDesc,
        _view: &GpuBufferViewDesc,
    ) -> Result<RawHandle, RenderError> {
        if !self.is_live(buffer) {
            return Err(RenderError::rendering_api(
                self.backend,
                format!("Buffer {} is not a live object", buffer.0),
            ));
        }
        self.create(NativeObjectKind::BufferView)
    }

    fn create_texture(&self, _desc: &TextureDesc) -> Result<RawHandle, RenderError> {
        self.create(NativeObjectKind::Texture)
    }

    fn create_texture_view(
        &self,
        texture: RawHandle,
        _texture_desc: &TextureDesc,
        _view: &TextureViewDesc,
    ) -> Result<RawHandle, RenderError> {
        if !self.is_live(texture) {
            return Err(RenderError::rendering_api(
                self.backend,
                format!("Texture {} is not a live object", texture.0),
            ));
        }
        self.create(NativeObjectKind::TextureView)
    }

    fn release(&self, handle: RawHandle) {
        if sync::lock(&self.live).remove(&handle).is_none() {
            log::warn!("{}: release of unknown object {}", self.backend, handle.0);
            return;
        }
        *sync::lock(&self.release_counts).entry(handle).or_insert(0) += 1;
        self.record(NativeCall::Release { handle });
    }
}

impl fmt::Debug for NativeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeDevice")
            .field("backend", &self.backend)
            .field("live_objects", &self.live_count())
            .finish()
    }
}

/// Upcasts a device to the allocator trait object the core resources expect.
pub fn as_allocator(device: &Arc<NativeDevice>) -> Arc<dyn NativeResourceAllocator> {
    device.clone()
}
