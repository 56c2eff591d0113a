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

use std::sync::Arc;

use crate::math::{LinearRgba, Mat4, Plane, Rect2, Rect2I};
use crate::renderer::api::*;
use crate::renderer::error::RenderError;
use crate::renderer::managers::RenderManagers;
use crate::renderer::state::RenderSystemState;

/// The single point of contact between rendering code and a graphics API.
///
/// Every mutating method is core-thread-only: the thread that ran
/// [`RenderSystem::initialize_internal`] owns the native device, and debug
/// builds return [`RenderError::NotOnCoreThread`] for calls from any other
/// thread. Capability queries are thread-safe.
///
/// The frame lifecycle is tracked by [`RenderSystemState`]:
/// `Uninitialized -> Ready <-> InFrame -> Destroyed`.
pub trait RenderSystem: std::fmt::Debug + Send + Sync {
    /// The registered backend name, e.g. `D3D11RenderSystem`.
    fn name(&self) -> &'static str;

    /// The shading language this backend compiles, e.g. `hlsl`.
    fn shading_language_name(&self) -> &'static str;

    /// Shared backend-independent state.
    fn state(&self) -> &RenderSystemState;

    /// Mutable access to the shared state.
    fn state_mut(&mut self) -> &mut RenderSystemState;

    /// The managers, available once initialized.
    fn managers(&self) -> Option<&RenderManagers>;

    // --- Lifecycle ---

    /// Starts the render system and creates the primary window.
    ///
    /// Called from the simulation thread. Without a command queue between the
    /// threads the calling thread also becomes the core thread.
    fn initialize(&mut self, primary_window: &RenderWindowDesc) -> Result<Arc<RenderWindow>, RenderError> {
        self.initialize_internal(primary_window)
    }

    /// Creates the device, detects capabilities and creates the primary window.
    fn initialize_internal(
        &mut self,
        primary_window: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError>;

    /// Shuts the render system down.
    fn destroy(&mut self) -> Result<(), RenderError> {
        self.destroy_internal()
    }

    /// Releases every native object and the device.
    fn destroy_internal(&mut self) -> Result<(), RenderError>;

    /// Capabilities of the active device.
    fn capabilities(&self) -> &RenderSystemCapabilities {
        &self.state().capabilities
    }

    /// Statistics accumulated so far.
    fn stats(&self) -> &RenderStats {
        &self.state().stats
    }

    // --- Frame ---

    /// Begins a frame.
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.state_mut().begin_frame()
    }

    /// Ends the current frame.
    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.state_mut().end_frame()
    }

    /// Presents a window's back buffer.
    fn swap_buffers(&mut self, target: &dyn RenderTarget) -> Result<(), RenderError> {
        self.state().ensure_active("swap_buffers")?;
        target.swap_buffers()
    }

    // --- Render targets ---

    /// Creates an additional window.
    fn create_render_window(&mut self, desc: &RenderWindowDesc) -> Result<Arc<RenderWindow>, RenderError>;

    /// Creates an off-screen render target.
    fn create_render_texture(&mut self, desc: RenderTextureDesc) -> Result<Arc<RenderTexture>, RenderError> {
        self.state().ensure_active("create_render_texture")?;
        let max_targets = self.capabilities().num_multi_render_targets;
        let managers = self.managers().ok_or(RenderError::NotInitialized)?;
        managers.buffers.create_render_texture(desc, max_targets)
    }

    /// Makes `target` the destination of subsequent draws and clears.
    ///
    /// Fails with [`RenderError::InvalidState`] inside a frame.
    fn set_render_target(
        &mut self,
        target: Arc<dyn RenderTarget>,
        read_only_depth_stencil: bool,
    ) -> Result<(), RenderError>;

    /// Clears the selected buffers of the whole active target.
    ///
    /// Does nothing when no target is active. `target_mask` selects color
    /// attachments, bit `i` for attachment `i`.
    fn clear_render_target(
        &mut self,
        buffers: FrameBufferType,
        color: LinearRgba,
        depth: f32,
        stencil: u16,
        target_mask: u8,
    ) -> Result<(), RenderError>;

    /// Clears the selected buffers inside the active viewport.
    ///
    /// Clears the whole target when the viewport covers it.
    fn clear_viewport(
        &mut self,
        buffers: FrameBufferType,
        color: LinearRgba,
        depth: f32,
        stencil: u16,
        target_mask: u8,
    ) -> Result<(), RenderError>;

    /// Sets the viewport, normalized to the active target.
    fn set_viewport(&mut self, area: Rect2) -> Result<(), RenderError>;

    /// Sets the scissor rectangle in pixels.
    fn set_scissor_rect(&mut self, rect: Rect2I) -> Result<(), RenderError>;

    // --- Pipeline state ---

    /// Binds a blend state.
    fn set_blend_state(&mut self, state: &Arc<BlendState>) -> Result<(), RenderError>;

    /// Binds a rasterizer state.
    fn set_rasterizer_state(&mut self, state: &Arc<RasterizerState>) -> Result<(), RenderError>;

    /// Binds a depth-stencil state and the stencil reference used by draws.
    fn set_depth_stencil_state(
        &mut self,
        state: &Arc<DepthStencilState>,
        stencil_ref: u32,
    ) -> Result<(), RenderError>;

    /// Binds a sampler state to a texture unit.
    fn set_sampler_state(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        state: &Arc<SamplerState>,
    ) -> Result<(), RenderError>;

    /// Binds a texture's default view to a unit, or unbinds the unit when
    /// `enabled` is false or `texture` is `None`.
    fn set_texture(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        enabled: bool,
        texture: Option<&Arc<Texture>>,
    ) -> Result<(), RenderError>;

    /// Unbinds a texture unit.
    fn disable_texture_unit(&mut self, stage: GpuProgramType, unit: u32) -> Result<(), RenderError> {
        self.set_texture(stage, unit, false, None)
    }

    /// Binds a random-write view of `texture` covering `surface`.
    fn set_load_store_texture(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        enabled: bool,
        texture: Option<&Arc<Texture>>,
        surface: TextureViewDesc,
    ) -> Result<(), RenderError>;

    // --- Input assembler ---

    /// Binds vertex streams starting at `start_index`.
    fn set_vertex_buffers(
        &mut self,
        start_index: u32,
        buffers: &[Arc<VertexBuffer>],
    ) -> Result<(), RenderError>;

    /// Binds or unbinds the index buffer.
    fn set_index_buffer(&mut self, buffer: Option<Arc<IndexBuffer>>) -> Result<(), RenderError>;

    /// Binds the vertex declaration.
    fn set_vertex_declaration(&mut self, declaration: Arc<VertexDeclaration>) -> Result<(), RenderError>;

    /// Selects the primitive topology.
    fn set_draw_operation(&mut self, operation: DrawOperation) -> Result<(), RenderError>;

    // --- Draws ---

    /// Draws `vertex_count` vertices starting at `vertex_offset`.
    ///
    /// Without a vertex program or declaration the draw is skipped with a warning.
    fn draw(&mut self, vertex_offset: u32, vertex_count: u32) -> Result<(), RenderError>;

    /// Draws `index_count` indices starting at `start_index`.
    fn draw_indexed(
        &mut self,
        start_index: u32,
        index_count: u32,
        vertex_offset: u32,
        vertex_count: u32,
    ) -> Result<(), RenderError>;

    // --- Programs ---

    /// Binds a program to its stage. Null and still-loading programs are ignored.
    fn bind_gpu_program(&mut self, program: &Arc<GpuProgram>) -> Result<(), RenderError>;

    /// Unbinds the program of `stage`.
    fn unbind_gpu_program(&mut self, stage: GpuProgramType) -> Result<(), RenderError>;

    /// Returns `true` if a program is bound to `stage`.
    fn is_gpu_program_bound(&self, stage: GpuProgramType) -> bool {
        self.state().is_program_bound(stage)
    }

    /// Binds a parameter block buffer holding `params` to `slot` of `stage`.
    fn set_param_buffer(
        &mut self,
        stage: GpuProgramType,
        slot: u32,
        buffer: &Arc<GpuParamBlockBuffer>,
        params: &GpuParamDesc,
    ) -> Result<(), RenderError>;

    // --- Clip planes ---

    /// Replaces the clip planes.
    fn set_clip_planes(&mut self, planes: Vec<Plane>) -> Result<(), RenderError> {
        self.state().ensure_active("set_clip_planes")?;
        self.state_mut().set_clip_planes(planes);
        Ok(())
    }

    /// Appends a clip plane.
    fn add_clip_plane(&mut self, plane: Plane) -> Result<(), RenderError> {
        self.state().ensure_active("add_clip_plane")?;
        self.state_mut().add_clip_plane(plane);
        Ok(())
    }

    /// Removes every clip plane.
    fn reset_clip_planes(&mut self) -> Result<(), RenderError> {
        self.state().ensure_active("reset_clip_planes")?;
        self.state_mut().reset_clip_planes();
        Ok(())
    }

    // --- Resources ---

    /// Writes `data` into a subresource. `data` must be locked; it is
    /// unlocked and handed back through the returned operation.
    fn write_subresource(
        &mut self,
        resource: &GpuResource,
        index: u32,
        mut data: GpuResourceData,
        discard_whole_buffer: bool,
    ) -> AsyncOp<GpuResourceData> {
        let result = self
            .state()
            .ensure_active("write_subresource")
            .and_then(|_| resource_data::ensure_locked(&data, "write_subresource"))
            .and_then(|_| match resource {
                GpuResource::Buffer(buffer) => {
                    if index != 0 {
                        return Err(RenderError::InvalidParameters(format!(
                            "Buffers have a single subresource, got index {index}"
                        )));
                    }
                    buffer.write_data(0, data.bytes(), discard_whole_buffer)
                }
                GpuResource::Texture(texture) => texture.write_subresource(index, data.bytes()),
            });
        data.unlock();
        AsyncOp::completed(result.map(|_| data))
    }

    /// Reads a subresource into `data`. `data` must be locked; it is
    /// unlocked and handed back, filled, through the returned operation.
    fn read_subresource(
        &mut self,
        resource: &GpuResource,
        index: u32,
        mut data: GpuResourceData,
    ) -> AsyncOp<GpuResourceData> {
        let result = self
            .state()
            .ensure_active("read_subresource")
            .and_then(|_| resource_data::ensure_locked(&data, "read_subresource"))
            .and_then(|_| match resource {
                GpuResource::Buffer(buffer) => {
                    if index != 0 {
                        return Err(RenderError::InvalidParameters(format!(
                            "Buffers have a single subresource, got index {index}"
                        )));
                    }
                    buffer.read_data(0, buffer.size_bytes())
                }
                GpuResource::Texture(texture) => texture.read_subresource(index),
            });
        data.unlock();
        AsyncOp::completed(result.map(|bytes| {
            data.set_bytes(bytes);
            data
        }))
    }

    // --- Conventions ---

    /// Converts a projection matrix built for depth in [-1, 1] to this API's convention.
    fn convert_projection_matrix(&self, matrix: &Mat4) -> Mat4;

    /// The concrete type packed vertex colors use on this backend.
    fn color_vertex_element_type(&self) -> VertexElementType;

    /// Lays out a parameter block the way this backend's shaders expect.
    fn generate_param_block_desc(
        &self,
        name: &str,
        params: &mut [GpuParamDataDesc],
    ) -> GpuParamBlockDesc;

    /// Horizontal offset from texel to pixel centers.
    fn horizontal_texel_offset(&self) -> f32 {
        0.0
    }

    /// Vertical offset from texel to pixel centers.
    fn vertical_texel_offset(&self) -> f32 {
        0.0
    }

    /// The smallest depth value the rasterizer accepts.
    fn minimum_depth_input_value(&self) -> f32 {
        0.0
    }

    /// The largest depth value the rasterizer accepts.
    fn maximum_depth_input_value(&self) -> f32 {
        1.0
    }
}
