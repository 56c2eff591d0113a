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

//! The closed set of render system backends and their link-time registry.
//!
//! Exactly one backend is live per process. It is chosen at startup by name
//! from the registrations every backend module submits through `inventory`.

use std::sync::Arc;

use prism_core::math::{LinearRgba, Mat4, Plane, Rect2, Rect2I};
use prism_core::renderer::{
    AsyncOp, BlendState, ConfigError, DepthStencilState, DrawOperation, FrameBufferType,
    GpuParamBlockBuffer, GpuParamBlockDesc, GpuParamDataDesc, GpuParamDesc, GpuProgram,
    GpuProgramType, GpuResource, GpuResourceData, IndexBuffer, RasterizerState, RenderError,
    RenderManagers, RenderStats, RenderSystem, RenderSystemCapabilities, RenderSystemConfig,
    RenderSystemState, RenderTarget, RenderTexture, RenderTextureDesc, RenderWindow,
    RenderWindowDesc, SamplerState, Texture, TextureViewDesc, VertexBuffer, VertexDeclaration,
    VertexElementType,
};

use crate::graphics::d3d11::D3D11RenderSystem;
use crate::graphics::d3d9::D3D9RenderSystem;
use crate::graphics::gl::GlRenderSystem;
use crate::graphics::native::NativeDevice;

/// A live render system.
#[derive(Debug)]
pub enum RenderBackend {
    /// Direct3D 11.
    D3D11(Box<D3D11RenderSystem>),
    /// Direct3D 9.
    D3D9(Box<D3D9RenderSystem>),
    /// OpenGL.
    Gl(Box<GlRenderSystem>),
}

macro_rules! dispatch {
    ($self:expr, $backend:ident => $body:expr) => {
        match $self {
            RenderBackend::D3D11($backend) => $body,
            RenderBackend::D3D9($backend) => $body,
            RenderBackend::Gl($backend) => $body,
        }
    };
}

impl RenderBackend {
    /// The native device the backend drives.
    pub fn native_device(&self) -> &Arc<NativeDevice> {
        dispatch!(self, backend => backend.native_device())
    }
}

impl RenderSystem for RenderBackend {
    fn name(&self) -> &'static str {
        dispatch!(self, b => b.name())
    }

    fn shading_language_name(&self) -> &'static str {
        dispatch!(self, b => b.shading_language_name())
    }

    fn state(&self) -> &RenderSystemState {
        dispatch!(self, b => b.state())
    }

    fn state_mut(&mut self) -> &mut RenderSystemState {
        dispatch!(self, b => b.state_mut())
    }

    fn managers(&self) -> Option<&RenderManagers> {
        dispatch!(self, b => b.managers())
    }

    fn initialize(
        &mut self,
        primary_window: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError> {
        dispatch!(self, b => b.initialize(primary_window))
    }

    fn initialize_internal(
        &mut self,
        primary_window: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError> {
        dispatch!(self, b => b.initialize_internal(primary_window))
    }

    fn destroy(&mut self) -> Result<(), RenderError> {
        dispatch!(self, b => b.destroy())
    }

    fn destroy_internal(&mut self) -> Result<(), RenderError> {
        dispatch!(self, b => b.destroy_internal())
    }

    fn capabilities(&self) -> &RenderSystemCapabilities {
        dispatch!(self, b => b.capabilities())
    }

    fn stats(&self) -> &RenderStats {
        dispatch!(self, b => b.stats())
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        dispatch!(self, b => b.begin_frame())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        dispatch!(self, b => b.end_frame())
    }

    fn swap_buffers(&mut self, target: &dyn RenderTarget) -> Result<(), RenderError> {
        dispatch!(self, b => b.swap_buffers(target))
    }

    fn create_render_window(
        &mut self,
        desc: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError> {
        dispatch!(self, b => b.create_render_window(desc))
    }

    fn create_render_texture(
        &mut self,
        desc: RenderTextureDesc,
    ) -> Result<Arc<RenderTexture>, RenderError> {
        dispatch!(self, b => b.create_render_texture(desc))
    }

    fn set_render_target(
        &mut self,
        target: Arc<dyn RenderTarget>,
        read_only_depth_stencil: bool,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_render_target(target, read_only_depth_stencil))
    }

    fn clear_render_target(
        &mut self,
        buffers: FrameBufferType,
        color: LinearRgba,
        depth: f32,
        stencil: u16,
        target_mask: u8,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.clear_render_target(buffers, color, depth, stencil, target_mask))
    }

    fn clear_viewport(
        &mut self,
        buffers: FrameBufferType,
        color: LinearRgba,
        depth: f32,
        stencil: u16,
        target_mask: u8,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.clear_viewport(buffers, color, depth, stencil, target_mask))
    }

    fn set_viewport(&mut self, area: Rect2) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_viewport(area))
    }

    fn set_scissor_rect(&mut self, rect: Rect2I) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_scissor_rect(rect))
    }

    fn set_blend_state(&mut self, state: &Arc<BlendState>) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_blend_state(state))
    }

    fn set_rasterizer_state(&mut self, state: &Arc<RasterizerState>) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_rasterizer_state(state))
    }

    fn set_depth_stencil_state(
        &mut self,
        state: &Arc<DepthStencilState>,
        stencil_ref: u32,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_depth_stencil_state(state, stencil_ref))
    }

    fn set_sampler_state(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        state: &Arc<SamplerState>,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_sampler_state(stage, unit, state))
    }

    fn set_texture(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        enabled: bool,
        texture: Option<&Arc<Texture>>,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_texture(stage, unit, enabled, texture))
    }

    fn disable_texture_unit(&mut self, stage: GpuProgramType, unit: u32) -> Result<(), RenderError> {
        dispatch!(self, b => b.disable_texture_unit(stage, unit))
    }

    fn set_load_store_texture(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        enabled: bool,
        texture: Option<&Arc<Texture>>,
        surface: TextureViewDesc,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_load_store_texture(stage, unit, enabled, texture, surface))
    }

    fn set_vertex_buffers(
        &mut self,
        start_index: u32,
        buffers: &[Arc<VertexBuffer>],
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_vertex_buffers(start_index, buffers))
    }

    fn set_index_buffer(&mut self, buffer: Option<Arc<IndexBuffer>>) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_index_buffer(buffer))
    }

    fn set_vertex_declaration(
        &mut self,
        declaration: Arc<VertexDeclaration>,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_vertex_declaration(declaration))
    }

    fn set_draw_operation(&mut self, operation: DrawOperation) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_draw_operation(operation))
    }

    fn draw(&mut self, vertex_offset: u32, vertex_count: u32) -> Result<(), RenderError> {
        dispatch!(self, b => b.draw(vertex_offset, vertex_count))
    }

    fn draw_indexed(
        &mut self,
        start_index: u32,
        index_count: u32,
        vertex_offset: u32,
        vertex_count: u32,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.draw_indexed(start_index, index_count, vertex_offset, vertex_count))
    }

    fn bind_gpu_program(&mut self, program: &Arc<GpuProgram>) -> Result<(), RenderError> {
        dispatch!(self, b => b.bind_gpu_program(program))
    }

    fn unbind_gpu_program(&mut self, stage: GpuProgramType) -> Result<(), RenderError> {
        dispatch!(self, b => b.unbind_gpu_program(stage))
    }

    fn is_gpu_program_bound(&self, stage: GpuProgramType) -> bool {
        dispatch!(self, b => b.is_gpu_program_bound(stage))
    }

    fn set_param_buffer(
        &mut self,
        stage: GpuProgramType,
        slot: u32,
        buffer: &Arc<GpuParamBlockBuffer>,
        params: &GpuParamDesc,
    ) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_param_buffer(stage, slot, buffer, params))
    }

    fn set_clip_planes(&mut self, planes: Vec<Plane>) -> Result<(), RenderError> {
        dispatch!(self, b => b.set_clip_planes(planes))
    }

    fn add_clip_plane(&mut self, plane: Plane) -> Result<(), RenderError> {
        dispatch!(self, b => b.add_clip_plane(plane))
    }

    fn reset_clip_planes(&mut self) -> Result<(), RenderError> {
        dispatch!(self, b => b.reset_clip_planes())
    }

    fn write_subresource(
        &mut self,
        resource: &GpuResource,
        index: u32,
        data: GpuResourceData,
        discard_whole_buffer: bool,
    ) -> AsyncOp<GpuResourceData> {
        dispatch!(self, b => b.write_subresource(resource, index, data, discard_whole_buffer))
    }

    fn read_subresource(
        &mut self,
        resource: &GpuResource,
        index: u32,
        data: GpuResourceData,
    ) -> AsyncOp<GpuResourceData> {
        dispatch!(self, b => b.read_subresource(resource, index, data))
    }

    fn convert_projection_matrix(&self, matrix: &Mat4) -> Mat4 {
        dispatch!(self, b => b.convert_projection_matrix(matrix))
    }

    fn color_vertex_element_type(&self) -> VertexElementType {
        dispatch!(self, b => b.color_vertex_element_type())
    }

    fn generate_param_block_desc(
        &self,
        name: &str,
        params: &mut [GpuParamDataDesc],
    ) -> GpuParamBlockDesc {
        dispatch!(self, b => b.generate_param_block_desc(name, params))
    }

    fn horizontal_texel_offset(&self) -> f32 {
        dispatch!(self, b => b.horizontal_texel_offset())
    }

    fn vertical_texel_offset(&self) -> f32 {
        dispatch!(self, b => b.vertical_texel_offset())
    }

    fn minimum_depth_input_value(&self) -> f32 {
        dispatch!(self, b => b.minimum_depth_input_value())
    }

    fn maximum_depth_input_value(&self) -> f32 {
        dispatch!(self, b => b.maximum_depth_input_value())
    }
}

/// A backend made available at link time.
#[derive(Debug)]
pub struct BackendRegistration {
    /// The render system name, e.g. `D3D11RenderSystem`.
    pub name: &'static str,
    /// The plugin the backend ships in.
    pub plugin_name: &'static str,
    /// Creates an uninitialized instance.
    pub create: fn(&RenderSystemConfig) -> RenderBackend,
}

inventory::collect!(BackendRegistration);

/// Looks up and instantiates registered backends.
pub struct RenderSystemManager;

impl RenderSystemManager {
    /// Every registered backend.
    pub fn registrations() -> impl Iterator<Item = &'static BackendRegistration> {
        inventory::iter::<BackendRegistration>.into_iter()
    }

    /// The names of every registered backend, sorted.
    pub fn available_backends() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::registrations().map(|r| r.name).collect();
        names.sort_unstable();
        names
    }

    /// Creates the backend registered as `name`.
    pub fn create(name: &str, config: &RenderSystemConfig) -> Result<RenderBackend, ConfigError> {
        let registration = Self::registrations()
            .find(|r| r.name == name)
            .ok_or_else(|| ConfigError::UnknownBackend(vec![name.to_string()]))?;
        log::info!(
            "Selected render system '{}' from plugin '{}'",
            registration.name,
            registration.plugin_name
        );
        Ok((registration.create)(config))
    }

    /// Creates the first backend of `config.preferred_backends` that is registered.
    pub fn create_preferred(config: &RenderSystemConfig) -> Result<RenderBackend, ConfigError> {
        for name in &config.preferred_backends {
            match Self::create(name, config) {
                Ok(backend) => return Ok(backend),
                Err(_) => log::debug!("Render system '{name}' is not registered, trying the next one"),
            }
        }
        Err(ConfigError::UnknownBackend(config.preferred_backends.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_backend_registers() {
        assert_eq!(
            RenderSystemManager::available_backends(),
            vec!["D3D11RenderSystem", "D3D9RenderSystem", "GLRenderSystem"]
        );
    }

    #[test]
    fn test_preferred_order_skips_unknown_names() {
        let config = RenderSystemConfig {
            preferred_backends: vec!["VulkanRenderSystem".to_string(), "GLRenderSystem".to_string()],
            ..RenderSystemConfig::default()
        };
        let backend = RenderSystemManager::create_preferred(&config).expect("backend");
        assert!(matches!(backend, RenderBackend::Gl(_)));
        assert_eq!(backend.name(), "GLRenderSystem");
        assert_eq!(backend.shading_language_name(), "glsl");
    }

    #[test]
    fn test_no_match_lists_the_names_tried() {
        let config = RenderSystemConfig {
            preferred_backends: vec!["Metal".to_string()],
            ..RenderSystemConfig::default()
        };
        match RenderSystemManager::create_preferred(&config) {
            Err(ConfigError::UnknownBackend(names)) => assert_eq!(names, vec!["Metal".to_string()]),
            other => panic!("expected UnknownBackend, got {other:?}"),
        }
    }
}
