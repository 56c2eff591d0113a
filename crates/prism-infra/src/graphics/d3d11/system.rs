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

//! The Direct3D 11 implementation of the [`RenderSystem`] trait.

use std::collections::HashMap;
use std::sync::Arc;

use prism_core::math::{LinearRgba, Mat4, Rect2, Rect2I};
use prism_core::renderer::{
    layout_param_block, BlendState, DepthStencilState, DeviceFeatures, DrawOperation,
    FrameBufferType, GpuParamBlockBuffer, GpuParamBlockDesc, GpuParamDataDesc, GpuParamDesc,
    GpuProgram, GpuProgramType, GpuVendor, GpuViewUsage, HardwareBufferManager, IndexBuffer,
    Lifecycle, ParamLocation, ParamPacking, RasterizerState, RenderError, RenderManagers,
    RenderSystem, RenderSystemCapabilities, RenderSystemConfig, RenderSystemState, RenderTarget,
    RenderWindow, RenderWindowDesc, SamplerState, Texture, TextureViewDesc, VertexBuffer,
    VertexColorFormat, VertexDeclaration, VertexElementType, ViewLease,
};

use super::device::D3D11Device;
use super::driver::D3D11DriverList;
use super::input_layout::D3D11InputLayoutManager;
use super::mappings;
use super::window::D3D11RenderWindow;
use crate::backend::{BackendRegistration, RenderBackend};
use crate::graphics::hlsl::HlslProgramFactory;
use crate::graphics::conversions::{color_views, depth_view, to_d3d_projection};
use crate::graphics::native::{BindPoint, NativeCall, NativeDevice, NativeObjectKind};

/// Sampler slots per stage.
const MAX_SAMPLERS: u32 = 16;
/// Constant buffer slots per stage.
const MAX_CONSTANT_BUFFERS: u32 = 14;
/// Unordered access slots.
const MAX_UNORDERED_ACCESS_VIEWS: u32 = 8;

type TextureLease = ViewLease<TextureViewDesc>;

/// The Direct3D 11 render system.
///
/// Texture, sampler and constant buffer bindings are issued one native call
/// per (stage, slot). The input layout is re-applied before every draw from a
/// cache keyed by vertex declaration and vertex program.
#[derive(Debug)]
pub struct D3D11RenderSystem {
    state: RenderSystemState,
    bound_textures: HashMap<(GpuProgramType, u32), TextureLease>,
    bound_unordered_access: HashMap<(GpuProgramType, u32), TextureLease>,
    input_layouts: D3D11InputLayoutManager,
    managers: Option<RenderManagers>,
    device: Option<D3D11Device>,
    native: Arc<NativeDevice>,
    drivers: D3D11DriverList,
    config: RenderSystemConfig,
}

impl D3D11RenderSystem {
    /// Creates an uninitialized render system using the machine's adapters.
    pub fn new(config: RenderSystemConfig) -> Self {
        Self::with_drivers(config, D3D11DriverList::enumerate())
    }

    /// Creates an uninitialized render system choosing from `drivers`.
    pub fn with_drivers(config: RenderSystemConfig, drivers: D3D11DriverList) -> Self {
        log::info!("D3D11RenderSystem created (uninitialized).");
        Self {
            state: RenderSystemState::new(),
            bound_textures: HashMap::new(),
            bound_unordered_access: HashMap::new(),
            input_layouts: D3D11InputLayoutManager::new(
                config.input_layout_cache_capacity,
                config.input_layout_prune_count,
            ),
            managers: None,
            device: None,
            native: NativeDevice::new(super::NAME),
            drivers,
            config,
        }
    }

    /// The native device every object of this render system is created on.
    pub fn native_device(&self) -> &Arc<NativeDevice> {
        &self.native
    }

    /// The adapters this render system can choose from.
    pub fn drivers(&self) -> &D3D11DriverList {
        &self.drivers
    }

    /// The input layout cache.
    pub fn input_layouts(&self) -> &D3D11InputLayoutManager {
        &self.input_layouts
    }

    fn device(&self) -> Result<&D3D11Device, RenderError> {
        self.device.as_ref().ok_or(RenderError::NotInitialized)
    }

    fn check_stage(&self, stage: GpuProgramType) -> Result<(), RenderError> {
        if self.state.capabilities.supports_stage(stage) {
            Ok(())
        } else {
            Err(RenderError::InvalidParameters(format!(
                "{stage:?} programs are not supported at this feature level"
            )))
        }
    }

    fn detect_capabilities(&self, device: &D3D11Device, adapter: usize) -> RenderSystemCapabilities {
        let level = device.feature_level();
        let driver = self.drivers.item(adapter);
        RenderSystemCapabilities {
            render_system_name: super::NAME.to_string(),
            vendor: driver.map_or(GpuVendor::Unknown, |d| GpuVendor::from_vendor_id(d.vendor_id)),
            device_name: driver.map(|d| d.description.clone()).unwrap_or_default(),
            driver_version: driver.map(|d| d.driver_version.clone()).unwrap_or_default(),
            shader_profiles: level.shader_profiles(),
            texture_units: level.texture_units(),
            max_bound_vertex_buffers: level.max_bound_vertex_buffers(),
            num_multi_render_targets: level.num_multi_render_targets(),
            // User clip planes go through SV_ClipDistance, not the API.
            max_clip_planes: 0,
            features: level.features(),
        }
    }

    fn clear_area(
        &mut self,
        buffers: FrameBufferType,
        target_mask: u8,
        area: Option<Rect2I>,
    ) -> Result<(), RenderError> {
        let Some(target) = self.state.active_target() else {
            return Ok(());
        };
        let colors = color_views(target.as_ref());
        let depth = depth_view(target.as_ref(), false);

        if buffers.contains(FrameBufferType::COLOR) {
            for (index, view) in colors.into_iter().enumerate() {
                if index < 8 && target_mask & (1 << index) != 0 {
                    self.native.record(NativeCall::Clear {
                        buffers: FrameBufferType::COLOR,
                        target: Some(view),
                        area,
                    });
                }
            }
        }

        let depth_stencil = buffers & (FrameBufferType::DEPTH | FrameBufferType::STENCIL);
        if !depth_stencil.is_empty() {
            if let Some(view) = depth {
                self.native.record(NativeCall::Clear {
                    buffers: depth_stencil,
                    target: Some(view),
                    area,
                });
            }
        }

        self.state.stats.clears += 1;
        Ok(())
    }

    /// Binds the input layout for the current program and declaration.
    /// Returns `false` if none could be derived and the draw must be dropped.
    fn apply_input_layout(&mut self) -> Result<bool, RenderError> {
        let (Some(program), Some(declaration)) = (
            self.state.bound_program(GpuProgramType::Vertex).cloned(),
            self.state.vertex_declaration.clone(),
        ) else {
            return Ok(false);
        };
        let device = self.device.as_ref().ok_or(RenderError::NotInitialized)?;
        let Some(layout) = self
            .input_layouts
            .retrieve_for(device, &program, &declaration)?
        else {
            return Ok(false);
        };
        self.native
            .bind(BindPoint::InputLayout, None, 0, Some(layout));
        Ok(true)
    }

    fn apply_clip_planes(&mut self) {
        if self.state.clip_planes_dirty() {
            if !self.state.clip_planes().is_empty() {
                log::warn!(
                    "D3D11 ignores user clip planes; write SV_ClipDistance from the vertex program instead"
                );
            }
            self.state.clear_clip_planes_dirty();
        }
    }
}

impl RenderSystem for D3D11RenderSystem {
    fn name(&self) -> &'static str {
        super::NAME
    }

    fn shading_language_name(&self) -> &'static str {
        super::SHADING_LANGUAGE
    }

    fn state(&self) -> &RenderSystemState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RenderSystemState {
        &mut self.state
    }

    fn managers(&self) -> Option<&RenderManagers> {
        self.managers.as_ref()
    }

    fn initialize_internal(
        &mut self,
        primary_window: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError> {
        if self.state.lifecycle() != Lifecycle::Uninitialized {
            return Err(self.state.invalid_state("initialize"));
        }

        let adapter = self.config.adapter_index;
        let driver = self.drivers.item(adapter).cloned().ok_or_else(|| {
            RenderError::InvalidParameters(format!(
                "Adapter {adapter} does not exist ({} found)",
                self.drivers.len()
            ))
        })?;

        let device = D3D11Device::create_on(self.native.clone(), &driver, self.config.debug_layer)?;
        let capabilities = self.detect_capabilities(&device, adapter);

        let managers = RenderManagers::new(HardwareBufferManager::new(
            device.allocator().clone(),
            VertexColorFormat::Abgr,
        ));
        managers.programs.register_factory(Arc::new(HlslProgramFactory::new(
            device.native(),
            capabilities.shader_profiles.clone(),
            VertexColorFormat::Abgr,
        )));

        // Created before anything is published, so a failure leaves no
        // partially initialized device reachable.
        let surface = D3D11RenderWindow::create(&device, primary_window)?;
        let window = Arc::new(RenderWindow::new(primary_window.clone(), Box::new(surface)));

        log::info!(
            "D3D11 render system initialized on '{}' ({}, feature level {})",
            capabilities.device_name,
            capabilities.vendor,
            device.feature_level()
        );

        self.state.capabilities = capabilities;
        self.state.mark_initialized();
        self.managers = Some(managers);
        self.device = Some(device);
        Ok(window)
    }

    fn destroy_internal(&mut self) -> Result<(), RenderError> {
        self.state.ensure_active("destroy")?;
        self.state.mark_destroyed();
        self.bound_textures.clear();
        self.bound_unordered_access.clear();
        self.input_layouts.clear();
        self.device = None;
        log::info!("D3D11 render system destroyed");
        Ok(())
    }

    fn create_render_window(
        &mut self,
        desc: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError> {
        self.state.ensure_active("create_render_window")?;
        let surface = D3D11RenderWindow::create(self.device()?, desc)?;
        Ok(Arc::new(RenderWindow::new(desc.clone(), Box::new(surface))))
    }

    fn set_render_target(
        &mut self,
        target: Arc<dyn RenderTarget>,
        read_only_depth_stencil: bool,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_render_target")?;
        let color = color_views(target.as_ref());
        let depth = depth_view(target.as_ref(), read_only_depth_stencil);
        self.state.set_active_target(target)?;

        self.native.record(NativeCall::SetRenderTargets { color, depth });
        self.native
            .record(NativeCall::SetViewport(self.state.viewport_px()));
        Ok(())
    }

    fn clear_render_target(
        &mut self,
        buffers: FrameBufferType,
        color: LinearRgba,
        depth: f32,
        stencil: u16,
        target_mask: u8,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("clear_render_target")?;
        log::trace!("Clear {buffers:?} to {color:?}, depth {depth}, stencil {stencil}");
        self.clear_area(buffers, target_mask, None)
    }

    fn clear_viewport(
        &mut self,
        buffers: FrameBufferType,
        color: LinearRgba,
        depth: f32,
        stencil: u16,
        target_mask: u8,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("clear_viewport")?;
        log::trace!("Clear viewport {buffers:?} to {color:?}, depth {depth}, stencil {stencil}");
        let area = self.state.viewport_clear_area();
        self.clear_area(buffers, target_mask, area)
    }

    fn set_viewport(&mut self, area: Rect2) -> Result<(), RenderError> {
        self.state.ensure_active("set_viewport")?;
        let pixels = self.state.apply_viewport(area);
        self.native.record(NativeCall::SetViewport(pixels));
        Ok(())
    }

    fn set_scissor_rect(&mut self, rect: Rect2I) -> Result<(), RenderError> {
        self.state.ensure_active("set_scissor_rect")?;
        self.state.scissor = Some(rect);
        self.native.record(NativeCall::SetScissor(rect));
        Ok(())
    }

    fn set_blend_state(&mut self, state: &Arc<BlendState>) -> Result<(), RenderError> {
        self.state.ensure_active("set_blend_state")?;
        let handle = self
            .native
            .realize_state(state, NativeObjectKind::BlendState)?;
        self.native
            .bind(BindPoint::BlendState, None, 0, Some(handle));
        self.state.stats.blend_state_changes += 1;
        Ok(())
    }

    fn set_rasterizer_state(&mut self, state: &Arc<RasterizerState>) -> Result<(), RenderError> {
        self.state.ensure_active("set_rasterizer_state")?;
        let handle = self
            .native
            .realize_state(state, NativeObjectKind::RasterizerState)?;
        self.native
            .bind(BindPoint::RasterizerState, None, 0, Some(handle));
        self.state.stats.rasterizer_state_changes += 1;
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: &Arc<DepthStencilState>,
        stencil_ref: u32,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_depth_stencil_state")?;
        let handle = self
            .native
            .realize_state(state, NativeObjectKind::DepthStencilState)?;
        self.native
            .bind(BindPoint::DepthStencilState, None, 0, Some(handle));
        self.native.record(NativeCall::SetStencilRef(stencil_ref));
        self.state.stencil_ref = stencil_ref;
        self.state.stats.depth_stencil_state_changes += 1;
        Ok(())
    }

    fn set_sampler_state(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        state: &Arc<SamplerState>,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_sampler_state")?;
        self.check_stage(stage)?;
        if unit >= MAX_SAMPLERS {
            return Err(RenderError::InvalidParameters(format!(
                "Sampler slot {unit} out of range (max {MAX_SAMPLERS})"
            )));
        }
        let handle = self
            .native
            .realize_state(state, NativeObjectKind::SamplerState)?;
        self.native
            .bind(BindPoint::Sampler, Some(stage), unit, Some(handle));
        self.state.stats.sampler_binds += 1;
        Ok(())
    }

    fn set_texture(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        enabled: bool,
        texture: Option<&Arc<Texture>>,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_texture")?;
        self.check_stage(stage)?;
        self.state.check_texture_unit(stage, unit)?;

        match texture.filter(|_| enabled) {
            Some(texture) => {
                let lease = texture.lease_view(texture.full_view_desc(GpuViewUsage::DEFAULT))?;
                let handle = lease.native_handle();
                self.bound_textures.insert((stage, unit), lease);
                self.native
                    .bind(BindPoint::ShaderResource, Some(stage), unit, handle);
            }
            None => {
                self.bound_textures.remove(&(stage, unit));
                self.native
                    .bind(BindPoint::ShaderResource, Some(stage), unit, None);
            }
        }
        self.state.stats.texture_binds += 1;
        Ok(())
    }

    fn set_load_store_texture(
        &mut self,
        stage: GpuProgramType,
        unit: u32,
        enabled: bool,
        texture: Option<&Arc<Texture>>,
        surface: TextureViewDesc,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_load_store_texture")?;
        if !self
            .state
            .capabilities
            .features
            .contains(DeviceFeatures::LOAD_STORE_TEXTURE)
        {
            return Err(RenderError::Unsupported(
                "Load/store textures need feature level 11_0".to_string(),
            ));
        }
        if !matches!(stage, GpuProgramType::Fragment | GpuProgramType::Compute) {
            return Err(RenderError::InvalidParameters(format!(
                "Load/store textures can only be bound to fragment or compute programs, not {stage:?}"
            )));
        }
        if unit >= MAX_UNORDERED_ACCESS_VIEWS {
            return Err(RenderError::InvalidParameters(format!(
                "Unordered access slot {unit} out of range (max {MAX_UNORDERED_ACCESS_VIEWS})"
            )));
        }

        match texture.filter(|_| enabled) {
            Some(texture) => {
                let lease = texture.lease_view(TextureViewDesc {
                    usage: GpuViewUsage::RANDOM_WRITE,
                    ..surface
                })?;
                let handle = lease.native_handle();
                self.bound_unordered_access.insert((stage, unit), lease);
                self.native
                    .bind(BindPoint::UnorderedAccess, Some(stage), unit, handle);
            }
            None => {
                self.bound_unordered_access.remove(&(stage, unit));
                self.native
                    .bind(BindPoint::UnorderedAccess, Some(stage), unit, None);
            }
        }
        self.state.stats.texture_binds += 1;
        Ok(())
    }

    fn set_vertex_buffers(
        &mut self,
        start_index: u32,
        buffers: &[Arc<VertexBuffer>],
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_vertex_buffers")?;
        self.state.bind_vertex_buffers(start_index, buffers)?;
        for (slot, buffer) in (start_index..).zip(buffers) {
            self.native.bind(
                BindPoint::VertexBuffer,
                None,
                slot,
                Some(buffer.buffer().native_handle()),
            );
        }
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: Option<Arc<IndexBuffer>>) -> Result<(), RenderError> {
        self.state.ensure_active("set_index_buffer")?;
        if let Some(buffer) = &buffer {
            log::trace!(
                "Index buffer format {:?}",
                mappings::index_format(buffer.index_type())
            );
        }
        self.native.bind(
            BindPoint::IndexBuffer,
            None,
            0,
            buffer.as_ref().map(|b| b.buffer().native_handle()),
        );
        self.state.index_buffer = buffer;
        self.state.stats.index_buffer_binds += 1;
        Ok(())
    }

    fn set_vertex_declaration(
        &mut self,
        declaration: Arc<VertexDeclaration>,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_vertex_declaration")?;
        self.state.vertex_declaration = Some(declaration);
        Ok(())
    }

    fn set_draw_operation(&mut self, operation: DrawOperation) -> Result<(), RenderError> {
        self.state.ensure_active("set_draw_operation")?;
        mappings::topology(operation)?;
        self.state.draw_operation = operation;
        self.native.record(NativeCall::SetTopology(operation));
        Ok(())
    }

    fn draw(&mut self, vertex_offset: u32, vertex_count: u32) -> Result<(), RenderError> {
        self.state.ensure_active("draw")?;
        if !self.state.can_draw("draw") {
            return Ok(());
        }
        if !self.apply_input_layout()? {
            return Ok(());
        }
        self.apply_clip_planes();

        self.native.record(NativeCall::Draw {
            vertex_offset,
            vertex_count,
        });
        let primitives = self.state.draw_operation.primitive_count(vertex_count);
        self.state.stats.record_draw(vertex_count, primitives);
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        start_index: u32,
        index_count: u32,
        vertex_offset: u32,
        vertex_count: u32,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("draw_indexed")?;
        if self.state.index_buffer.is_none() {
            return Err(RenderError::InvalidParameters(
                "draw_indexed called without an index buffer".to_string(),
            ));
        }
        if !self.state.can_draw("draw_indexed") {
            return Ok(());
        }
        if !self.apply_input_layout()? {
            return Ok(());
        }
        self.apply_clip_planes();

        log::trace!("Indexed draw over {vertex_count} vertices");
        self.native.record(NativeCall::DrawIndexed {
            start_index,
            index_count,
            vertex_offset,
        });
        let primitives = self.state.draw_operation.primitive_count(index_count);
        self.state.stats.record_draw(index_count, primitives);
        Ok(())
    }

    fn bind_gpu_program(&mut self, program: &Arc<GpuProgram>) -> Result<(), RenderError> {
        self.state.ensure_active("bind_gpu_program")?;
        let stage = program.program_type();
        self.check_stage(stage)?;
        if !self.state.bind_program(program) {
            return Ok(());
        }
        self.native
            .bind(BindPoint::Program, Some(stage), 0, program.native_handle());
        Ok(())
    }

    fn unbind_gpu_program(&mut self, stage: GpuProgramType) -> Result<(), RenderError> {
        self.state.ensure_active("unbind_gpu_program")?;
        self.check_stage(stage)?;
        self.state.unbind_program(stage);
        self.native.bind(BindPoint::Program, Some(stage), 0, None);
        Ok(())
    }

    fn set_param_buffer(
        &mut self,
        stage: GpuProgramType,
        slot: u32,
        buffer: &Arc<GpuParamBlockBuffer>,
        params: &GpuParamDesc,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_param_buffer")?;
        self.check_stage(stage)?;
        if slot >= MAX_CONSTANT_BUFFERS {
            return Err(RenderError::InvalidParameters(format!(
                "Constant buffer slot {slot} out of range (max {MAX_CONSTANT_BUFFERS})"
            )));
        }
        log::trace!(
            "Constant buffer of {} bytes for {} parameters",
            buffer.size_bytes(),
            params.params.len()
        );
        self.native.bind(
            BindPoint::ConstantBuffer,
            Some(stage),
            slot,
            Some(buffer.buffer().native_handle()),
        );
        self.state.stats.param_buffer_binds += 1;
        Ok(())
    }

    fn convert_projection_matrix(&self, matrix: &Mat4) -> Mat4 {
        to_d3d_projection(matrix)
    }

    fn color_vertex_element_type(&self) -> VertexElementType {
        VertexElementType::ColorAbgr
    }

    fn generate_param_block_desc(
        &self,
        name: &str,
        params: &mut [GpuParamDataDesc],
    ) -> GpuParamBlockDesc {
        layout_param_block(name, params, ParamPacking::ConstantBuffer, |_| {
            ParamLocation::Block { slot: 0 }
        })
    }
}

fn create_backend(config: &RenderSystemConfig) -> RenderBackend {
    RenderBackend::D3D11(Box::new(D3D11RenderSystem::new(config.clone())))
}

inventory::submit! {
    BackendRegistration {
        name: super::NAME,
        plugin_name: "prism-d3d11",
        create: create_backend,
    }
}
