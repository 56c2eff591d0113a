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

//! The Direct3D 9 implementation of the [`RenderSystem`] trait.

use std::collections::HashMap;
use std::sync::Arc;

use prism_core::math::{LinearRgba, Mat4, Rect2, Rect2I};
use prism_core::renderer::{
    layout_param_block, BlendState, DepthStencilState, DrawOperation, FrameBufferType,
    GpuParamBlockBuffer, GpuParamBlockDesc, GpuParamDataDesc, GpuParamDesc, GpuProgram,
    GpuProgramType, GpuVendor, GpuViewUsage, HardwareBufferManager, IndexBuffer, Lifecycle,
    NativeHandleKind, ParamLocation, ParamPacking, RasterizerState, RenderError, RenderManagers,
    RenderSystem, RenderSystemCapabilities, RenderSystemConfig, RenderSystemState, RenderTarget,
    RenderWindow, RenderWindowDesc, SamplerState, Texture, TextureViewDesc, VertexBuffer,
    VertexColorFormat, VertexDeclaration, VertexElementType, ViewLease,
};

use super::device::D3D9Device;
use super::device_manager::D3D9DeviceManager;
use super::driver::{D3D9Driver, D3D9DriverList};
use super::window::D3D9RenderWindow;
use crate::backend::{BackendRegistration, RenderBackend};
use crate::graphics::conversions::{color_views, depth_view, single_handle, to_d3d_projection};
use crate::graphics::hlsl::HlslProgramFactory;
use crate::graphics::native::{BindPoint, NativeCall, NativeDevice};

/// Vertex streams the device accepts.
const MAX_STREAMS: u32 = 16;

type StateKey = (BindPoint, Option<GpuProgramType>, u32);

/// The Direct3D 9 render system.
///
/// States are applied from their descriptors and remembered per slot, so
/// binding the same state twice costs one native call. The memory is
/// forgotten whenever the device is reset.
#[derive(Debug)]
pub struct D3D9RenderSystem {
    state: RenderSystemState,
    bound_textures: HashMap<(GpuProgramType, u32), ViewLease<TextureViewDesc>>,
    applied_states: HashMap<StateKey, u32>,
    applied_generation: u64,
    managers: Option<RenderManagers>,
    device_manager: Option<Arc<D3D9DeviceManager>>,
    driver: Option<D3D9Driver>,
    native: Arc<NativeDevice>,
    drivers: D3D9DriverList,
    config: RenderSystemConfig,
}

impl D3D9RenderSystem {
    /// Creates an uninitialized render system using the machine's adapters.
    pub fn new(config: RenderSystemConfig) -> Self {
        Self::with_drivers(config, D3D9DriverList::enumerate())
    }

    /// Creates an uninitialized render system choosing from `drivers`.
    pub fn with_drivers(config: RenderSystemConfig, drivers: D3D9DriverList) -> Self {
        log::info!("D3D9RenderSystem created (uninitialized).");
        Self {
            state: RenderSystemState::new(),
            bound_textures: HashMap::new(),
            applied_states: HashMap::new(),
            applied_generation: 0,
            managers: None,
            device_manager: None,
            driver: None,
            native: NativeDevice::new(super::NAME),
            drivers,
            config,
        }
    }

    /// The native device every object of this render system is created on.
    pub fn native_device(&self) -> &Arc<NativeDevice> {
        &self.native
    }

    /// The device manager, available once initialized.
    pub fn device_manager(&self) -> Option<&Arc<D3D9DeviceManager>> {
        self.device_manager.as_ref()
    }

    fn device(&self) -> Result<&Arc<D3D9Device>, RenderError> {
        self.device_manager
            .as_ref()
            .map(|m| m.device())
            .ok_or(RenderError::NotInitialized)
    }

    fn is_device_lost(&self) -> bool {
        self.device_manager
            .as_ref()
            .is_some_and(|m| m.device().is_lost())
    }

    fn check_stage(stage: GpuProgramType) -> Result<(), RenderError> {
        match stage {
            GpuProgramType::Vertex | GpuProgramType::Fragment => Ok(()),
            _ => Err(RenderError::InvalidParameters(format!(
                "D3D9 has no {stage:?} programs"
            ))),
        }
    }

    fn detect_capabilities(driver: &D3D9Driver) -> RenderSystemCapabilities {
        let model = driver.shader_model;
        RenderSystemCapabilities {
            render_system_name: super::NAME.to_string(),
            vendor: GpuVendor::from_vendor_id(driver.vendor_id),
            device_name: driver.description.clone(),
            driver_version: driver.driver_version.clone(),
            shader_profiles: model.shader_profiles(),
            texture_units: model.texture_units(),
            max_bound_vertex_buffers: MAX_STREAMS,
            num_multi_render_targets: model.num_multi_render_targets(),
            max_clip_planes: 0,
            features: driver.features(),
        }
    }

    /// Applies a state unless the same one is already applied to the slot.
    fn apply_state(&mut self, key: StateKey, state_id: u32) -> Result<(), RenderError> {
        let generation = self.device()?.generation();
        if generation != self.applied_generation {
            self.applied_states.clear();
            self.applied_generation = generation;
        }
        if self.applied_states.get(&key) == Some(&state_id) {
            return Ok(());
        }
        let (point, stage, slot) = key;
        self.native.record(NativeCall::ApplyState {
            point,
            stage,
            slot,
            state_id,
        });
        self.applied_states.insert(key, state_id);
        Ok(())
    }

    fn clear_area(&mut self, buffers: FrameBufferType, area: Option<Rect2I>) {
        if self.state.active_target().is_none() {
            return;
        }
        if self.is_device_lost() {
            log::debug!("Skipping clear while the D3D9 device is lost");
            return;
        }
        // Clears whatever the device currently renders to.
        self.native.record(NativeCall::Clear {
            buffers,
            target: None,
            area,
        });
        self.state.stats.clears += 1;
    }

    fn apply_clip_planes(&mut self) {
        if self.state.clip_planes_dirty() {
            if !self.state.clip_planes().is_empty() {
                log::warn!("D3D9 ignores user clip planes");
            }
            self.state.clear_clip_planes_dirty();
        }
    }

    /// Common draw preamble. Returns `false` if the draw must be skipped.
    fn prepare_draw(&mut self, operation: &'static str) -> bool {
        if self.is_device_lost() {
            log::debug!("Skipping {operation} while the D3D9 device is lost");
            return false;
        }
        if !self.state.can_draw(operation) {
            return false;
        }
        self.apply_clip_planes();
        true
    }
}

impl RenderSystem for D3D9RenderSystem {
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

        let device = Arc::new(D3D9Device::create_on(self.native.clone(), &driver)?);
        let device_manager = Arc::new(D3D9DeviceManager::new(device.clone()));
        let capabilities = Self::detect_capabilities(&driver);

        let managers = RenderManagers::new(HardwareBufferManager::new(
            device.allocator().clone(),
            VertexColorFormat::Argb,
        ));
        managers.programs.register_factory(Arc::new(HlslProgramFactory::new(
            device.native(),
            capabilities.shader_profiles.clone(),
            VertexColorFormat::Argb,
        )));

        let surface = D3D9RenderWindow::create(&device_manager, &driver, primary_window)?;
        let window = Arc::new(RenderWindow::new(primary_window.clone(), Box::new(surface)));

        log::info!(
            "D3D9 render system initialized on '{}' ({}, shader model {})",
            capabilities.device_name,
            capabilities.vendor,
            driver.shader_model
        );

        self.state.capabilities = capabilities;
        self.state.mark_initialized();
        self.applied_generation = device.generation();
        self.managers = Some(managers);
        self.device_manager = Some(device_manager);
        self.driver = Some(driver);
        Ok(window)
    }

    fn destroy_internal(&mut self) -> Result<(), RenderError> {
        self.state.ensure_active("destroy")?;
        self.state.mark_destroyed();
        self.bound_textures.clear();
        self.applied_states.clear();
        self.device_manager = None;
        log::info!("D3D9 render system destroyed");
        Ok(())
    }

    /// Begins a frame, first resetting a lost device.
    ///
    /// Fails with [`RenderError::DeviceLost`] if the device cannot be
    /// restored yet; the next call tries again.
    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.state.ensure_active("begin_frame")?;
        if let Some(manager) = self.device_manager.clone() {
            if manager.device().is_lost() {
                manager.notify_on_device_reset().map_err(|err| {
                    log::warn!("D3D9 device could not be reset yet: {err}");
                    RenderError::DeviceLost
                })?;
            }
        }
        self.state.begin_frame()
    }

    fn create_render_window(
        &mut self,
        desc: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError> {
        self.state.ensure_active("create_render_window")?;
        let manager = self
            .device_manager
            .clone()
            .ok_or(RenderError::NotInitialized)?;
        let driver = self.driver.as_ref().ok_or(RenderError::NotInitialized)?;
        let surface = D3D9RenderWindow::create(&manager, driver, desc)?;
        Ok(Arc::new(RenderWindow::new(desc.clone(), Box::new(surface))))
    }

    fn set_render_target(
        &mut self,
        target: Arc<dyn RenderTarget>,
        _read_only_depth_stencil: bool,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_render_target")?;
        let color = match single_handle(target.as_ref(), NativeHandleKind::BackBuffer) {
            Some(back_buffer) => vec![back_buffer],
            None => color_views(target.as_ref()),
        };
        let depth = single_handle(target.as_ref(), NativeHandleKind::DepthBuffer)
            .or_else(|| depth_view(target.as_ref(), false));
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
        _target_mask: u8,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("clear_render_target")?;
        log::trace!("Clear {buffers:?} to {color:?}, depth {depth}, stencil {stencil}");
        self.clear_area(buffers, None);
        Ok(())
    }

    fn clear_viewport(
        &mut self,
        buffers: FrameBufferType,
        color: LinearRgba,
        depth: f32,
        stencil: u16,
        _target_mask: u8,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("clear_viewport")?;
        log::trace!("Clear viewport {buffers:?} to {color:?}, depth {depth}, stencil {stencil}");
        let area = self.state.viewport_clear_area();
        self.clear_area(buffers, area);
        Ok(())
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
        self.apply_state((BindPoint::BlendState, None, 0), state.id())?;
        self.state.stats.blend_state_changes += 1;
        Ok(())
    }

    fn set_rasterizer_state(&mut self, state: &Arc<RasterizerState>) -> Result<(), RenderError> {
        self.state.ensure_active("set_rasterizer_state")?;
        self.apply_state((BindPoint::RasterizerState, None, 0), state.id())?;
        self.state.stats.rasterizer_state_changes += 1;
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: &Arc<DepthStencilState>,
        stencil_ref: u32,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_depth_stencil_state")?;
        self.apply_state((BindPoint::DepthStencilState, None, 0), state.id())?;
        if self.state.stencil_ref != stencil_ref {
            self.native.record(NativeCall::SetStencilRef(stencil_ref));
            self.state.stencil_ref = stencil_ref;
        }
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
        Self::check_stage(stage)?;
        self.state.check_texture_unit(stage, unit)?;
        self.apply_state((BindPoint::Sampler, Some(stage), unit), state.id())?;
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
        Self::check_stage(stage)?;
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
        _stage: GpuProgramType,
        _unit: u32,
        _enabled: bool,
        _texture: Option<&Arc<Texture>>,
        _surface: TextureViewDesc,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_load_store_texture")?;
        Err(RenderError::Unsupported(
            "D3D9 has no load/store textures".to_string(),
        ))
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
        self.apply_state((BindPoint::InputLayout, None, 0), declaration.id())?;
        self.state.vertex_declaration = Some(declaration);
        Ok(())
    }

    fn set_draw_operation(&mut self, operation: DrawOperation) -> Result<(), RenderError> {
        self.state.ensure_active("set_draw_operation")?;
        self.state.draw_operation = operation;
        self.native.record(NativeCall::SetTopology(operation));
        Ok(())
    }

    fn draw(&mut self, vertex_offset: u32, vertex_count: u32) -> Result<(), RenderError> {
        self.state.ensure_active("draw")?;
        if !self.prepare_draw("draw") {
            return Ok(());
        }
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
        if !self.prepare_draw("draw_indexed") {
            return Ok(());
        }
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
        Self::check_stage(stage)?;
        if !self.state.bind_program(program) {
            return Ok(());
        }
        self.native
            .bind(BindPoint::Program, Some(stage), 0, program.native_handle());
        Ok(())
    }

    fn unbind_gpu_program(&mut self, stage: GpuProgramType) -> Result<(), RenderError> {
        self.state.ensure_active("unbind_gpu_program")?;
        Self::check_stage(stage)?;
        self.state.unbind_program(stage);
        self.native.bind(BindPoint::Program, Some(stage), 0, None);
        Ok(())
    }

    /// Uploads every parameter of `params` to the constant registers of the
    /// program bound to `stage`. `slot` has no meaning on this API.
    fn set_param_buffer(
        &mut self,
        stage: GpuProgramType,
        slot: u32,
        buffer: &Arc<GpuParamBlockBuffer>,
        params: &GpuParamDesc,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_param_buffer")?;
        Self::check_stage(stage)?;
        let program = self
            .state
            .bound_program(stage)
            .and_then(|p| p.native_handle())
            .ok_or_else(|| {
                RenderError::InvalidParameters(format!(
                    "No {stage:?} program is bound to receive parameters"
                ))
            })?;

        let block_words = buffer.size_bytes() / 4;
        for param in &params.params {
            let words = param.array_element_stride * param.array_size;
            if param.cpu_mem_offset + words > block_words {
                return Err(RenderError::InvalidParameters(format!(
                    "Parameter '{}' reads past the end of a {}-byte block",
                    param.name,
                    buffer.size_bytes()
                )));
            }
            self.native.record(NativeCall::SetUniform {
                program,
                offset: param.cpu_mem_offset,
                words,
            });
        }
        log::trace!("Uploaded {} constants for slot {slot}", params.params.len());
        self.state.stats.param_buffer_binds += 1;
        Ok(())
    }

    fn convert_projection_matrix(&self, matrix: &Mat4) -> Mat4 {
        to_d3d_projection(matrix)
    }

    fn color_vertex_element_type(&self) -> VertexElementType {
        VertexElementType::ColorArgb
    }

    fn generate_param_block_desc(
        &self,
        name: &str,
        params: &mut [GpuParamDataDesc],
    ) -> GpuParamBlockDesc {
        layout_param_block(name, params, ParamPacking::ConstantBuffer, |offset| {
            ParamLocation::Packed { offset }
        })
    }

    fn horizontal_texel_offset(&self) -> f32 {
        -0.5
    }

    fn vertical_texel_offset(&self) -> f32 {
        -0.5
    }
}

fn create_backend(config: &RenderSystemConfig) -> RenderBackend {
    RenderBackend::D3D9(Box::new(D3D9RenderSystem::new(config.clone())))
}

inventory::submit! {
    BackendRegistration {
        name: super::NAME,
        plugin_name: "prism-d3d9",
        create: create_backend,
    }
}
