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

//! The OpenGL implementation of the [`RenderSystem`] trait.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use prism_core::math::{LinearRgba, Mat4, Rect2, Rect2I};
use prism_core::renderer::{
    layout_param_block, BlendState, DepthStencilState, DeviceFeatures, DrawOperation,
    FrameBufferType, GpuParamBlockBuffer, GpuParamBlockDesc, GpuParamDataDesc, GpuParamDesc,
    GpuProgram, GpuProgramType, GpuVendor, GpuViewUsage, HardwareBufferManager, IndexBuffer,
    Lifecycle, NativeHandleKind, NativeObject, NativeResourceAllocator, ParamLocation,
    ParamPacking, RasterizerState, RawHandle, RenderError, RenderManagers, RenderSystem,
    RenderSystemCapabilities, RenderSystemConfig, RenderSystemState, RenderTarget, RenderWindow,
    RenderWindowDesc, SamplerState, Texture, TextureViewDesc, VertexBuffer, VertexColorFormat,
    VertexDeclaration, VertexElementType, ViewLease,
};

use super::context::{GlDriver, GlDriverList, GlVersion};
use super::pipeline::GlProgramPipelineManager;
use super::program::GlslProgramFactory;
use super::vao::GlVertexArrayManager;
use super::window::GlRenderWindow;
use crate::backend::{BackendRegistration, RenderBackend};
use crate::graphics::conversions::{color_views, depth_view, single_handle};
use crate::graphics::native::{as_allocator, BindPoint, NativeCall, NativeDevice, NativeObjectKind};

/// Uniform block bindings reserved per stage.
const MAX_UNIFORM_BLOCKS: u32 = 14;
/// Image units for load/store textures.
const MAX_IMAGE_UNITS: u32 = 8;
/// User clip distances.
const MAX_CLIP_PLANES: u32 = 8;

type TextureLease = ViewLease<TextureViewDesc>;

#[derive(Debug)]
struct CachedFramebuffer {
    target: Weak<dyn RenderTarget>,
    fbo: NativeObject,
}

/// The OpenGL render system.
///
/// Texture units and uniform block bindings form one flat range shared by
/// every stage; each stage owns a contiguous slice of it. Program pipelines,
/// vertex arrays and framebuffer objects are created lazily and cached.
#[derive(Debug)]
pub struct GlRenderSystem {
    state: RenderSystemState,
    bound_textures: HashMap<u32, TextureLease>,
    bound_images: HashMap<u32, TextureLease>,
    pipelines: GlProgramPipelineManager,
    vertex_arrays: GlVertexArrayManager,
    framebuffers: HashMap<u32, CachedFramebuffer>,
    main_context: Option<RawHandle>,
    current_context: Option<RawHandle>,
    current_framebuffer: Option<RawHandle>,
    managers: Option<RenderManagers>,
    driver: Option<GlDriver>,
    allocator: Arc<dyn NativeResourceAllocator>,
    native: Arc<NativeDevice>,
    drivers: GlDriverList,
    config: RenderSystemConfig,
}

impl GlRenderSystem {
    /// Creates an uninitialized render system using the available drivers.
    pub fn new(config: RenderSystemConfig) -> Self {
        Self::with_drivers(config, GlDriverList::enumerate())
    }

    /// Creates an uninitialized render system choosing from `drivers`.
    pub fn with_drivers(config: RenderSystemConfig, drivers: GlDriverList) -> Self {
        log::info!("GLRenderSystem created (uninitialized).");
        let native = NativeDevice::new(super::NAME);
        Self {
            state: RenderSystemState::new(),
            bound_textures: HashMap::new(),
            bound_images: HashMap::new(),
            pipelines: GlProgramPipelineManager::new(),
            vertex_arrays: GlVertexArrayManager::new(),
            framebuffers: HashMap::new(),
            main_context: None,
            current_context: None,
            current_framebuffer: None,
            managers: None,
            driver: None,
            allocator: as_allocator(&native),
            native,
            drivers,
            config,
        }
    }

    /// The native device every object of this render system is created on.
    pub fn native_device(&self) -> &Arc<NativeDevice> {
        &self.native
    }

    /// The program pipeline cache.
    pub fn pipelines(&self) -> &GlProgramPipelineManager {
        &self.pipelines
    }

    /// The vertex array cache.
    pub fn vertex_arrays(&self) -> &GlVertexArrayManager {
        &self.vertex_arrays
    }

    /// The number of cached framebuffer objects.
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    fn check_stage(&self, stage: GpuProgramType) -> Result<(), RenderError> {
        if self.state.capabilities.supports_stage(stage) {
            Ok(())
        } else {
            Err(RenderError::InvalidParameters(format!(
                "{stage:?} programs are not supported by this GL driver"
            )))
        }
    }

    fn detect_capabilities(driver: &GlDriver) -> RenderSystemCapabilities {
        RenderSystemCapabilities {
            render_system_name: super::NAME.to_string(),
            vendor: GpuVendor::from_vendor_id(driver.vendor_id),
            device_name: driver.renderer.clone(),
            driver_version: driver.driver_version.clone(),
            shader_profiles: driver.shader_profiles(),
            texture_units: driver.texture_units(),
            max_bound_vertex_buffers: 32,
            num_multi_render_targets: 8,
            max_clip_planes: MAX_CLIP_PLANES,
            features: driver.features(),
        }
    }

    /// Maps a per-stage texture unit to the flat unit range.
    fn texture_unit(&self, stage: GpuProgramType, unit: u32) -> u32 {
        let offset: u32 = GpuProgramType::ALL[..stage.index()]
            .iter()
            .map(|s| self.state.capabilities.texture_units(*s))
            .sum();
        offset + unit
    }

    /// Maps a per-stage block slot to the flat uniform block binding range.
    fn uniform_block_binding(stage: GpuProgramType, slot: u32) -> u32 {
        stage.index() as u32 * MAX_UNIFORM_BLOCKS + slot
    }

    fn make_current(&mut self, context: RawHandle) {
        if self.current_context != Some(context) {
            self.native.record(NativeCall::MakeCurrent { context });
            self.current_context = Some(context);
        }
    }

    fn framebuffer_for(&mut self, target: &Arc<dyn RenderTarget>) -> Result<RawHandle, RenderError> {
        self.framebuffers
            .retain(|_, cached| cached.target.strong_count() > 0);
        if let Some(cached) = self.framebuffers.get(&target.id()) {
            return Ok(cached.fbo.handle());
        }

        let handle = self.native.create(NativeObjectKind::Framebuffer).map_err(|e| {
            RenderError::rendering_api(super::NAME, format!("Unable to create framebuffer: {e}"))
        })?;
        // Attachments are fixed for the lifetime of the framebuffer object.
        self.native.record(NativeCall::SetRenderTargets {
            color: color_views(target.as_ref()),
            depth: depth_view(target.as_ref(), false),
        });
        log::trace!("Created framebuffer {} for target {}", handle.0, target.id());
        self.framebuffers.insert(
            target.id(),
            CachedFramebuffer {
                target: Arc::downgrade(target),
                fbo: NativeObject::new(handle, &self.allocator),
            },
        );
        Ok(handle)
    }

    fn clear_area(&mut self, buffers: FrameBufferType, target_mask: u8, area: Option<Rect2I>) {
        if self.state.active_target().is_none() {
            return;
        }
        let buffers = if target_mask == 0 {
            buffers & (FrameBufferType::DEPTH | FrameBufferType::STENCIL)
        } else {
            buffers
        };
        if buffers.is_empty() {
            return;
        }
        self.native.record(NativeCall::Clear {
            buffers,
            target: self.current_framebuffer,
            area,
        });
        self.state.stats.clears += 1;
    }

    fn apply_pipeline(&mut self) -> Result<(), RenderError> {
        let programs: [Option<Arc<GpuProgram>>; GpuProgramType::COUNT] =
            std::array::from_fn(|i| self.state.bound_program(GpuProgramType::ALL[i]).cloned());
        let pipeline = self
            .pipelines
            .retrieve(&self.native, &self.allocator, &programs)?;
        self.native
            .bind(BindPoint::Pipeline, None, 0, Some(pipeline));
        Ok(())
    }

    /// Binds the vertex array for the current program, declaration and streams.
    /// Returns `false` if none could be built and the draw must be dropped.
    fn apply_vertex_array(&mut self) -> Result<bool, RenderError> {
        let (Some(program), Some(declaration)) = (
            self.state.bound_program(GpuProgramType::Vertex),
            self.state.vertex_declaration.as_ref(),
        ) else {
            return Ok(false);
        };
        let Some(vao) = self.vertex_arrays.retrieve(
            &self.native,
            &self.allocator,
            program,
            declaration,
            &self.state.vertex_buffers,
        )?
        else {
            return Ok(false);
        };
        self.native.bind(BindPoint::VertexArray, None, 0, Some(vao));
        Ok(true)
    }

    fn apply_clip_planes(&mut self) -> Result<(), RenderError> {
        if !self.state.clip_planes_dirty() {
            return Ok(());
        }
        let count = self.state.clip_planes().len() as u32;
        if count > MAX_CLIP_PLANES {
            return Err(RenderError::rendering_api(
                super::NAME,
                format!("Unable to set {count} clip planes, at most {MAX_CLIP_PLANES} are supported"),
            ));
        }
        self.native.record(NativeCall::EnableClipDistances(count));
        self.state.clear_clip_planes_dirty();
        Ok(())
    }

    /// Applies deferred pipeline state. Returns `false` if the draw must be dropped.
    fn prepare_draw(&mut self) -> Result<bool, RenderError> {
        self.apply_pipeline()?;
        if !self.apply_vertex_array()? {
            return Ok(false);
        }
        self.apply_clip_planes()?;
        Ok(true)
    }
}

impl RenderSystem for GlRenderSystem {
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
                "GL driver {adapter} does not exist ({} found)",
                self.drivers.len()
            ))
        })?;
        if driver.version < GlVersion::MINIMUM {
            return Err(RenderError::Unsupported(format!(
                "OpenGL {} is required, the driver provides {}",
                GlVersion::MINIMUM,
                driver.version
            )));
        }

        let capabilities = Self::detect_capabilities(&driver);
        let managers = RenderManagers::new(HardwareBufferManager::new(
            self.allocator.clone(),
            VertexColorFormat::Abgr,
        ));
        managers.programs.register_factory(Arc::new(GlslProgramFactory::new(
            &self.native,
            capabilities.shader_profiles.clone(),
        )));

        let surface = GlRenderWindow::create(&self.native, &self.allocator, &driver, primary_window)?;
        let context = surface.context();
        let window = Arc::new(RenderWindow::new(primary_window.clone(), Box::new(surface)));

        log::info!(
            "GL render system initialized on '{}' ({}, OpenGL {})",
            capabilities.device_name,
            capabilities.vendor,
            driver.version
        );

        self.make_current(context);
        self.main_context = Some(context);
        self.state.capabilities = capabilities;
        self.state.mark_initialized();
        self.managers = Some(managers);
        self.driver = Some(driver);
        Ok(window)
    }

    fn destroy_internal(&mut self) -> Result<(), RenderError> {
        self.state.ensure_active("destroy")?;
        self.state.mark_destroyed();
        self.bound_textures.clear();
        self.bound_images.clear();
        self.framebuffers.clear();
        self.pipelines.clear();
        self.vertex_arrays.clear();
        self.main_context = None;
        self.current_context = None;
        self.current_framebuffer = None;
        log::info!("GL render system destroyed");
        Ok(())
    }

    fn create_render_window(
        &mut self,
        desc: &RenderWindowDesc,
    ) -> Result<Arc<RenderWindow>, RenderError> {
        self.state.ensure_active("create_render_window")?;
        let driver = self.driver.as_ref().ok_or(RenderError::NotInitialized)?;
        let surface = GlRenderWindow::create(&self.native, &self.allocator, driver, desc)?;
        Ok(Arc::new(RenderWindow::new(desc.clone(), Box::new(surface))))
    }

    fn set_render_target(
        &mut self,
        target: Arc<dyn RenderTarget>,
        read_only_depth_stencil: bool,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_render_target")?;
        self.state.set_active_target(target.clone())?;

        // Render textures draw through the context of the primary window.
        if let Some(context) =
            single_handle(target.as_ref(), NativeHandleKind::GlContext).or(self.main_context)
        {
            self.make_current(context);
        }

        let framebuffer = if target.is_texture() {
            if read_only_depth_stencil {
                log::debug!("GL framebuffers bind depth read-only through the depth state");
            }
            Some(self.framebuffer_for(&target)?)
        } else {
            None
        };
        self.native
            .bind(BindPoint::Framebuffer, None, 0, framebuffer);
        self.current_framebuffer = framebuffer;
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
        self.clear_area(buffers, target_mask, None);
        Ok(())
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
        self.clear_area(buffers, target_mask, area);
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
        self.native.record(NativeCall::ApplyState {
            point: BindPoint::BlendState,
            stage: None,
            slot: 0,
            state_id: state.id(),
        });
        self.state.stats.blend_state_changes += 1;
        Ok(())
    }

    fn set_rasterizer_state(&mut self, state: &Arc<RasterizerState>) -> Result<(), RenderError> {
        self.state.ensure_active("set_rasterizer_state")?;
        self.native.record(NativeCall::ApplyState {
            point: BindPoint::RasterizerState,
            stage: None,
            slot: 0,
            state_id: state.id(),
        });
        self.state.stats.rasterizer_state_changes += 1;
        Ok(())
    }

    fn set_depth_stencil_state(
        &mut self,
        state: &Arc<DepthStencilState>,
        stencil_ref: u32,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_depth_stencil_state")?;
        self.native.record(NativeCall::ApplyState {
            point: BindPoint::DepthStencilState,
            stage: None,
            slot: 0,
            state_id: state.id(),
        });
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
        self.state.check_texture_unit(stage, unit)?;
        self.native.record(NativeCall::ApplyState {
            point: BindPoint::Sampler,
            stage: None,
            slot: self.texture_unit(stage, unit),
            state_id: state.id(),
        });
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
        let flat_unit = self.texture_unit(stage, unit);

        match texture.filter(|_| enabled) {
            Some(texture) => {
                let lease = texture.lease_view(texture.full_view_desc(GpuViewUsage::DEFAULT))?;
                let handle = lease.native_handle();
                self.bound_textures.insert(flat_unit, lease);
                self.native
                    .bind(BindPoint::ShaderResource, None, flat_unit, handle);
            }
            None => {
                self.bound_textures.remove(&flat_unit);
                self.native
                    .bind(BindPoint::ShaderResource, None, flat_unit, None);
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
                "Load/store textures need OpenGL 4.2".to_string(),
            ));
        }
        self.check_stage(stage)?;
        if unit >= MAX_IMAGE_UNITS {
            return Err(RenderError::InvalidParameters(format!(
                "Image unit {unit} out of range (max {MAX_IMAGE_UNITS})"
            )));
        }

        match texture.filter(|_| enabled) {
            Some(texture) => {
                let lease = texture.lease_view(TextureViewDesc {
                    usage: GpuViewUsage::RANDOM_WRITE,
                    ..surface
                })?;
                let handle = lease.native_handle();
                self.bound_images.insert(unit, lease);
                self.native
                    .bind(BindPoint::UnorderedAccess, None, unit, handle);
            }
            None => {
                self.bound_images.remove(&unit);
                self.native
                    .bind(BindPoint::UnorderedAccess, None, unit, None);
            }
        }
        self.state.stats.texture_binds += 1;
        Ok(())
    }

    /// Records the streams; they are attached through a vertex array at draw time.
    fn set_vertex_buffers(
        &mut self,
        start_index: u32,
        buffers: &[Arc<VertexBuffer>],
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_vertex_buffers")?;
        self.state.bind_vertex_buffers(start_index, buffers)
    }

    fn set_index_buffer(&mut self, buffer: Option<Arc<IndexBuffer>>) -> Result<(), RenderError> {
        self.state.ensure_active("set_index_buffer")?;
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
        self.state.draw_operation = operation;
        self.native.record(NativeCall::SetTopology(operation));
        Ok(())
    }

    fn draw(&mut self, vertex_offset: u32, vertex_count: u32) -> Result<(), RenderError> {
        self.state.ensure_active("draw")?;
        if !self.state.can_draw("draw") {
            return Ok(());
        }
        if !self.prepare_draw()? {
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
        let Some(index_buffer) = self.state.index_buffer.clone() else {
            return Err(RenderError::InvalidParameters(
                "draw_indexed called without an index buffer".to_string(),
            ));
        };
        if !self.state.can_draw("draw_indexed") {
            return Ok(());
        }
        if !self.prepare_draw()? {
            return Ok(());
        }
        // The element array binding is part of the vertex array state.
        self.native.bind(
            BindPoint::IndexBuffer,
            None,
            0,
            Some(index_buffer.buffer().native_handle()),
        );

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
        self.check_stage(program.program_type())?;
        self.state.bind_program(program);
        Ok(())
    }

    fn unbind_gpu_program(&mut self, stage: GpuProgramType) -> Result<(), RenderError> {
        self.state.ensure_active("unbind_gpu_program")?;
        self.check_stage(stage)?;
        self.state.unbind_program(stage);
        Ok(())
    }

    /// Binds `buffer` to the uniform block at `slot` if the program declares
    /// one there; otherwise uploads its packed parameters as loose uniforms.
    fn set_param_buffer(
        &mut self,
        stage: GpuProgramType,
        slot: u32,
        buffer: &Arc<GpuParamBlockBuffer>,
        params: &GpuParamDesc,
    ) -> Result<(), RenderError> {
        self.state.ensure_active("set_param_buffer")?;
        self.check_stage(stage)?;
        if slot >= MAX_UNIFORM_BLOCKS {
            return Err(RenderError::InvalidParameters(format!(
                "Uniform block slot {slot} out of range (max {MAX_UNIFORM_BLOCKS})"
            )));
        }
        let program = self
            .state
            .bound_program(stage)
            .and_then(|p| p.native_handle())
            .ok_or_else(|| {
                RenderError::InvalidParameters(format!(
                    "No {stage:?} program is bound to receive parameters"
                ))
            })?;

        if params.blocks.iter().any(|b| b.slot == slot) {
            self.native.bind(
                BindPoint::ConstantBuffer,
                None,
                Self::uniform_block_binding(stage, slot),
                Some(buffer.buffer().native_handle()),
            );
        } else {
            let block_words = buffer.size_bytes() / 4;
            for param in &params.params {
                let ParamLocation::Packed { offset } = param.location else {
                    continue;
                };
                let words = param.array_element_stride * param.array_size;
                if offset + words > block_words {
                    return Err(RenderError::InvalidParameters(format!(
                        "Uniform '{}' reads past the end of a {}-byte block",
                        param.name,
                        buffer.size_bytes()
                    )));
                }
                self.native.record(NativeCall::SetUniform {
                    program,
                    offset,
                    words,
                });
            }
        }
        self.state.stats.param_buffer_binds += 1;
        Ok(())
    }

    fn convert_projection_matrix(&self, matrix: &Mat4) -> Mat4 {
        *matrix
    }

    fn color_vertex_element_type(&self) -> VertexElementType {
        VertexElementType::ColorAbgr
    }

    fn generate_param_block_desc(
        &self,
        name: &str,
        params: &mut [GpuParamDataDesc],
    ) -> GpuParamBlockDesc {
        layout_param_block(name, params, ParamPacking::Std140, |_| ParamLocation::Block {
            slot: 0,
        })
    }

    fn minimum_depth_input_value(&self) -> f32 {
        -1.0
    }
}

fn create_backend(config: &RenderSystemConfig) -> RenderBackend {
    RenderBackend::Gl(Box::new(GlRenderSystem::new(config.clone())))
}

inventory::submit! {
    BackendRegistration {
        name: super::NAME,
        plugin_name: "prism-gl",
        create: create_backend,
    }
}
