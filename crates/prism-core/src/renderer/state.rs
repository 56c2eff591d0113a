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

//! State shared by every render system backend: frame lifecycle, core thread,
//! bound programs, clip planes and the input assembler bindings.

use std::fmt;
use std::sync::Arc;

use super::api::{
    DrawOperation, GpuProgram, GpuProgramType, IndexBuffer, RenderStats,
    RenderSystemCapabilities, RenderTarget, VertexBuffer, VertexDeclaration,
};
use super::error::RenderError;
use crate::math::{Plane, Rect2, Rect2I};
use crate::thread::CoreThread;

/// Where a render system is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created, `initialize` not called yet.
    Uninitialized,
    /// Initialized, between frames.
    Ready,
    /// Between `begin_frame` and `end_frame`.
    InFrame,
    /// Destroyed; no further calls are accepted.
    Destroyed,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "uninitialized",
            Lifecycle::Ready => "ready",
            Lifecycle::InFrame => "in a frame",
            Lifecycle::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// The backend-independent part of a render system's state.
pub struct RenderSystemState {
    lifecycle: Lifecycle,
    core_thread: CoreThread,
    bound_programs: [Option<Arc<GpuProgram>>; GpuProgramType::COUNT],
    clip_planes: Vec<Plane>,
    clip_planes_dirty: bool,
    active_target: Option<Arc<dyn RenderTarget>>,
    viewport: Rect2,
    viewport_px: Rect2I,
    /// The scissor rectangle in pixels.
    pub scissor: Option<Rect2I>,
    /// The bound vertex declaration.
    pub vertex_declaration: Option<Arc<VertexDeclaration>>,
    /// Bound vertex streams, indexed by stream.
    pub vertex_buffers: Vec<Option<Arc<VertexBuffer>>>,
    /// The bound index buffer.
    pub index_buffer: Option<Arc<IndexBuffer>>,
    /// The primitive topology.
    pub draw_operation: DrawOperation,
    /// Stencil reference used by draws.
    pub stencil_ref: u32,
    /// Accumulated statistics.
    pub stats: RenderStats,
    /// Capabilities of the active device.
    pub capabilities: RenderSystemCapabilities,
}

impl RenderSystemState {
    /// A fresh, uninitialized state.
    pub fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Uninitialized,
            core_thread: CoreThread::default(),
            bound_programs: Default::default(),
            clip_planes: Vec::new(),
            clip_planes_dirty: false,
            active_target: None,
            viewport: Rect2::FULL,
            viewport_px: Rect2I::default(),
            scissor: None,
            vertex_declaration: None,
            vertex_buffers: Vec::new(),
            index_buffer: None,
            draw_operation: DrawOperation::default(),
            stencil_ref: 0,
            stats: RenderStats::default(),
            capabilities: RenderSystemCapabilities::default(),
        }
    }

    // --- Lifecycle ---

    /// The current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The core thread binding.
    pub fn core_thread(&self) -> &CoreThread {
        &self.core_thread
    }

    /// Binds the calling thread as the core thread and marks the system ready.
    pub fn mark_initialized(&mut self) {
        self.core_thread.bind_current();
        self.lifecycle = Lifecycle::Ready;
    }

    /// Drops every binding and marks the system destroyed.
    pub fn mark_destroyed(&mut self) {
        self.bound_programs = Default::default();
        self.active_target = None;
        self.vertex_declaration = None;
        self.vertex_buffers.clear();
        self.index_buffer = None;
        self.clip_planes.clear();
        self.clip_planes_dirty = false;
        self.core_thread.unbind();
        self.lifecycle = Lifecycle::Destroyed;
    }

    /// Checks the system is initialized and the caller is on the core thread.
    pub fn ensure_active(&self, operation: &'static str) -> Result<(), RenderError> {
        match self.lifecycle {
            Lifecycle::Uninitialized | Lifecycle::Destroyed => Err(RenderError::NotInitialized),
            Lifecycle::Ready | Lifecycle::InFrame => self.core_thread.ensure(operation),
        }
    }

    /// Checks the caller is on the core thread, whatever the lifecycle state.
    pub fn ensure_core_thread(&self, operation: &'static str) -> Result<(), RenderError> {
        self.core_thread.ensure(operation)
    }

    /// Enters a frame. Only legal when ready.
    pub fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.ensure_active("begin_frame")?;
        if self.lifecycle != Lifecycle::Ready {
            return Err(self.invalid_state("begin_frame"));
        }
        self.lifecycle = Lifecycle::InFrame;
        Ok(())
    }

    /// Leaves a frame. Only legal inside one.
    pub fn end_frame(&mut self) -> Result<(), RenderError> {
        self.ensure_active("end_frame")?;
        if self.lifecycle != Lifecycle::InFrame {
            return Err(self.invalid_state("end_frame"));
        }
        self.lifecycle = Lifecycle::Ready;
        self.stats.frame_number += 1;
        Ok(())
    }

    /// Builds an [`RenderError::InvalidState`] for `operation` in the current state.
    pub fn invalid_state(&self, operation: &'static str) -> RenderError {
        RenderError::InvalidState {
            operation,
            state: self.lifecycle.to_string(),
        }
    }

    // --- Render target and viewport ---

    /// The active render target.
    pub fn active_target(&self) -> Option<&Arc<dyn RenderTarget>> {
        self.active_target.as_ref()
    }

    /// Switches the active target, rejecting switches inside a frame, and
    /// re-applies the normalized viewport to it.
    pub fn set_active_target(&mut self, target: Arc<dyn RenderTarget>) -> Result<(), RenderError> {
        if self.lifecycle == Lifecycle::InFrame {
            return Err(self.invalid_state("set_render_target"));
        }
        self.active_target = Some(target);
        self.stats.render_target_changes += 1;
        self.apply_viewport(self.viewport);
        Ok(())
    }

    /// Stores a viewport normalized to the active target and returns it in pixels.
    pub fn apply_viewport(&mut self, area: Rect2) -> Rect2I {
        self.viewport = area;
        self.viewport_px = match &self.active_target {
            Some(target) => {
                let props = target.properties();
                Rect2I::from_normalized(area, props.width, props.height)
            }
            None => Rect2I::default(),
        };
        self.viewport_px
    }

    /// The viewport in normalized coordinates.
    pub fn viewport(&self) -> Rect2 {
        self.viewport
    }

    /// The viewport in pixels of the active target.
    pub fn viewport_px(&self) -> Rect2I {
        self.viewport_px
    }

    /// The sub-rectangle a viewport clear must be restricted to, or `None`
    /// when the whole target can be cleared instead.
    pub fn viewport_clear_area(&self) -> Option<Rect2I> {
        let target = self.active_target.as_ref()?;
        let props = target.properties();
        let vp = self.viewport_px;
        if vp.width == 0 || vp.height == 0 || vp.covers(props.width, props.height) {
            None
        } else {
            Some(vp)
        }
    }

    // --- GPU programs ---

    /// Records `program` as bound to its stage.
    ///
    /// Returns `false`, changing nothing, for null programs and programs that
    /// have not finished loading.
    pub fn bind_program(&mut self, program: &Arc<GpuProgram>) -> bool {
        if !program.is_supported() || !program.is_loaded() {
            return false;
        }
        let stage = program.program_type();
        self.bound_programs[stage.index()] = Some(program.clone());
        if stage == GpuProgramType::Vertex && !self.clip_planes.is_empty() {
            self.clip_planes_dirty = true;
        }
        self.stats.program_binds += 1;
        true
    }

    /// Clears the program bound to `stage`.
    pub fn unbind_program(&mut self, stage: GpuProgramType) {
        self.bound_programs[stage.index()] = None;
        if stage == GpuProgramType::Vertex && !self.clip_planes.is_empty() {
            self.clip_planes_dirty = true;
        }
    }

    /// The program bound to `stage`.
    pub fn bound_program(&self, stage: GpuProgramType) -> Option<&Arc<GpuProgram>> {
        self.bound_programs[stage.index()].as_ref()
    }

    /// Returns `true` if a program is bound to `stage`.
    pub fn is_program_bound(&self, stage: GpuProgramType) -> bool {
        self.bound_programs[stage.index()].is_some()
    }

    // --- Clip planes ---

    /// The active clip planes.
    pub fn clip_planes(&self) -> &[Plane] {
        &self.clip_planes
    }

    /// Returns `true` if the clip planes changed since the backend last applied them.
    pub fn clip_planes_dirty(&self) -> bool {
        self.clip_planes_dirty
    }

    /// Marks the clip planes as applied.
    pub fn clear_clip_planes_dirty(&mut self) {
        self.clip_planes_dirty = false;
    }

    /// Appends a clip plane.
    pub fn add_clip_plane(&mut self, plane: Plane) {
        self.clip_planes.push(plane);
        self.clip_planes_dirty = true;
    }

    /// Replaces the clip planes. Only marks them dirty if the list changed.
    pub fn set_clip_planes(&mut self, planes: Vec<Plane>) {
        if planes != self.clip_planes {
            self.clip_planes = planes;
            self.clip_planes_dirty = true;
        }
    }

    /// Removes every clip plane.
    pub fn reset_clip_planes(&mut self) {
        if !self.clip_planes.is_empty() {
            self.clip_planes.clear();
            self.clip_planes_dirty = true;
        }
    }

    // --- Draw validation ---

    /// Checks a draw can be issued, returning `false` (with a warning) when
    /// no vertex program or vertex declaration is bound.
    pub fn can_draw(&self, operation: &'static str) -> bool {
        if !self.is_program_bound(GpuProgramType::Vertex) {
            log::warn!("'{operation}' skipped: no vertex program is bound");
            return false;
        }
        if self.vertex_declaration.is_none() {
            log::warn!("'{operation}' skipped: no vertex declaration is bound");
            return false;
        }
        true
    }

    /// Stores vertex streams starting at `start_index`, checking the device limit.
    pub fn bind_vertex_buffers(
        &mut self,
        start_index: u32,
        buffers: &[Arc<VertexBuffer>],
    ) -> Result<(), RenderError> {
        let max = self.capabilities.max_bound_vertex_buffers;
        let end = start_index as usize + buffers.len();
        if end > max as usize {
            return Err(RenderError::InvalidParameters(format!(
                "Vertex streams {start_index}..{end} exceed the limit of {max}"
            )));
        }
        if self.vertex_buffers.len() < end {
            self.vertex_buffers.resize(end, None);
        }
        for (slot, buffer) in self.vertex_buffers[start_index as usize..end]
            .iter_mut()
            .zip(buffers)
        {
            *slot = Some(buffer.clone());
        }
        self.stats.vertex_buffer_binds += buffers.len() as u64;
        Ok(())
    }

    /// Checks `unit` is a valid texture unit for `stage`.
    pub fn check_texture_unit(&self, stage: GpuProgramType, unit: u32) -> Result<(), RenderError> {
        let units = self.capabilities.texture_units(stage);
        if unit >= units {
            return Err(RenderError::InvalidParameters(format!(
                "Texture unit {unit} out of range for {stage:?} programs ({units} units)"
            )));
        }
        Ok(())
    }
}

impl Default for RenderSystemState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RenderSystemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderSystemState")
            .field("lifecycle", &self.lifecycle)
            .field("active_target", &self.active_target.as_ref().map(|t| t.id()))
            .field("clip_planes", &self.clip_planes.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> RenderSystemState {
        let mut state = RenderSystemState::new();
        state.mark_initialized();
        state
    }

    #[test]
    fn test_frame_lifecycle_transitions() {
        let mut state = ready();
        assert!(matches!(
            state.end_frame(),
            Err(RenderError::InvalidState { .. })
        ));
        state.begin_frame().expect("begin");
        assert_eq!(state.lifecycle(), Lifecycle::InFrame);
        assert!(state.begin_frame().is_err());
        state.end_frame().expect("end");
        assert_eq!(state.stats.frame_number, 1);
    }

    #[test]
    fn test_uninitialized_and_destroyed_reject_calls() {
        let mut state = RenderSystemState::new();
        assert_eq!(state.begin_frame(), Err(RenderError::NotInitialized));
        state.mark_initialized();
        state.mark_destroyed();
        assert_eq!(
            state.ensure_active("draw"),
            Err(RenderError::NotInitialized)
        );
    }

    #[test]
    fn test_clip_plane_dirty_rules() {
        let mut state = ready();
        state.reset_clip_planes();
        assert!(!state.clip_planes_dirty(), "resetting an empty list is clean");

        state.add_clip_plane(Plane::new(0.0, 1.0, 0.0, 0.0));
        assert!(state.clip_planes_dirty());
        state.clear_clip_planes_dirty();

        state.set_clip_planes(vec![Plane::new(0.0, 1.0, 0.0, 0.0)]);
        assert!(!state.clip_planes_dirty(), "identical list is clean");

        state.set_clip_planes(vec![Plane::new(1.0, 0.0, 0.0, 0.0)]);
        assert!(state.clip_planes_dirty());
        state.clear_clip_planes_dirty();

        state.unbind_program(GpuProgramType::Vertex);
        assert!(state.clip_planes_dirty(), "vertex program change with planes");
        state.clear_clip_planes_dirty();

        state.unbind_program(GpuProgramType::Fragment);
        assert!(!state.clip_planes_dirty());
    }

    #[test]
    fn test_draw_requires_program_and_declaration() {
        let state = ready();
        assert!(!state.can_draw("draw"));
    }

    #[test]
    fn test_vertex_stream_limit() {
        let mut state = ready();
        state.capabilities.max_bound_vertex_buffers = 16;
        assert!(state.bind_vertex_buffers(16, &[]).is_ok());
        assert!(matches!(
            state.bind_vertex_buffers(20, &[]),
            Err(RenderError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_viewport_clear_area_without_target() {
        let mut state = ready();
        state.apply_viewport(Rect2::new(0.0, 0.0, 0.5, 0.5));
        assert_eq!(state.viewport_clear_area(), None);
    }
}
