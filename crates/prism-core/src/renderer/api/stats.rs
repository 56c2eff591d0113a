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

//! Counters accumulated by a render system as commands are issued.

/// Statistics for the commands issued since the last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// A sequential counter for rendered frames.
    pub frame_number: u64,
    /// The number of draw calls issued.
    pub draw_calls: u64,
    /// The number of vertices (or indices, for indexed draws) submitted.
    pub vertices: u64,
    /// The number of primitives submitted.
    pub primitives: u64,
    /// The number of clears issued.
    pub clears: u64,
    /// Blend state binds.
    pub blend_state_changes: u64,
    /// Rasterizer state binds.
    pub rasterizer_state_changes: u64,
    /// Depth-stencil state binds.
    pub depth_stencil_state_changes: u64,
    /// Sampler binds.
    pub sampler_binds: u64,
    /// Texture binds, including unbinds and load/store textures.
    pub texture_binds: u64,
    /// Vertex buffer binds.
    pub vertex_buffer_binds: u64,
    /// Index buffer binds.
    pub index_buffer_binds: u64,
    /// GPU program binds.
    pub program_binds: u64,
    /// Parameter buffer binds.
    pub param_buffer_binds: u64,
    /// Render target switches.
    pub render_target_changes: u64,
}

impl RenderStats {
    /// Records one draw of `count` vertices producing `primitives` primitives.
    pub fn record_draw(&mut self, count: u32, primitives: u32) {
        self.draw_calls += 1;
        self.vertices += u64::from(count);
        self.primitives += u64::from(primitives);
    }

    /// Zeroes every counter except the frame number.
    pub fn reset_counters(&mut self) {
        *self = Self {
            frame_number: self.frame_number,
            ..Self::default()
        };
    }
}
