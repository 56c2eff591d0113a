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

//! Rasterizer state.

use std::hash::{Hash, Hasher};

use super::{CullingMode, PolygonMode, RenderStateObject};

/// Describes a [`RasterizerState`].
///
/// Equality and hashing compare the float fields bitwise so the descriptor can
/// key a cache.
#[derive(Debug, Clone, Copy)]
pub struct RasterizerStateDesc {
    /// Fill mode.
    pub polygon_mode: PolygonMode,
    /// Face culling.
    pub cull_mode: CullingMode,
    /// Constant depth bias.
    pub depth_bias: f32,
    /// Maximum absolute depth bias.
    pub depth_bias_clamp: f32,
    /// Depth bias scaled by the polygon slope.
    pub slope_scaled_depth_bias: f32,
    /// Clips against the near and far planes.
    pub depth_clip_enable: bool,
    /// Enables the scissor test.
    pub scissor_enable: bool,
    /// Enables multisample rasterization.
    pub multisample_enable: bool,
    /// Enables line antialiasing.
    pub antialiased_line_enable: bool,
}

impl RasterizerStateDesc {
    fn key(&self) -> (PolygonMode, CullingMode, [u32; 3], [bool; 4]) {
        (
            self.polygon_mode,
            self.cull_mode,
            [
                self.depth_bias.to_bits(),
                self.depth_bias_clamp.to_bits(),
                self.slope_scaled_depth_bias.to_bits(),
            ],
            [
                self.depth_clip_enable,
                self.scissor_enable,
                self.multisample_enable,
                self.antialiased_line_enable,
            ],
        )
    }
}

impl Default for RasterizerStateDesc {
    fn default() -> Self {
        Self {
            polygon_mode: PolygonMode::Solid,
            cull_mode: CullingMode::CounterClockwise,
            depth_bias: 0.0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            depth_clip_enable: true,
            scissor_enable: false,
            multisample_enable: true,
            antialiased_line_enable: false,
        }
    }
}

impl PartialEq for RasterizerStateDesc {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for RasterizerStateDesc {}

impl Hash for RasterizerStateDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// An immutable rasterizer state object.
pub type RasterizerState = RenderStateObject<RasterizerStateDesc>;
