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

//! Blend state.

use super::{BlendFactor, BlendOperation, RenderStateObject};

/// The maximum number of simultaneously bound color targets.
pub const MAX_RENDER_TARGETS: usize = 8;

/// Blending configuration for a single color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetBlendStateDesc {
    /// Enables blending for this target.
    pub blend_enable: bool,
    /// Source color factor.
    pub src_blend: BlendFactor,
    /// Destination color factor.
    pub dst_blend: BlendFactor,
    /// Color combine operation.
    pub blend_op: BlendOperation,
    /// Source alpha factor.
    pub src_blend_alpha: BlendFactor,
    /// Destination alpha factor.
    pub dst_blend_alpha: BlendFactor,
    /// Alpha combine operation.
    pub blend_op_alpha: BlendOperation,
    /// Per-channel write mask. Bit 0 is red, bit 3 is alpha.
    pub render_target_write_mask: u8,
}

impl Default for RenderTargetBlendStateDesc {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::Zero,
            blend_op: BlendOperation::Add,
            src_blend_alpha: BlendFactor::One,
            dst_blend_alpha: BlendFactor::Zero,
            blend_op_alpha: BlendOperation::Add,
            render_target_write_mask: 0xFF,
        }
    }
}

/// Describes a [`BlendState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendStateDesc {
    /// Uses the fragment alpha as a multisample coverage mask.
    pub alpha_to_coverage_enable: bool,
    /// When `false`, only `render_targets[0]` is used and applied to every target.
    pub independant_blend_enable: bool,
    /// Per-target configuration.
    pub render_targets: [RenderTargetBlendStateDesc; MAX_RENDER_TARGETS],
}

impl BlendStateDesc {
    /// Returns the configuration that applies to color target `index`.
    pub fn target(&self, index: usize) -> &RenderTargetBlendStateDesc {
        if self.independant_blend_enable {
            &self.render_targets[index.min(MAX_RENDER_TARGETS - 1)]
        } else {
            &self.render_targets[0]
        }
    }
}

/// An immutable blend state object.
pub type BlendState = RenderStateObject<BlendStateDesc>;
