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

//! Depth-stencil state.

use super::{CompareFunction, RenderStateObject, StencilOperation};

/// Stencil operations for one triangle facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFaceDesc {
    /// Operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// Operation when the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// Operation when both tests pass.
    pub pass_op: StencilOperation,
    /// The stencil comparison.
    pub comparison_func: CompareFunction,
}

impl Default for StencilFaceDesc {
    fn default() -> Self {
        Self {
            fail_op: StencilOperation::Keep,
            depth_fail_op: StencilOperation::Keep,
            pass_op: StencilOperation::Keep,
            comparison_func: CompareFunction::AlwaysPass,
        }
    }
}

/// Describes a [`DepthStencilState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilStateDesc {
    /// Enables the depth test.
    pub depth_read_enable: bool,
    /// Enables writes to the depth buffer.
    pub depth_write_enable: bool,
    /// The depth comparison.
    pub depth_comparison_func: CompareFunction,
    /// Enables the stencil test.
    pub stencil_enable: bool,
    /// Mask applied to stencil values before comparison.
    pub stencil_read_mask: u8,
    /// Mask applied to stencil values before writing.
    pub stencil_write_mask: u8,
    /// Front-facing stencil behavior.
    pub front: StencilFaceDesc,
    /// Back-facing stencil behavior.
    pub back: StencilFaceDesc,
}

impl Default for DepthStencilStateDesc {
    fn default() -> Self {
        Self {
            depth_read_enable: true,
            depth_write_enable: true,
            depth_comparison_func: CompareFunction::Less,
            stencil_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front: StencilFaceDesc::default(),
            back: StencilFaceDesc::default(),
        }
    }
}

/// An immutable depth-stencil state object.
pub type DepthStencilState = RenderStateObject<DepthStencilStateDesc>;
