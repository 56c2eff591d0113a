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

//! Fixed-function pipeline state: descriptors, immutable state objects and their manager.
//!
//! A descriptor is a plain value. A state object wraps one descriptor, is immutable,
//! and realizes its native backend handle lazily on first bind.

pub mod blend;
pub mod depth_stencil;
pub mod manager;
pub mod object;
pub mod rasterizer;
pub mod sampler;

pub use self::blend::{BlendState, BlendStateDesc, RenderTargetBlendStateDesc, MAX_RENDER_TARGETS};
pub use self::depth_stencil::{DepthStencilState, DepthStencilStateDesc, StencilFaceDesc};
pub use self::manager::RenderStateManager;
pub use self::object::RenderStateObject;
pub use self::rasterizer::{RasterizerState, RasterizerStateDesc};
pub use self::sampler::{SamplerState, SamplerStateDesc, UvwAddressingMode};

/// A comparison used for depth, stencil and sampler comparison tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// The test never passes.
    AlwaysFail,
    /// The test always passes.
    AlwaysPass,
    /// Passes if `new < existing`.
    Less,
    /// Passes if `new <= existing`.
    LessEqual,
    /// Passes if `new == existing`.
    Equal,
    /// Passes if `new != existing`.
    NotEqual,
    /// Passes if `new >= existing`.
    GreaterEqual,
    /// Passes if `new > existing`.
    Greater,
}

/// What happens to the stencil value when a stencil test outcome is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    /// Keep the current value.
    Keep,
    /// Set to zero.
    Zero,
    /// Set to the reference value.
    Replace,
    /// Increment, clamping at the maximum.
    Increment,
    /// Decrement, clamping at zero.
    Decrement,
    /// Increment, wrapping to zero.
    IncrementWrap,
    /// Decrement, wrapping to the maximum.
    DecrementWrap,
    /// Bitwise invert.
    Invert,
}

/// A factor applied to the source or destination color in blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `1`.
    One,
    /// `0`.
    Zero,
    /// Destination color.
    DestColor,
    /// Source color.
    SourceColor,
    /// `1 - destination color`.
    InvDestColor,
    /// `1 - source color`.
    InvSourceColor,
    /// Destination alpha.
    DestAlpha,
    /// Source alpha.
    SourceAlpha,
    /// `1 - destination alpha`.
    InvDestAlpha,
    /// `1 - source alpha`.
    InvSourceAlpha,
}

/// How the weighted source and destination are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    /// `src + dst`.
    Add,
    /// `src - dst`.
    Subtract,
    /// `dst - src`.
    ReverseSubtract,
    /// `min(src, dst)`.
    Min,
    /// `max(src, dst)`.
    Max,
}

/// Which triangle winding is culled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullingMode {
    /// Nothing is culled.
    None,
    /// Clockwise triangles are culled.
    Clockwise,
    /// Counter-clockwise triangles are culled.
    CounterClockwise,
}

/// How polygons are rasterized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    /// Edges only.
    Wireframe,
    /// Filled.
    Solid,
}

/// A texture filtering mode, used separately for minification, magnification and mips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOptions {
    /// No filtering. Only meaningful for mip filtering.
    None,
    /// Nearest texel.
    Point,
    /// Bilinear.
    Linear,
    /// Anisotropic.
    Anisotropic,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureAddressingMode {
    /// Repeat.
    Wrap,
    /// Repeat, mirrored on every other repetition.
    Mirror,
    /// Clamp to the edge texel.
    Clamp,
    /// Use the border color.
    Border,
}
