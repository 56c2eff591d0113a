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

//! Sampler state.

use std::hash::{Hash, Hasher};

use super::{CompareFunction, FilterOptions, RenderStateObject, TextureAddressingMode};
use crate::math::LinearRgba;

/// Addressing modes for the three texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UvwAddressingMode {
    /// Horizontal.
    pub u: TextureAddressingMode,
    /// Vertical.
    pub v: TextureAddressingMode,
    /// Depth.
    pub w: TextureAddressingMode,
}

impl Default for UvwAddressingMode {
    fn default() -> Self {
        Self {
            u: TextureAddressingMode::Wrap,
            v: TextureAddressingMode::Wrap,
            w: TextureAddressingMode::Wrap,
        }
    }
}

/// Describes a [`SamplerState`].
#[derive(Debug, Clone, Copy)]
pub struct SamplerStateDesc {
    /// Coordinate addressing.
    pub address_mode: UvwAddressingMode,
    /// Minification filter.
    pub min_filter: FilterOptions,
    /// Magnification filter.
    pub mag_filter: FilterOptions,
    /// Filter between mip levels.
    pub mip_filter: FilterOptions,
    /// Maximum anisotropy, used when a filter is [`FilterOptions::Anisotropic`].
    pub max_aniso: u32,
    /// Bias added to the computed mip level.
    pub mipmap_bias: f32,
    /// Lowest mip level that may be sampled.
    pub mip_min: f32,
    /// Highest mip level that may be sampled.
    pub mip_max: f32,
    /// Color returned by [`TextureAddressingMode::Border`].
    pub border_color: LinearRgba,
    /// Comparison used by comparison samplers.
    pub comparison_func: CompareFunction,
}

impl SamplerStateDesc {
    fn key(&self) -> (UvwAddressingMode, [FilterOptions; 3], u32, [u32; 7], CompareFunction) {
        let c = self.border_color;
        (
            self.address_mode,
            [self.min_filter, self.mag_filter, self.mip_filter],
            self.max_aniso,
            [
                self.mipmap_bias.to_bits(),
                self.mip_min.to_bits(),
                self.mip_max.to_bits(),
                c.r.to_bits(),
                c.g.to_bits(),
                c.b.to_bits(),
                c.a.to_bits(),
            ],
            self.comparison_func,
        )
    }
}

impl Default for SamplerStateDesc {
    fn default() -> Self {
        Self {
            address_mode: UvwAddressingMode::default(),
            min_filter: FilterOptions::Linear,
            mag_filter: FilterOptions::Linear,
            mip_filter: FilterOptions::Point,
            max_aniso: 0,
            mipmap_bias: 0.0,
            mip_min: -f32::MAX,
            mip_max: f32::MAX,
            border_color: LinearRgba::BLACK,
            comparison_func: CompareFunction::AlwaysPass,
        }
    }
}

impl PartialEq for SamplerStateDesc {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SamplerStateDesc {}

impl Hash for SamplerStateDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// An immutable sampler state object.
pub type SamplerState = RenderStateObject<SamplerStateDesc>;
