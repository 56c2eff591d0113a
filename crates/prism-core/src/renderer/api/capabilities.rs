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

//! What the active device can do.

use std::fmt;

use super::GpuProgramType;
use crate::prism_bitflags;

/// The vendor of a graphics adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GpuVendor {
    /// NVIDIA.
    Nvidia,
    /// AMD.
    Amd,
    /// Intel.
    Intel,
    /// Anything else.
    #[default]
    Unknown,
}

impl GpuVendor {
    /// Maps a PCI vendor id to a vendor.
    pub const fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => GpuVendor::Nvidia,
            0x1002 => GpuVendor::Amd,
            0x8086 | 0x163C => GpuVendor::Intel,
            _ => GpuVendor::Unknown,
        }
    }
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GpuVendor::Nvidia => "NVIDIA",
            GpuVendor::Amd => "AMD",
            GpuVendor::Intel => "Intel",
            GpuVendor::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

prism_bitflags! {
    /// Optional device features.
    pub struct DeviceFeatures: u16 {
        /// Geometry programs.
        const GEOMETRY_PROGRAM = 1 << 0;
        /// Hull and domain programs.
        const TESSELLATION_PROGRAM = 1 << 1;
        /// Compute programs.
        const COMPUTE_PROGRAM = 1 << 2;
        /// BC1-BC5 texture compression.
        const TEXTURE_COMPRESSION_BC = 1 << 3;
        /// BC6H and BC7 texture compression.
        const TEXTURE_COMPRESSION_BC6_7 = 1 << 4;
        /// User clip planes through the fixed-function pipeline.
        const USER_CLIP_PLANES = 1 << 5;
        /// Load/store (random write) textures.
        const LOAD_STORE_TEXTURE = 1 << 6;
        /// Uniform (constant) blocks.
        const PARAM_BLOCKS = 1 << 7;
    }
}

/// The capabilities of the active device, filled in once at initialization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderSystemCapabilities {
    /// Name of the render system that detected these capabilities.
    pub render_system_name: String,
    /// Adapter vendor.
    pub vendor: GpuVendor,
    /// Adapter description.
    pub device_name: String,
    /// Driver version string.
    pub driver_version: String,
    /// Shader profiles the device compiles, e.g. `vs_5_0` or `glsl4_1`.
    pub shader_profiles: Vec<String>,
    /// Texture units per program stage, indexed by [`GpuProgramType::index`].
    pub texture_units: [u32; GpuProgramType::COUNT],
    /// Maximum number of vertex streams bound at once.
    pub max_bound_vertex_buffers: u32,
    /// Maximum simultaneous color render targets.
    pub num_multi_render_targets: u32,
    /// Maximum number of user clip planes.
    pub max_clip_planes: u32,
    /// Optional features.
    pub features: DeviceFeatures,
}

impl RenderSystemCapabilities {
    /// Returns `true` if `profile` can be compiled.
    pub fn is_shader_profile_supported(&self, profile: &str) -> bool {
        self.shader_profiles.iter().any(|p| p == profile)
    }

    /// Texture units available to `stage`.
    pub fn texture_units(&self, stage: GpuProgramType) -> u32 {
        self.texture_units[stage.index()]
    }

    /// Returns `true` if programs of `stage` can be created.
    pub fn supports_stage(&self, stage: GpuProgramType) -> bool {
        match stage {
            GpuProgramType::Vertex | GpuProgramType::Fragment => true,
            GpuProgramType::Geometry => self.features.contains(DeviceFeatures::GEOMETRY_PROGRAM),
            GpuProgramType::Hull | GpuProgramType::Domain => {
                self.features.contains(DeviceFeatures::TESSELLATION_PROGRAM)
            }
            GpuProgramType::Compute => self.features.contains(DeviceFeatures::COMPUTE_PROGRAM),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_ids() {
        assert_eq!(GpuVendor::from_vendor_id(0x10DE), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_id(0x1002), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_vendor_id(0x8086), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_vendor_id(0x163C), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_vendor_id(0x5143), GpuVendor::Unknown);
    }

    #[test]
    fn test_stage_support_follows_features() {
        let caps = RenderSystemCapabilities {
            features: DeviceFeatures::GEOMETRY_PROGRAM,
            ..RenderSystemCapabilities::default()
        };
        assert!(caps.supports_stage(GpuProgramType::Vertex));
        assert!(caps.supports_stage(GpuProgramType::Geometry));
        assert!(!caps.supports_stage(GpuProgramType::Hull));
        assert!(!caps.supports_stage(GpuProgramType::Compute));
    }
}
