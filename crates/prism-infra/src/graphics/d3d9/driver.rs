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

//! Direct3D 9 adapters and the shader model they expose.

use std::fmt;

use prism_core::renderer::{DeviceFeatures, GpuProgramType, VideoMode};

/// A Direct3D 9 shader model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderModel {
    /// 2.0.
    Model2_0,
    /// 3.0.
    Model3_0,
}

impl ShaderModel {
    /// HLSL profiles the model compiles.
    pub fn shader_profiles(self) -> Vec<String> {
        let mut profiles = vec!["vs_2_0", "ps_2_0"];
        if self >= ShaderModel::Model3_0 {
            profiles.extend(["vs_3_0", "ps_3_0"]);
        }
        profiles.into_iter().map(str::to_string).collect()
    }

    /// Sampler units per stage, indexed by [`GpuProgramType::index`].
    pub fn texture_units(self) -> [u32; GpuProgramType::COUNT] {
        let mut units = [0u32; GpuProgramType::COUNT];
        units[GpuProgramType::Fragment.index()] = 16;
        // Vertex texture fetch arrived with shader model 3.
        if self >= ShaderModel::Model3_0 {
            units[GpuProgramType::Vertex.index()] = 4;
        }
        units
    }

    /// Maximum simultaneous render targets.
    pub fn num_multi_render_targets(self) -> u32 {
        match self {
            ShaderModel::Model2_0 => 1,
            ShaderModel::Model3_0 => 4,
        }
    }
}

impl fmt::Display for ShaderModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderModel::Model2_0 => f.write_str("2.0"),
            ShaderModel::Model3_0 => f.write_str("3.0"),
        }
    }
}

/// One Direct3D 9 adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct D3D9Driver {
    /// Adapter description.
    pub description: String,
    /// PCI vendor id.
    pub vendor_id: u32,
    /// PCI device id.
    pub device_id: u32,
    /// Driver version string.
    pub driver_version: String,
    /// Display modes of the adapter.
    pub video_modes: Vec<VideoMode>,
    /// The shader model the adapter supports.
    pub shader_model: ShaderModel,
    /// The largest supported multisample count.
    pub max_multisample_count: u32,
}

impl D3D9Driver {
    /// Optional features of the adapter.
    pub fn features(&self) -> DeviceFeatures {
        DeviceFeatures::TEXTURE_COMPRESSION_BC
    }

    /// Returns `true` if back buffers can be created with `count` samples.
    pub fn supports_multisample(&self, count: u32) -> bool {
        count == 1 || (count.is_power_of_two() && count <= self.max_multisample_count)
    }
}

/// The adapters found by the Direct3D 9 runtime.
#[derive(Debug, Clone, Default)]
pub struct D3D9DriverList {
    drivers: Vec<D3D9Driver>,
}

impl D3D9DriverList {
    /// Wraps an explicit adapter list.
    pub fn new(drivers: Vec<D3D9Driver>) -> Self {
        Self { drivers }
    }

    /// Enumerates the adapters of the emulated runtime.
    pub fn enumerate() -> Self {
        Self::new(vec![D3D9Driver {
            description: "Prism Reference Adapter".to_string(),
            vendor_id: 0x1002,
            device_id: 0x73BF,
            driver_version: "9.18.13.2049".to_string(),
            video_modes: vec![
                VideoMode::new(640, 480),
                VideoMode::new(800, 600),
                VideoMode::new(1280, 720),
            ],
            shader_model: ShaderModel::Model3_0,
            max_multisample_count: 4,
        }])
    }

    /// The number of adapters.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Returns `true` if no adapter was found.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// The adapter at `index`.
    pub fn item(&self, index: usize) -> Option<&D3D9Driver> {
        self.drivers.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_textures_need_model_3() {
        let units = ShaderModel::Model2_0.texture_units();
        assert_eq!(units[GpuProgramType::Vertex.index()], 0);
        assert_eq!(units[GpuProgramType::Fragment.index()], 16);
        let units = ShaderModel::Model3_0.texture_units();
        assert_eq!(units[GpuProgramType::Vertex.index()], 4);
        assert_eq!(units[GpuProgramType::Geometry.index()], 0);
    }

    #[test]
    fn test_profiles_by_model() {
        assert!(!ShaderModel::Model2_0
            .shader_profiles()
            .iter()
            .any(|p| p == "ps_3_0"));
        assert_eq!(ShaderModel::Model3_0.shader_profiles().len(), 4);
    }
}
