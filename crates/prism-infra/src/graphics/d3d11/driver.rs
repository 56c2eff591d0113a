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

//! Adapter enumeration and feature level capabilities.

use std::fmt;

use prism_core::renderer::{DeviceFeatures, GpuProgramType, VideoMode};

/// A Direct3D feature level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureLevel {
    /// 9_1.
    Level9_1,
    /// 9_2.
    Level9_2,
    /// 9_3.
    Level9_3,
    /// 10_0.
    Level10_0,
    /// 10_1.
    Level10_1,
    /// 11_0.
    Level11_0,
    /// 11_1.
    Level11_1,
}

impl FeatureLevel {
    /// Every level, lowest first.
    pub const ALL: [FeatureLevel; 7] = [
        FeatureLevel::Level9_1,
        FeatureLevel::Level9_2,
        FeatureLevel::Level9_3,
        FeatureLevel::Level10_0,
        FeatureLevel::Level10_1,
        FeatureLevel::Level11_0,
        FeatureLevel::Level11_1,
    ];

    /// Maximum vertex streams bound at once.
    pub fn max_bound_vertex_buffers(self) -> u32 {
        if self >= FeatureLevel::Level10_1 {
            32
        } else {
            16
        }
    }

    /// Maximum simultaneous render targets.
    pub fn num_multi_render_targets(self) -> u32 {
        match self {
            FeatureLevel::Level9_1 | FeatureLevel::Level9_2 => 1,
            FeatureLevel::Level9_3 => 4,
            _ => 8,
        }
    }

    /// Shader resource slots per stage, indexed by [`GpuProgramType::index`].
    pub fn texture_units(self) -> [u32; GpuProgramType::COUNT] {
        let mut units = [0u32; GpuProgramType::COUNT];
        if self >= FeatureLevel::Level10_0 {
            for stage in [
                GpuProgramType::Vertex,
                GpuProgramType::Fragment,
                GpuProgramType::Geometry,
            ] {
                units[stage.index()] = 128;
            }
        } else {
            units[GpuProgramType::Vertex.index()] = 16;
            units[GpuProgramType::Fragment.index()] = 16;
        }
        if self >= FeatureLevel::Level11_0 {
            for stage in [
                GpuProgramType::Hull,
                GpuProgramType::Domain,
                GpuProgramType::Compute,
            ] {
                units[stage.index()] = 128;
            }
        }
        units
    }

    /// HLSL profiles the level compiles.
    pub fn shader_profiles(self) -> Vec<String> {
        let mut profiles: Vec<&str> = Vec::new();
        if self >= FeatureLevel::Level9_1 {
            profiles.extend(["ps_4_0_level_9_1", "vs_4_0_level_9_1"]);
        }
        if self >= FeatureLevel::Level9_3 {
            profiles.extend(["ps_4_0_level_9_3", "vs_4_0_level_9_3"]);
        }
        if self >= FeatureLevel::Level10_0 {
            profiles.extend(["ps_4_0", "vs_4_0", "gs_4_0"]);
        }
        if self >= FeatureLevel::Level10_1 {
            profiles.extend(["ps_4_1", "vs_4_1", "gs_4_1"]);
        }
        if self >= FeatureLevel::Level11_0 {
            profiles.extend(["ps_5_0", "vs_5_0", "gs_5_0", "cs_5_0", "hs_5_0", "ds_5_0"]);
        }
        profiles.into_iter().map(str::to_string).collect()
    }

    /// Optional features available at this level.
    pub fn features(self) -> DeviceFeatures {
        let mut features = DeviceFeatures::EMPTY;
        if self >= FeatureLevel::Level10_0 {
            features.insert(DeviceFeatures::GEOMETRY_PROGRAM);
            features.insert(DeviceFeatures::TEXTURE_COMPRESSION_BC);
            features.insert(DeviceFeatures::PARAM_BLOCKS);
        }
        if self >= FeatureLevel::Level11_0 {
            features.insert(DeviceFeatures::TESSELLATION_PROGRAM);
            features.insert(DeviceFeatures::COMPUTE_PROGRAM);
            features.insert(DeviceFeatures::TEXTURE_COMPRESSION_BC6_7);
            features.insert(DeviceFeatures::LOAD_STORE_TEXTURE);
        }
        features
    }

    /// The highest multisample count the level guarantees.
    pub fn max_multisample_count(self) -> u32 {
        match self {
            FeatureLevel::Level9_1 | FeatureLevel::Level9_2 => 2,
            FeatureLevel::Level9_3 | FeatureLevel::Level10_0 => 4,
            _ => 8,
        }
    }
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureLevel::Level9_1 => "9_1",
            FeatureLevel::Level9_2 => "9_2",
            FeatureLevel::Level9_3 => "9_3",
            FeatureLevel::Level10_0 => "10_0",
            FeatureLevel::Level10_1 => "10_1",
            FeatureLevel::Level11_0 => "11_0",
            FeatureLevel::Level11_1 => "11_1",
        };
        f.write_str(name)
    }
}

/// One DXGI adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct D3D11Driver {
    /// Adapter description.
    pub description: String,
    /// PCI vendor id.
    pub vendor_id: u32,
    /// PCI device id.
    pub device_id: u32,
    /// Driver version string.
    pub driver_version: String,
    /// Dedicated video memory in bytes.
    pub dedicated_video_memory: u64,
    /// Display modes of the adapter's primary output.
    pub video_modes: Vec<VideoMode>,
    /// The highest feature level the adapter supports.
    pub feature_level: FeatureLevel,
}

/// The adapters found on this machine.
#[derive(Debug, Clone, Default)]
pub struct D3D11DriverList {
    drivers: Vec<D3D11Driver>,
}

impl D3D11DriverList {
    /// Wraps an explicit adapter list.
    pub fn new(drivers: Vec<D3D11Driver>) -> Self {
        Self { drivers }
    }

    /// Enumerates the adapters of the emulated DXGI factory: one hardware
    /// adapter and the software rasterizer.
    pub fn enumerate() -> Self {
        let modes = vec![
            VideoMode::new(800, 600),
            VideoMode::new(1280, 720),
            VideoMode::new(1920, 1080),
        ];
        Self::new(vec![
            D3D11Driver {
                description: "Prism Reference Adapter".to_string(),
                vendor_id: 0x10DE,
                device_id: 0x2484,
                driver_version: "31.0.15.3623".to_string(),
                dedicated_video_memory: 8 << 30,
                video_modes: modes.clone(),
                feature_level: FeatureLevel::Level11_0,
            },
            D3D11Driver {
                description: "Microsoft Basic Render Driver".to_string(),
                vendor_id: 0x1414,
                device_id: 0x008C,
                driver_version: "10.0.19041.1".to_string(),
                dedicated_video_memory: 0,
                video_modes: modes,
                feature_level: FeatureLevel::Level10_1,
            },
        ])
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
    pub fn item(&self, index: usize) -> Option<&D3D11Driver> {
        self.drivers.get(index)
    }

    /// The adapter with the given description.
    pub fn item_by_name(&self, description: &str) -> Option<&D3D11Driver> {
        self.drivers.iter().find(|d| d.description == description)
    }
}
