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

//! OpenGL drivers, versions and rendering contexts.

use std::fmt;
use std::sync::Arc;

use prism_core::renderer::{
    DeviceFeatures, GpuProgramType, NativeObject, NativeResourceAllocator, RawHandle, RenderError,
    VideoMode,
};

use crate::graphics::native::{NativeCall, NativeDevice, NativeObjectKind};

/// An OpenGL version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
}

impl GlVersion {
    /// Creates a version.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The oldest version the backend runs on.
    pub const MINIMUM: GlVersion = GlVersion::new(4, 1);
}

impl fmt::Display for GlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// One OpenGL implementation.
#[derive(Debug, Clone, PartialEq)]
pub struct GlDriver {
    /// `GL_RENDERER`.
    pub renderer: String,
    /// PCI vendor id.
    pub vendor_id: u32,
    /// PCI device id.
    pub device_id: u32,
    /// `GL_VERSION` as reported by the driver.
    pub driver_version: String,
    /// The highest context version available.
    pub version: GlVersion,
    /// Supported extensions.
    pub extensions: Vec<String>,
    /// Display modes.
    pub video_modes: Vec<VideoMode>,
    /// `GL_MAX_SAMPLES`.
    pub max_samples: u32,
}

impl GlDriver {
    /// Returns `true` if the driver lists `extension`.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    /// GLSL profiles the driver compiles.
    pub fn shader_profiles(&self) -> Vec<String> {
        let mut profiles = vec!["glsl".to_string()];
        if self.version >= GlVersion::new(4, 1) {
            profiles.push("glsl4_1".to_string());
        }
        if self.version >= GlVersion::new(4, 5) {
            profiles.push("glsl4_5".to_string());
        }
        profiles
    }

    /// Optional features of the driver.
    pub fn features(&self) -> DeviceFeatures {
        let mut features = DeviceFeatures::USER_CLIP_PLANES
            | DeviceFeatures::PARAM_BLOCKS
            | DeviceFeatures::GEOMETRY_PROGRAM
            | DeviceFeatures::TESSELLATION_PROGRAM;
        if self.version >= GlVersion::new(4, 3)
            || self.has_extension("GL_ARB_compute_shader")
        {
            features.insert(DeviceFeatures::COMPUTE_PROGRAM);
        }
        if self.version >= GlVersion::new(4, 2)
            || self.has_extension("GL_ARB_shader_image_load_store")
        {
            features.insert(DeviceFeatures::LOAD_STORE_TEXTURE);
        }
        if self.has_extension("GL_EXT_texture_compression_s3tc") {
            features.insert(DeviceFeatures::TEXTURE_COMPRESSION_BC);
        }
        if self.version >= GlVersion::new(4, 2)
            || self.has_extension("GL_ARB_texture_compression_bptc")
        {
            features.insert(DeviceFeatures::TEXTURE_COMPRESSION_BC6_7);
        }
        features
    }

    /// Texture units per stage, indexed by [`GpuProgramType::index`].
    pub fn texture_units(&self) -> [u32; GpuProgramType::COUNT] {
        let features = self.features();
        let mut units = [16u32; GpuProgramType::COUNT];
        if !features.contains(DeviceFeatures::COMPUTE_PROGRAM) {
            units[GpuProgramType::Compute.index()] = 0;
        }
        units
    }

    /// Returns `true` if framebuffers can be created with `count` samples.
    pub fn supports_multisample(&self, count: u32) -> bool {
        count == 1 || (count.is_power_of_two() && count <= self.max_samples)
    }
}

/// The OpenGL implementations available.
#[derive(Debug, Clone, Default)]
pub struct GlDriverList {
    drivers: Vec<GlDriver>,
}

impl GlDriverList {
    /// Wraps an explicit driver list.
    pub fn new(drivers: Vec<GlDriver>) -> Self {
        Self { drivers }
    }

    /// Enumerates the emulated drivers.
    pub fn enumerate() -> Self {
        Self::new(vec![GlDriver {
            renderer: "Prism Reference Renderer".to_string(),
            vendor_id: 0x8086,
            device_id: 0x9A49,
            driver_version: "4.6.0 - Build 31.0.101.4032".to_string(),
            version: GlVersion::new(4, 6),
            extensions: vec![
                "GL_ARB_separate_shader_objects".to_string(),
                "GL_EXT_texture_compression_s3tc".to_string(),
                "GL_ARB_texture_compression_bptc".to_string(),
                "GL_KHR_debug".to_string(),
            ],
            video_modes: vec![VideoMode::new(1280, 720), VideoMode::new(1920, 1080)],
            max_samples: 8,
        }])
    }

    /// The number of drivers.
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Returns `true` if no driver was found.
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// The driver at `index`.
    pub fn item(&self, index: usize) -> Option<&GlDriver> {
        self.drivers.get(index)
    }
}

/// An OpenGL rendering context.
#[derive(Debug)]
pub struct GlContext {
    context: NativeObject,
    native: Arc<NativeDevice>,
}

impl GlContext {
    /// Creates a context for a window.
    pub fn create(
        native: &Arc<NativeDevice>,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        let handle = native.create(NativeObjectKind::Context).map_err(|e| {
            RenderError::rendering_api(super::NAME, format!("Unable to create a GL context: {e}"))
        })?;
        Ok(Self {
            context: NativeObject::new(handle, allocator),
            native: native.clone(),
        })
    }

    /// The context handle.
    pub fn handle(&self) -> RawHandle {
        self.context.handle()
    }

    /// Makes the context current on the calling thread.
    pub fn make_current(&self) {
        self.native.record(NativeCall::MakeCurrent {
            context: self.handle(),
        });
    }
}
