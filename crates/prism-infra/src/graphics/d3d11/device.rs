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

//! The Direct3D 11 device and immediate context.

use std::fmt;
use std::sync::Arc;

use prism_core::renderer::{NativeObject, NativeResourceAllocator, RenderError};

use super::driver::{D3D11Driver, FeatureLevel};
use crate::graphics::native::{as_allocator, NativeDevice, NativeObjectKind};

/// Wraps the native device together with the feature level it was created at.
pub struct D3D11Device {
    _context: NativeObject,
    _device: NativeObject,
    native: Arc<NativeDevice>,
    allocator: Arc<dyn NativeResourceAllocator>,
    feature_level: FeatureLevel,
    debug_layer: bool,
}

impl D3D11Device {
    /// Creates a device on `driver`.
    pub fn create(driver: &D3D11Driver, debug_layer: bool) -> Result<Self, RenderError> {
        let native = NativeDevice::new(super::NAME);
        Self::create_on(native, driver, debug_layer)
    }

    /// Creates a device on `driver` through an existing native device.
    pub fn create_on(
        native: Arc<NativeDevice>,
        driver: &D3D11Driver,
        debug_layer: bool,
    ) -> Result<Self, RenderError> {
        let allocator = as_allocator(&native);
        let device = NativeObject::new(native.create(NativeObjectKind::Device)?, &allocator);
        let context = NativeObject::new(native.create(NativeObjectKind::Context)?, &allocator);

        log::info!(
            "Created D3D11 device on '{}' at feature level {} (debug layer: {debug_layer})",
            driver.description,
            driver.feature_level
        );

        Ok(Self {
            _context: context,
            _device: device,
            native,
            allocator,
            feature_level: driver.feature_level,
            debug_layer,
        })
    }

    /// The native device.
    pub fn native(&self) -> &Arc<NativeDevice> {
        &self.native
    }

    /// The device as a resource allocator.
    pub fn allocator(&self) -> &Arc<dyn NativeResourceAllocator> {
        &self.allocator
    }

    /// The feature level.
    pub fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    /// Whether the debug layer is enabled.
    pub fn is_debug(&self) -> bool {
        self.debug_layer
    }

    /// Returns `true` if render targets can be created with `count` samples.
    pub fn supports_multisample(&self, count: u32) -> bool {
        count == 1
            || (count.is_power_of_two() && count <= self.feature_level.max_multisample_count())
    }
}

impl fmt::Debug for D3D11Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("D3D11Device")
            .field("feature_level", &self.feature_level)
            .field("debug_layer", &self.debug_layer)
            .field("native", &self.native)
            .finish()
    }
}
