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

//! The Direct3D 9 device and its lost/reset cycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use prism_core::renderer::{NativeObject, NativeResourceAllocator, RawHandle, RenderError};

use super::driver::D3D9Driver;
use crate::graphics::native::{as_allocator, NativeCall, NativeDevice, NativeObjectKind};

/// Wraps the native device.
///
/// The device starts operational. Once lost, every call that would touch
/// video memory is skipped until [`D3D9Device::reset`] succeeds; each reset
/// starts a new generation so that cached device state can be invalidated.
pub struct D3D9Device {
    device: NativeObject,
    native: Arc<NativeDevice>,
    allocator: Arc<dyn NativeResourceAllocator>,
    lost: AtomicBool,
    generation: AtomicU64,
}

impl D3D9Device {
    /// Creates a device on `driver` through `native`.
    pub fn create_on(native: Arc<NativeDevice>, driver: &D3D9Driver) -> Result<Self, RenderError> {
        let allocator = as_allocator(&native);
        let device = NativeObject::new(
            native.create(NativeObjectKind::Device).map_err(|e| {
                RenderError::rendering_api(super::NAME, format!("CreateDevice failed: {e}"))
            })?,
            &allocator,
        );
        log::info!(
            "Created D3D9 device on '{}' (shader model {})",
            driver.description,
            driver.shader_model
        );
        Ok(Self {
            device,
            native,
            allocator,
            lost: AtomicBool::new(false),
            generation: AtomicU64::new(0),
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

    /// The device handle.
    pub fn handle(&self) -> RawHandle {
        self.device.handle()
    }

    /// Returns `true` while the device is lost.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Incremented by every successful reset.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Marks the device lost, as the runtime does when the adapter is taken away.
    pub fn simulate_device_lost(&self) {
        if !self.lost.swap(true, Ordering::AcqRel) {
            log::warn!("D3D9 device lost");
        }
    }

    /// Resets the device. Resources in the default pool must have been
    /// released before and are recreated by the caller afterwards.
    pub fn reset(&self) {
        self.native.record(NativeCall::Reset);
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.lost.store(false, Ordering::Release);
        log::info!("D3D9 device reset (generation {})", self.generation());
    }
}

impl fmt::Debug for D3D9Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("D3D9Device")
            .field("handle", &self.device)
            .field("lost", &self.is_lost())
            .field("generation", &self.generation())
            .finish()
    }
}
