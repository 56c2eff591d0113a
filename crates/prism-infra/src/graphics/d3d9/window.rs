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

//! Direct3D 9 windows.
//!
//! The back buffers of a window live in the default pool, so they are dropped
//! when the device is lost and reallocated after the reset. Resizing or
//! switching to fullscreen changes the presentation parameters, which takes a
//! full device reset.

use std::sync::{Arc, Mutex};

use prism_core::renderer::api::target::resolve_multisample_count;
use prism_core::renderer::{
    NativeHandle, NativeHandleKind, NativeObject, NativeResourceAllocator, RenderError,
    RenderWindowDesc, VideoMode, WindowSurface,
};
use prism_core::utils::sync;

use super::device_manager::{D3D9DeviceListener, D3D9DeviceManager};
use super::driver::D3D9Driver;
use crate::graphics::native::{NativeCall, NativeObjectKind};
use crate::graphics::surface::BackBuffers;

#[derive(Debug)]
struct PresentationBuffers {
    back_buffers: Mutex<Option<BackBuffers>>,
    size: Mutex<(u32, u32)>,
    allocator: Arc<dyn NativeResourceAllocator>,
    multisample_count: u32,
    depth_buffer: bool,
}

impl PresentationBuffers {
    fn allocate(&self) -> Result<BackBuffers, RenderError> {
        let (width, height) = *sync::lock(&self.size);
        BackBuffers::allocate(
            &self.allocator,
            width,
            height,
            self.multisample_count,
            self.depth_buffer,
        )
    }
}

impl D3D9DeviceListener for PresentationBuffers {
    fn on_device_lost(&self) {
        sync::lock(&self.back_buffers).take();
    }

    fn on_device_reset(&self) -> Result<(), RenderError> {
        let buffers = self.allocate()?;
        *sync::lock(&self.back_buffers) = Some(buffers);
        Ok(())
    }
}

/// The Direct3D 9 half of a render window.
#[derive(Debug)]
pub struct D3D9RenderWindow {
    buffers: Arc<PresentationBuffers>,
    window: NativeObject,
    manager: Arc<D3D9DeviceManager>,
}

impl D3D9RenderWindow {
    /// Creates the window and its back buffers, and registers it for device
    /// loss notifications.
    pub fn create(
        manager: &Arc<D3D9DeviceManager>,
        driver: &D3D9Driver,
        desc: &RenderWindowDesc,
    ) -> Result<Self, RenderError> {
        let device = manager.device();
        let allocator = device.allocator().clone();
        let multisample_count =
            resolve_multisample_count(desc.multisample_count, |c| driver.supports_multisample(c));
        if multisample_count != desc.multisample_count.max(1) {
            log::warn!(
                "{}x multisampling is not supported, falling back to {multisample_count}x",
                desc.multisample_count
            );
        }

        let window = NativeObject::new(device.native().create(NativeObjectKind::Window)?, &allocator);
        let buffers = Arc::new(PresentationBuffers {
            back_buffers: Mutex::new(None),
            size: Mutex::new((desc.video_mode.width, desc.video_mode.height)),
            allocator,
            multisample_count,
            depth_buffer: desc.depth_buffer,
        });
        if !device.is_lost() {
            buffers.on_device_reset()?;
        }

        let listener: Arc<dyn D3D9DeviceListener> = buffers.clone();
        manager.register(&listener);

        log::info!(
            "Created D3D9 window '{}' ({}x{}, msaa {multisample_count})",
            desc.title,
            desc.video_mode.width,
            desc.video_mode.height
        );
        Ok(Self {
            buffers,
            window,
            manager: manager.clone(),
        })
    }

    /// Returns `true` if the back buffers are currently allocated.
    pub fn has_back_buffers(&self) -> bool {
        sync::lock(&self.buffers.back_buffers).is_some()
    }
}

impl WindowSurface for D3D9RenderWindow {
    fn native_handle(&self, kind: NativeHandleKind) -> Option<NativeHandle> {
        let buffers = sync::lock(&self.buffers.back_buffers);
        match kind {
            NativeHandleKind::Window => Some(NativeHandle::Window(self.window.handle())),
            NativeHandleKind::D3DDevice => {
                Some(NativeHandle::D3DDevice(self.manager.device().handle()))
            }
            NativeHandleKind::BackBuffer => buffers
                .as_ref()
                .and_then(BackBuffers::color_view)
                .map(NativeHandle::BackBuffer),
            NativeHandleKind::DepthBuffer => buffers
                .as_ref()
                .and_then(BackBuffers::depth_view)
                .map(NativeHandle::DepthBuffer),
            _ => None,
        }
    }

    fn multisample_count(&self) -> u32 {
        self.buffers.multisample_count
    }

    fn resize(&self, width: u32, height: u32) -> Result<(), RenderError> {
        *sync::lock(&self.buffers.size) = (width, height);
        self.manager.reset_device()?;
        log::debug!("Resized D3D9 back buffers to {width}x{height}");
        Ok(())
    }

    fn set_fullscreen(&self, fullscreen: bool, mode: &VideoMode) -> Result<(), RenderError> {
        log::info!(
            "Switching D3D9 window to {} at {}x{}",
            if fullscreen { "fullscreen" } else { "windowed" },
            mode.width,
            mode.height
        );
        self.resize(mode.width, mode.height)
    }

    fn swap_buffers(&self, vsync: bool) -> Result<(), RenderError> {
        let device = self.manager.device();
        if device.is_lost() {
            log::debug!("Skipping present while the D3D9 device is lost");
            self.manager.notify_on_device_lost();
            return Ok(());
        }
        log::trace!("Present (vsync: {vsync})");
        device.native().record(NativeCall::Present {
            target: self.window.handle(),
        });
        Ok(())
    }
}
