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

//! Direct3D 11 windows: an OS window, its swap chain and back-buffer views.

use std::sync::{Arc, Mutex};

use prism_core::renderer::api::target::resolve_multisample_count;
use prism_core::renderer::{
    NativeHandle, NativeHandleKind, NativeObject, NativeResourceAllocator, RawHandle,
    RenderError, RenderWindowDesc, VideoMode, WindowSurface,
};
use prism_core::utils::sync;

use super::device::D3D11Device;
use crate::graphics::native::{NativeCall, NativeDevice, NativeObjectKind};
use crate::graphics::surface::BackBuffers;

/// The Direct3D 11 half of a render window.
#[derive(Debug)]
pub struct D3D11RenderWindow {
    back_buffers: Mutex<Option<BackBuffers>>,
    swap_chain: NativeObject,
    window: NativeObject,
    native: Arc<NativeDevice>,
    allocator: Arc<dyn NativeResourceAllocator>,
    multisample_count: u32,
    depth_buffer: bool,
}

impl D3D11RenderWindow {
    /// Creates the window, its swap chain and back buffers.
    pub fn create(device: &D3D11Device, desc: &RenderWindowDesc) -> Result<Self, RenderError> {
        let native = device.native().clone();
        let allocator = device.allocator().clone();
        let multisample_count =
            resolve_multisample_count(desc.multisample_count, |c| device.supports_multisample(c));
        if multisample_count != desc.multisample_count.max(1) {
            log::warn!(
                "{}x multisampling is not supported, falling back to {multisample_count}x",
                desc.multisample_count
            );
        }

        let window = NativeObject::new(native.create(NativeObjectKind::Window)?, &allocator);
        let swap_chain = NativeObject::new(
            native.create(NativeObjectKind::SwapChain).map_err(|e| {
                RenderError::rendering_api(super::NAME, format!("Unable to create swap chain: {e}"))
            })?,
            &allocator,
        );
        let back_buffers = BackBuffers::allocate(
            &allocator,
            desc.video_mode.width,
            desc.video_mode.height,
            multisample_count,
            desc.depth_buffer,
        )?;

        log::info!(
            "Created D3D11 window '{}' ({}x{}, msaa {multisample_count})",
            desc.title,
            desc.video_mode.width,
            desc.video_mode.height
        );

        Ok(Self {
            back_buffers: Mutex::new(Some(back_buffers)),
            swap_chain,
            window,
            native,
            allocator,
            multisample_count,
            depth_buffer: desc.depth_buffer,
        })
    }

    /// The swap chain handle.
    pub fn swap_chain(&self) -> RawHandle {
        self.swap_chain.handle()
    }
}

impl WindowSurface for D3D11RenderWindow {
    fn native_handle(&self, kind: NativeHandleKind) -> Option<NativeHandle> {
        let buffers = sync::lock(&self.back_buffers);
        match kind {
            NativeHandleKind::Window => Some(NativeHandle::Window(self.window.handle())),
            NativeHandleKind::RenderTargetViews => buffers
                .as_ref()
                .and_then(BackBuffers::color_view)
                .map(|view| NativeHandle::RenderTargetViews(vec![view])),
            NativeHandleKind::DepthStencilView => buffers
                .as_ref()
                .and_then(BackBuffers::depth_view)
                .map(NativeHandle::DepthStencilView),
            NativeHandleKind::ReadOnlyDepthStencilView => buffers
                .as_ref()
                .and_then(BackBuffers::read_only_depth_view)
                .map(NativeHandle::ReadOnlyDepthStencilView),
            _ => None,
        }
    }

    fn multisample_count(&self) -> u32 {
        self.multisample_count
    }

    fn resize(&self, width: u32, height: u32) -> Result<(), RenderError> {
        let mut buffers = sync::lock(&self.back_buffers);
        // The swap chain cannot resize while views over its buffers are alive.
        buffers.take();
        *buffers = Some(BackBuffers::allocate(
            &self.allocator,
            width,
            height,
            self.multisample_count,
            self.depth_buffer,
        )?);
        log::debug!("Resized D3D11 swap chain to {width}x{height}");
        Ok(())
    }

    fn set_fullscreen(&self, fullscreen: bool, mode: &VideoMode) -> Result<(), RenderError> {
        log::info!(
            "Switching D3D11 window to {} at {}x{}",
            if fullscreen { "fullscreen" } else { "windowed" },
            mode.width,
            mode.height
        );
        self.resize(mode.width, mode.height)
    }

    fn swap_buffers(&self, vsync: bool) -> Result<(), RenderError> {
        log::trace!("Present (vsync: {vsync})");
        self.native.record(NativeCall::Present {
            target: self.swap_chain.handle(),
        });
        Ok(())
    }
}
