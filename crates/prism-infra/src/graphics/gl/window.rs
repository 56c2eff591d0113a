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

//! OpenGL windows: an OS window with its own context and default framebuffer.

use std::sync::{Arc, Mutex};

use prism_core::renderer::api::target::resolve_multisample_count;
use prism_core::renderer::{
    NativeHandle, NativeHandleKind, NativeObject, NativeResourceAllocator, RawHandle,
    RenderError, RenderWindowDesc, VideoMode, WindowSurface,
};
use prism_core::utils::sync;

use super::context::{GlContext, GlDriver};
use crate::graphics::native::{NativeCall, NativeDevice, NativeObjectKind};
use crate::graphics::surface::BackBuffers;

/// The OpenGL half of a render window.
///
/// The default framebuffer has no framebuffer object, so
/// [`NativeHandleKind::Framebuffer`] is `None` for windows.
#[derive(Debug)]
pub struct GlRenderWindow {
    back_buffers: Mutex<Option<BackBuffers>>,
    context: GlContext,
    window: NativeObject,
    native: Arc<NativeDevice>,
    allocator: Arc<dyn NativeResourceAllocator>,
    multisample_count: u32,
    depth_buffer: bool,
}

impl GlRenderWindow {
    /// Creates the window, its context and default framebuffer.
    pub fn create(
        native: &Arc<NativeDevice>,
        allocator: &Arc<dyn NativeResourceAllocator>,
        driver: &GlDriver,
        desc: &RenderWindowDesc,
    ) -> Result<Self, RenderError> {
        let multisample_count =
            resolve_multisample_count(desc.multisample_count, |c| driver.supports_multisample(c));
        if multisample_count != desc.multisample_count.max(1) {
            log::warn!(
                "{}x multisampling is not supported, falling back to {multisample_count}x",
                desc.multisample_count
            );
        }

        let window = NativeObject::new(native.create(NativeObjectKind::Window)?, allocator);
        let context = GlContext::create(native, allocator)?;
        let back_buffers = BackBuffers::allocate(
            allocator,
            desc.video_mode.width,
            desc.video_mode.height,
            multisample_count,
            desc.depth_buffer,
        )?;

        log::info!(
            "Created GL window '{}' ({}x{}, msaa {multisample_count})",
            desc.title,
            desc.video_mode.width,
            desc.video_mode.height
        );

        Ok(Self {
            back_buffers: Mutex::new(Some(back_buffers)),
            context,
            window,
            native: native.clone(),
            allocator: allocator.clone(),
            multisample_count,
            depth_buffer: desc.depth_buffer,
        })
    }

    /// The context handle.
    pub fn context(&self) -> RawHandle {
        self.context.handle()
    }
}

impl WindowSurface for GlRenderWindow {
    fn native_handle(&self, kind: NativeHandleKind) -> Option<NativeHandle> {
        match kind {
            NativeHandleKind::Window => Some(NativeHandle::Window(self.window.handle())),
            NativeHandleKind::GlContext => Some(NativeHandle::GlContext(self.context.handle())),
            _ => None,
        }
    }

    fn multisample_count(&self) -> u32 {
        self.multisample_count
    }

    fn resize(&self, width: u32, height: u32) -> Result<(), RenderError> {
        let mut buffers = sync::lock(&self.back_buffers);
        buffers.take();
        *buffers = Some(BackBuffers::allocate(
            &self.allocator,
            width,
            height,
            self.multisample_count,
            self.depth_buffer,
        )?);
        log::debug!("Resized GL default framebuffer to {width}x{height}");
        Ok(())
    }

    fn set_fullscreen(&self, fullscreen: bool, mode: &VideoMode) -> Result<(), RenderError> {
        log::info!(
            "Switching GL window to {} at {}x{}",
            if fullscreen { "fullscreen" } else { "windowed" },
            mode.width,
            mode.height
        );
        self.resize(mode.width, mode.height)
    }

    fn swap_buffers(&self, vsync: bool) -> Result<(), RenderError> {
        log::trace!("SwapBuffers (vsync: {vsync})");
        self.native.record(NativeCall::Present {
            target: self.window.handle(),
        });
        Ok(())
    }
}
