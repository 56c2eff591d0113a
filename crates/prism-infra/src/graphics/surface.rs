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

//! Back-buffer storage shared by the window surfaces of every backend.

use std::sync::Arc;

use prism_core::renderer::{
    GpuViewUsage, NativeResourceAllocator, PixelFormat, RawHandle, RenderError, Texture,
    TextureDesc, TextureUsage, TextureViewDesc, ViewLease,
};

#[derive(Debug)]
struct DepthAttachment {
    view: ViewLease<TextureViewDesc>,
    read_only_view: ViewLease<TextureViewDesc>,
    texture: Arc<Texture>,
}

/// The color and optional depth-stencil buffers a window renders into.
///
/// Views are leased from the textures, so dropping the back buffers releases
/// every view exactly once before the textures go away.
#[derive(Debug)]
pub struct BackBuffers {
    color_view: ViewLease<TextureViewDesc>,
    color: Arc<Texture>,
    depth: Option<DepthAttachment>,
    width: u32,
    height: u32,
    multisample_count: u32,
}

impl BackBuffers {
    /// Allocates back buffers of the given size.
    pub fn allocate(
        allocator: &Arc<dyn NativeResourceAllocator>,
        width: u32,
        height: u32,
        multisample_count: u32,
        with_depth: bool,
    ) -> Result<Self, RenderError> {
        let base = TextureDesc {
            width,
            height,
            multisample_count,
            ..TextureDesc::default()
        };

        let color = Arc::new(Texture::new(
            TextureDesc {
                format: PixelFormat::B8G8R8A8Unorm,
                usage: TextureUsage::RENDER_TARGET,
                ..base
            },
            allocator,
        )?);
        let color_view = color.lease_view(color.full_view_desc(GpuViewUsage::RENDER_TARGET))?;

        let depth = if with_depth {
            let texture = Arc::new(Texture::new(
                TextureDesc {
                    format: PixelFormat::D24S8,
                    usage: TextureUsage::DEFAULT | TextureUsage::DEPTH_STENCIL,
                    ..base
                },
                allocator,
            )?);
            let view = texture.lease_view(texture.full_view_desc(GpuViewUsage::DEPTH_STENCIL))?;
            let read_only_view = texture.lease_view(
                texture.full_view_desc(GpuViewUsage::DEPTH_STENCIL | GpuViewUsage::DEFAULT),
            )?;
            Some(DepthAttachment {
                view,
                read_only_view,
                texture,
            })
        } else {
            None
        };

        log::debug!(
            "{}: allocated {width}x{height} back buffers (msaa {multisample_count}, depth {with_depth})",
            allocator.backend_name()
        );

        Ok(Self {
            color_view,
            color,
            depth,
            width,
            height,
            multisample_count,
        })
    }

    /// The color texture.
    pub fn color_texture(&self) -> &Arc<Texture> {
        &self.color
    }

    /// The depth-stencil texture, if allocated.
    pub fn depth_texture(&self) -> Option<&Arc<Texture>> {
        self.depth.as_ref().map(|d| &d.texture)
    }

    /// The render target view over the color buffer.
    pub fn color_view(&self) -> Option<RawHandle> {
        self.color_view.native_handle()
    }

    /// The writable depth-stencil view.
    pub fn depth_view(&self) -> Option<RawHandle> {
        self.depth.as_ref().and_then(|d| d.view.native_handle())
    }

    /// The read-only depth-stencil view.
    pub fn read_only_depth_view(&self) -> Option<RawHandle> {
        self.depth.as_ref().and_then(|d| d.read_only_view.native_handle())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The granted sample count.
    pub fn multisample_count(&self) -> u32 {
        self.multisample_count
    }

    /// Returns `true` if a depth-stencil buffer was allocated.
    pub fn has_depth(&self) -> bool {
        self.depth.is_some()
    }
}
