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

//! Render targets: on-screen windows and off-screen render textures.
//!
//! Backends reach target-specific native objects through
//! [`RenderTarget::native_handle`], asking for a [`NativeHandleKind`] and
//! receiving a typed [`NativeHandle`]. A kind the target does not carry yields
//! `None` everywhere in the hierarchy.

use std::fmt;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::texture::{PixelFormat, Texture, TextureDesc, TextureUsage, TextureViewDesc};
use super::view::ViewLease;
use super::{GpuViewUsage, RawHandle};
use crate::renderer::error::RenderError;
use crate::renderer::traits::NativeResourceAllocator;
use crate::utils::{sync, IdGenerator};

static TARGET_IDS: IdGenerator = IdGenerator::new();

/// A display mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoMode {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Refresh rate in hertz.
    pub refresh_rate: f32,
}

impl VideoMode {
    /// A mode with the given size at 60 Hz.
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            refresh_rate: 60.0,
        }
    }
}

impl Default for VideoMode {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// Describes a window to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderWindowDesc {
    /// Window title.
    pub title: String,
    /// Size and refresh rate.
    pub video_mode: VideoMode,
    /// Whether the window covers the whole output.
    pub fullscreen: bool,
    /// Whether presentation waits for vertical sync.
    pub vsync: bool,
    /// Requested multisample count; the device may grant fewer.
    pub multisample_count: u32,
    /// Whether the back buffer is gamma corrected.
    pub gamma: bool,
    /// Whether a depth-stencil buffer is created with the window.
    pub depth_buffer: bool,
}

impl Default for RenderWindowDesc {
    fn default() -> Self {
        Self {
            title: "Prism".to_string(),
            video_mode: VideoMode::default(),
            fullscreen: false,
            vsync: false,
            multisample_count: 1,
            gamma: false,
            depth_buffer: true,
        }
    }
}

/// Read-only attributes of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetProperties {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bits per pixel of the color buffer.
    pub color_depth: u32,
    /// Update priority; higher renders first.
    pub priority: u8,
    /// Whether writes are gamma corrected.
    pub hw_gamma: bool,
    /// Whether presentation waits for vertical sync.
    pub vsync: bool,
    /// The granted multisample count.
    pub multisample_count: u32,
    /// Whether this target is a window.
    pub is_window: bool,
    /// Whether the window is fullscreen.
    pub is_fullscreen: bool,
}

/// The kinds of native objects a render target can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeHandleKind {
    /// The OS window.
    Window,
    /// Color render target views, one per attachment.
    RenderTargetViews,
    /// The writable depth-stencil view.
    DepthStencilView,
    /// A depth-stencil view that can be sampled while bound.
    ReadOnlyDepthStencilView,
    /// The OpenGL context.
    GlContext,
    /// The OpenGL framebuffer object.
    Framebuffer,
    /// The Direct3D 9 device the target renders with.
    D3DDevice,
    /// The Direct3D 9 depth surface.
    DepthBuffer,
    /// The back buffer surface.
    BackBuffer,
    /// The front buffer surface.
    FrontBuffer,
}

/// A native object exposed by a render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeHandle {
    /// The OS window.
    Window(RawHandle),
    /// Color render target views.
    RenderTargetViews(Vec<RawHandle>),
    /// Writable depth-stencil view.
    DepthStencilView(RawHandle),
    /// Read-only depth-stencil view.
    ReadOnlyDepthStencilView(RawHandle),
    /// OpenGL context.
    GlContext(RawHandle),
    /// OpenGL framebuffer object.
    Framebuffer(RawHandle),
    /// Direct3D 9 device.
    D3DDevice(RawHandle),
    /// Direct3D 9 depth surface.
    DepthBuffer(RawHandle),
    /// Back buffer surface.
    BackBuffer(RawHandle),
    /// Front buffer surface.
    FrontBuffer(RawHandle),
}

impl NativeHandle {
    /// The kind of this handle.
    pub fn kind(&self) -> NativeHandleKind {
        match self {
            NativeHandle::Window(_) => NativeHandleKind::Window,
            NativeHandle::RenderTargetViews(_) => NativeHandleKind::RenderTargetViews,
            NativeHandle::DepthStencilView(_) => NativeHandleKind::DepthStencilView,
            NativeHandle::ReadOnlyDepthStencilView(_) => NativeHandleKind::ReadOnlyDepthStencilView,
            NativeHandle::GlContext(_) => NativeHandleKind::GlContext,
            NativeHandle::Framebuffer(_) => NativeHandleKind::Framebuffer,
            NativeHandle::D3DDevice(_) => NativeHandleKind::D3DDevice,
            NativeHandle::DepthBuffer(_) => NativeHandleKind::DepthBuffer,
            NativeHandle::BackBuffer(_) => NativeHandleKind::BackBuffer,
            NativeHandle::FrontBuffer(_) => NativeHandleKind::FrontBuffer,
        }
    }

    /// The single handle carried by this value, or `None` for a view list.
    pub fn single(&self) -> Option<RawHandle> {
        match self {
            NativeHandle::RenderTargetViews(_) => None,
            NativeHandle::Window(h)
            | NativeHandle::DepthStencilView(h)
            | NativeHandle::ReadOnlyDepthStencilView(h)
            | NativeHandle::GlContext(h)
            | NativeHandle::Framebuffer(h)
            | NativeHandle::D3DDevice(h)
            | NativeHandle::DepthBuffer(h)
            | NativeHandle::BackBuffer(h)
            | NativeHandle::FrontBuffer(h) => Some(*h),
        }
    }
}

/// A surface draws can be directed at.
pub trait RenderTarget: fmt::Debug + Send + Sync {
    /// A process-unique id.
    fn id(&self) -> u32;

    /// Current attributes.
    fn properties(&self) -> RenderTargetProperties;

    /// Returns the native object of the given kind, if this target has one.
    fn native_handle(&self, kind: NativeHandleKind) -> Option<NativeHandle>;

    /// Returns `true` for off-screen render textures.
    fn is_texture(&self) -> bool;

    /// Presents the back buffer. A no-op for render textures.
    fn swap_buffers(&self) -> Result<(), RenderError> {
        Ok(())
    }
}

/// The backend-specific half of a [`RenderWindow`]: the native window,
/// its swap chain and back-buffer views.
pub trait WindowSurface: fmt::Debug + Send + Sync {
    /// Returns the native object of the given kind, if the surface has one.
    fn native_handle(&self, kind: NativeHandleKind) -> Option<NativeHandle>;

    /// The multisample count the device granted.
    fn multisample_count(&self) -> u32;

    /// Resizes the swap chain, recreating size-dependent views.
    fn resize(&self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Switches between windowed and fullscreen presentation.
    fn set_fullscreen(&self, fullscreen: bool, mode: &VideoMode) -> Result<(), RenderError>;

    /// Presents the back buffer.
    fn swap_buffers(&self, vsync: bool) -> Result<(), RenderError>;
}

/// An on-screen render target.
pub struct RenderWindow {
    id: u32,
    desc: RwLock<RenderWindowDesc>,
    surface: Box<dyn WindowSurface>,
}

impl RenderWindow {
    /// Wraps a backend surface created for `desc`.
    pub fn new(desc: RenderWindowDesc, surface: Box<dyn WindowSurface>) -> Self {
        Self {
            id: TARGET_IDS.next_id(),
            desc: RwLock::new(desc),
            surface,
        }
    }

    /// The current window description.
    pub fn desc(&self) -> RenderWindowDesc {
        sync::read(&self.desc).clone()
    }

    /// The backend surface.
    pub fn surface(&self) -> &dyn WindowSurface {
        self.surface.as_ref()
    }

    /// Resizes the window and its back buffers.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidParameters(format!(
                "Cannot resize window {} to {width}x{height}",
                self.id
            )));
        }
        self.surface.resize(width, height)?;
        let mut desc = sync::write(&self.desc);
        desc.video_mode.width = width;
        desc.video_mode.height = height;
        Ok(())
    }

    /// Switches between windowed and fullscreen.
    pub fn set_fullscreen(&self, fullscreen: bool) -> Result<(), RenderError> {
        let mode = sync::read(&self.desc).video_mode;
        self.surface.set_fullscreen(fullscreen, &mode)?;
        sync::write(&self.desc).fullscreen = fullscreen;
        Ok(())
    }
}

impl RenderTarget for RenderWindow {
    fn id(&self) -> u32 {
        self.id
    }

    fn properties(&self) -> RenderTargetProperties {
        let desc = sync::read(&self.desc);
        RenderTargetProperties {
            width: desc.video_mode.width,
            height: desc.video_mode.height,
            color_depth: 32,
            priority: 1,
            hw_gamma: desc.gamma,
            vsync: desc.vsync,
            multisample_count: self.surface.multisample_count(),
            is_window: true,
            is_fullscreen: desc.fullscreen,
        }
    }

    fn native_handle(&self, kind: NativeHandleKind) -> Option<NativeHandle> {
        self.surface.native_handle(kind)
    }

    fn is_texture(&self) -> bool {
        false
    }

    fn swap_buffers(&self) -> Result<(), RenderError> {
        let vsync = sync::read(&self.desc).vsync;
        self.surface.swap_buffers(vsync)
    }
}

impl fmt::Debug for RenderWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderWindow")
            .field("id", &self.id)
            .field("desc", &*sync::read(&self.desc))
            .field("surface", &self.surface)
            .finish()
    }
}

/// Describes a [`RenderTexture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTextureDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// One format per color attachment.
    pub color_formats: Vec<PixelFormat>,
    /// Format of the depth-stencil attachment, if any.
    pub depth_stencil_format: Option<PixelFormat>,
    /// Multisample count, 1 for none.
    pub multisample_count: u32,
}

impl Default for RenderTextureDesc {
    fn default() -> Self {
        Self {
            width: 256,
            height: 256,
            color_formats: vec![PixelFormat::R8G8B8A8Unorm],
            depth_stencil_format: Some(PixelFormat::D24S8),
            multisample_count: 1,
        }
    }
}

#[derive(Debug)]
struct Attachment {
    view: ViewLease<TextureViewDesc>,
    texture: Arc<Texture>,
}

impl Attachment {
    fn new(
        desc: TextureDesc,
        view_usage: GpuViewUsage,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        let texture = Arc::new(Texture::new(desc, allocator)?);
        let view = texture.lease_view(texture.full_view_desc(view_usage))?;
        Ok(Self { view, texture })
    }

    fn view_handle(&self) -> Option<RawHandle> {
        self.view.native_handle()
    }
}

/// An off-screen render target backed by textures.
#[derive(Debug)]
pub struct RenderTexture {
    id: u32,
    desc: RenderTextureDesc,
    color: Vec<Attachment>,
    depth: Option<Attachment>,
    read_only_depth: Option<ViewLease<TextureViewDesc>>,
}

impl RenderTexture {
    /// Allocates the attachments described by `desc`.
    ///
    /// Fails if there are more color attachments than `max_render_targets`,
    /// or no attachment at all.
    pub fn new(
        desc: RenderTextureDesc,
        max_render_targets: u32,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        if desc.color_formats.len() > max_render_targets as usize {
            return Err(RenderError::InvalidParameters(format!(
                "{} color attachments requested, device supports {max_render_targets}",
                desc.color_formats.len()
            )));
        }
        if desc.color_formats.is_empty() && desc.depth_stencil_format.is_none() {
            return Err(RenderError::InvalidParameters(
                "A render texture needs at least one attachment".to_string(),
            ));
        }

        let base = TextureDesc {
            width: desc.width,
            height: desc.height,
            multisample_count: desc.multisample_count,
            ..TextureDesc::default()
        };

        let color = desc
            .color_formats
            .iter()
            .map(|&format| {
                Attachment::new(
                    TextureDesc {
                        format,
                        usage: TextureUsage::DEFAULT | TextureUsage::RENDER_TARGET,
                        ..base
                    },
                    GpuViewUsage::RENDER_TARGET,
                    allocator,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (depth, read_only_depth) = match desc.depth_stencil_format {
            Some(format) => {
                let attachment = Attachment::new(
                    TextureDesc {
                        format,
                        usage: TextureUsage::DEFAULT | TextureUsage::DEPTH_STENCIL,
                        ..base
                    },
                    GpuViewUsage::DEPTH_STENCIL,
                    allocator,
                )?;
                let read_only = attachment.texture.lease_view(
                    attachment
                        .texture
                        .full_view_desc(GpuViewUsage::DEPTH_STENCIL | GpuViewUsage::DEFAULT),
                )?;
                (Some(attachment), Some(read_only))
            }
            None => (None, None),
        };

        Ok(Self {
            id: TARGET_IDS.next_id(),
            desc,
            color,
            depth,
            read_only_depth,
        })
    }

    /// The creation descriptor.
    pub fn desc(&self) -> &RenderTextureDesc {
        &self.desc
    }

    /// The color texture at `index`.
    pub fn color_texture(&self, index: usize) -> Option<&Arc<Texture>> {
        self.color.get(index).map(|a| &a.texture)
    }

    /// The depth-stencil texture.
    pub fn depth_stencil_texture(&self) -> Option<&Arc<Texture>> {
        self.depth.as_ref().map(|a| &a.texture)
    }
}

impl RenderTarget for RenderTexture {
    fn id(&self) -> u32 {
        self.id
    }

    fn properties(&self) -> RenderTargetProperties {
        RenderTargetProperties {
            width: self.desc.width,
            height: self.desc.height,
            color_depth: self
                .desc
                .color_formats
                .first()
                .map_or(0, |f| f.bytes_per_pixel() * 8),
            priority: 2,
            hw_gamma: false,
            vsync: false,
            multisample_count: self.desc.multisample_count.max(1),
            is_window: false,
            is_fullscreen: false,
        }
    }

    fn native_handle(&self, kind: NativeHandleKind) -> Option<NativeHandle> {
        match kind {
            NativeHandleKind::RenderTargetViews => Some(NativeHandle::RenderTargetViews(
                self.color.iter().filter_map(Attachment::view_handle).collect(),
            )),
            NativeHandleKind::DepthStencilView => self
                .depth
                .as_ref()
                .and_then(Attachment::view_handle)
                .map(NativeHandle::DepthStencilView),
            NativeHandleKind::ReadOnlyDepthStencilView => self
                .read_only_depth
                .as_ref()
                .and_then(|v| v.native_handle())
                .map(NativeHandle::ReadOnlyDepthStencilView),
            _ => None,
        }
    }

    fn is_texture(&self) -> bool {
        true
    }
}

/// Picks the highest multisample count not above `requested` that the
/// device supports, falling back to 1.
pub fn resolve_multisample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    let mut count = requested.max(1);
    while count > 1 && !supported(count) {
        count -= 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::testing::RecordingAllocator;

    #[test]
    fn test_multisample_fallback() {
        assert_eq!(resolve_multisample_count(8, |c| c == 4 || c == 1), 4);
        assert_eq!(resolve_multisample_count(8, |_| false), 1);
        assert_eq!(resolve_multisample_count(0, |_| true), 1);
    }

    #[test]
    fn test_render_texture_exposes_typed_views() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let target = RenderTexture::new(
            RenderTextureDesc {
                color_formats: vec![PixelFormat::R8G8B8A8Unorm, PixelFormat::R16G16B16A16Float],
                ..RenderTextureDesc::default()
            },
            8,
            &allocator,
        )
        .expect("render texture");

        assert!(target.is_texture());
        match target.native_handle(NativeHandleKind::RenderTargetViews) {
            Some(NativeHandle::RenderTargetViews(views)) => assert_eq!(views.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
        let dsv = target.native_handle(NativeHandleKind::DepthStencilView);
        let ro = target.native_handle(NativeHandleKind::ReadOnlyDepthStencilView);
        assert!(dsv.is_some() && ro.is_some());
        assert_ne!(dsv.and_then(|h| h.single()), ro.and_then(|h| h.single()));
    }

    #[test]
    fn test_unknown_kind_returns_none() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let target = RenderTexture::new(RenderTextureDesc::default(), 8, &allocator)
            .expect("render texture");
        assert_eq!(target.native_handle(NativeHandleKind::GlContext), None);
        assert_eq!(target.native_handle(NativeHandleKind::Window), None);
    }

    #[test]
    fn test_render_texture_respects_mrt_limit() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let desc = RenderTextureDesc {
            color_formats: vec![PixelFormat::R8G8B8A8Unorm; 3],
            ..RenderTextureDesc::default()
        };
        assert!(matches!(
            RenderTexture::new(desc, 2, &allocator),
            Err(RenderError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_window_desc_defaults_fill_missing_fields() {
        let desc: RenderWindowDesc =
            serde_json::from_str(r#"{ "video_mode": { "width": 800, "height": 600 } }"#)
                .expect("parse");
        assert_eq!(desc.video_mode.width, 800);
        assert_eq!(desc.video_mode.refresh_rate, 60.0);
        assert!(desc.depth_buffer);
    }
}
