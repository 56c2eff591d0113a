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

//! Textures and texture views.

use std::fmt;
use std::sync::{Arc, Mutex};

use super::view::{ResourceView, ViewCache, ViewLease};
use super::{GpuViewUsage, NativeObject, RawHandle};
use crate::prism_bitflags;
use crate::renderer::error::RenderError;
use crate::renderer::traits::NativeResourceAllocator;
use crate::utils::{sync, IdGenerator};

static TEXTURE_IDS: IdGenerator = IdGenerator::new();

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    /// A 2D texture.
    #[default]
    Tex2D,
    /// A volume texture.
    Tex3D,
    /// A cube map with six faces.
    Cube,
}

/// Pixel formats supported by render targets and sampled textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 8-bit RGBA, normalized.
    #[default]
    R8G8B8A8Unorm,
    /// 8-bit BGRA, normalized. The usual swap chain format.
    B8G8R8A8Unorm,
    /// 16-bit float RGBA.
    R16G16B16A16Float,
    /// 32-bit float RGBA.
    R32G32B32A32Float,
    /// 32-bit float single channel.
    R32Float,
    /// 24-bit depth, 8-bit stencil.
    D24S8,
    /// 32-bit float depth.
    D32,
    /// 32-bit float depth, 8-bit stencil.
    D32S8X24,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::R8G8B8A8Unorm
            | PixelFormat::B8G8R8A8Unorm
            | PixelFormat::R32Float
            | PixelFormat::D24S8
            | PixelFormat::D32 => 4,
            PixelFormat::R16G16B16A16Float | PixelFormat::D32S8X24 => 8,
            PixelFormat::R32G32B32A32Float => 16,
        }
    }

    /// Returns `true` for depth and depth-stencil formats.
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            PixelFormat::D24S8 | PixelFormat::D32 | PixelFormat::D32S8X24
        )
    }

    /// Returns `true` if the format carries stencil bits.
    pub const fn has_stencil(self) -> bool {
        matches!(self, PixelFormat::D24S8 | PixelFormat::D32S8X24)
    }
}

prism_bitflags! {
    /// How a texture is going to be used.
    pub struct TextureUsage: u8 {
        /// Sampled in shaders.
        const DEFAULT = 1 << 0;
        /// Rendered into as a color target.
        const RENDER_TARGET = 1 << 1;
        /// Rendered into as a depth-stencil target.
        const DEPTH_STENCIL = 1 << 2;
        /// Bound as a load/store (random write) texture.
        const LOAD_STORE = 1 << 3;
        /// Updated from the CPU frequently.
        const DYNAMIC = 1 << 4;
    }
}

/// Describes a [`Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    /// Dimensionality.
    pub ty: TextureType,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels, 1 for non-volume textures.
    pub depth: u32,
    /// Number of mip levels beyond the base level.
    pub num_mips: u32,
    /// Number of array slices (faces for cube maps).
    pub num_array_slices: u32,
    /// Pixel format.
    pub format: PixelFormat,
    /// Usage flags.
    pub usage: TextureUsage,
    /// Multisample count, 0 or 1 meaning none.
    pub multisample_count: u32,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            ty: TextureType::Tex2D,
            width: 1,
            height: 1,
            depth: 1,
            num_mips: 0,
            num_array_slices: 1,
            format: PixelFormat::R8G8B8A8Unorm,
            usage: TextureUsage::DEFAULT,
            multisample_count: 0,
        }
    }
}

impl TextureDesc {
    /// Number of faces per array slice.
    pub fn faces(&self) -> u32 {
        let slices = self.num_array_slices.max(1);
        match self.ty {
            TextureType::Cube => slices * 6,
            _ => slices,
        }
    }

    /// The largest `num_mips` the extents allow: mips are halved down to 1x1x1.
    pub fn max_num_mips(&self) -> u32 {
        self.width.max(self.height).max(self.depth).max(1).ilog2()
    }

    /// Total number of subresources (mip levels times faces).
    pub fn subresource_count(&self) -> u32 {
        (self.num_mips + 1) * self.faces()
    }

    /// Size in bytes of the given mip level for one face.
    pub fn mip_size_bytes(&self, mip: u32) -> u64 {
        let w = (self.width >> mip).max(1) as u64;
        let h = (self.height >> mip).max(1) as u64;
        let d = (self.depth >> mip).max(1) as u64;
        w * h * d * self.format.bytes_per_pixel() as u64
    }
}

/// Describes a view over a range of mips and array slices. Also the view cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewDesc {
    /// Most detailed mip level in the view.
    pub most_detailed_mip: u32,
    /// Number of mip levels.
    pub num_mips: u32,
    /// First array slice.
    pub first_array_slice: u32,
    /// Number of array slices.
    pub num_array_slices: u32,
    /// How the view is bound.
    pub usage: GpuViewUsage,
}

/// A view over a [`Texture`].
pub type TextureView = ResourceView<TextureViewDesc>;

/// A texture with a CPU-visible shadow of every subresource.
pub struct Texture {
    id: u32,
    desc: TextureDesc,
    native: NativeObject,
    allocator: Arc<dyn NativeResourceAllocator>,
    views: Arc<ViewCache<TextureViewDesc>>,
    subresources: Mutex<Vec<Vec<u8>>>,
}

impl Texture {
    /// Allocates a texture through `allocator`.
    pub fn new(
        desc: TextureDesc,
        allocator: &Arc<dyn NativeResourceAllocator>,
    ) -> Result<Self, RenderError> {
        if desc.width == 0 || desc.height == 0 || desc.depth == 0 {
            return Err(RenderError::InvalidParameters(format!(
                "Texture must have non-zero extents, got {}x{}x{}",
                desc.width, desc.height, desc.depth
            )));
        }
        if desc.format.is_depth() && desc.usage.contains(TextureUsage::RENDER_TARGET) {
            return Err(RenderError::InvalidParameters(format!(
                "Depth format {:?} cannot be used as a color render target",
                desc.format
            )));
        }
        if desc.num_mips > desc.max_num_mips() {
            return Err(RenderError::InvalidParameters(format!(
                "Texture of {}x{}x{} supports at most {} mips below the base level, got {}",
                desc.width,
                desc.height,
                desc.depth,
                desc.max_num_mips(),
                desc.num_mips
            )));
        }
        let face_multiplier = if desc.ty == TextureType::Cube { 6 } else { 1 };
        let subresources_fit = desc
            .num_array_slices
            .max(1)
            .checked_mul(face_multiplier)
            .and_then(|faces| faces.checked_mul(desc.num_mips + 1))
            .is_some();
        if !subresources_fit {
            return Err(RenderError::InvalidParameters(format!(
                "Texture with {} array slices has too many subresources",
                desc.num_array_slices
            )));
        }
        let handle = allocator.create_texture(&desc)?;
        let id = TEXTURE_IDS.next_id();
        let faces = desc.faces();
        let subresources = (0..desc.subresource_count())
            .map(|i| vec![0; desc.mip_size_bytes(i / faces) as usize])
            .collect();
        Ok(Self {
            id,
            desc,
            native: NativeObject::new(handle, allocator),
            allocator: allocator.clone(),
            views: Arc::new(ViewCache::new(id)),
            subresources: Mutex::new(subresources),
        })
    }

    /// A process-unique id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The creation descriptor.
    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    /// The native texture handle.
    pub fn native_handle(&self) -> RawHandle {
        self.native.handle()
    }

    /// A view covering every mip and slice, bound with `usage`.
    pub fn full_view_desc(&self, usage: GpuViewUsage) -> TextureViewDesc {
        TextureViewDesc {
            most_detailed_mip: 0,
            num_mips: self.desc.num_mips + 1,
            first_array_slice: 0,
            num_array_slices: self.desc.faces(),
            usage,
        }
    }

    /// Returns the shared view for `desc`, creating it on first request.
    pub fn request_view(&self, desc: TextureViewDesc) -> Result<Arc<TextureView>, RenderError> {
        self.validate_view(&desc)?;
        self.views.request(desc, |key| self.create_native_view(key))
    }

    /// Like [`Texture::request_view`], but released when the lease drops.
    pub fn lease_view(
        &self,
        desc: TextureViewDesc,
    ) -> Result<ViewLease<TextureViewDesc>, RenderError> {
        self.validate_view(&desc)?;
        ViewLease::acquire(&self.views, desc, |key| self.create_native_view(key))
    }

    /// Releases one reference obtained from [`Texture::request_view`].
    pub fn release_view(&self, view: &TextureView) -> Result<(), RenderError> {
        self.views.release(view)
    }

    /// Destroys every view of this texture regardless of outstanding references.
    pub fn clear_views(&self) {
        self.views.clear();
    }

    /// The number of live views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Replaces the contents of a subresource.
    pub fn write_subresource(&self, index: u32, bytes: &[u8]) -> Result<(), RenderError> {
        let mut subresources = sync::lock(&self.subresources);
        let target = subresources.get_mut(index as usize).ok_or_else(|| {
            RenderError::InvalidParameters(format!(
                "Subresource {index} out of range for texture {}",
                self.id
            ))
        })?;
        if bytes.len() != target.len() {
            return Err(RenderError::InvalidParameters(format!(
                "Subresource {index} of texture {} holds {} bytes, got {}",
                self.id,
                target.len(),
                bytes.len()
            )));
        }
        target.copy_from_slice(bytes);
        Ok(())
    }

    /// Returns a copy of a subresource.
    pub fn read_subresource(&self, index: u32) -> Result<Vec<u8>, RenderError> {
        sync::lock(&self.subresources)
            .get(index as usize)
            .cloned()
            .ok_or_else(|| {
                RenderError::InvalidParameters(format!(
                    "Subresource {index} out of range for texture {}",
                    self.id
                ))
            })
    }

    fn validate_view(&self, desc: &TextureViewDesc) -> Result<(), RenderError> {
        let mips_ok = desc.num_mips > 0
            && desc
                .most_detailed_mip
                .checked_add(desc.num_mips)
                .is_some_and(|end| end <= self.desc.num_mips + 1);
        let slices_ok = desc.num_array_slices > 0
            && desc
                .first_array_slice
                .checked_add(desc.num_array_slices)
                .is_some_and(|end| end <= self.desc.faces());
        if !mips_ok || !slices_ok {
            return Err(RenderError::InvalidParameters(format!(
                "View {desc:?} is outside texture {} ({} mips, {} faces)",
                self.id,
                self.desc.num_mips + 1,
                self.desc.faces()
            )));
        }
        let required = if desc.usage.contains(GpuViewUsage::RENDER_TARGET) {
            Some(TextureUsage::RENDER_TARGET)
        } else if desc.usage.contains(GpuViewUsage::DEPTH_STENCIL) {
            Some(TextureUsage::DEPTH_STENCIL)
        } else if desc.usage.contains(GpuViewUsage::RANDOM_WRITE) {
            Some(TextureUsage::LOAD_STORE)
        } else {
            None
        };
        match required {
            Some(flag) if !self.desc.usage.contains(flag) => Err(RenderError::InvalidParameters(
                format!("Texture {} was not created with {flag:?}", self.id),
            )),
            _ => Ok(()),
        }
    }

    fn create_native_view(&self, key: &TextureViewDesc) -> Result<NativeObject, RenderError> {
        let handle =
            self.allocator
                .create_texture_view(self.native.handle(), &self.desc, key)?;
        Ok(NativeObject::new(handle, &self.allocator))
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.views.clear();
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .field("native", &self.native)
            .field("views", &self.views.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::testing::RecordingAllocator;

    #[test]
    fn test_texture_views_are_deduplicated_per_desc() {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let texture = Texture::new(
            TextureDesc {
                width: 64,
                height: 64,
                num_mips: 2,
                usage: TextureUsage::DEFAULT | TextureUsage::RENDER_TARGET,
                ..Default::default()
            },
            &allocator,
        )
        .expect("texture");

        let srv = texture.full_view_desc(GpuViewUsage::DEFAULT);
        let a = texture.request_view(srv).expect("view");
        let b = texture.request_view(srv).expect("view");
        let rtv = texture
            .request_view(TextureViewDesc {
                num_mips: 1,
                ..texture.full_view_desc(GpuViewUsage::RENDER_TARGET)
            })
            .expect("view");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &rtv));
        assert_eq!(recorder.views_created(), 2);

        texture.release_view(&a).expect("release");
        texture.release_view(&b).expect("release");
        assert_eq!(texture.view_count(), 1);
    }

    #[test]
    fn test_view_usage_requires_matching_texture_usage() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let texture = Texture::new(TextureDesc::default(), &allocator).expect("texture");
        let err = texture
            .request_view(texture.full_view_desc(GpuViewUsage::RANDOM_WRITE))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidParameters(_)));
    }

    #[test]
    fn test_view_range_overflow_is_rejected() {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let texture = Texture::new(
            TextureDesc {
                width: 4,
                height: 4,
                num_mips: 2,
                ..Default::default()
            },
            &allocator,
        )
        .expect("texture");
        let full = texture.full_view_desc(GpuViewUsage::DEFAULT);

        let past_mips = texture.request_view(TextureViewDesc {
            most_detailed_mip: u32::MAX,
            num_mips: 1,
            ..full
        });
        let past_slices = texture.request_view(TextureViewDesc {
            first_array_slice: u32::MAX,
            num_array_slices: 1,
            ..full
        });
        let past_end = texture.request_view(TextureViewDesc {
            most_detailed_mip: 1,
            ..full
        });

        assert!(matches!(past_mips, Err(RenderError::InvalidParameters(_))));
        assert!(matches!(past_slices, Err(RenderError::InvalidParameters(_))));
        assert!(matches!(past_end, Err(RenderError::InvalidParameters(_))));
        assert_eq!(recorder.views_created(), 0);
    }

    #[test]
    fn test_mip_count_is_bounded_by_extents() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let desc = TextureDesc {
            width: 64,
            height: 16,
            ..Default::default()
        };

        let full_chain = Texture::new(
            TextureDesc {
                num_mips: 6,
                ..desc
            },
            &allocator,
        );
        let too_many = Texture::new(
            TextureDesc {
                num_mips: 7,
                ..desc
            },
            &allocator,
        );
        let absurd = Texture::new(
            TextureDesc {
                num_mips: u32::MAX,
                ..desc
            },
            &allocator,
        );

        assert_eq!(full_chain.expect("texture").desc().subresource_count(), 7);
        assert!(matches!(too_many, Err(RenderError::InvalidParameters(_))));
        assert!(matches!(absurd, Err(RenderError::InvalidParameters(_))));
    }

    #[test]
    fn test_subresource_layout_follows_mips_and_faces() {
        let (_recorder, allocator) = RecordingAllocator::new_shared();
        let cube = Texture::new(
            TextureDesc {
                ty: TextureType::Cube,
                width: 8,
                height: 8,
                num_mips: 1,
                ..Default::default()
            },
            &allocator,
        )
        .expect("texture");

        assert_eq!(cube.desc().subresource_count(), 12);
        assert_eq!(cube.read_subresource(0).expect("mip 0").len(), 8 * 8 * 4);
        assert_eq!(cube.read_subresource(6).expect("mip 1").len(), 4 * 4 * 4);
        assert!(cube.write_subresource(6, &[0u8; 3]).is_err());
    }
}
