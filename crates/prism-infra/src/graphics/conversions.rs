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

//! Conversions shared by several backends.

use prism_core::math::Mat4;
use prism_core::renderer::{NativeHandle, NativeHandleKind, RawHandle, RenderTarget};

/// Remaps a projection producing depth in `[-1, 1]` to Direct3D's `[0, 1]`.
///
/// Row 2 (clip-space z) becomes the average of rows 2 and 3.
pub fn to_d3d_projection(matrix: &Mat4) -> Mat4 {
    let mut dest = *matrix;
    for col in dest.cols.iter_mut() {
        col[2] = (col[2] + col[3]) / 2.0;
    }
    dest
}

/// The color views a target exposes, in attachment order.
pub fn color_views(target: &dyn RenderTarget) -> Vec<RawHandle> {
    match target.native_handle(NativeHandleKind::RenderTargetViews) {
        Some(NativeHandle::RenderTargetViews(views)) => views,
        _ => Vec::new(),
    }
}

/// The depth-stencil view a target exposes, the read-only one if requested.
pub fn depth_view(target: &dyn RenderTarget, read_only: bool) -> Option<RawHandle> {
    let kind = if read_only {
        NativeHandleKind::ReadOnlyDepthStencilView
    } else {
        NativeHandleKind::DepthStencilView
    };
    target.native_handle(kind).and_then(|h| h.single())
}

/// A single native handle of `kind`, if the target has one.
pub fn single_handle(target: &dyn RenderTarget, kind: NativeHandleKind) -> Option<RawHandle> {
    target.native_handle(kind).and_then(|h| h.single())
}
