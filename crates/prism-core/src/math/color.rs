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

//! Defines the `LinearRgba` color type and its packed vertex encodings.

/// Represents a color in a linear RGBA color space using `f32` components.
///
/// Clear colors, border colors and blend factors all travel through the
/// render system as `LinearRgba`. Vertex colors are packed into 32 bits in
/// the byte order the active backend expects, see [`LinearRgba::to_packed_argb`]
/// and [`LinearRgba::to_packed_abgr`].
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct LinearRgba {
    /// The red component in linear space.
    pub r: f32,
    /// The green component in linear space.
    pub g: f32,
    /// The blue component in linear space.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a new color from its four components.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque color (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Returns the components as an array, in RGBA order.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Packs the color into a `u32` with alpha in the highest byte (`0xAARRGGBB`).
    ///
    /// This is the layout Direct3D 9 expects for `D3DCOLOR` vertex data.
    pub fn to_packed_argb(self) -> u32 {
        let [r, g, b, a] = self.to_unorm8();
        (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
    }

    /// Packs the color into a `u32` with alpha in the highest byte and red in the
    /// lowest (`0xAABBGGRR`), the byte order of `R8G8B8A8_UNORM` on little-endian hosts.
    pub fn to_packed_abgr(self) -> u32 {
        let [r, g, b, a] = self.to_unorm8();
        (a as u32) << 24 | (b as u32) << 16 | (g as u32) << 8 | r as u32
    }

    fn to_unorm8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

impl Default for LinearRgba {
    /// Returns opaque black.
    fn default() -> Self {
        Self::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_byte_orders() {
        let c = LinearRgba::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(c.to_packed_argb(), 0xFFFF_0000);
        assert_eq!(c.to_packed_abgr(), 0xFF00_00FF);
    }

    #[test]
    fn test_packing_clamps_out_of_range_components() {
        let c = LinearRgba::new(2.0, -1.0, 0.5, 1.0);
        assert_eq!(c.to_packed_abgr() & 0xFF, 0xFF);
        assert_eq!((c.to_packed_abgr() >> 8) & 0xFF, 0x00);
        assert_eq!((c.to_packed_abgr() >> 16) & 0xFF, 0x80);
    }
}
