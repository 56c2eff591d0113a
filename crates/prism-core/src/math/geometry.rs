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

//! Planes and rectangles.

/// A plane in 3D space, `normal . p + d = 0`.
///
/// Used for user clip planes. The equation is stored unnormalized; backends
/// upload the four coefficients as given.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Plane {
    /// The plane normal.
    pub normal: [f32; 3],
    /// The signed distance term.
    pub d: f32,
}

impl Plane {
    /// Creates a plane from its four coefficients.
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            normal: [a, b, c],
            d,
        }
    }

    /// Returns the plane equation as `[a, b, c, d]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.normal[0], self.normal[1], self.normal[2], self.d]
    }
}

/// A rectangle with floating-point coordinates, usually normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect2 {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect2 {
    /// The unit rectangle covering an entire render target.
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Creates a new rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Default for Rect2 {
    fn default() -> Self {
        Self::FULL
    }
}

/// A rectangle in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect2I {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Rect2I {
    /// Creates a new rectangle.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Scales a normalized rectangle to a target of the given pixel size.
    pub fn from_normalized(area: Rect2, target_width: u32, target_height: u32) -> Self {
        Self {
            x: (area.x * target_width as f32) as i32,
            y: (area.y * target_height as f32) as i32,
            width: (area.width * target_width as f32) as u32,
            height: (area.height * target_height as f32) as u32,
        }
    }

    /// Returns `true` if the rectangle starts at the origin and spans the whole target.
    pub fn covers(&self, target_width: u32, target_height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == target_width && self.height == target_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_normalized_scales_to_pixels() {
        let r = Rect2I::from_normalized(Rect2::new(0.5, 0.25, 0.5, 0.5), 800, 600);
        assert_eq!(r, Rect2I::new(400, 150, 400, 300));
    }

    #[test]
    fn test_full_rect_covers_target() {
        let r = Rect2I::from_normalized(Rect2::FULL, 800, 600);
        assert!(r.covers(800, 600));
        assert!(!Rect2I::new(1, 0, 800, 600).covers(800, 600));
    }

    #[test]
    fn test_plane_coefficients_round_trip_unnormalized() {
        let plane = Plane::new(0.0, 2.0, 0.0, -3.5);
        let [a, b, c, d] = plane.to_array();

        assert_relative_eq!(a, 0.0);
        assert_relative_eq!(b, 2.0);
        assert_relative_eq!(c, 0.0);
        assert_relative_eq!(d, -3.5);
    }

    #[test]
    fn test_default_rect_is_full_target() {
        let r = Rect2::default();

        assert_relative_eq!(r.x, 0.0);
        assert_relative_eq!(r.y, 0.0);
        assert_relative_eq!(r.width, 1.0);
        assert_relative_eq!(r.height, 1.0);
    }
}
