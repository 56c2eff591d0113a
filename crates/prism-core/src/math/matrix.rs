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

//! A column-major 4x4 matrix.

/// A 4x4 column-major matrix of `f32`.
///
/// `cols[c][r]` addresses column `c`, row `r`. Only what projection conversion
/// needs is provided; engine-side transform math lives above the render system.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from its columns.
    pub const fn from_cols(cols: [[f32; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Returns the element at `row`, `col`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    /// Sets the element at `row`, `col`.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.cols[col][row] = value;
    }

    /// Builds a right-handed OpenGL-style perspective projection with depth in `[-1, 1]`.
    pub fn perspective_gl(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y_radians * 0.5).tan();
        let range = near - far;
        Self::from_cols([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (far + near) / range, -1.0],
            [0.0, 0.0, 2.0 * far * near / range, 0.0],
        ])
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn project_depth(m: &Mat4, view_z: f32) -> f32 {
        let z = m.get(2, 2) * view_z + m.get(2, 3);
        let w = m.get(3, 2) * view_z + m.get(3, 3);
        z / w
    }

    #[test]
    fn test_perspective_gl_maps_clip_range_to_minus_one_one() {
        let m = Mat4::perspective_gl(std::f32::consts::FRAC_PI_2, 2.0, 0.5, 50.0);

        assert_relative_eq!(project_depth(&m, -0.5), -1.0, epsilon = 1e-5);
        assert_relative_eq!(project_depth(&m, -50.0), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_gl_scales_by_field_of_view_and_aspect() {
        let m = Mat4::perspective_gl(std::f32::consts::FRAC_PI_2, 2.0, 0.5, 50.0);

        assert_relative_eq!(m.get(0, 0), 0.5, epsilon = 1e-6);
        assert_relative_eq!(m.get(1, 1), 1.0, epsilon = 1e-6);
        assert_relative_eq!(m.get(3, 2), -1.0);
    }

    #[test]
    fn test_set_addresses_row_and_column() {
        let mut m = Mat4::IDENTITY;
        m.set(2, 3, 4.5);

        assert_relative_eq!(m.cols[3][2], 4.5);
        assert_relative_eq!(m.get(2, 3), 4.5);
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }
}
