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

//! Enums and flag sets shared by every part of the render system API.

use crate::prism_bitflags;

/// A raw native object handle.
///
/// Backends hand these out for every object they create (buffers, views, state
/// objects, shaders, windows). The value is opaque outside the backend that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(pub u64);

/// The pipeline stage a GPU program runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuProgramType {
    /// Vertex program.
    Vertex,
    /// Fragment (pixel) program.
    Fragment,
    /// Geometry program.
    Geometry,
    /// Hull (tessellation control) program.
    Hull,
    /// Domain (tessellation evaluation) program.
    Domain,
    /// Compute program.
    Compute,
}

impl GpuProgramType {
    /// The number of program stages.
    pub const COUNT: usize = 6;

    /// All program stages, in pipeline order.
    pub const ALL: [GpuProgramType; Self::COUNT] = [
        GpuProgramType::Vertex,
        GpuProgramType::Fragment,
        GpuProgramType::Geometry,
        GpuProgramType::Hull,
        GpuProgramType::Domain,
        GpuProgramType::Compute,
    ];

    /// Returns a dense index for per-stage arrays.
    pub const fn index(self) -> usize {
        match self {
            GpuProgramType::Vertex => 0,
            GpuProgramType::Fragment => 1,
            GpuProgramType::Geometry => 2,
            GpuProgramType::Hull => 3,
            GpuProgramType::Domain => 4,
            GpuProgramType::Compute => 5,
        }
    }
}

/// The primitive topology used to interpret submitted vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawOperation {
    /// Each vertex is a point.
    PointList,
    /// Each pair of vertices is a line.
    LineList,
    /// Consecutive vertices form a connected line.
    LineStrip,
    /// Each three vertices form a triangle.
    #[default]
    TriangleList,
    /// Each vertex after the second forms a triangle with the previous two.
    TriangleStrip,
    /// Each vertex after the second forms a triangle with the first and previous.
    TriangleFan,
}

impl DrawOperation {
    /// Converts a vertex (or index) count into the number of primitives drawn.
    pub fn primitive_count(self, element_count: u32) -> u32 {
        match self {
            DrawOperation::PointList => element_count,
            DrawOperation::LineList => element_count / 2,
            DrawOperation::LineStrip => element_count.saturating_sub(1),
            DrawOperation::TriangleList => element_count / 3,
            DrawOperation::TriangleStrip | DrawOperation::TriangleFan => {
                element_count.saturating_sub(2)
            }
        }
    }
}

/// The width of the indices stored in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 16-bit indices.
    Bit16,
    /// 32-bit indices.
    Bit32,
}

impl IndexType {
    /// Returns the size of one index in bytes.
    pub const fn size(self) -> u32 {
        match self {
            IndexType::Bit16 => 2,
            IndexType::Bit32 => 4,
        }
    }
}

/// How often a resource is expected to be updated from the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, read by the GPU many times.
    #[default]
    Static,
    /// Rewritten frequently, usually every frame.
    Dynamic,
}

prism_bitflags! {
    /// Selects which buffers of a render target a clear operation touches.
    pub struct FrameBufferType: u8 {
        /// The color buffer(s).
        const COLOR = 1 << 0;
        /// The depth buffer.
        const DEPTH = 1 << 1;
        /// The stencil buffer.
        const STENCIL = 1 << 2;
        /// Every buffer.
        const ALL = 0b111;
    }
}

prism_bitflags! {
    /// How a resource view is going to be bound.
    pub struct GpuViewUsage: u8 {
        /// Read-only shader resource view.
        const DEFAULT = 1 << 0;
        /// Render target view.
        const RENDER_TARGET = 1 << 1;
        /// Depth-stencil view.
        const DEPTH_STENCIL = 1 << 2;
        /// Unordered access (load/store) view.
        const RANDOM_WRITE = 1 << 3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_counts_per_topology() {
        assert_eq!(DrawOperation::PointList.primitive_count(5), 5);
        assert_eq!(DrawOperation::LineList.primitive_count(5), 2);
        assert_eq!(DrawOperation::LineStrip.primitive_count(5), 4);
        assert_eq!(DrawOperation::TriangleList.primitive_count(6), 2);
        assert_eq!(DrawOperation::TriangleStrip.primitive_count(6), 4);
        assert_eq!(DrawOperation::TriangleFan.primitive_count(1), 0);
        assert_eq!(DrawOperation::LineStrip.primitive_count(0), 0);
    }

    #[test]
    fn test_stage_indices_are_dense() {
        for (i, stage) in GpuProgramType::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }
}
