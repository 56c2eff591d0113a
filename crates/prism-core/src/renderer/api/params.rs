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

//! GPU program parameters and constant block layout.

/// The data type of a shader constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuParamDataType {
    /// `float`.
    Float1,
    /// `float2` / `vec2`.
    Float2,
    /// `float3` / `vec3`.
    Float3,
    /// `float4` / `vec4`.
    Float4,
    /// `float2x2` / `mat2`.
    Matrix2x2,
    /// `float3x3` / `mat3`.
    Matrix3x3,
    /// `float4x4` / `mat4`.
    Matrix4x4,
    /// `int`.
    Int1,
    /// `int2` / `ivec2`.
    Int2,
    /// `int3` / `ivec3`.
    Int3,
    /// `int4` / `ivec4`.
    Int4,
    /// `bool`.
    Bool,
}

impl GpuParamDataType {
    /// Size in bytes. Matrix columns are padded to four components.
    pub const fn size(self) -> u32 {
        match self {
            GpuParamDataType::Float1 | GpuParamDataType::Int1 | GpuParamDataType::Bool => 4,
            GpuParamDataType::Float2 | GpuParamDataType::Int2 => 8,
            GpuParamDataType::Float3 | GpuParamDataType::Int3 => 12,
            GpuParamDataType::Float4 | GpuParamDataType::Int4 => 16,
            GpuParamDataType::Matrix2x2 => 32,
            GpuParamDataType::Matrix3x3 => 48,
            GpuParamDataType::Matrix4x4 => 64,
        }
    }

    /// Base alignment in bytes under std140 rules.
    pub const fn alignment(self) -> u32 {
        match self {
            GpuParamDataType::Float1 | GpuParamDataType::Int1 | GpuParamDataType::Bool => 4,
            GpuParamDataType::Float2 | GpuParamDataType::Int2 => 8,
            _ => 16,
        }
    }
}

/// Where the value of a parameter lives when bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// Uploaded as an individual uniform, read from the CPU block at `offset` (in 4-byte words).
    Packed {
        /// CPU-side offset in 4-byte words.
        offset: u32,
    },
    /// Read from a buffer bound to a constant/uniform block slot.
    Block {
        /// The block binding slot.
        slot: u32,
    },
}

/// Layout of one parameter inside a parameter block. Sizes and offsets are in 4-byte words.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuParamDataDesc {
    /// Parameter name.
    pub name: String,
    /// Data type.
    pub ty: GpuParamDataType,
    /// Number of array elements, 1 for non-arrays.
    pub array_size: u32,
    /// Size of one element.
    pub element_size: u32,
    /// Distance between consecutive array elements.
    pub array_element_stride: u32,
    /// Offset in the CPU-side block.
    pub cpu_mem_offset: u32,
    /// Offset in GPU memory, where the backend tracks one.
    pub gpu_mem_offset: u32,
    /// How the parameter is bound.
    pub location: ParamLocation,
}

impl GpuParamDataDesc {
    /// A parameter with no layout assigned yet.
    pub fn new(name: impl Into<String>, ty: GpuParamDataType, array_size: u32) -> Self {
        Self {
            name: name.into(),
            ty,
            array_size: array_size.max(1),
            element_size: 0,
            array_element_stride: 0,
            cpu_mem_offset: 0,
            gpu_mem_offset: 0,
            location: ParamLocation::Packed { offset: 0 },
        }
    }
}

/// Layout of a whole parameter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuParamBlockDesc {
    /// Block name.
    pub name: String,
    /// Binding slot.
    pub slot: u32,
    /// Size in 4-byte words, always a multiple of four.
    pub block_size: u32,
    /// Whether the block may be shared between programs.
    pub is_shareable: bool,
}

/// Everything a compiled program exposes about its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpuParamDesc {
    /// Individual parameters.
    pub params: Vec<GpuParamDataDesc>,
    /// Parameter blocks.
    pub blocks: Vec<GpuParamBlockDesc>,
}

/// How parameters are packed into a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPacking {
    /// Direct3D constant buffer rules: pack tightly unless a value would
    /// straddle a 16-byte register.
    ConstantBuffer,
    /// OpenGL std140 rules: align every value to its base alignment.
    Std140,
}

const VEC4_WORDS: u32 = 4;

fn round_up(value: u32, multiple: u32) -> u32 {
    match value % multiple {
        0 => value,
        rem => value + (multiple - rem),
    }
}

/// Assigns offsets to `params` and returns the resulting block.
///
/// Array elements always start on, and are padded to, four-component
/// boundaries. The block size is rounded up to a multiple of 16 bytes. Every
/// parameter is given `location_for(cpu_mem_offset)`.
pub fn layout_param_block(
    name: &str,
    params: &mut [GpuParamDataDesc],
    packing: ParamPacking,
    location_for: impl Fn(u32) -> ParamLocation,
) -> GpuParamBlockDesc {
    let mut block_size = 0u32;

    for param in params.iter_mut() {
        let mut size = param.ty.size() / 4;

        if packing == ParamPacking::Std140 {
            block_size = round_up(block_size, param.ty.alignment() / 4);
        }

        if param.array_size > 1 {
            size = round_up(size, VEC4_WORDS);
            block_size = round_up(block_size, VEC4_WORDS);
            param.cpu_mem_offset = block_size;
            block_size += size * param.array_size;
        } else {
            if packing == ParamPacking::ConstantBuffer {
                let used = block_size % VEC4_WORDS;
                if used != 0 && size > VEC4_WORDS - used {
                    block_size += VEC4_WORDS - used;
                }
            }
            param.cpu_mem_offset = block_size;
            block_size += size;
        }

        param.element_size = size;
        param.array_element_stride = size;
        param.gpu_mem_offset = 0;
        param.location = location_for(param.cpu_mem_offset);
    }

    GpuParamBlockDesc {
        name: name.to_string(),
        slot: 0,
        block_size: round_up(block_size, VEC4_WORDS),
        is_shareable: true,
    }
}
