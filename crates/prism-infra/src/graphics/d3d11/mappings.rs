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

//! Mappings from generic types to their Direct3D 11 equivalents.

use prism_core::renderer::{
    DrawOperation, IndexType, RenderError, VertexElementSemantic, VertexElementType,
};

/// The subset of DXGI formats the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DxgiFormat {
    R32Float,
    R32G32Float,
    R32G32B32Float,
    R32G32B32A32Float,
    R32G32B32A32Uint,
    R32G32B32A32Sint,
    R16Sint,
    R16G16Sint,
    R16G16B16A16Sint,
    R8G8B8A8Uint,
    R8G8B8A8Unorm,
    B8G8R8A8Unorm,
    R16Uint,
    R32Uint,
}

/// The primitive topologies of the input assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

/// One element of a native input layout description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputElementDesc {
    /// HLSL semantic name.
    pub semantic_name: &'static str,
    /// Semantic index.
    pub semantic_index: u32,
    /// Element format.
    pub format: DxgiFormat,
    /// Vertex stream.
    pub input_slot: u32,
    /// Byte offset inside the stream.
    pub aligned_byte_offset: u32,
}

/// The HLSL semantic name of a vertex element semantic.
pub fn semantic_name(semantic: VertexElementSemantic) -> &'static str {
    match semantic {
        VertexElementSemantic::Position => "POSITION",
        VertexElementSemantic::BlendWeights => "BLENDWEIGHT",
        VertexElementSemantic::BlendIndices => "BLENDINDICES",
        VertexElementSemantic::Normal => "NORMAL",
        VertexElementSemantic::Color | VertexElementSemantic::Specular => "COLOR",
        VertexElementSemantic::TexCoord => "TEXCOORD",
        VertexElementSemantic::Bitangent => "BINORMAL",
        VertexElementSemantic::Tangent => "TANGENT",
        VertexElementSemantic::PositionT => "POSITIONT",
        VertexElementSemantic::PSize => "PSIZE",
    }
}

/// The format of a vertex element type.
pub fn vertex_format(ty: VertexElementType) -> DxgiFormat {
    match ty {
        VertexElementType::Float1 => DxgiFormat::R32Float,
        VertexElementType::Float2 => DxgiFormat::R32G32Float,
        VertexElementType::Float3 => DxgiFormat::R32G32B32Float,
        VertexElementType::Float4 => DxgiFormat::R32G32B32A32Float,
        VertexElementType::Short1 => DxgiFormat::R16Sint,
        VertexElementType::Short2 => DxgiFormat::R16G16Sint,
        // There is no three-component 16-bit format; the fourth is ignored.
        VertexElementType::Short3 | VertexElementType::Short4 => DxgiFormat::R16G16B16A16Sint,
        VertexElementType::UByte4 => DxgiFormat::R8G8B8A8Uint,
        VertexElementType::Color | VertexElementType::ColorAbgr => DxgiFormat::R8G8B8A8Unorm,
        VertexElementType::ColorArgb => DxgiFormat::B8G8R8A8Unorm,
        VertexElementType::UInt4 => DxgiFormat::R32G32B32A32Uint,
        VertexElementType::SInt4 => DxgiFormat::R32G32B32A32Sint,
    }
}

/// The format of an index type.
pub fn index_format(ty: IndexType) -> DxgiFormat {
    match ty {
        IndexType::Bit16 => DxgiFormat::R16Uint,
        IndexType::Bit32 => DxgiFormat::R32Uint,
    }
}

/// The topology of a draw operation. Triangle fans have no equivalent.
pub fn topology(operation: DrawOperation) -> Result<PrimitiveTopology, RenderError> {
    match operation {
        DrawOperation::PointList => Ok(PrimitiveTopology::PointList),
        DrawOperation::LineList => Ok(PrimitiveTopology::LineList),
        DrawOperation::LineStrip => Ok(PrimitiveTopology::LineStrip),
        DrawOperation::TriangleList => Ok(PrimitiveTopology::TriangleList),
        DrawOperation::TriangleStrip => Ok(PrimitiveTopology::TriangleStrip),
        DrawOperation::TriangleFan => Err(RenderError::Unsupported(
            "D3D11 does not support the triangle fan topology".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_byte_orders() {
        assert_eq!(vertex_format(VertexElementType::ColorAbgr), DxgiFormat::R8G8B8A8Unorm);
        assert_eq!(vertex_format(VertexElementType::ColorArgb), DxgiFormat::B8G8R8A8Unorm);
    }

    #[test]
    fn test_fan_is_rejected() {
        assert!(matches!(
            topology(DrawOperation::TriangleFan),
            Err(RenderError::Unsupported(_))
        ));
        assert_eq!(
            topology(DrawOperation::TriangleStrip),
            Ok(PrimitiveTopology::TriangleStrip)
        );
    }
}
