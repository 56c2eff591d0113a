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

//! Vertex elements and vertex declarations.
//!
//! A [`VertexDeclaration`] is an ordered list of [`VertexElement`]s describing
//! how vertex buffer bytes map to shader inputs. Declarations compare by value;
//! the id they carry only serves as a cache key.

use std::fmt;

use crate::utils::IdGenerator;

static DECLARATION_IDS: IdGenerator = IdGenerator::new();

/// The storage type of a vertex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementType {
    /// One 32-bit float.
    Float1,
    /// Two 32-bit floats.
    Float2,
    /// Three 32-bit floats.
    Float3,
    /// Four 32-bit floats.
    Float4,
    /// A packed color in whatever byte order the active backend prefers.
    /// Resolved to [`VertexElementType::ColorArgb`] or
    /// [`VertexElementType::ColorAbgr`] when a declaration is built.
    Color,
    /// One 16-bit signed integer.
    Short1,
    /// Two 16-bit signed integers.
    Short2,
    /// Three 16-bit signed integers.
    Short3,
    /// Four 16-bit signed integers.
    Short4,
    /// Four unsigned bytes.
    UByte4,
    /// A packed color, `0xAARRGGBB`.
    ColorArgb,
    /// A packed color, `0xAABBGGRR`.
    ColorAbgr,
    /// Four 32-bit unsigned integers.
    UInt4,
    /// Four 32-bit signed integers.
    SInt4,
}

impl VertexElementType {
    /// Size of one element of this type in bytes.
    pub const fn size(self) -> u32 {
        match self {
            VertexElementType::Float1 => 4,
            VertexElementType::Float2 => 8,
            VertexElementType::Float3 => 12,
            VertexElementType::Float4 => 16,
            VertexElementType::Color
            | VertexElementType::ColorArgb
            | VertexElementType::ColorAbgr
            | VertexElementType::UByte4 => 4,
            VertexElementType::Short1 => 2,
            VertexElementType::Short2 => 4,
            VertexElementType::Short3 => 6,
            VertexElementType::Short4 => 8,
            VertexElementType::UInt4 | VertexElementType::SInt4 => 16,
        }
    }

    /// Number of components.
    pub const fn component_count(self) -> u32 {
        match self {
            VertexElementType::Float1 | VertexElementType::Short1 => 1,
            VertexElementType::Float2 | VertexElementType::Short2 => 2,
            VertexElementType::Float3 | VertexElementType::Short3 => 3,
            _ => 4,
        }
    }

    /// Returns `true` for the three color types.
    pub const fn is_color(self) -> bool {
        matches!(
            self,
            VertexElementType::Color | VertexElementType::ColorArgb | VertexElementType::ColorAbgr
        )
    }
}

/// The meaning of a vertex element, matched against shader inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum VertexElementSemantic {
    /// Position.
    Position = 1,
    /// Skinning weights.
    BlendWeights = 2,
    /// Skinning bone indices.
    BlendIndices = 3,
    /// Normal.
    Normal = 4,
    /// Diffuse color.
    Color = 5,
    /// Specular color.
    Specular = 6,
    /// Texture coordinate.
    TexCoord = 7,
    /// Bitangent.
    Bitangent = 8,
    /// Tangent.
    Tangent = 9,
    /// Pre-transformed position.
    PositionT = 10,
    /// Point size.
    PSize = 11,
}

/// The backend-preferred byte order of packed vertex colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexColorFormat {
    /// `0xAARRGGBB`, used by Direct3D 9.
    Argb,
    /// `0xAABBGGRR`, used by Direct3D 11 and OpenGL.
    Abgr,
}

impl VertexColorFormat {
    /// The concrete element type for this byte order.
    pub const fn element_type(self) -> VertexElementType {
        match self {
            VertexColorFormat::Argb => VertexElementType::ColorArgb,
            VertexColorFormat::Abgr => VertexElementType::ColorAbgr,
        }
    }
}

/// One attribute within a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    /// The vertex buffer stream the element is read from.
    pub source: u16,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
    /// Storage type.
    pub ty: VertexElementType,
    /// Semantic.
    pub semantic: VertexElementSemantic,
    /// Semantic index, distinguishing e.g. `TEXCOORD0` from `TEXCOORD1`.
    pub index: u16,
}

impl VertexElement {
    /// Creates a new element.
    pub const fn new(
        source: u16,
        offset: u32,
        ty: VertexElementType,
        semantic: VertexElementSemantic,
        index: u16,
    ) -> Self {
        Self {
            source,
            offset,
            ty,
            semantic,
            index,
        }
    }

    /// Size of the element in bytes.
    pub const fn size(&self) -> u32 {
        self.ty.size()
    }
}

/// An ordered, immutable list of vertex elements.
#[derive(Clone)]
pub struct VertexDeclaration {
    id: u32,
    elements: Vec<VertexElement>,
}

impl VertexDeclaration {
    /// Builds a declaration, resolving every [`VertexElementType::Color`] element
    /// to the concrete type for `color_format`. Elements that already carry a
    /// concrete color type are left untouched.
    pub fn new(elements: Vec<VertexElement>, color_format: VertexColorFormat) -> Self {
        let elements = elements
            .into_iter()
            .map(|mut e| {
                if e.ty == VertexElementType::Color {
                    e.ty = color_format.element_type();
                }
                e
            })
            .collect();
        Self {
            id: DECLARATION_IDS.next_id(),
            elements,
        }
    }

    /// A process-unique id assigned at construction.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The elements, in declaration order.
    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Number of elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Finds the element with the given semantic and semantic index.
    pub fn find_element_by_semantic(
        &self,
        semantic: VertexElementSemantic,
        index: u16,
    ) -> Option<&VertexElement> {
        self.elements
            .iter()
            .find(|e| e.semantic == semantic && e.index == index)
    }

    /// All elements read from the given stream.
    pub fn elements_for_source(&self, source: u16) -> impl Iterator<Item = &VertexElement> {
        self.elements.iter().filter(move |e| e.source == source)
    }

    /// The stride of one vertex in the given stream.
    pub fn vertex_size(&self, source: u16) -> u32 {
        self.elements_for_source(source).map(VertexElement::size).sum()
    }

    /// The highest stream index used, or `None` for an empty declaration.
    pub fn max_source(&self) -> Option<u16> {
        self.elements.iter().map(|e| e.source).max()
    }

    /// Shader inputs of `required` that this declaration does not provide,
    /// as `(semantic, index)` pairs.
    pub fn missing_inputs(
        &self,
        required: &VertexDeclaration,
    ) -> Vec<(VertexElementSemantic, u16)> {
        required
            .elements
            .iter()
            .filter(|r| self.find_element_by_semantic(r.semantic, r.index).is_none())
            .map(|r| (r.semantic, r.index))
            .collect()
    }

    /// Returns `true` if this declaration provides every input `required` reads.
    pub fn is_compatible(&self, required: &VertexDeclaration) -> bool {
        self.missing_inputs(required).is_empty()
    }
}

impl PartialEq for VertexDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl Eq for VertexDeclaration {}

impl fmt::Debug for VertexDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexDeclaration")
            .field("id", &self.id)
            .field("elements", &self.elements)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(offset: u32) -> VertexElement {
        VertexElement::new(
            0,
            offset,
            VertexElementType::Float3,
            VertexElementSemantic::Position,
            0,
        )
    }

    #[test]
    fn test_structural_equality() {
        let a = VertexDeclaration::new(vec![position(0)], VertexColorFormat::Abgr);
        let b = VertexDeclaration::new(vec![position(0)], VertexColorFormat::Abgr);
        let c = VertexDeclaration::new(vec![position(4)], VertexColorFormat::Abgr);

        assert_ne!(a.id(), b.id());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_every_field_participates_in_equality() {
        let base = position(0);
        let variants = [
            VertexElement { source: 1, ..base },
            VertexElement {
                ty: VertexElementType::Float4,
                ..base
            },
            VertexElement {
                semantic: VertexElementSemantic::Normal,
                ..base
            },
            VertexElement { index: 1, ..base },
        ];
        let reference = VertexDeclaration::new(vec![base], VertexColorFormat::Abgr);
        for variant in variants {
            let other = VertexDeclaration::new(vec![variant], VertexColorFormat::Abgr);
            assert_ne!(reference, other, "{variant:?}");
        }
    }

    #[test]
    fn test_color_resolution_is_idempotent() {
        let color = VertexElement::new(
            0,
            12,
            VertexElementType::Color,
            VertexElementSemantic::Color,
            0,
        );
        let resolved = VertexDeclaration::new(vec![position(0), color], VertexColorFormat::Argb);
        assert_eq!(resolved.elements()[1].ty, VertexElementType::ColorArgb);

        let rederived =
            VertexDeclaration::new(resolved.elements().to_vec(), VertexColorFormat::Abgr);
        assert_eq!(rederived.elements()[1].ty, VertexElementType::ColorArgb);
        assert_eq!(rederived, resolved);
    }

    #[test]
    fn test_queries() {
        let uv = VertexElement::new(
            1,
            0,
            VertexElementType::Float2,
            VertexElementSemantic::TexCoord,
            1,
        );
        let decl = VertexDeclaration::new(vec![position(0), uv], VertexColorFormat::Abgr);

        assert_eq!(decl.vertex_size(0), 12);
        assert_eq!(decl.vertex_size(1), 8);
        assert_eq!(decl.max_source(), Some(1));
        assert!(decl
            .find_element_by_semantic(VertexElementSemantic::TexCoord, 1)
            .is_some());
        assert!(decl
            .find_element_by_semantic(VertexElementSemantic::TexCoord, 0)
            .is_none());
    }

    #[test]
    fn test_compatibility_checks_semantic_and_index() {
        let shader = VertexDeclaration::new(
            vec![
                position(0),
                VertexElement::new(
                    0,
                    12,
                    VertexElementType::Float3,
                    VertexElementSemantic::Normal,
                    0,
                ),
            ],
            VertexColorFormat::Abgr,
        );
        let only_position = VertexDeclaration::new(vec![position(0)], VertexColorFormat::Abgr);

        assert!(!only_position.is_compatible(&shader));
        assert_eq!(
            only_position.missing_inputs(&shader),
            vec![(VertexElementSemantic::Normal, 0)]
        );
        assert!(shader.is_compatible(&only_position));
    }
}
