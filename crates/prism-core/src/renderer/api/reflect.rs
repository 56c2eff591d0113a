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

//! Source-level reflection of GPU program inputs and parameters.
//!
//! Backends need two things from a program before it can be bound: the vertex
//! inputs it reads (to validate and build input layouts) and its constant
//! parameters (to lay out parameter blocks). Both are recovered here from HLSL
//! semantics and GLSL declarations.

use super::params::{
    layout_param_block, GpuParamDataDesc, GpuParamDataType, GpuParamDesc, ParamLocation,
    ParamPacking,
};
use super::vertex::{VertexElement, VertexElementSemantic, VertexElementType};
use super::GpuProgramType;
use crate::renderer::error::ShaderError;

/// What reflection recovered from a program's source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramReflection {
    /// Vertex inputs, in declaration order, for vertex programs.
    pub inputs: Option<Vec<VertexElement>>,
    /// Constant parameters and blocks.
    pub params: GpuParamDesc,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Removes `//` and `/* */` comments, keeping line structure.
fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' {
            match chars.peek() {
                Some('/') => {
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        chars.next();
                    }
                    continue;
                }
                Some('*') => {
                    chars.next();
                    let mut prev = '\0';
                    for next in chars.by_ref() {
                        if next == '\n' {
                            out.push('\n');
                        }
                        if prev == '*' && next == '/' {
                            break;
                        }
                        prev = next;
                    }
                    out.push(' ');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Verifies brackets are balanced, reporting the first offending line.
fn check_balanced(src: &str, entry_point: &str) -> Result<(), ShaderError> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for (line_idx, line) in src.lines().enumerate() {
        for c in line.chars() {
            match c {
                '(' | '{' | '[' => stack.push((c, line_idx + 1)),
                ')' | '}' | ']' => {
                    let open = match c {
                        ')' => '(',
                        '}' => '{',
                        _ => '[',
                    };
                    match stack.pop() {
                        Some((o, _)) if o == open => {}
                        _ => {
                            return Err(ShaderError::CompilationError {
                                entry_point: entry_point.to_string(),
                                details: format!("line {}: unexpected '{c}'", line_idx + 1),
                            })
                        }
                    }
                }
                _ => {}
            }
        }
    }
    match stack.pop() {
        Some((c, line)) => Err(ShaderError::CompilationError {
            entry_point: entry_point.to_string(),
            details: format!("line {line}: unclosed '{c}'"),
        }),
        None => Ok(()),
    }
}

/// Returns the index of the bracket closing the one at `open`.
fn matching_close(src: &str, open: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let (open_c, close_c) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'{' => (b'{', b'}'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == open_c {
            depth += 1;
        } else if b == close_c {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Finds the whole-word occurrences of `word` in `src`.
fn find_word<'a>(src: &'a str, word: &'a str) -> impl Iterator<Item = usize> + 'a {
    src.match_indices(word).filter_map(move |(pos, _)| {
        let before = src[..pos].chars().next_back();
        let after = src[pos + word.len()..].chars().next();
        let bounded =
            !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char);
        bounded.then_some(pos)
    })
}

/// Returns the parameter list of the function definition named `name`.
fn function_params<'a>(src: &'a str, name: &str) -> Option<&'a str> {
    for pos in find_word(src, name) {
        let after_name = pos + name.len();
        let rest = &src[after_name..];
        let trimmed = rest.trim_start();
        if !trimmed.starts_with('(') {
            continue;
        }
        let open = after_name + (rest.len() - trimmed.len());
        let close = matching_close(src, open)?;
        let tail = src[close + 1..].trim_start();
        if tail.starts_with('{') || tail.starts_with(':') {
            return Some(&src[open + 1..close]);
        }
    }
    None
}

/// Returns the body of `struct name { ... }`.
fn struct_body<'a>(src: &'a str, name: &str) -> Option<&'a str> {
    for pos in find_word(src, "struct") {
        let rest = src[pos + "struct".len()..].trim_start();
        let ident: String = rest.chars().take_while(|c| is_ident_char(*c)).collect();
        if ident != name {
            continue;
        }
        let open = src[pos..].find('{')? + pos;
        let close = matching_close(src, open)?;
        return Some(&src[open + 1..close]);
    }
    None
}

/// Splits a trailing decimal index off a name: `TEXCOORD3` becomes `("TEXCOORD", 3)`.
fn split_index(name: &str) -> (&str, u16) {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    let (base, idx) = name.split_at(name.len() - digits);
    (base, idx.parse().unwrap_or(0))
}

/// A parsed `type name[array] : SEMANTIC` declarator.
#[derive(Debug)]
struct Declarator<'a> {
    ty: &'a str,
    name: &'a str,
    array_size: u32,
    semantic: Option<&'a str>,
    output: bool,
}

const QUALIFIERS: &[&str] = &[
    "in",
    "const",
    "uniform",
    "linear",
    "centroid",
    "nointerpolation",
    "noperspective",
    "precise",
    "row_major",
    "column_major",
    "flat",
    "smooth",
    "highp",
    "mediump",
    "lowp",
    "attribute",
];

fn parse_declarator(text: &str) -> Option<Declarator<'_>> {
    let (decl, semantic) = match text.split_once(':') {
        Some((d, s)) => (d, Some(s.trim())),
        None => (text, None),
    };
    let mut output = false;
    let mut words = Vec::new();
    for token in decl.split_whitespace() {
        match token {
            "out" | "inout" => output = true,
            t if QUALIFIERS.contains(&t) => {}
            t => words.push(t),
        }
    }
    let ty = *words.first()?;
    let raw_name = *words.get(1)?;
    let (name, array_size) = match raw_name.split_once('[') {
        Some((n, rest)) => (
            n,
            rest.trim_end_matches(']').trim().parse().unwrap_or(1),
        ),
        None => (raw_name, 1),
    };
    Some(Declarator {
        ty,
        name,
        array_size,
        semantic,
        output,
    })
}

fn split_top_level(list: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in list.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&list[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn vertex_type_from_name(ty: &str) -> VertexElementType {
    match ty {
        "float" | "half" => VertexElementType::Float1,
        "float2" | "half2" | "vec2" => VertexElementType::Float2,
        "float3" | "half3" | "vec3" => VertexElementType::Float3,
        "int4" | "ivec4" => VertexElementType::SInt4,
        "uint4" | "uvec4" => VertexElementType::UInt4,
        _ => VertexElementType::Float4,
    }
}

fn param_type_from_name(ty: &str) -> Option<GpuParamDataType> {
    Some(match ty {
        "float" => GpuParamDataType::Float1,
        "float2" | "vec2" => GpuParamDataType::Float2,
        "float3" | "vec3" => GpuParamDataType::Float3,
        "float4" | "vec4" => GpuParamDataType::Float4,
        "float2x2" | "mat2" => GpuParamDataType::Matrix2x2,
        "float3x3" | "mat3" => GpuParamDataType::Matrix3x3,
        "float4x4" | "matrix" | "mat4" => GpuParamDataType::Matrix4x4,
        "int" | "uint" => GpuParamDataType::Int1,
        "int2" | "uint2" | "ivec2" => GpuParamDataType::Int2,
        "int3" | "uint3" | "ivec3" => GpuParamDataType::Int3,
        "int4" | "uint4" | "ivec4" => GpuParamDataType::Int4,
        "bool" => GpuParamDataType::Bool,
        _ => return None,
    })
}

fn push_element(
    elements: &mut Vec<VertexElement>,
    ty: VertexElementType,
    semantic: VertexElementSemantic,
    index: u16,
) {
    // Four-component color inputs read packed vertex colors.
    let ty = match semantic {
        VertexElementSemantic::Color | VertexElementSemantic::Specular
            if ty == VertexElementType::Float4 =>
        {
            VertexElementType::Color
        }
        _ => ty,
    };
    let offset = elements.iter().map(VertexElement::size).sum();
    elements.push(VertexElement::new(0, offset, ty, semantic, index));
}

/// Maps an HLSL input semantic to a vertex semantic and index.
///
/// System values (`SV_*`) are generated by the input assembler and return `None`.
pub fn hlsl_semantic(semantic: &str) -> Option<(VertexElementSemantic, u16)> {
    let upper = semantic.to_ascii_uppercase();
    if upper.starts_with("SV_") {
        return None;
    }
    let (base, index) = split_index(&upper);
    let semantic = match base {
        "POSITION" => VertexElementSemantic::Position,
        "POSITIONT" => VertexElementSemantic::PositionT,
        "BLENDWEIGHT" | "BLENDWEIGHTS" => VertexElementSemantic::BlendWeights,
        "BLENDINDICES" => VertexElementSemantic::BlendIndices,
        "NORMAL" => VertexElementSemantic::Normal,
        "COLOR" => VertexElementSemantic::Color,
        "SPECULAR" => VertexElementSemantic::Specular,
        "TEXCOORD" => VertexElementSemantic::TexCoord,
        "BINORMAL" | "BITANGENT" => VertexElementSemantic::Bitangent,
        "TANGENT" => VertexElementSemantic::Tangent,
        "PSIZE" => VertexElementSemantic::PSize,
        _ => return None,
    };
    Some((semantic, index))
}

/// Maps a GLSL vertex attribute name to a vertex semantic and index.
///
/// Recognized names are `bs_position`, `bs_normal`, `bs_tangent`,
/// `bs_bitangent`, `bs_texcoordN`, `bs_colorN`, `bs_blendweights` and
/// `bs_blendindices`, each with an optional trailing index.
pub fn glsl_attribute_semantic(name: &str) -> Option<(VertexElementSemantic, u16)> {
    let rest = name.strip_prefix("bs_")?;
    let (base, index) = split_index(rest);
    let semantic = match base {
        "position" => VertexElementSemantic::Position,
        "normal" => VertexElementSemantic::Normal,
        "tangent" => VertexElementSemantic::Tangent,
        "bitangent" => VertexElementSemantic::Bitangent,
        "texcoord" => VertexElementSemantic::TexCoord,
        "color" => VertexElementSemantic::Color,
        "blendweights" => VertexElementSemantic::BlendWeights,
        "blendindices" => VertexElementSemantic::BlendIndices,
        _ => return None,
    };
    Some((semantic, index))
}

fn hlsl_inputs(
    src: &str,
    params: &str,
    entry_point: &str,
) -> Result<Vec<VertexElement>, ShaderError> {
    let mut elements = Vec::new();
    for param in split_top_level(params, ',') {
        let decl = parse_declarator(param).ok_or_else(|| ShaderError::CompilationError {
            entry_point: entry_point.to_string(),
            details: format!("malformed parameter '{param}'"),
        })?;
        if decl.output {
            continue;
        }
        match decl.semantic {
            Some(semantic) => {
                if let Some((sem, index)) = hlsl_semantic(semantic) {
                    push_element(&mut elements, vertex_type_from_name(decl.ty), sem, index);
                } else if !semantic.to_ascii_uppercase().starts_with("SV_") {
                    log::warn!("Unrecognized HLSL input semantic '{semantic}' in '{entry_point}'");
                }
            }
            None => {
                let body = struct_body(src, decl.ty).ok_or_else(|| {
                    ShaderError::CompilationError {
                        entry_point: entry_point.to_string(),
                        details: format!(
                            "input '{}' has no semantic and '{}' is not a struct",
                            decl.name, decl.ty
                        ),
                    }
                })?;
                for member in split_top_level(body, ';') {
                    let Some(member) = parse_declarator(member) else {
                        continue;
                    };
                    let Some(semantic) = member.semantic else {
                        continue;
                    };
                    if let Some((sem, index)) = hlsl_semantic(semantic) {
                        push_element(&mut elements, vertex_type_from_name(member.ty), sem, index);
                    }
                }
            }
        }
    }
    Ok(elements)
}

fn hlsl_constant_buffers(src: &str) -> GpuParamDesc {
    let mut desc = GpuParamDesc::default();
    let mut next_slot = 0u32;

    for pos in find_word(src, "cbuffer") {
        let header_start = pos + "cbuffer".len();
        let Some(open_rel) = src[header_start..].find('{') else {
            continue;
        };
        let open = header_start + open_rel;
        let Some(close) = matching_close(src, open) else {
            continue;
        };
        let header = src[header_start..open].trim();
        let (name, register) = match header.split_once(':') {
            Some((n, r)) => (n.trim(), Some(r)),
            None => (header, None),
        };
        let slot = register
            .and_then(|r| r.split_once('b'))
            .map(|(_, rest)| rest.chars().take_while(char::is_ascii_digit).collect::<String>())
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(next_slot);
        next_slot = slot + 1;

        let mut params: Vec<GpuParamDataDesc> = split_top_level(&src[open + 1..close], ';')
            .into_iter()
            .filter_map(parse_declarator)
            .filter_map(|d| {
                param_type_from_name(d.ty)
                    .map(|ty| GpuParamDataDesc::new(d.name, ty, d.array_size))
            })
            .collect();
        let mut block = layout_param_block(name, &mut params, ParamPacking::ConstantBuffer, |_| {
            ParamLocation::Block { slot }
        });
        block.slot = slot;
        desc.params.extend(params);
        desc.blocks.push(block);
    }
    desc
}

/// Reflects an HLSL program.
///
/// Fails if the source is malformed or `entry_point` is not defined.
pub fn reflect_hlsl(
    source: &str,
    entry_point: &str,
    ty: GpuProgramType,
) -> Result<ProgramReflection, ShaderError> {
    let src = strip_comments(source);
    check_balanced(&src, entry_point)?;
    let params = function_params(&src, entry_point).ok_or_else(|| {
        ShaderError::InvalidEntryPoint {
            entry_point: entry_point.to_string(),
        }
    })?;

    let inputs = match ty {
        GpuProgramType::Vertex => Some(hlsl_inputs(&src, params, entry_point)?),
        _ => None,
    };
    Ok(ProgramReflection {
        inputs,
        params: hlsl_constant_buffers(&src),
    })
}

/// Splits GLSL source into top-level statements. Function definitions end at
/// their closing brace; blocks and structs end at the following `;`.
fn glsl_statements(src: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in src.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let (head, _) = strip_layout(src[start..i].trim_start());
                    let before_body = head.split('{').next().unwrap_or("");
                    if before_body.contains('(') {
                        statements.push(&src[start..=i]);
                        start = i + 1;
                    }
                }
            }
            ';' if depth == 0 => {
                statements.push(&src[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    statements
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .collect()
}

/// Strips a leading `layout(...)` qualifier, returning its `binding` value if any.
fn strip_layout(statement: &str) -> (&str, Option<u32>) {
    let Some(rest) = statement.strip_prefix("layout") else {
        return (statement, None);
    };
    let Some(rest) = rest.trim_start().strip_prefix('(') else {
        return (statement, None);
    };
    let Some(close) = rest.find(')') else {
        return (statement, None);
    };
    let qualifiers = &rest[..close];
    let binding = qualifiers.split(',').find_map(|q| {
        let (key, value) = q.split_once('=')?;
        (key.trim() == "binding").then(|| value.trim().parse().ok())?
    });
    (rest[close + 1..].trim_start(), binding)
}

/// Drops preprocessor lines, which the statement splitter does not understand.
fn strip_preprocessor(src: &str) -> String {
    src.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reflects a GLSL program. The entry point is always `main`.
pub fn reflect_glsl(source: &str, ty: GpuProgramType) -> Result<ProgramReflection, ShaderError> {
    let src = strip_preprocessor(&strip_comments(source));
    check_balanced(&src, "main")?;
    if function_params(&src, "main").is_none() {
        return Err(ShaderError::InvalidEntryPoint {
            entry_point: "main".to_string(),
        });
    }

    let mut inputs = Vec::new();
    let mut loose = Vec::new();
    let mut desc = GpuParamDesc::default();
    let mut next_binding = 0u32;

    for statement in glsl_statements(&src) {
        let (statement, binding) = strip_layout(statement);
        let first = statement.split_whitespace().next().unwrap_or("");

        if (first == "in" || first == "attribute") && ty == GpuProgramType::Vertex {
            let Some(decl) = parse_declarator(statement) else {
                continue;
            };
            if decl.name.starts_with("gl_") {
                continue;
            }
            match glsl_attribute_semantic(decl.name) {
                Some((semantic, index)) => {
                    push_element(&mut inputs, vertex_type_from_name(decl.ty), semantic, index)
                }
                None => log::warn!(
                    "Vertex attribute '{}' does not follow the bs_* naming convention and will not be bound",
                    decl.name
                ),
            }
        } else if first == "uniform" {
            if let Some(open) = statement.find('{') {
                let Some(close) = matching_close(statement, open) else {
                    continue;
                };
                let name = statement[..open].split_whitespace().last().unwrap_or("");
                let slot = binding.unwrap_or(next_binding);
                next_binding = slot + 1;
                let mut params: Vec<GpuParamDataDesc> =
                    split_top_level(&statement[open + 1..close], ';')
                        .into_iter()
                        .filter_map(parse_declarator)
                        .filter_map(|d| {
                            param_type_from_name(d.ty)
                                .map(|ty| GpuParamDataDesc::new(d.name, ty, d.array_size))
                        })
                        .collect();
                let mut block = layout_param_block(name, &mut params, ParamPacking::Std140, |_| {
                    ParamLocation::Block { slot }
                });
                block.slot = slot;
                desc.params.extend(params);
                desc.blocks.push(block);
            } else if let Some(decl) = parse_declarator(statement) {
                if let Some(ty) = param_type_from_name(decl.ty) {
                    loose.push(GpuParamDataDesc::new(decl.name, ty, decl.array_size));
                }
            }
        }
    }

    if !loose.is_empty() {
        layout_param_block("$Globals", &mut loose, ParamPacking::Std140, |offset| {
            ParamLocation::Packed { offset }
        });
        desc.params.extend(loose);
    }

    Ok(ProgramReflection {
        inputs: (ty == GpuProgramType::Vertex).then_some(inputs),
        params: desc,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HLSL_VS: &str = r#"
        // Per-object constants
        cbuffer PerObject : register(b1)
        {
            float4x4 gWorldViewProj;
            float3 gTint;
            float gTime;
        };

        struct VSInput
        {
            float3 position : POSITION;
            float2 uv : TEXCOORD0;
            float4 color : COLOR;
            uint vertexId : SV_VertexID;
        };

        float4 vsmain(VSInput input, out float2 oUv : TEXCOORD0) : SV_Position
        {
            oUv = input.uv;
            return mul(gWorldViewProj, float4(input.position, 1.0f));
        }
    "#;

    #[test]
    fn test_hlsl_struct_inputs_skip_system_values() {
        let r = reflect_hlsl(HLSL_VS, "vsmain", GpuProgramType::Vertex).expect("reflect");
        let inputs = r.inputs.expect("vertex inputs");
        let semantics: Vec<_> = inputs.iter().map(|e| (e.semantic, e.index)).collect();
        assert_eq!(
            semantics,
            vec![
                (VertexElementSemantic::Position, 0),
                (VertexElementSemantic::TexCoord, 0),
                (VertexElementSemantic::Color, 0),
            ]
        );
        assert_eq!(inputs[1].offset, 12);
    }

    #[test]
    fn test_hlsl_constant_buffer_reflection() {
        let r = reflect_hlsl(HLSL_VS, "vsmain", GpuProgramType::Vertex).expect("reflect");
        assert_eq!(r.params.blocks.len(), 1);
        assert_eq!(r.params.blocks[0].name, "PerObject");
        assert_eq!(r.params.blocks[0].slot, 1);
        let tint = r
            .params
            .params
            .iter()
            .find(|p| p.name == "gTint")
            .expect("gTint");
        assert_eq!(tint.cpu_mem_offset, 16);
        assert_eq!(tint.location, ParamLocation::Block { slot: 1 });
    }

    #[test]
    fn test_hlsl_inline_parameter_semantics() {
        let src = "float4 main(in float3 pos : POSITION, float3 n : NORMAL) : SV_Position { return float4(pos, 1); }";
        let r = reflect_hlsl(src, "main", GpuProgramType::Vertex).expect("reflect");
        assert_eq!(r.inputs.expect("inputs").len(), 2);
    }

    #[test]
    fn test_hlsl_missing_entry_point() {
        let err = reflect_hlsl(HLSL_VS, "psmain", GpuProgramType::Fragment).unwrap_err();
        assert_eq!(
            err,
            ShaderError::InvalidEntryPoint {
                entry_point: "psmain".into()
            }
        );
    }

    #[test]
    fn test_unbalanced_source_fails_to_compile() {
        let err = reflect_hlsl("float4 main() : SV_Target { return 1;", "main", GpuProgramType::Fragment)
            .unwrap_err();
        assert!(matches!(err, ShaderError::CompilationError { .. }));
    }

    const GLSL_VS: &str = r#"
        #version 410
        layout(location = 0) in vec3 bs_position;
        in vec2 bs_texcoord1;
        in vec4 bs_color;
        in vec3 customThing;

        uniform mat4 gMatViewProj;
        uniform float gTime;

        layout(std140, binding = 0) uniform PerCamera
        {
            vec3 gViewDir;
            float gNear;
        };

        out vec2 uv;

        void main()
        {
            uv = bs_texcoord1;
            gl_Position = gMatViewProj * vec4(bs_position, 1.0);
        }
    "#;

    #[test]
    fn test_glsl_attributes_map_by_name() {
        let r = reflect_glsl(GLSL_VS, GpuProgramType::Vertex).expect("reflect");
        let semantics: Vec<_> = r
            .inputs
            .expect("inputs")
            .iter()
            .map(|e| (e.semantic, e.index))
            .collect();
        assert_eq!(
            semantics,
            vec![
                (VertexElementSemantic::Position, 0),
                (VertexElementSemantic::TexCoord, 1),
                (VertexElementSemantic::Color, 0),
            ]
        );
    }

    #[test]
    fn test_glsl_loose_uniforms_are_packed_and_blocks_use_slots() {
        let r = reflect_glsl(GLSL_VS, GpuProgramType::Vertex).expect("reflect");
        let find = |name: &str| {
            r.params
                .params
                .iter()
                .find(|p| p.name == name)
                .unwrap_or_else(|| panic!("missing {name}"))
        };
        assert_eq!(find("gMatViewProj").location, ParamLocation::Packed { offset: 0 });
        assert_eq!(find("gTime").location, ParamLocation::Packed { offset: 16 });
        // Block slot 0 is a real binding, distinct from packed uniforms.
        assert_eq!(find("gNear").location, ParamLocation::Block { slot: 0 });
        assert_eq!(find("gNear").cpu_mem_offset, 3);
        assert_eq!(r.params.blocks.len(), 1);
        assert_eq!(r.params.blocks[0].slot, 0);
    }

    #[test]
    fn test_glsl_requires_main() {
        let err = reflect_glsl("void notMain() {}", GpuProgramType::Fragment).unwrap_err();
        assert!(matches!(err, ShaderError::InvalidEntryPoint { .. }));
    }

    #[test]
    fn test_attribute_name_table() {
        assert_eq!(
            glsl_attribute_semantic("bs_blendindices"),
            Some((VertexElementSemantic::BlendIndices, 0))
        );
        assert_eq!(
            glsl_attribute_semantic("bs_texcoord3"),
            Some((VertexElementSemantic::TexCoord, 3))
        );
        assert_eq!(glsl_attribute_semantic("gl_VertexID"), None);
        assert_eq!(glsl_attribute_semantic("bs_unknown"), None);
        assert_eq!(
            hlsl_semantic("BINORMAL"),
            Some((VertexElementSemantic::Bitangent, 0))
        );
        assert_eq!(hlsl_semantic("SV_InstanceID"), None);
    }
}
