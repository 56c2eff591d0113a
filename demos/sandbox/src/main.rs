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

// Prism Sandbox
// Draws a triangle for a few frames on the configured backend.

use std::mem;

use anyhow::{Context, Result};
use prism_core::math::{LinearRgba, Rect2};
use prism_core::renderer::{
    BufferUsage, DrawOperation, FrameBufferType, GpuProgramDesc, GpuProgramType, RenderSystem,
    RenderSystemConfig, VertexElement, VertexElementSemantic, VertexElementType,
};
use prism_infra::GraphicsContext;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: u32,
}

const VERTICES: &[Vertex] = &[
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: 0xFF00_00FF,
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: 0xFF00_FF00,
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: 0xFFFF_0000,
    },
];

const HLSL_VS: &str = r#"
    float4 main(float3 pos : POSITION, float4 color : COLOR, out float4 oColor : COLOR) : SV_Position
    {
        oColor = color;
        return float4(pos, 1.0);
    }
"#;

const GLSL_VS: &str = r#"
    #version 410
    in vec3 bs_position;
    in vec4 bs_color;
    out vec4 color;
    void main() { color = bs_color; gl_Position = vec4(bs_position, 1.0); }
"#;

const FRAMES: u32 = 3;

fn load_config() -> Result<RenderSystemConfig> {
    match std::env::args().nth(1) {
        Some(path) => RenderSystemConfig::from_json_file(&path)
            .with_context(|| format!("loading render system config from {path}")),
        None => Ok(RenderSystemConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config()?;
    let mut context = GraphicsContext::new(&config)?;
    let window = context
        .primary_window()
        .cloned()
        .context("graphics context has no primary window")?;
    let rs = context.backend_mut();
    let managers = rs.managers().context("render system is not initialized")?;

    let (source, profile) = match rs.shading_language_name() {
        "glsl" => (GLSL_VS, "glsl".to_string()),
        _ => (
            HLSL_VS,
            rs.capabilities()
                .shader_profiles
                .iter()
                .filter(|p| p.starts_with("vs_"))
                .last()
                .cloned()
                .context("no vertex shader profile")?,
        ),
    };
    let program = managers.programs.create_and_initialize(GpuProgramDesc::new(
        source,
        "main",
        rs.shading_language_name(),
        GpuProgramType::Vertex,
        profile,
    ))?;

    let declaration = managers.buffers.create_vertex_declaration(vec![
        VertexElement::new(
            0,
            0,
            VertexElementType::Float3,
            VertexElementSemantic::Position,
            0,
        ),
        VertexElement::new(
            0,
            12,
            VertexElementType::Color,
            VertexElementSemantic::Color,
            0,
        ),
    ]);
    let vertices = managers.buffers.create_vertex_buffer(
        mem::size_of::<Vertex>() as u32,
        VERTICES.len() as u32,
        BufferUsage::Static,
    )?;
    vertices
        .buffer()
        .write_data(0, bytemuck::cast_slice(VERTICES), true)?;

    rs.set_render_target(window.clone(), false)?;
    rs.set_viewport(Rect2::FULL)?;
    rs.bind_gpu_program(&program)?;
    rs.set_vertex_declaration(declaration)?;
    rs.set_vertex_buffers(0, &[vertices])?;
    rs.set_draw_operation(DrawOperation::TriangleList)?;

    for _ in 0..FRAMES {
        rs.begin_frame()?;
        rs.clear_render_target(
            FrameBufferType::COLOR | FrameBufferType::DEPTH,
            LinearRgba::rgb(0.1, 0.2, 0.3),
            1.0,
            0,
            0xFF,
        )?;
        rs.draw(0, VERTICES.len() as u32)?;
        rs.end_frame()?;
        rs.swap_buffers(&*window)?;
    }

    let stats = rs.stats();
    log::info!(
        "{} rendered {} frames: {} draw calls, {} primitives",
        rs.name(),
        stats.frame_number,
        stats.draw_calls,
        stats.primitives
    );
    Ok(())
}
