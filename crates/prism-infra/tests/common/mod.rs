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

//! Shared fixtures for the backend integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use prism_core::renderer::{
    BufferUsage, GpuProgram, GpuProgramDesc, GpuProgramType, RenderManagers, RenderSystem,
    RenderSystemConfig, RenderWindowDesc, VertexBuffer, VertexDeclaration, VertexElement,
    VertexElementSemantic, VertexElementType, VideoMode,
};

/// A position-only vertex program in HLSL.
pub const HLSL_VS: &str = r#"
    float4 main(float3 pos : POSITION) : SV_Position { return float4(pos, 1.0); }
"#;

/// A position-only vertex program in GLSL.
pub const GLSL_VS: &str = r#"
    #version 410
    layout(location = 0) in vec3 bs_position;
    void main() { gl_Position = vec4(bs_position, 1.0); }
"#;

/// An 800x600 window with a depth buffer.
pub fn window_desc() -> RenderWindowDesc {
    RenderWindowDesc {
        title: "Prism Test".to_string(),
        video_mode: VideoMode::new(800, 600),
        ..RenderWindowDesc::default()
    }
}

/// A config that prefers only `backend`.
pub fn config_for(backend: &str) -> RenderSystemConfig {
    RenderSystemConfig {
        preferred_backends: vec![backend.to_string()],
        ..RenderSystemConfig::default()
    }
}

/// Installs the test logger once per process.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn managers(rs: &dyn RenderSystem) -> &RenderManagers {
    rs.managers().expect("render system is initialized")
}

/// The highest vertex profile the backend accepts.
pub fn vertex_profile(rs: &dyn RenderSystem) -> String {
    if rs.shading_language_name() == "glsl" {
        return "glsl".to_string();
    }
    rs.capabilities()
        .shader_profiles
        .iter()
        .filter(|p| p.starts_with("vs_"))
        .last()
        .cloned()
        .expect("a vertex profile")
}

/// Compiles a vertex program from `source` in the backend's language.
pub fn compile_vertex_program(rs: &dyn RenderSystem, source: &str) -> Arc<GpuProgram> {
    let desc = GpuProgramDesc::new(
        source,
        "main",
        rs.shading_language_name(),
        GpuProgramType::Vertex,
        vertex_profile(rs),
    );
    managers(rs)
        .programs
        .create_and_initialize(desc)
        .expect("vertex program compiles")
}

/// Compiles the position-only vertex program for the backend's language.
pub fn vertex_program(rs: &dyn RenderSystem) -> Arc<GpuProgram> {
    let source = if rs.shading_language_name() == "glsl" {
        GLSL_VS
    } else {
        HLSL_VS
    };
    compile_vertex_program(rs, source)
}

/// Everything needed to draw one triangle.
pub struct Triangle {
    pub program: Arc<GpuProgram>,
    pub declaration: Arc<VertexDeclaration>,
    pub vertices: Arc<VertexBuffer>,
}

impl Triangle {
    pub fn new(rs: &dyn RenderSystem) -> Self {
        let managers = managers(rs);
        let declaration = managers.buffers.create_vertex_declaration(vec![VertexElement::new(
            0,
            0,
            VertexElementType::Float3,
            VertexElementSemantic::Position,
            0,
        )]);
        let vertices = managers
            .buffers
            .create_vertex_buffer(12, 3, BufferUsage::Static)
            .expect("vertex buffer");
        Self {
            program: vertex_program(rs),
            declaration,
            vertices,
        }
    }

    /// Binds the program, declaration and stream 0.
    pub fn bind(&self, rs: &mut dyn RenderSystem) {
        rs.bind_gpu_program(&self.program).expect("bind program");
        rs.set_vertex_declaration(self.declaration.clone())
            .expect("set declaration");
        rs.set_vertex_buffers(0, std::slice::from_ref(&self.vertices))
            .expect("set vertex buffers");
    }
}
