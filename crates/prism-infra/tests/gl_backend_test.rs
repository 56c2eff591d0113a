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

//! OpenGL object caches, clip planes and uniform uploads.

mod common;

use std::sync::Arc;

use prism_core::math::Plane;
use prism_core::renderer::{
    BufferUsage, GpuProgramType, RenderError, RenderSystem, RenderTextureDesc,
};
use prism_infra::graphics::gl::{GlDriver, GlDriverList, GlRenderSystem, GlVersion};
use prism_infra::graphics::native::{BindPoint, NativeCall, NativeObjectKind};

use common::{compile_vertex_program, config_for, init_logger, window_desc, Triangle};

const GLSL_PARAMS_VS: &str = r#"
    #version 410
    in vec3 bs_position;

    uniform mat4 gMatViewProj;
    uniform float gTime;

    layout(std140, binding = 1) uniform PerCamera
    {
        vec3 gViewDir;
        float gNear;
    };

    void main() { gl_Position = gMatViewProj * vec4(bs_position, gTime); }
"#;

fn gl() -> GlRenderSystem {
    init_logger();
    GlRenderSystem::new(config_for("GLRenderSystem"))
}

fn creations(rs: &GlRenderSystem, kind: NativeObjectKind) -> usize {
    rs.native_device()
        .count_calls(|c| matches!(c, NativeCall::Create { kind: k, .. } if *k == kind))
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver requirements
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_old_drivers_are_rejected() {
    init_logger();
    let mut old: GlDriver = GlDriverList::enumerate()
        .item(0)
        .cloned()
        .expect("a GL driver");
    old.version = GlVersion::new(3, 3);
    let mut rs = GlRenderSystem::with_drivers(
        config_for("GLRenderSystem"),
        GlDriverList::new(vec![old]),
    );

    let result = rs.initialize(&window_desc());

    assert!(matches!(result, Err(RenderError::Unsupported(_))), "{result:?}");
}

#[test]
fn test_initialize_makes_the_primary_context_current() {
    let mut rs = gl();

    rs.initialize(&window_desc()).expect("initialize");

    assert_eq!(
        rs.native_device()
            .count_calls(|c| matches!(c, NativeCall::MakeCurrent { .. })),
        1
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Object caches
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_pipeline_and_vertex_array_are_reused_across_draws() {
    let mut rs = gl();
    let window = rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    rs.set_render_target(window.clone(), false)
        .expect("set render target");
    triangle.bind(&mut rs);

    rs.draw(0, 3).expect("first draw");
    rs.draw(0, 3).expect("second draw");

    assert_eq!(rs.pipelines().len(), 1);
    assert_eq!(rs.vertex_arrays().len(), 1);
    assert_eq!(creations(&rs, NativeObjectKind::Pipeline), 1);
    assert_eq!(creations(&rs, NativeObjectKind::VertexArray), 1);
    assert_eq!(rs.stats().draw_calls, 2);
}

#[test]
fn test_new_program_builds_a_new_pipeline() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);
    rs.draw(0, 3).expect("draw");

    let other = compile_vertex_program(&rs, common::GLSL_VS);
    rs.bind_gpu_program(&other).expect("bind");
    rs.draw(0, 3).expect("draw");

    assert_eq!(rs.pipelines().len(), 2);
    assert_eq!(rs.vertex_arrays().len(), 2);
}

#[test]
fn test_caches_drop_entries_of_dropped_programs() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);
    rs.draw(0, 3).expect("draw");
    let first = Arc::downgrade(&triangle.program);

    let replacement = compile_vertex_program(&rs, common::GLSL_VS);
    rs.bind_gpu_program(&replacement).expect("bind");
    drop(triangle);
    rs.draw(0, 3).expect("draw");

    assert_eq!(first.strong_count(), 0);
    assert_eq!(rs.pipelines().len(), 1);
    assert_eq!(rs.vertex_arrays().len(), 1);
    assert_eq!(rs.native_device().live_count_of(NativeObjectKind::Pipeline), 1);
    assert_eq!(rs.native_device().live_count_of(NativeObjectKind::VertexArray), 1);
}

#[test]
fn test_vertex_arrays_of_dropped_buffers_are_pruned() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);
    rs.draw(0, 3).expect("draw");

    let streamed = common::managers(&rs)
        .buffers
        .create_vertex_buffer(12, 3, BufferUsage::Dynamic)
        .expect("vertex buffer");
    rs.set_vertex_buffers(0, std::slice::from_ref(&streamed))
        .expect("set vertex buffers");
    let Triangle { vertices, .. } = triangle;
    drop(vertices);
    rs.draw(0, 3).expect("draw");

    assert_eq!(rs.vertex_arrays().len(), 1);
    assert_eq!(rs.pipelines().len(), 1);
    assert_eq!(rs.native_device().live_count_of(NativeObjectKind::VertexArray), 1);
}

#[test]
fn test_render_texture_framebuffer_is_cached() {
    let mut rs = gl();
    let window = rs.initialize(&window_desc()).expect("initialize");
    let texture = rs
        .create_render_texture(RenderTextureDesc::default())
        .expect("render texture");

    rs.set_render_target(texture.clone(), false).expect("first");
    rs.set_render_target(window.clone(), false).expect("window");
    rs.set_render_target(texture.clone(), false).expect("again");

    assert_eq!(rs.framebuffer_count(), 1);
    assert_eq!(creations(&rs, NativeObjectKind::Framebuffer), 1);
    assert!(rs.native_device().calls().contains(&NativeCall::Bind {
        point: BindPoint::Framebuffer,
        stage: None,
        slot: 0,
        handle: None,
    }));
}

#[test]
fn test_dead_render_texture_framebuffers_are_pruned() {
    let mut rs = gl();
    let window = rs.initialize(&window_desc()).expect("initialize");
    let first = rs
        .create_render_texture(RenderTextureDesc::default())
        .expect("render texture");
    rs.set_render_target(first.clone(), false).expect("first");
    rs.set_render_target(window.clone(), false).expect("window");
    drop(first);

    let second = rs
        .create_render_texture(RenderTextureDesc::default())
        .expect("render texture");
    rs.set_render_target(second.clone(), false).expect("second");

    assert_eq!(rs.framebuffer_count(), 1);
    assert_eq!(rs.native_device().live_count_of(NativeObjectKind::Framebuffer), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Clip planes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_clip_planes_are_enabled_at_draw() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);

    rs.set_clip_planes(vec![Plane::new(0.0, 1.0, 0.0, 0.0); 3])
        .expect("set clip planes");
    rs.draw(0, 3).expect("draw");
    rs.draw(0, 3).expect("draw");

    assert_eq!(
        rs.native_device()
            .count_calls(|c| *c == NativeCall::EnableClipDistances(3)),
        1
    );
}

#[test]
fn test_too_many_clip_planes_fail_the_draw() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);

    rs.set_clip_planes(vec![Plane::new(1.0, 0.0, 0.0, 0.0); 9])
        .expect("set clip planes");
    let result = rs.draw(0, 3);

    assert!(matches!(result, Err(RenderError::RenderingApi { .. })), "{result:?}");
    assert_eq!(rs.stats().draw_calls, 0);
    assert!(rs.state().clip_planes_dirty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameters
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_uniform_block_slot_binds_the_buffer() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let program = compile_vertex_program(&rs, GLSL_PARAMS_VS);
    let params = program.params().cloned().expect("reflected params");
    rs.bind_gpu_program(&program).expect("bind");
    let buffer = common::managers(&rs)
        .buffers
        .create_param_block_buffer(256, BufferUsage::Dynamic)
        .expect("param buffer");

    rs.set_param_buffer(GpuProgramType::Vertex, 1, &buffer, &params)
        .expect("set param buffer");

    assert!(rs.native_device().calls().contains(&NativeCall::Bind {
        point: BindPoint::ConstantBuffer,
        stage: None,
        slot: 1,
        handle: Some(buffer.buffer().native_handle()),
    }));
    assert_eq!(
        rs.native_device()
            .count_calls(|c| matches!(c, NativeCall::SetUniform { .. })),
        0
    );
}

#[test]
fn test_loose_uniforms_are_uploaded_individually() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let program = compile_vertex_program(&rs, GLSL_PARAMS_VS);
    let params = program.params().cloned().expect("reflected params");
    rs.bind_gpu_program(&program).expect("bind");
    let buffer = common::managers(&rs)
        .buffers
        .create_param_block_buffer(256, BufferUsage::Dynamic)
        .expect("param buffer");

    rs.set_param_buffer(GpuProgramType::Vertex, 0, &buffer, &params)
        .expect("set param buffer");

    let uploads: Vec<NativeCall> = rs
        .native_device()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, NativeCall::SetUniform { .. }))
        .collect();
    assert_eq!(uploads.len(), 2);
    assert!(matches!(uploads[0], NativeCall::SetUniform { offset: 0, .. }));
    assert_eq!(rs.stats().param_buffer_binds, 1);
}

#[test]
fn test_uniform_block_slot_out_of_range() {
    let mut rs = gl();
    rs.initialize(&window_desc()).expect("initialize");
    let program = compile_vertex_program(&rs, GLSL_PARAMS_VS);
    rs.bind_gpu_program(&program).expect("bind");
    let buffer = common::managers(&rs)
        .buffers
        .create_param_block_buffer(256, BufferUsage::Dynamic)
        .expect("param buffer");

    let result = rs.set_param_buffer(GpuProgramType::Vertex, 14, &buffer, &Default::default());

    assert!(matches!(result, Err(RenderError::InvalidParameters(_))));
}

#[test]
fn test_context_teardown_releases_cached_objects() {
    let mut rs = gl();
    let window = rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);
    rs.draw(0, 3).expect("draw");
    let native = Arc::clone(rs.native_device());

    rs.destroy().expect("destroy");

    assert_eq!(native.live_count_of(NativeObjectKind::Pipeline), 0);
    assert_eq!(native.live_count_of(NativeObjectKind::VertexArray), 0);
    drop(window);
}
