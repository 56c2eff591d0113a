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

//! Behavior every backend shares, exercised through the registry.

mod common;

use std::sync::Arc;

use approx::assert_relative_eq;
use prism_core::math::{LinearRgba, Mat4, Rect2, Rect2I};
use prism_core::renderer::{
    DrawOperation, FrameBufferType, GpuParamDataDesc, GpuParamDataType, GpuResource,
    GpuResourceData, Lifecycle, ParamLocation, RenderError, RenderSystem, TextureDesc,
    VertexElement, VertexElementSemantic, VertexElementType,
};
use prism_infra::graphics::native::{NativeCall, NativeObjectKind};
use prism_infra::{RenderBackend, RenderSystemManager};

use common::{config_for, init_logger, managers, window_desc, Triangle};

const BACKENDS: [&str; 3] = ["D3D11RenderSystem", "D3D9RenderSystem", "GLRenderSystem"];

fn create(name: &str) -> RenderBackend {
    init_logger();
    RenderSystemManager::create(name, &config_for(name)).expect("registered backend")
}

// ─────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_calls_before_initialize_are_rejected() {
    for name in BACKENDS {
        let mut rs = create(name);
        assert_eq!(
            rs.set_viewport(Rect2::FULL),
            Err(RenderError::NotInitialized),
            "{name}"
        );
        assert_eq!(rs.state().lifecycle(), Lifecycle::Uninitialized);
    }
}

#[test]
fn test_initialize_twice_is_invalid() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("first initialize");

        let second = rs.initialize(&window_desc());

        assert!(
            matches!(second, Err(RenderError::InvalidState { .. })),
            "{name}: {second:?}"
        );
    }
}

#[test]
fn test_destroy_rejects_further_calls() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("initialize");

        rs.destroy().expect("destroy");

        assert_eq!(rs.state().lifecycle(), Lifecycle::Destroyed);
        assert_eq!(rs.draw(0, 3), Err(RenderError::NotInitialized), "{name}");
        assert_eq!(rs.destroy(), Err(RenderError::NotInitialized), "{name}");
    }
}

#[test]
fn test_render_target_cannot_change_inside_a_frame() {
    for name in BACKENDS {
        let mut rs = create(name);
        let window = rs.initialize(&window_desc()).expect("initialize");
        rs.begin_frame().expect("begin frame");

        let result = rs.set_render_target(window.clone(), false);

        assert!(
            matches!(result, Err(RenderError::InvalidState { .. })),
            "{name}: {result:?}"
        );
        rs.end_frame().expect("end frame");
        assert_eq!(rs.stats().frame_number, 1);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-backend properties
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_backend_names_and_languages() {
    let expected = [
        ("D3D11RenderSystem", "hlsl"),
        ("D3D9RenderSystem", "hlsl"),
        ("GLRenderSystem", "glsl"),
    ];
    for (name, language) in expected {
        let rs = create(name);
        assert_eq!(rs.name(), name);
        assert_eq!(rs.shading_language_name(), language);
    }
}

#[test]
fn test_vertex_color_types() {
    assert_eq!(
        create("D3D11RenderSystem").color_vertex_element_type(),
        VertexElementType::ColorAbgr
    );
    assert_eq!(
        create("D3D9RenderSystem").color_vertex_element_type(),
        VertexElementType::ColorArgb
    );
    assert_eq!(
        create("GLRenderSystem").color_vertex_element_type(),
        VertexElementType::ColorAbgr
    );
}

#[test]
fn test_texel_offsets_and_depth_range() {
    let d3d9 = create("D3D9RenderSystem");
    assert_relative_eq!(d3d9.horizontal_texel_offset(), -0.5);
    assert_relative_eq!(d3d9.vertical_texel_offset(), -0.5);

    let d3d11 = create("D3D11RenderSystem");
    assert_relative_eq!(d3d11.horizontal_texel_offset(), 0.0);
    assert_relative_eq!(d3d11.minimum_depth_input_value(), 0.0);
    assert_relative_eq!(d3d11.maximum_depth_input_value(), 1.0);

    let gl = create("GLRenderSystem");
    assert_relative_eq!(gl.minimum_depth_input_value(), -1.0);
    assert_relative_eq!(gl.maximum_depth_input_value(), 1.0);
}

#[test]
fn test_projection_conventions() {
    let projection = Mat4::IDENTITY;

    assert_eq!(
        create("GLRenderSystem").convert_projection_matrix(&projection),
        projection
    );
    for name in ["D3D11RenderSystem", "D3D9RenderSystem"] {
        let converted = create(name).convert_projection_matrix(&projection);
        assert_ne!(converted, projection, "{name} remaps depth to [0, 1]");
    }
}

#[test]
fn test_param_block_locations() {
    let mut params = vec![
        GpuParamDataDesc::new("gWorld", GpuParamDataType::Matrix4x4, 1),
        GpuParamDataDesc::new("gTime", GpuParamDataType::Float1, 1),
    ];

    create("D3D9RenderSystem").generate_param_block_desc("PerObject", &mut params);
    assert!(params
        .iter()
        .all(|p| matches!(p.location, ParamLocation::Packed { .. })));

    create("GLRenderSystem").generate_param_block_desc("PerObject", &mut params);
    assert!(params
        .iter()
        .all(|p| matches!(p.location, ParamLocation::Block { .. })));
}

#[test]
fn test_d3d11_rejects_triangle_fans() {
    let mut rs = create("D3D11RenderSystem");
    rs.initialize(&window_desc()).expect("initialize");

    let result = rs.set_draw_operation(DrawOperation::TriangleFan);

    assert!(matches!(result, Err(RenderError::Unsupported(_))));
    assert_eq!(rs.state().draw_operation, DrawOperation::TriangleList);
}

// ─────────────────────────────────────────────────────────────────────────────
// Drawing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_triangle_on_800x600_window() {
    for name in BACKENDS {
        let mut rs = create(name);
        let window = rs.initialize(&window_desc()).expect("initialize");
        let triangle = Triangle::new(&rs);

        rs.set_render_target(window.clone(), false)
            .expect("set render target");
        rs.set_viewport(Rect2::FULL).expect("set viewport");
        triangle.bind(&mut rs);
        rs.set_draw_operation(DrawOperation::TriangleList)
            .expect("set draw operation");
        rs.begin_frame().expect("begin frame");
        rs.clear_render_target(FrameBufferType::COLOR, LinearRgba::BLACK, 1.0, 0, 0xFF)
            .expect("clear");
        rs.draw(0, 3).expect("draw");
        rs.end_frame().expect("end frame");

        let calls = rs.native_device().calls();
        assert!(
            calls.contains(&NativeCall::SetViewport(Rect2I::new(0, 0, 800, 600))),
            "{name}"
        );
        assert!(
            calls.contains(&NativeCall::Draw {
                vertex_offset: 0,
                vertex_count: 3
            }),
            "{name}"
        );
        let stats = rs.stats();
        assert_eq!(stats.draw_calls, 1, "{name}");
        assert_eq!(stats.vertices, 3, "{name}");
        assert_eq!(stats.primitives, 1, "{name}");
        assert_eq!(stats.clears, 1, "{name}");
        assert_eq!(stats.frame_number, 1, "{name}");
    }
}

#[test]
fn test_draw_without_program_is_skipped() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("initialize");

        rs.draw(0, 3).expect("a skipped draw is not an error");

        assert_eq!(rs.stats().draw_calls, 0, "{name}");
        assert_eq!(
            rs.native_device()
                .count_calls(|c| matches!(c, NativeCall::Draw { .. })),
            0,
            "{name}"
        );
    }
}

#[test]
fn test_draw_with_missing_vertex_input_is_dropped() {
    // D3D9 binds declarations without matching them against shader inputs.
    for name in ["D3D11RenderSystem", "GLRenderSystem"] {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("initialize");
        let triangle = Triangle::new(&rs);
        let normals_only = managers(&rs)
            .buffers
            .create_vertex_declaration(vec![VertexElement::new(
                0,
                0,
                VertexElementType::Float3,
                VertexElementSemantic::Normal,
                0,
            )]);
        triangle.bind(&mut rs);
        rs.set_vertex_declaration(normals_only)
            .expect("set declaration");

        rs.draw(0, 3).expect("a dropped draw is not an error");

        let stats = rs.stats();
        assert_eq!(stats.draw_calls, 0, "{name}");
        assert_eq!(stats.vertices, 0, "{name}");
        assert_eq!(
            rs.native_device()
                .count_calls(|c| matches!(c, NativeCall::Draw { .. })),
            0,
            "{name}"
        );
    }
}

#[test]
fn test_draw_indexed_requires_an_index_buffer() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("initialize");
        let triangle = Triangle::new(&rs);
        triangle.bind(&mut rs);

        let result = rs.draw_indexed(0, 3, 0, 3);

        assert!(
            matches!(result, Err(RenderError::InvalidParameters(_))),
            "{name}: {result:?}"
        );
    }
}

#[test]
fn test_clear_without_target_is_a_no_op() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("initialize");

        rs.clear_render_target(FrameBufferType::COLOR, LinearRgba::BLACK, 1.0, 0, 0xFF)
            .expect("clear");

        assert_eq!(rs.stats().clears, 0, "{name}");
        assert_eq!(
            rs.native_device()
                .count_calls(|c| matches!(c, NativeCall::Clear { .. })),
            0,
            "{name}"
        );
    }
}

#[test]
fn test_clear_viewport_restricts_to_partial_viewports() {
    let half = Rect2I::new(0, 0, 400, 300);
    for name in BACKENDS {
        let mut rs = create(name);
        let window = rs.initialize(&window_desc()).expect("initialize");
        rs.set_render_target(window.clone(), false)
            .expect("set render target");

        rs.set_viewport(Rect2::new(0.0, 0.0, 0.5, 0.5))
            .expect("set viewport");
        rs.clear_viewport(FrameBufferType::COLOR, LinearRgba::BLACK, 1.0, 0, 0xFF)
            .expect("partial clear");
        let partial = rs
            .native_device()
            .count_calls(|c| matches!(c, NativeCall::Clear { area: Some(a), .. } if *a == half));

        let whole_target =
            |c: &NativeCall| matches!(c, NativeCall::Clear { area: None, .. });
        let full_before = rs.native_device().count_calls(whole_target);
        rs.set_viewport(Rect2::FULL).expect("set viewport");
        rs.clear_viewport(FrameBufferType::COLOR, LinearRgba::BLACK, 1.0, 0, 0xFF)
            .expect("full clear");
        let full_after = rs.native_device().count_calls(whole_target);

        assert!(partial > 0, "{name}");
        assert_eq!(full_before, 0, "{name}");
        assert!(full_after > full_before, "{name}");
        assert_eq!(rs.stats().clears, 2, "{name}");
    }
}

#[test]
fn test_vertex_stream_limit() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("initialize");
        let triangle = Triangle::new(&rs);
        let max = rs.capabilities().max_bound_vertex_buffers;

        let result = rs.set_vertex_buffers(max, &[triangle.vertices.clone()]);

        assert!(
            matches!(result, Err(RenderError::InvalidParameters(_))),
            "{name}: {result:?}"
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_window_creation_failure_surfaces_as_rendering_api_error() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.native_device()
            .inject_failure(NativeObjectKind::Window, "no display");

        let result = rs.initialize(&window_desc());

        assert!(
            matches!(result, Err(RenderError::RenderingApi { .. })),
            "{name}: {result:?}"
        );
        assert_eq!(rs.state().lifecycle(), Lifecycle::Uninitialized, "{name}");
    }
}

#[test]
fn test_destroy_releases_native_objects() {
    for name in BACKENDS {
        let mut rs = create(name);
        let window = rs.initialize(&window_desc()).expect("initialize");
        let native = Arc::clone(rs.native_device());

        rs.destroy().expect("destroy");
        drop(window);
        drop(rs);

        assert_eq!(native.live_count(), 0, "{name}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subresources
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_texture_subresource_write_then_read() {
    for name in BACKENDS {
        let mut rs = create(name);
        rs.initialize(&window_desc()).expect("initialize");
        let texture = common::managers(&rs)
            .buffers
            .create_texture(TextureDesc::default())
            .expect("texture");
        let resource = GpuResource::Texture(texture);
        let mut upload = GpuResourceData::new(vec![1, 2, 3, 4]);
        upload.lock();

        let written = pollster::block_on(rs.write_subresource(&resource, 0, upload, false).wait())
            .expect("write");
        let mut readback = GpuResourceData::zeroed(4);
        readback.lock();
        let read = pollster::block_on(rs.read_subresource(&resource, 0, readback).wait())
            .expect("read");

        assert!(!written.is_locked(), "{name}");
        assert_eq!(read.bytes(), &[1, 2, 3, 4], "{name}");
    }
}

#[test]
fn test_unlocked_data_is_rejected() {
    let mut rs = create("D3D11RenderSystem");
    rs.initialize(&window_desc()).expect("initialize");
    let texture = common::managers(&rs)
        .buffers
        .create_texture(TextureDesc::default())
        .expect("texture");

    let result = pollster::block_on(
        rs.write_subresource(
            &GpuResource::Texture(texture),
            0,
            GpuResourceData::new(vec![0; 4]),
            false,
        )
        .wait(),
    );

    assert!(matches!(result, Err(RenderError::InvalidParameters(_))));
}
