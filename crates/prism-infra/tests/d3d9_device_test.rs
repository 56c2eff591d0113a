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

//! Direct3D 9 device loss, reset and redundant state filtering.

mod common;

use std::sync::Arc;

use prism_core::math::LinearRgba;
use prism_core::renderer::{
    FrameBufferType, GpuProgramType, GpuViewUsage, NativeHandleKind, RenderError, RenderSystem,
    RenderTarget, TextureViewDesc,
};
use prism_infra::graphics::d3d9::D3D9RenderSystem;
use prism_infra::graphics::native::{BindPoint, NativeCall, NativeObjectKind};

use common::{config_for, init_logger, window_desc, Triangle};

fn d3d9() -> D3D9RenderSystem {
    init_logger();
    D3D9RenderSystem::new(config_for("D3D9RenderSystem"))
}

fn applied(rs: &D3D9RenderSystem, point: BindPoint) -> usize {
    rs.native_device()
        .count_calls(|c| matches!(c, NativeCall::ApplyState { point: p, .. } if *p == point))
}

// ─────────────────────────────────────────────────────────────────────────────
// Device loss
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_lost_device_is_restored_at_next_frame() {
    let mut rs = d3d9();
    let window = rs.initialize(&window_desc()).expect("initialize");
    let manager = Arc::clone(rs.device_manager().expect("device manager"));

    manager.device().simulate_device_lost();
    window.swap_buffers().expect("present while lost is skipped");
    assert!(window.native_handle(NativeHandleKind::BackBuffer).is_none());

    rs.begin_frame().expect("begin frame resets the device");

    assert!(!manager.device().is_lost());
    assert!(window.native_handle(NativeHandleKind::BackBuffer).is_some());
    assert_eq!(
        rs.native_device().count_calls(|c| *c == NativeCall::Reset),
        1
    );
}

#[test]
fn test_failed_reset_reports_device_lost_and_retries() {
    let mut rs = d3d9();
    let window = rs.initialize(&window_desc()).expect("initialize");
    let manager = Arc::clone(rs.device_manager().expect("device manager"));
    manager.notify_on_device_lost();
    rs.native_device()
        .inject_failure(NativeObjectKind::Texture, "out of video memory");

    let first = rs.begin_frame();

    assert_eq!(first, Err(RenderError::DeviceLost));
    assert!(manager.device().is_lost());
    assert!(window.native_handle(NativeHandleKind::BackBuffer).is_none());

    rs.begin_frame().expect("second reset succeeds");

    assert!(!manager.device().is_lost());
    assert!(window.native_handle(NativeHandleKind::BackBuffer).is_some());
}

#[test]
fn test_draws_and_clears_are_skipped_while_lost() {
    let mut rs = d3d9();
    let window = rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    rs.set_render_target(window.clone(), false)
        .expect("set render target");
    triangle.bind(&mut rs);
    rs.device_manager()
        .expect("device manager")
        .device()
        .simulate_device_lost();

    rs.clear_render_target(FrameBufferType::COLOR, LinearRgba::BLACK, 1.0, 0, 0xFF)
        .expect("clear");
    rs.draw(0, 3).expect("draw");

    assert_eq!(rs.stats().draw_calls, 0);
    assert_eq!(rs.stats().clears, 0);
}

#[test]
fn test_resize_resets_the_device() {
    let mut rs = d3d9();
    let window = rs.initialize(&window_desc()).expect("initialize");

    window.resize(1024, 768).expect("resize");

    assert_eq!(window.properties().width, 1024);
    assert_eq!(
        rs.native_device().count_calls(|c| *c == NativeCall::Reset),
        1
    );
    assert!(window.native_handle(NativeHandleKind::BackBuffer).is_some());
}

// ─────────────────────────────────────────────────────────────────────────────
// Redundant state filtering
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_redundant_state_is_applied_once() {
    let mut rs = d3d9();
    rs.initialize(&window_desc()).expect("initialize");
    let blend = common::managers(&rs).states.default_blend_state();

    rs.set_blend_state(&blend).expect("first");
    rs.set_blend_state(&blend).expect("second");

    assert_eq!(applied(&rs, BindPoint::BlendState), 1);
    assert_eq!(rs.stats().blend_state_changes, 2);
}

#[test]
fn test_reset_invalidates_applied_states() {
    let mut rs = d3d9();
    rs.initialize(&window_desc()).expect("initialize");
    let blend = common::managers(&rs).states.default_blend_state();
    rs.set_blend_state(&blend).expect("before reset");

    rs.device_manager()
        .expect("device manager")
        .reset_device()
        .expect("reset");
    rs.set_blend_state(&blend).expect("after reset");

    assert_eq!(applied(&rs, BindPoint::BlendState), 2);
}

#[test]
fn test_stencil_ref_is_only_sent_on_change() {
    let mut rs = d3d9();
    rs.initialize(&window_desc()).expect("initialize");
    let depth = common::managers(&rs).states.default_depth_stencil_state();

    rs.set_depth_stencil_state(&depth, 3).expect("first");
    rs.set_depth_stencil_state(&depth, 3).expect("second");

    assert_eq!(
        rs.native_device()
            .count_calls(|c| matches!(c, NativeCall::SetStencilRef(_))),
        1
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Stages and parameters
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_only_vertex_and_fragment_stages_exist() {
    let mut rs = d3d9();
    rs.initialize(&window_desc()).expect("initialize");
    let sampler = common::managers(&rs).states.default_sampler_state();

    for stage in [
        GpuProgramType::Geometry,
        GpuProgramType::Hull,
        GpuProgramType::Domain,
        GpuProgramType::Compute,
    ] {
        let result = rs.set_sampler_state(stage, 0, &sampler);
        assert!(
            matches!(result, Err(RenderError::InvalidParameters(_))),
            "{stage:?}: {result:?}"
        );
    }
    rs.set_sampler_state(GpuProgramType::Fragment, 0, &sampler)
        .expect("fragment sampler");
}

#[test]
fn test_load_store_textures_are_unsupported() {
    let mut rs = d3d9();
    rs.initialize(&window_desc()).expect("initialize");

    let result = rs.set_load_store_texture(
        GpuProgramType::Fragment,
        0,
        false,
        None,
        TextureViewDesc {
            most_detailed_mip: 0,
            num_mips: 1,
            first_array_slice: 0,
            num_array_slices: 1,
            usage: GpuViewUsage::RANDOM_WRITE,
        },
    );

    assert!(matches!(result, Err(RenderError::Unsupported(_))));
}

#[test]
fn test_param_buffer_needs_a_bound_program() {
    let mut rs = d3d9();
    rs.initialize(&window_desc()).expect("initialize");
    let buffer = common::managers(&rs)
        .buffers
        .create_param_block_buffer(64, Default::default())
        .expect("param buffer");

    let result = rs.set_param_buffer(GpuProgramType::Vertex, 0, &buffer, &Default::default());

    assert!(matches!(result, Err(RenderError::InvalidParameters(_))));
}
