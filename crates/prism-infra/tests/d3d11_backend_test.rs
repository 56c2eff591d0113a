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

//! Direct3D 11 input layouts, adapters and load/store bindings.

mod common;

use prism_core::renderer::{
    GpuProgramType, GpuViewUsage, RenderError, RenderSystem, RenderSystemConfig, TextureViewDesc,
};
use prism_infra::graphics::d3d11::D3D11RenderSystem;
use prism_infra::graphics::native::{BindPoint, NativeCall, NativeObjectKind};

use common::{compile_vertex_program, init_logger, window_desc, Triangle, HLSL_VS};

fn d3d11(config: RenderSystemConfig) -> D3D11RenderSystem {
    init_logger();
    D3D11RenderSystem::new(config)
}

#[test]
fn test_input_layout_is_bound_before_each_draw() {
    let mut rs = d3d11(RenderSystemConfig::default());
    rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);

    rs.draw(0, 3).expect("draw");
    rs.draw(0, 3).expect("draw");

    assert_eq!(rs.input_layouts().len(), 1);
    assert_eq!(
        rs.native_device()
            .count_calls(|c| matches!(c, NativeCall::Bind { point: BindPoint::InputLayout, .. })),
        2
    );
    assert_eq!(
        rs.native_device().live_count_of(NativeObjectKind::InputLayout),
        1
    );
}

#[test]
fn test_input_layout_cache_evicts_when_full() {
    let config = RenderSystemConfig {
        input_layout_cache_capacity: 2,
        input_layout_prune_count: 1,
        ..RenderSystemConfig::default()
    };
    let mut rs = d3d11(config);
    rs.initialize(&window_desc()).expect("initialize");
    let triangle = Triangle::new(&rs);
    triangle.bind(&mut rs);

    for _ in 0..3 {
        let program = compile_vertex_program(&rs, HLSL_VS);
        rs.bind_gpu_program(&program).expect("bind");
        rs.draw(0, 3).expect("draw");
    }

    assert_eq!(rs.input_layouts().len(), 2);
    assert_eq!(
        rs.native_device().live_count_of(NativeObjectKind::InputLayout),
        2
    );
}

#[test]
fn test_adapter_index_out_of_range() {
    let mut rs = d3d11(RenderSystemConfig {
        adapter_index: 7,
        ..RenderSystemConfig::default()
    });

    let result = rs.initialize(&window_desc());

    assert!(matches!(result, Err(RenderError::InvalidParameters(_))), "{result:?}");
}

#[test]
fn test_second_adapter_lacks_compute() {
    let mut rs = d3d11(RenderSystemConfig {
        adapter_index: 1,
        ..RenderSystemConfig::default()
    });

    rs.initialize(&window_desc()).expect("initialize");

    assert!(!rs.capabilities().supports_stage(GpuProgramType::Compute));
    assert!(rs.capabilities().supports_stage(GpuProgramType::Geometry));
}

#[test]
fn test_swap_chain_failure_is_reported() {
    let mut rs = d3d11(RenderSystemConfig::default());
    rs.native_device()
        .inject_failure(NativeObjectKind::SwapChain, "DXGI_ERROR_DEVICE_REMOVED");

    let result = rs.initialize(&window_desc());

    match result {
        Err(RenderError::RenderingApi { backend, details }) => {
            assert_eq!(backend, "D3D11RenderSystem");
            assert!(details.contains("swap chain"), "{details}");
        }
        other => panic!("expected RenderingApi, got {other:?}"),
    }
}

#[test]
fn test_load_store_texture_stage_check() {
    let mut rs = d3d11(RenderSystemConfig::default());
    rs.initialize(&window_desc()).expect("initialize");
    let surface = TextureViewDesc {
        most_detailed_mip: 0,
        num_mips: 1,
        first_array_slice: 0,
        num_array_slices: 1,
        usage: GpuViewUsage::RANDOM_WRITE,
    };

    let vertex = rs.set_load_store_texture(GpuProgramType::Vertex, 0, false, None, surface);
    let compute = rs.set_load_store_texture(GpuProgramType::Compute, 0, false, None, surface);

    assert!(matches!(vertex, Err(RenderError::InvalidParameters(_))));
    assert_eq!(compute, Ok(()));
    assert!(rs.native_device().calls().contains(&NativeCall::Bind {
        point: BindPoint::UnorderedAccess,
        stage: Some(GpuProgramType::Compute),
        slot: 0,
        handle: None,
    }));
}
