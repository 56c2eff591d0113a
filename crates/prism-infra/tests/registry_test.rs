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

//! Backend registration and graphics context lifetime.

mod common;

use prism_core::renderer::{ConfigError, Lifecycle, RenderSystem, RenderSystemConfig};
use prism_infra::graphics::native::NativeObjectKind;
use prism_infra::{ContextError, GraphicsContext, RenderBackend, RenderSystemManager};

use common::{config_for, init_logger, window_desc};

#[test]
fn test_every_backend_is_registered() {
    let names = RenderSystemManager::available_backends();

    for name in ["D3D11RenderSystem", "D3D9RenderSystem", "GLRenderSystem"] {
        assert!(names.contains(&name), "{name} missing from {names:?}");
    }
}

#[test]
fn test_registrations_name_their_plugin() {
    let plugins: Vec<&str> = RenderSystemManager::registrations()
        .map(|r| r.plugin_name)
        .collect();

    assert!(plugins.contains(&"prism-d3d11"));
    assert!(plugins.contains(&"prism-d3d9"));
    assert!(plugins.contains(&"prism-gl"));
}

#[test]
fn test_unknown_backend_name() {
    let result = RenderSystemManager::create("MetalRenderSystem", &RenderSystemConfig::default());

    assert!(matches!(result, Err(ConfigError::UnknownBackend(_))));
}

#[test]
fn test_default_config_prefers_d3d11() {
    init_logger();

    let backend = RenderSystemManager::create_preferred(&RenderSystemConfig::default())
        .expect("a preferred backend");

    assert!(matches!(backend, RenderBackend::D3D11(_)));
    assert_eq!(backend.state().lifecycle(), Lifecycle::Uninitialized);
}

#[test]
fn test_config_file_selects_backend() {
    let config = RenderSystemConfig::from_json_str(
        r#"{ "preferred_backends": ["GLRenderSystem"], "primary_window": { "title": "From JSON" } }"#,
    )
    .expect("valid config");

    let context = GraphicsContext::new(&config).expect("context");

    assert_eq!(context.backend().name(), "GLRenderSystem");
    let window = context.primary_window().expect("primary window");
    assert_eq!(window.desc().title, "From JSON");
}

#[test]
fn test_context_initialization_failure() {
    init_logger();
    let backend = RenderSystemManager::create("D3D9RenderSystem", &config_for("D3D9RenderSystem"))
        .expect("registered");
    backend
        .native_device()
        .inject_failure(NativeObjectKind::Device, "no adapter");

    let result = GraphicsContext::from_backend(backend, &window_desc());

    assert!(matches!(result, Err(ContextError::Render(_))));
}

#[test]
fn test_context_teardown_releases_everything() {
    for name in ["D3D11RenderSystem", "D3D9RenderSystem", "GLRenderSystem"] {
        let context = GraphicsContext::new(&config_for(name)).expect("context");
        let native = context.backend().native_device().clone();
        assert!(native.live_count() > 0);

        drop(context);

        assert_eq!(native.live_count(), 0, "{name}");
    }
}
