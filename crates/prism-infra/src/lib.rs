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

//! Render system backends for Prism.
//!
//! This crate provides the concrete [`RenderSystem`](prism_core::RenderSystem)
//! implementations: Direct3D 11, Direct3D 9 and OpenGL. Each backend drives
//! an emulated [`NativeDevice`](graphics::native::NativeDevice) and registers
//! itself at link time, so an application only names the backend it wants:
//!
//! ```no_run
//! use prism_core::renderer::RenderSystemConfig;
//! use prism_infra::GraphicsContext;
//!
//! let context = GraphicsContext::new(&RenderSystemConfig::default()).expect("graphics context");
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod context;
pub mod graphics;

pub use backend::{BackendRegistration, RenderBackend, RenderSystemManager};
pub use context::{ContextError, GraphicsContext};
