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

//! The OpenGL render system.
//!
//! Requires OpenGL 4.1 for separable program objects: the programs bound to
//! each stage are combined into a program pipeline at draw time.

mod context;
mod pipeline;
mod program;
mod system;
mod vao;
mod window;

pub use self::context::{GlContext, GlDriver, GlDriverList, GlVersion};
pub use self::pipeline::GlProgramPipelineManager;
pub use self::program::GlslProgramFactory;
pub use self::system::GlRenderSystem;
pub use self::vao::GlVertexArrayManager;
pub use self::window::GlRenderWindow;

/// The registered backend name.
pub const NAME: &str = "GLRenderSystem";

/// The shading language compiled by this backend.
pub const SHADING_LANGUAGE: &str = "glsl";
