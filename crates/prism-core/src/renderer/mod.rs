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

//! Provides the public, backend-agnostic rendering contracts.
//!
//! This module defines the "common language" for all rendering operations: the
//! [`RenderSystem`] trait every backend implements, the generic resources
//! (buffers, textures, views, state objects, programs) that backends realize
//! natively, and the state every backend shares. The concrete backends live in
//! the `prism-infra` crate.

pub mod api;
pub mod error;
pub mod hardware_buffer_manager;
pub mod managers;
pub mod state;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::error::{ConfigError, RenderError, ShaderError};
pub use self::hardware_buffer_manager::HardwareBufferManager;
pub use self::managers::RenderManagers;
pub use self::state::{Lifecycle, RenderSystemState};
pub use self::traits::{NativeResourceAllocator, RenderSystem};
