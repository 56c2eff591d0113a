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

//! The managers a render system owns.

use super::api::{GpuProgramManager, RenderStateManager};
use super::hardware_buffer_manager::HardwareBufferManager;

/// Every manager owned by one render system.
///
/// Field order is drop order: programs and buffers release their native
/// objects before the state manager drops the default states.
#[derive(Debug)]
pub struct RenderManagers {
    /// GPU program factories.
    pub programs: GpuProgramManager,
    /// Buffers, textures and vertex declarations.
    pub buffers: HardwareBufferManager,
    /// Pipeline state objects.
    pub states: RenderStateManager,
}

impl RenderManagers {
    /// Bundles a buffer manager with fresh program and state managers.
    pub fn new(buffers: HardwareBufferManager) -> Self {
        Self {
            programs: GpuProgramManager::new(),
            buffers,
            states: RenderStateManager::new(),
        }
    }
}
