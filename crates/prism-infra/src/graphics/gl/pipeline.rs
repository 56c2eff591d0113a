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

//! Program pipelines combining the separable programs bound to each stage.
//!
//! Entries hold weak references to their programs. Pipelines whose programs
//! have all been dropped can never be looked up again and are pruned on the
//! next cache miss.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use prism_core::renderer::{
    GpuProgram, GpuProgramType, NativeObject, NativeResourceAllocator, ProgramId, RawHandle,
    RenderError,
};

use crate::graphics::native::{BindPoint, NativeDevice, NativeObjectKind};

type PipelineKey = [Option<ProgramId>; GpuProgramType::COUNT];

#[derive(Debug)]
struct CachedPipeline {
    programs: Vec<Weak<GpuProgram>>,
    pipeline: NativeObject,
}

impl CachedPipeline {
    fn is_alive(&self) -> bool {
        self.programs.iter().all(|p| p.strong_count() > 0)
    }
}

/// Creates and caches program pipelines keyed by the programs of every stage.
#[derive(Debug, Default)]
pub struct GlProgramPipelineManager {
    pipelines: HashMap<PipelineKey, CachedPipeline>,
}

impl GlProgramPipelineManager {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pipeline combining `programs`, indexed by stage.
    pub fn retrieve(
        &mut self,
        native: &NativeDevice,
        allocator: &Arc<dyn NativeResourceAllocator>,
        programs: &[Option<Arc<GpuProgram>>; GpuProgramType::COUNT],
    ) -> Result<RawHandle, RenderError> {
        let key: PipelineKey = std::array::from_fn(|i| programs[i].as_ref().map(|p| p.id()));
        if let Some(cached) = self.pipelines.get(&key) {
            return Ok(cached.pipeline.handle());
        }
        self.pipelines.retain(|_, cached| cached.is_alive());

        let handle = native.create(NativeObjectKind::Pipeline).map_err(|e| {
            RenderError::rendering_api(super::NAME, format!("Unable to create program pipeline: {e}"))
        })?;
        for (stage, program) in GpuProgramType::ALL.into_iter().zip(programs) {
            if let Some(program) = program {
                native.bind(BindPoint::Program, Some(stage), 0, program.native_handle());
            }
        }
        log::trace!("Created program pipeline {} for {key:?}", handle.0);
        self.pipelines.insert(
            key,
            CachedPipeline {
                programs: programs.iter().flatten().map(Arc::downgrade).collect(),
                pipeline: NativeObject::new(handle, allocator),
            },
        );
        Ok(handle)
    }

    /// The number of cached pipelines.
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns `true` if no pipeline is cached.
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Drops every pipeline.
    pub fn clear(&mut self) {
        self.pipelines.clear();
    }
}
