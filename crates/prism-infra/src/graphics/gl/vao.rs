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

//! Vertex array objects keyed by vertex program, declaration and streams.
//!
//! A vertex array captures the attribute bindings between the streams
//! described by a declaration and the attributes a vertex program reads. The
//! same triple always maps to the same object.
//!
//! Entries hold weak references to the objects in their key and are pruned on
//! the next cache miss once any of them has been dropped.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use prism_core::renderer::{
    GpuProgram, NativeObject, NativeResourceAllocator, ProgramId, RawHandle, RenderError,
    VertexBuffer, VertexDeclaration,
};

use crate::graphics::native::{BindPoint, NativeDevice, NativeObjectKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VaoKey {
    program: ProgramId,
    declaration: u32,
    buffers: Vec<Option<u32>>,
}

#[derive(Debug)]
struct CachedVertexArray {
    program: Weak<GpuProgram>,
    declaration: Weak<VertexDeclaration>,
    buffers: Vec<Weak<VertexBuffer>>,
    vao: NativeObject,
}

impl CachedVertexArray {
    fn is_alive(&self) -> bool {
        self.program.strong_count() > 0
            && self.declaration.strong_count() > 0
            && self.buffers.iter().all(|b| b.strong_count() > 0)
    }
}

/// Creates and caches vertex array objects.
#[derive(Debug, Default)]
pub struct GlVertexArrayManager {
    objects: HashMap<VaoKey, CachedVertexArray>,
}

impl GlVertexArrayManager {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the vertex array binding `buffers` as described by
    /// `declaration` to the inputs of `program`.
    ///
    /// Returns `Ok(None)` with a warning if the declaration lacks an input
    /// the program reads or references a stream with no buffer bound.
    pub fn retrieve(
        &mut self,
        native: &NativeDevice,
        allocator: &Arc<dyn NativeResourceAllocator>,
        program: &Arc<GpuProgram>,
        declaration: &Arc<VertexDeclaration>,
        buffers: &[Option<Arc<VertexBuffer>>],
    ) -> Result<Option<RawHandle>, RenderError> {
        let key = VaoKey {
            program: program.id(),
            declaration: declaration.id(),
            buffers: buffers
                .iter()
                .map(|b| b.as_ref().map(|b| b.buffer().id()))
                .collect(),
        };
        if let Some(cached) = self.objects.get(&key) {
            return Ok(Some(cached.vao.handle()));
        }
        self.objects.retain(|_, cached| cached.is_alive());

        if let Some(inputs) = program.input_declaration() {
            let missing = declaration.missing_inputs(inputs);
            if !missing.is_empty() {
                log::warn!(
                    "Vertex buffers do not provide the inputs {missing:?} required by vertex program {}",
                    program.id().0
                );
                return Ok(None);
            }
        }

        let mut streams: Vec<usize> = declaration
            .elements()
            .iter()
            .map(|e| usize::from(e.source))
            .collect();
        streams.sort_unstable();
        streams.dedup();
        if let Some(source) = streams
            .iter()
            .find(|&&s| buffers.get(s).and_then(Option::as_ref).is_none())
        {
            log::warn!("Vertex declaration reads stream {source}, which has no buffer bound");
            return Ok(None);
        }

        let handle = native.create(NativeObjectKind::VertexArray).map_err(|e| {
            RenderError::rendering_api(super::NAME, format!("Unable to create vertex array: {e}"))
        })?;
        for &source in &streams {
            if let Some(Some(buffer)) = buffers.get(source) {
                native.bind(
                    BindPoint::VertexBuffer,
                    None,
                    source as u32,
                    Some(buffer.buffer().native_handle()),
                );
            }
        }
        log::trace!("Created vertex array {} over streams {streams:?}", handle.0);
        self.objects.insert(
            key,
            CachedVertexArray {
                program: Arc::downgrade(program),
                declaration: Arc::downgrade(declaration),
                buffers: buffers.iter().flatten().map(Arc::downgrade).collect(),
                vao: NativeObject::new(handle, allocator),
            },
        );
        Ok(Some(handle))
    }

    /// The number of cached vertex arrays.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if no vertex array is cached.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drops every vertex array.
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
