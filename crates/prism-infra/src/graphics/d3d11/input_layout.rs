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

//! Cache of native input layouts keyed by vertex declaration and vertex program.
//!
//! An input layout binds the streams described by a buffer declaration to the
//! inputs a vertex program reads. Deriving one is expensive, so layouts are
//! kept in a bounded cache. When the cache is full the least recently used
//! entries are evicted in one batch before the new layout is inserted.

use std::collections::HashMap;
use std::sync::Arc;

use prism_core::renderer::{
    GpuProgram, NativeObject, ProgramId, RawHandle, RenderError, VertexDeclaration,
};

use super::device::D3D11Device;
use super::mappings::{semantic_name, vertex_format, InputElementDesc};
use crate::graphics::native::NativeObjectKind;

#[derive(Debug)]
struct CachedLayout {
    layout: NativeObject,
    last_used: u64,
}

/// Creates and caches input layouts.
#[derive(Debug)]
pub struct D3D11InputLayoutManager {
    capacity: usize,
    prune_count: usize,
    entries: HashMap<(u32, ProgramId), CachedLayout>,
    counter: u64,
    warned: bool,
}

impl D3D11InputLayoutManager {
    /// Creates an empty cache holding at most `capacity` layouts and evicting
    /// `prune_count` of them at once when full.
    pub fn new(capacity: usize, prune_count: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            prune_count: prune_count.clamp(1, capacity.max(1)),
            entries: HashMap::new(),
            counter: 0,
            warned: false,
        }
    }

    /// Returns the layout binding `buffer_decl` to `program`, creating it on a miss.
    ///
    /// Returns `Ok(None)` with a warning if the buffers do not provide every
    /// input `shader_decl` requires.
    pub fn retrieve_input_layout(
        &mut self,
        device: &D3D11Device,
        shader_decl: &VertexDeclaration,
        buffer_decl: &VertexDeclaration,
        program: &GpuProgram,
    ) -> Result<Option<RawHandle>, RenderError> {
        let key = (buffer_decl.id(), program.id());

        if !self.entries.contains_key(&key) {
            if self.entries.len() >= self.capacity {
                self.evict_least_recently_used();
            }

            let missing = buffer_decl.missing_inputs(shader_decl);
            if !missing.is_empty() {
                log::warn!(
                    "Vertex buffers do not provide the inputs {missing:?} required by vertex program {}",
                    program.id().0
                );
                return Ok(None);
            }

            let layout = Self::create_layout(device, buffer_decl, program)?;
            self.entries.insert(
                key,
                CachedLayout {
                    layout,
                    last_used: 0,
                },
            );
        }

        self.counter += 1;
        let counter = self.counter;
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.last_used = counter;
                Ok(Some(entry.layout.handle()))
            }
            None => Err(RenderError::InternalError(
                "Input layout vanished from the cache".to_string(),
            )),
        }
    }

    fn create_layout(
        device: &D3D11Device,
        buffer_decl: &VertexDeclaration,
        program: &GpuProgram,
    ) -> Result<NativeObject, RenderError> {
        let microcode_len = program.compiled().map_or(0, |c| c.microcode.len());
        if microcode_len == 0 {
            return Err(RenderError::rendering_api(
                super::NAME,
                format!(
                    "Vertex program {} has no microcode to validate an input layout against",
                    program.id().0
                ),
            ));
        }

        let elements: Vec<InputElementDesc> = buffer_decl
            .elements()
            .iter()
            .map(|e| InputElementDesc {
                semantic_name: semantic_name(e.semantic),
                semantic_index: u32::from(e.index),
                format: vertex_format(e.ty),
                input_slot: u32::from(e.source),
                aligned_byte_offset: e.offset,
            })
            .collect();

        let handle = device
            .native()
            .create(NativeObjectKind::InputLayout)
            .map_err(|e| {
                RenderError::rendering_api(
                    super::NAME,
                    format!("Unable to create input layout: {e}"),
                )
            })?;
        log::trace!("Created input layout {} from {elements:?}", handle.0);
        Ok(NativeObject::new(handle, device.allocator()))
    }

    fn evict_least_recently_used(&mut self) {
        if !self.warned {
            log::warn!(
                "Input layout cache is full ({} entries); evicting the {} least recently used. \
                 Consider raising the cache capacity.",
                self.capacity,
                self.prune_count
            );
            self.warned = true;
        }

        let mut by_age: Vec<((u32, ProgramId), u64)> = self
            .entries
            .iter()
            .map(|(key, entry)| (*key, entry.last_used))
            .collect();
        by_age.sort_by_key(|(_, last_used)| *last_used);
        for (key, _) in by_age.into_iter().take(self.prune_count) {
            self.entries.remove(&key);
        }
    }

    /// Drops every cached layout.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// The number of cached layouts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no layout is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a layout for this pair is cached.
    pub fn contains(&self, buffer_decl: &VertexDeclaration, program: &GpuProgram) -> bool {
        self.entries.contains_key(&(buffer_decl.id(), program.id()))
    }

    /// The access stamp of a cached layout.
    pub fn last_used(&self, buffer_decl: &VertexDeclaration, program: &GpuProgram) -> Option<u64> {
        self.entries
            .get(&(buffer_decl.id(), program.id()))
            .map(|e| e.last_used)
    }

    /// Looks up the layout binding `buffer_decl` to the inputs `program` reflects.
    pub(crate) fn retrieve_for(
        &mut self,
        device: &D3D11Device,
        program: &Arc<GpuProgram>,
        buffer_decl: &Arc<VertexDeclaration>,
    ) -> Result<Option<RawHandle>, RenderError> {
        // A program without reflected inputs reads nothing the buffers must provide.
        let shader_decl = program.input_declaration().unwrap_or(buffer_decl);
        self.retrieve_input_layout(device, shader_decl, buffer_decl, program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::d3d11::D3D11DriverList;
    use crate::graphics::hlsl::HlslProgramFactory;
    use prism_core::renderer::{
        GpuProgramDesc, GpuProgramManager, GpuProgramType, VertexColorFormat, VertexElement,
        VertexElementSemantic, VertexElementType,
    };

    const VS: &str = r#"
        float4 main(float3 pos : POSITION) : SV_Position { return float4(pos, 1.0); }
    "#;

    fn device() -> D3D11Device {
        let drivers = D3D11DriverList::enumerate();
        let driver = drivers.item(0).expect("adapter");
        D3D11Device::create(driver, false).expect("device")
    }

    fn programs(device: &D3D11Device, count: usize) -> Vec<Arc<GpuProgram>> {
        let manager = GpuProgramManager::new();
        manager.register_factory(Arc::new(HlslProgramFactory::new(
            device.native(),
            vec!["vs_5_0".to_string()],
            VertexColorFormat::Abgr,
        )));
        (0..count)
            .map(|_| {
                manager
                    .create_and_initialize(GpuProgramDesc::new(
                        VS,
                        "main",
                        "hlsl",
                        GpuProgramType::Vertex,
                        "vs_5_0",
                    ))
                    .expect("compile")
            })
            .collect()
    }

    fn position_decl() -> Arc<VertexDeclaration> {
        Arc::new(VertexDeclaration::new(
            vec![VertexElement::new(
                0,
                0,
                VertexElementType::Float3,
                VertexElementSemantic::Position,
                0,
            )],
            VertexColorFormat::Abgr,
        ))
    }

    #[test]
    fn test_hit_reuses_layout_and_refreshes_stamp() {
        let device = device();
        let mut cache = D3D11InputLayoutManager::new(8, 2);
        let program = &programs(&device, 1)[0];
        let decl = position_decl();

        let first = cache.retrieve_for(&device, program, &decl).expect("retrieve");
        let second = cache.retrieve_for(&device, program, &decl).expect("retrieve");

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.last_used(&decl, program), Some(2));
        assert_eq!(device.native().live_count_of(NativeObjectKind::InputLayout), 1);
    }

    #[test]
    fn test_missing_attribute_returns_none() {
        let device = device();
        let mut cache = D3D11InputLayoutManager::new(8, 2);
        let program = &programs(&device, 1)[0];
        let normals_only = Arc::new(VertexDeclaration::new(
            vec![VertexElement::new(
                0,
                0,
                VertexElementType::Float3,
                VertexElementSemantic::Normal,
                0,
            )],
            VertexColorFormat::Abgr,
        ));

        let layout = cache.retrieve_for(&device, program, &normals_only).expect("retrieve");

        assert_eq!(layout, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_full_cache_evicts_oldest_batch() {
        let device = device();
        let mut cache = D3D11InputLayoutManager::new(4, 2);
        let programs = programs(&device, 5);
        let decl = position_decl();

        for program in &programs[..4] {
            cache.retrieve_for(&device, program, &decl).expect("retrieve");
        }
        // Touch the first entry so the second and third are the oldest.
        cache.retrieve_for(&device, &programs[0], &decl).expect("retrieve");
        cache.retrieve_for(&device, &programs[4], &decl).expect("retrieve");

        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&decl, &programs[0]));
        assert!(!cache.contains(&decl, &programs[1]));
        assert!(!cache.contains(&decl, &programs[2]));
        assert!(cache.contains(&decl, &programs[3]));
        assert!(cache.contains(&decl, &programs[4]));
        assert_eq!(device.native().live_count_of(NativeObjectKind::InputLayout), 3);
    }
}
