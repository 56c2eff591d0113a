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

//! GLSL program compilation.

use std::sync::Arc;

use prism_core::renderer::api::reflect::reflect_glsl;
use prism_core::renderer::{
    CompiledProgram, GpuProgramDesc, GpuProgramFactory, NativeObject, NativeResourceAllocator,
    ShaderError, VertexColorFormat, VertexDeclaration,
};

use crate::graphics::native::{as_allocator, NativeDevice, NativeObjectKind};

/// Compiles GLSL into separable program objects.
///
/// Vertex attributes are matched to semantics by their `bs_*` names.
pub struct GlslProgramFactory {
    native: Arc<NativeDevice>,
    allocator: Arc<dyn NativeResourceAllocator>,
    profiles: Vec<String>,
}

impl GlslProgramFactory {
    /// Creates a factory compiling on `native` and accepting `profiles`.
    pub fn new(native: &Arc<NativeDevice>, profiles: Vec<String>) -> Self {
        Self {
            native: native.clone(),
            allocator: as_allocator(native),
            profiles,
        }
    }
}

impl GpuProgramFactory for GlslProgramFactory {
    fn language(&self) -> &str {
        super::SHADING_LANGUAGE
    }

    fn compile(&self, desc: &GpuProgramDesc) -> Result<CompiledProgram, ShaderError> {
        if !self.profiles.iter().any(|p| *p == desc.profile) {
            return Err(ShaderError::UnsupportedProfile {
                profile: desc.profile.clone(),
            });
        }
        let reflection = reflect_glsl(&desc.source, desc.program_type)?;

        let handle = self
            .native
            .create(NativeObjectKind::Shader)
            .map_err(|e| ShaderError::CompilationError {
                entry_point: desc.entry_point.clone(),
                details: e.to_string(),
            })?;
        log::debug!(
            "Linked separable {:?} program {} ({} uniforms, {} blocks)",
            desc.program_type,
            handle.0,
            reflection.params.params.len(),
            reflection.params.blocks.len()
        );

        Ok(CompiledProgram {
            input_declaration: reflection
                .inputs
                .map(|inputs| Arc::new(VertexDeclaration::new(inputs, VertexColorFormat::Abgr))),
            params: reflection.params,
            microcode: desc.source.as_bytes().to_vec(),
            native: NativeObject::new(handle, &self.allocator),
        })
    }
}
