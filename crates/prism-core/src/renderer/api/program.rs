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

//! GPU programs and the per-language program factories that compile them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use super::native::NativeObject;
use super::params::GpuParamDesc;
use super::vertex::VertexDeclaration;
use super::{GpuProgramType, RawHandle};
use crate::renderer::error::ShaderError;
use crate::utils::{sync, IdGenerator};

static PROGRAM_IDS: IdGenerator = IdGenerator::new();

/// A process-unique GPU program identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Describes a GPU program to be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuProgramDesc {
    /// Program source text.
    pub source: String,
    /// Name of the entry point function.
    pub entry_point: String,
    /// Shading language, e.g. `hlsl` or `glsl`.
    pub language: String,
    /// The stage the program runs in.
    pub program_type: GpuProgramType,
    /// Target profile, e.g. `vs_5_0`.
    pub profile: String,
    /// Names of included files.
    pub includes: Vec<String>,
    /// Whether a geometry program needs adjacency information.
    pub requires_adjacency: bool,
}

impl GpuProgramDesc {
    /// A description with no includes and no adjacency.
    pub fn new(
        source: impl Into<String>,
        entry_point: impl Into<String>,
        language: impl Into<String>,
        program_type: GpuProgramType,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            entry_point: entry_point.into(),
            language: language.into(),
            program_type,
            profile: profile.into(),
            includes: Vec::new(),
            requires_adjacency: false,
        }
    }
}

/// The loading state of a GPU program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// Created but not compiled yet.
    Pending,
    /// Compiled and ready to bind.
    Loaded,
    /// Compilation failed.
    Failed,
}

/// The result of compiling a program with a backend factory.
#[derive(Debug)]
pub struct CompiledProgram {
    /// The inputs a vertex program reads, `None` for other stages.
    pub input_declaration: Option<Arc<VertexDeclaration>>,
    /// Reflected parameters.
    pub params: GpuParamDesc,
    /// Backend-specific compiled bytes.
    pub microcode: Vec<u8>,
    /// The native shader object.
    pub native: NativeObject,
}

/// Compiles programs written in one shading language for one backend.
pub trait GpuProgramFactory: Send + Sync {
    /// The language this factory handles.
    fn language(&self) -> &str;

    /// Compiles `desc` into a native program.
    fn compile(&self, desc: &GpuProgramDesc) -> Result<CompiledProgram, ShaderError>;
}

/// A GPU program for one pipeline stage.
///
/// Programs are created through [`GpuProgramManager::create`] and compiled by
/// [`GpuProgram::initialize`]. A program created for a language with no
/// registered factory is a *null* program: it is never supported and binding
/// it does nothing.
pub struct GpuProgram {
    id: ProgramId,
    desc: GpuProgramDesc,
    factory: Option<Arc<dyn GpuProgramFactory>>,
    state: Mutex<LoadState>,
    compiled: OnceLock<CompiledProgram>,
    error: Mutex<Option<ShaderError>>,
}

impl GpuProgram {
    fn new(desc: GpuProgramDesc, factory: Option<Arc<dyn GpuProgramFactory>>) -> Self {
        Self {
            id: ProgramId(PROGRAM_IDS.next_id()),
            desc,
            factory,
            state: Mutex::new(LoadState::Pending),
            compiled: OnceLock::new(),
            error: Mutex::new(None),
        }
    }

    /// The process-unique id of this program.
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// The description the program was created from.
    pub fn desc(&self) -> &GpuProgramDesc {
        &self.desc
    }

    /// The stage this program runs in.
    pub fn program_type(&self) -> GpuProgramType {
        self.desc.program_type
    }

    /// Whether a factory exists for this program's language.
    pub fn is_supported(&self) -> bool {
        self.factory.is_some()
    }

    /// Current loading state.
    pub fn load_state(&self) -> LoadState {
        *sync::lock(&self.state)
    }

    /// Returns `true` once the program compiled successfully.
    pub fn is_loaded(&self) -> bool {
        self.load_state() == LoadState::Loaded
    }

    /// Compiles the program. Calling this again after success is a no-op.
    ///
    /// Null programs complete immediately without producing native code.
    pub fn initialize(&self) -> Result<(), ShaderError> {
        if self.compiled.get().is_some() {
            return Ok(());
        }
        let Some(factory) = &self.factory else {
            *sync::lock(&self.state) = LoadState::Loaded;
            return Ok(());
        };

        match factory.compile(&self.desc) {
            Ok(compiled) => {
                log::debug!(
                    "Compiled {:?} program {} ('{}', {})",
                    self.desc.program_type,
                    self.id.0,
                    self.desc.entry_point,
                    self.desc.profile
                );
                // A racing initialize may have won; its result is equivalent.
                let _ = self.compiled.set(compiled);
                *sync::lock(&self.state) = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                log::error!("{err}");
                *sync::lock(&self.state) = LoadState::Failed;
                *sync::lock(&self.error) = Some(err.clone());
                Err(err)
            }
        }
    }

    /// The compiled program, if compilation succeeded.
    pub fn compiled(&self) -> Option<&CompiledProgram> {
        self.compiled.get()
    }

    /// The native program handle, if compiled.
    pub fn native_handle(&self) -> Option<RawHandle> {
        self.compiled.get().map(|c| c.native.handle())
    }

    /// The vertex inputs of a compiled vertex program.
    pub fn input_declaration(&self) -> Option<&Arc<VertexDeclaration>> {
        self.compiled.get()?.input_declaration.as_ref()
    }

    /// The reflected parameters of a compiled program.
    pub fn params(&self) -> Option<&GpuParamDesc> {
        self.compiled.get().map(|c| &c.params)
    }

    /// The error from the last failed compilation.
    pub fn compile_error(&self) -> Option<ShaderError> {
        sync::lock(&self.error).clone()
    }
}

impl fmt::Debug for GpuProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuProgram")
            .field("id", &self.id)
            .field("type", &self.desc.program_type)
            .field("language", &self.desc.language)
            .field("state", &self.load_state())
            .finish()
    }
}

/// Creates GPU programs, dispatching on their shading language.
#[derive(Default)]
pub struct GpuProgramManager {
    factories: RwLock<HashMap<String, Arc<dyn GpuProgramFactory>>>,
}

impl GpuProgramManager {
    /// Creates a manager with no factories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for its language, replacing any previous one.
    pub fn register_factory(&self, factory: Arc<dyn GpuProgramFactory>) {
        let language = factory.language().to_string();
        log::debug!("Registered GPU program factory for '{language}'");
        sync::write(&self.factories).insert(language, factory);
    }

    /// Removes the factory for `language`.
    pub fn unregister_factory(&self, language: &str) {
        sync::write(&self.factories).remove(language);
    }

    /// Returns `true` if programs in `language` can be compiled.
    pub fn is_language_supported(&self, language: &str) -> bool {
        sync::read(&self.factories).contains_key(language)
    }

    /// Creates an uncompiled program. Unknown languages yield a null program.
    pub fn create(&self, desc: GpuProgramDesc) -> Arc<GpuProgram> {
        let factory = sync::read(&self.factories).get(&desc.language).cloned();
        if factory.is_none() {
            log::debug!(
                "No GPU program factory for '{}', creating a null program",
                desc.language
            );
        }
        Arc::new(GpuProgram::new(desc, factory))
    }

    /// Creates and compiles a program.
    pub fn create_and_initialize(
        &self,
        desc: GpuProgramDesc,
    ) -> Result<Arc<GpuProgram>, ShaderError> {
        let program = self.create(desc);
        program.initialize()?;
        Ok(program)
    }
}

impl fmt::Debug for GpuProgramManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let languages: Vec<String> = sync::read(&self.factories).keys().cloned().collect();
        f.debug_struct("GpuProgramManager")
            .field("languages", &languages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::testing::RecordingAllocator;
    use crate::renderer::traits::NativeResourceAllocator;

    struct EchoFactory {
        allocator: Arc<dyn NativeResourceAllocator>,
    }

    impl GpuProgramFactory for EchoFactory {
        fn language(&self) -> &str {
            "echo"
        }

        fn compile(&self, desc: &GpuProgramDesc) -> Result<CompiledProgram, ShaderError> {
            if desc.source.is_empty() {
                return Err(ShaderError::CompilationError {
                    entry_point: desc.entry_point.clone(),
                    details: "empty source".into(),
                });
            }
            Ok(CompiledProgram {
                input_declaration: None,
                params: GpuParamDesc::default(),
                microcode: desc.source.as_bytes().to_vec(),
                native: NativeObject::new(RawHandle(7), &self.allocator),
            })
        }
    }

    fn manager() -> (Arc<RecordingAllocator>, GpuProgramManager) {
        let (recorder, allocator) = RecordingAllocator::new_shared();
        let manager = GpuProgramManager::new();
        manager.register_factory(Arc::new(EchoFactory { allocator }));
        (recorder, manager)
    }

    fn desc(language: &str, source: &str) -> GpuProgramDesc {
        GpuProgramDesc::new(source, "main", language, GpuProgramType::Vertex, "vs_5_0")
    }

    #[test]
    fn test_dispatch_by_language() {
        let (_recorder, manager) = manager();
        let program = manager
            .create_and_initialize(desc("echo", "body"))
            .expect("compile");
        assert!(program.is_supported());
        assert!(program.is_loaded());
        assert_eq!(program.native_handle(), Some(RawHandle(7)));
        assert_eq!(program.compiled().map(|c| c.microcode.len()), Some(4));
    }

    #[test]
    fn test_unknown_language_falls_back_to_null_program() {
        let (_recorder, manager) = manager();
        let program = manager
            .create_and_initialize(desc("cg", "body"))
            .expect("null programs always initialize");
        assert!(!program.is_supported());
        assert!(program.compiled().is_none());
    }

    #[test]
    fn test_compile_failure_is_recorded() {
        let (_recorder, manager) = manager();
        let program = manager.create(desc("echo", ""));
        assert_eq!(program.load_state(), LoadState::Pending);

        assert!(program.initialize().is_err());
        assert_eq!(program.load_state(), LoadState::Failed);
        assert!(matches!(
            program.compile_error(),
            Some(ShaderError::CompilationError { .. })
        ));
    }

    #[test]
    fn test_program_ids_are_unique() {
        let (_recorder, manager) = manager();
        let a = manager.create(desc("echo", "a"));
        let b = manager.create(desc("echo", "a"));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_native_program_released_on_drop() {
        let (recorder, manager) = manager();
        let program = manager
            .create_and_initialize(desc("echo", "body"))
            .expect("compile");
        drop(program);
        assert_eq!(recorder.release_count(RawHandle(7)), 1);
    }
}
