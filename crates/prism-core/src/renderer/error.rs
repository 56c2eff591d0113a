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

//! Defines the hierarchy of error types for the render system.

use std::fmt;

/// An error related to compiling a GPU program.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// The source failed to compile into a backend-specific program.
    CompilationError {
        /// The entry point of the program being compiled.
        entry_point: String,
        /// Detailed messages from the compiler.
        details: String,
    },
    /// The entry point named in the program description does not exist in the source.
    InvalidEntryPoint {
        /// The entry point name that was not found.
        entry_point: String,
    },
    /// The requested profile is not supported by the active device.
    UnsupportedProfile {
        /// The profile string, e.g. `vs_5_0`.
        profile: String,
    },
    /// The program was used before it finished loading.
    NotLoaded,
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError {
                entry_point,
                details,
            } => {
                write!(f, "GPU program compilation failed for '{entry_point}': {details}")
            }
            ShaderError::InvalidEntryPoint { entry_point } => {
                write!(f, "Entry point '{entry_point}' not found in program source")
            }
            ShaderError::UnsupportedProfile { profile } => {
                write!(f, "GPU program profile '{profile}' is not supported")
            }
            ShaderError::NotLoaded => write!(f, "GPU program has not finished loading"),
        }
    }
}

impl std::error::Error for ShaderError {}

/// The main error type for render system operations.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A parameter is out of range or otherwise invalid (wrong stage, unit index, slot range).
    InvalidParameters(String),
    /// A programming error inside the caller or the render system, such as
    /// releasing a view that is not registered with its owner.
    InternalError(String),
    /// The native graphics API reported a failure.
    RenderingApi {
        /// The name of the backend that raised the error.
        backend: &'static str,
        /// The diagnostic string gathered from the native API.
        details: String,
    },
    /// A core-thread-only operation was called from another thread.
    NotOnCoreThread {
        /// The operation that was called.
        operation: &'static str,
    },
    /// An operation is not legal in the current frame lifecycle state.
    InvalidState {
        /// The operation that was called.
        operation: &'static str,
        /// The lifecycle state at the time of the call.
        state: String,
    },
    /// The render system has not been initialized, or was already destroyed.
    NotInitialized,
    /// The active backend does not support the requested feature.
    Unsupported(String),
    /// The device was lost and could not be restored.
    DeviceLost,
    /// A GPU program error.
    Shader(ShaderError),
}

impl RenderError {
    /// Builds a [`RenderError::RenderingApi`] with a formatted native diagnostic.
    pub fn rendering_api(backend: &'static str, details: impl Into<String>) -> Self {
        RenderError::RenderingApi {
            backend,
            details: details.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidParameters(msg) => write!(f, "Invalid parameters: {msg}"),
            RenderError::InternalError(msg) => write!(f, "Internal error: {msg}"),
            RenderError::RenderingApi { backend, details } => {
                write!(f, "{backend} rendering API error: {details}")
            }
            RenderError::NotOnCoreThread { operation } => {
                write!(f, "'{operation}' must be called on the core thread")
            }
            RenderError::InvalidState { operation, state } => {
                write!(f, "'{operation}' is not allowed while the render system is {state}")
            }
            RenderError::NotInitialized => write!(f, "Render system is not initialized"),
            RenderError::Unsupported(msg) => write!(f, "Unsupported operation: {msg}"),
            RenderError::DeviceLost => write!(f, "Graphics device lost"),
            RenderError::Shader(err) => write!(f, "GPU program error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::Shader(err)
    }
}

/// An error raised while loading a [`RenderSystemConfig`](crate::renderer::api::RenderSystemConfig)
/// or selecting a backend from it.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration text is not valid.
    Parse(serde_json::Error),
    /// None of the configured backend names matched a registered backend.
    UnknownBackend(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "Failed to read render system config: {err}"),
            ConfigError::Parse(err) => write!(f, "Failed to parse render system config: {err}"),
            ConfigError::UnknownBackend(names) => {
                write!(f, "No registered render system matches {names:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::UnknownBackend(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
