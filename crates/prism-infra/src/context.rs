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

//! The graphics context owning the live backend and its primary window.

use std::fmt;
use std::sync::Arc;

use prism_core::renderer::{
    ConfigError, Lifecycle, RenderError, RenderSystem, RenderSystemConfig, RenderWindow,
    RenderWindowDesc,
};

use crate::backend::{RenderBackend, RenderSystemManager};

/// An error raised while creating a [`GraphicsContext`].
#[derive(Debug)]
pub enum ContextError {
    /// No configured backend could be selected.
    Config(ConfigError),
    /// The selected backend failed to initialize.
    Render(RenderError),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextError::Config(err) => write!(f, "Graphics context configuration error: {err}"),
            ContextError::Render(err) => write!(f, "Graphics context initialization error: {err}"),
        }
    }
}

impl std::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContextError::Config(err) => Some(err),
            ContextError::Render(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ContextError {
    fn from(err: ConfigError) -> Self {
        ContextError::Config(err)
    }
}

impl From<RenderError> for ContextError {
    fn from(err: RenderError) -> Self {
        ContextError::Render(err)
    }
}

/// Owns the one live render system of the process.
///
/// Dropping the context destroys the backend, then releases the primary
/// window.
#[derive(Debug)]
pub struct GraphicsContext {
    backend: RenderBackend,
    primary_window: Option<Arc<RenderWindow>>,
}

impl GraphicsContext {
    /// Selects the first registered backend of `config.preferred_backends`
    /// and initializes it with `config.primary_window`.
    pub fn new(config: &RenderSystemConfig) -> Result<Self, ContextError> {
        let backend = RenderSystemManager::create_preferred(config)?;
        Self::from_backend(backend, &config.primary_window)
    }

    /// Initializes an already created backend.
    pub fn from_backend(
        mut backend: RenderBackend,
        primary_window: &RenderWindowDesc,
    ) -> Result<Self, ContextError> {
        let window = backend.initialize(primary_window)?;
        log::info!(
            "Graphics context ready on {} ({})",
            backend.name(),
            backend.capabilities().device_name
        );
        Ok(Self {
            backend,
            primary_window: Some(window),
        })
    }

    /// The live backend.
    pub fn backend(&self) -> &RenderBackend {
        &self.backend
    }

    /// The live backend, mutably.
    pub fn backend_mut(&mut self) -> &mut RenderBackend {
        &mut self.backend
    }

    /// The window created during initialization.
    pub fn primary_window(&self) -> Option<&Arc<RenderWindow>> {
        self.primary_window.as_ref()
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        if matches!(
            self.backend.state().lifecycle(),
            Lifecycle::Ready | Lifecycle::InFrame
        ) {
            if let Err(err) = self.backend.destroy() {
                log::error!("Failed to destroy {}: {err}", self.backend.name());
            }
        }
        self.primary_window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: &str) -> RenderSystemConfig {
        RenderSystemConfig {
            preferred_backends: vec![backend.to_string()],
            ..RenderSystemConfig::default()
        }
    }

    #[test]
    fn test_new_initializes_the_preferred_backend() {
        let context = GraphicsContext::new(&config("D3D9RenderSystem")).expect("context");

        assert_eq!(context.backend().name(), "D3D9RenderSystem");
        assert_eq!(context.backend().state().lifecycle(), Lifecycle::Ready);
        assert!(context.primary_window().is_some());
    }

    #[test]
    fn test_unknown_backend_is_a_config_error() {
        let err = GraphicsContext::new(&config("SoftwareRenderSystem")).unwrap_err();
        assert!(matches!(err, ContextError::Config(ConfigError::UnknownBackend(_))));
    }
}
