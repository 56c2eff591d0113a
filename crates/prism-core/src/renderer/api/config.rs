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

//! Render system configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::target::RenderWindowDesc;
use crate::renderer::error::ConfigError;

/// Default capacity of the Direct3D 11 input layout cache.
pub const DEFAULT_INPUT_LAYOUT_CACHE_CAPACITY: usize = 1024;
/// Default number of input layouts evicted when the cache is full.
pub const DEFAULT_INPUT_LAYOUT_PRUNE_COUNT: usize = 64;

/// Settings used to pick and start a render system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSystemConfig {
    /// Backend names to try, in order.
    pub preferred_backends: Vec<String>,
    /// Index of the adapter to use in the backend's driver list.
    pub adapter_index: usize,
    /// Whether to enable the native API's validation layer.
    pub debug_layer: bool,
    /// Number of input layouts kept before eviction starts.
    pub input_layout_cache_capacity: usize,
    /// Number of input layouts evicted at once.
    pub input_layout_prune_count: usize,
    /// The window created at initialization.
    pub primary_window: RenderWindowDesc,
}

impl Default for RenderSystemConfig {
    fn default() -> Self {
        Self {
            preferred_backends: vec![
                "D3D11RenderSystem".to_string(),
                "GLRenderSystem".to_string(),
                "D3D9RenderSystem".to_string(),
            ],
            adapter_index: 0,
            debug_layer: cfg!(debug_assertions),
            input_layout_cache_capacity: DEFAULT_INPUT_LAYOUT_CACHE_CAPACITY,
            input_layout_prune_count: DEFAULT_INPUT_LAYOUT_PRUNE_COUNT,
            primary_window: RenderWindowDesc::default(),
        }
    }
}

impl RenderSystemConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = RenderSystemConfig::from_json_str("{}").expect("parse");
        assert_eq!(config, RenderSystemConfig::default());
        assert_eq!(config.input_layout_cache_capacity, 1024);
        assert_eq!(config.input_layout_prune_count, 64);
    }

    #[test]
    fn test_partial_override() {
        let config = RenderSystemConfig::from_json_str(
            r#"{
                "preferred_backends": ["GLRenderSystem"],
                "primary_window": { "title": "Demo", "vsync": true }
            }"#,
        )
        .expect("parse");
        assert_eq!(config.preferred_backends, vec!["GLRenderSystem"]);
        assert_eq!(config.primary_window.title, "Demo");
        assert!(config.primary_window.vsync);
        assert_eq!(config.primary_window.video_mode.width, 1280);
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            RenderSystemConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        assert!(matches!(
            RenderSystemConfig::from_json_file("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
