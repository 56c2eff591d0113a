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

//! # Prism Core
//!
//! Render system contracts and the backend-agnostic machinery behind them:
//! pipeline state objects, reference-counted resource views, vertex
//! declarations, GPU programs, render targets and the shared render system state.

#![warn(missing_docs)]

pub mod math;
pub mod renderer;
pub mod thread;
pub mod utils;

pub use renderer::{RenderError, RenderSystem};
pub use thread::CoreThread;
