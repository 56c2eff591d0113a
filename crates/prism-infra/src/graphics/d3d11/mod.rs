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

//! The Direct3D 11 render system.

mod device;
mod driver;
mod input_layout;
mod mappings;
mod system;
mod window;

pub use self::device::D3D11Device;
pub use self::driver::{D3D11Driver, D3D11DriverList, FeatureLevel};
pub use self::input_layout::D3D11InputLayoutManager;
pub use self::mappings::{DxgiFormat, InputElementDesc, PrimitiveTopology};
pub use self::system::D3D11RenderSystem;
pub use self::window::D3D11RenderWindow;

/// The registered backend name.
pub const NAME: &str = "D3D11RenderSystem";

/// The shading language compiled by this backend.
pub const SHADING_LANGUAGE: &str = "hlsl";
