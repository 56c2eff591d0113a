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

//! The Direct3D 9 render system.
//!
//! Direct3D 9 has no state objects and no constant buffers: states are
//! applied from their descriptors and parameters are uploaded register by
//! register. The device can be lost at any time, in which case every window
//! drops its back buffers until the device is reset.

mod device;
mod device_manager;
mod driver;
mod system;
mod window;

pub use self::device::D3D9Device;
pub use self::device_manager::{D3D9DeviceListener, D3D9DeviceManager};
pub use self::driver::{D3D9Driver, D3D9DriverList, ShaderModel};
pub use self::system::D3D9RenderSystem;
pub use self::window::D3D9RenderWindow;

/// The registered backend name.
pub const NAME: &str = "D3D9RenderSystem";

/// The shading language compiled by this backend.
pub const SHADING_LANGUAGE: &str = "hlsl";
