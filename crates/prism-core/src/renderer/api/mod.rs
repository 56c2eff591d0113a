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

//! Backend-agnostic rendering API.
//!
//! - **[`common`]**: Handles, stage and topology enums, flag sets.
//! - **[`state`]**: Pipeline state descriptors, state objects and their manager.
//! - **[`buffer`]**, **[`texture`]**, **[`view`]**: GPU resources and their cached views.
//! - **[`vertex`]**: Vertex elements and declarations.
//! - **[`program`]**, **[`reflect`]**, **[`params`]**: GPU programs, source reflection
//!   and parameter block layout.
//! - **[`target`]**: Render windows and render textures.
//! - **[`capabilities`]**, **[`stats`]**, **[`config`]**, **[`resource_data`]**.

pub mod buffer;
pub mod capabilities;
pub mod common;
pub mod config;
pub mod native;
pub mod params;
pub mod program;
pub mod reflect;
pub mod resource_data;
pub mod state;
pub mod stats;
pub mod target;
pub mod texture;
pub mod vertex;
pub mod view;

pub use self::buffer::{
    GpuBuffer, GpuBufferDesc, GpuBufferFormat, GpuBufferKind, GpuBufferType, GpuBufferView,
    GpuBufferViewDesc, GpuParamBlockBuffer, IndexBuffer, VertexBuffer,
};
pub use self::capabilities::{DeviceFeatures, GpuVendor, RenderSystemCapabilities};
pub use self::common::{
    BufferUsage, DrawOperation, FrameBufferType, GpuProgramType, GpuViewUsage, IndexType,
    RawHandle,
};
pub use self::config::RenderSystemConfig;
pub use self::native::NativeObject;
pub use self::params::{
    layout_param_block, GpuParamBlockDesc, GpuParamDataDesc, GpuParamDataType, GpuParamDesc,
    ParamLocation, ParamPacking,
};
pub use self::program::{
    CompiledProgram, GpuProgram, GpuProgramDesc, GpuProgramFactory, GpuProgramManager,
    LoadState, ProgramId,
};
pub use self::reflect::ProgramReflection;
pub use self::resource_data::{async_op, AsyncOp, AsyncOpCompleter, GpuResource, GpuResourceData};
pub use self::state::*;
pub use self::stats::RenderStats;
pub use self::target::{
    NativeHandle, NativeHandleKind, RenderTarget, RenderTargetProperties, RenderTexture,
    RenderTextureDesc, RenderWindow, RenderWindowDesc, VideoMode, WindowSurface,
};
pub use self::texture::{
    PixelFormat, Texture, TextureDesc, TextureType, TextureUsage, TextureView, TextureViewDesc,
};
pub use self::vertex::{
    VertexColorFormat, VertexDeclaration, VertexElement, VertexElementSemantic,
    VertexElementType,
};
pub use self::view::{ResourceView, ViewCache, ViewLease};
