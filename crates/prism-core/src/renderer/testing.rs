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

//! A native allocator that only records what it was asked to do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::renderer::api::{
    GpuBufferDesc, GpuBufferViewDesc, RawHandle, TextureDesc, TextureViewDesc,
};
use crate::renderer::error::RenderError;
use crate::renderer::traits::NativeResourceAllocator;
use crate::utils::sync;

#[derive(Debug, Default)]
pub(crate) struct RecordingAllocator {
    next: AtomicU64,
    views_created: AtomicUsize,
    releases: Mutex<HashMap<RawHandle, usize>>,
}

impl RecordingAllocator {
    pub(crate) fn new_shared() -> (Arc<Self>, Arc<dyn NativeResourceAllocator>) {
        let recorder = Arc::new(Self::default());
        let allocator: Arc<dyn NativeResourceAllocator> = recorder.clone();
        (recorder, allocator)
    }

    pub(crate) fn views_created(&self) -> usize {
        self.views_created.load(Ordering::Relaxed)
    }

    pub(crate) fn release_count(&self, handle: RawHandle) -> usize {
        sync::lock(&self.releases).get(&handle).copied().unwrap_or(0)
    }

    fn issue(&self) -> RawHandle {
        RawHandle(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl NativeResourceAllocator for RecordingAllocator {
    fn backend_name(&self) -> &'static str {
        "Recording"
    }

    fn create_buffer(&self, _desc: &GpuBufferDesc) -> Result<RawHandle, RenderError> {
        Ok(self.issue())
    }

    fn create_buffer_view(
        &self,
        _buffer: RawHandle,
        _buffer_desc: &GpuBufferDesc,
        _view: &GpuBufferViewDesc,
    ) -> Result<RawHandle, RenderError> {
        self.views_created.fetch_add(1, Ordering::Relaxed);
        Ok(self.issue())
    }

    fn create_texture(&self, _desc: &TextureDesc) -> Result<RawHandle, RenderError> {
        Ok(self.issue())
    }

    fn create_texture_view(
        &self,
        _texture: RawHandle,
        _texture_desc: &TextureDesc,
        _view: &TextureViewDesc,
    ) -> Result<RawHandle, RenderError> {
        self.views_created.fetch_add(1, Ordering::Relaxed);
        Ok(self.issue())
    }

    fn release(&self, handle: RawHandle) {
        *sync::lock(&self.releases).entry(handle).or_insert(0) += 1;
    }
}
