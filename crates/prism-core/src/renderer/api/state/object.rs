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

//! The generic immutable state object.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::renderer::api::{NativeObject, RawHandle};
use crate::renderer::error::RenderError;
use crate::renderer::traits::NativeResourceAllocator;
use crate::utils::{sync, IdGenerator};

static STATE_IDS: IdGenerator = IdGenerator::new();

/// An immutable state object wrapping a descriptor of type `D`.
///
/// The native handle is built on first bind by the active backend through
/// [`RenderStateObject::realize`] and released when the last reference drops.
pub struct RenderStateObject<D> {
    id: u32,
    desc: D,
    native: Mutex<Option<NativeObject>>,
}

impl<D> RenderStateObject<D> {
    /// Creates an unrealized state object.
    pub fn new(desc: D) -> Self {
        Self {
            id: STATE_IDS.next_id(),
            desc,
            native: Mutex::new(None),
        }
    }

    /// A process-unique id for this object.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The descriptor this object was built from.
    pub fn desc(&self) -> &D {
        &self.desc
    }

    /// Returns the native handle if the object has been realized.
    pub fn native_handle(&self) -> Option<RawHandle> {
        sync::lock(&self.native).as_ref().map(NativeObject::handle)
    }

    /// Returns `true` once a backend has built the native object.
    pub fn is_realized(&self) -> bool {
        self.native_handle().is_some()
    }

    /// Returns the native handle, building it with `create` the first time.
    ///
    /// `create` runs at most once per object. If it fails the object stays
    /// unrealized and the error is returned; no partial handle is kept.
    pub fn realize<F>(
        &self,
        owner: &Arc<dyn NativeResourceAllocator>,
        create: F,
    ) -> Result<RawHandle, RenderError>
    where
        F: FnOnce(&D) -> Result<RawHandle, RenderError>,
    {
        let mut native = sync::lock(&self.native);
        if let Some(existing) = native.as_ref() {
            return Ok(existing.handle());
        }
        let handle = create(&self.desc)?;
        *native = Some(NativeObject::new(handle, owner));
        Ok(handle)
    }
}

impl<D: fmt::Debug> fmt::Debug for RenderStateObject<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStateObject")
            .field("id", &self.id)
            .field("desc", &self.desc)
            .field("native", &self.native_handle())
            .finish()
    }
}
