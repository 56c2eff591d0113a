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

//! Ownership of native objects.

use std::fmt;
use std::sync::{Arc, Weak};

use super::RawHandle;
use crate::renderer::traits::NativeResourceAllocator;

/// A native object that is released through its allocator when dropped.
///
/// Holds only a weak reference to the allocator; objects that outlive their
/// device are dropped without a native call.
pub struct NativeObject {
    handle: RawHandle,
    owner: Weak<dyn NativeResourceAllocator>,
}

impl NativeObject {
    /// Takes ownership of `handle`, which must have been issued by `owner`.
    pub fn new(handle: RawHandle, owner: &Arc<dyn NativeResourceAllocator>) -> Self {
        Self {
            handle,
            owner: Arc::downgrade(owner),
        }
    }

    /// Returns the raw handle.
    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle
    }
}

impl fmt::Debug for NativeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NativeObject").field(&self.handle.0).finish()
    }
}

impl Drop for NativeObject {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.upgrade() {
            owner.release(self.handle);
        }
    }
}
