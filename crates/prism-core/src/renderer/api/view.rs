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

//! Reference-counted, deduplicated views over buffers and textures.
//!
//! A resource owns one [`ViewCache`]. Requests for a view with a given key
//! return the same [`ResourceView`] until every request has been released, at
//! which point the native view is destroyed and the entry removed.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::{Arc, Mutex, Weak};

use super::{NativeObject, RawHandle};
use crate::renderer::error::RenderError;
use crate::utils::sync;

/// A view over a resource, described by a key of type `K`.
pub struct ResourceView<K> {
    key: K,
    owner_id: u32,
    native: Mutex<Option<NativeObject>>,
}

impl<K: Copy> ResourceView<K> {
    /// The descriptor this view was created with.
    pub fn key(&self) -> K {
        self.key
    }

    /// The id of the resource that owns this view.
    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }

    /// The native view handle, or `None` once the view has been destroyed.
    pub fn native_handle(&self) -> Option<RawHandle> {
        sync::lock(&self.native).as_ref().map(NativeObject::handle)
    }

    /// Returns `true` once the native view has been destroyed.
    pub fn is_destroyed(&self) -> bool {
        sync::lock(&self.native).is_none()
    }

    fn destroy(&self) {
        sync::lock(&self.native).take();
    }
}

impl<K: fmt::Debug + Copy> fmt::Debug for ResourceView<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceView")
            .field("key", &self.key)
            .field("owner_id", &self.owner_id)
            .field("native", &self.native_handle())
            .finish()
    }
}

struct ViewEntry<K> {
    view: Arc<ResourceView<K>>,
    ref_count: u32,
}

/// The per-resource view table.
pub struct ViewCache<K> {
    owner_id: u32,
    entries: Mutex<HashMap<K, ViewEntry<K>>>,
}

impl<K: Copy + Eq + Hash + fmt::Debug> ViewCache<K> {
    /// Creates an empty cache for the resource with id `owner_id`.
    pub fn new(owner_id: u32) -> Self {
        Self {
            owner_id,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the view for `key`, creating its native object with `create` if
    /// no view with that key is alive. Each call adds one reference.
    pub fn request<F>(&self, key: K, create: F) -> Result<Arc<ResourceView<K>>, RenderError>
    where
        F: FnOnce(&K) -> Result<NativeObject, RenderError>,
    {
        let mut entries = sync::lock(&self.entries);
        if let Some(entry) = entries.get_mut(&key) {
            entry.ref_count += 1;
            return Ok(entry.view.clone());
        }

        let native = create(&key)?;
        log::trace!(
            "Created view {:?} over resource {} for {:?}",
            native.handle(),
            self.owner_id,
            key
        );
        let view = Arc::new(ResourceView {
            key,
            owner_id: self.owner_id,
            native: Mutex::new(Some(native)),
        });
        entries.insert(
            key,
            ViewEntry {
                view: view.clone(),
                ref_count: 1,
            },
        );
        Ok(view)
    }

    /// Releases one reference to `view`. The native view is destroyed when the
    /// count reaches zero.
    ///
    /// Fails with [`RenderError::InternalError`] if `view` is not registered in
    /// this cache, which covers foreign views and views already released to zero.
    pub fn release(&self, view: &ResourceView<K>) -> Result<(), RenderError> {
        let mut entries = sync::lock(&self.entries);
        let registered = view.owner_id == self.owner_id
            && entries
                .get(&view.key)
                .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(&entry.view), view));
        if !registered {
            return Err(RenderError::InternalError(format!(
                "Trying to release a view that is not registered with resource {}: {:?}",
                self.owner_id, view.key
            )));
        }

        let remove = match entries.get_mut(&view.key) {
            Some(entry) => {
                entry.ref_count -= 1;
                entry.ref_count == 0
            }
            None => false,
        };
        if remove {
            if let Some(entry) = entries.remove(&view.key) {
                entry.view.destroy();
                log::trace!(
                    "Destroyed view over resource {} for {:?}",
                    self.owner_id,
                    view.key
                );
            }
        }
        Ok(())
    }

    /// Destroys every view regardless of outstanding references.
    pub fn clear(&self) {
        let drained: Vec<_> = sync::lock(&self.entries).drain().collect();
        for (_, entry) in drained {
            entry.view.destroy();
        }
    }

    /// The number of live views.
    pub fn len(&self) -> usize {
        sync::lock(&self.entries).len()
    }

    /// Returns `true` if no view is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The outstanding reference count for `key`, if a view exists.
    pub fn ref_count(&self, key: &K) -> Option<u32> {
        sync::lock(&self.entries).get(key).map(|e| e.ref_count)
    }
}

impl<K> fmt::Debug for ViewCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCache")
            .field("owner_id", &self.owner_id)
            .field("views", &sync::lock(&self.entries).len())
            .finish()
    }
}

/// A scoped reference to a cached view, released when dropped.
///
/// Holds the cache weakly: if the owning resource has already been destroyed
/// the drop does nothing, since the view was force-destroyed with it.
pub struct ViewLease<K: Copy + Eq + Hash + fmt::Debug> {
    view: Arc<ResourceView<K>>,
    cache: Weak<ViewCache<K>>,
}

impl<K: Copy + Eq + Hash + fmt::Debug> ViewLease<K> {
    /// Requests a view from `cache` and wraps the reference in a lease.
    pub fn acquire<F>(cache: &Arc<ViewCache<K>>, key: K, create: F) -> Result<Self, RenderError>
    where
        F: FnOnce(&K) -> Result<NativeObject, RenderError>,
    {
        let view = cache.request(key, create)?;
        Ok(Self {
            view,
            cache: Arc::downgrade(cache),
        })
    }

    /// The leased view.
    pub fn view(&self) -> &Arc<ResourceView<K>> {
        &self.view
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> Deref for ViewLease<K> {
    type Target = ResourceView<K>;

    fn deref(&self) -> &Self::Target {
        &self.view
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> Drop for ViewLease<K> {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            if let Err(e) = cache.release(&self.view) {
                log::error!("{e}");
            }
        }
    }
}

impl<K: Copy + Eq + Hash + fmt::Debug> fmt::Debug for ViewLease<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewLease").field(&self.view).finish()
    }
}
