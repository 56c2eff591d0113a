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

//! Routes device loss and reset to everything holding video memory.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use prism_core::renderer::RenderError;
use prism_core::utils::sync;

use super::device::D3D9Device;

/// Something owning resources that do not survive a device reset.
pub trait D3D9DeviceListener: Send + Sync {
    /// Releases every resource in the default pool.
    fn on_device_lost(&self);

    /// Recreates the resources released by [`D3D9DeviceListener::on_device_lost`].
    fn on_device_reset(&self) -> Result<(), RenderError>;
}

/// Owns the device and the listeners registered on it.
///
/// Listeners are held weakly: a window that goes away simply stops receiving
/// notifications.
pub struct D3D9DeviceManager {
    device: Arc<D3D9Device>,
    listeners: Mutex<Vec<Weak<dyn D3D9DeviceListener>>>,
}

impl D3D9DeviceManager {
    /// Creates a manager for `device`.
    pub fn new(device: Arc<D3D9Device>) -> Self {
        Self {
            device,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The managed device.
    pub fn device(&self) -> &Arc<D3D9Device> {
        &self.device
    }

    /// Registers a listener.
    pub fn register(&self, listener: &Arc<dyn D3D9DeviceListener>) {
        sync::lock(&self.listeners).push(Arc::downgrade(listener));
    }

    /// The number of listeners still alive.
    pub fn listener_count(&self) -> usize {
        let mut listeners = sync::lock(&self.listeners);
        listeners.retain(|l| l.strong_count() > 0);
        listeners.len()
    }

    fn live_listeners(&self) -> Vec<Arc<dyn D3D9DeviceListener>> {
        let mut listeners = sync::lock(&self.listeners);
        listeners.retain(|l| l.strong_count() > 0);
        listeners.iter().filter_map(Weak::upgrade).collect()
    }

    /// Marks the device lost and lets every listener release its resources.
    pub fn notify_on_device_lost(&self) {
        self.device.simulate_device_lost();
        for listener in self.live_listeners() {
            listener.on_device_lost();
        }
    }

    /// Resets the device and lets every listener recreate its resources.
    ///
    /// If a listener fails the device is marked lost again, so the next
    /// attempt starts over from a clean state.
    pub fn notify_on_device_reset(&self) -> Result<(), RenderError> {
        self.device.reset();
        for listener in self.live_listeners() {
            if let Err(err) = listener.on_device_reset() {
                log::error!("Failed to restore resources after a D3D9 reset: {err}");
                self.notify_on_device_lost();
                return Err(err);
            }
        }
        Ok(())
    }

    /// Releases and recreates every listener's resources, e.g. after the
    /// presentation parameters changed.
    pub fn reset_device(&self) -> Result<(), RenderError> {
        self.notify_on_device_lost();
        self.notify_on_device_reset()
    }
}

impl fmt::Debug for D3D9DeviceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("D3D9DeviceManager")
            .field("device", &self.device)
            .field("listeners", &sync::lock(&self.listeners).len())
            .finish()
    }
}
