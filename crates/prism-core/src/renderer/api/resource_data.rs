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

//! Lockable CPU-side resource data and completion handles for asynchronous
//! resource operations.

use std::fmt;
use std::sync::Arc;

use flume::{Receiver, Sender, TryRecvError};

use super::buffer::GpuBuffer;
use super::texture::Texture;
use crate::renderer::error::RenderError;

/// Bytes exchanged with a GPU resource.
///
/// The data must be locked before it is handed to
/// `write_subresource`/`read_subresource`; the operation takes ownership and
/// unlocks it on completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GpuResourceData {
    bytes: Vec<u8>,
    locked: bool,
}

impl GpuResourceData {
    /// Wraps `bytes`, unlocked.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            locked: false,
        }
    }

    /// `len` zero bytes, unlocked.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Marks the data as in use by a pending operation.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Releases the lock.
    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Returns `true` while locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Replaces the bytes.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
    }

    /// Consumes the data, returning the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// A resource that can be written and read by subresource index.
#[derive(Debug, Clone)]
pub enum GpuResource {
    /// A buffer; it has a single subresource, index 0.
    Buffer(Arc<GpuBuffer>),
    /// A texture; subresources are laid out mip-major.
    Texture(Arc<Texture>),
}

/// Creates a linked completer and operation handle.
pub fn async_op<T>() -> (AsyncOpCompleter<T>, AsyncOp<T>) {
    let (tx, rx) = flume::bounded(1);
    (
        AsyncOpCompleter { tx },
        AsyncOp {
            rx,
            taken: false,
        },
    )
}

/// Completes an [`AsyncOp`].
pub struct AsyncOpCompleter<T> {
    tx: Sender<Result<T, RenderError>>,
}

impl<T> AsyncOpCompleter<T> {
    /// Completes the operation. Does nothing if the handle was dropped.
    pub fn complete(self, result: Result<T, RenderError>) {
        // The receiver may be gone if the caller lost interest.
        let _ = self.tx.send(result);
    }
}

impl<T> fmt::Debug for AsyncOpCompleter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOpCompleter").finish_non_exhaustive()
    }
}

/// A handle to an operation that completes on the core thread.
pub struct AsyncOp<T> {
    rx: Receiver<Result<T, RenderError>>,
    taken: bool,
}

impl<T> AsyncOp<T> {
    /// An operation that has already completed with `result`.
    pub fn completed(result: Result<T, RenderError>) -> Self {
        let (completer, op) = async_op();
        completer.complete(result);
        op
    }

    /// Returns `true` once a result is available.
    pub fn is_complete(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Takes the result if it is available.
    ///
    /// Returns `None` while pending. If the completer was dropped without
    /// completing, returns an internal error.
    pub fn try_take(&mut self) -> Option<Result<T, RenderError>> {
        if self.taken {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.taken = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.taken = true;
                Some(Err(RenderError::InternalError(
                    "Async operation was abandoned before completing".to_string(),
                )))
            }
        }
    }

    /// Waits for the result.
    pub async fn wait(self) -> Result<T, RenderError> {
        self.rx.recv_async().await.map_err(|_| {
            RenderError::InternalError("Async operation was abandoned before completing".to_string())
        })?
    }
}

impl<T> fmt::Debug for AsyncOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOp")
            .field("complete", &self.is_complete())
            .field("taken", &self.taken)
            .finish()
    }
}

/// Checks that `data` was locked by the caller.
pub fn ensure_locked(data: &GpuResourceData, operation: &'static str) -> Result<(), RenderError> {
    if data.is_locked() {
        Ok(())
    } else {
        Err(RenderError::InvalidParameters(format!(
            "Resource data must be locked before '{operation}'"
        )))
    }
}
