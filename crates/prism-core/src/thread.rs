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

//! Core thread affinity.
//!
//! All native graphics state is owned by a single "core" thread. The thread that
//! runs a backend's `initialize_internal` becomes that thread; every mutating
//! render system call then checks it is running there.

use std::thread::{self, ThreadId};

use crate::renderer::error::RenderError;

/// Records which thread owns native graphics state.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoreThread {
    id: Option<ThreadId>,
}

impl CoreThread {
    /// Binds the calling thread as the core thread.
    pub fn bind_current(&mut self) {
        let id = thread::current().id();
        log::debug!("Core thread bound to {id:?}");
        self.id = Some(id);
    }

    /// Clears the binding. Used at teardown.
    pub fn unbind(&mut self) {
        self.id = None;
    }

    /// Returns the bound thread id, if any.
    pub fn id(&self) -> Option<ThreadId> {
        self.id
    }

    /// Returns `true` if the calling thread is the core thread.
    pub fn is_current(&self) -> bool {
        self.id == Some(thread::current().id())
    }

    /// Checks the calling thread in debug builds.
    ///
    /// Before any thread is bound the check passes, so that backends can run their
    /// own setup before `initialize_internal` completes.
    #[inline]
    pub fn ensure(&self, operation: &'static str) -> Result<(), RenderError> {
        if cfg!(debug_assertions) && self.id.is_some() && !self.is_current() {
            return Err(RenderError::NotOnCoreThread { operation });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_core_thread_accepts_any_caller() {
        let core = CoreThread::default();
        assert!(core.ensure("draw").is_ok());
    }

    #[test]
    fn test_other_thread_is_rejected_in_debug_builds() {
        let mut core = CoreThread::default();
        core.bind_current();
        assert!(core.ensure("draw").is_ok());

        let result = thread::spawn(move || core.ensure("draw"))
            .join()
            .expect("thread panicked");
        if cfg!(debug_assertions) {
            assert_eq!(
                result,
                Err(RenderError::NotOnCoreThread { operation: "draw" })
            );
        } else {
            assert!(result.is_ok());
        }
    }
}
