//! # Handle table: the only shared mutable state of the manager.
//!
//! Maps each live [`Handle`] to its [`InstanceController`].
//!
//! ## Rules
//! - One `std::sync::Mutex` guards every read, insert and delete.
//! - The lock is held only for the map access and never across an `.await`.
//!   Service methods are called after it is released.
//! - Fresh handles are generated under the lock and regenerated on collision or `0`.
//!   After [`MAX_DRAWS`] rejected draws the table falls back to `rand`.
//! - A poisoned lock is recovered: no operation leaves the map half-updated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::completion::Completion;
use super::handle::Handle;
use crate::service::{ServiceRef, ServiceState};

/// Per-instance control block owned by a table entry.
pub(crate) struct InstanceController {
    pub(crate) service: ServiceRef,
    pub(crate) cancel: CancellationToken,
    pub(crate) done: Completion,
    pub(crate) started_at: Instant,
}

impl InstanceController {
    pub(crate) fn new(service: ServiceRef, cancel: CancellationToken, done: Completion) -> Self {
        Self {
            service,
            cancel,
            done,
            started_at: Instant::now(),
        }
    }
}

/// Point-in-time view of a registered instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceStatus {
    /// Handle the instance is registered under.
    pub handle: Handle,
    /// Name reported by the service.
    pub service: String,
    /// Lifecycle state as last advanced by the service.
    pub state: ServiceState,
    /// Time since registration.
    pub uptime: Duration,
    /// True if the service task has already ended (the handle stays until shutdown).
    pub finished: bool,
}

type Generator = Box<dyn FnMut() -> u32 + Send>;

/// Draws taken from the configured generator before falling back to `rand`.
pub(crate) const MAX_DRAWS: usize = 64;

struct Inner {
    entries: HashMap<Handle, InstanceController>,
    generate: Generator,
}

pub(crate) struct HandleTable {
    inner: Mutex<Inner>,
}

impl HandleTable {
    /// Table drawing handles from `rand`.
    pub(crate) fn new() -> Self {
        Self::with_generator(Box::new(rand::random::<u32>))
    }

    /// Table drawing handles from `generate`; values are still checked for `0` and collisions.
    pub(crate) fn with_generator(generate: Generator) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                generate,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `ctrl` under a fresh handle.
    pub(crate) fn register(&self, ctrl: InstanceController) -> Handle {
        let mut inner = self.lock();
        let fresh = |inner: &Inner, raw: u32| {
            let candidate = Handle::from_raw(raw);
            (candidate.is_valid() && !inner.entries.contains_key(&candidate)).then_some(candidate)
        };

        let mut handle = None;
        for _ in 0..MAX_DRAWS {
            let raw = (inner.generate)();
            handle = fresh(&inner, raw);
            if handle.is_some() {
                break;
            }
        }
        let handle = match handle {
            Some(h) => h,
            None => loop {
                if let Some(h) = fresh(&inner, rand::random::<u32>()) {
                    break h;
                }
            },
        };
        inner.entries.insert(handle, ctrl);
        handle
    }

    /// Re-inserts `ctrl` under exactly `handle`.
    ///
    /// Hands the controller back if the handle is invalid or occupied.
    pub(crate) fn restore(
        &self,
        handle: Handle,
        ctrl: InstanceController,
    ) -> Result<(), InstanceController> {
        let mut inner = self.lock();
        if !handle.is_valid() || inner.entries.contains_key(&handle) {
            return Err(ctrl);
        }
        inner.entries.insert(handle, ctrl);
        Ok(())
    }

    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.lock().entries.contains_key(&handle)
    }

    pub(crate) fn status(&self, handle: Handle) -> Option<InstanceStatus> {
        let (service, started_at, finished) = {
            let inner = self.lock();
            let ctrl = inner.entries.get(&handle)?;
            (Arc::clone(&ctrl.service), ctrl.started_at, ctrl.done.is_finished())
        };
        Some(InstanceStatus {
            handle,
            service: service.name().to_string(),
            state: service.state(),
            uptime: started_at.elapsed(),
            finished,
        })
    }

    /// Removes and returns the entry. Idempotent.
    pub(crate) fn take(&self, handle: Handle) -> Option<InstanceController> {
        self.lock().entries.remove(&handle)
    }

    /// Live handles in ascending order.
    pub(crate) fn handles(&self) -> Vec<Handle> {
        let mut out: Vec<Handle> = self.lock().entries.keys().copied().collect();
        out.sort_unstable();
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Empties the table and returns every entry.
    pub(crate) fn drain(&self) -> Vec<(Handle, InstanceController)> {
        self.lock().entries.drain().collect()
    }
}
