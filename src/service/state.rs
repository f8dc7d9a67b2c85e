//! # Service lifecycle state.
//!
//! [`ServiceState`] is the four-step lifecycle a service walks through. Only the
//! service advances it; the manager reads it.
//!
//! [`StateCell`] is an atomic holder services can embed. It only moves forward, so a
//! late `Running` store can never resurrect a service that is already closing.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceState {
    /// Created, not yet serving.
    Starting,
    /// Fully started.
    Running,
    /// Shutdown in progress.
    Closing,
    /// Terminal.
    Closed,
}

impl ServiceState {
    /// True once the service has begun (or finished) shutting down.
    #[inline]
    pub fn is_stopping(self) -> bool {
        matches!(self, ServiceState::Closing | ServiceState::Closed)
    }

    /// Short lowercase name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Closing => "closing",
            ServiceState::Closed => "closed",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => ServiceState::Starting,
            1 => ServiceState::Running,
            2 => ServiceState::Closing,
            _ => ServiceState::Closed,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic, lock-free holder of a [`ServiceState`].
#[derive(Debug)]
pub struct StateCell {
    raw: AtomicU8,
}

impl StateCell {
    /// Creates a cell in [`ServiceState::Starting`].
    pub const fn new() -> Self {
        Self {
            raw: AtomicU8::new(ServiceState::Starting as u8),
        }
    }

    /// Reads the current state.
    #[inline]
    pub fn get(&self) -> ServiceState {
        ServiceState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Moves the state forward to `next`.
    ///
    /// Returns the state that was current before the call. Backwards moves are ignored.
    pub fn advance(&self, next: ServiceState) -> ServiceState {
        ServiceState::from_u8(self.raw.fetch_max(next as u8, Ordering::AcqRel))
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
