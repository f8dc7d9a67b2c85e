//! # Synchronous host for the exported functions.
//!
//! [`Host`] owns a multi-threaded tokio runtime and a [`Manager`] built inside it,
//! and turns each boundary call into a blocking `block_on`. Results come back as
//! [`CollectorInstance`] records, never as panics: every call runs behind a
//! `catch_unwind` guard.
//!
//! `Host` is an ordinary value. The exported `extern "C"` functions use the one
//! installed process-wide through [`install`](super::install).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};

use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::error;
use tracing_subscriber::EnvFilter;

use super::exports::CollectorInstance;
use crate::core::{Handle, Manager, ManagerBuilder, timeout_from_millis};
use crate::subscribers::panic_info;

/// Errors raised while setting up or addressing the host.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HostError {
    /// An exported function was called before [`install`](super::install).
    #[error("collector host not installed")]
    NotInstalled,

    /// [`install`](super::install) was called twice.
    #[error("collector host already installed")]
    AlreadyInstalled,

    /// The tokio runtime could not be built.
    #[error("cannot start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A pointer argument was null or not valid UTF-8.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: &'static str,
    },
}

impl HostError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            HostError::NotInstalled => "host_not_installed",
            HostError::AlreadyInstalled => "host_already_installed",
            HostError::Runtime(_) => "host_runtime",
            HostError::InvalidArgument { .. } => "host_invalid_argument",
        }
    }
}

/// Runtime plus manager behind the boundary calls.
///
/// Dropping the host drops the manager first, which cancels every instance,
/// then shuts the runtime down.
pub struct Host {
    manager: Arc<Manager>,
    runtime: Runtime,
}

impl Host {
    /// Builds the runtime and, inside it, the manager described by `builder`.
    ///
    /// Must not be called from within another tokio runtime.
    pub fn new(builder: ManagerBuilder) -> Result<Self, HostError> {
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .thread_name("collectorvisor")
            .build()?;
        let manager = {
            let _guard = runtime.enter();
            builder.build()
        };
        Ok(Self { manager, runtime })
    }

    /// The hosted manager.
    pub fn manager(&self) -> &Arc<Manager> {
        &self.manager
    }

    /// Creates an instance; `timeout_ms = 0` waits indefinitely.
    pub fn create(&self, source: &str, timeout_ms: u32) -> CollectorInstance {
        guard("create", || {
            let timeout = timeout_from_millis(u64::from(timeout_ms));
            match self.runtime.block_on(self.manager.create(source, timeout)) {
                Ok(handle) => CollectorInstance::success(handle),
                Err(e) => CollectorInstance::failure(&e.to_string()),
            }
        })
    }

    /// Shuts an instance down; `timeout_ms = 0` waits indefinitely.
    ///
    /// The returned record echoes `handle`.
    pub fn shutdown(&self, handle: u32, timeout_ms: u32) -> CollectorInstance {
        let handle = Handle::from_raw(handle);
        guard("shutdown", || {
            let timeout = timeout_from_millis(u64::from(timeout_ms));
            let outcome = self.runtime.block_on(self.manager.shutdown(handle, timeout));
            let mut record = CollectorInstance::success(handle);
            if let Err(e) = outcome {
                record.set_error(&e.to_string());
            }
            record
        })
    }
}

/// Runs `f`, converting a panic into a failed record.
fn guard(op: &'static str, f: impl FnOnce() -> CollectorInstance) -> CollectorInstance {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(record) => record,
        Err(payload) => {
            let msg = panic_info(&*payload);
            error!(op, panic = %msg, "panic at collector boundary");
            CollectorInstance::failure(&format!("panic in `{op}`: {msg}"))
        }
    }
}

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if the process already set a global subscriber.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
