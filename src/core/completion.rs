//! # Completion signal of a service task.
//!
//! Every service runs on its own tokio task; the task's [`JoinHandle`] is the
//! one-shot completion signal. It fires exactly once, whatever ended the task
//! (clean return, error, cancellation, panic).
//!
//! ## Rules
//! - `Err(ServiceError::Canceled)` from `run` is folded into `Ok(())`.
//! - A panic becomes `ServiceError::Panicked`; an abort becomes `ServiceError::Aborted`.
//! - Exactly one path awaits a given signal: the launcher before registration,
//!   the shutdown coordinator after it.

use std::future::Future;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::service::ServiceRef;
use crate::subscribers::panic_info;

/// One-shot completion signal of a detached service task.
pub(crate) type Completion = JoinHandle<Result<(), ServiceError>>;

/// Spawns `service.run(ctx)` as a detached task.
pub(crate) fn spawn_service(service: ServiceRef, ctx: CancellationToken) -> Completion {
    tokio::spawn(async move {
        match service.run(ctx).await {
            Err(e) if e.is_clean_stop() => Ok(()),
            other => other,
        }
    })
}

/// Maps a joined task into the service's terminal outcome.
pub(crate) fn settle(joined: Result<Result<(), ServiceError>, JoinError>) -> Result<(), ServiceError> {
    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_panic() => Err(ServiceError::Panicked {
            info: panic_info(&*e.into_panic()),
        }),
        Err(_) => Err(ServiceError::Aborted),
    }
}

/// Deadline `timeout` after `started`; `None` without a timeout.
///
/// A timeout too large to represent as an instant also yields `None`.
pub(crate) fn deadline_after(started: Instant, timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|t| started.checked_add(t))
}

/// Runs `fut` until `deadline`; `None` means no deadline.
///
/// Returns `None` when the deadline passed first.
pub(crate) async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}
