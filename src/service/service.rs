//! # Service trait.
//!
//! A [`Service`] is started by the manager on a detached tokio task. It receives a
//! [`CancellationToken`]; cancelling it is how the manager asks the service to stop.
//! The manager never pushes state into the service: it only reads
//! [`Service::state`] while waiting for startup.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::service::ServiceState;

/// Shared handle to a service instance.
pub type ServiceRef = Arc<dyn Service>;

/// # Long-running, cancelable service instance.
///
/// `run` covers the whole lifetime: start, serve until `ctx` is cancelled, shut down.
/// While doing so the implementation advances its own [`ServiceState`]
/// (`Starting → Running → Closing → Closed`).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use collectorvisor::{Service, ServiceError, ServiceState, StateCell};
///
/// struct Idle { state: StateCell }
///
/// #[async_trait]
/// impl Service for Idle {
///     fn name(&self) -> &str { "idle" }
///
///     fn state(&self) -> ServiceState { self.state.get() }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
///         self.state.advance(ServiceState::Running);
///         ctx.cancelled().await;
///         self.state.advance(ServiceState::Closed);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Returns a stable, human-readable name (used in events and status).
    fn name(&self) -> &str;

    /// Current lifecycle state. Must be cheap; it is polled.
    fn state(&self) -> ServiceState;

    /// Fail-fast validation of the configuration this service was built from.
    ///
    /// Runs before any background task exists. The default accepts everything.
    async fn dry_run(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Runs the service until it stops on its own or `ctx` is cancelled.
    ///
    /// Returning `Err(ServiceError::Canceled)` after cancellation counts as a clean stop.
    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError>;
}
