//! # Launch one service instance.
//!
//! Resolves the configuration, builds the service, optionally dry-runs it, spawns it
//! as a detached task and polls until it is `Running`. Only then is the instance
//! registered in the [`HandleTable`].
//!
//! ## Flow
//! ```text
//! resolve ──► factory.create ──► dry_run? ──► spawn run(ctx) ──► poll state
//!    │              │               │                             │
//!    ▼              ▼               ▼                  Running ───┼──► register → Ok(handle)
//! ConfigResolution Validation   Validation      Closing/ended ───┼──► Service(e) | EarlyTermination
//!                  /Service                          deadline ───┴──► cancel → StartupTimeout
//! ```
//!
//! ## Rules
//! - The creation timeout bounds the whole call; `None` (or a timeout past the
//!   representable range) waits indefinitely.
//! - Every failure path cancels the task it spawned; nothing is registered.
//! - The completion signal is drained only when the task has ended or is closing.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::completion::{Completion, deadline_after, settle, spawn_service, within};
use super::config::ManagerConfig;
use super::handle::Handle;
use super::table::{HandleTable, InstanceController};
use crate::config::Resolver;
use crate::error::{ManagerError, ServiceError};
use crate::events::{Bus, Event, EventKind};
use crate::service::{ServiceFactory, ServiceRef, ServiceState};

/// Outcome of the startup poll.
enum Startup {
    Running,
    Ended(Result<(), ServiceError>),
}

/// Borrowed view of the manager parts one `create` needs.
pub(crate) struct Launcher<'a> {
    pub(crate) cfg: &'a ManagerConfig,
    pub(crate) resolver: &'a Resolver,
    pub(crate) factory: &'a dyn ServiceFactory,
    pub(crate) table: &'a HandleTable,
    pub(crate) bus: &'a Bus,
    pub(crate) root: &'a CancellationToken,
}

impl Launcher<'_> {
    pub(crate) async fn create(
        &self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<Handle, ManagerError> {
        let started = Instant::now();
        let deadline = deadline_after(started, timeout);
        let scheme = source.split_once(':').map_or("", |(s, _)| s);

        let mut ev = Event::new(EventKind::CreateRequested).with_source(scheme);
        if let Some(t) = timeout {
            ev = ev.with_timeout(t);
        }
        self.bus.publish(ev);

        let resolved = match within(deadline, self.resolver.resolve(source)).await {
            None => return Err(self.startup_timed_out(None, timeout)),
            Some(Err(e)) => {
                self.bus.publish(
                    Event::new(EventKind::ConfigRejected)
                        .with_source(scheme)
                        .with_reason(e.to_string()),
                );
                return Err(e.into());
            }
            Some(Ok(resolved)) => resolved,
        };

        let service = self
            .factory
            .create(&resolved)
            .map_err(|e| self.rejected(None, e))?;
        let name: Arc<str> = Arc::from(service.name());

        if self.cfg.dry_run {
            match within(deadline, service.dry_run()).await {
                None => return Err(self.startup_timed_out(Some(&name), timeout)),
                Some(Err(e)) => {
                    return Err(self.rejected(
                        Some(&name),
                        ServiceError::InvalidConfig {
                            reason: e.as_message(),
                        },
                    ));
                }
                Some(Ok(())) => {}
            }
        }

        let cancel = self.root.child_token();
        let mut done = spawn_service(Arc::clone(&service), cancel.clone());
        let guard = cancel.clone().drop_guard();
        self.bus
            .publish(Event::new(EventKind::InstanceStarting).with_service(Arc::clone(&name)));

        let poll = self.cfg.poll_interval_clamped();
        match within(deadline, wait_for_startup(&service, &mut done, poll)).await {
            Some(Startup::Running) => {
                let cancel = guard.disarm();
                let handle = self
                    .table
                    .register(InstanceController::new(service, cancel, done));
                self.bus.publish(
                    Event::new(EventKind::InstanceRunning)
                        .with_handle(handle)
                        .with_service(name)
                        .with_elapsed(started.elapsed()),
                );
                Ok(handle)
            }
            Some(Startup::Ended(outcome)) => {
                drop(guard);
                let err = match outcome {
                    Err(e) => ManagerError::Service(e),
                    Ok(()) => ManagerError::EarlyTermination,
                };
                self.bus.publish(
                    Event::new(EventKind::StartupFailed)
                        .with_service(name)
                        .with_reason(err.to_string()),
                );
                Err(err)
            }
            None => {
                drop(guard);
                Err(self.startup_timed_out(Some(&name), timeout))
            }
        }
    }

    /// Factory or dry-run rejection. Invalid configuration becomes `Validation`.
    fn rejected(&self, name: Option<&Arc<str>>, err: ServiceError) -> ManagerError {
        let err = match err {
            ServiceError::InvalidConfig { reason } => ManagerError::Validation { reason },
            other => ManagerError::Service(other),
        };
        let mut ev = Event::new(EventKind::ValidationFailed).with_reason(err.to_string());
        if let Some(name) = name {
            ev = ev.with_service(Arc::clone(name));
        }
        self.bus.publish(ev);
        err
    }

    fn startup_timed_out(&self, name: Option<&Arc<str>>, timeout: Option<Duration>) -> ManagerError {
        let timeout = timeout.unwrap_or_default();
        let mut ev = Event::new(EventKind::StartupTimedOut).with_timeout(timeout);
        if let Some(name) = name {
            ev = ev.with_service(Arc::clone(name));
        }
        self.bus.publish(ev);
        ManagerError::StartupTimeout { timeout }
    }
}

/// Polls `service` every `poll` until it runs or its task ends.
///
/// The first check happens immediately.
async fn wait_for_startup(service: &ServiceRef, done: &mut Completion, poll: Duration) -> Startup {
    let mut ticker = time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match service.state() {
            ServiceState::Running => return Startup::Running,
            ServiceState::Closing | ServiceState::Closed => {
                return Startup::Ended(settle(done.await));
            }
            ServiceState::Starting if done.is_finished() => {
                return Startup::Ended(settle(done.await));
            }
            ServiceState::Starting => {}
        }
    }
}
