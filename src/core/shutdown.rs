//! # Stop registered instances.
//!
//! [`Coordinator`] takes an instance out of the [`HandleTable`], cancels it and waits,
//! bounded, for its completion signal.
//!
//! ## Rules
//! - The entry is taken out **before** waiting: concurrent lookups of a handle being
//!   shut down already see it as gone, and a second shutdown gets `UnknownHandle`.
//! - Cancellation is non-blocking and idempotent.
//! - On timeout the handle stays removed unless the policy is [`TimeoutPolicy::Retain`].
//! - `shutdown_all` cancels everything first, then waits for all instances concurrently.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::Instant;

use super::completion::{deadline_after, settle, within};
use super::config::{ManagerConfig, TimeoutPolicy};
use super::handle::Handle;
use super::table::{HandleTable, InstanceController};
use crate::error::{ManagerError, ServiceError};
use crate::events::{Bus, Event, EventKind};

pub(crate) struct Coordinator<'a> {
    pub(crate) cfg: &'a ManagerConfig,
    pub(crate) table: &'a HandleTable,
    pub(crate) bus: &'a Bus,
}

impl Coordinator<'_> {
    pub(crate) async fn shutdown(
        &self,
        handle: Handle,
        timeout: Option<Duration>,
    ) -> Result<(), ManagerError> {
        let Some(ctrl) = self.table.take(handle) else {
            self.bus
                .publish(Event::new(EventKind::HandleUnknown).with_handle(handle));
            return Err(ManagerError::UnknownHandle { handle });
        };

        let name: Arc<str> = Arc::from(ctrl.service.name());
        let started = Instant::now();
        ctrl.cancel.cancel();
        self.bus.publish(
            Event::new(EventKind::ShutdownRequested)
                .with_handle(handle)
                .with_service(Arc::clone(&name)),
        );

        let InstanceController {
            service,
            cancel,
            mut done,
            started_at,
        } = ctrl;

        match within(deadline_after(started, timeout), &mut done).await {
            Some(joined) => {
                let outcome = settle(joined);
                self.publish_outcome(handle, &name, started.elapsed(), &outcome);
                self.publish_removed(handle);
                outcome.map_err(ManagerError::from)
            }
            None => {
                let timeout = timeout.unwrap_or_default();
                self.bus.publish(
                    Event::new(EventKind::ShutdownTimedOut)
                        .with_handle(handle)
                        .with_service(Arc::clone(&name))
                        .with_timeout(timeout),
                );
                match self.cfg.on_shutdown_timeout {
                    TimeoutPolicy::Release => self.publish_removed(handle),
                    TimeoutPolicy::Retain => {
                        let ctrl = InstanceController {
                            service,
                            cancel,
                            done,
                            started_at,
                        };
                        // The handle may have been reissued while we waited.
                        match self.table.restore(handle, ctrl) {
                            Ok(()) => self.bus.publish(
                                Event::new(EventKind::InstanceRetained)
                                    .with_handle(handle)
                                    .with_service(name),
                            ),
                            Err(_released) => self.publish_removed(handle),
                        }
                    }
                }
                Err(ManagerError::ShutdownTimeout { timeout })
            }
        }
    }

    /// Drains the table, cancels every instance and waits up to `grace` for all of them.
    ///
    /// Service errors are reported as events only; the result tells whether every
    /// instance finished in time.
    pub(crate) async fn shutdown_all(&self, grace: Option<Duration>) -> Result<(), ManagerError> {
        let entries = self.table.drain();
        for (_, ctrl) in &entries {
            ctrl.cancel.cancel();
        }

        let started = Instant::now();
        let deadline = deadline_after(started, grace);
        let waits = entries.into_iter().map(|(handle, ctrl)| async move {
            let name: Arc<str> = Arc::from(ctrl.service.name());
            let joined = within(deadline, ctrl.done).await;
            (handle, name, joined)
        });

        let mut stuck = Vec::new();
        for (handle, name, joined) in join_all(waits).await {
            match joined {
                Some(joined) => {
                    let outcome = settle(joined);
                    self.publish_outcome(handle, &name, started.elapsed(), &outcome);
                }
                None => stuck.push(handle),
            }
            self.publish_removed(handle);
        }

        if stuck.is_empty() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            return Ok(());
        }

        stuck.sort_unstable();
        let grace = grace.unwrap_or_default();
        let listed: Vec<String> = stuck.iter().map(Handle::to_string).collect();
        self.bus.publish(
            Event::new(EventKind::GraceExceeded)
                .with_timeout(grace)
                .with_reason(listed.join(",")),
        );
        Err(ManagerError::GraceExceeded { grace, stuck })
    }

    fn publish_outcome(
        &self,
        handle: Handle,
        name: &Arc<str>,
        elapsed: Duration,
        outcome: &Result<(), ServiceError>,
    ) {
        let ev = match outcome {
            Ok(()) => Event::new(EventKind::InstanceStopped).with_elapsed(elapsed),
            Err(e) => Event::new(EventKind::InstanceFailed).with_reason(e.to_string()),
        };
        self.bus
            .publish(ev.with_handle(handle).with_service(Arc::clone(name)));
    }

    fn publish_removed(&self, handle: Handle) {
        self.bus
            .publish(Event::new(EventKind::InstanceRemoved).with_handle(handle));
    }
}
