//! # Manager: owns the handle table and drives instance lifecycles.
//!
//! ```text
//! caller ── create(source, timeout) ──► Launcher ──► HandleTable (register)
//!                                                         │
//!                     caller holds the Handle ◄───────────┘
//! caller ── shutdown(handle, timeout) ─► Coordinator ─► HandleTable (take) ─► cancel ─► wait
//!
//! Launcher / Coordinator ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ## Rules
//! - The handle table is the only shared mutable state; calls may run concurrently
//!   from any number of tasks.
//! - A failed `create` never leaves a registered handle.
//! - Dropping the manager cancels every instance it still owns.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use collectorvisor::{
//!     FactoryFn, Manager, ManagerConfig, ResolvedConfig, Service, ServiceError, ServiceRef,
//!     ServiceState, StateCell,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! struct Pipeline {
//!     state: StateCell,
//! }
//!
//! #[async_trait]
//! impl Service for Pipeline {
//!     fn name(&self) -> &str { "pipeline" }
//!     fn state(&self) -> ServiceState { self.state.get() }
//!     async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
//!         self.state.advance(ServiceState::Running);
//!         ctx.cancelled().await;
//!         self.state.advance(ServiceState::Closed);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = FactoryFn::arc(|_cfg: &ResolvedConfig| -> Result<ServiceRef, ServiceError> {
//!         Ok(Arc::new(Pipeline { state: StateCell::new() }))
//!     });
//!     let manager = Manager::builder(ManagerConfig::default(), factory).build();
//!
//!     let handle = manager
//!         .create("yaml: {receivers: {otlp: {}}}", Some(Duration::from_secs(5)))
//!         .await?;
//!     manager.shutdown(handle, Some(Duration::from_secs(5))).await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::builder::ManagerBuilder;
use super::config::ManagerConfig;
use super::handle::Handle;
use super::launcher::Launcher;
use super::shutdown::Coordinator;
use super::table::{HandleTable, InstanceStatus};
use crate::config::Resolver;
use crate::error::ManagerError;
use crate::events::{Bus, Event};
use crate::service::FactoryRef;

/// Instance lifecycle manager.
pub struct Manager {
    cfg: ManagerConfig,
    resolver: Resolver,
    factory: FactoryRef,
    table: HandleTable,
    bus: Bus,
    runtime_token: CancellationToken,
}

impl Manager {
    /// Starts building a manager around `factory`.
    pub fn builder(cfg: ManagerConfig, factory: FactoryRef) -> ManagerBuilder {
        ManagerBuilder::new(cfg, factory)
    }

    pub(crate) fn new_internal(
        cfg: ManagerConfig,
        resolver: Resolver,
        factory: FactoryRef,
        table: HandleTable,
        bus: Bus,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            resolver,
            factory,
            table,
            bus,
            runtime_token,
        }
    }

    /// Creates an instance from `source` and returns its handle once it is running.
    ///
    /// `timeout` bounds the whole call; `None` waits indefinitely.
    ///
    /// # Errors
    /// - [`ManagerError::ConfigResolution`] if `source` cannot be resolved
    /// - [`ManagerError::Validation`] if the factory or dry run rejects the configuration
    /// - [`ManagerError::Service`] if the service failed before running
    /// - [`ManagerError::EarlyTermination`] if it ended before running without an error
    /// - [`ManagerError::StartupTimeout`] if the deadline passed first
    pub async fn create(
        &self,
        source: &str,
        timeout: Option<Duration>,
    ) -> Result<Handle, ManagerError> {
        self.launcher().create(source, timeout).await
    }

    /// Cancels the instance under `handle` and waits for it to finish.
    ///
    /// # Errors
    /// - [`ManagerError::UnknownHandle`] if `handle` is not registered (nothing changes)
    /// - [`ManagerError::ShutdownTimeout`] if the service did not finish in time
    /// - [`ManagerError::Service`] with the service's own terminal error
    pub async fn shutdown(
        &self,
        handle: Handle,
        timeout: Option<Duration>,
    ) -> Result<(), ManagerError> {
        self.coordinator().shutdown(handle, timeout).await
    }

    /// Stops every registered instance, waiting up to `grace` in total.
    ///
    /// # Errors
    /// [`ManagerError::GraceExceeded`] listing the handles that did not finish.
    pub async fn shutdown_all(&self, grace: Option<Duration>) -> Result<(), ManagerError> {
        self.coordinator().shutdown_all(grace).await
    }

    /// Current view of the instance under `handle`.
    pub fn status(&self, handle: Handle) -> Option<InstanceStatus> {
        self.table.status(handle)
    }

    /// True if `handle` is registered.
    pub fn contains(&self, handle: Handle) -> bool {
        self.table.contains(handle)
    }

    /// Registered handles in ascending order.
    pub fn handles(&self) -> Vec<Handle> {
        self.table.handles()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if no instance is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configuration this manager runs with.
    pub fn config(&self) -> &ManagerConfig {
        &self.cfg
    }

    /// Receiver of lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    fn launcher(&self) -> Launcher<'_> {
        Launcher {
            cfg: &self.cfg,
            resolver: &self.resolver,
            factory: self.factory.as_ref(),
            table: &self.table,
            bus: &self.bus,
            root: &self.runtime_token,
        }
    }

    fn coordinator(&self) -> Coordinator<'_> {
        Coordinator {
            cfg: &self.cfg,
            table: &self.table,
            bus: &self.bus,
        }
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}
