//! # collectorvisor
//!
//! **Collectorvisor** starts and stops long-running background services
//! ("collectors") on behalf of a caller that only speaks a narrow, synchronous,
//! C-compatible interface.
//!
//! Each instance is created from a configuration URI, dry-run, spawned as a detached
//! task and polled until it reports `Running`; only then does the caller get an
//! opaque [`Handle`]. Shutdown cancels the instance and waits for it, bounded by a
//! timeout. Many callers may create and stop instances concurrently.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   C caller ── NewCollector / ShutdownCollector ──► Host (tokio runtime)
//!                                                      │ block_on
//!                                                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Manager                                                          │
//! │  - Resolver       (yaml:/file:/env:/http(s): providers, ${ENV})   │
//! │  - ServiceFactory (builds a Service from ResolvedConfig)          │
//! │  - HandleTable    (Mutex<HashMap<Handle, InstanceController>>)    │
//! │  - Bus            (broadcast lifecycle events)                    │
//! └──────┬──────────────────────────────┬─────────────────────────────┘
//!        │ create                       │ shutdown / shutdown_all
//!        ▼                              ▼
//!  ┌──────────────┐               ┌──────────────┐
//!  │   Launcher   │               │ Coordinator  │
//!  │ resolve, dry │               │ take, cancel,│
//!  │ run, spawn,  │               │ wait bounded │
//!  │ poll state   │               └──────────────┘
//!  └──────┬───────┘
//!         ▼
//!   Service::run(ctx) on its own task (JoinHandle = completion signal)
//!
//!  Launcher / Coordinator ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                 ┌───────┼───────┐
//!                                                                 ▼       ▼       ▼
//!                                                            LogWriter  custom  custom
//! ```
//!
//! ### Instance lifecycle
//! ```text
//! create(source, T)
//!   ├─► resolve ── error ──► ConfigResolution
//!   ├─► factory + dry_run ── error ──► Validation
//!   ├─► spawn run(ctx)
//!   └─► every poll_interval:
//!         ├─ Running        ─► register handle ─► Ok(handle)
//!         ├─ Closing/ended  ─► Service(e) | EarlyTermination
//!         └─ T elapsed      ─► cancel ─► StartupTimeout
//!
//! shutdown(handle, T)
//!   ├─► take from table ── absent ──► UnknownHandle
//!   ├─► cancel ctx
//!   └─► wait ─┬─ finished ─► Ok | Service(e)
//!             └─ T elapsed ─► ShutdownTimeout (handle released, or retained by policy)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Services**      | The long-running unit and how it is built.                    | [`Service`], [`ServiceFactory`], [`StateCell`] |
//! | **Management**    | Create, inspect and stop instances by handle.                 | [`Manager`], [`Handle`], [`InstanceStatus`] |
//! | **Configuration** | Resolve `scheme:rest` sources; manager settings.              | [`Resolver`], [`ManagerConfig`]            |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, audit).         | [`Subscribe`], [`LogWriter`]               |
//! | **Errors**        | Typed errors for management, services and resolution.         | [`ManagerError`], [`ServiceError`], [`ConfigError`] |
//! | **Boundary**      | C-compatible record and exported functions.                   | [`ffi::CollectorInstance`], [`ffi::Host`]  |
//!
//! ## Optional features
//! - `http` (default): `http:` and `https:` configuration providers via `reqwest`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use async_trait::async_trait;
//! use collectorvisor::{
//!     FactoryFn, LogWriter, Manager, ManagerConfig, ManagerError, ResolvedConfig, Service,
//!     ServiceError, ServiceRef, ServiceState, StateCell, Subscribe,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo {
//!     endpoint: String,
//!     state: StateCell,
//! }
//!
//! #[async_trait]
//! impl Service for Echo {
//!     fn name(&self) -> &str { "echo" }
//!     fn state(&self) -> ServiceState { self.state.get() }
//!     async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
//!         self.state.advance(ServiceState::Running);
//!         ctx.cancelled().await;
//!         self.state.advance(ServiceState::Closed);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ManagerError> {
//!     let factory = FactoryFn::arc(|cfg: &ResolvedConfig| -> Result<ServiceRef, ServiceError> {
//!         let endpoint = cfg
//!             .get("receivers.echo.endpoint")
//!             .and_then(|v| v.as_str())
//!             .ok_or_else(|| ServiceError::invalid_config("receivers.echo.endpoint missing"))?;
//!         Ok(Arc::new(Echo { endpoint: endpoint.to_string(), state: StateCell::new() }))
//!     });
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let manager = Manager::builder(ManagerConfig::default(), factory)
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let handle = manager
//!         .create("yaml: {receivers: {echo: {endpoint: 'localhost:4317'}}}", Some(Duration::from_secs(5)))
//!         .await?;
//!     assert!(manager.contains(handle));
//!
//!     manager.shutdown(handle, Some(Duration::from_secs(5))).await?;
//!     assert!(manager.is_empty());
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod service;
mod subscribers;

pub mod ffi;

// ---- Public re-exports ----

#[cfg(feature = "http")]
pub use config::HttpProvider;
pub use config::{
    ConfigError, ConfigSource, Converter, EnvLookup, EnvProvider, ExpandConverter, FileProvider,
    Provider, ResolvedConfig, Resolver, YamlProvider,
};
pub use crate::core::{
    ENV_PREFIX, Handle, InstanceStatus, Manager, ManagerBuilder, ManagerConfig, TimeoutPolicy,
    timeout_from_millis,
};
pub use error::{ManagerError, ServiceError};
pub use events::{Bus, Event, EventKind};
pub use service::{
    FactoryFn, FactoryRef, Service, ServiceFactory, ServiceRef, ServiceState, StateCell,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
