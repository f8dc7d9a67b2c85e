//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the launcher, the shutdown
//! coordinator and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Manager::create` (launcher), `Manager::shutdown`,
//!   `Manager::shutdown_all`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the manager's listener, which fans out to `SubscriberSet`.
//!
//! Events are observational only; the state machine never waits on them.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
