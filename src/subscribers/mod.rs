//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! the built-in [`LogWriter`] for lifecycle events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! create()/shutdown() ── publish(Event) ──► Bus ──► manager listener
//!                                                        │
//!                                                        ▼
//!                                                  SubscriberSet::emit
//!                                               ┌────────┼─────────┐
//!                                               ▼        ▼         ▼
//!                                           LogWriter  Metrics   Custom
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub(crate) use set::panic_info;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
