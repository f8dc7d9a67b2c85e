//! # Service abstractions.
//!
//! This module provides the collaborator types the manager drives:
//! - [`Service`] - trait for a long-running, cancelable service instance
//! - [`ServiceRef`] - shared reference to a service (`Arc<dyn Service>`)
//! - [`ServiceState`] / [`StateCell`] - lifecycle state and an atomic holder for it
//! - [`ServiceFactory`] / [`FactoryFn`] - builds a service from a resolved configuration

mod factory;
mod service;
mod state;

pub use factory::{FactoryFn, FactoryRef, ServiceFactory};
pub use service::{Service, ServiceRef};
pub use state::{ServiceState, StateCell};
