//! # Service factories.
//!
//! The manager does not know how to build a concrete service; it asks a
//! [`ServiceFactory`] for one, once per `create`, handing over the resolved
//! configuration. [`FactoryFn`] wraps a closure so embedders do not need a type.
//!
//! ## Example
//! ```rust
//! use collectorvisor::{FactoryFn, FactoryRef, ResolvedConfig, ServiceError, ServiceRef};
//!
//! let factory: FactoryRef = FactoryFn::arc(|_cfg: &ResolvedConfig| -> Result<ServiceRef, ServiceError> {
//!     Err(ServiceError::invalid_config("no pipelines configured"))
//! });
//! # let _ = factory;
//! ```

use std::sync::Arc;

use crate::config::ResolvedConfig;
use crate::error::ServiceError;
use crate::service::ServiceRef;

/// Shared handle to a factory.
pub type FactoryRef = Arc<dyn ServiceFactory>;

/// Builds service instances from resolved configuration.
pub trait ServiceFactory: Send + Sync + 'static {
    /// Creates a new, not yet started service.
    ///
    /// Returning [`ServiceError::InvalidConfig`] surfaces as a validation error.
    fn create(&self, config: &ResolvedConfig) -> Result<ServiceRef, ServiceError>;
}

/// Closure-backed factory.
pub struct FactoryFn<F> {
    f: F,
}

impl<F> FactoryFn<F>
where
    F: Fn(&ResolvedConfig) -> Result<ServiceRef, ServiceError> + Send + Sync + 'static,
{
    /// Wraps a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a [`FactoryRef`].
    pub fn arc(f: F) -> FactoryRef {
        Arc::new(Self::new(f))
    }
}

impl<F> ServiceFactory for FactoryFn<F>
where
    F: Fn(&ResolvedConfig) -> Result<ServiceRef, ServiceError> + Send + Sync + 'static,
{
    fn create(&self, config: &ResolvedConfig) -> Result<ServiceRef, ServiceError> {
        (self.f)(config)
    }
}
