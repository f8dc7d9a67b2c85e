//! Error types used by the collectorvisor manager and services.
//!
//! This module defines two main error enums:
//!
//! - [`ManagerError`] for errors raised by the instance lifecycle manager itself.
//! - [`ServiceError`] for errors raised by individual service executions.
//!
//! Both types provide `as_label` for logging, and every message is what ends up in
//! the boundary error buffer.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::core::Handle;

/// # Errors produced by the instance lifecycle manager.
///
/// Every failure of [`Manager::create`](crate::Manager::create) and
/// [`Manager::shutdown`](crate::Manager::shutdown) is one of these. None of them
/// is retried by the manager.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The configuration source could not be fetched or parsed. No handle was registered.
    #[error("configuration resolution failed: {0}")]
    ConfigResolution(#[from] ConfigError),

    /// The dry run rejected the resolved configuration. No task was started.
    #[error("invalid configuration: {reason}")]
    Validation {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// The service did not reach `Running` within the creation timeout.
    ///
    /// The background task has been cancelled, but may still be finishing.
    #[error("startup deadline exceeded after {timeout:?}")]
    StartupTimeout {
        /// The creation timeout that was exceeded.
        timeout: Duration,
    },

    /// The service task ended before reaching `Running` without reporting an error.
    #[error("service terminated before reaching running state without explanation")]
    EarlyTermination,

    /// The handle is not present in the table.
    #[error("handle not known: {handle}")]
    UnknownHandle {
        /// The handle that was looked up.
        handle: Handle,
    },

    /// Cancellation was requested but the service did not finish in time.
    #[error("shutdown deadline exceeded after {timeout:?}")]
    ShutdownTimeout {
        /// The shutdown timeout that was exceeded.
        timeout: Duration,
    },

    /// `shutdown_all` grace period was exceeded; some instances did not finish.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Handles whose services did not finish in time.
        stuck: Vec<Handle>,
    },

    /// The service's own terminal error, passed through verbatim.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ManagerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use collectorvisor::ManagerError;
    /// use std::time::Duration;
    ///
    /// let err = ManagerError::ShutdownTimeout { timeout: Duration::from_millis(1) };
    /// assert_eq!(err.as_label(), "shutdown_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ManagerError::ConfigResolution(_) => "config_resolution",
            ManagerError::Validation { .. } => "validation",
            ManagerError::StartupTimeout { .. } => "startup_timeout",
            ManagerError::EarlyTermination => "early_termination",
            ManagerError::UnknownHandle { .. } => "unknown_handle",
            ManagerError::ShutdownTimeout { .. } => "shutdown_timeout",
            ManagerError::GraceExceeded { .. } => "grace_exceeded",
            ManagerError::Service(_) => "service_reported",
        }
    }

    /// True for errors that mean the deadline passed while the task may still run.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ManagerError::StartupTimeout { .. }
                | ManagerError::ShutdownTimeout { .. }
                | ManagerError::GraceExceeded { .. }
        )
    }
}

/// # Errors produced by a service.
///
/// Returned by [`Service::dry_run`](crate::Service::dry_run) and
/// [`Service::run`](crate::Service::run), or synthesized by the manager when the
/// service task panics.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The configuration handed to the service is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// The service failed while running.
    #[error("service failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The service task panicked.
    #[error("service panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The service task was aborted before it could report an outcome.
    #[error("service task aborted")]
    Aborted,

    /// The service observed cancellation and stopped.
    #[error("context cancelled")]
    Canceled,
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        ServiceError::Failed {
            error: error.into(),
        }
    }

    /// Shorthand for [`ServiceError::InvalidConfig`].
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        ServiceError::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use collectorvisor::ServiceError;
    ///
    /// let err = ServiceError::failed("exporter unreachable");
    /// assert_eq!(err.as_label(), "service_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::InvalidConfig { .. } => "service_invalid_config",
            ServiceError::Failed { .. } => "service_failed",
            ServiceError::Panicked { .. } => "service_panicked",
            ServiceError::Aborted => "service_aborted",
            ServiceError::Canceled => "service_canceled",
        }
    }

    /// Returns the bare detail text without the variant prefix.
    pub fn as_message(&self) -> String {
        match self {
            ServiceError::InvalidConfig { reason } => reason.clone(),
            ServiceError::Failed { error } => error.clone(),
            ServiceError::Panicked { info } => format!("panic: {info}"),
            ServiceError::Aborted => "aborted".to_string(),
            ServiceError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether this outcome counts as a clean stop.
    ///
    /// A service that returns [`ServiceError::Canceled`] after its context was
    /// cancelled has stopped the way it was asked to.
    pub fn is_clean_stop(&self) -> bool {
        matches!(self, ServiceError::Canceled)
    }
}
