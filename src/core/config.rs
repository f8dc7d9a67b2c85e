//! # Manager configuration.
//!
//! Provides [`ManagerConfig`], the settings shared by every `create`/`shutdown`
//! call of one [`Manager`](crate::Manager).
//!
//! Values come from [`Default`] or, for hosts configured from the process
//! environment, from [`ManagerConfig::from_env`]:
//!
//! | variable                                      | field                  |
//! |-----------------------------------------------|------------------------|
//! | `COLLECTORVISOR_POLL_INTERVAL_MS`             | `poll_interval`        |
//! | `COLLECTORVISOR_DRY_RUN`                      | `dry_run`              |
//! | `COLLECTORVISOR_RETAIN_ON_SHUTDOWN_TIMEOUT`   | `on_shutdown_timeout`  |
//! | `COLLECTORVISOR_BUS_CAPACITY`                 | `bus_capacity`         |
//!
//! ## Sentinel values
//! - `poll_interval = 0` → clamped to 1 ms
//! - timeouts at the boundary: `0` ms → wait indefinitely ([`timeout_from_millis`])

use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Prefix of the environment variables read by [`ManagerConfig::from_env`].
pub const ENV_PREFIX: &str = "COLLECTORVISOR_";

/// What `shutdown` does with an instance whose service missed the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeoutPolicy {
    /// Remove the handle anyway; the task is left to finish on its own.
    #[default]
    Release,
    /// Put the instance back under the same handle so the caller can retry.
    Retain,
}

/// Configuration of the instance lifecycle manager.
///
/// ## Field semantics
/// - `poll_interval`: how often `create` reads the service state while starting
/// - `dry_run`: run `Service::dry_run` before spawning the service task
/// - `on_shutdown_timeout`: see [`TimeoutPolicy`]
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Startup poll period.
    pub poll_interval: Duration,

    /// Fail-fast validation before start.
    pub dry_run: bool,

    /// Shutdown timeout behaviour.
    pub on_shutdown_timeout: TimeoutPolicy,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl ManagerConfig {
    /// Poll period, never zero.
    #[inline]
    pub fn poll_interval_clamped(&self) -> Duration {
        self.poll_interval.max(Duration::from_millis(1))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Figment seeded with the default values, for callers layering their own providers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(EnvSettings::default()))
    }

    /// Defaults overlaid with `COLLECTORVISOR_*` environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if a variable does not hold a value of the expected type.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment().merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Extracts a configuration from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on missing or mistyped keys.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let raw: EnvSettings = figment.extract().map_err(|e| ConfigError::Parse {
            error: e.to_string(),
        })?;
        Ok(raw.into())
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `poll_interval = 5ms`
    /// - `dry_run = true`
    /// - `on_shutdown_timeout = TimeoutPolicy::Release`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            dry_run: true,
            on_shutdown_timeout: TimeoutPolicy::Release,
            bus_capacity: 1024,
        }
    }
}

/// Flat, serde-friendly mirror of [`ManagerConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EnvSettings {
    poll_interval_ms: u64,
    dry_run: bool,
    retain_on_shutdown_timeout: bool,
    bus_capacity: usize,
}

impl Default for EnvSettings {
    fn default() -> Self {
        let cfg = ManagerConfig::default();
        Self {
            poll_interval_ms: cfg.poll_interval.as_millis() as u64,
            dry_run: cfg.dry_run,
            retain_on_shutdown_timeout: cfg.on_shutdown_timeout == TimeoutPolicy::Retain,
            bus_capacity: cfg.bus_capacity,
        }
    }
}

impl From<EnvSettings> for ManagerConfig {
    fn from(raw: EnvSettings) -> Self {
        Self {
            poll_interval: Duration::from_millis(raw.poll_interval_ms),
            dry_run: raw.dry_run,
            on_shutdown_timeout: if raw.retain_on_shutdown_timeout {
                TimeoutPolicy::Retain
            } else {
                TimeoutPolicy::Release
            },
            bus_capacity: raw.bus_capacity,
        }
    }
}

/// Converts a boundary timeout in milliseconds; `0` means wait indefinitely.
#[inline]
pub fn timeout_from_millis(ms: u64) -> Option<Duration> {
    (ms != 0).then(|| Duration::from_millis(ms))
}
