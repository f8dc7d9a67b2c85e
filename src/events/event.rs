//! # Lifecycle events emitted by the manager.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Startup events**: create flow (requested, validation, running, failed, timeout)
//! - **Shutdown events**: stop flow (requested, stopped, failed, timeout, grace)
//! - **Subscriber events**: worker overflow and panics
//!
//! The [`Event`] struct carries metadata such as timestamps, handle, service name,
//! reasons and durations.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use collectorvisor::{Event, EventKind, Handle};
//!
//! let ev = Event::new(EventKind::ShutdownTimedOut)
//!     .with_handle(Handle::from_raw(42))
//!     .with_timeout(Duration::from_millis(1));
//!
//! assert_eq!(ev.kind, EventKind::ShutdownTimedOut);
//! assert_eq!(ev.handle, Some(Handle::from_raw(42)));
//! assert_eq!(ev.timeout_ms, Some(1));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::Handle;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup ===
    /// `create` was called.
    ///
    /// Sets: `source` (scheme only), `timeout_ms` when bounded.
    CreateRequested,

    /// Configuration could not be resolved.
    ///
    /// Sets: `source`, `reason`.
    ConfigRejected,

    /// Dry run or factory rejected the configuration.
    ///
    /// Sets: `service` (when built), `reason`.
    ValidationFailed,

    /// Service task spawned; polling for `Running`.
    ///
    /// Sets: `service`.
    InstanceStarting,

    /// Service reached `Running` and was registered.
    ///
    /// Sets: `handle`, `service`, `elapsed_ms`.
    InstanceRunning,

    /// Service ended before reaching `Running`.
    ///
    /// Sets: `service`, `reason`.
    StartupFailed,

    /// Creation deadline passed before `Running`; task cancelled.
    ///
    /// Sets: `service` (when built), `timeout_ms`.
    StartupTimedOut,

    // === Shutdown ===
    /// `shutdown` found the handle and cancelled its service.
    ///
    /// Sets: `handle`, `service`.
    ShutdownRequested,

    /// `shutdown` referenced an unknown handle.
    ///
    /// Sets: `handle`.
    HandleUnknown,

    /// Service finished cleanly after cancellation.
    ///
    /// Sets: `handle`, `service`, `elapsed_ms`.
    InstanceStopped,

    /// Service finished with an error after cancellation.
    ///
    /// Sets: `handle`, `service`, `reason`.
    InstanceFailed,

    /// Shutdown deadline passed before the service finished.
    ///
    /// Sets: `handle`, `service`, `timeout_ms`.
    ShutdownTimedOut,

    /// A timed-out instance was kept in the table for a later retry.
    ///
    /// Sets: `handle`, `service`.
    InstanceRetained,

    /// Handle removed from the table.
    ///
    /// Sets: `handle`.
    InstanceRemoved,

    /// `shutdown_all` finished every instance within the grace period.
    AllStoppedWithin,

    /// `shutdown_all` grace period exceeded.
    ///
    /// Sets: `timeout_ms` (grace), `reason` (stuck handles).
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `service` (subscriber name), `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `service` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Instance handle, if applicable.
    pub handle: Option<Handle>,
    /// Service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// Scheme of the configuration source.
    pub source: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Timeout or grace period in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Time spent in the operation in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            handle: None,
            service: None,
            source: None,
            reason: None,
            timeout_ms: None,
            elapsed_ms: None,
        }
    }

    /// Attaches an instance handle.
    #[inline]
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches the configuration source scheme.
    #[inline]
    pub fn with_source(mut self, scheme: impl Into<Arc<str>>) -> Self {
        self.source = Some(scheme.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a timeout (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an elapsed time (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        self.elapsed_ms = Some(compact_ms(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }

    /// True for events raised by subscriber workers themselves.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
