//! # LogWriter: renders lifecycle events through `tracing`
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  collectorvisor: instance running handle=3170449920 service="demo" elapsed_ms=6
//! WARN  collectorvisor: shutdown timed out handle=3170449920 service="demo" timeout_ms=1
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let handle = e.handle.map(|h| h.get());
        let service = e.service.as_deref();
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::CreateRequested => {
                debug!(source = e.source.as_deref(), timeout_ms = e.timeout_ms, "create requested");
            }
            EventKind::ConfigRejected => {
                warn!(source = e.source.as_deref(), reason, "configuration rejected");
            }
            EventKind::ValidationFailed => {
                warn!(service, reason, "validation failed");
            }
            EventKind::InstanceStarting => {
                debug!(service, "instance starting");
            }
            EventKind::InstanceRunning => {
                info!(handle, service, elapsed_ms = e.elapsed_ms, "instance running");
            }
            EventKind::StartupFailed => {
                warn!(service, reason, "instance ended before running");
            }
            EventKind::StartupTimedOut => {
                warn!(service, timeout_ms = e.timeout_ms, "startup timed out");
            }
            EventKind::ShutdownRequested => {
                debug!(handle, service, "shutdown requested");
            }
            EventKind::HandleUnknown => {
                debug!(handle, "unknown handle");
            }
            EventKind::InstanceStopped => {
                info!(handle, service, elapsed_ms = e.elapsed_ms, "instance stopped");
            }
            EventKind::InstanceFailed => {
                warn!(handle, service, reason, "instance stopped with error");
            }
            EventKind::ShutdownTimedOut => {
                warn!(handle, service, timeout_ms = e.timeout_ms, "shutdown timed out");
            }
            EventKind::InstanceRetained => {
                info!(handle, service, "instance retained for retry");
            }
            EventKind::InstanceRemoved => {
                debug!(handle, "instance removed");
            }
            EventKind::AllStoppedWithin => {
                info!("all instances stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(grace_ms = e.timeout_ms, stuck = reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = service, reason, "subscriber dropped event");
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = service, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
