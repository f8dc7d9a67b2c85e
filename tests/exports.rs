//! Exported functions share one process-wide host, so the whole sequence runs in a
//! single test.

use std::ffi::CString;
use std::sync::Arc;

use async_trait::async_trait;
use collectorvisor::ffi::{self, HostError, NewCollector, ShutdownCollector};
use collectorvisor::{
    FactoryFn, Manager, ManagerConfig, ResolvedConfig, Service, ServiceError, ServiceRef,
    ServiceState, StateCell,
};
use tokio_util::sync::CancellationToken;

struct Idle(StateCell);

#[async_trait]
impl Service for Idle {
    fn name(&self) -> &str {
        "idle"
    }

    fn state(&self) -> ServiceState {
        self.0.get()
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        self.0.advance(ServiceState::Running);
        ctx.cancelled().await;
        self.0.advance(ServiceState::Closed);
        Ok(())
    }
}

fn builder() -> collectorvisor::ManagerBuilder {
    let factory = FactoryFn::arc(|_cfg: &ResolvedConfig| -> Result<ServiceRef, ServiceError> {
        Ok(Arc::new(Idle(StateCell::new())))
    });
    Manager::builder(ManagerConfig::default(), factory)
}

#[test]
fn test_exported_functions_lifecycle() {
    let config = CString::new("yaml: {receivers: {otlp: {}}}").unwrap();

    let early = unsafe { NewCollector(config.as_ptr(), 1_000) };
    assert_eq!(early.handle, 0);
    assert_eq!(
        early.error_message().as_deref(),
        Some("collector host not installed")
    );
    let early = ShutdownCollector(7, 1_000);
    assert_eq!(early.handle, 7);
    assert_eq!(
        early.error_message().as_deref(),
        Some("collector host not installed")
    );

    ffi::install(builder()).unwrap();
    assert!(ffi::installed().is_some());
    assert!(matches!(
        ffi::install(builder()),
        Err(HostError::AlreadyInstalled)
    ));

    let created = unsafe { NewCollector(config.as_ptr(), 5_000) };
    assert!(created.is_success(), "{created:?}");
    assert_ne!(created.handle, 0);

    let stopped = ShutdownCollector(created.handle, 5_000);
    assert!(stopped.is_success(), "{stopped:?}");

    let repeated = ShutdownCollector(created.handle, 5_000);
    assert!(repeated.error_message().unwrap().starts_with("handle not known"));

    let null = unsafe { NewCollector(std::ptr::null(), 1_000) };
    assert_eq!(
        null.error_message().as_deref(),
        Some("invalid argument: null configuration pointer")
    );
}
