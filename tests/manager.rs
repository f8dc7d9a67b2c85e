use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use collectorvisor::{
    Event, EventKind, FactoryFn, FactoryRef, Handle, LogWriter, Manager, ManagerBuilder, ManagerConfig,
    ManagerError, ResolvedConfig, Service, ServiceError, ServiceRef, ServiceState, StateCell,
    Subscribe, TimeoutPolicy,
};
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

const SOURCE: &str = "yaml: {receivers: {otlp: {}}, service: {pipelines: {traces: {}}}}";
const POLL: Duration = Duration::from_millis(5);

#[derive(Clone)]
enum Startup {
    RunAfter(Duration),
    Never,
    Fail(&'static str),
    ExitQuietly,
    CloseQuietly,
    CloseThenFail(Duration, &'static str),
    CloseAndHang,
    Panic,
}

#[derive(Clone)]
enum Stop {
    Clean,
    Fail(&'static str),
    Hang,
    Slow(Duration),
}

#[derive(Default)]
struct Witness {
    runs: AtomicUsize,
    exited: AtomicBool,
}

#[derive(Clone)]
struct Script {
    startup: Startup,
    stop: Stop,
    dry_run: Option<&'static str>,
    witness: Arc<Witness>,
}

impl Script {
    fn new(startup: Startup, stop: Stop) -> Self {
        Self {
            startup,
            stop,
            dry_run: None,
            witness: Arc::new(Witness::default()),
        }
    }

    fn running() -> Self {
        Self::new(Startup::RunAfter(Duration::ZERO), Stop::Clean)
    }

    fn rejecting(mut self, reason: &'static str) -> Self {
        self.dry_run = Some(reason);
        self
    }

    fn factory(&self) -> FactoryRef {
        let script = self.clone();
        FactoryFn::arc(move |_cfg: &ResolvedConfig| -> Result<ServiceRef, ServiceError> {
            Ok(Arc::new(Stub {
                script: script.clone(),
                state: StateCell::new(),
            }))
        })
    }

    fn manager(&self) -> Arc<Manager> {
        self.builder(ManagerConfig::default()).build()
    }

    fn builder(&self, cfg: ManagerConfig) -> ManagerBuilder {
        Manager::builder(cfg, self.factory())
    }
}

struct Stub {
    script: Script,
    state: StateCell,
}

impl Drop for Stub {
    fn drop(&mut self) {
        self.script.witness.exited.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Service for Stub {
    fn name(&self) -> &str {
        "stub"
    }

    fn state(&self) -> ServiceState {
        self.state.get()
    }

    async fn dry_run(&self) -> Result<(), ServiceError> {
        match self.script.dry_run {
            Some(reason) => Err(ServiceError::invalid_config(reason)),
            None => Ok(()),
        }
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
        self.script.witness.runs.fetch_add(1, Ordering::SeqCst);

        match self.script.startup.clone() {
            Startup::RunAfter(delay) => {
                tokio::select! {
                    _ = ctx.cancelled() => return Err(ServiceError::Canceled),
                    _ = time::sleep(delay) => {}
                }
                self.state.advance(ServiceState::Running);
            }
            Startup::Never => {
                ctx.cancelled().await;
                return Err(ServiceError::Canceled);
            }
            Startup::Fail(msg) => {
                self.state.advance(ServiceState::Closed);
                return Err(ServiceError::failed(msg));
            }
            Startup::ExitQuietly => return Ok(()),
            Startup::CloseQuietly => {
                self.state.advance(ServiceState::Closed);
                return Ok(());
            }
            Startup::CloseThenFail(delay, msg) => {
                self.state.advance(ServiceState::Closing);
                time::sleep(delay).await;
                self.state.advance(ServiceState::Closed);
                return Err(ServiceError::failed(msg));
            }
            Startup::CloseAndHang => {
                self.state.advance(ServiceState::Closing);
                ctx.cancelled().await;
                return Err(ServiceError::Canceled);
            }
            Startup::Panic => panic!("receiver bind exploded"),
        }

        ctx.cancelled().await;
        self.state.advance(ServiceState::Closing);
        let outcome = match self.script.stop.clone() {
            Stop::Clean => Ok(()),
            Stop::Fail(msg) => Err(ServiceError::failed(msg)),
            Stop::Hang => std::future::pending().await,
            Stop::Slow(delay) => {
                time::sleep(delay).await;
                Ok(())
            }
        };
        self.state.advance(ServiceState::Closed);
        outcome
    }
}

fn secs(n: u64) -> Option<Duration> {
    Some(Duration::from_secs(n))
}

fn millis(n: u64) -> Option<Duration> {
    Some(Duration::from_millis(n))
}

#[tokio::test]
async fn test_create_then_shutdown() {
    let manager = Script::running().manager();

    let handle = manager.create(SOURCE, secs(5)).await.unwrap();
    assert!(handle.is_valid());
    assert!(manager.contains(handle));

    let status = manager.status(handle).unwrap();
    assert_eq!(status.service, "stub");
    assert_eq!(status.state, ServiceState::Running);
    assert!(!status.finished);

    manager.shutdown(handle, secs(5)).await.unwrap();
    assert!(!manager.contains(handle));
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_second_shutdown_reports_unknown_handle() {
    let manager = Script::running().manager();
    let handle = manager.create(SOURCE, secs(5)).await.unwrap();

    manager.shutdown(handle, secs(5)).await.unwrap();
    let err = manager.shutdown(handle, secs(5)).await.unwrap_err();
    assert!(matches!(err, ManagerError::UnknownHandle { handle: h } if h == handle));
}

#[tokio::test]
async fn test_unknown_handle_leaves_table_unchanged() {
    let manager = Script::running().manager();
    let live = manager.create(SOURCE, secs(5)).await.unwrap();
    let stranger = Handle::from_raw(live.get().wrapping_add(1).max(1));

    let err = manager.shutdown(stranger, secs(1)).await.unwrap_err();
    assert!(err.to_string().starts_with("handle not known"));
    assert_eq!(err.as_label(), "unknown_handle");
    assert_eq!(manager.handles(), vec![live]);
}

#[tokio::test(start_paused = true)]
async fn test_startup_timeout_when_never_running() {
    let script = Script::new(Startup::Never, Stop::Clean);
    let manager = script.manager();

    let started = Instant::now();
    let err = manager.create(SOURCE, millis(50)).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ManagerError::StartupTimeout { timeout } if timeout == Duration::from_millis(50)));
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed <= Duration::from_millis(50) + POLL);
    assert!(manager.is_empty());

    time::sleep(Duration::from_millis(10)).await;
    assert!(script.witness.exited.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_create_returns_promptly_once_running() {
    let manager = Script::new(Startup::RunAfter(Duration::from_millis(20)), Stop::Clean).manager();

    let started = Instant::now();
    let handle = manager.create(SOURCE, secs(10)).await.unwrap();

    assert!(started.elapsed() <= Duration::from_millis(20) + POLL);
    assert!(manager.contains(handle));
}

#[tokio::test]
async fn test_unbounded_create_waits_for_running() {
    let manager = Script::new(Startup::RunAfter(Duration::from_millis(15)), Stop::Clean).manager();

    let handle = manager.create(SOURCE, None).await.unwrap();
    manager.shutdown(handle, None).await.unwrap();
}

#[tokio::test]
async fn test_quiet_exit_before_running_is_early_termination() {
    for startup in [Startup::ExitQuietly, Startup::CloseQuietly] {
        let manager = Script::new(startup, Stop::Clean).manager();

        let err = manager.create(SOURCE, secs(5)).await.unwrap_err();
        assert!(matches!(err, ManagerError::EarlyTermination));
        assert_eq!(
            err.to_string(),
            "service terminated before reaching running state without explanation"
        );
        assert!(manager.is_empty());
    }
}

#[tokio::test]
async fn test_failure_before_running_is_passed_through() {
    let manager = Script::new(Startup::Fail("port 4317 already in use"), Stop::Clean).manager();

    let err = manager.create(SOURCE, secs(5)).await.unwrap_err();
    assert!(matches!(err, ManagerError::Service(ServiceError::Failed { .. })));
    assert_eq!(err.to_string(), "service failed: port 4317 already in use");
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_closing_before_running_waits_for_error() {
    let script = Script::new(
        Startup::CloseThenFail(Duration::from_millis(20), "exporter drain failed"),
        Stop::Clean,
    );
    let manager = script.manager();

    let err = manager.create(SOURCE, secs(5)).await.unwrap_err();
    assert!(matches!(err, ManagerError::Service(ServiceError::Failed { .. })));
    assert_eq!(err.to_string(), "service failed: exporter drain failed");
    assert!(manager.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_closing_before_running_is_bounded_by_deadline() {
    let script = Script::new(Startup::CloseAndHang, Stop::Clean);
    let manager = script.manager();

    let started = Instant::now();
    let err = manager.create(SOURCE, millis(50)).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, ManagerError::StartupTimeout { timeout } if timeout == Duration::from_millis(50)));
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed <= Duration::from_millis(50) + POLL);
    assert!(manager.is_empty());

    time::sleep(Duration::from_millis(10)).await;
    assert!(script.witness.exited.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_panic_before_running_is_reported() {
    let manager = Script::new(Startup::Panic, Stop::Clean).manager();

    let err = manager.create(SOURCE, secs(5)).await.unwrap_err();
    match err {
        ManagerError::Service(ServiceError::Panicked { info }) => {
            assert_eq!(info, "receiver bind exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_dry_run_rejection_never_starts_service() {
    let script = Script::running().rejecting("no pipelines configured");
    let manager = script.manager();

    let err = manager.create(SOURCE, secs(5)).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid configuration: no pipelines configured");
    assert_eq!(err.as_label(), "validation");
    assert_eq!(script.witness.runs.load(Ordering::SeqCst), 0);
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_dry_run_can_be_disabled() {
    let script = Script::running().rejecting("would reject");
    let cfg = ManagerConfig {
        dry_run: false,
        ..ManagerConfig::default()
    };
    let manager = script.builder(cfg).build();

    let handle = manager.create(SOURCE, secs(5)).await.unwrap();
    assert!(manager.contains(handle));
}

#[tokio::test]
async fn test_factory_rejection_is_validation() {
    let factory = FactoryFn::arc(|cfg: &ResolvedConfig| -> Result<ServiceRef, ServiceError> {
        match cfg.get("service.pipelines") {
            Some(_) => unreachable!("source has no pipelines"),
            None => Err(ServiceError::invalid_config("service.pipelines is required")),
        }
    });
    let manager = Manager::builder(ManagerConfig::default(), factory).build();

    let err = manager
        .create("yaml: {receivers: {otlp: {}}}", secs(5))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: service.pipelines is required"
    );
}

#[tokio::test]
async fn test_unresolvable_sources_register_nothing() {
    let manager = Script::running().manager();

    let sources = [
        "no scheme here",
        "ftp://example.com/cfg.yaml",
        "yaml: [1, 2]",
        "yaml:exporter: '${env:}'",
    ];
    for source in sources {
        let err = manager.create(source, secs(5)).await.unwrap_err();
        assert!(
            matches!(err, ManagerError::ConfigResolution(_)),
            "{source}: {err}"
        );
    }
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_shutdown_timeout_releases_handle() {
    let manager = Script::new(Startup::RunAfter(Duration::ZERO), Stop::Hang).manager();
    let handle = manager.create(SOURCE, secs(5)).await.unwrap();

    let err = manager.shutdown(handle, millis(20)).await.unwrap_err();
    assert!(err.to_string().starts_with("shutdown deadline exceeded after"));
    assert!(err.is_timeout());
    assert!(!manager.contains(handle));

    let again = manager.shutdown(handle, millis(20)).await.unwrap_err();
    assert!(matches!(again, ManagerError::UnknownHandle { .. }));
}

#[tokio::test]
async fn test_shutdown_timeout_can_retain_handle() {
    let script = Script::new(
        Startup::RunAfter(Duration::ZERO),
        Stop::Slow(Duration::from_millis(100)),
    );
    let cfg = ManagerConfig {
        on_shutdown_timeout: TimeoutPolicy::Retain,
        ..ManagerConfig::default()
    };
    let manager = script.builder(cfg).build();
    let handle = manager.create(SOURCE, secs(5)).await.unwrap();

    let err = manager.shutdown(handle, millis(10)).await.unwrap_err();
    assert!(matches!(err, ManagerError::ShutdownTimeout { .. }));
    assert!(manager.contains(handle));
    assert_eq!(manager.status(handle).unwrap().state, ServiceState::Closing);

    manager.shutdown(handle, None).await.unwrap();
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_shutdown_reports_service_error() {
    let manager = Script::new(Startup::RunAfter(Duration::ZERO), Stop::Fail("flush failed")).manager();
    let handle = manager.create(SOURCE, secs(5)).await.unwrap();

    let err = manager.shutdown(handle, secs(5)).await.unwrap_err();
    assert_eq!(err.to_string(), "service failed: flush failed");
    assert_eq!(err.as_label(), "service_reported");
    assert!(!manager.contains(handle));
}

#[tokio::test]
async fn test_shutdown_all_lists_stuck_handles() {
    let clean = Script::running();
    let stuck = Script::new(Startup::RunAfter(Duration::ZERO), Stop::Hang);

    let use_stuck = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&use_stuck);
    let factory = FactoryFn::arc(move |_cfg: &ResolvedConfig| -> Result<ServiceRef, ServiceError> {
        let script = if flag.load(Ordering::SeqCst) { &stuck } else { &clean };
        Ok(Arc::new(Stub {
            script: script.clone(),
            state: StateCell::new(),
        }))
    });
    let manager = Manager::builder(ManagerConfig::default(), factory).build();

    manager.create(SOURCE, secs(5)).await.unwrap();
    manager.create(SOURCE, secs(5)).await.unwrap();
    use_stuck.store(true, Ordering::SeqCst);
    let hung = manager.create(SOURCE, secs(5)).await.unwrap();

    let err = manager.shutdown_all(millis(50)).await.unwrap_err();
    match err {
        ManagerError::GraceExceeded { grace, stuck } => {
            assert_eq!(grace, Duration::from_millis(50));
            assert_eq!(stuck, vec![hung]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_shutdown_all_clean() {
    let manager = Script::running().manager();
    for _ in 0..4 {
        manager.create(SOURCE, secs(5)).await.unwrap();
    }

    manager.shutdown_all(secs(5)).await.unwrap();
    assert!(manager.is_empty());
}

#[tokio::test]
async fn test_colliding_generator_still_yields_unique_handles() {
    let mut seq = [0u32, 5, 5, 5, 6].into_iter();
    let manager = Script::running()
        .builder(ManagerConfig::default())
        .with_handle_generator(move || seq.next().unwrap_or(7))
        .build();

    let first = manager.create(SOURCE, secs(5)).await.unwrap();
    let second = manager.create(SOURCE, secs(5)).await.unwrap();
    assert_eq!(first, Handle::from_raw(5));
    assert_eq!(second, Handle::from_raw(6));
}

#[tokio::test]
async fn test_zero_only_generator_still_registers() {
    let manager = Script::running()
        .builder(ManagerConfig::default())
        .with_handle_generator(|| 0)
        .build();

    let first = manager.create(SOURCE, secs(5)).await.unwrap();
    let second = manager.create(SOURCE, secs(5)).await.unwrap();
    assert!(first.is_valid() && second.is_valid());
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_unrepresentable_timeouts_mean_no_deadline() {
    let manager = Script::running().manager();
    let forever = Some(Duration::MAX);

    let handle = manager.create(SOURCE, forever).await.unwrap();
    manager.shutdown(handle, forever).await.unwrap();

    manager.create(SOURCE, forever).await.unwrap();
    manager.create(SOURCE, forever).await.unwrap();
    manager.shutdown_all(forever).await.unwrap();
    assert!(manager.is_empty());
}

struct Explodes;

#[async_trait]
impl Subscribe for Explodes {
    async fn on_event(&self, _ev: &Event) {
        panic!("audit sink unavailable");
    }

    fn name(&self) -> &'static str {
        "explodes"
    }
}

#[tokio::test]
async fn test_subscriber_panic_is_reported_once() {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Explodes)];
    let manager = Script::running()
        .builder(ManagerConfig::default())
        .with_subscribers(subs)
        .build();
    let mut rx = manager.subscribe();

    let err = manager.shutdown(Handle::from_raw(1), secs(1)).await.unwrap_err();
    assert!(matches!(err, ManagerError::UnknownHandle { .. }));
    time::sleep(Duration::from_millis(200)).await;

    let mut panics = 0;
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::SubscriberPanicked {
            assert_eq!(ev.reason.as_deref(), Some("audit sink unavailable"));
            panics += 1;
        }
    }
    assert_eq!(panics, 1);
}

#[tokio::test]
async fn test_lifecycle_events_are_published() {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let manager = Script::running()
        .builder(ManagerConfig::default())
        .with_subscribers(subs)
        .build();
    let mut rx = manager.subscribe();

    let handle = manager.create(SOURCE, secs(5)).await.unwrap();
    manager.shutdown(handle, secs(5)).await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(ev.kind);
        if ev.kind == EventKind::InstanceRunning {
            assert_eq!(ev.handle, Some(handle));
            assert_eq!(ev.service.as_deref(), Some("stub"));
        }
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::CreateRequested,
            EventKind::InstanceStarting,
            EventKind::InstanceRunning,
            EventKind::ShutdownRequested,
            EventKind::InstanceStopped,
            EventKind::InstanceRemoved,
        ]
    );
}

#[tokio::test]
async fn test_dropping_manager_cancels_instances() {
    let script = Script::running();
    let manager = script.manager();
    manager.create(SOURCE, secs(5)).await.unwrap();
    drop(manager);

    time::timeout(Duration::from_secs(5), async {
        while !script.witness.exited.load(Ordering::SeqCst) {
            time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_and_shutdown_stay_consistent() {
    let manager = Script::new(Startup::RunAfter(Duration::from_millis(2)), Stop::Clean).manager();

    let mut creates = JoinSet::new();
    for _ in 0..64 {
        let manager = Arc::clone(&manager);
        creates.spawn(async move { manager.create(SOURCE, Some(Duration::from_secs(10))).await });
    }
    let mut handles = HashSet::new();
    while let Some(res) = creates.join_next().await {
        let handle = res.unwrap().unwrap();
        assert!(handle.is_valid());
        assert!(handles.insert(handle), "duplicate handle {handle}");
    }
    assert_eq!(manager.len(), 64);

    let mut mixed = JoinSet::new();
    for handle in handles.iter().copied() {
        let m1 = Arc::clone(&manager);
        mixed.spawn(async move { m1.shutdown(handle, Some(Duration::from_secs(10))).await });
        let m2 = Arc::clone(&manager);
        mixed.spawn(async move {
            let extra = m2.create(SOURCE, Some(Duration::from_secs(10))).await?;
            m2.shutdown(extra, Some(Duration::from_secs(10))).await
        });
    }
    while let Some(res) = mixed.join_next().await {
        res.unwrap().unwrap();
    }
    assert!(manager.is_empty());
}
