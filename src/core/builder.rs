use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::config::ManagerConfig;
use super::manager::Manager;
use super::table::HandleTable;
use crate::config::Resolver;
use crate::events::Bus;
use crate::service::FactoryRef;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Manager`] with optional features.
pub struct ManagerBuilder {
    cfg: ManagerConfig,
    factory: FactoryRef,
    resolver: Option<Resolver>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    generator: Option<Box<dyn FnMut() -> u32 + Send>>,
}

impl ManagerBuilder {
    /// Creates a new builder with the given configuration and service factory.
    pub fn new(cfg: ManagerConfig, factory: FactoryRef) -> Self {
        Self {
            cfg,
            factory,
            resolver: None,
            subscribers: Vec::new(),
            generator: None,
        }
    }

    /// Replaces the default resolver (yaml, file, env, http(s) providers and env expansion).
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the random handle source.
    ///
    /// Generated values are still checked: `0` and live handles are drawn again.
    /// The generator should keep producing fresh non-zero values; after 64 rejected
    /// draws in a row the table falls back to `rand` for that registration.
    pub fn with_handle_generator<G>(mut self, generate: G) -> Self
    where
        G: FnMut() -> u32 + Send + 'static,
    {
        self.generator = Some(Box::new(generate));
        self
    }

    /// Builds the manager.
    ///
    /// Must be called inside a tokio runtime: subscriber workers and the event
    /// listener are spawned here and run until the manager is dropped.
    pub fn build(self) -> Arc<Manager> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        let table = match self.generator {
            Some(generate) => HandleTable::with_generator(generate),
            None => HandleTable::new(),
        };

        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_listener(&bus, set, runtime_token.clone());
        }

        Arc::new(Manager::new_internal(
            self.cfg,
            self.resolver.unwrap_or_default(),
            self.factory,
            table,
            bus,
            runtime_token,
        ))
    }
}

/// Forwards bus events to `set` until `token` is cancelled.
fn spawn_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            }
        }
        set.shutdown().await;
    });
}
