//! The application orchestrator.
//!
//! `run` drives the hosted servers through one start/stop cycle:
//!
//! ```text
//! build instance → spawn stopper + starter per server → start barrier
//!     → register → arm termination trigger → wait for the group
//! ```
//!
//! `stop` may be called from any task at any time: it deregisters the
//! instance and then cancels the run token, which fires every stopper.
//!
//! A server that overruns its stop budget is abandoned: its starter stops
//! waiting on `start`, so `run` returns within the budget. An instance still
//! registered when the group finishes is deregistered before `run` returns.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, RegistryError, ServerError};
use crate::lifecycle::group::{StartBarrier, TaskGroup};
use crate::lifecycle::options::{AppBuilder, Options};
use crate::lifecycle::signals::{Signal, SignalListener};
use crate::observability::metrics;
use crate::registry::{Registrar, ServiceInstance};
use crate::server::Server;

/// State shared between `run` and concurrent `stop` callers.
#[derive(Default)]
struct RunState {
    instance: Option<Arc<ServiceInstance>>,
    cancel: Option<CancellationToken>,
    registered: bool,
    rollback: Option<JoinHandle<()>>,
}

struct Inner {
    opts: Options,
    state: Mutex<RunState>,
}

/// Lifecycle orchestrator for a set of hosted servers.
///
/// Cheap to clone; clones share the same run state, so one clone can `run`
/// while another calls `stop`.
#[derive(Clone)]
pub struct App {
    inner: Arc<Inner>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub(crate) fn new(opts: Options) -> Self {
        Self {
            inner: Arc::new(Inner {
                opts,
                state: Mutex::new(RunState::default()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.opts.id
    }

    pub fn name(&self) -> &str {
        &self.inner.opts.name
    }

    pub fn signals(&self) -> &[Signal] {
        &self.inner.opts.signals
    }

    pub fn registrar_timeout(&self) -> Duration {
        self.inner.opts.registrar_timeout
    }

    pub fn stop_timeout(&self) -> Duration {
        self.inner.opts.stop_timeout
    }

    /// The instance recorded by the current run, if `run` has started.
    pub fn instance(&self) -> Option<Arc<ServiceInstance>> {
        self.state().instance.clone()
    }

    /// Build the instance this app would advertise.
    pub fn build_instance(&self) -> ServiceInstance {
        let opts = &self.inner.opts;
        ServiceInstance::build(&opts.id, &opts.name, &opts.endpoints, &opts.servers)
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start every server and block until the app is told to terminate.
    ///
    /// Returns once all servers have returned from `start` and `stop`. The
    /// first server error, if any, is returned.
    pub async fn run(&self) -> Result<(), AppError> {
        let opts = &self.inner.opts;
        let instance = Arc::new(self.build_instance());
        let cancel = CancellationToken::new();

        {
            let mut state = self.state();
            if state.cancel.is_some() {
                return Err(AppError::AlreadyRunning);
            }
            state.instance = Some(instance.clone());
            state.cancel = Some(cancel.clone());
        }

        tracing::info!(
            id = %opts.id,
            name = %opts.name,
            servers = opts.servers.len(),
            endpoints = ?instance.endpoints,
            "Application starting"
        );

        let mut group = TaskGroup::new(&cancel);
        let barrier = StartBarrier::new(opts.servers.len());

        for server in &opts.servers {
            // Fired by the stopper once the server overran its stop budget.
            let abandoned = CancellationToken::new();

            let token = group.token();
            let stopper = server.clone();
            let stop_timeout = opts.stop_timeout;
            let give_up = abandoned.clone();
            group.spawn(async move {
                token.cancelled().await;
                let result = stop_server(stopper, stop_timeout).await;
                if result.is_err() {
                    give_up.cancel();
                }
                result
            });

            let token = group.token();
            let starter = server.clone();
            let barrier = barrier.clone();
            group.spawn(async move { start_server(starter, token, barrier, abandoned).await });
        }

        barrier.wait().await;

        match &opts.registrar {
            Some(_) if cancel.is_cancelled() => {
                tracing::info!("Run cancelled before registration, skipping registry");
            }
            Some(registrar) => {
                let registered = match timeout(opts.registrar_timeout, registrar.register(&instance)).await {
                    Ok(result) => result,
                    Err(_) => Err(RegistryError::Timeout(opts.registrar_timeout)),
                };
                metrics::record_registry_call("register", registered.is_ok());
                if let Err(e) = registered {
                    tracing::error!(error = %e, "Failed to register service instance");
                    self.abandon(group, &cancel);
                    return Err(AppError::Registration(e));
                }
                self.state().registered = true;
                tracing::info!(id = %instance.id, "Service instance registered");
            }
            None => {}
        }

        let mut listener = match SignalListener::install(&opts.signals) {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                if let Err(dereg) = self.release(&instance).await {
                    tracing::warn!(error = %dereg, "Failed to deregister service instance");
                }
                self.abandon(group, &cancel);
                return Err(AppError::Signal(e));
            }
        };

        let app = self.clone();
        let token = group.token();
        group.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(AppError::Cancelled),
                signal = listener.recv() => {
                    tracing::info!(signal = %signal, "Received signal, stopping");
                    app.stop().await
                }
            }
        });

        let result = match group.wait().await {
            Ok(()) | Err(AppError::Cancelled) => Ok(()),
            Err(e) => Err(e),
        };

        // Covers a server failing after registration and a `stop` that
        // deregistered before `register` had landed.
        let released = self.release(&instance).await;

        match (result, released) {
            (Ok(()), Ok(())) => {
                tracing::info!("Application stopped");
                Ok(())
            }
            (Ok(()), Err(e)) => {
                tracing::error!(error = %e, "Failed to deregister service instance on exit");
                Err(AppError::Deregistration(e))
            }
            (Err(e), released) => {
                if let Err(dereg) = released {
                    tracing::warn!(error = %dereg, "Failed to deregister service instance on exit");
                }
                tracing::error!(error = %e, "Application stopped with error");
                Err(e)
            }
        }
    }

    /// Deregister the instance and cancel the current run.
    ///
    /// A deregistration failure is returned before anything is cancelled.
    /// Before `run` has recorded its state this is a no-op.
    pub async fn stop(&self) -> Result<(), AppError> {
        let opts = &self.inner.opts;
        let (instance, cancel, was_registered) = {
            let mut state = self.state();
            (
                state.instance.clone(),
                state.cancel.clone(),
                std::mem::take(&mut state.registered),
            )
        };

        if let (Some(registrar), Some(instance)) = (&opts.registrar, &instance) {
            tracing::info!(id = %instance.id, "Deregistering service instance");
            if let Err(e) = deregister(registrar.as_ref(), instance, opts.stop_timeout).await {
                tracing::error!(error = %e, "Failed to deregister service instance");
                if was_registered {
                    self.state().registered = true;
                }
                return Err(AppError::Deregistration(e));
            }
        }

        if let Some(cancel) = cancel {
            tracing::info!("Cancelling run");
            cancel.cancel();
        }
        Ok(())
    }

    /// Wait for servers abandoned by a failed `run` to finish stopping.
    ///
    /// When registration or signal setup fails, `run` returns without waiting
    /// for the started servers; this awaits that rollback. Returns at once if
    /// there is none.
    pub async fn finish_rollback(&self) {
        let rollback = self.state().rollback.take();
        if let Some(handle) = rollback {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Rollback task failed");
            }
        }
    }

    // Deregister the instance if this run still holds a registration.
    async fn release(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        let registered = std::mem::take(&mut self.state().registered);
        match &self.inner.opts.registrar {
            Some(registrar) if registered => {
                tracing::info!(id = %instance.id, "Deregistering service instance");
                deregister(registrar.as_ref(), instance, self.inner.opts.stop_timeout).await
            }
            _ => Ok(()),
        }
    }

    // Roll back servers that already began starting without making the caller
    // wait for them: cancel the run and let the group drain in the background.
    fn abandon(&self, group: TaskGroup, cancel: &CancellationToken) {
        cancel.cancel();
        let handle = tokio::spawn(async move {
            if let Err(e) = group.wait().await {
                tracing::warn!(error = %e, "Error while rolling back started servers");
            }
        });
        self.state().rollback = Some(handle);
    }
}

async fn start_server(
    server: Arc<dyn Server>,
    token: CancellationToken,
    barrier: StartBarrier,
    abandoned: CancellationToken,
) -> Result<(), AppError> {
    tracing::info!(server = %server.name(), address = %server.address(), "Starting server");
    metrics::record_server_started(server.name());

    barrier.arrive();
    tokio::select! {
        result = server.start(token) => result.map_err(|source| {
            tracing::error!(server = %server.name(), error = %source, "Server failed");
            AppError::Start {
                server: server.name().to_string(),
                source,
            }
        }),
        _ = abandoned.cancelled() => {
            tracing::warn!(server = %server.name(), "Server did not stop in time, abandoning it");
            Ok(())
        }
    }
}

async fn deregister(
    registrar: &dyn Registrar,
    instance: &ServiceInstance,
    deadline: Duration,
) -> Result<(), RegistryError> {
    let deregistered = match timeout(deadline, registrar.deregister(instance)).await {
        Ok(result) => result,
        Err(_) => Err(RegistryError::Timeout(deadline)),
    };
    metrics::record_registry_call("deregister", deregistered.is_ok());
    deregistered
}

async fn stop_server(server: Arc<dyn Server>, stop_timeout: Duration) -> Result<(), AppError> {
    tracing::debug!(server = %server.name(), "Stopping server");
    let started = Instant::now();

    let result = match timeout(stop_timeout, server.stop()).await {
        Ok(result) => result,
        Err(_) => Err(ServerError::Timeout(stop_timeout)),
    };
    metrics::record_server_stopped(server.name(), result.is_ok(), started.elapsed());

    match result {
        Ok(()) => {
            tracing::info!(server = %server.name(), elapsed = ?started.elapsed(), "Server stopped");
            Ok(())
        }
        Err(source) => {
            tracing::error!(server = %server.name(), error = %source, "Server failed to stop");
            Err(AppError::Stop {
                server: server.name().to_string(),
                source,
            })
        }
    }
}
