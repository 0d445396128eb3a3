//! Shared fakes for lifecycle integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

use lifecycle_host::{Protocol, Registrar, RegistryError, Server, ServerError, ServiceInstance};

/// Ordered record of lifecycle calls across fakes.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.snapshot().iter().position(|e| e == event)
    }
}

/// A server whose start blocks until it is stopped or the run is cancelled.
pub struct FakeServer {
    name: String,
    protocol: Protocol,
    address: String,
    log: EventLog,
    fail_start: Option<Duration>,
    stop_delay: Option<Duration>,
    ignore_cancel: bool,
    stopped: CancellationToken,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
}

impl FakeServer {
    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            name: name.to_string(),
            protocol: Protocol::Http,
            address: "127.0.0.1:0".to_string(),
            log: log.clone(),
            fail_start: None,
            stop_delay: None,
            ignore_cancel: false,
            stopped: CancellationToken::new(),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn rpc(mut self, address: &str) -> Self {
        self.protocol = Protocol::Rpc;
        self.address = address.to_string();
        self
    }

    /// Make `start` fail after `after`.
    pub fn failing(mut self, after: Duration) -> Self {
        self.fail_start = Some(after);
        self
    }

    /// Make `stop` take `delay` before it takes effect.
    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }

    /// Make `start` return only once `stop` completes, ignoring the run token.
    pub fn ignoring_cancel(mut self) -> Self {
        self.ignore_cancel = true;
        self
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.is_cancelled()
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Server for FakeServer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, cancel: CancellationToken) -> Result<(), ServerError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("start:{}", self.name));

        if let Some(after) = self.fail_start {
            tokio::time::sleep(after).await;
            return Err(ServerError::Other(format!("{} exploded", self.name).into()));
        }

        if self.ignore_cancel {
            self.stopped.cancelled().await;
            return Ok(());
        }
        tokio::select! {
            _ = self.stopped.cancelled() => {}
            _ = cancel.cancelled() => {}
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServerError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("stop:{}", self.name));
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        self.stopped.cancel();
        Ok(())
    }

    fn address(&self) -> String {
        self.address.clone()
    }

    fn endpoint(&self) -> Option<Url> {
        None
    }

    fn protocol(&self) -> Protocol {
        self.protocol
    }
}

/// A registrar with injectable failures and delays.
pub struct FakeRegistrar {
    log: EventLog,
    register_delay: Option<Duration>,
    fail_deregister: bool,
    register_calls: AtomicUsize,
    deregister_calls: AtomicUsize,
    registered: Mutex<Option<ServiceInstance>>,
}

impl FakeRegistrar {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            register_delay: None,
            fail_deregister: false,
            register_calls: AtomicUsize::new(0),
            deregister_calls: AtomicUsize::new(0),
            registered: Mutex::new(None),
        }
    }

    pub fn slow_register(mut self, delay: Duration) -> Self {
        self.register_delay = Some(delay);
        self
    }

    pub fn failing_deregister(mut self) -> Self {
        self.fail_deregister = true;
        self
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn deregister_calls(&self) -> usize {
        self.deregister_calls.load(Ordering::SeqCst)
    }

    pub fn registered(&self) -> Option<ServiceInstance> {
        self.registered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Registrar for FakeRegistrar {
    async fn register(&self, instance: &ServiceInstance) -> Result<(), RegistryError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push("register");
        if let Some(delay) = self.register_delay {
            tokio::time::sleep(delay).await;
        }
        *self.registered.lock().unwrap() = Some(instance.clone());
        Ok(())
    }

    async fn deregister(&self, _instance: &ServiceInstance) -> Result<(), RegistryError> {
        self.deregister_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push("deregister");
        if self.fail_deregister {
            return Err(RegistryError::Rejected("directory unavailable".into()));
        }
        *self.registered.lock().unwrap() = None;
        Ok(())
    }
}

/// Poll `condition` until it holds, panicking after two seconds.
pub async fn wait_until<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let polled = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    if tokio::time::timeout(Duration::from_secs(2), polled).await.is_err() {
        panic!("timed out waiting for {}", what);
    }
}

/// Await `fut`, panicking if it takes longer than two seconds.
pub async fn within<F: Future>(what: &str, fut: F) -> F::Output {
    match tokio::time::timeout(Duration::from_secs(2), fut).await {
        Ok(output) => output,
        Err(_) => panic!("timed out waiting for {}", what),
    }
}
