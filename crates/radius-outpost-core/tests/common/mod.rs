//! Test doubles and common utilities for contract tests
//!
//! This module provides minimal collaborators for the directory, the refresh
//! scheduler and the lifecycle orchestrator.

#![allow(dead_code)]

use radius_outpost_core::error::{Error, Result};
use radius_outpost_core::traits::{
    ProtocolListener, ProviderConfig, ProviderSource, TelemetryEndpoint,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, oneshot};

/// A ProviderSource that replays scripted responses
///
/// Each call pops the next response; once the script is exhausted the last
/// response is repeated.
pub struct ScriptedSource {
    script: std::sync::Mutex<VecDeque<Result<Vec<ProviderConfig>>>>,
    last: std::sync::Mutex<Option<std::result::Result<Vec<ProviderConfig>, String>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Vec<ProviderConfig>>>) -> Self {
        Self {
            script: std::sync::Mutex::new(script.into()),
            last: std::sync::Mutex::new(None),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always answer with the same providers
    pub fn fixed(providers: Vec<ProviderConfig>) -> Self {
        Self::new(vec![Ok(providers)])
    }

    /// Get the number of times list_providers() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProviderSource for ScriptedSource {
    async fn list_providers(&self) -> Result<Vec<ProviderConfig>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(Ok(providers)) => {
                *last = Some(Ok(providers.clone()));
                Ok(providers)
            }
            Some(Err(e)) => {
                *last = Some(Err(e.to_string()));
                Err(e)
            }
            None => match last.as_ref() {
                Some(Ok(providers)) => Ok(providers.clone()),
                Some(Err(msg)) => Err(Error::config_source(msg.clone())),
                None => Ok(Vec::new()),
            },
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A ProviderSource whose fetch blocks until released
pub struct GatedSource {
    providers: Vec<ProviderConfig>,
    gate: Arc<Notify>,
    entered: Arc<Notify>,
}

impl GatedSource {
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self {
            providers,
            gate: Arc::new(Notify::new()),
            entered: Arc::new(Notify::new()),
        }
    }

    /// Notified once a fetch is in flight
    pub fn entered(&self) -> Arc<Notify> {
        Arc::clone(&self.entered)
    }

    /// Let the in-flight fetch complete
    pub fn gate(&self) -> Arc<Notify> {
        Arc::clone(&self.gate)
    }
}

#[async_trait::async_trait]
impl ProviderSource for GatedSource {
    async fn list_providers(&self) -> Result<Vec<ProviderConfig>> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(self.providers.clone())
    }

    fn source_name(&self) -> &'static str {
        "gated"
    }
}

/// How a test listener or telemetry endpoint ends
#[derive(Debug, Clone, Copy)]
pub enum Ending {
    /// Never returns
    Forever,
    /// Returns Ok after the delay
    OkAfter(Duration),
    /// Returns Err after the delay
    ErrAfter(Duration),
    /// Panics after the delay
    PanicAfter(Duration),
}

async fn end(ending: Ending, what: &str) -> Result<()> {
    match ending {
        Ending::Forever => std::future::pending().await,
        Ending::OkAfter(delay) => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
        Ending::ErrAfter(delay) => {
            tokio::time::sleep(delay).await;
            Err(Error::Network(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!("{} failed to bind", what),
            )))
        }
        Ending::PanicAfter(delay) => {
            tokio::time::sleep(delay).await;
            panic!("{} crashed", what);
        }
    }
}

/// Sets a flag when dropped, to observe task cancellation
pub struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A scripted ProtocolListener
pub struct TestListener {
    ending: Ending,
    started: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl TestListener {
    pub fn new(ending: Ending) -> Self {
        Self {
            ending,
            started: Arc::new(AtomicBool::new(false)),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether serve() was entered
    pub fn started(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.started)
    }

    /// Whether a running serve() future was dropped (aborted or finished)
    pub fn dropped(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dropped)
    }
}

#[async_trait::async_trait]
impl ProtocolListener for TestListener {
    async fn serve(&self) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        let _guard = DropFlag(Arc::clone(&self.dropped));
        end(self.ending, "listener").await
    }

    fn listen_addr(&self) -> String {
        "127.0.0.1:1812".to_string()
    }
}

/// A scripted TelemetryEndpoint
pub struct TestTelemetry {
    ending: Ending,
    started: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

impl TestTelemetry {
    pub fn new(ending: Ending) -> Self {
        Self {
            ending,
            started: Arc::new(AtomicBool::new(false)),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether serve() was entered
    pub fn started(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.started)
    }

    /// Whether a running serve() future was dropped (aborted or finished)
    pub fn dropped(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dropped)
    }
}

#[async_trait::async_trait]
impl TelemetryEndpoint for TestTelemetry {
    async fn serve(&self) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        let _guard = DropFlag(Arc::clone(&self.dropped));
        end(self.ending, "telemetry").await
    }
}

/// Helper to build a provider with the given networks
pub fn provider(name: &str, secret: &str, networks: &str) -> ProviderConfig {
    ProviderConfig::new(name, secret, networks)
        .with_slugs(format!("{}-app", name), "default-authentication-flow")
}

/// Helper to create a channel that never fires unless sent to
pub fn shutdown_channel() -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
    oneshot::channel()
}
