//! Runs a pump on its own task with a shutdown signal.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{RelayError, Result};
use crate::pump::Pump;
use crate::sink::EventSink;
use crate::source::EventSource;

/// Owns the pump task and its shutdown channel.
pub struct Runtime<S, K> {
    /// Pump waiting to be started.
    pump: Option<Pump<S, K>>,
    /// Handle to the running pump task.
    handle: Option<JoinHandle<Pump<S, K>>>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
}

impl<S, K> Runtime<S, K>
where
    S: EventSource + 'static,
    K: EventSink + 'static,
{
    /// Wraps a pump that has not been started yet.
    pub fn new(pump: Pump<S, K>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            pump: Some(pump),
            handle: None,
            shutdown_tx,
        }
    }

    /// Spawns the pump: startup phase, then the loop.
    pub fn start(&mut self) -> Result<()> {
        let mut pump = self.pump.take().ok_or(RelayError::AlreadyStarted)?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("starting relay");

        self.handle = Some(tokio::spawn(async move {
            // The startup drain may block for a full poll timeout.
            let interrupted = tokio::select! {
                biased;
                _ = shutdown_rx.wait_for(|stop| *stop) => true,
                _ = pump.start() => false,
            };

            if interrupted {
                info!(cursor = %pump.cursor(), "shutdown requested during startup");
            } else {
                pump.run_until(shutdown_rx).await;
            }
            pump
        }));

        Ok(())
    }

    /// Signals the pump to stop and waits for it.
    ///
    /// Returns the stopped pump so its cursor and stats can be inspected.
    pub async fn shutdown(&mut self) -> Result<Pump<S, K>> {
        let handle = self.handle.take().ok_or(RelayError::NotStarted)?;

        info!("shutting down relay");
        // The receiver lives inside the task; a send error means it already ended.
        if self.shutdown_tx.send(true).is_err() {
            debug!("pump task already finished");
        }

        handle
            .await
            .map_err(|e| RelayError::Task(format!("pump task failed: {}", e)))
    }

    /// Starts the pump and runs it until `signal` resolves.
    ///
    /// If the pump task dies on its own first, that is reported as
    /// [`RelayError::Task`].
    pub async fn run_until<F>(mut self, signal: F) -> Result<Pump<S, K>>
    where
        F: Future<Output = ()>,
    {
        self.start()?;
        let mut handle = self.handle.take().ok_or(RelayError::NotStarted)?;

        let finished = tokio::select! {
            _ = signal => None,
            joined = &mut handle => Some(joined),
        };

        match finished {
            None => {
                info!("shutdown requested");
                self.handle = Some(handle);
                self.shutdown().await
            }
            Some(joined) => {
                let message = match joined {
                    Ok(_) => "pump task exited unexpectedly".to_string(),
                    Err(e) => format!("pump task failed: {}", e),
                };
                error!(error = %message, "relay stopped");
                Err(RelayError::Task(message))
            }
        }
    }

    /// Whether the pump task has been spawned.
    pub fn is_started(&self) -> bool {
        self.handle.is_some()
    }
}

impl<S, K> Drop for Runtime<S, K> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.shutdown_tx.send(true);
        }
    }
}
