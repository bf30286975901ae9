//! The relay pump: poll the source, advance the cursor, forward to the sink.
//!
//! The loop is a three-state machine driven by [`Pump::step`]:
//!
//! ```text
//!            batch                 all events attempted
//! Polling ──────────▶ Forwarding ───────────────────────▶ Polling
//!    │  ▲
//!    │  │ backoff elapsed
//!    ▼  │
//!  Backoff   (entered on any source error)
//! ```
//!
//! A timed-out or empty poll stays in `Polling` with no pause.

use std::mem;

use tokio::sync::watch;
use tokio::task;
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use relay_persistence::CursorFile;

use crate::config::{PumpConfig, StartupPolicy};
use crate::event::{Batch, Cursor};
use crate::sink::EventSink;
use crate::source::{EventSource, PollOutcome};
use crate::stats::PumpStats;

/// Where the pump is in its loop.
#[derive(Debug)]
pub enum PumpState {
    /// Next step issues a poll.
    Polling,
    /// Next step waits out the backoff.
    Backoff,
    /// Next step forwards this batch.
    Forwarding(Batch),
}

impl PumpState {
    pub fn name(&self) -> &'static str {
        match self {
            PumpState::Polling => "polling",
            PumpState::Backoff => "backoff",
            PumpState::Forwarding(_) => "forwarding",
        }
    }
}

/// Moves events from an [`EventSource`] to an [`EventSink`].
///
/// The pump owns the cursor. It is advanced as each event is observed, before
/// that event is forwarded, so a failing delivery is never re-requested.
pub struct Pump<S, K> {
    source: S,
    sink: K,
    config: PumpConfig,
    cursor: Cursor,
    state: PumpState,
    store: Option<CursorFile>,
    stats: PumpStats,
}

impl<S, K> Pump<S, K>
where
    S: EventSource,
    K: EventSink,
{
    /// Creates a pump with an unset cursor.
    pub fn new(source: S, sink: K, config: PumpConfig) -> Self {
        Self {
            source,
            sink,
            config,
            cursor: Cursor::unset(),
            state: PumpState::Polling,
            store: None,
            stats: PumpStats::default(),
        }
    }

    /// Persists the cursor to `store` and resumes from it on startup.
    pub fn with_cursor_store(mut self, store: CursorFile) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn state(&self) -> &PumpState {
        &self.state
    }

    pub fn stats(&self) -> &PumpStats {
        &self.stats
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Positions the cursor before the first poll.
    ///
    /// A saved cursor wins. Otherwise the startup policy applies: either one
    /// non-blocking fetch of the latest event to skip the backlog, or nothing.
    pub async fn start(&mut self) {
        if let Some(offset) = self.load_saved_cursor().await {
            self.cursor = Cursor::at(offset);
            info!(cursor = %self.cursor, "resuming from saved cursor");
            return;
        }

        match self.config.startup {
            StartupPolicy::DrainBacklog => self.drain_backlog().await,
            StartupPolicy::Replay => {
                info!("backlog replay enabled; first poll starts from the source's oldest retained event")
            }
        }
    }

    async fn drain_backlog(&mut self) {
        match self.source.latest(self.config.poll_timeout).await {
            Ok(batch) if batch.is_empty() => debug!("no backlog to skip"),
            Ok(batch) => {
                for event in batch.iter() {
                    self.cursor.observe(event.id());
                }
                info!(
                    skipped_through = ?batch.max_id(),
                    cursor = %self.cursor,
                    "skipped backlog"
                );
                self.save_cursor().await;
            }
            Err(e) => {
                warn!(error = %e, "backlog drain failed; starting with cursor unset");
            }
        }
    }

    /// Performs exactly one state transition.
    pub async fn step(&mut self) {
        let state = mem::replace(&mut self.state, PumpState::Polling);
        self.state = match state {
            PumpState::Polling => self.poll().await,
            PumpState::Backoff => {
                self.stats.backoffs += 1;
                sleep(self.config.backoff).await;
                PumpState::Polling
            }
            PumpState::Forwarding(batch) => {
                self.forward(batch).await;
                PumpState::Polling
            }
        };
    }

    async fn poll(&mut self) -> PumpState {
        self.stats.polls += 1;
        trace!(cursor = %self.cursor, "polling source");

        let outcome = self
            .source
            .poll(self.cursor, self.config.poll_wait, self.config.poll_timeout)
            .await;

        match outcome {
            Ok(PollOutcome::TimedOut) => {
                self.stats.empty_polls += 1;
                trace!(cursor = %self.cursor, "poll timed out without events");
                PumpState::Polling
            }
            Ok(PollOutcome::Batch(batch)) if batch.is_empty() => {
                self.stats.empty_polls += 1;
                PumpState::Polling
            }
            Ok(PollOutcome::Batch(batch)) => {
                self.stats.batches += 1;
                debug!(cursor = %self.cursor, events = batch.len(), "received batch");
                PumpState::Forwarding(batch)
            }
            Err(e) => {
                self.stats.source_errors += 1;
                warn!(
                    cursor = %self.cursor,
                    error = %e,
                    backoff_secs = self.config.backoff.as_secs_f64(),
                    "poll failed; backing off"
                );
                PumpState::Backoff
            }
        }
    }

    async fn forward(&mut self, batch: Batch) {
        for event in batch {
            if !self.cursor.observe(event.id()) {
                warn!(
                    event_id = event.id(),
                    cursor = %self.cursor,
                    "event id behind cursor"
                );
            }

            match self.sink.deliver(&event).await {
                Ok(()) => {
                    self.stats.forwarded += 1;
                    debug!(
                        event_id = event.id(),
                        kind = event.kind().unwrap_or("unknown"),
                        "forwarded event"
                    );
                }
                Err(e) => {
                    self.stats.dropped += 1;
                    warn!(
                        event_id = event.id(),
                        kind = event.kind().unwrap_or("unknown"),
                        destination = self.sink.destination(),
                        error = %e,
                        "forward failed; event dropped"
                    );
                }
            }
        }

        self.save_cursor().await;
    }

    /// Runs the loop until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Polling and backoff are abandoned as soon as shutdown is requested. A
    /// batch that is being forwarded is always finished first.
    pub async fn run_until(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(cursor = %self.cursor, "relay loop started");

        loop {
            // A fetched batch is forwarded even if shutdown arrived during the poll.
            if matches!(self.state, PumpState::Forwarding(_)) {
                self.step().await;
                continue;
            }

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => break,
                _ = self.step() => {}
            }
        }

        self.save_cursor().await;
        info!(cursor = %self.cursor, stats = %self.stats, "relay loop stopped");
    }

    async fn load_saved_cursor(&self) -> Option<i64> {
        let store = self.store.clone()?;
        let path = store.path().to_path_buf();
        match task::spawn_blocking(move || store.load()).await {
            Ok(Ok(offset)) => offset,
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "could not read saved cursor");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cursor read task failed");
                None
            }
        }
    }

    /// Writes the cursor off the async workers; the file write fsyncs.
    async fn save_cursor(&self) {
        let (Some(store), Some(offset)) = (self.store.clone(), self.cursor.offset()) else {
            return;
        };
        let path = store.path().to_path_buf();
        match task::spawn_blocking(move || store.save(offset)).await {
            Ok(Ok(())) => trace!(cursor = offset, "cursor saved"),
            Ok(Err(e)) => warn!(path = %path.display(), error = %e, "could not save cursor"),
            Err(e) => warn!(path = %path.display(), error = %e, "cursor save task failed"),
        }
    }
}
