//! Pull side of the relay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::event::{Batch, Cursor};

/// Result of one long-poll call that did not fail.
#[derive(Debug)]
pub enum PollOutcome {
    /// The source answered, possibly with zero events.
    Batch(Batch),
    /// The client timeout fired before the source answered. Treated the same
    /// as an empty batch.
    TimedOut,
}

/// A long-poll event source.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Requests events at or after `cursor`, letting the source hold the call
    /// for up to `wait` and giving up client-side after `timeout`.
    async fn poll(
        &self,
        cursor: Cursor,
        wait: Duration,
        timeout: Duration,
    ) -> Result<PollOutcome, SourceError>;

    /// Fetches only the most recent event, without waiting. Used once at
    /// startup to find the end of the backlog.
    async fn latest(&self, timeout: Duration) -> Result<Batch, SourceError>;
}

#[async_trait]
impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    async fn poll(
        &self,
        cursor: Cursor,
        wait: Duration,
        timeout: Duration,
    ) -> Result<PollOutcome, SourceError> {
        (**self).poll(cursor, wait, timeout).await
    }

    async fn latest(&self, timeout: Duration) -> Result<Batch, SourceError> {
        (**self).latest(timeout).await
    }
}
