//! Push side of the relay.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::event::Event;

/// Destination that receives forwarded events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Human-readable destination, used in log lines.
    fn destination(&self) -> &str;

    /// Delivers one event. Resolves once the sink has answered.
    async fn deliver(&self, event: &Event) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn destination(&self) -> &str {
        (**self).destination()
    }

    async fn deliver(&self, event: &Event) -> Result<(), SinkError> {
        (**self).deliver(event).await
    }
}
