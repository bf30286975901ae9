//! Events, batches and the cursor that tracks them.

use std::fmt;

use serde_json::value::RawValue;

/// Source-assigned event identifier. Strictly increasing per source.
pub type EventId = i64;

/// Position of the next event to request from the source.
///
/// Starts unset, in which case the source decides where to begin. Once set it
/// only moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor(Option<i64>);

impl Cursor {
    /// A cursor that has not observed anything yet.
    pub fn unset() -> Self {
        Self(None)
    }

    /// A cursor positioned at `offset`.
    pub fn at(offset: i64) -> Self {
        Self(Some(offset))
    }

    /// Offset to send to the source, if any.
    pub fn offset(&self) -> Option<i64> {
        self.0
    }

    /// Whether any event has been observed (or a position restored).
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Moves the cursor past `id`.
    ///
    /// Returns `false` and leaves the cursor alone when `id` is behind the
    /// current position.
    pub fn observe(&mut self, id: EventId) -> bool {
        let next = id.saturating_add(1);
        match self.0 {
            Some(current) if current >= next => false,
            _ => {
                self.0 = Some(next);
                true
            }
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(offset) => write!(f, "{}", offset),
            None => f.write_str("unset"),
        }
    }
}

/// One event as received from the source.
///
/// The payload is kept as the exact JSON text the source sent so it can be
/// forwarded unmodified.
#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    kind: Option<String>,
    payload: Box<RawValue>,
}

impl Event {
    /// Creates an event from its identifier and raw payload.
    pub fn new(id: EventId, payload: Box<RawValue>) -> Self {
        Self {
            id,
            kind: None,
            payload,
        }
    }

    /// Attaches a short label used in log lines.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Builds an event by serializing `value`. Mostly useful in tests.
    pub fn from_value(id: EventId, value: &serde_json::Value) -> serde_json::Result<Self> {
        Ok(Self::new(id, serde_json::value::to_raw_value(value)?))
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn payload(&self) -> &RawValue {
        &self.payload
    }

    /// Payload JSON exactly as received.
    pub fn payload_str(&self) -> &str {
        self.payload.get()
    }
}

/// Events returned by one poll, in source order.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    events: Vec<Event>,
}

impl Batch {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    /// Highest identifier in the batch.
    pub fn max_id(&self) -> Option<EventId> {
        self.events.iter().map(Event::id).max()
    }
}

impl IntoIterator for Batch {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl FromIterator<Event> for Batch {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
