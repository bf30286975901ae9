//! Counters kept by the pump.

use std::fmt;

/// Running totals since the pump was created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Poll calls issued (startup drain excluded).
    pub polls: u64,
    /// Polls that returned nothing or timed out.
    pub empty_polls: u64,
    /// Non-empty batches received.
    pub batches: u64,
    /// Events the sink accepted.
    pub forwarded: u64,
    /// Events the sink rejected or could not be reached for.
    pub dropped: u64,
    /// Failed polls.
    pub source_errors: u64,
    /// Backoff pauses taken.
    pub backoffs: u64,
}

impl PumpStats {
    /// Events handed to the sink, whatever the outcome.
    pub fn attempted(&self) -> u64 {
        self.forwarded + self.dropped
    }
}

impl fmt::Display for PumpStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "polls={} empty={} batches={} forwarded={} dropped={} source_errors={} backoffs={}",
            self.polls,
            self.empty_polls,
            self.batches,
            self.forwarded,
            self.dropped,
            self.source_errors,
            self.backoffs
        )
    }
}
