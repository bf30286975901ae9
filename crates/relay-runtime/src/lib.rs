//! Cursor-based relay from a long-poll source to a push sink.
//!
//! This crate provides the relay loop itself, independent of any particular
//! source or sink:
//! - `Pump` - the `{Polling, Backoff, Forwarding}` state machine that owns the cursor
//! - `EventSource` / `EventSink` - the two seams the pump talks through
//! - `Runtime` - spawns the pump and stops it on a shutdown signal
//!
//! # Example
//!
//! ```ignore
//! use relay_runtime::{Pump, PumpConfig, Runtime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pump = Pump::new(my_source, my_sink, PumpConfig::default());
//!
//!     let pump = Runtime::new(pump)
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     println!("stopped at cursor {}", pump.cursor());
//!     Ok(())
//! }
//! ```
//!
//! # Delivery semantics
//!
//! The cursor moves past an event as soon as the event is observed, before
//! it is forwarded. Every event the source returns is handed to the sink
//! exactly once; a failed delivery is logged and dropped. Source failures
//! pause the loop for a fixed backoff and retry the same cursor. A long poll
//! that times out on the client is an empty result, not a failure.

pub mod config;
pub mod error;
pub mod event;
pub mod pump;
pub mod runtime;
pub mod sink;
pub mod source;
pub mod stats;

pub use config::{PumpConfig, StartupPolicy};
pub use error::{ConfigError, RelayError, Result, Severity, SinkError, SourceError};
pub use event::{Batch, Cursor, Event, EventId};
pub use pump::{Pump, PumpState};
pub use runtime::Runtime;
pub use sink::EventSink;
pub use source::{EventSource, PollOutcome};
pub use stats::PumpStats;
