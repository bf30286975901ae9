//! Persistence layer for the update relay.
//!
//! The relay keeps a single piece of durable state: the source cursor. It is
//! written with atomic file operations (write to temp file, then rename) so a
//! crash never leaves a half-written cursor behind.
//!
//! # Example
//!
//! ```no_run
//! use relay_persistence::CursorFile;
//!
//! let store = CursorFile::new("/var/lib/relay/cursor.json");
//! store.save(1042).unwrap();
//!
//! assert_eq!(store.load().unwrap(), Some(1042));
//! ```

pub mod atomic;
pub mod cursor_file;
pub mod error;

pub use cursor_file::{CursorFile, CursorRecord};
pub use error::{PersistenceError, Result};
