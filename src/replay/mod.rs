//! Replay Logs
//!
//! Accepted batches are recorded with their seeds and resulting state hashes,
//! so any game can be re-derived and checked by replay.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       REPLAY                                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  log.rs      - ActionLog + LogRecorder                       │
//! │  verify.rs   - Verification by replay                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod log;
pub mod verify;

pub use log::{ActionLog, LogEntry, LogRecorder, LOG_VERSION};
pub use verify::{replay, verify_log, EntryResult, VerificationError, VerificationResult};
