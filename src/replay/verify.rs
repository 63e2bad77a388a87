//! Verification API
//!
//! Verify an action log by deterministic replay.

use crate::core::hash::StateHash;
use crate::game::error::EngineError;
use crate::game::state::GameState;
use crate::replay::log::{ActionLog, LOG_VERSION};

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Expected final hash (from the log).
    pub expected_final_hash: StateHash,

    /// Per-entry results, up to and including the first failure.
    pub entry_results: Vec<EntryResult>,

    /// Detailed error if verification failed.
    pub error: Option<VerificationError>,
}

/// Result of verifying a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryResult {
    /// Entry position.
    pub index: usize,
    /// Expected hash from the log.
    pub expected: StateHash,
    /// Computed hash from replay.
    pub computed: StateHash,
    /// Did this entry match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Log version mismatch.
    #[error("log version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u8,
        /// Version in the log.
        got: u8,
    },

    /// Initial state does not hash to the recorded initial hash.
    #[error("initial state hash mismatch: expected {}, computed {}", hex::encode(.expected), hex::encode(.computed))]
    InitialStateMismatch {
        /// Recorded hash.
        expected: StateHash,
        /// Hash of the recorded initial state.
        computed: StateHash,
    },

    /// Replay of an entry produced a different state.
    #[error("state hash mismatch after entry {index}")]
    EntryMismatch {
        /// Entry where the mismatch occurred.
        index: usize,
        /// Recorded hash.
        expected: StateHash,
        /// Replayed hash.
        computed: StateHash,
    },

    /// A recorded batch was rejected on replay.
    #[error("entry {index} rejected on replay: {source}")]
    ReplayRejected {
        /// Entry that failed.
        index: usize,
        /// Engine error from replay.
        #[source]
        source: EngineError,
    },
}

/// A failed replay: the error plus the hashes at the point of failure.
struct Failure {
    error: VerificationError,
    computed: StateHash,
    expected: StateHash,
}

/// Verify a log by full replay.
///
/// Replays every entry from the initial state and compares state hashes,
/// stopping at the first mismatch.
pub fn verify_log(log: &ActionLog) -> VerificationResult {
    let mut entry_results = Vec::with_capacity(log.entries.len());
    match replay_entries(log, &mut entry_results) {
        Ok(state) => VerificationResult {
            valid: true,
            computed_final_hash: state.compute_hash(),
            expected_final_hash: log.final_hash(),
            entry_results,
            error: None,
        },
        Err(failure) => VerificationResult {
            valid: false,
            computed_final_hash: failure.computed,
            expected_final_hash: failure.expected,
            entry_results,
            error: Some(failure.error),
        },
    }
}

/// Replay a log, returning the final state if every entry verifies.
pub fn replay(log: &ActionLog) -> Result<GameState, VerificationError> {
    let mut entry_results = Vec::with_capacity(log.entries.len());
    replay_entries(log, &mut entry_results).map_err(|failure| failure.error)
}

fn replay_entries(log: &ActionLog, entry_results: &mut Vec<EntryResult>) -> Result<GameState, Failure> {
    // 1. Version
    if log.version != LOG_VERSION {
        return Err(Failure {
            error: VerificationError::VersionMismatch {
                expected: LOG_VERSION,
                got: log.version,
            },
            computed: [0; 32],
            expected: log.final_hash(),
        });
    }

    // 2. Initial state hash
    let initial_hash = log.initial_state.compute_hash();
    if initial_hash != log.initial_hash {
        return Err(Failure {
            error: VerificationError::InitialStateMismatch {
                expected: log.initial_hash,
                computed: initial_hash,
            },
            computed: initial_hash,
            expected: log.initial_hash,
        });
    }

    // 3. Replay entry by entry
    let engine = log.engine();
    let mut state = log.initial_state.clone();
    let mut computed = initial_hash;

    for (index, entry) in log.entries.iter().enumerate() {
        state = engine
            .advance(&state, &entry.actions, entry.seed)
            .map_err(|source| Failure {
                error: VerificationError::ReplayRejected { index, source },
                computed,
                expected: entry.state_hash,
            })?;

        computed = state.compute_hash();
        let valid = computed == entry.state_hash;
        entry_results.push(EntryResult {
            index,
            expected: entry.state_hash,
            computed,
            valid,
        });

        if !valid {
            return Err(Failure {
                error: VerificationError::EntryMismatch {
                    index,
                    expected: entry.state_hash,
                    computed,
                },
                computed,
                expected: entry.state_hash,
            });
        }
    }

    Ok(state)
}
