//! Engine Errors
//!
//! Every failure is recoverable by the caller. The reducer never panics on a
//! bad action; it returns one of these and leaves the input state untouched.

use std::fmt;

use crate::game::state::{PlayerId, ProposalId, ProposalStatus};

/// Which kind of entity an id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Proposal,
    Debate,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Player => "player",
            EntityKind::Proposal => "proposal",
            EntityKind::Debate => "debate",
        })
    }
}

/// Fieldless error classification, for mapping to client responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidStateTransition,
    Duplicate,
}

impl ErrorKind {
    /// HTTP status the API layer should answer with.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::InvalidStateTransition => 400,
            ErrorKind::Duplicate => 409,
        }
    }
}

/// Why a single action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// A payload field is missing, empty, or malformed.
    #[error("validation failed: {reason}")]
    Validation {
        /// What was wrong.
        reason: String,
    },

    /// An id does not resolve in the current state.
    #[error("{entity} {id:?} not found")]
    NotFound {
        /// Kind of entity looked up.
        entity: EntityKind,
        /// The unresolved id.
        id: String,
    },

    /// The target entity is terminal or otherwise in the wrong state.
    #[error("invalid state transition for {entity} {id:?}: {reason}")]
    InvalidTransition {
        /// Kind of entity targeted.
        entity: EntityKind,
        /// Its id.
        id: String,
        /// What made the state incompatible.
        reason: String,
    },

    /// A player voted twice on the same proposal.
    #[error("player {player_id} already voted on proposal {proposal_id}")]
    Duplicate {
        /// Proposal voted on.
        proposal_id: ProposalId,
        /// Repeat voter.
        player_id: PlayerId,
    },
}

impl ActionError {
    /// Validation error with a reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    /// Not-found error for an id.
    pub fn not_found(entity: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    /// A proposal is already in a terminal status.
    pub fn terminal_proposal(id: &ProposalId, status: ProposalStatus) -> Self {
        Self::InvalidTransition {
            entity: EntityKind::Proposal,
            id: id.to_string(),
            reason: format!("proposal is already {status}"),
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Validation { .. } => ErrorKind::Validation,
            ActionError::NotFound { .. } => ErrorKind::NotFound,
            ActionError::InvalidTransition { .. } => ErrorKind::InvalidStateTransition,
            ActionError::Duplicate { .. } => ErrorKind::Duplicate,
        }
    }
}

/// A rejected batch: which action failed, and why.
///
/// Nothing from the batch is applied when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("action #{index} ({action}) rejected: {source}")]
pub struct EngineError {
    /// Zero-based position of the failing action in the batch.
    pub index: usize,
    /// Wire name of the failing action's kind (or the unrecognised name).
    pub action: String,
    /// Underlying cause.
    #[source]
    pub source: ActionError,
}

impl EngineError {
    /// Classification of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_mapping() {
        assert_eq!(ActionError::validation("empty title").kind().http_status(), 400);
        assert_eq!(ActionError::not_found(EntityKind::Debate, "d1").kind().http_status(), 400);
        assert_eq!(
            ActionError::terminal_proposal(&"p".into(), ProposalStatus::Enacted).kind().http_status(),
            400
        );
        let dup = ActionError::Duplicate {
            proposal_id: "proposal-1".into(),
            player_id: "p1".into(),
        };
        assert_eq!(dup.kind(), ErrorKind::Duplicate);
        assert_eq!(dup.kind().http_status(), 409);
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError {
            index: 2,
            action: "start_debate".to_string(),
            source: ActionError::not_found(EntityKind::Proposal, "proposal-x"),
        };
        assert_eq!(
            err.to_string(),
            "action #2 (start_debate) rejected: proposal \"proposal-x\" not found"
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
