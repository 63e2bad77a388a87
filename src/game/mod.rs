//! Game Logic Module
//!
//! The rules engine. 100% deterministic, no I/O.
//!
//! ## Module Structure
//!
//! - `state`: Game aggregate and entities
//! - `action`: Closed set of player actions, raw JSON decoding
//! - `error`: Rejection taxonomy
//! - `rules`: Per-game policy configuration
//! - `vote`: Tally and quorum resolution
//! - `economy`: Enactment effects on the economy
//! - `handlers`: One handler per action kind
//! - `reducer`: Batch fold (`advance_game_state`)
//! - `events`: Facts emitted by a reduction

pub mod state;
pub mod action;
pub mod error;
pub mod rules;
pub mod vote;
pub mod economy;
pub mod events;
pub mod handlers;
pub mod reducer;

// Re-export key types
pub use state::{
    Debate, DebateStatus, Economy, GameState, Player, PlayerId, Proposal, ProposalId, ProposalStatus,
    Speech, Turn, TurnPhase, Vote, VoteChoice,
};
pub use action::{decode_action, decode_actions, ActionKind, DecodeError, PlayerAction};
pub use error::{ActionError, EngineError, ErrorKind};
pub use rules::RulesConfig;
pub use events::{GameEvent, GameEventData};
pub use reducer::{advance_game_state, advance_game_state_raw, Engine, Reduction};
