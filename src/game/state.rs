//! Game State Definitions
//!
//! Typed records for the game aggregate. Collections are held behind `Arc`
//! so a transition clones only the collection it touches; everything else is
//! shared with the input state, which is never mutated.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::hash::{StateHash, StateHasher};

// =============================================================================
// ENTITY IDS
// =============================================================================

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw id string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Game identifier.
    GameId
);
entity_id!(
    /// Player identifier, assigned by the registration service.
    PlayerId
);
entity_id!(
    /// Proposal identifier (`proposal-*`).
    ProposalId
);
entity_id!(
    /// Vote identifier (`vote-*`).
    VoteId
);
entity_id!(
    /// Debate identifier (`debate-*`).
    DebateId
);
entity_id!(
    /// Speech identifier (`speech-*`).
    SpeechId
);

// =============================================================================
// CONTENT RATING
// =============================================================================

/// Age-appropriateness tag carried by games, players and proposals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContentRating {
    /// Universal
    #[serde(rename = "U")]
    Universal = 0,
    /// Parental guidance
    #[default]
    #[serde(rename = "PG")]
    ParentalGuidance = 1,
    /// 12 and over
    #[serde(rename = "12")]
    Twelve = 2,
    /// 15 and over
    #[serde(rename = "15")]
    Fifteen = 3,
    /// Adults only
    #[serde(rename = "18")]
    Eighteen = 4,
}

// =============================================================================
// PLAYER
// =============================================================================

/// A registered participant. The engine reads players but never creates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub verified_age: Option<u8>,
    #[serde(default)]
    pub content_rating: ContentRating,
}

impl Player {
    /// Create a player with default rating and an epoch creation time.
    pub fn new(id: impl Into<PlayerId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            verified_age: None,
            content_rating: ContentRating::default(),
        }
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.id.as_str());
        hasher.update_str(&self.display_name);
        hasher.update_timestamp(self.created_at);
        match self.verified_age {
            Some(age) => {
                hasher.update_u8(1);
                hasher.update_u8(age);
            }
            None => hasher.update_u8(0),
        }
        hasher.update_u8(self.content_rating as u8);
    }
}

// =============================================================================
// PROPOSAL
// =============================================================================

/// Lifecycle status of a proposal.
///
/// `Enacted` and `Rejected` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ProposalStatus {
    Proposed = 0,
    Debate = 1,
    Voting = 2,
    Enacted = 3,
    Rejected = 4,
}

impl ProposalStatus {
    /// Terminal statuses admit no further transition.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, ProposalStatus::Enacted | ProposalStatus::Rejected)
    }

    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Proposed => "proposed",
            ProposalStatus::Debate => "debate",
            ProposalStatus::Voting => "voting",
            ProposalStatus::Enacted => "enacted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome recorded by the moderation service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ModerationStatus {
    Pending = 0,
    Approved = 1,
    Rejected = 2,
    Flagged = 3,
}

/// Moderation review attached to a proposal by the moderation collaborator.
///
/// The engine carries this through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationMetadata {
    pub status: ModerationStatus,
    #[serde(default)]
    pub flagged_reasons: Vec<String>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_note: Option<String>,
}

impl ModerationMetadata {
    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.status as u8);
        hasher.update_u64(self.flagged_reasons.len() as u64);
        for reason in &self.flagged_reasons {
            hasher.update_str(reason);
        }
        hasher.update_opt_str(self.reviewed_by.as_deref());
        match self.reviewed_at {
            Some(ts) => {
                hasher.update_u8(1);
                hasher.update_timestamp(ts);
            }
            None => hasher.update_u8(0),
        }
        hasher.update_opt_str(self.review_note.as_deref());
    }
}

/// A policy proposal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub proposer_id: PlayerId,
    pub created_at: DateTime<Utc>,
    pub status: ProposalStatus,
    #[serde(default)]
    pub debate_id: Option<DebateId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moderation: Option<ModerationMetadata>,
    #[serde(default)]
    pub content_rating: Option<ContentRating>,
}

impl Proposal {
    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.id.as_str());
        hasher.update_str(&self.title);
        hasher.update_str(&self.description);
        hasher.update_str(self.proposer_id.as_str());
        hasher.update_timestamp(self.created_at);
        hasher.update_u8(self.status as u8);
        hasher.update_opt_str(self.debate_id.as_ref().map(DebateId::as_str));
        match &self.moderation {
            Some(moderation) => {
                hasher.update_u8(1);
                moderation.hash_into(hasher);
            }
            None => hasher.update_u8(0),
        }
        match self.content_rating {
            Some(rating) => {
                hasher.update_u8(1);
                hasher.update_u8(rating as u8);
            }
            None => hasher.update_u8(0),
        }
    }
}

// =============================================================================
// VOTE
// =============================================================================

/// A ballot choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum VoteChoice {
    For = 0,
    Against = 1,
    /// Counts toward quorum only.
    Abstain = 2,
}

/// An append-only vote fact.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: VoteId,
    pub proposal_id: ProposalId,
    pub player_id: PlayerId,
    pub choice: VoteChoice,
    pub timestamp: DateTime<Utc>,
}

impl Vote {
    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.id.as_str());
        hasher.update_str(self.proposal_id.as_str());
        hasher.update_str(self.player_id.as_str());
        hasher.update_u8(self.choice as u8);
        hasher.update_timestamp(self.timestamp);
    }
}

// =============================================================================
// DEBATE & SPEECH
// =============================================================================

/// Debate lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DebateStatus {
    Active = 0,
    Completed = 1,
}

/// A structured debate on one proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debate {
    pub id: DebateId,
    pub proposal_id: ProposalId,
    pub speaking_order: Vec<PlayerId>,
    pub current_speaker_index: u32,
    /// Per-speaker limit in milliseconds.
    #[serde(rename = "timeLimit")]
    pub time_limit_ms: u64,
    pub started_at: DateTime<Utc>,
    pub status: DebateStatus,
}

impl Debate {
    /// Player whose turn it is to speak, if the debate is still active.
    pub fn current_speaker(&self) -> Option<&PlayerId> {
        if self.status != DebateStatus::Active {
            return None;
        }
        self.speaking_order.get(self.current_speaker_index as usize)
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.id.as_str());
        hasher.update_str(self.proposal_id.as_str());
        hasher.update_u64(self.speaking_order.len() as u64);
        for speaker in &self.speaking_order {
            hasher.update_str(speaker.as_str());
        }
        hasher.update_u32(self.current_speaker_index);
        hasher.update_u64(self.time_limit_ms);
        hasher.update_timestamp(self.started_at);
        hasher.update_u8(self.status as u8);
    }
}

/// An append-only speech entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speech {
    pub id: SpeechId,
    pub debate_id: DebateId,
    pub speaker_id: PlayerId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Speech {
    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_str(self.id.as_str());
        hasher.update_str(self.debate_id.as_str());
        hasher.update_str(self.speaker_id.as_str());
        hasher.update_str(&self.content);
        hasher.update_timestamp(self.timestamp);
    }
}

// =============================================================================
// ECONOMY & TURN
// =============================================================================

/// Macro indicators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Economy {
    /// Integer currency units.
    #[serde(default)]
    pub treasury: i64,
    /// Fraction in [0, 1].
    #[serde(default)]
    pub inflation_rate: f64,
    /// Fraction in [0, 1].
    #[serde(default)]
    pub unemployment_rate: f64,
}

/// Turn phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TurnPhase {
    #[default]
    Lobby = 0,
    Debate = 1,
    Voting = 2,
    Enacted = 3,
}

impl TurnPhase {
    /// Next phase in the fixed cycle `lobby → debate → voting → enacted → lobby`.
    pub fn next(self) -> TurnPhase {
        match self {
            TurnPhase::Lobby => TurnPhase::Debate,
            TurnPhase::Debate => TurnPhase::Voting,
            TurnPhase::Voting => TurnPhase::Enacted,
            TurnPhase::Enacted => TurnPhase::Lobby,
        }
    }
}

/// Turn counter and phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    #[serde(default)]
    pub turn_number: u32,
    #[serde(default)]
    pub phase: TurnPhase,
}

// =============================================================================
// GAME STATE
// =============================================================================

/// Complete state of a game.
///
/// Treat as immutable: reducers take `&GameState` and return a new value.
/// Collections are `Arc`-shared, so cloning a state is cheap and mutation goes
/// through `Arc::make_mut` on a clone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub players: Arc<Vec<Player>>,
    #[serde(default)]
    pub proposals: Arc<Vec<Proposal>>,
    #[serde(default)]
    pub votes: Arc<Vec<Vote>>,
    #[serde(default)]
    pub debates: Arc<Vec<Debate>>,
    #[serde(default)]
    pub speeches: Arc<Vec<Speech>>,
    #[serde(default)]
    pub economy: Economy,
    #[serde(default)]
    pub turn: Turn,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub content_rating: ContentRating,
    #[serde(default)]
    pub moderation_enabled: bool,
    #[serde(default)]
    pub age_verification_required: bool,
}

impl GameState {
    /// Create an empty game created (and last updated) at `created_at`.
    pub fn new(id: impl Into<GameId>, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            players: Arc::default(),
            proposals: Arc::default(),
            votes: Arc::default(),
            debates: Arc::default(),
            speeches: Arc::default(),
            economy: Economy::default(),
            turn: Turn::default(),
            created_at,
            updated_at: created_at,
            content_rating: ContentRating::default(),
            moderation_enabled: false,
            age_verification_required: false,
        }
    }

    /// Builder: replace the player roster.
    ///
    /// Rosters come from the registration service; this exists for callers
    /// assembling a state before the first reduction.
    pub fn with_players(mut self, players: Vec<Player>) -> Self {
        self.players = Arc::new(players);
        self
    }

    /// Builder: replace the economy.
    pub fn with_economy(mut self, economy: Economy) -> Self {
        self.economy = economy;
        self
    }

    /// Get a player by ID.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// Is `id` a registered player?
    pub fn has_player(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
    }

    /// Get a proposal by ID.
    pub fn proposal(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| &p.id == id)
    }

    /// Position of a proposal in the proposal list.
    pub fn proposal_index(&self, id: &ProposalId) -> Option<usize> {
        self.proposals.iter().position(|p| &p.id == id)
    }

    /// Get a debate by ID.
    pub fn debate(&self, id: &DebateId) -> Option<&Debate> {
        self.debates.iter().find(|d| &d.id == id)
    }

    /// Position of a debate in the debate list.
    pub fn debate_index(&self, id: &DebateId) -> Option<usize> {
        self.debates.iter().position(|d| &d.id == id)
    }

    /// All votes cast on one proposal, in recording order.
    pub fn votes_on<'a>(&'a self, proposal_id: &'a ProposalId) -> impl Iterator<Item = &'a Vote> + 'a {
        self.votes.iter().filter(move |v| &v.proposal_id == proposal_id)
    }

    /// Does any entity already use this id string?
    ///
    /// Generated ids are effectively unique, but the handlers check anyway.
    pub fn id_in_use(&self, id: &str) -> bool {
        self.proposals.iter().any(|p| p.id.as_str() == id)
            || self.votes.iter().any(|v| v.id.as_str() == id)
            || self.debates.iter().any(|d| d.id.as_str() == id)
            || self.speeches.iter().any(|s| s.id.as_str() == id)
    }

    /// Compute hash of current state for verification.
    ///
    /// Every field contributes, in declaration order, at full precision:
    /// timestamps to the nanosecond, floats by bit pattern. Equal states
    /// always hash equally.
    pub fn compute_hash(&self) -> StateHash {
        let mut hasher = StateHasher::for_game_state();

        hasher.update_str(self.id.as_str());
        hasher.update_str(&self.name);

        hasher.update_u64(self.players.len() as u64);
        for player in self.players.iter() {
            player.hash_into(&mut hasher);
        }
        hasher.update_u64(self.proposals.len() as u64);
        for proposal in self.proposals.iter() {
            proposal.hash_into(&mut hasher);
        }
        hasher.update_u64(self.votes.len() as u64);
        for vote in self.votes.iter() {
            vote.hash_into(&mut hasher);
        }
        hasher.update_u64(self.debates.len() as u64);
        for debate in self.debates.iter() {
            debate.hash_into(&mut hasher);
        }
        hasher.update_u64(self.speeches.len() as u64);
        for speech in self.speeches.iter() {
            speech.hash_into(&mut hasher);
        }

        hasher.update_i64(self.economy.treasury);
        hasher.update_f64(self.economy.inflation_rate);
        hasher.update_f64(self.economy.unemployment_rate);

        hasher.update_u32(self.turn.turn_number);
        hasher.update_u8(self.turn.phase as u8);

        hasher.update_timestamp(self.created_at);
        hasher.update_timestamp(self.updated_at);
        hasher.update_u8(self.content_rating as u8);
        hasher.update_bool(self.moderation_enabled);
        hasher.update_bool(self.age_verification_required);

        hasher.finalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================
