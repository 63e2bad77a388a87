//! Game Events
//!
//! Facts emitted while a batch is applied. The broadcast layer can forward
//! these instead of diffing states. Events are only returned for batches that
//! succeed as a whole.

use serde::{Deserialize, Serialize};

use crate::game::state::{
    DebateId, Economy, PlayerId, ProposalId, ProposalStatus, SpeechId, TurnPhase, VoteChoice, VoteId,
};
use crate::game::vote::VoteTally;

/// Event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEventData {
    /// A proposal was created
    #[serde(rename_all = "camelCase")]
    ProposalCreated {
        proposal_id: ProposalId,
        proposer_id: PlayerId,
    },

    /// A debate opened on a proposal
    #[serde(rename_all = "camelCase")]
    DebateStarted {
        debate_id: DebateId,
        proposal_id: ProposalId,
    },

    /// A speech was recorded
    #[serde(rename_all = "camelCase")]
    SpeechRecorded {
        speech_id: SpeechId,
        debate_id: DebateId,
        speaker_id: PlayerId,
    },

    /// The speaker pointer wrapped and the debate closed
    #[serde(rename_all = "camelCase")]
    DebateCompleted { debate_id: DebateId },

    /// A vote was recorded
    #[serde(rename_all = "camelCase")]
    VoteCast {
        vote_id: VoteId,
        proposal_id: ProposalId,
        player_id: PlayerId,
        choice: VoteChoice,
    },

    /// Quorum was reached and the proposal resolved
    #[serde(rename_all = "camelCase")]
    ProposalResolved {
        proposal_id: ProposalId,
        status: ProposalStatus,
        for_count: u32,
        against_count: u32,
        abstain_count: u32,
    },

    /// A proposal whose debate completed moved to voting
    #[serde(rename_all = "camelCase")]
    ProposalPromoted { proposal_id: ProposalId },

    /// The turn advanced
    #[serde(rename_all = "camelCase")]
    TurnAdvanced { turn_number: u32, phase: TurnPhase },

    /// An enactment changed the economy
    #[serde(rename_all = "camelCase")]
    EconomyUpdated { economy: Economy },
}

impl GameEventData {
    /// Resolution of a proposal, with the counts that decided it.
    pub fn proposal_resolved(proposal_id: ProposalId, status: ProposalStatus, tally: VoteTally) -> Self {
        GameEventData::ProposalResolved {
            proposal_id,
            status,
            for_count: tally.for_count,
            against_count: tally.against_count,
            abstain_count: tally.abstain_count,
        }
    }
}

/// An event tagged with the action that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    /// Zero-based index of the action within its batch.
    pub action_index: usize,

    /// Event data
    #[serde(flatten)]
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(action_index: usize, data: GameEventData) -> Self {
        Self { action_index, data }
    }

    /// Player the event is about, if any.
    pub fn player_id(&self) -> Option<&PlayerId> {
        match &self.data {
            GameEventData::ProposalCreated { proposer_id, .. } => Some(proposer_id),
            GameEventData::SpeechRecorded { speaker_id, .. } => Some(speaker_id),
            GameEventData::VoteCast { player_id, .. } => Some(player_id),
            _ => None,
        }
    }
}
