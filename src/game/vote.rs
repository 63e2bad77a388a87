//! Vote Tally and Quorum Resolution
//!
//! Quorum means every registered player has a counted vote on the proposal.
//! Only each player's latest vote counts; under the default duplicate policy
//! there is never more than one.

use std::collections::BTreeMap;

use crate::game::state::{GameState, PlayerId, ProposalId, ProposalStatus, VoteChoice};

/// Counted votes on one proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub for_count: u32,
    pub against_count: u32,
    pub abstain_count: u32,
}

impl VoteTally {
    /// Number of distinct counted voters.
    pub fn distinct_voters(&self) -> u32 {
        self.for_count + self.against_count + self.abstain_count
    }

    /// Resolution once quorum is reached, `None` before.
    ///
    /// Strict majority of `for` over `against` enacts; a tie or an
    /// against-majority rejects. Abstentions count toward quorum only.
    pub fn resolve(&self, total_players: u32) -> Option<ProposalStatus> {
        if total_players == 0 || self.distinct_voters() != total_players {
            return None;
        }
        if self.for_count > self.against_count {
            Some(ProposalStatus::Enacted)
        } else {
            Some(ProposalStatus::Rejected)
        }
    }
}

/// Tally the latest vote of each registered player on `proposal_id`.
pub fn tally(state: &GameState, proposal_id: &ProposalId) -> VoteTally {
    // BTreeMap insert overwrites, so the last recorded vote wins.
    let mut latest: BTreeMap<&PlayerId, VoteChoice> = BTreeMap::new();
    for vote in state.votes_on(proposal_id) {
        if state.has_player(&vote.player_id) {
            latest.insert(&vote.player_id, vote.choice);
        }
    }

    let mut result = VoteTally::default();
    for choice in latest.values() {
        match choice {
            VoteChoice::For => result.for_count += 1,
            VoteChoice::Against => result.against_count += 1,
            VoteChoice::Abstain => result.abstain_count += 1,
        }
    }
    result
}
