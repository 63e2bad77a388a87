//! State Reducer
//!
//! `advance_game_state` folds an ordered batch of actions over a game state.
//!
//! Determinism requirements:
//! - One RNG per call, seeded from the caller's seed and never shared
//! - Actions applied strictly in batch order, each to the previous result
//! - No wall-clock reads: timestamps come from [`ActionClock`]
//! - The input state is never mutated; a rejected batch yields no state at all

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::clock::ActionClock;
use crate::core::rng::mulberry32;
use crate::game::action::{decode_actions, PlayerAction};
use crate::game::error::EngineError;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::handlers::{apply_action, ActionContext};
use crate::game::rules::RulesConfig;
use crate::game::state::GameState;

/// Seed used when the caller has none.
pub const DEFAULT_SEED: u32 = 1;

/// Map the degenerate seed 0 to [`DEFAULT_SEED`].
#[inline]
pub fn normalize_seed(seed: u32) -> u32 {
    if seed == 0 {
        DEFAULT_SEED
    } else {
        seed
    }
}

/// Result of a successful reduction.
#[derive(Clone, Debug, PartialEq)]
pub struct Reduction {
    /// The successor state.
    pub state: GameState,
    /// Events produced, in action order.
    pub events: Vec<GameEvent>,
}

/// Reducer bound to one rules configuration.
///
/// Holds no mutable state; share it freely across threads.
#[derive(Clone, Debug, Default)]
pub struct Engine {
    rules: RulesConfig,
}

impl Engine {
    /// Engine with the given rules.
    pub fn new(rules: RulesConfig) -> Self {
        Self { rules }
    }

    /// Rules in force.
    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Fold `actions` over `game` and return the successor state.
    pub fn advance(
        &self,
        game: &GameState,
        actions: &[PlayerAction],
        seed: u32,
    ) -> Result<GameState, EngineError> {
        self.reduce(game, actions, seed).map(|r| r.state)
    }

    /// Like [`Engine::advance`], also returning the events of the batch.
    pub fn reduce(
        &self,
        game: &GameState,
        actions: &[PlayerAction],
        seed: u32,
    ) -> Result<Reduction, EngineError> {
        let mut rng = mulberry32(normalize_seed(seed));
        let mut ctx = ActionContext::new(&mut rng, ActionClock::new(game.updated_at), &self.rules);

        // Clone shares every collection; handlers copy on write.
        let mut state = game.clone();

        for (index, action) in actions.iter().enumerate() {
            ctx.begin(index);
            debug!(index, kind = action.name(), "applying action");

            state = apply_action(state, action, &mut ctx).map_err(|source| {
                warn!(index, kind = action.name(), error = %source, "action batch rejected");
                EngineError {
                    index,
                    action: action.name().to_string(),
                    source,
                }
            })?;

            #[cfg(feature = "debug-tracing")]
            tracing::trace!(index, hash = %hex::encode(state.compute_hash()), "state after action");
        }

        if let Some(updated_at) = ctx.latest_timestamp() {
            state.updated_at = updated_at;
        }

        let events = ctx.into_events();
        for event in &events {
            if let GameEventData::ProposalResolved { proposal_id, status, .. } = &event.data {
                debug!(%proposal_id, %status, "proposal resolved");
            }
        }

        Ok(Reduction { state, events })
    }

    /// Decode a raw JSON batch, then fold it.
    ///
    /// Decoding covers the whole batch first, so a bad action anywhere means
    /// nothing is applied.
    pub fn advance_raw(&self, game: &GameState, actions: &[Value], seed: u32) -> Result<GameState, EngineError> {
        let actions = decode_actions(actions).map_err(|err| {
            warn!(index = err.index, error = %err.source, "action batch failed to decode");
            err
        })?;
        self.advance(game, &actions, seed)
    }
}

/// Fold `actions` over `game` under the default rules.
pub fn advance_game_state(
    game: &GameState,
    actions: &[PlayerAction],
    seed: u32,
) -> Result<GameState, EngineError> {
    Engine::default().advance(game, actions, seed)
}

/// Decode and fold a raw JSON batch under the default rules.
pub fn advance_game_state_raw(game: &GameState, actions: &[Value], seed: u32) -> Result<GameState, EngineError> {
    Engine::default().advance_raw(game, actions, seed)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::id::deterministic_id;
    use crate::game::action::{ActionKind, ProposePayload, VotePayload};
    use crate::game::error::ErrorKind;
    use crate::game::rules::DuplicateVotePolicy;
    use crate::game::state::{Player, PlayerId, ProposalStatus, TurnPhase, VoteChoice};
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use serde_json::json;

    fn game(players: &[&str]) -> GameState {
        GameState::new("g1", "Test Game", DateTime::<Utc>::UNIX_EPOCH)
            .with_players(players.iter().map(|id| Player::new(*id, *id)).collect())
    }

    /// Id the first draw of `seed` produces.
    fn first_id(seed: u32, prefix: &str) -> String {
        deterministic_id(prefix, &mut mulberry32(seed))
    }

    #[test]
    fn test_empty_batch_is_identity() {
        let g = game(&["p1"]);
        let next = advance_game_state(&g, &[], 5).unwrap();
        assert_eq!(next, g);
    }

    #[test]
    fn test_known_propose_output() {
        let g = game(&["p1"]);
        let next = advance_game_state(&g, &[PlayerAction::propose("Budget", "", "p1")], 42).unwrap();

        let proposal = &next.proposals[0];
        assert_eq!(proposal.id.as_str(), "proposal-9xvqmf");
        // Slot 1 plus floor(0.44829055899754167 * 1000) ms of jitter.
        assert_eq!(proposal.created_at.timestamp_millis(), 1448);
        assert_eq!(next.updated_at, proposal.created_at);
    }

    #[test]
    fn test_seed_zero_matches_default() {
        let g = game(&["p1"]);
        let batch = [PlayerAction::propose("Budget", "", "p1")];
        assert_eq!(
            advance_game_state(&g, &batch, 0).unwrap(),
            advance_game_state(&g, &batch, DEFAULT_SEED).unwrap()
        );
    }

    #[test]
    fn test_different_seeds_different_ids() {
        let g = game(&["p1"]);
        let batch = [PlayerAction::propose("Budget", "", "p1")];
        let a = advance_game_state(&g, &batch, 1).unwrap();
        let b = advance_game_state(&g, &batch, 2).unwrap();
        assert_ne!(a.proposals[0].id, b.proposals[0].id);
    }

    #[test]
    fn test_tie_rejects_in_one_batch() {
        let seed = 11;
        let pid = first_id(seed, "proposal");
        let g = game(&["p1", "p2"]);
        let next = advance_game_state(
            &g,
            &[
                PlayerAction::propose("Budget", "", "p1"),
                PlayerAction::vote(pid.as_str(), "p1", VoteChoice::For),
                PlayerAction::vote(pid.as_str(), "p2", VoteChoice::Against),
            ],
            seed,
        )
        .unwrap();

        assert_eq!(next.proposals[0].status, ProposalStatus::Rejected);
        assert_eq!(next.votes.len(), 2);
    }

    #[test]
    fn test_majority_enacts() {
        let seed = 7;
        let pid = first_id(seed, "proposal");
        let g = game(&["p1", "p2", "p3"]);
        let next = advance_game_state(
            &g,
            &[
                PlayerAction::propose("Parks", "", "p1"),
                PlayerAction::vote(pid.as_str(), "p1", VoteChoice::For),
                PlayerAction::vote(pid.as_str(), "p2", VoteChoice::For),
                PlayerAction::vote(pid.as_str(), "p3", VoteChoice::Against),
            ],
            seed,
        )
        .unwrap();
        assert_eq!(next.proposals[0].status, ProposalStatus::Enacted);
    }

    #[test]
    fn test_partial_quorum_stays_open() {
        let g = game(&["p1", "p2", "p3"]);
        let proposed = advance_game_state(&g, &[PlayerAction::propose("Parks", "", "p1")], 3).unwrap();
        let pid = proposed.proposals[0].id.clone();

        let next = advance_game_state(
            &proposed,
            &[
                PlayerAction::vote(pid.clone(), "p1", VoteChoice::For),
                PlayerAction::vote(pid, "p2", VoteChoice::For),
            ],
            4,
        )
        .unwrap();
        assert_eq!(next.proposals[0].status, ProposalStatus::Proposed);
    }

    #[test]
    fn test_rejected_batch_reports_index_and_applies_nothing() {
        let g = game(&["p1"]);
        let err = advance_game_state(
            &g,
            &[
                PlayerAction::propose("Budget", "", "p1"),
                PlayerAction::start_debate("proposal-unknown", None),
            ],
            1,
        )
        .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.action, "start_debate");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(g.proposals.is_empty());
    }

    #[test]
    fn test_unknown_kind_via_raw_batch() {
        let g = game(&["p1"]);
        let err = advance_game_state_raw(
            &g,
            &[
                json!({"type": "propose", "payload": {"title": "Budget", "proposerId": "p1"}}),
                json!({"type": "dissolve_parliament", "payload": {}}),
            ],
            1,
        )
        .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_raw_batch_matches_typed_batch() {
        let g = game(&["p1"]);
        let raw = advance_game_state_raw(
            &g,
            &[
                json!({"type": "propose", "playerId": "p1", "payload": {"title": "Budget"}}),
                json!({"type": "advance_turn"}),
            ],
            9,
        )
        .unwrap();
        let typed = advance_game_state(
            &g,
            &[
                PlayerAction::new(ActionKind::Propose(ProposePayload {
                    title: "Budget".to_string(),
                    ..ProposePayload::default()
                }))
                .by("p1"),
                PlayerAction::advance_turn(),
            ],
            9,
        )
        .unwrap();
        assert_eq!(raw, typed);
        assert_eq!(raw.turn.turn_number, 1);
    }

    #[test]
    fn test_duplicate_vote_policies() {
        let seed = 21;
        let pid = first_id(seed, "proposal");
        let g = game(&["p1", "p2"]);
        let batch = [
            PlayerAction::propose("Budget", "", "p1"),
            PlayerAction::vote(pid.as_str(), "p1", VoteChoice::For),
            PlayerAction::vote(pid.as_str(), "p1", VoteChoice::Against),
        ];

        let err = advance_game_state(&g, &batch, seed).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(err.kind().http_status(), 409);

        let engine = Engine::new(RulesConfig {
            duplicate_votes: DuplicateVotePolicy::Supersede,
            ..RulesConfig::default()
        });
        let next = engine.advance(&g, &batch, seed).unwrap();
        assert_eq!(next.votes.len(), 2);
        assert_eq!(next.proposals[0].status, ProposalStatus::Proposed);
    }

    #[test]
    fn test_full_debate_flow() {
        let g = game(&["p1", "p2"]);
        let engine = Engine::default();

        let s1 = engine.advance(&g, &[PlayerAction::propose("Carbon tax", "", "p1")], 100).unwrap();
        let pid = s1.proposals[0].id.clone();
        let s2 = engine.advance(&s1, &[PlayerAction::start_debate(pid.clone(), None)], 101).unwrap();
        let did = s2.debates[0].id.clone();

        let reduction = engine
            .reduce(
                &s2,
                &[
                    PlayerAction::speak(did.clone(), "p1", "For"),
                    PlayerAction::speak(did, "p2", "Against"),
                    PlayerAction::advance_turn(),
                ],
                102,
            )
            .unwrap();
        let s3 = reduction.state;
        assert_eq!(s3.proposals[0].status, ProposalStatus::Voting);
        assert_eq!(s3.turn.phase, TurnPhase::Debate);
        assert!(reduction
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::ProposalPromoted { .. })));

        let s4 = engine
            .advance(
                &s3,
                &[
                    PlayerAction::vote(pid.clone(), "p1", VoteChoice::For),
                    PlayerAction::vote(pid, "p2", VoteChoice::For),
                ],
                103,
            )
            .unwrap();
        assert_eq!(s4.proposals[0].status, ProposalStatus::Enacted);
        // Economy untouched under default rules.
        assert_eq!(s4.economy, g.economy);
    }

    #[test]
    fn test_updated_at_is_latest_timestamp() {
        let g = game(&["p1"]);
        let next = advance_game_state(
            &g,
            &[PlayerAction::propose("Budget", "", "p1"), PlayerAction::advance_turn()],
            5,
        )
        .unwrap();
        assert_eq!(next.updated_at.timestamp_millis(), 2000);
        assert!(next.proposals[0].created_at < next.updated_at);
    }

    #[test]
    fn test_actor_fallback_for_vote() {
        let seed = 13;
        let pid = first_id(seed, "proposal");
        let g = game(&["p1"]);
        let next = advance_game_state(
            &g,
            &[
                PlayerAction::propose("Budget", "", "p1"),
                PlayerAction::new(ActionKind::Vote(VotePayload {
                    proposal_id: pid.as_str().into(),
                    player_id: None,
                    choice: VoteChoice::For,
                }))
                .by("p1"),
            ],
            seed,
        )
        .unwrap();
        assert_eq!(next.votes[0].player_id, PlayerId::from("p1"));
        assert_eq!(next.proposals[0].status, ProposalStatus::Enacted);
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    #[derive(Clone, Debug)]
    enum Op {
        Propose(String, usize),
        StartDebate(usize),
        Speak(usize, usize),
        Vote(usize, usize, u8),
        AdvanceTurn,
    }

    const PLAYERS: [&str; 3] = ["p1", "p2", "p3"];

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            ("[a-z ]{0,12}", 0..4usize).prop_map(|(t, p)| Op::Propose(t, p)),
            (0..3usize).prop_map(Op::StartDebate),
            (0..2usize, 0..4usize).prop_map(|(d, p)| Op::Speak(d, p)),
            (0..3usize, 0..4usize, 0..3u8).prop_map(|(i, p, c)| Op::Vote(i, p, c)),
            Just(Op::AdvanceTurn),
        ]
    }

    /// A state with two proposals, one of them in an active debate.
    fn seeded_state() -> GameState {
        let engine = Engine::default();
        let g = game(&PLAYERS);
        let s = engine
            .advance(
                &g,
                &[PlayerAction::propose("Tax reform", "", "p1"), PlayerAction::propose("Welfare", "", "p2")],
                77,
            )
            .unwrap();
        let pid = s.proposals[0].id.clone();
        engine.advance(&s, &[PlayerAction::start_debate(pid, None)], 78).unwrap()
    }

    /// Map an index to a known id, or to an unknown one when out of range.
    fn player(i: usize) -> PlayerId {
        PLAYERS.get(i).map_or_else(|| PlayerId::from("ghost"), |p| PlayerId::from(*p))
    }

    fn to_action(state: &GameState, op: &Op) -> PlayerAction {
        match op {
            Op::Propose(title, p) => PlayerAction::propose(title.as_str(), "", player(*p)),
            Op::StartDebate(i) => PlayerAction::start_debate(
                state.proposals.get(*i).map_or_else(|| "proposal-none".into(), |p| p.id.clone()),
                None,
            ),
            Op::Speak(d, p) => PlayerAction::speak(
                state.debates.get(*d).map_or_else(|| "debate-none".into(), |d| d.id.clone()),
                player(*p),
                "Remarks",
            ),
            Op::Vote(i, p, c) => {
                let choice = match c {
                    0 => VoteChoice::For,
                    1 => VoteChoice::Against,
                    _ => VoteChoice::Abstain,
                };
                PlayerAction::vote(
                    state.proposals.get(*i).map_or_else(|| "proposal-none".into(), |p| p.id.clone()),
                    player(*p),
                    choice,
                )
            }
            Op::AdvanceTurn => PlayerAction::advance_turn(),
        }
    }

    proptest! {
        #[test]
        fn prop_reduction_is_deterministic(ops in prop::collection::vec(op_strategy(), 0..12), seed in any::<u32>()) {
            let base = seeded_state();
            let actions: Vec<PlayerAction> = ops.iter().map(|op| to_action(&base, op)).collect();

            let first = advance_game_state(&base, &actions, seed);
            let second = advance_game_state(&base, &actions, seed);
            prop_assert_eq!(&first, &second);
            if let (Ok(a), Ok(b)) = (&first, &second) {
                prop_assert_eq!(a.compute_hash(), b.compute_hash());
            }
        }

        #[test]
        fn prop_input_is_never_mutated(ops in prop::collection::vec(op_strategy(), 0..12), seed in any::<u32>()) {
            let base = seeded_state();
            let snapshot = base.clone();
            let snapshot_hash = base.compute_hash();
            let actions: Vec<PlayerAction> = ops.iter().map(|op| to_action(&base, op)).collect();

            let _ = advance_game_state(&base, &actions, seed);
            prop_assert_eq!(&base, &snapshot);
            prop_assert_eq!(base.compute_hash(), snapshot_hash);
        }

        #[test]
        fn prop_advance_turn_counts(n in 0usize..40, start in 0u32..1000, seed in any::<u32>()) {
            let mut base = game(&PLAYERS);
            base.turn.turn_number = start;
            let actions = vec![PlayerAction::advance_turn(); n];

            let next = advance_game_state(&base, &actions, seed).unwrap();
            prop_assert_eq!(next.turn.turn_number, start + n as u32);
        }
    }
}
