//! Action Handlers
//!
//! One handler per action kind. Each handler validates against the state it
//! is given, and only then builds the successor state. Collections are
//! updated through `Arc::make_mut`, so a collection shared with the caller's
//! original state is copied on first write and never mutated in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::clock::ActionClock;
use crate::core::id::deterministic_id;
use crate::core::rng::Mulberry32;
use crate::game::action::{ActionKind, PlayerAction, ProposePayload, SpeakPayload, StartDebatePayload, VotePayload};
use crate::game::economy::apply_enactment;
use crate::game::error::{ActionError, EntityKind};
use crate::game::events::{GameEvent, GameEventData};
use crate::game::rules::{DuplicateVotePolicy, RulesConfig, SpeakerAdvance, TurnPhasePolicy};
use crate::game::state::{
    Debate, DebateStatus, GameState, PlayerId, Proposal, ProposalStatus, Speech, Vote,
};
use crate::game::vote::tally;

/// Per-call state threaded through every handler.
///
/// Owns nothing global: the RNG is borrowed from the reducer call, so
/// concurrent reductions never share random state.
pub struct ActionContext<'a> {
    rng: &'a mut Mulberry32,
    clock: ActionClock,
    rules: &'a RulesConfig,
    index: usize,
    latest: Option<DateTime<Utc>>,
    events: Vec<GameEvent>,
}

impl<'a> ActionContext<'a> {
    /// Context for one reducer call.
    pub fn new(rng: &'a mut Mulberry32, clock: ActionClock, rules: &'a RulesConfig) -> Self {
        Self {
            rng,
            clock,
            rules,
            index: 0,
            latest: None,
            events: Vec::new(),
        }
    }

    /// Move to the action at zero-based `index`.
    pub fn begin(&mut self, index: usize) {
        self.index = index;
    }

    /// 1-based batch position, used for timestamp slots.
    fn sequence(&self) -> u32 {
        u32::try_from(self.index + 1).unwrap_or(u32::MAX)
    }

    /// Draw a fresh id, rejecting the (improbable) collision with an existing entity.
    fn fresh_id(&mut self, state: &GameState, prefix: &str) -> Result<String, ActionError> {
        let id = deterministic_id(prefix, self.rng);
        if state.id_in_use(&id) {
            return Err(ActionError::validation(format!(
                "generated id {id} collides with an existing entity"
            )));
        }
        Ok(id)
    }

    /// Timestamp for the current action (one RNG draw).
    fn stamp(&mut self) -> DateTime<Utc> {
        let ts = self.clock.stamp(self.sequence(), self.rng);
        self.latest = Some(ts);
        ts
    }

    /// Mark the start of the current action's slot; no RNG draw.
    fn mark_slot_start(&mut self) {
        self.latest = Some(self.clock.slot_start(self.sequence()));
    }

    fn emit(&mut self, data: GameEventData) {
        self.events.push(GameEvent::new(self.index, data));
    }

    /// Timestamp of the last action applied, if any.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.latest
    }

    /// Consume the context, yielding the events of the batch.
    pub fn into_events(self) -> Vec<GameEvent> {
        self.events
    }
}

/// Apply one action. Dispatch is an exhaustive match over [`ActionKind`].
pub fn apply_action(
    state: GameState,
    action: &PlayerAction,
    ctx: &mut ActionContext<'_>,
) -> Result<GameState, ActionError> {
    let actor = action.player_id.as_ref();
    match &action.kind {
        ActionKind::Propose(payload) => propose(state, actor, payload, ctx),
        ActionKind::StartDebate(payload) => start_debate(state, payload, ctx),
        ActionKind::Speak(payload) => speak(state, actor, payload, ctx),
        ActionKind::Vote(payload) => vote(state, actor, payload, ctx),
        ActionKind::AdvanceTurn => advance_turn(state, ctx),
    }
}

/// Payload id, else the acting player, else a validation error.
fn resolve_player<'p>(
    explicit: Option<&'p PlayerId>,
    actor: Option<&'p PlayerId>,
    what: &str,
) -> Result<&'p PlayerId, ActionError> {
    explicit
        .or(actor)
        .filter(|id| !id.as_str().is_empty())
        .ok_or_else(|| ActionError::validation(format!("{what} is required")))
}

fn require_player(state: &GameState, id: &PlayerId) -> Result<(), ActionError> {
    if state.has_player(id) {
        Ok(())
    } else {
        Err(ActionError::not_found(EntityKind::Player, id))
    }
}

// =============================================================================
// PROPOSE
// =============================================================================

fn propose(
    state: GameState,
    actor: Option<&PlayerId>,
    payload: &ProposePayload,
    ctx: &mut ActionContext<'_>,
) -> Result<GameState, ActionError> {
    if payload.title.trim().is_empty() {
        return Err(ActionError::validation("proposal title is required"));
    }
    let proposer_id = resolve_player(payload.proposer_id.as_ref(), actor, "proposer id")?.clone();
    if !state.has_player(&proposer_id) {
        return Err(ActionError::validation(format!(
            "proposer {proposer_id} is not a player in this game"
        )));
    }

    let id = ctx.fresh_id(&state, "proposal")?;
    let created_at = ctx.stamp();

    let mut next = state;
    let proposal = Proposal {
        id: id.into(),
        title: payload.title.clone(),
        description: payload.description.clone(),
        proposer_id: proposer_id.clone(),
        created_at,
        status: ProposalStatus::Proposed,
        debate_id: None,
        moderation: None,
        content_rating: Some(next.content_rating),
    };
    let proposal_id = proposal.id.clone();
    Arc::make_mut(&mut next.proposals).push(proposal);

    ctx.emit(GameEventData::ProposalCreated { proposal_id, proposer_id });
    Ok(next)
}

// =============================================================================
// START DEBATE
// =============================================================================

fn start_debate(
    state: GameState,
    payload: &StartDebatePayload,
    ctx: &mut ActionContext<'_>,
) -> Result<GameState, ActionError> {
    if payload.proposal_id.as_str().is_empty() {
        return Err(ActionError::validation("proposal id is required"));
    }
    let proposal_idx = state
        .proposal_index(&payload.proposal_id)
        .ok_or_else(|| ActionError::not_found(EntityKind::Proposal, &payload.proposal_id))?;
    let status = state.proposals[proposal_idx].status;
    if status.is_terminal() {
        return Err(ActionError::terminal_proposal(&payload.proposal_id, status));
    }
    if status != ProposalStatus::Proposed {
        return Err(ActionError::InvalidTransition {
            entity: EntityKind::Proposal,
            id: payload.proposal_id.to_string(),
            reason: format!("cannot start a debate on a proposal in {status}"),
        });
    }

    let speaking_order = match &payload.speaking_order {
        Some(order) => {
            for speaker in order {
                require_player(&state, speaker)?;
            }
            order.clone()
        }
        None => state.players.iter().map(|p| p.id.clone()).collect(),
    };
    if speaking_order.is_empty() {
        return Err(ActionError::validation("speaking order is empty"));
    }

    let debate_id = ctx.fresh_id(&state, "debate")?;
    let started_at = ctx.stamp();

    let mut next = state;
    let debate = Debate {
        id: debate_id.into(),
        proposal_id: payload.proposal_id.clone(),
        speaking_order,
        current_speaker_index: 0,
        time_limit_ms: ctx.rules.speaker_time_limit_ms,
        started_at,
        status: DebateStatus::Active,
    };
    let debate_id = debate.id.clone();
    Arc::make_mut(&mut next.debates).push(debate);

    let proposal = &mut Arc::make_mut(&mut next.proposals)[proposal_idx];
    proposal.status = ProposalStatus::Debate;
    proposal.debate_id = Some(debate_id.clone());

    ctx.emit(GameEventData::DebateStarted {
        debate_id,
        proposal_id: payload.proposal_id.clone(),
    });
    Ok(next)
}

// =============================================================================
// SPEAK
// =============================================================================

fn speak(
    state: GameState,
    actor: Option<&PlayerId>,
    payload: &SpeakPayload,
    ctx: &mut ActionContext<'_>,
) -> Result<GameState, ActionError> {
    if payload.debate_id.as_str().is_empty() {
        return Err(ActionError::validation("debate id is required"));
    }
    if payload.content.trim().is_empty() {
        return Err(ActionError::validation("speech content is required"));
    }
    let speaker_id = resolve_player(payload.speaker_id.as_ref(), actor, "speaker id")?.clone();

    let debate_idx = state
        .debate_index(&payload.debate_id)
        .ok_or_else(|| ActionError::not_found(EntityKind::Debate, &payload.debate_id))?;
    require_player(&state, &speaker_id)?;
    if state.debates[debate_idx].status == DebateStatus::Completed {
        return Err(ActionError::InvalidTransition {
            entity: EntityKind::Debate,
            id: payload.debate_id.to_string(),
            reason: "debate is already completed".to_string(),
        });
    }

    let speech_id = ctx.fresh_id(&state, "speech")?;
    let timestamp = ctx.stamp();

    let mut next = state;
    let speech = Speech {
        id: speech_id.into(),
        debate_id: payload.debate_id.clone(),
        speaker_id: speaker_id.clone(),
        content: payload.content.clone(),
        timestamp,
    };
    let speech_id = speech.id.clone();
    Arc::make_mut(&mut next.speeches).push(speech);
    ctx.emit(GameEventData::SpeechRecorded {
        speech_id,
        debate_id: payload.debate_id.clone(),
        speaker_id,
    });

    if ctx.rules.speaking_order == SpeakerAdvance::Advance {
        let debate = &mut Arc::make_mut(&mut next.debates)[debate_idx];
        let following = debate.current_speaker_index.saturating_add(1);
        if following as usize >= debate.speaking_order.len() {
            debate.current_speaker_index = 0;
            debate.status = DebateStatus::Completed;
            ctx.emit(GameEventData::DebateCompleted {
                debate_id: payload.debate_id.clone(),
            });
        } else {
            debate.current_speaker_index = following;
        }
    }

    Ok(next)
}

// =============================================================================
// VOTE
// =============================================================================

fn vote(
    state: GameState,
    actor: Option<&PlayerId>,
    payload: &VotePayload,
    ctx: &mut ActionContext<'_>,
) -> Result<GameState, ActionError> {
    if payload.proposal_id.as_str().is_empty() {
        return Err(ActionError::validation("proposal id is required"));
    }
    let player_id = resolve_player(payload.player_id.as_ref(), actor, "voter id")?.clone();

    let proposal_idx = state
        .proposal_index(&payload.proposal_id)
        .ok_or_else(|| ActionError::not_found(EntityKind::Proposal, &payload.proposal_id))?;
    let status = state.proposals[proposal_idx].status;
    if status.is_terminal() {
        return Err(ActionError::terminal_proposal(&payload.proposal_id, status));
    }
    require_player(&state, &player_id)?;

    if ctx.rules.duplicate_votes == DuplicateVotePolicy::Reject
        && state.votes_on(&payload.proposal_id).any(|v| v.player_id == player_id)
    {
        return Err(ActionError::Duplicate {
            proposal_id: payload.proposal_id.clone(),
            player_id,
        });
    }

    let vote_id = ctx.fresh_id(&state, "vote")?;
    let timestamp = ctx.stamp();

    let mut next = state;
    let vote = Vote {
        id: vote_id.into(),
        proposal_id: payload.proposal_id.clone(),
        player_id: player_id.clone(),
        choice: payload.choice,
        timestamp,
    };
    let vote_id = vote.id.clone();
    Arc::make_mut(&mut next.votes).push(vote);
    ctx.emit(GameEventData::VoteCast {
        vote_id,
        proposal_id: payload.proposal_id.clone(),
        player_id,
        choice: payload.choice,
    });

    let rules = ctx.rules;
    let counted = tally(&next, &payload.proposal_id);
    let total_players = u32::try_from(next.players.len()).unwrap_or(u32::MAX);
    if let Some(resolution) = counted.resolve(total_players) {
        let proposal = &mut Arc::make_mut(&mut next.proposals)[proposal_idx];
        proposal.status = resolution;
        let title = proposal.title.clone();
        ctx.emit(GameEventData::proposal_resolved(
            payload.proposal_id.clone(),
            resolution,
            counted,
        ));

        let economy_rules = &rules.economy;
        if resolution == ProposalStatus::Enacted && economy_rules.simulate_on_enactment {
            next.economy = apply_enactment(next.economy, &title, economy_rules);
            ctx.emit(GameEventData::EconomyUpdated { economy: next.economy });
        }
    }

    Ok(next)
}

// =============================================================================
// ADVANCE TURN
// =============================================================================

fn advance_turn(state: GameState, ctx: &mut ActionContext<'_>) -> Result<GameState, ActionError> {
    let turn_number = state
        .turn
        .turn_number
        .checked_add(1)
        .ok_or_else(|| ActionError::validation("turn counter overflow"))?;

    let promotable: Vec<usize> = state
        .proposals
        .iter()
        .enumerate()
        .filter(|(_, p)| p.status == ProposalStatus::Debate)
        .filter(|(_, p)| {
            p.debate_id
                .as_ref()
                .and_then(|id| state.debate(id))
                .is_some_and(|d| d.status == DebateStatus::Completed)
        })
        .map(|(i, _)| i)
        .collect();

    ctx.mark_slot_start();

    let mut next = state;
    if !promotable.is_empty() {
        let proposals = Arc::make_mut(&mut next.proposals);
        for idx in promotable {
            proposals[idx].status = ProposalStatus::Voting;
            ctx.emit(GameEventData::ProposalPromoted {
                proposal_id: proposals[idx].id.clone(),
            });
        }
    }

    next.turn.turn_number = turn_number;
    if ctx.rules.turn_phases == TurnPhasePolicy::Cycle {
        next.turn.phase = next.turn.phase.next();
    }
    ctx.emit(GameEventData::TurnAdvanced {
        turn_number,
        phase: next.turn.phase,
    });

    Ok(next)
}

// =============================================================================
// TESTS
// =============================================================================
