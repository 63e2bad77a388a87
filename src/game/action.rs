//! Player Actions
//!
//! The closed set of action kinds a reducer call can apply. Actions travel as
//! `{"type": "...", "playerId"?: "...", "payload": {...}}`; decoding from that
//! shape goes through [`RawAction`] so an unrecognised `type` becomes a
//! validation error instead of a silent no-op.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::error::{ActionError, EngineError};
use crate::game::state::{DebateId, PlayerId, ProposalId, VoteChoice};

// =============================================================================
// PAYLOADS
// =============================================================================

/// Payload of `propose`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposePayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Falls back to the acting player when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposer_id: Option<PlayerId>,
}

/// Payload of `start_debate`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDebatePayload {
    #[serde(default)]
    pub proposal_id: ProposalId,
    /// Defaults to every player in roster order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaking_order: Option<Vec<PlayerId>>,
}

/// Payload of `speak`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakPayload {
    #[serde(default)]
    pub debate_id: DebateId,
    /// Falls back to the acting player when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<PlayerId>,
    #[serde(default)]
    pub content: String,
}

/// Payload of `vote`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    #[serde(default)]
    pub proposal_id: ProposalId,
    /// Falls back to the acting player when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    pub choice: VoteChoice,
}

// =============================================================================
// ACTION
// =============================================================================

/// Action kind with its payload.
///
/// Adding a variant forces every `match` in the handlers to cover it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Propose(ProposePayload),
    StartDebate(StartDebatePayload),
    Speak(SpeakPayload),
    Vote(VotePayload),
    AdvanceTurn,
}

impl ActionKind {
    /// Wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Propose(_) => "propose",
            ActionKind::StartDebate(_) => "start_debate",
            ActionKind::Speak(_) => "speak",
            ActionKind::Vote(_) => "vote",
            ActionKind::AdvanceTurn => "advance_turn",
        }
    }
}

/// One player action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub struct PlayerAction {
    /// Acting player, as authenticated by the API layer.
    pub player_id: Option<PlayerId>,
    /// What to do.
    pub kind: ActionKind,
}

impl PlayerAction {
    /// Wrap a kind with no acting player.
    pub fn new(kind: ActionKind) -> Self {
        Self { player_id: None, kind }
    }

    /// Set the acting player.
    pub fn by(mut self, player_id: impl Into<PlayerId>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    /// `propose` with an explicit proposer.
    pub fn propose(
        title: impl Into<String>,
        description: impl Into<String>,
        proposer_id: impl Into<PlayerId>,
    ) -> Self {
        Self::new(ActionKind::Propose(ProposePayload {
            title: title.into(),
            description: description.into(),
            proposer_id: Some(proposer_id.into()),
        }))
    }

    /// `start_debate`, optionally with an explicit speaking order.
    pub fn start_debate(proposal_id: impl Into<ProposalId>, speaking_order: Option<Vec<PlayerId>>) -> Self {
        Self::new(ActionKind::StartDebate(StartDebatePayload {
            proposal_id: proposal_id.into(),
            speaking_order,
        }))
    }

    /// `speak` in a debate.
    pub fn speak(
        debate_id: impl Into<DebateId>,
        speaker_id: impl Into<PlayerId>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(ActionKind::Speak(SpeakPayload {
            debate_id: debate_id.into(),
            speaker_id: Some(speaker_id.into()),
            content: content.into(),
        }))
    }

    /// `vote` on a proposal.
    pub fn vote(proposal_id: impl Into<ProposalId>, player_id: impl Into<PlayerId>, choice: VoteChoice) -> Self {
        Self::new(ActionKind::Vote(VotePayload {
            proposal_id: proposal_id.into(),
            player_id: Some(player_id.into()),
            choice,
        }))
    }

    /// `advance_turn`.
    pub fn advance_turn() -> Self {
        Self::new(ActionKind::AdvanceTurn)
    }

    /// Wire name of this action's kind.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

// =============================================================================
// RAW WIRE FORM
// =============================================================================

/// Untyped wire form of an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

/// Failure to turn wire data into a [`PlayerAction`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The action is not a JSON object.
    #[error("action must be a JSON object")]
    NotAnObject,

    /// No string `type` field.
    #[error("action is missing a string \"type\" field")]
    MissingType,

    /// `type` names no known action kind.
    #[error("unknown action kind {0:?}")]
    UnknownKind(String),

    /// The payload does not have the kind's shape.
    #[error("malformed {kind} payload: {message}")]
    MalformedPayload {
        /// Action kind being decoded.
        kind: String,
        /// Deserializer message.
        message: String,
    },
}

impl From<DecodeError> for ActionError {
    fn from(err: DecodeError) -> Self {
        ActionError::validation(err.to_string())
    }
}

fn payload_of<T: serde::de::DeserializeOwned>(raw: &RawAction) -> Result<T, DecodeError> {
    let payload = if raw.payload.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        raw.payload.clone()
    };
    serde_json::from_value(payload).map_err(|e| DecodeError::MalformedPayload {
        kind: raw.kind.clone(),
        message: e.to_string(),
    })
}

impl TryFrom<RawAction> for PlayerAction {
    type Error = DecodeError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let kind = match raw.kind.as_str() {
            "propose" => ActionKind::Propose(payload_of(&raw)?),
            "start_debate" => ActionKind::StartDebate(payload_of(&raw)?),
            "speak" => ActionKind::Speak(payload_of(&raw)?),
            "vote" => ActionKind::Vote(payload_of(&raw)?),
            "advance_turn" => ActionKind::AdvanceTurn,
            other => return Err(DecodeError::UnknownKind(other.to_string())),
        };
        Ok(PlayerAction { player_id: raw.player_id, kind })
    }
}

impl From<PlayerAction> for RawAction {
    fn from(action: PlayerAction) -> Self {
        let kind = action.name().to_string();
        let payload = match &action.kind {
            ActionKind::Propose(p) => serde_json::to_value(p),
            ActionKind::StartDebate(p) => serde_json::to_value(p),
            ActionKind::Speak(p) => serde_json::to_value(p),
            ActionKind::Vote(p) => serde_json::to_value(p),
            ActionKind::AdvanceTurn => Ok(Value::Null),
        };
        RawAction {
            kind,
            player_id: action.player_id,
            payload: payload.unwrap_or_default(),
        }
    }
}

/// Decode one action from arbitrary JSON.
pub fn decode_action(value: &Value) -> Result<PlayerAction, DecodeError> {
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?
        .to_string();

    let player_id = match obj.get("playerId") {
        None | Some(Value::Null) => None,
        Some(v) => Some(serde_json::from_value::<PlayerId>(v.clone()).map_err(|e| {
            DecodeError::MalformedPayload {
                kind: kind.clone(),
                message: format!("playerId: {e}"),
            }
        })?),
    };
    let payload = obj.get("payload").cloned().unwrap_or(Value::Null);

    PlayerAction::try_from(RawAction { kind, player_id, payload })
}

/// Decode a whole batch, failing on the first bad action.
///
/// The error carries the action's index and its raw `type` (or `"<missing>"`).
pub fn decode_actions(values: &[Value]) -> Result<Vec<PlayerAction>, EngineError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            decode_action(value).map_err(|err| EngineError {
                index,
                action: value
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("<missing>")
                    .to_string(),
                source: err.into(),
            })
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_decode_propose() {
        let action = decode_action(&json!({
            "type": "propose",
            "payload": {"title": "Budget Reform", "description": "More schools", "proposerId": "p1"}
        }))
        .unwrap();

        match action.kind {
            ActionKind::Propose(p) => {
                assert_eq!(p.title, "Budget Reform");
                assert_eq!(p.proposer_id, Some(PlayerId::from("p1")));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_decode_advance_turn_without_payload() {
        let action = decode_action(&json!({"type": "advance_turn"})).unwrap();
        assert_eq!(action.kind, ActionKind::AdvanceTurn);

        let action = decode_action(&json!({"type": "advance_turn", "payload": {"ignored": 1}})).unwrap();
        assert_eq!(action.kind, ActionKind::AdvanceTurn);
    }

    #[test]
    fn test_decode_actor() {
        let action = decode_action(&json!({
            "type": "vote",
            "playerId": "p2",
            "payload": {"proposalId": "proposal-1", "choice": "abstain"}
        }))
        .unwrap();
        assert_eq!(action.player_id, Some(PlayerId::from("p2")));
    }

    #[test]
    fn test_unknown_kind() {
        let err = decode_action(&json!({"type": "impeach", "payload": {}})).unwrap_err();
        assert_eq!(err, DecodeError::UnknownKind("impeach".to_string()));
    }

    #[test]
    fn test_invalid_choice_is_malformed() {
        let err = decode_action(&json!({
            "type": "vote",
            "payload": {"proposalId": "proposal-1", "playerId": "p1", "choice": "maybe"}
        }))
        .unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { .. }));
    }

    #[test]
    fn test_missing_type() {
        assert_eq!(decode_action(&json!({"payload": {}})).unwrap_err(), DecodeError::MissingType);
        assert_eq!(decode_action(&json!("propose")).unwrap_err(), DecodeError::NotAnObject);
    }

    #[test]
    fn test_decode_actions_reports_index() {
        let err = decode_actions(&[
            json!({"type": "advance_turn"}),
            json!({"type": "filibuster"}),
        ])
        .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.action, "filibuster");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_serde_wire_shape() {
        let action = PlayerAction::vote("proposal-1", "p1", VoteChoice::Against).by("p1");
        let value = serde_json::to_value(&action).unwrap();

        assert_eq!(value["type"], "vote");
        assert_eq!(value["playerId"], "p1");
        assert_eq!(value["payload"]["proposalId"], "proposal-1");
        assert_eq!(value["payload"]["choice"], "against");

        let back: PlayerAction = serde_json::from_value(value).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_serde_rejects_unknown_kind() {
        let result = serde_json::from_str::<PlayerAction>(r#"{"type": "coup"}"#);
        assert!(result.is_err());
    }
}
