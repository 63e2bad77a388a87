//! Rules Configuration
//!
//! Policy knobs for behaviour the game design leaves to the host. Defaults are
//! the engine's public contract; hosts override them per game, and replay logs
//! record the configuration they were produced under.

use serde::{Deserialize, Serialize};

/// Default per-speaker debate time limit (5 minutes).
pub const DEFAULT_SPEAKER_TIME_LIMIT_MS: u64 = 300_000;

/// What to do when a player votes again on the same proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateVotePolicy {
    /// Reject the second vote with a duplicate error.
    #[default]
    Reject,
    /// Record the new vote; only each player's latest vote is counted.
    Supersede,
}

/// How `advance_turn` treats the turn phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhasePolicy {
    /// Step through `lobby → debate → voting → enacted → lobby`.
    #[default]
    Cycle,
    /// Only increment the turn number; the host manages phases.
    CounterOnly,
}

/// Whether `speak` moves the debate's speaker pointer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerAdvance {
    /// Advance after each speech; wrapping past the last speaker completes the debate.
    #[default]
    Advance,
    /// Leave the pointer and debate status to the host.
    Manual,
}

/// Treasury and rate effects applied when a proposal is enacted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EconomyRules {
    /// Off by default: the economy is carried through unchanged.
    pub simulate_on_enactment: bool,
    pub base_income: i64,
    pub base_inflation_drift: f64,
    pub base_unemployment_drift: f64,
    /// Keyword-triggered effects, matched against the lowercased title.
    pub policy_effects: Vec<PolicyEffect>,
}

/// Effect of enacting a proposal whose title contains `keyword`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyEffect {
    pub keyword: String,
    #[serde(default)]
    pub treasury: i64,
    #[serde(default)]
    pub inflation: f64,
    #[serde(default)]
    pub unemployment: f64,
}

impl PolicyEffect {
    fn new(keyword: &str, treasury: i64, inflation: f64, unemployment: f64) -> Self {
        Self {
            keyword: keyword.to_string(),
            treasury,
            inflation,
            unemployment,
        }
    }
}

impl Default for EconomyRules {
    fn default() -> Self {
        Self {
            simulate_on_enactment: false,
            base_income: 10_000,
            base_inflation_drift: 0.001,
            base_unemployment_drift: -0.001,
            policy_effects: vec![
                PolicyEffect::new("tax", 5_000, 0.005, 0.0),
                PolicyEffect::new("welfare", -2_000, 0.0, -0.01),
                PolicyEffect::new("austerity", 3_000, 0.0, 0.005),
            ],
        }
    }
}

/// Complete rules configuration for one game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RulesConfig {
    pub duplicate_votes: DuplicateVotePolicy,
    pub turn_phases: TurnPhasePolicy,
    pub speaking_order: SpeakerAdvance,
    pub speaker_time_limit_ms: u64,
    pub economy: EconomyRules,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            duplicate_votes: DuplicateVotePolicy::default(),
            turn_phases: TurnPhasePolicy::default(),
            speaking_order: SpeakerAdvance::default(),
            speaker_time_limit_ms: DEFAULT_SPEAKER_TIME_LIMIT_MS,
            economy: EconomyRules::default(),
        }
    }
}

impl RulesConfig {
    /// Parse from JSON; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
