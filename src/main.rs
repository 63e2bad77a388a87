//! Political Sphere Engine CLI
//!
//! Runs a scripted demo session, verifies recorded action logs, and applies
//! raw action batches to stored game states.

// Allow print in the CLI binary
#![allow(clippy::print_stdout)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use political_sphere::{
    game::{
        events::{GameEvent, GameEventData},
        state::{GameState, Player, VoteChoice},
    },
    replay::{verify_log, ActionLog, LogRecorder},
    Engine, PlayerAction, RulesConfig, DEFAULT_SEED, VERSION,
};

/// Political Sphere - deterministic game-state engine
#[derive(Parser, Debug)]
#[command(name = "political-sphere-engine")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scripted session twice and check both runs agree
    Demo {
        /// Base seed; each batch uses the next one
        #[arg(short, long, default_value_t = 12345)]
        seed: u32,

        /// Save the recorded action log to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Verify a recorded action log by replay
    Verify {
        /// Action log (JSON)
        #[arg(required = true)]
        log: PathBuf,
    },

    /// Apply a raw action batch and print the resulting game state
    Apply {
        /// Game state (JSON)
        #[arg(required = true)]
        game: PathBuf,

        /// Array of actions (JSON)
        #[arg(required = true)]
        actions: PathBuf,

        /// Reducer seed
        #[arg(short, long, default_value_t = DEFAULT_SEED)]
        seed: u32,

        /// Rules configuration (JSON); defaults apply when absent
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Demo { seed, save } => demo(seed, save.as_deref()),
        Commands::Verify { log } => verify(&log),
        Commands::Apply { game, actions, seed, rules } => apply(&game, &actions, seed, rules.as_deref()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

// =============================================================================
// DEMO
// =============================================================================

fn demo(seed: u32, save: Option<&Path>) -> Result<()> {
    info!("Political Sphere Engine v{}", VERSION);
    info!("=== Starting Demo Session ===");
    info!("Base seed: {}", seed);

    let log = demo_session(seed)?;
    let hash = log.final_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by running the script again
    info!("=== Verifying Determinism ===");
    let rerun = demo_session(seed)?;
    let rerun_hash = rerun.final_hash();
    info!("Rerun State Hash: {}", hex::encode(rerun_hash));
    if hash != rerun_hash {
        bail!("determinism failure: hashes differ");
    }

    let result = verify_log(&log);
    if let Some(err) = result.error {
        bail!("recorded log failed verification: {err}");
    }
    info!("DETERMINISM VERIFIED: {} entries replayed", result.entry_results.len());

    if let Some(path) = save {
        fs::write(path, log.to_json()?).with_context(|| format!("writing {}", path.display()))?;
        info!("Saved action log to {}", path.display());
    }
    Ok(())
}

/// Propose, debate, vote and advance turns with three fixture players.
fn demo_session(seed: u32) -> Result<ActionLog> {
    let created_at = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).context("fixture timestamp out of range")?;
    let game = GameState::new("demo-game", "Demo Parliament", created_at).with_players(vec![
        Player::new("alice", "Alice"),
        Player::new("bob", "Bob"),
        Player::new("carol", "Carol"),
    ]);
    let mut recorder = LogRecorder::new(game, RulesConfig::default());

    let state = recorder.apply(
        vec![PlayerAction::propose("Carbon tax", "Price emissions at source", "alice")],
        seed,
    )?;
    let proposal_id = state.proposals[0].id.clone();
    info!("Proposal {} created", proposal_id);

    let state = recorder.apply(
        vec![PlayerAction::start_debate(proposal_id.clone(), None)],
        seed.wrapping_add(1),
    )?;
    let debate_id = state.debates[0].id.clone();
    info!("Debate {} opened", debate_id);

    let debate = vec![
        PlayerAction::speak(debate_id.clone(), "alice", "Polluters should pay."),
        PlayerAction::speak(debate_id.clone(), "bob", "Households will pay."),
        PlayerAction::speak(debate_id, "carol", "Rebate the revenue."),
        PlayerAction::advance_turn(),
    ];
    log_events(&recorder.record(debate, seed.wrapping_add(2))?);

    let votes = vec![
        PlayerAction::vote(proposal_id.clone(), "alice", VoteChoice::For),
        PlayerAction::vote(proposal_id.clone(), "bob", VoteChoice::Against),
        PlayerAction::vote(proposal_id, "carol", VoteChoice::For),
        PlayerAction::advance_turn(),
    ];
    log_events(&recorder.record(votes, seed.wrapping_add(3))?);
    let state = recorder.state();

    info!(
        "Turn {} ({:?}), proposal {}",
        state.turn.turn_number, state.turn.phase, state.proposals[0].status
    );
    Ok(recorder.finish())
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        match &event.data {
            GameEventData::DebateCompleted { debate_id } => {
                info!("Debate {} completed", debate_id);
            }
            GameEventData::ProposalPromoted { proposal_id } => {
                info!("Proposal {} moved to voting", proposal_id);
            }
            GameEventData::ProposalResolved {
                proposal_id,
                status,
                for_count,
                against_count,
                abstain_count,
            } => {
                info!(
                    "Proposal {} {} ({} for, {} against, {} abstain)",
                    proposal_id, status, for_count, against_count, abstain_count
                );
            }
            GameEventData::TurnAdvanced { turn_number, phase } => {
                info!("Turn {} begins ({:?})", turn_number, phase);
            }
            _ => {}
        }
    }
}

// =============================================================================
// VERIFY / APPLY
// =============================================================================

fn verify(path: &Path) -> Result<()> {
    let log: ActionLog = read_json(path)?;
    info!("Verifying {} entries from {}", log.entries.len(), path.display());

    let result = verify_log(&log);
    for entry in &result.entry_results {
        info!("Entry {}: {}", entry.index, if entry.valid { "ok" } else { "MISMATCH" });
    }
    if let Some(err) = result.error {
        bail!("verification failed: {err}");
    }
    info!("Log verified, final hash {}", hex::encode(result.computed_final_hash));
    Ok(())
}

fn apply(game: &Path, actions: &Path, seed: u32, rules: Option<&Path>) -> Result<()> {
    let game: GameState = read_json(game)?;
    let actions: Vec<Value> = read_json(actions)?;
    let rules = match rules {
        Some(path) => read_json(path)?,
        None => RulesConfig::default(),
    };

    let next = Engine::new(rules)
        .advance_raw(&game, &actions, seed)
        .context("action batch rejected")?;
    info!("Applied {} actions, state hash {}", actions.len(), hex::encode(next.compute_hash()));
    println!("{}", serde_json::to_string_pretty(&next)?);
    Ok(())
}
