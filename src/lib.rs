//! # Political Sphere Engine
//!
//! Deterministic game-state transitions for the Political Sphere simulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  POLITICAL SPHERE ENGINE                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Mulberry32 PRNG                           │
//! │  ├── id.rs       - Seeded entity ids                         │
//! │  ├── clock.rs    - Derived action timestamps                 │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Rules engine (deterministic)              │
//! │  ├── state.rs    - Game aggregate and entities               │
//! │  ├── action.rs   - Player actions and JSON decoding          │
//! │  ├── handlers.rs - One handler per action kind               │
//! │  ├── vote.rs     - Tally and quorum                          │
//! │  ├── economy.rs  - Enactment effects                         │
//! │  └── reducer.rs  - advance_game_state                        │
//! │                                                              │
//! │  replay/         - Recorded action logs                      │
//! │  ├── log.rs      - Log recording                             │
//! │  └── verify.rs   - Verification by replay                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! `advance_game_state(game, actions, seed)` is a pure function:
//! - No wall-clock reads (timestamps derive from the input's `updated_at`)
//! - No process-wide random state (one Mulberry32 per call)
//! - No HashMap iteration in rules code (BTreeMap where order matters)
//! - The input state is never mutated
//!
//! Given identical inputs the engine produces **identical results**, so an
//! action log replays to the same state hash on any platform.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod replay;

// Re-export commonly used types
pub use core::rng::{mulberry32, Mulberry32};
pub use core::id::deterministic_id;
pub use core::hash::StateHash;
pub use game::action::{ActionKind, PlayerAction};
pub use game::error::{ActionError, EngineError, ErrorKind};
pub use game::reducer::{advance_game_state, advance_game_state_raw, Engine, DEFAULT_SEED};
pub use game::rules::RulesConfig;
pub use game::state::GameState;
pub use replay::{verify_log, ActionLog};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
