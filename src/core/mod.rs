//! Core deterministic primitives.
//!
//! Nothing in this module reads the wall clock or OS entropy. Every value is
//! a pure function of its inputs, which is what makes action logs replayable.

pub mod rng;
pub mod id;
pub mod clock;
pub mod hash;

// Re-export core types
pub use rng::{mulberry32, Mulberry32};
pub use id::deterministic_id;
pub use clock::ActionClock;
pub use hash::{StateHash, StateHasher};
