//! Deterministic Action Clock
//!
//! Entities created by actions need timestamps, but the engine must never read
//! the wall clock. Timestamps are derived from the input game's `updated_at`,
//! the action's position in the batch, and one RNG draw of sub-second jitter.

use chrono::{DateTime, TimeDelta, Utc};

use super::rng::Mulberry32;

/// Milliseconds between consecutive actions of one batch.
pub const ACTION_SPACING_MS: i64 = 1000;

/// Clock anchored at a fixed instant for the duration of one reducer call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionClock {
    anchor: DateTime<Utc>,
}

impl ActionClock {
    /// Anchor the clock at `anchor`.
    pub const fn new(anchor: DateTime<Utc>) -> Self {
        Self { anchor }
    }

    /// Timestamp for the action at 1-based `sequence`.
    ///
    /// Advances the RNG exactly once. Saturates at the anchor if the offset
    /// would overflow the representable range.
    pub fn stamp(&self, sequence: u32, rng: &mut Mulberry32) -> DateTime<Utc> {
        let jitter = i64::from(rng.next_below(1000));
        self.offset(i64::from(sequence) * ACTION_SPACING_MS + jitter)
    }

    /// Start of the slot for `sequence`, without touching the RNG.
    pub fn slot_start(&self, sequence: u32) -> DateTime<Utc> {
        self.offset(i64::from(sequence) * ACTION_SPACING_MS)
    }

    fn offset(&self, millis: i64) -> DateTime<Utc> {
        self.anchor
            .checked_add_signed(TimeDelta::milliseconds(millis))
            .unwrap_or(self.anchor)
    }
}
