//! Deterministic Random Number Generator
//!
//! Uses the Mulberry32 algorithm: a 32-bit multiply-xorshift mixer with a
//! single word of state. Given the same seed, produces the identical sequence
//! on every platform and in every runtime that implements the same mixer, so
//! recorded action logs replay exactly.

use serde::{Deserialize, Serialize};

/// Weyl-sequence increment added to the state before every draw.
const GOLDEN_GAMMA: u32 = 0x6D2B_79F5;

/// 2^32 as a float, the divisor mapping a `u32` draw into [0, 1).
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Deterministic PRNG using the Mulberry32 algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG produces the exact same sequence of values
/// on any platform. It is not cryptographically secure; replayability is the
/// only property that matters here.
///
/// # Example
///
/// ```
/// use political_sphere::core::rng::Mulberry32;
///
/// let mut rng = Mulberry32::new(42);
/// assert_eq!(rng.next_u32(), 2581720956); // Always the same!
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Create a new RNG from a 32-bit seed.
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generate the next raw 32-bit value.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Generate the next value in [0, 1).
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    /// Generate an integer in [0, max) by scaling a float draw.
    ///
    /// Scaling (rather than modulo) keeps the result identical to
    /// `floor(rng() * max)` computed by other runtimes from the same draw.
    #[inline]
    pub fn next_below(&mut self, max: u32) -> u32 {
        (self.next_f64() * f64::from(max)).floor() as u32
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: u32) {
        self.state = state;
    }
}

/// Construct a Mulberry32 generator from a seed.
///
/// Free-function form for callers that need reproducible auxiliary
/// randomness, e.g. test fixtures.
pub fn mulberry32(seed: u32) -> Mulberry32 {
    Mulberry32::new(seed)
}

// =============================================================================
// TESTS
// =============================================================================
