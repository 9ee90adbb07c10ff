//! Dice and deterministic randomness.
//!
//! Three sources of randomness live here and must not be confused:
//! - [`roll_dice`] draws authoritative face values from any [`RngCore`]
//!   (the OS generator in a live session). The result travels inside the
//!   `ROLL_DICE` action; peers never re-derive it.
//! - [`AnimationRng`] replays a cosmetic physics stream from the seed carried
//!   next to the roll. It has no bearing on game state.
//! - [`DeterministicRng`] drives reducer-internal shuffles (turn order
//!   fallback, deck refills) from seeds derived from replicated state, so
//!   every peer computes the same permutation.

// RNG arithmetic narrows on purpose.
#![allow(clippy::cast_possible_truncation)]

use rand_core::{RngCore, impls};
use serde::{Deserialize, Serialize};

/// Face values of two dice. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiceRoll(pub u8, pub u8);

impl DiceRoll {
    /// Sum of both dice.
    #[must_use]
    pub const fn total(self) -> u8 {
        self.0 + self.1
    }

    /// Whether both dice show the same face.
    #[must_use]
    pub const fn is_doubles(self) -> bool {
        self.0 == self.1
    }

    /// Whether both faces are in 1..=6.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 1 && self.0 <= 6 && self.1 >= 1 && self.1 <= 6
    }
}

/// Roll two fair dice.
pub fn roll_dice<R: RngCore + ?Sized>(rng: &mut R) -> DiceRoll {
    DiceRoll(roll_die(rng), roll_die(rng))
}

fn roll_die<R: RngCore + ?Sized>(rng: &mut R) -> u8 {
    // Rejection sampling keeps the distribution uniform.
    const LIMIT: u32 = u32::MAX - (u32::MAX % 6);
    loop {
        let v = rng.next_u32();
        if v < LIMIT {
            return (v % 6) as u8 + 1;
        }
    }
}

/// Seeded stream for replaying a roll's animation identically on every peer.
///
/// A mulberry32-style integer hash; the same seed always yields the same
/// sequence of values in `[0, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct AnimationRng {
    state: u32,
}

impl AnimationRng {
    /// Create a stream from the seed carried in a `ROLL_DICE` action.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let t = self.state;
        let t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^ (t >> 7)
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Deterministic PRNG using xorshift64.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        // Ensure non-zero state
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }

    /// Generate a random value in `[0, max)`.
    pub fn below(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        self.next_u64() % max
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u64 + 1) as usize;
            items.swap(i, j);
        }
    }
}

impl RngCore for DeterministicRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Derive a 64-bit seed from a list of byte strings (FNV-1a).
///
/// Used to seed reducer-internal shuffles from replicated state only.
#[must_use]
pub fn derive_seed(parts: &[&[u8]]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = OFFSET;
    for part in parts {
        for &byte in *part {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
        // Separator so ["ab","c"] and ["a","bc"] differ.
        hash ^= 0xff;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
