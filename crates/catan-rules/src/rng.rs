//! Seeded pseudo-random source.
//!
//! Every random choice the engine makes (tile shuffle, number tokens, deck order,
//! which card a robber steals) is drawn from a [`Mulberry32`] stream. Given the same
//! seed the stream is identical on every platform, which is what makes replays and
//! saved games reproduce live play exactly.

use rand::{Error, RngCore, SeedableRng};

/// Mulberry32: a 32-bit generator with a single `u32` of state.
///
/// Implements [`RngCore`] so the `rand` helpers (`shuffle`, `gen_range`, `choose`)
/// can drive it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Weyl increment added to the state on every step
    const INCREMENT: u32 = 0x6D2B_79F5;

    /// Create a generator from a seed
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generator for a one-off draw keyed by a game seed and a salt (e.g. log length)
    pub fn keyed(seed: u32, salt: usize) -> Self {
        Self::new(seed.wrapping_add(salt as u32))
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(Self::INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.next_u32());
        let high = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}
