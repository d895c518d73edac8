//! Deterministic RNG for opportunity selection.
//!
//! Uses xorshift64* for speed and stable output across platforms: the same
//! seed replays the same sequence of selections, which is what makes a
//! reduction run reproducible. Not cryptographically secure.

/// Deterministic RNG with a single 64-bit state.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ReductionRng {
    state: u64,
}

impl ReductionRng {
    /// Create a new RNG. A zero seed is remapped to a non-zero constant to
    /// avoid the xorshift lockup state.
    pub fn new(seed: u64) -> Self {
        let s = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: s }
    }

    /// Next 64-bit value from xorshift64*.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate a value in `[0, n)`. `n` must be non-zero.
    #[inline]
    pub fn pick_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        (self.next_u64() % (n as u64)) as usize
    }
}
