//! Seeded generator behind `RoutingPolicy::Random`.
//!
//! SplitMix64: one word of state, so two engines built from the same seed
//! make identical routing choices.

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        mix(self.state)
    }

    /// Uniform index into a slice of length `len` (multiply-shift on the
    /// high 32 bits).
    ///
    /// # Panics
    ///
    /// Panics if `len` is zero: there is nothing to route to.
    pub fn index(&mut self, len: usize) -> usize {
        assert!(len > 0, "cannot pick from an empty set of outputs");
        let high = self.next_u64() >> 32;
        ((high * len as u64) >> 32) as usize
    }
}
