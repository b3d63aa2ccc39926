//! Per-run seeded random generator.
//!
//! One [`SelectionRng`] is built from the test id at the start of a run and
//! passed by `&mut` into every draw. There is no global random state.

use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

pub struct SelectionRng {
    seed: [u8; 32],
    inner: ChaCha8Rng,
}

impl SelectionRng {
    /// Seed from the SHA-256 digest of `test_id`.
    pub fn from_test_id(test_id: &str) -> Self {
        let seed: [u8; 32] = Sha256::digest(test_id.as_bytes()).into();
        Self {
            seed,
            inner: ChaCha8Rng::from_seed(seed),
        }
    }

    /// Hex form of the seed, recorded in test metadata.
    pub fn seed_hex(&self) -> String {
        self.seed.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Choose `amount` distinct indices from `0..len`, returned ascending.
    ///
    /// Callers check `amount <= len` first.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let mut picked = index::sample(&mut self.inner, len, amount).into_vec();
        picked.sort_unstable();
        picked
    }

    /// Uniform pick from `0..len`. `len` must be non-zero.
    pub fn pick(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// Shuffle `items` in place with this generator.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}
