use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Hands out one deterministic random stream per system name.
///
/// Streams are derived from the master seed in the order names are first
/// requested, so a scenario registering its systems in a fixed order replays
/// identically for the same seed.
pub struct RngManager {
    master: ChaCha8Rng,
    seeds: HashMap<String, u64>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            seeds: HashMap::new(),
        }
    }

    /// A fresh generator for `name`. Asking for the same name twice yields
    /// generators that replay the same sequence.
    pub fn stream(&mut self, name: &str) -> ChaCha8Rng {
        let master = &mut self.master;
        let seed = *self
            .seeds
            .entry(name.to_string())
            .or_insert_with(|| master.next_u64());
        ChaCha8Rng::seed_from_u64(seed)
    }
}
