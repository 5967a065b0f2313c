//! Key generator for deterministic simulation testing.
//!
//! This module generates random but reproducible key sequences, including
//! sorted runs and repeated keys, to drive the tree through every split path.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::btree::Key;

/// Order in which fresh keys are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Strictly increasing from `min_key`. Always splits the rightmost path.
    Ascending,
    /// Strictly decreasing from `max_key`. Always splits the leftmost path.
    Descending,
    /// Uniform over `min_key..=max_key`.
    Random,
}

impl Pattern {
    /// All patterns.
    pub const ALL: [Self; 3] = [Self::Ascending, Self::Descending, Self::Random];
}

/// Configuration for key generation.
#[derive(Debug, Clone)]
pub struct KeyGenConfig {
    /// Smallest key for `Random`, starting key for `Ascending`.
    pub min_key: Key,
    /// Largest key for `Random`, starting key for `Descending`.
    pub max_key: Key,
    /// Probability of re-issuing a key that was already generated (0.0 - 1.0).
    pub duplicate_rate: f64,
    /// How fresh keys are ordered.
    pub pattern: Pattern,
}

impl Default for KeyGenConfig {
    fn default() -> Self {
        Self {
            min_key: -10_000,
            max_key: 10_000,
            duplicate_rate: 0.1,
            pattern: Pattern::Random,
        }
    }
}

/// Generator for insert keys and lookup probes.
///
/// Produces the same sequence for the same seed and configuration.
pub struct KeyGenerator {
    rng: StdRng,
    config: KeyGenConfig,
    /// Next key for the sorted patterns.
    cursor: Key,
    /// Every key issued so far, for duplicates.
    issued: Vec<Key>,
}

impl KeyGenerator {
    /// Create a new key generator with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, KeyGenConfig::default())
    }

    /// Create a new key generator with custom configuration.
    ///
    /// Bounds given in the wrong order are swapped, so the key range is
    /// never empty.
    #[must_use]
    pub fn with_config(seed: u64, mut config: KeyGenConfig) -> Self {
        if config.min_key > config.max_key {
            std::mem::swap(&mut config.min_key, &mut config.max_key);
        }

        let cursor = match config.pattern {
            Pattern::Descending => config.max_key,
            Pattern::Ascending | Pattern::Random => config.min_key,
        };

        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            cursor,
            issued: Vec::new(),
        }
    }

    /// Generate the next key to insert.
    pub fn next_key(&mut self) -> Key {
        let repeat = !self.issued.is_empty()
            && self.rng.random::<f64>() < self.config.duplicate_rate;

        let key = if repeat {
            self.issued[self.rng.random_range(0..self.issued.len())]
        } else {
            self.fresh_key()
        };

        self.issued.push(key);
        key
    }

    fn fresh_key(&mut self) -> Key {
        match self.config.pattern {
            Pattern::Ascending => {
                let key = self.cursor;
                self.cursor = self.cursor.saturating_add(1);
                key
            }
            Pattern::Descending => {
                let key = self.cursor;
                self.cursor = self.cursor.saturating_sub(1);
                key
            }
            Pattern::Random => self
                .rng
                .random_range(self.config.min_key..=self.config.max_key),
        }
    }

    /// Generate a key to look up. It may or may not have been inserted; the
    /// range is a little wider than the insert range so misses are common.
    pub fn probe_key(&mut self) -> Key {
        let low = self.config.min_key.saturating_sub(16);
        let high = self.config.max_key.saturating_add(16);
        self.rng.random_range(low..=high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_keys() {
        let mut a = KeyGenerator::new(42);
        let mut b = KeyGenerator::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_key(), b.next_key());
            assert_eq!(a.probe_key(), b.probe_key());
        }
    }

    #[test]
    fn test_ascending_without_duplicates() {
        let config = KeyGenConfig {
            min_key: 5,
            max_key: 100,
            duplicate_rate: 0.0,
            pattern: Pattern::Ascending,
        };
        let mut generator = KeyGenerator::with_config(1, config);
        let keys: Vec<Key> = (0..5).map(|_| generator.next_key()).collect();
        assert_eq!(keys, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_descending_without_duplicates() {
        let config = KeyGenConfig {
            min_key: 0,
            max_key: 10,
            duplicate_rate: 0.0,
            pattern: Pattern::Descending,
        };
        let mut generator = KeyGenerator::with_config(1, config);
        let keys: Vec<Key> = (0..3).map(|_| generator.next_key()).collect();
        assert_eq!(keys, vec![10, 9, 8]);
    }

    #[test]
    fn test_random_keys_stay_in_range() {
        let config = KeyGenConfig {
            min_key: -3,
            max_key: 3,
            duplicate_rate: 0.5,
            pattern: Pattern::Random,
        };
        let mut generator = KeyGenerator::with_config(7, config);
        for _ in 0..200 {
            let key = generator.next_key();
            assert!((-3..=3).contains(&key));
        }
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        let config = KeyGenConfig {
            min_key: 4,
            max_key: -4,
            duplicate_rate: 0.0,
            pattern: Pattern::Random,
        };
        let mut generator = KeyGenerator::with_config(9, config);
        for _ in 0..100 {
            assert!((-4..=4).contains(&generator.next_key()));
            assert!((-20..=20).contains(&generator.probe_key()));
        }
    }

    #[test]
    fn test_full_duplicate_rate_repeats_first_key() {
        let config = KeyGenConfig {
            duplicate_rate: 1.0,
            ..KeyGenConfig::default()
        };
        let mut generator = KeyGenerator::with_config(3, config);
        let first = generator.next_key();
        for _ in 0..20 {
            assert_eq!(generator.next_key(), first);
        }
    }
}
