//! Deterministic Simulation Testing (DST) infrastructure.
//!
//! This module provides tools for testing the tree with:
//! - Reproducible key sequences (sorted runs, random keys, duplicates)
//! - A reference model (sorted `Vec`) compared after every insert
//! - Invariant checking after each operation
//!
//! Given the same seed, execution is identical.
//!
//! # Usage
//!
//! ```
//! use btree::simulation::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345).with_min_degree(3);
//! let mut sim = Simulator::new(config);
//! let result = sim.run(200);
//!
//! assert!(result.passed());
//! ```

mod key_gen;
mod simulator;

pub use key_gen::{KeyGenConfig, KeyGenerator, Pattern};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig};
