//! Main simulator harness for deterministic simulation testing.
//!
//! This module drives a `BTree` with generated keys and checks it against a
//! sorted `Vec` model after every insert. With a node budget configured,
//! inserts that the budget refuses must leave the tree exactly as it was.

// Simulation code legitimately needs cloning for test data
#![allow(clippy::disallowed_methods)]

use crate::btree::{BTree, BTreeError, InvariantViolation, Key, Node};

use super::key_gen::{KeyGenConfig, KeyGenerator};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Minimum degree of the tree under test.
    pub min_degree: usize,
    /// Key generation configuration.
    pub key_config: KeyGenConfig,
    /// Lookups performed after each insert.
    pub probes_per_insert: usize,
    /// Node budget for the tree under test. `None` means unbounded.
    pub max_nodes: Option<usize>,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            min_degree: 2,
            key_config: KeyGenConfig::default(),
            probes_per_insert: 2,
            max_nodes: None,
        }
    }

    /// Set the minimum degree.
    #[must_use]
    pub const fn with_min_degree(mut self, t: usize) -> Self {
        self.min_degree = t;
        self
    }

    /// Set the key configuration.
    #[must_use]
    pub const fn with_key_config(mut self, config: KeyGenConfig) -> Self {
        self.key_config = config;
        self
    }

    /// Cap the number of nodes the tree may allocate.
    #[must_use]
    pub const fn with_node_limit(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of inserts attempted.
    pub inserts: usize,
    /// Number of inserts refused by the node budget.
    pub allocation_failures: usize,
    /// Number of lookups performed.
    pub probes: usize,
    /// Number of inserts that grew the tree by a level.
    pub root_splits: usize,
    /// Tree height at the end of the run.
    pub final_height: usize,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
    /// Error that stopped the run, if any.
    pub error: Option<BTreeError>,
}

impl SimulationResult {
    /// Check if the simulation passed (no errors, no invariant violations).
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.invariant_violations.is_empty()
    }
}

/// The main simulator harness.
pub struct Simulator {
    config: SimulatorConfig,
    generator: KeyGenerator,
    /// Every inserted key, kept sorted.
    model: Vec<Key>,
    violations: Vec<InvariantViolation>,
    probes: usize,
    root_splits: usize,
    allocation_failures: usize,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let generator = KeyGenerator::with_config(config.seed, config.key_config.clone());

        Self {
            config,
            generator,
            model: Vec::new(),
            violations: Vec::new(),
            probes: 0,
            root_splits: 0,
            allocation_failures: 0,
        }
    }

    /// Run the simulation for a given number of inserts.
    ///
    /// This creates a fresh tree and checks every invariant after each insert.
    pub fn run(&mut self, insert_count: usize) -> SimulationResult {
        let built = match self.config.max_nodes {
            Some(limit) => BTree::with_node_limit(self.config.min_degree, limit),
            None => BTree::new(self.config.min_degree),
        };
        let mut tree = match built {
            Ok(tree) => tree,
            Err(e) => return self.result(0, 0, Some(e)),
        };

        for step in 0..insert_count {
            let key = self.generator.next_key();
            if let Err(e) = self.insert_and_check(&mut tree, step, key) {
                tracing::warn!(seed = self.config.seed, step, "simulation stopped: {e}");
                return self.result(step, tree.height(), Some(e));
            }
        }

        self.result(insert_count, tree.height(), None)
    }

    fn insert_and_check(
        &mut self,
        tree: &mut BTree,
        step: usize,
        key: Key,
    ) -> Result<(), BTreeError> {
        let root_was_full = tree
            .root()
            .and_then(|id| tree.node(id))
            .is_some_and(Node::is_full);
        let height_before = tree.height();
        let nodes_before = tree.node_count();

        match tree.insert(key) {
            Ok(()) => {}
            Err(BTreeError::AllocationFailure(failure)) => {
                self.allocation_failures += 1;
                tracing::debug!(step, key, ?failure, "insert refused");
                if tree.height() != height_before
                    || tree.node_count() != nodes_before
                    || tree.len() != self.model.len()
                    || tree.traverse() != self.model
                {
                    self.record(
                        "Refused insert changed the tree",
                        format!("step {step}, key {key}: {failure:?}"),
                    );
                }
                self.check_structure(tree, step, key);
                return Ok(());
            }
            Err(e) => return Err(e),
        }
        let position = self.model.partition_point(|k| *k <= key);
        self.model.insert(position, key);

        let grew = tree.height() == height_before + 1;
        if grew && height_before > 0 {
            self.root_splits += 1;
        }
        if grew != (root_was_full || height_before == 0) {
            self.record(
                "Height changed without a root split (or vice versa)",
                format!(
                    "step {step}, key {key}: height {height_before} -> {}, root full: {root_was_full}",
                    tree.height()
                ),
            );
        }

        if !tree.contains(key) {
            self.record("Inserted key not found", format!("step {step}, key {key}"));
        }

        for _ in 0..self.config.probes_per_insert {
            let probe = self.generator.probe_key();
            let expected = self.model.binary_search(&probe).is_ok();
            if tree.contains(probe) != expected {
                self.record(
                    "Lookup disagrees with model",
                    format!("step {step}, probe {probe}, expected present: {expected}"),
                );
            }
            self.probes += 1;
        }

        if tree.traverse() != self.model {
            self.record(
                "Traversal differs from model",
                format!("step {step}, key {key}, {} keys expected", self.model.len()),
            );
        }

        self.check_structure(tree, step, key);
        Ok(())
    }

    fn check_structure(&mut self, tree: &BTree, step: usize, key: Key) {
        if tree
            .node_limit()
            .is_some_and(|limit| tree.node_count() > limit)
        {
            self.record(
                "Tree allocated past its node budget",
                format!("step {step}, key {key}: {} nodes", tree.node_count()),
            );
        }

        for mut violation in tree.check_invariants() {
            violation.context = format!("step {step}, key {key}: {}", violation.context);
            self.violations.push(violation);
        }
    }

    fn record(&mut self, description: &str, context: String) {
        self.violations.push(InvariantViolation {
            description: description.to_owned(),
            node: None,
            context,
        });
    }

    fn result(
        &mut self,
        inserts: usize,
        final_height: usize,
        error: Option<BTreeError>,
    ) -> SimulationResult {
        SimulationResult {
            seed: self.config.seed,
            inserts,
            probes: self.probes,
            root_splits: self.root_splits,
            allocation_failures: self.allocation_failures,
            final_height,
            invariant_violations: std::mem::take(&mut self.violations),
            error,
        }
    }
}
