//! Shell configuration module.
//!
//! This module provides configuration loading for the interactive B-tree
//! shell from environment variables.
//!
//! # Environment Variables
//!
//! - `BTREE_MIN_DEGREE`: Minimum degree `t` of the tree (default: `3`)
//! - `BTREE_MAX_NODES`: Upper bound on nodes the tree may allocate (default: unbounded)
//!
//! # Invariants
//!
//! - `min_degree` is a parsed unsigned integer; whether it is a usable degree
//!   (`t >= 2`) is decided by the tree when it is constructed
//! - `max_nodes`, when present, is at least 1

/// Shell configuration.
///
/// Contains the parameters used to build the tree the shell operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Minimum degree `t` of the tree.
    pub min_degree: usize,
    /// Node budget for the tree. `None` means unbounded.
    pub max_nodes: Option<usize>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            min_degree: Self::DEFAULT_MIN_DEGREE,
            max_nodes: None,
        }
    }
}

impl ShellConfig {
    /// Default minimum degree.
    pub const DEFAULT_MIN_DEGREE: usize = 3;

    const MIN_DEGREE_VAR: &'static str = "BTREE_MIN_DEGREE";
    const MAX_NODES_VAR: &'static str = "BTREE_MAX_NODES";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `BTREE_MIN_DEGREE` is set but not an unsigned integer
    /// - `BTREE_MAX_NODES` is set but not a positive integer
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value (or `None` when unset).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let min_degree = Self::load_min_degree(&lookup)?;
        let max_nodes = Self::load_max_nodes(&lookup)?;

        Ok(Self {
            min_degree,
            max_nodes,
        })
    }

    /// Load the minimum degree.
    ///
    /// Returns the default if not set.
    fn load_min_degree<F>(lookup: &F) -> Result<usize, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(Self::MIN_DEGREE_VAR) {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: Self::MIN_DEGREE_VAR.to_owned(),
                    message: format!("'{value}' is not an unsigned integer"),
                }),
            None => Ok(Self::DEFAULT_MIN_DEGREE),
        }
    }

    /// Load the node budget.
    ///
    /// Returns `None` if not set.
    fn load_max_nodes<F>(lookup: &F) -> Result<Option<usize>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(value) = lookup(Self::MAX_NODES_VAR) else {
            return Ok(None);
        };

        match value.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(ConfigError::InvalidValue {
                name: Self::MAX_NODES_VAR.to_owned(),
                message: format!("'{value}' is not a positive integer"),
            }),
            Ok(limit) => Ok(Some(limit)),
        }
    }
}
