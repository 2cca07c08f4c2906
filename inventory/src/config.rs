//! Inventory configuration module.
//!
//! This module provides configuration loading for the inventory indexes from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `INVENTORY_INITIAL_SLOTS`: Initial slot count of the identifier index (default: `100`)
//! - `INVENTORY_MAX_LOAD_FACTOR`: Load factor above which the identifier index grows (default: `0.75`)
//! - `INVENTORY_SEED_PRODUCTS`: Number of products in the generated demo inventory (default: `20`)
//! - `INVENTORY_SEED`: Seed for generated ids and demo data (default: random)
//!
//! # Invariants
//!
//! - `initial_slots` is always greater than zero
//! - `max_load_factor` is always in `(0, 1]`

use crate::storage::{DEFAULT_MAX_LOAD_FACTOR, DEFAULT_SLOTS};

const INITIAL_SLOTS_VAR: &str = "INVENTORY_INITIAL_SLOTS";
const MAX_LOAD_FACTOR_VAR: &str = "INVENTORY_MAX_LOAD_FACTOR";
const SEED_PRODUCTS_VAR: &str = "INVENTORY_SEED_PRODUCTS";
const SEED_VAR: &str = "INVENTORY_SEED";

/// Inventory configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()` or `from_lookup()`:
/// - `initial_slots` is greater than zero
/// - `max_load_factor` is in `(0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryConfig {
    /// Initial number of slots in the identifier index.
    pub initial_slots: usize,
    /// Load factor above which the identifier index doubles its slot count.
    pub max_load_factor: f64,
    /// Number of products the demo binary generates at startup.
    pub seed_products: usize,
    /// Seed for id generation and demo data. `None` means seed from the OS.
    pub seed: Option<u64>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            initial_slots: DEFAULT_SLOTS,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            seed_products: Self::DEFAULT_SEED_PRODUCTS,
            seed: None,
        }
    }
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

impl InventoryConfig {
    /// Default size of the generated demo inventory.
    pub const DEFAULT_SEED_PRODUCTS: usize = 20;

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed, or is out
    /// of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value if set.
    ///
    /// # Errors
    ///
    /// Same as [`InventoryConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let initial_slots = Self::load_initial_slots(&lookup)?;
        let max_load_factor = Self::load_max_load_factor(&lookup)?;
        let seed_products =
            parse_var(&lookup, SEED_PRODUCTS_VAR)?.unwrap_or(Self::DEFAULT_SEED_PRODUCTS);
        let seed = parse_var(&lookup, SEED_VAR)?;

        Ok(Self {
            initial_slots,
            max_load_factor,
            seed_products,
            seed,
        })
    }

    /// Load the initial slot count.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a positive integer.
    fn load_initial_slots<F>(lookup: &F) -> Result<usize, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = parse_var(lookup, INITIAL_SLOTS_VAR)?.unwrap_or(DEFAULT_SLOTS);
        if slots == 0 {
            return Err(ConfigError::InvalidValue {
                name: INITIAL_SLOTS_VAR.to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(slots)
    }

    /// Load the maximum load factor.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a number in `(0, 1]`.
    fn load_max_load_factor<F>(lookup: &F) -> Result<f64, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let factor: f64 = parse_var(lookup, MAX_LOAD_FACTOR_VAR)?.unwrap_or(DEFAULT_MAX_LOAD_FACTOR);
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ConfigError::InvalidValue {
                name: MAX_LOAD_FACTOR_VAR.to_string(),
                message: format!("'{factor}' must be in (0, 1]"),
            });
        }
        Ok(factor)
    }
}

/// Parse an optional variable, reporting unparseable values.
fn parse_var<T, F>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                message: format!("'{value}' could not be parsed"),
            }),
        None => Ok(None),
    }
}
