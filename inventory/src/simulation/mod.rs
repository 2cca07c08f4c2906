//! Deterministic Simulation Testing (DST) infrastructure.
//!
//! This module provides tools for testing the inventory indexes with:
//! - Reproducible random product generation
//! - A seeded stream of mixed add / update / remove / query operations
//! - Invariant checking after each operation, against a `HashMap` model
//!
//! Given the same seed, execution is identical, including the ids the
//! identifier index generates.
//!
//! # Usage
//!
//! ```
//! use inventory::simulation::{Simulator, SimulatorConfig};
//!
//! let config = SimulatorConfig::new(12345) // seed
//!     .with_initial_products(25)
//!     .with_invalid_rate(0.1);
//!
//! let mut sim = Simulator::new(config);
//! let result = sim.run(200); // Run 200 operations
//!
//! assert!(result.invariant_violations.is_empty());
//! ```

mod generator;
mod invariants;
mod simulator;

pub use generator::{GeneratorConfig, InventoryGenerator};
pub use invariants::{InvariantChecker, InvariantViolation};
pub use simulator::{SimulationResult, Simulator, SimulatorConfig, run_seeds};
