//! Main simulator harness for deterministic simulation testing.
//!
//! Drives an [`Inventory`] with a seeded stream of random operations, mirrors
//! every mutation into a plain `HashMap` model, and checks both indexes
//! against the model after each step.

use std::collections::HashMap;

use rand::Rng;

use crate::storage::{DEFAULT_MAX_LOAD_FACTOR, IdIndex, Inventory, PrefixSearchError};
use crate::types::{NewProduct, Price, Product};

use super::generator::{GeneratorConfig, InventoryGenerator};
use super::invariants::{InvariantChecker, InvariantViolation};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility.
    pub seed: u64,
    /// Products loaded before the first operation.
    pub initial_products: usize,
    /// Product generation configuration.
    pub generator_config: GeneratorConfig,
    /// Initial slot count of the identifier index.
    pub initial_slots: usize,
    /// Fraction of add operations that submit an invalid product.
    pub invalid_rate: f64,
}

impl SimulatorConfig {
    /// Create a new simulator config with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            initial_products: 10,
            generator_config: GeneratorConfig::default(),
            initial_slots: 4,
            invalid_rate: 0.05,
        }
    }

    /// Set the number of products loaded up front.
    #[must_use]
    pub const fn with_initial_products(mut self, count: usize) -> Self {
        self.initial_products = count;
        self
    }

    /// Set the product generation configuration.
    #[must_use]
    pub fn with_generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator_config = config;
        self
    }

    /// Set the initial slot count of the identifier index.
    #[must_use]
    pub const fn with_initial_slots(mut self, slots: usize) -> Self {
        self.initial_slots = slots;
        self
    }

    /// Set the invalid product rate.
    #[must_use]
    pub const fn with_invalid_rate(mut self, rate: f64) -> Self {
        self.invalid_rate = rate;
        self
    }
}

/// Results from a simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The seed used for this simulation.
    pub seed: u64,
    /// Number of operations run.
    pub operations_run: u64,
    /// Number of successful operations.
    pub successful_operations: u64,
    /// Number of operations the inventory rejected, as expected.
    pub failed_operations: u64,
    /// Products held at the end of the run.
    pub final_len: usize,
    /// Invariant violations detected.
    pub invariant_violations: Vec<InvariantViolation>,
}

impl SimulationResult {
    /// Check if the simulation passed (no invariant violations).
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.invariant_violations.is_empty()
    }
}

/// A single simulated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    AddSequential,
    AddGenerated,
    AddInvalid,
    Update,
    Remove,
    RemoveMissing,
    PrefixSearch,
    RangeQuery,
    Extremes,
}

impl Operation {
    /// Pick an operation, weighted towards mutations.
    fn pick<R: Rng>(rng: &mut R, invalid_rate: f64) -> Self {
        if rng.random_bool(invalid_rate.clamp(0.0, 1.0)) {
            return Self::AddInvalid;
        }
        match rng.random_range(0..100u32) {
            0..25 => Self::AddSequential,
            25..35 => Self::AddGenerated,
            35..50 => Self::Update,
            50..65 => Self::Remove,
            65..70 => Self::RemoveMissing,
            70..82 => Self::PrefixSearch,
            82..94 => Self::RangeQuery,
            _ => Self::Extremes,
        }
    }
}

/// The main simulator harness.
pub struct Simulator {
    config: SimulatorConfig,
    generator: InventoryGenerator,
    inventory: Inventory,
    model: HashMap<String, Product>,
    checker: InvariantChecker,
    operations_run: u64,
    successful_operations: u64,
    failed_operations: u64,
}

impl Simulator {
    /// Create a new simulator with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if `initial_slots` is zero.
    #[must_use]
    pub fn new(config: SimulatorConfig) -> Self {
        let generator = InventoryGenerator::with_config(config.seed, config.generator_config.clone());
        #[allow(clippy::expect_used)] // Invalid simulator configuration is fatal
        let by_id = IdIndex::with_capacity(config.initial_slots, DEFAULT_MAX_LOAD_FACTOR)
            .expect("initial_slots must be greater than zero")
            .with_seed(config.seed);

        Self {
            config,
            generator,
            inventory: Inventory::with_id_index(by_id),
            model: HashMap::new(),
            checker: InvariantChecker::new(),
            operations_run: 0,
            successful_operations: 0,
            failed_operations: 0,
        }
    }

    /// Run the simulation for a given number of operations.
    pub fn run(&mut self, operation_count: usize) -> SimulationResult {
        let initial = self.generator.generate(self.config.initial_products);
        for product in &initial {
            self.model.insert(product.id.to_string(), product.clone());
        }
        if let Err(e) = self.inventory.load(initial) {
            self.violation(format!("Loading initial products failed: {e}"), String::new());
        }
        self.check_all();

        for _ in 0..operation_count {
            let operation = Operation::pick(self.generator.rng(), self.config.invalid_rate);
            self.apply(operation);
            self.operations_run += 1;
            self.check_all();
        }

        SimulationResult {
            seed: self.config.seed,
            operations_run: self.operations_run,
            successful_operations: self.successful_operations,
            failed_operations: self.failed_operations,
            final_len: self.inventory.len(),
            invariant_violations: self.checker.violations().to_vec(),
        }
    }

    /// The inventory under test.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Get the invariant checker.
    #[must_use]
    pub const fn checker(&self) -> &InvariantChecker {
        &self.checker
    }

    fn apply(&mut self, operation: Operation) {
        match operation {
            Operation::AddSequential => {
                let id = self.generator.next_id();
                let draft = self.generator.random_draft();
                self.add(Some(id.as_str()), draft);
            }
            Operation::AddGenerated => {
                let draft = self.generator.random_draft();
                self.add(None, draft);
            }
            Operation::AddInvalid => self.add_invalid(),
            Operation::Update => match self.pick_existing() {
                Some(id) => {
                    let draft = self.generator.random_draft();
                    self.add(Some(id.as_str()), draft);
                }
                None => self.skip(),
            },
            Operation::Remove => match self.pick_existing() {
                Some(id) => self.remove(&id),
                None => self.skip(),
            },
            Operation::RemoveMissing => self.remove_missing(),
            Operation::PrefixSearch => match self.pick_existing() {
                Some(id) => self.prefix_search(&id),
                None => self.skip(),
            },
            Operation::RangeQuery => self.range_query(),
            Operation::Extremes => self.extremes(),
        }
    }

    fn add(&mut self, id: Option<&str>, draft: NewProduct) {
        match self.inventory.add(id, draft.clone()) {
            Ok(stored) => {
                if stored.name != draft.name || stored.price != draft.price {
                    self.violation("Stored product differs from draft".to_string(), stored.to_string());
                }
                if id.is_some_and(|requested| stored.id.as_str() != requested) {
                    self.violation("Stored product has wrong id".to_string(), stored.to_string());
                }
                self.model.insert(stored.id.to_string(), stored);
                self.successful_operations += 1;
            }
            Err(e) => self.violation(format!("Valid add rejected: {e}"), format!("{id:?}")),
        }
    }

    fn add_invalid(&mut self) {
        let id = self.pick_existing();
        let draft = NewProduct {
            name: String::new(),
            price: self.generator.random_price(),
        };
        match self.inventory.add(id.as_deref(), draft) {
            Ok(stored) => self.violation("Invalid add accepted".to_string(), stored.to_string()),
            Err(_) => self.failed_operations += 1,
        }
    }

    fn remove(&mut self, id: &str) {
        let expected = self.model.remove(id);
        match self.inventory.remove(id) {
            Ok(removed) if removed == expected => self.successful_operations += 1,
            other => self.violation(
                "Remove returned unexpected result".to_string(),
                format!("id {id}: expected {expected:?}, got {other:?}"),
            ),
        }
    }

    fn remove_missing(&mut self) {
        let id = format!("missing-{}", self.operations_run);
        match self.inventory.remove(&id) {
            Ok(None) => self.failed_operations += 1,
            other => self.violation(
                "Remove of unknown id did not report absence".to_string(),
                format!("{other:?}"),
            ),
        }
    }

    fn prefix_search(&mut self, id: &str) {
        let len = self.generator.rng().random_range(2..=id.len().max(2));
        let prefix = id.get(..len).unwrap_or(id).to_ascii_lowercase();

        let mut expected: Vec<&Product> = self
            .model
            .values()
            .filter(|p| {
                p.id.as_str()
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(&prefix))
            })
            .collect();
        expected.sort_by(|a, b| a.id.cmp(&b.id));

        let context = format!("prefix {prefix}, {} model matches", expected.len());
        let matches = match (self.inventory.find_by_partial_id(&prefix), expected.as_slice()) {
            (Ok(found), [only]) => found == *only,
            (Err(PrefixSearchError::Ambiguous(found)), many) if many.len() > 1 => {
                found.iter().eq(many.iter().copied())
            }
            (Err(PrefixSearchError::NotFound(_)), []) => true,
            _ => false,
        };
        if matches {
            self.successful_operations += 1;
        } else {
            self.violation("Prefix search disagrees with model".to_string(), context);
        }
    }

    fn range_query(&mut self) {
        let a = self.generator.random_price();
        let b = self.generator.random_price();
        let (min, max) = if a <= b { (a, b) } else { (b, a) };

        let found = self.inventory.in_range(min, max);
        if range_matches_model(&found, &self.model, min, max) {
            self.successful_operations += 1;
        } else {
            let found = found.len();
            self.violation(
                "Range query disagrees with model".to_string(),
                format!("{min}..={max}: got {found} products"),
            );
        }
    }

    fn extremes(&mut self) {
        let min = self.model.values().map(|p| p.price).min();
        let max = self.model.values().map(|p| p.price).max();
        let cheapest = self.inventory.cheapest().map(|p| p.price);
        let dearest = self.inventory.most_expensive().map(|p| p.price);

        if cheapest == min && dearest == max {
            self.successful_operations += 1;
        } else {
            self.violation(
                "Extreme prices disagree with model".to_string(),
                format!("expected {min:?}/{max:?}, got {cheapest:?}/{dearest:?}"),
            );
        }
    }

    /// Pick an existing id, independent of `HashMap` iteration order.
    fn pick_existing(&mut self) -> Option<String> {
        if self.model.is_empty() {
            return None;
        }
        let mut ids: Vec<&String> = self.model.keys().collect();
        ids.sort();
        let idx = self.generator.rng().random_range(0..ids.len());
        Some(ids[idx].clone())
    }

    fn skip(&mut self) {
        self.failed_operations += 1;
    }

    fn check_all(&mut self) {
        let index = usize::try_from(self.operations_run).unwrap_or(usize::MAX);
        self.checker.check_all(&self.inventory, &self.model, index);
    }

    fn violation(&mut self, description: String, context: String) {
        tracing::warn!("seed {}: {description} ({context})", self.config.seed);
        self.checker.add_violation(InvariantViolation {
            description,
            operation_index: usize::try_from(self.operations_run).unwrap_or(usize::MAX),
            context,
        });
    }
}

/// Returns `true` if `found` is ascending by price and holds exactly the
/// model's products priced within `min..=max`.
fn range_matches_model(
    found: &[&Product],
    model: &HashMap<String, Product>,
    min: Price,
    max: Price,
) -> bool {
    if !found.windows(2).all(|w| w[0].price <= w[1].price) {
        return false;
    }
    let mut found_ids: Vec<&str> = found.iter().map(|p| p.id.as_str()).collect();
    let mut expected_ids: Vec<&str> = model
        .values()
        .filter(|p| min <= p.price && p.price <= max)
        .map(|p| p.id.as_str())
        .collect();
    found_ids.sort_unstable();
    expected_ids.sort_unstable();
    found_ids == expected_ids
}

/// Run a simulation for each seed, returning the results that failed.
#[must_use]
pub fn run_seeds(seeds: impl IntoIterator<Item = u64>, operation_count: usize) -> Vec<SimulationResult> {
    seeds
        .into_iter()
        .map(|seed| Simulator::new(SimulatorConfig::new(seed)).run(operation_count))
        .filter(|result| !result.passed())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_basic() {
        let mut simulator = Simulator::new(SimulatorConfig::new(12345));
        let result = simulator.run(100);

        assert_eq!(result.operations_run, 100);
        assert_eq!(result.successful_operations + result.failed_operations, 100);
        assert_eq!(result.final_len, simulator.inventory().len());
    }

    #[test]
    fn test_simulator_no_invariant_violations() {
        let mut simulator = Simulator::new(SimulatorConfig::new(54321));
        let result = simulator.run(500);

        assert!(
            result.passed(),
            "Simulation should pass: {:?}",
            result.invariant_violations
        );
        assert!(!simulator.checker().has_violations());
    }

    fn product(id: &str, cents: u64) -> Product {
        Product {
            id: crate::types::ProductId::new(id).expect("non-empty"),
            name: "Item".to_string(),
            price: Price::from_cents(cents).expect("valid price"),
        }
    }

    #[test]
    fn test_range_check_compares_ids_not_counts() {
        let a = product("A", 1000);
        let b = product("B", 2000);
        let c = product("C", 3000);
        let model: HashMap<String, Product> = [&a, &b, &c]
            .into_iter()
            .map(|p| (p.id.to_string(), p.clone()))
            .collect();
        let min = Price::from_cents(1000).expect("valid price");
        let max = Price::from_cents(2000).expect("valid price");

        assert!(range_matches_model(&[&a, &b], &model, min, max));
        // Right size, wrong members.
        assert!(!range_matches_model(&[&a, &c], &model, min, max));
        // Right members, wrong order.
        assert!(!range_matches_model(&[&b, &a], &model, min, max));
        assert!(!range_matches_model(&[&a], &model, min, max));
    }

    #[test]
    fn test_simulator_deterministic() {
        let result1 = Simulator::new(SimulatorConfig::new(777)).run(200);
        let result2 = Simulator::new(SimulatorConfig::new(777)).run(200);

        assert_eq!(result1.successful_operations, result2.successful_operations);
        assert_eq!(result1.failed_operations, result2.failed_operations);
        assert_eq!(result1.final_len, result2.final_len);
    }

    #[test]
    fn test_simulator_invalid_products_are_rejected() {
        let config = SimulatorConfig::new(8).with_invalid_rate(0.5);
        let result = Simulator::new(config).run(200);

        assert!(result.failed_operations > 0);
        assert!(result.passed(), "{:?}", result.invariant_violations);
    }

    #[test]
    fn test_simulator_narrow_prices_force_duplicates() {
        let generator_config = GeneratorConfig {
            min_price: 10,
            max_price: 12,
            ..GeneratorConfig::default()
        };
        let config = SimulatorConfig::new(31)
            .with_generator_config(generator_config)
            .with_initial_products(50)
            .with_initial_slots(1);
        let mut simulator = Simulator::new(config);
        let result = simulator.run(300);

        assert!(result.passed(), "{:?}", result.invariant_violations);
        assert!(simulator.inventory().id_index().slot_count() > 1);
    }

    #[test]
    fn test_many_seeds() {
        let failures = run_seeds(0..20, 200);
        assert!(
            failures.is_empty(),
            "failing seeds: {:?}",
            failures.iter().map(|r| r.seed).collect::<Vec<_>>()
        );
    }

    #[test]
    #[ignore] // Long running test
    fn test_simulator_stress() {
        let config = SimulatorConfig::new(99999).with_initial_products(1000);
        let result = Simulator::new(config).run(10_000);

        assert!(result.passed());
    }
}
