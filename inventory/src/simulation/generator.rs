//! Product generator for demo data and deterministic simulation testing.
//!
//! Generates random but reproducible products: names drawn from a category
//! list, whole-unit prices in a configurable range, and sequential ids
//! (`P001`, `P002`, ...).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{NewProduct, Price, Product, ProductId};

/// Configuration for product generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Names to pick products from.
    pub categories: Vec<String>,
    /// Lowest generated price, in whole units.
    pub min_price: u64,
    /// Highest generated price, in whole units.
    pub max_price: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            categories: ["Phone", "Charger", "Headphones", "Laptop", "Ipad"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_price: 50,
            max_price: 2000,
        }
    }
}

/// Generator for random products.
///
/// Given the same seed and configuration, the sequence of generated products
/// is identical.
pub struct InventoryGenerator {
    rng: StdRng,
    config: GeneratorConfig,
    next_serial: u64,
}

impl InventoryGenerator {
    /// Create a generator with the default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GeneratorConfig::default())
    }

    /// Create a generator with a custom configuration.
    ///
    /// # Panics
    ///
    /// Panics if `categories` is empty or the price range is empty or
    /// starts at zero.
    #[must_use]
    pub fn with_config(seed: u64, config: GeneratorConfig) -> Self {
        assert!(!config.categories.is_empty(), "categories must not be empty");
        assert!(
            0 < config.min_price && config.min_price <= config.max_price,
            "price range must be positive and non-empty"
        );
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
            next_serial: 1,
        }
    }

    /// Access the underlying random number generator.
    #[allow(clippy::missing_const_for_fn)] // mutable references can't be const
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Generate `count` products with sequential ids.
    pub fn generate(&mut self, count: usize) -> Vec<Product> {
        (0..count).map(|_| self.next_product()).collect()
    }

    /// Generate the next product with a sequential id.
    pub fn next_product(&mut self) -> Product {
        let id = self.next_id();
        Product::from_draft(id, self.random_draft())
    }

    /// Generate the next sequential id.
    pub fn next_id(&mut self) -> ProductId {
        let serial = self.next_serial;
        self.next_serial += 1;
        ProductId::sequential('P', serial)
    }

    /// Generate a product draft without an id.
    pub fn random_draft(&mut self) -> NewProduct {
        let name = self.pick_category();
        NewProduct {
            name,
            price: self.random_price(),
        }
    }

    /// Generate a whole-unit price within the configured range.
    pub fn random_price(&mut self) -> Price {
        let units = self
            .rng
            .random_range(self.config.min_price..=self.config.max_price);
        // min_price > 0 is checked on construction.
        Price::from_cents(units.saturating_mul(100)).unwrap_or(Price::MIN)
    }

    fn pick_category(&mut self) -> String {
        let idx = self.rng.random_range(0..self.config.categories.len());
        self.config.categories[idx].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_count_and_ids() {
        let mut generator = InventoryGenerator::new(1);
        let products = generator.generate(20);

        assert_eq!(products.len(), 20);
        assert_eq!(products[0].id.as_str(), "P001");
        assert_eq!(products[19].id.as_str(), "P020");
    }

    #[test]
    fn test_generated_fields_within_config() {
        let config = GeneratorConfig::default();
        let mut generator = InventoryGenerator::with_config(2, config.clone());
        for product in generator.generate(200) {
            assert!(config.categories.contains(&product.name));
            assert!(product.price.units() >= config.min_price);
            assert!(product.price.units() <= config.max_price);
            assert_eq!(product.price.fraction(), 0);
        }
    }

    #[test]
    fn test_same_seed_same_products() {
        let a = InventoryGenerator::new(99).generate(50);
        let b = InventoryGenerator::new(99).generate(50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = InventoryGenerator::new(1).generate(50);
        let b = InventoryGenerator::new(2).generate(50);
        assert_ne!(a, b);
    }

    #[test]
    #[should_panic(expected = "categories must not be empty")]
    fn test_empty_categories_panics() {
        let config = GeneratorConfig {
            categories: Vec::new(),
            ..GeneratorConfig::default()
        };
        let _ = InventoryGenerator::with_config(0, config);
    }
}
