#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use inventory::config::InventoryConfig;
use inventory::simulation::InventoryGenerator;
use inventory::{Inventory, PrefixSearchError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match InventoryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let seed = config.seed.unwrap_or_else(rand::random);
    tracing::info!(
        "Loaded configuration: initial_slots={}, max_load_factor={}, seed_products={}, seed={seed}",
        config.initial_slots,
        config.max_load_factor,
        config.seed_products
    );

    let mut inventory = match Inventory::from_config(&config) {
        Ok(inventory) => inventory,
        Err(e) => {
            tracing::error!("Failed to create inventory: {e}");
            std::process::exit(1);
        }
    };

    let products = InventoryGenerator::new(seed).generate(config.seed_products);
    if let Err(e) = inventory.load(products) {
        tracing::error!("Failed to load demo inventory: {e}");
        std::process::exit(1);
    }

    match (inventory.cheapest(), inventory.most_expensive()) {
        (Some(cheapest), Some(dearest)) => {
            tracing::info!("cheapest: {cheapest}");
            tracing::info!("most expensive: {dearest}");
        }
        _ => tracing::info!("inventory is empty"),
    }
    tracing::info!("total products: {}", inventory.len());

    // The generator numbers ids P001, P002, ...
    for prefix in ["p001", "P0"] {
        match inventory.find_by_partial_id(prefix) {
            Ok(product) => tracing::info!("prefix {prefix}: {product}"),
            Err(PrefixSearchError::Ambiguous(candidates)) => {
                tracing::info!("prefix {prefix}: {} candidates", candidates.len());
            }
            Err(e) => tracing::info!("prefix {prefix}: {e}"),
        }
    }
}
