// Product inventory indexes.
//
// Life of a mutation:
// 1. Raw fields come in (name, price text or amount, optional id)
// 2. Validate into a `NewProduct`
// 3. Identifier index accepts or rejects it, generating an id if needed
// 4. Inventory mirrors the accepted product into the price index
//
// System components:
//  - AVL tree keyed by price (ordered queries)
//  - Chained hash table keyed by id (exact and prefix lookups)
//  - Simulation harness (seeded generator, model-based invariant checks)

pub mod config;
pub mod simulation;
pub mod storage;
pub mod types;

pub use storage::{Inventory, InventoryError, PrefixSearchError};
pub use types::{NewProduct, Price, Product, ProductId};
