//! In-memory product indexes.
//!
//! Two independent indexes share the [`Product`](crate::types::Product)
//! record type:
//!
//! - [`PriceIndex`]: an AVL tree keyed by price, for cheapest / most
//!   expensive / range / sorted queries.
//! - [`IdIndex`]: a separately chained hash table keyed by product id, for
//!   exact lookups and prefix search.
//!
//! The indexes do not update each other. [`Inventory`] owns one of each and
//! applies every mutation to both.
//!
//! # Usage
//!
//! ```
//! use inventory::storage::Inventory;
//!
//! let mut inventory = Inventory::new();
//! inventory.add_parsed(Some("LAP001"), "Laptop", "999.00").expect("valid product");
//! inventory.add_parsed(Some("PHN001"), "Phone", "499.99").expect("valid product");
//!
//! assert_eq!(inventory.cheapest().map(|p| p.id.as_str()), Some("PHN001"));
//! assert_eq!(
//!     inventory.find_by_partial_id("lap").map(|p| p.name.as_str()),
//!     Ok("Laptop")
//! );
//! ```

mod hash;
mod id_index;
mod inventory;
mod price_index;

pub use hash::{fnv1a64, slot_for};
pub use id_index::{
    DEFAULT_MAX_LOAD_FACTOR, DEFAULT_SLOTS, IdIndex, IdIndexError, MIN_PREFIX_LEN,
    PrefixSearchError,
};
pub use inventory::{Inventory, InventoryError};
pub use price_index::PriceIndex;
