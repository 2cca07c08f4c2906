//! Inventory facade over the identifier and price indexes.
//!
//! The two indexes never talk to each other. `Inventory` is the caller that
//! keeps them in step: every mutation is applied to the identifier index
//! first (which validates it) and then mirrored into the price index.

use crate::config::InventoryConfig;
use crate::storage::id_index::{IdIndex, IdIndexError, PrefixSearchError};
use crate::storage::price_index::PriceIndex;
use crate::types::{NewProduct, Price, Product, ProductId, RecordError};

/// A product catalog indexed by id and by price.
#[derive(Debug, Default)]
pub struct Inventory {
    by_id: IdIndex,
    by_price: PriceIndex<Product>,
}

impl Inventory {
    /// Create an empty inventory with default index settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty inventory around an existing identifier index.
    ///
    /// # Pre-conditions
    ///
    /// - `by_id` is empty.
    #[must_use]
    pub fn with_id_index(by_id: IdIndex) -> Self {
        debug_assert!(by_id.is_empty(), "identifier index must start empty");
        Self {
            by_id,
            by_price: PriceIndex::new(),
        }
    }

    /// Create an empty inventory sized according to `config`.
    pub fn from_config(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let mut by_id = IdIndex::with_capacity(config.initial_slots, config.max_load_factor)?;
        if let Some(seed) = config.seed {
            by_id = by_id.with_seed(seed);
        }
        Ok(Self::with_id_index(by_id))
    }

    /// Number of products.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns `true` when the inventory holds no products.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Read access to the identifier index.
    #[must_use]
    pub const fn id_index(&self) -> &IdIndex {
        &self.by_id
    }

    /// Read access to the price index.
    #[must_use]
    pub const fn price_index(&self) -> &PriceIndex<Product> {
        &self.by_price
    }

    /// Add a product, or replace the product with the same id.
    ///
    /// With `id == None` an id is generated. On replacement the old price
    /// entry is removed before the new one is inserted.
    pub fn add(&mut self, id: Option<&str>, draft: NewProduct) -> Result<Product, InventoryError> {
        let (stored, previous) = match self.put_by_id(id, draft) {
            Ok(put) => put,
            Err(e) => {
                tracing::warn!("rejected product {}: {e}", id.unwrap_or("<generated>"));
                return Err(e.into());
            }
        };

        if let Some(old) = previous {
            let removed = self.by_price.delete_where(old.price, |p| p.id == old.id);
            debug_assert!(removed.is_some(), "price index missing {}", old.id);
        }
        self.by_price.insert(stored.price, stored.clone());
        Ok(stored)
    }

    /// Store `draft` in the identifier index, returning the stored product and
    /// the one it replaced.
    fn put_by_id(
        &mut self,
        id: Option<&str>,
        draft: NewProduct,
    ) -> Result<(Product, Option<Product>), IdIndexError> {
        let previous = match id {
            Some(key) => self.by_id.get(key)?.cloned(),
            None => None,
        };
        let stored = self.by_id.insert(id, draft)?.clone();
        Ok((stored, previous))
    }

    /// Add a product whose price is given as decimal text, e.g. `"499.99"`.
    pub fn add_parsed(
        &mut self,
        id: Option<&str>,
        name: &str,
        price: &str,
    ) -> Result<Product, InventoryError> {
        let draft = NewProduct::parse(name, price)?;
        self.add(id, draft)
    }

    /// Remove a product from both indexes, returning it.
    pub fn remove(&mut self, id: &str) -> Result<Option<Product>, InventoryError> {
        let Some(removed) = self.by_id.delete(id)? else {
            tracing::debug!("remove of unknown product {id}");
            return Ok(None);
        };
        let mirrored = self
            .by_price
            .delete_where(removed.price, |p| p.id == removed.id);
        debug_assert!(mirrored.is_some(), "price index missing {}", removed.id);
        Ok(Some(removed))
    }

    /// Look up a product by exact id.
    pub fn get(&self, id: &str) -> Result<Option<&Product>, InventoryError> {
        Ok(self.by_id.get(id)?)
    }

    /// Find the single product whose id starts with `prefix`.
    pub fn find_by_partial_id(&self, prefix: &str) -> Result<&Product, PrefixSearchError> {
        self.by_id.find_by_partial_id(prefix)
    }

    /// The cheapest product, if any.
    #[must_use]
    pub fn cheapest(&self) -> Option<&Product> {
        self.by_price.find_cheapest()
    }

    /// The most expensive product, if any.
    #[must_use]
    pub fn most_expensive(&self) -> Option<&Product> {
        self.by_price.find_most_expensive()
    }

    /// Products priced within `min..=max`, ascending.
    #[must_use]
    pub fn in_range(&self, min: Price, max: Price) -> Vec<&Product> {
        self.by_price.find_products_in_range(min, max)
    }

    /// Every product ordered by price.
    #[must_use]
    pub fn sorted_by_price(&self, descending: bool) -> Vec<&Product> {
        self.by_price.get_sorted_products(descending)
    }

    /// Every `(id, product)` pair in identifier index order.
    #[must_use]
    pub fn items(&self) -> Vec<(&ProductId, &Product)> {
        self.by_id.items()
    }

    /// Add every product in `products` under its own id.
    ///
    /// Returns the number of products loaded. Stops at the first invalid
    /// product; products loaded before it stay in the inventory.
    pub fn load<I>(&mut self, products: I) -> Result<usize, InventoryError>
    where
        I: IntoIterator<Item = Product>,
    {
        let mut loaded = 0;
        for product in products {
            let Product { id, name, price } = product;
            self.add(Some(id.as_str()), NewProduct { name, price })?;
            loaded += 1;
        }
        tracing::info!(
            "loaded {loaded} products ({} distinct ids, {} id slots, tree height {})",
            self.len(),
            self.by_id.slot_count(),
            self.by_price.height()
        );
        Ok(loaded)
    }

    /// Check that both indexes hold exactly the same products.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.by_id.len() != self.by_price.len() {
            return Err(format!(
                "identifier index has {} products but price index has {}",
                self.by_id.len(),
                self.by_price.len()
            ));
        }
        for (price, product) in self.by_price.entries() {
            if price != product.price {
                return Err(format!(
                    "product {} filed under price {price} but priced {}",
                    product.id, product.price
                ));
            }
            match self.by_id.get(product.id.as_str()) {
                Ok(Some(stored)) if stored == product => {}
                Ok(Some(stored)) => {
                    return Err(format!("price index has {product} but id index has {stored}"));
                }
                _ => return Err(format!("price index has {product} missing from id index")),
            }
        }
        Ok(())
    }
}

/// Error returned by inventory operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// The identifier index rejected the operation.
    Index(IdIndexError),
    /// The product could not be built from its raw fields.
    Record(RecordError),
}

impl std::fmt::Display for InventoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(e) => write!(f, "index error: {e}"),
            Self::Record(e) => write!(f, "record error: {e}"),
        }
    }
}

impl std::error::Error for InventoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Index(e) => Some(e),
            Self::Record(e) => Some(e),
        }
    }
}

impl From<IdIndexError> for InventoryError {
    fn from(e: IdIndexError) -> Self {
        Self::Index(e)
    }
}

impl From<RecordError> for InventoryError {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}
