//! Identifier index: a separately chained hash table keyed by product id.
//!
//! Each slot holds a chain of `(id, product)` entries. Slots are chosen with
//! [`slot_for`], so the layout is the same on every run for the same
//! sequence of operations.
//!
//! # Resizing
//!
//! The table tracks its load factor (entries per slot). When an insert would
//! push it above the configured maximum, the slot count doubles and every
//! entry is rehashed into a freshly allocated table.
//!
//! # Invariants
//!
//! - At most one entry per id exists in the whole table.
//! - Every entry lives in the slot its id hashes to.
//! - Every stored product's `id` equals its entry key.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::storage::hash::slot_for;
use crate::types::{NewProduct, Product, ProductId, RecordError};

/// Minimum number of characters accepted by prefix search.
pub const MIN_PREFIX_LEN: usize = 2;

/// Slot count used by [`IdIndex::new`].
pub const DEFAULT_SLOTS: usize = 100;

/// Maximum load factor used by [`IdIndex::new`].
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.75;

#[derive(Debug)]
struct Entry {
    key: ProductId,
    value: Product,
}

/// Hash table of products keyed by id.
#[derive(Debug)]
pub struct IdIndex {
    buckets: Vec<Vec<Entry>>,
    len: usize,
    max_load_factor: f64,
    rng: StdRng,
}

impl Default for IdIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IdIndex {
    /// Create an index with the default slot count and load factor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: empty_buckets(DEFAULT_SLOTS),
            len: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create an index with `slots` initial slots that grows once the load
    /// factor would exceed `max_load_factor`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `slots` is zero or
    /// `max_load_factor` is not in `(0, 1]`.
    pub fn with_capacity(slots: usize, max_load_factor: f64) -> Result<Self, IdIndexError> {
        if slots == 0 {
            return Err(IdIndexError::InvalidConfiguration(
                "slot count must be greater than zero".to_string(),
            ));
        }
        if !(max_load_factor > 0.0 && max_load_factor <= 1.0) {
            return Err(IdIndexError::InvalidConfiguration(format!(
                "max load factor {max_load_factor} must be in (0, 1]"
            )));
        }

        Ok(Self {
            buckets: empty_buckets(slots),
            len: 0,
            max_load_factor,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Use a seeded generator for ids, making generated ids reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of stored products.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries per slot.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// The slot `key` maps to at the current table size.
    #[must_use]
    pub fn bucket_of(&self, key: &str) -> usize {
        slot_for(key.as_bytes(), self.buckets.len())
    }

    /// Insert a product, or replace the product stored under the same id.
    ///
    /// With `key == None` a fresh id is generated. The returned product carries
    /// the id it was stored under, so callers can mirror it into the price
    /// index.
    ///
    /// # Errors
    ///
    /// - `InvalidKey` if `key` is `Some("")`.
    /// - `InvalidRecord` if the draft's name is blank.
    ///
    /// The index is unchanged when an error is returned.
    pub fn insert(&mut self, key: Option<&str>, value: NewProduct) -> Result<&Product, IdIndexError> {
        value.validate()?;
        let id = match key {
            Some(key) => ProductId::new(key).ok_or(IdIndexError::InvalidKey)?,
            None => self.generate_unique_id(),
        };
        Ok(self.put(Product::from_draft(id, value)))
    }

    /// Look up a product by its exact id.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `key` is empty.
    pub fn get(&self, key: &str) -> Result<Option<&Product>, IdIndexError> {
        if key.is_empty() {
            return Err(IdIndexError::InvalidKey);
        }
        let slot = self.bucket_of(key);
        Ok(self.buckets[slot]
            .iter()
            .find(|entry| entry.key.as_str() == key)
            .map(|entry| &entry.value))
    }

    /// Returns `true` if a product is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.get(key), Ok(Some(_)))
    }

    /// Remove the product stored under `key`, returning it.
    ///
    /// A miss is `Ok(None)` and leaves the index untouched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `key` is empty.
    pub fn delete(&mut self, key: &str) -> Result<Option<Product>, IdIndexError> {
        if key.is_empty() {
            return Err(IdIndexError::InvalidKey);
        }
        let slot = self.bucket_of(key);
        let bucket = &mut self.buckets[slot];
        let Some(pos) = bucket.iter().position(|entry| entry.key.as_str() == key) else {
            return Ok(None);
        };
        // `remove` rather than `swap_remove` keeps the rest of the chain in order.
        let entry = bucket.remove(pos);
        self.len -= 1;
        Ok(Some(entry.value))
    }

    /// Remove the product stored under `key`; returns whether one was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        matches!(self.delete(key), Ok(Some(_)))
    }

    /// Every `(id, product)` pair, in slot order and then chain order.
    #[must_use]
    pub fn items(&self) -> Vec<(&ProductId, &Product)> {
        self.buckets
            .iter()
            .flatten()
            .map(|entry| (&entry.key, &entry.value))
            .collect()
    }

    /// Iterate over stored products in slot order and then chain order.
    pub fn values(&self) -> impl Iterator<Item = &Product> {
        self.buckets.iter().flatten().map(|entry| &entry.value)
    }

    /// Find the single product whose id starts with `prefix`.
    ///
    /// Matching ignores ASCII case. Every slot is scanned, because the table
    /// is not ordered by id.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `prefix` is shorter than [`MIN_PREFIX_LEN`] or has
    ///   a character that is not an ASCII letter or digit.
    /// - `NotFound` if no id starts with `prefix`.
    /// - `Ambiguous` with every candidate, sorted by id, if more than one does.
    pub fn find_by_partial_id(&self, prefix: &str) -> Result<&Product, PrefixSearchError> {
        if prefix.chars().count() < MIN_PREFIX_LEN
            || !prefix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(PrefixSearchError::InvalidInput(prefix.to_string()));
        }

        let mut matches: Vec<&Product> = self
            .values()
            .filter(|product| {
                product
                    .id
                    .as_str()
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
            })
            .collect();

        match matches.len() {
            0 => Err(PrefixSearchError::NotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => {
                matches.sort_by(|a, b| a.id.cmp(&b.id));
                Err(PrefixSearchError::Ambiguous(
                    matches.into_iter().cloned().collect(),
                ))
            }
        }
    }

    /// Check the structural invariants of the table.
    ///
    /// Returns a description of the first violation found. `O(n)`; intended
    /// for tests and simulation.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = std::collections::HashSet::with_capacity(self.len);
        let mut count = 0usize;
        for (slot, bucket) in self.buckets.iter().enumerate() {
            for entry in bucket {
                count += 1;
                if entry.key != entry.value.id {
                    return Err(format!(
                        "entry key {} does not match product id {}",
                        entry.key, entry.value.id
                    ));
                }
                if self.bucket_of(entry.key.as_str()) != slot {
                    return Err(format!("id {} stored in wrong slot {slot}", entry.key));
                }
                if !seen.insert(entry.key.as_str()) {
                    return Err(format!("id {} stored more than once", entry.key));
                }
            }
        }
        if count != self.len {
            return Err(format!("counted {count} entries but len is {}", self.len));
        }
        Ok(())
    }

    /// Store `product`, overwriting any entry with the same id.
    fn put(&mut self, product: Product) -> &Product {
        let mut slot = self.bucket_of(product.id.as_str());
        if let Some(pos) = self.buckets[slot]
            .iter()
            .position(|entry| entry.key == product.id)
        {
            let entry = &mut self.buckets[slot][pos];
            entry.value = product;
            return &entry.value;
        }

        if self.exceeds_load_factor(self.len + 1) {
            self.grow();
            slot = self.bucket_of(product.id.as_str());
        }

        let bucket = &mut self.buckets[slot];
        bucket.push(Entry {
            key: product.id.clone(),
            value: product,
        });
        self.len += 1;
        let last = bucket.len() - 1;
        &bucket[last].value
    }

    #[allow(clippy::cast_precision_loss)]
    fn exceeds_load_factor(&self, entries: usize) -> bool {
        entries as f64 > self.max_load_factor * self.buckets.len() as f64
    }

    /// Double the slot count and rehash every entry.
    fn grow(&mut self) {
        let old_slots = self.buckets.len();
        let new_slots = old_slots.saturating_mul(2);
        let mut buckets = empty_buckets(new_slots);
        for entry in std::mem::take(&mut self.buckets).into_iter().flatten() {
            let slot = slot_for(entry.key.as_bytes(), new_slots);
            buckets[slot].push(entry);
        }
        self.buckets = buckets;
        tracing::debug!(
            "resized identifier index from {old_slots} to {new_slots} slots ({} entries)",
            self.len
        );
    }

    fn generate_unique_id(&mut self) -> ProductId {
        loop {
            let id = ProductId::generate(&mut self.rng);
            if !self.contains(id.as_str()) {
                tracing::debug!("generated product id {id}");
                return id;
            }
        }
    }
}

fn empty_buckets(slots: usize) -> Vec<Vec<Entry>> {
    (0..slots).map(|_| Vec::new()).collect()
}

/// Error returned by identifier index operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdIndexError {
    /// The table was configured with invalid parameters.
    InvalidConfiguration(String),
    /// The key is empty.
    InvalidKey,
    /// The product failed validation.
    InvalidRecord(RecordError),
}

impl std::fmt::Display for IdIndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration(message) => write!(f, "invalid configuration: {message}"),
            Self::InvalidKey => write!(f, "product id must not be empty"),
            Self::InvalidRecord(e) => write!(f, "invalid product: {e}"),
        }
    }
}

impl std::error::Error for IdIndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRecord(e) => Some(e),
            Self::InvalidConfiguration(_) | Self::InvalidKey => None,
        }
    }
}

impl From<RecordError> for IdIndexError {
    fn from(e: RecordError) -> Self {
        Self::InvalidRecord(e)
    }
}

/// Outcome of a prefix search that did not resolve to exactly one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefixSearchError {
    /// No id starts with the prefix.
    NotFound(String),
    /// Several ids start with the prefix; the candidates are sorted by id.
    Ambiguous(Vec<Product>),
    /// The prefix is too short or contains a non-alphanumeric character.
    InvalidInput(String),
}

impl std::fmt::Display for PrefixSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(prefix) => write!(f, "no product id starts with '{prefix}'"),
            Self::Ambiguous(candidates) => {
                write!(f, "{} product ids match: ", candidates.len())?;
                for (i, product) in candidates.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", product.id)?;
                }
                Ok(())
            }
            Self::InvalidInput(prefix) => write!(
                f,
                "'{prefix}' is not a valid id prefix (need at least {MIN_PREFIX_LEN} letters or digits)"
            ),
        }
    }
}

impl std::error::Error for PrefixSearchError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Price;

    fn draft(name: &str, cents: u64) -> NewProduct {
        NewProduct::new(name, Price::from_cents(cents).expect("valid price")).expect("valid draft")
    }

    fn seeded() -> IdIndex {
        IdIndex::new().with_seed(1)
    }

    #[test]
    fn test_insert_then_get() {
        let mut index = seeded();
        let stored = index
            .insert(Some("L001"), draft("Test Laptop", 100_000))
            .expect("insert")
            .clone();
        assert_eq!(stored.id.as_str(), "L001");

        let fetched = index.get("L001").expect("valid key").expect("present");
        assert_eq!(fetched, &stored);
        assert_eq!(fetched.price.cents(), 100_000);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_insert_without_key_generates_id() {
        let mut index = seeded();
        let stored = index
            .insert(None, draft("Camera", 49_999))
            .expect("insert")
            .clone();

        assert!(!stored.id.as_str().is_empty());
        let fetched = index
            .get(stored.id.as_str())
            .expect("valid key")
            .expect("present");
        assert_eq!(fetched.name, "Camera");
        assert_eq!(fetched.price.cents(), 49_999);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut index = seeded();
        for i in 0..500 {
            index
                .insert(None, draft("Widget", 100 + i))
                .expect("insert");
        }
        assert_eq!(index.len(), 500);
        assert!(index.check_invariants().is_ok());
    }

    #[test]
    fn test_reinsert_overwrites_without_growing() {
        let mut index = seeded();
        index.insert(Some("P001"), draft("Phone", 50_000)).expect("insert");
        index
            .insert(Some("P001"), draft("Phone Pro", 90_000))
            .expect("update");

        assert_eq!(index.len(), 1);
        let fetched = index.get("P001").expect("valid key").expect("present");
        assert_eq!(fetched.name, "Phone Pro");
        assert_eq!(fetched.price.cents(), 90_000);
    }

    #[test]
    fn test_invalid_inserts_leave_index_unchanged() {
        let mut index = seeded();
        index.insert(Some("P001"), draft("Phone", 50_000)).expect("insert");

        assert_eq!(
            index.insert(Some(""), draft("Phone", 50_000)),
            Err(IdIndexError::InvalidKey)
        );

        let blank = NewProduct {
            name: "  ".to_string(),
            price: Price::from_cents(1).expect("valid price"),
        };
        assert_eq!(
            index.insert(Some("P001"), blank),
            Err(IdIndexError::InvalidRecord(RecordError::EmptyName))
        );

        assert_eq!(index.len(), 1);
        let fetched = index.get("P001").expect("valid key").expect("present");
        assert_eq!(fetched.name, "Phone");
    }

    #[test]
    fn test_get_rejects_empty_key() {
        let index = seeded();
        assert_eq!(index.get(""), Err(IdIndexError::InvalidKey));
        assert_eq!(index.get("missing"), Ok(None));
    }

    #[test]
    fn test_delete_then_get() {
        let mut index = seeded();
        index.insert(Some("L001"), draft("Laptop", 100_000)).expect("insert");

        let removed = index.delete("L001").expect("valid key");
        assert_eq!(removed.map(|p| p.name), Some("Laptop".to_string()));
        assert_eq!(index.get("L001"), Ok(None));
        assert!(index.is_empty());
    }

    #[test]
    fn test_delete_miss_is_noop() {
        let mut index = seeded();
        assert_eq!(index.delete("nonexistent"), Ok(None));
        assert!(!index.remove("nonexistent"));
        assert_eq!(index.delete(""), Err(IdIndexError::InvalidKey));
    }

    #[test]
    fn test_colliding_keys_share_a_chain() {
        let mut index = IdIndex::with_capacity(8, 1.0).expect("valid config");

        // Nine keys over eight slots guarantee at least one collision.
        let keys: Vec<String> = (0..9).map(|i| format!("K{i}")).collect();
        let (a, b) = keys
            .iter()
            .enumerate()
            .find_map(|(i, a)| {
                keys[i + 1..]
                    .iter()
                    .find(|b| index.bucket_of(a) == index.bucket_of(b))
                    .map(|b| (a.to_string(), b.to_string()))
            })
            .expect("pigeonhole collision");

        index.insert(Some(a.as_str()), draft("First", 100)).expect("insert a");
        index.insert(Some(b.as_str()), draft("Second", 200)).expect("insert b");

        assert_eq!(index.bucket_of(&a), index.bucket_of(&b));
        assert_eq!(index.get(&a).expect("valid").map(|p| p.name.as_str()), Some("First"));
        assert_eq!(index.get(&b).expect("valid").map(|p| p.name.as_str()), Some("Second"));

        assert!(index.remove(&a));
        assert_eq!(index.get(&b).expect("valid").map(|p| p.name.as_str()), Some("Second"));
        assert!(index.check_invariants().is_ok());
    }

    #[test]
    fn test_resize_when_load_factor_exceeded() {
        let mut index = IdIndex::with_capacity(4, 0.75).expect("valid config");
        for key in ["A1", "A2", "A3"] {
            index.insert(Some(key), draft("Item", 100)).expect("insert");
        }
        assert_eq!(index.slot_count(), 4);

        index.insert(Some("A4"), draft("Item", 100)).expect("insert");
        assert_eq!(index.slot_count(), 8);
        assert!(index.load_factor() <= 0.75);

        for key in ["A1", "A2", "A3", "A4"] {
            assert!(index.contains(key), "{key} should survive rehash");
        }
        assert!(index.check_invariants().is_ok());
    }

    #[test]
    fn test_overwrite_does_not_trigger_resize() {
        let mut index = IdIndex::with_capacity(4, 0.75).expect("valid config");
        for key in ["A1", "A2", "A3"] {
            index.insert(Some(key), draft("Item", 100)).expect("insert");
        }
        index.insert(Some("A3"), draft("Item", 200)).expect("update");
        assert_eq!(index.slot_count(), 4);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            IdIndex::with_capacity(0, 0.75),
            Err(IdIndexError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            IdIndex::with_capacity(10, 0.0),
            Err(IdIndexError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            IdIndex::with_capacity(10, f64::NAN),
            Err(IdIndexError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            IdIndex::with_capacity(10, 1.5),
            Err(IdIndexError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_items_lists_every_entry() {
        let mut index = seeded();
        for key in ["X1", "X2", "X3"] {
            index.insert(Some(key), draft("Item", 100)).expect("insert");
        }
        let mut keys: Vec<&str> = index.items().into_iter().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["X1", "X2", "X3"]);
        assert!(index.items().iter().all(|(k, v)| *k == &v.id));
    }

    #[test]
    fn test_partial_id_scenario() {
        let mut index = seeded();
        for (key, cents) in [("LAP001", 100_000), ("LAP002", 200_000), ("LAP003", 300_000)] {
            index.insert(Some(key), draft("Laptop", cents)).expect("insert");
        }

        match index.find_by_partial_id("LAP") {
            Err(PrefixSearchError::Ambiguous(candidates)) => {
                let ids: Vec<&str> = candidates.iter().map(|p| p.id.as_str()).collect();
                assert_eq!(ids, vec!["LAP001", "LAP002", "LAP003"]);
            }
            other => panic!("expected ambiguous result, got {other:?}"),
        }

        let exact = index.find_by_partial_id("LAP001").expect("single match");
        assert_eq!(exact.price.cents(), 100_000);
    }

    #[test]
    fn test_partial_id_is_case_insensitive() {
        let mut index = seeded();
        index.insert(Some("PHN001"), draft("Phone", 50_000)).expect("insert");
        index.insert(Some("LAP001"), draft("Laptop", 100_000)).expect("insert");

        let found = index.find_by_partial_id("phn").expect("single match");
        assert_eq!(found.id.as_str(), "PHN001");
    }

    #[test]
    fn test_partial_id_not_found() {
        let mut index = seeded();
        index.insert(Some("PHN001"), draft("Phone", 50_000)).expect("insert");
        assert_eq!(
            index.find_by_partial_id("NONEXISTENT"),
            Err(PrefixSearchError::NotFound("NONEXISTENT".to_string()))
        );
    }

    #[test]
    fn test_partial_id_rejects_invalid_prefix() {
        let mut index = seeded();
        index.insert(Some("PHN001"), draft("Phone", 50_000)).expect("insert");

        for prefix in ["", "P", "PH-", "P N", "ph!"] {
            assert_eq!(
                index.find_by_partial_id(prefix),
                Err(PrefixSearchError::InvalidInput(prefix.to_string())),
                "prefix {prefix:?}"
            );
        }
    }

    #[test]
    fn test_partial_id_after_delete() {
        let mut index = seeded();
        index.insert(Some("L001"), draft("Test Laptop", 100_000)).expect("insert");
        assert!(index.find_by_partial_id("L001").is_ok());

        assert!(index.remove("L001"));
        assert!(matches!(
            index.find_by_partial_id("L001"),
            Err(PrefixSearchError::NotFound(_))
        ));
    }

    #[test]
    fn test_prefix_ambiguity_is_order_independent() {
        let ids = ["AB12", "AB34", "CD56"];
        for rotation in 0..ids.len() {
            let mut index = seeded();
            for i in 0..ids.len() {
                let key = ids[(i + rotation) % ids.len()];
                index.insert(Some(key), draft("Item", 100)).expect("insert");
            }
            assert!(matches!(
                index.find_by_partial_id("ab"),
                Err(PrefixSearchError::Ambiguous(ref c)) if c.len() == 2
            ));
            assert_eq!(
                index.find_by_partial_id("cd").map(|p| p.id.as_str()),
                Ok("CD56")
            );
        }
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            IdIndexError::InvalidKey.to_string(),
            "product id must not be empty"
        );
        assert_eq!(
            PrefixSearchError::NotFound("XY".to_string()).to_string(),
            "no product id starts with 'XY'"
        );
    }
}
