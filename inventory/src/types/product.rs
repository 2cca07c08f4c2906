//! Product records shared by both indexes.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{Price, RecordError};

/// Characters used for generated product identifiers.
const GENERATED_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated product identifiers.
pub const GENERATED_ID_LENGTH: usize = 12;

/// A product identifier.
///
/// # Invariants
///
/// - The identifier is never empty once stored in an index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create an identifier, rejecting the empty string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    /// Create a sequential identifier such as `P001`.
    #[must_use]
    pub fn sequential(prefix: char, serial: u64) -> Self {
        Self(format!("{prefix}{serial:03}"))
    }

    /// Generate a random identifier of upper-case letters and digits.
    ///
    /// Generated identifiers only contain alphanumeric characters so they can
    /// always be found again through prefix search.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let id = (0..GENERATED_ID_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..GENERATED_ID_CHARSET.len());
                char::from(GENERATED_ID_CHARSET[idx])
            })
            .collect();
        Self(id)
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier's bytes, as fed to the hash function.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier, the key of the identifier index.
    pub id: ProductId,
    /// Display name, never empty.
    pub name: String,
    /// Price, the key of the price index.
    pub price: Price,
}

impl Product {
    /// Attach an identifier to a validated draft.
    #[must_use]
    pub fn from_draft(id: ProductId, draft: NewProduct) -> Self {
        Self {
            id,
            name: draft.name,
            price: draft.price,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {}", self.id, self.name, self.price)
    }
}

/// A product that has not been assigned an identifier yet.
///
/// This is the value passed to the identifier index on insert. The index
/// either uses the caller's key or generates one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Price,
}

impl NewProduct {
    /// Create a draft, rejecting an empty or blank name.
    pub fn new(name: impl Into<String>, price: Price) -> Result<Self, RecordError> {
        let draft = Self {
            name: name.into(),
            price,
        };
        draft.validate()?;
        Ok(draft)
    }

    /// Create a draft from a price given as decimal text, e.g. `"499.99"`.
    pub fn parse(name: impl Into<String>, price: &str) -> Result<Self, RecordError> {
        Self::new(name, price.parse()?)
    }

    /// Check the draft's fields.
    ///
    /// The price is valid by construction; only the name can be wrong.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.name.trim().is_empty() {
            return Err(RecordError::EmptyName);
        }
        Ok(())
    }
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            price: product.price,
        }
    }
}
