//! Record types shared by the price index and the identifier index.

mod price;
mod product;

pub use price::Price;
pub use product::{GENERATED_ID_LENGTH, NewProduct, Product, ProductId};

/// Error returned when a product record fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The product name is empty or blank.
    EmptyName,
    /// The price is zero or negative.
    NonPositivePrice,
    /// The price is NaN or infinite.
    NonFinitePrice,
    /// The price has more than two fractional digits.
    ExcessPrecision(String),
    /// The price text is not a decimal number.
    UnparseablePrice(String),
    /// The price does not fit in the cent representation.
    PriceOutOfRange(String),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "product name must not be empty"),
            Self::NonPositivePrice => write!(f, "price must be greater than zero"),
            Self::NonFinitePrice => write!(f, "price must be a finite number"),
            Self::ExcessPrecision(value) => {
                write!(f, "price '{value}' has more than two fractional digits")
            }
            Self::UnparseablePrice(value) => write!(f, "'{value}' is not a valid price"),
            Self::PriceOutOfRange(value) => write!(f, "price '{value}' is too large"),
        }
    }
}

impl std::error::Error for RecordError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_error_display() {
        assert_eq!(
            RecordError::EmptyName.to_string(),
            "product name must not be empty"
        );
        assert_eq!(
            RecordError::ExcessPrecision("1.234".to_string()).to_string(),
            "price '1.234' has more than two fractional digits"
        );
    }
}
