//! Error types for shelf_inventory

use thiserror::Error;

/// Failure to turn an external string (CSV cell or typed input) into a value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The value does not have the expected shape at all
    #[error("Invalid {field} '{value}': expected {expected}")]
    Format {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
    /// A price carrying fractions of a cent
    #[error("Invalid price '{0}': you may only enter up to two decimal places")]
    Precision(String),
}

impl ParseError {
    pub(crate) fn format(field: &'static str, value: &str, expected: &'static str) -> Self {
        ParseError::Format {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Unified error type for inventory operations
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Price, quantity, date or name could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Unique constraint on the product name was hit
    #[error("A product named '{0}' already exists")]
    DuplicateName(String),
    /// No product has this id
    #[error("Product ID {0} does not exist")]
    NotFound(i64),
    /// The store holds no products yet
    #[error("The inventory is empty")]
    EmptyStore,
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// CSV file could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl InventoryError {
    /// Whether the user can fix this by re-entering input.
    ///
    /// Storage faults are not recoverable and should be propagated.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            InventoryError::Parse(_)
                | InventoryError::DuplicateName(_)
                | InventoryError::NotFound(_)
                | InventoryError::EmptyStore
        )
    }
}

/// Result alias for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_are_recoverable() {
        let err: InventoryError = ParseError::Precision("$1.234".to_string()).into();
        assert!(err.is_recoverable());
        assert!(InventoryError::NotFound(7).is_recoverable());
        assert!(InventoryError::EmptyStore.is_recoverable());
    }

    #[test]
    fn storage_faults_are_not_recoverable() {
        let err = InventoryError::Io(std::io::Error::other("disk full"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn display_passes_parse_message_through() {
        let err: InventoryError = ParseError::format("price", "abc", "'$#.##'").into();
        assert_eq!(err.to_string(), "Invalid price 'abc': expected '$#.##'");
    }
}
