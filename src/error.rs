use csv::Error as CsvError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BazaarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("Validation failed on field '{field}': {constraint}")]
    Validation { field: String, constraint: String },

    #[error("Unique constraint violation on field '{0}' with value '{1}'")]
    UniqueConstraintViolation(String, String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

impl BazaarError {
    /// Shorthand for a schema violation on a (possibly nested) field path.
    pub fn validation(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BazaarError>;
