//! Error types for the ledger.

/// Errors raised while building, importing or storing records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// A numeric field was NaN or infinite
    #[error("Non-finite value in {0}")]
    NonFiniteValue(String),

    /// A numeric field lies outside its allowed range
    #[error("{field} out of range: {value}")]
    OutOfRange { field: String, value: f64 },

    /// A required field was absent or empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The stored hash does not match the recomputed one
    #[error("Record hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: String, computed: String },
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
