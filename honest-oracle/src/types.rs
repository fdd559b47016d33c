//! Error types for the oracle service.

use honest_ledger::LedgerError;
use honest_truth::TruthError;

use crate::source::SourceError;

/// Errors surfaced by [`crate::OracleService`].
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Consensus or certification failed
    #[error("Truth layer: {0}")]
    Truth(#[from] TruthError),

    /// Every configured source failed; carries the first failure
    #[error("All feed sources failed: {0}")]
    Source(#[from] SourceError),

    /// Nothing to compute from
    #[error("No data for {0}")]
    NoData(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Record construction or storage failed
    #[error("Ledger: {0}")]
    Ledger(#[from] LedgerError),
}

pub type Result<T> = std::result::Result<T, OracleError>;
