//! Error types for the truth layer.

/// Errors raised while turning feeds into a consensus value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TruthError {
    /// The caller supplied no feeds at all
    #[error("No feeds supplied")]
    EmptyInput,

    /// Feeds were supplied but none passed verification
    #[error("None of the {supplied} supplied feeds passed verification")]
    NoVerifiedFeeds { supplied: usize },

    /// Not enough verified feeds to issue a certificate
    #[error("Insufficient sources: got {got}, need at least {need}")]
    InsufficientSources { got: usize, need: usize },
}

pub type Result<T> = std::result::Result<T, TruthError>;
