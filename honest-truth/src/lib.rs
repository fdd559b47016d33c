//! Truth layer of the Honest Oracle.
//!
//! Turns raw oracle observations into a single trusted number:
//!
//! - **Feed verification**: freshness, positivity and identity checks per feed
//! - **Consensus**: median value plus a dispersion-based agreement score
//! - **Truth certificates**: spatial, temporal and statistical consistency
//!   with a SHA-256 Merkle root over the contributing feeds
//!
//! # Flow
//!
//! ```text
//! OracleFeed* ──► FeedVerifier ──► ConsensusAggregator ──► TruthEngine
//!                  (drop stale)     (median, coherence)     (certificate)
//! ```
//!
//! Time is always read through a [`Clock`], so every stage can be driven
//! deterministically from tests.

pub mod certificate;
pub mod clock;
pub mod consensus;
pub mod feed;
pub mod merkle;
pub mod metric;
pub mod types;

// Re-export main types
pub use certificate::{
    CertificateConfig, CertificateScores, CertificateSummary, TruthCertificate, TruthEngine,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use consensus::{Consensus, ConsensusAggregator};
pub use feed::{FeedVerifier, OracleFeed, VerifierConfig};
pub use merkle::{merkle_root, sha256_hex};
pub use metric::HonestMetric;
pub use types::{Result, TruthError};
