//! Core eigenstate types.
//!
//! These are the shapes that cross the boundary to sensory, storage and
//! minting consumers, so field names are part of the wire format.
//!
//! With the `typescript` feature enabled they are exported through ts-rs.

use serde::{Deserialize, Serialize};

use honest_truth::CertificateSummary;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Errors raised by eigenstate components.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EigenstateError {
    /// A normalizer or coherence setting the engine cannot run with
    #[error("Invalid {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl EigenstateError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EigenstateError>;

/// Trading verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::Hold
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Six normalized dimensions, each in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct EigenstateDimensions {
    /// 24h price change (real)
    pub price: f64,
    /// 24h traded volume (real)
    pub volume: f64,
    /// Turnover-weighted price change (real)
    pub momentum: f64,
    /// Blend of price and momentum (imaginary)
    pub sentiment: f64,
    /// Slow sine of time (imaginary)
    pub temporal: f64,
    /// Slow cosine of time (imaginary)
    pub spatial: f64,
}

impl EigenstateDimensions {
    /// Values in declaration order.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.price,
            self.volume,
            self.momentum,
            self.sentiment,
            self.temporal,
            self.spatial,
        ]
    }

    /// Whether every dimension lies in [-1, 1].
    pub fn is_bounded(&self) -> bool {
        self.as_array()
            .iter()
            .all(|v| v.is_finite() && (-1.0..=1.0).contains(v))
    }
}

/// Snapshot of one asset at one point in time.
///
/// Produced fresh on every pipeline run and never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Eigenstate {
    /// Asset symbol (upper case)
    pub asset: String,
    /// Computation time (epoch ms)
    pub timestamp: i64,
    /// Normalized dimensions
    pub dimensions: EigenstateDimensions,
    /// Coherence score (-1.0 - 1.0)
    pub coherence: f64,
    /// Phase of momentum against price, degrees in [0, 360)
    pub phase_angle: f64,
    /// Verdict
    pub decision: Decision,
    /// Provenance of the consensus price, when one was certified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth_certificate: Option<CertificateSummary>,
}
