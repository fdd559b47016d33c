//! Consensus aggregation across multiple oracle feeds.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feed::{FeedVerifier, OracleFeed};
use crate::types::{Result, TruthError};

/// Aggregated value for one asset/metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    /// Median of the verified values
    pub value: f64,
    /// Agreement between sources (0.0 - 1.0)
    pub coherence: f64,
    /// Number of feeds that contributed
    pub source_count: usize,
}

/// Combines verified feeds into a consensus value.
#[derive(Debug, Clone, Default)]
pub struct ConsensusAggregator {
    verifier: FeedVerifier,
}

impl ConsensusAggregator {
    /// Create an aggregator around a verifier.
    pub fn new(verifier: FeedVerifier) -> Self {
        Self { verifier }
    }

    /// Get the verifier.
    pub fn verifier(&self) -> &FeedVerifier {
        &self.verifier
    }

    /// Aggregate feeds against the verifier's clock.
    pub fn aggregate(&self, feeds: &[OracleFeed]) -> Result<Consensus> {
        self.aggregate_at(feeds, self.verifier.now_millis())
    }

    /// Aggregate feeds against an explicit `now`.
    pub fn aggregate_at(&self, feeds: &[OracleFeed], now_millis: i64) -> Result<Consensus> {
        let verified = self.verified_at(feeds, now_millis)?;
        let values: Vec<f64> = verified.iter().map(|f| f.value).collect();
        let consensus = consensus_of(&values);

        debug!(
            supplied = feeds.len(),
            verified = consensus.source_count,
            value = consensus.value,
            coherence = consensus.coherence,
            "Consensus aggregated"
        );

        Ok(consensus)
    }

    /// Verified subset of `feeds`, or the matching input error.
    pub fn verified_at<'a>(
        &self,
        feeds: &'a [OracleFeed],
        now_millis: i64,
    ) -> Result<Vec<&'a OracleFeed>> {
        if feeds.is_empty() {
            return Err(TruthError::EmptyInput);
        }

        let verified = self.verifier.retain_verified(feeds, now_millis);
        if verified.is_empty() {
            return Err(TruthError::NoVerifiedFeeds {
                supplied: feeds.len(),
            });
        }

        Ok(verified)
    }
}

/// Consensus over already-verified values. `values` must be non-empty.
pub(crate) fn consensus_of(values: &[f64]) -> Consensus {
    if values.len() == 1 {
        return Consensus {
            value: values[0],
            coherence: 1.0,
            source_count: 1,
        };
    }

    Consensus {
        value: median(values),
        coherence: dispersion_coherence(values),
        source_count: values.len(),
    }
}

/// Median of `values`; the mean of the two middle values for even counts.
///
/// Returns 0.0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        let (low, high) = (sorted[mid - 1], sorted[mid]);
        low + (high - low) / 2.0
    } else {
        sorted[mid]
    }
}

/// Arithmetic mean, 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// `1 - min(stdDev / mean, 1)`, floored at 0.
///
/// A zero mean gives 0: agreement cannot be asserted on a zero baseline.
pub fn dispersion_coherence(values: &[f64]) -> f64 {
    let m = mean(values);
    if m == 0.0 || !m.is_finite() {
        return 0.0;
    }

    let cv = (std_dev(values) / m).abs();
    (1.0 - cv.min(1.0)).max(0.0)
}
