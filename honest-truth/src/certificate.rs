//! Truth certificates.
//!
//! A certificate layers three consistency checks on top of the raw
//! consensus and commits to the contributing feeds with a Merkle root:
//!
//! | Layer       | Weight | Measures                                   |
//! |-------------|--------|--------------------------------------------|
//! | spatial     | 0.50   | agreement across sources (dispersion)      |
//! | temporal    | 0.20   | freshness and timestamp synchronisation    |
//! | statistical | 0.30   | share of sources near the consensus value  |

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consensus::{consensus_of, ConsensusAggregator};
use crate::feed::{FeedVerifier, OracleFeed};
use crate::merkle::feeds_merkle_root;
use crate::types::{Result, TruthError};

#[cfg(feature = "typescript")]
use ts_rs::TS;

const SPATIAL_WEIGHT: f64 = 0.50;
const TEMPORAL_WEIGHT: f64 = 0.20;
const STATISTICAL_WEIGHT: f64 = 0.30;

/// Certificate engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Minimum verified sources required to issue a certificate
    pub min_sources: usize,
    /// Maximum relative deviation from consensus before a source counts as an outlier
    pub outlier_threshold: f64,
    /// Age beyond which freshness starts to decay (ms)
    pub max_age_ms: i64,
    /// Timestamp spread beyond which synchronisation starts to decay (ms)
    pub max_sync_range_ms: i64,
    /// Consistency required by [`TruthCertificate::is_valid_for`]
    pub min_consistency: f64,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            min_sources: 2,
            outlier_threshold: 0.15,
            max_age_ms: 60_000,
            max_sync_range_ms: 30_000,
            min_consistency: 0.8,
        }
    }
}

/// Per-layer consistency scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CertificateScores {
    pub spatial: f64,
    pub temporal: f64,
    pub statistical: f64,
}

impl CertificateScores {
    /// Weighted overall consistency.
    pub fn consistency(&self) -> f64 {
        SPATIAL_WEIGHT * self.spatial
            + TEMPORAL_WEIGHT * self.temporal
            + STATISTICAL_WEIGHT * self.statistical
    }
}

/// Verified consensus with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthCertificate {
    /// Agreed-upon value (median of verified feeds)
    pub consensus_value: f64,
    /// Overall consistency (0.0 - 1.0)
    pub consistency_score: f64,
    /// Merkle root over the contributing feeds
    pub merkle_root: String,
    /// When the certificate was issued (epoch ms)
    pub timestamp: i64,
    /// Number of contributing feeds
    pub source_count: usize,
    /// Individual layer scores
    pub scores: CertificateScores,
    /// Contributing source identifiers, in input order
    pub sources: Vec<String>,
    /// Lowest and highest contributing values
    pub value_range: [f64; 2],
}

impl TruthCertificate {
    /// Whether the certificate meets the given thresholds.
    pub fn is_valid(&self, min_consistency: f64, min_sources: usize) -> bool {
        self.consistency_score >= min_consistency && self.source_count >= min_sources
    }

    /// Check against a configuration's thresholds.
    pub fn is_valid_for(&self, config: &CertificateConfig) -> bool {
        self.is_valid(config.min_consistency, config.min_sources)
    }

    /// Fields exposed on an eigenstate.
    pub fn summary(&self) -> CertificateSummary {
        CertificateSummary {
            consensus_value: self.consensus_value,
            consistency_score: self.consistency_score,
            merkle_root: self.merkle_root.clone(),
            source_count: self.source_count,
        }
    }
}

/// Compact certificate view carried by downstream records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CertificateSummary {
    pub consensus_value: f64,
    pub consistency_score: f64,
    pub merkle_root: String,
    pub source_count: usize,
}

/// Issues truth certificates from raw feeds.
#[derive(Debug, Clone, Default)]
pub struct TruthEngine {
    config: CertificateConfig,
    aggregator: ConsensusAggregator,
}

impl TruthEngine {
    /// Create an engine with default thresholds around `verifier`.
    pub fn new(verifier: FeedVerifier) -> Self {
        Self::with_config(CertificateConfig::default(), verifier)
    }

    /// Create with custom configuration.
    pub fn with_config(config: CertificateConfig, verifier: FeedVerifier) -> Self {
        Self {
            config,
            aggregator: ConsensusAggregator::new(verifier),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CertificateConfig {
        &self.config
    }

    /// Get the underlying aggregator.
    pub fn aggregator(&self) -> &ConsensusAggregator {
        &self.aggregator
    }

    /// Certify feeds against the verifier's clock.
    pub fn certify(&self, feeds: &[OracleFeed]) -> Result<TruthCertificate> {
        self.certify_at(feeds, self.aggregator.verifier().now_millis())
    }

    /// Certify feeds against an explicit `now`.
    pub fn certify_at(&self, feeds: &[OracleFeed], now_millis: i64) -> Result<TruthCertificate> {
        let verified = self.aggregator.verified_at(feeds, now_millis)?;
        if verified.len() < self.config.min_sources {
            return Err(TruthError::InsufficientSources {
                got: verified.len(),
                need: self.config.min_sources,
            });
        }

        let values: Vec<f64> = verified.iter().map(|f| f.value).collect();
        let timestamps: Vec<i64> = verified.iter().map(|f| f.timestamp).collect();
        let consensus = consensus_of(&values);

        let scores = CertificateScores {
            spatial: consensus.coherence,
            temporal: self.temporal_score(&timestamps, now_millis),
            statistical: self.statistical_score(&values, consensus.value),
        };

        // verified is non-empty, so a root always exists
        let merkle_root = feeds_merkle_root(verified.iter().copied()).unwrap_or_default();
        let low = values.iter().copied().fold(f64::INFINITY, f64::min);
        let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let certificate = TruthCertificate {
            consensus_value: consensus.value,
            consistency_score: scores.consistency(),
            merkle_root,
            timestamp: now_millis,
            source_count: consensus.source_count,
            scores,
            sources: verified.iter().map(|f| f.source.clone()).collect(),
            value_range: [low, high],
        };

        info!(
            consensus = certificate.consensus_value,
            consistency = certificate.consistency_score,
            spatial = scores.spatial,
            temporal = scores.temporal,
            statistical = scores.statistical,
            sources = certificate.source_count,
            "Truth certificate issued"
        );

        Ok(certificate)
    }

    /// `0.7 * freshness + 0.3 * synchronisation`.
    fn temporal_score(&self, timestamps: &[i64], now_millis: i64) -> f64 {
        let (Some(oldest), Some(newest)) = (timestamps.iter().min(), timestamps.iter().max()) else {
            return 0.0;
        };

        let freshness = linear_decay(now_millis - oldest, self.config.max_age_ms);
        let sync = linear_decay(newest - oldest, self.config.max_sync_range_ms);

        0.7 * freshness + 0.3 * sync
    }

    /// Share of values within the outlier threshold of consensus.
    fn statistical_score(&self, values: &[f64], consensus: f64) -> f64 {
        if values.is_empty() || consensus == 0.0 {
            return 0.0;
        }

        let within = values
            .iter()
            .filter(|v| ((*v - consensus) / consensus).abs() <= self.config.outlier_threshold)
            .count();

        within as f64 / values.len() as f64
    }
}

/// 1.0 up to `limit`, then linear decay reaching 0.0 at `2 * limit`.
fn linear_decay(observed: i64, limit: i64) -> f64 {
    if observed <= limit {
        return 1.0;
    }
    if limit <= 0 {
        return 0.0;
    }
    (1.0 - (observed - limit) as f64 / limit as f64).max(0.0)
}
