//! The complete feed-to-eigenstate pipeline.

use honest_truth::{CertificateSummary, OracleFeed, TruthCertificate, TruthEngine};

use crate::coherence::CoherenceEngine;
use crate::dimensions::{DimensionNormalizer, MarketSnapshot};
use crate::types::Eigenstate;

/// Truth, normalization and coherence stages wired together.
#[derive(Debug, Clone, Default)]
pub struct EigenstatePipeline {
    /// Consensus and certificates
    pub truth: TruthEngine,
    /// Raw market fields to dimensions
    pub normalizer: DimensionNormalizer,
    /// Scoring and verdict
    pub coherence: CoherenceEngine,
}

impl EigenstatePipeline {
    /// Create a pipeline with default stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom components.
    pub fn with_components(
        truth: TruthEngine,
        normalizer: DimensionNormalizer,
        coherence: CoherenceEngine,
    ) -> Self {
        Self {
            truth,
            normalizer,
            coherence,
        }
    }

    /// Certify `feeds`, price the snapshot at the consensus value and evaluate.
    ///
    /// With a reference price on the snapshot, the price dimension measures
    /// the certified consensus against it.
    pub fn run(
        &self,
        asset: &str,
        feeds: &[OracleFeed],
        snapshot: &MarketSnapshot,
        now_millis: i64,
    ) -> honest_truth::Result<(Eigenstate, TruthCertificate)> {
        let certificate = self.truth.certify_at(feeds, now_millis)?;
        let priced = snapshot.with_price(certificate.consensus_value);
        let eigenstate = self.evaluate(asset, &priced, now_millis, Some(certificate.summary()));
        Ok((eigenstate, certificate))
    }

    /// Evaluate a snapshot without certification.
    pub fn evaluate(
        &self,
        asset: &str,
        snapshot: &MarketSnapshot,
        now_millis: i64,
        truth_certificate: Option<CertificateSummary>,
    ) -> Eigenstate {
        let dimensions = self.normalizer.normalize(snapshot, now_millis);
        self.coherence.evaluate(asset, now_millis, dimensions, truth_certificate)
    }
}
