//! Coherence scoring and decision thresholds.
//!
//! One [`CoherenceMode`] and one [`DecisionRule`] are fixed per engine, so
//! every eigenstate it produces is scored and judged the same way.

use serde::{Deserialize, Serialize};
use tracing::debug;

use honest_truth::{consensus::std_dev, CertificateSummary};

use crate::dimensions::{DimensionNormalizer, MarketSnapshot};
use crate::types::{Decision, Eigenstate, EigenstateDimensions, EigenstateError, Result};

/// How the six dimensions collapse into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoherenceMode {
    /// Weighted sum of the dimensions, clamped to [-1, 1]
    #[default]
    Weighted,
    /// `1 - min(std_dev(dimensions), 1)`; direction-blind, always in [0, 1]
    Alignment,
}

/// How coherence becomes a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// Coherence and momentum must both clear their thresholds
    #[default]
    MomentumGated,
    /// Coherence alone decides
    CoherenceOnly,
}

/// Per-dimension weights for [`CoherenceMode::Weighted`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionWeights {
    pub price: f64,
    pub volume: f64,
    pub momentum: f64,
    pub sentiment: f64,
    pub temporal: f64,
    pub spatial: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            price: 0.25,
            volume: 0.15,
            momentum: 0.25,
            sentiment: 0.15,
            temporal: 0.10,
            spatial: 0.10,
        }
    }
}

impl DimensionWeights {
    /// Weights in dimension order.
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

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// Coherence engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoherenceConfig {
    pub mode: CoherenceMode,
    pub rule: DecisionRule,
    pub weights: DimensionWeights,
    /// Coherence above which BUY is possible
    pub buy_threshold: f64,
    /// Coherence below which SELL is possible
    pub sell_threshold: f64,
    /// Momentum magnitude required by [`DecisionRule::MomentumGated`]
    pub momentum_threshold: f64,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        Self {
            mode: CoherenceMode::Weighted,
            rule: DecisionRule::MomentumGated,
            weights: DimensionWeights::default(),
            buy_threshold: 0.5,
            sell_threshold: -0.5,
            momentum_threshold: 0.3,
        }
    }
}

impl CoherenceConfig {
    /// Check weights and thresholds.
    pub fn validate(&self) -> Result<()> {
        let weights = self.weights.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EigenstateError::invalid("weights", "must be finite and non-negative"));
        }
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            let reason = format!("must sum to 1.0, got {total}");
            return Err(EigenstateError::invalid("weights", reason));
        }

        for (name, value) in [
            ("buy_threshold", self.buy_threshold),
            ("sell_threshold", self.sell_threshold),
            ("momentum_threshold", self.momentum_threshold),
        ] {
            if !(-1.0..=1.0).contains(&value) {
                let reason = format!("must lie in [-1, 1], got {value}");
                return Err(EigenstateError::invalid(name, reason));
            }
        }
        if self.sell_threshold >= self.buy_threshold {
            return Err(EigenstateError::invalid("sell_threshold", "must be below buy_threshold"));
        }
        Ok(())
    }
}

/// Scores dimensions and derives phase and verdict.
#[derive(Debug, Clone, Default)]
pub struct CoherenceEngine {
    config: CoherenceConfig,
}

impl CoherenceEngine {
    /// Create an engine with the default weighted, momentum-gated setup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration.
    pub fn with_config(config: CoherenceConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &CoherenceConfig {
        &self.config
    }

    /// Collapse dimensions into a score in [-1, 1].
    ///
    /// A non-finite intermediate (e.g. from NaN dimensions) yields 0.
    pub fn compute_coherence(&self, dims: &EigenstateDimensions) -> f64 {
        let values = dims.as_array();
        let raw = match self.config.mode {
            CoherenceMode::Weighted => values
                .iter()
                .zip(self.config.weights.as_array())
                .map(|(v, w)| v * w)
                .sum::<f64>(),
            CoherenceMode::Alignment => 1.0 - std_dev(&values).min(1.0),
        };

        if raw.is_finite() {
            raw.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Apply the configured decision rule.
    pub fn decide(&self, coherence: f64, dims: &EigenstateDimensions) -> Decision {
        let c = &self.config;
        match c.rule {
            DecisionRule::MomentumGated => {
                if coherence > c.buy_threshold && dims.momentum > c.momentum_threshold {
                    Decision::Buy
                } else if coherence < c.sell_threshold && dims.momentum < -c.momentum_threshold {
                    Decision::Sell
                } else {
                    Decision::Hold
                }
            }
            DecisionRule::CoherenceOnly => {
                if coherence > c.buy_threshold {
                    Decision::Buy
                } else if coherence < c.sell_threshold {
                    Decision::Sell
                } else {
                    Decision::Hold
                }
            }
        }
    }

    /// Phase of (price, momentum) in degrees, in [0, 360).
    pub fn phase_angle(&self, dims: &EigenstateDimensions) -> f64 {
        if !(dims.price.is_finite() && dims.momentum.is_finite()) {
            return 0.0;
        }
        let degrees = dims.momentum.atan2(dims.price).to_degrees().rem_euclid(360.0) + 0.0;
        // rem_euclid can round up to exactly 360 for tiny negative angles
        if degrees >= 360.0 {
            0.0
        } else {
            degrees
        }
    }

    /// Build an eigenstate from already-normalized dimensions.
    pub fn evaluate(
        &self,
        asset: &str,
        timestamp: i64,
        dimensions: EigenstateDimensions,
        truth_certificate: Option<CertificateSummary>,
    ) -> Eigenstate {
        let coherence = self.compute_coherence(&dimensions);
        let decision = self.decide(coherence, &dimensions);
        let asset = asset.trim().to_uppercase();

        debug!(
            asset = %asset,
            coherence,
            momentum = dimensions.momentum,
            decision = %decision,
            "Eigenstate evaluated"
        );

        Eigenstate {
            asset,
            timestamp,
            dimensions,
            coherence,
            phase_angle: self.phase_angle(&dimensions),
            decision,
            truth_certificate,
        }
    }

    /// Normalize a snapshot and evaluate it in one step.
    pub fn evaluate_snapshot(
        &self,
        normalizer: &DimensionNormalizer,
        asset: &str,
        snapshot: &MarketSnapshot,
        timestamp: i64,
    ) -> Eigenstate {
        let dimensions = normalizer.normalize(snapshot, timestamp);
        self.evaluate(asset, timestamp, dimensions, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(
        price: f64,
        volume: f64,
        momentum: f64,
        sentiment: f64,
        temporal: f64,
        spatial: f64,
    ) -> EigenstateDimensions {
        EigenstateDimensions {
            price,
            volume,
            momentum,
            sentiment,
            temporal,
            spatial,
        }
    }

    #[test]
    fn test_bullish_scenario_buys() {
        let engine = CoherenceEngine::new();
        let d = dims(0.9, 0.5, 0.8, 0.7, 0.1, 0.1);

        let coherence = engine.compute_coherence(&d);
        assert!((coherence - 0.635).abs() < 1e-9);
        assert_eq!(engine.decide(coherence, &d), Decision::Buy);
    }

    #[test]
    fn test_momentum_gate_holds_without_momentum() {
        let engine = CoherenceEngine::new();
        let d = dims(1.0, 1.0, 0.2, 1.0, 1.0, 1.0);

        let coherence = engine.compute_coherence(&d);
        assert!(coherence > 0.5);
        assert_eq!(engine.decide(coherence, &d), Decision::Hold);
    }

    #[test]
    fn test_bearish_scenario_sells() {
        let engine = CoherenceEngine::new();
        let d = dims(-0.9, -0.5, -0.8, -0.7, -0.1, -0.1);

        let coherence = engine.compute_coherence(&d);
        assert!((coherence + 0.635).abs() < 1e-9);
        assert_eq!(engine.decide(coherence, &d), Decision::Sell);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let engine = CoherenceEngine::new();
        let d = dims(0.0, 0.0, 0.3, 0.0, 0.0, 0.0);
        assert_eq!(engine.decide(0.5, &d), Decision::Hold);
        assert_eq!(engine.decide(0.51, &d), Decision::Hold);
        assert_eq!(engine.decide(0.51, &dims(0.0, 0.0, 0.31, 0.0, 0.0, 0.0)), Decision::Buy);
    }

    #[test]
    fn test_coherence_only_rule_ignores_momentum() {
        let engine = CoherenceEngine::with_config(CoherenceConfig {
            rule: DecisionRule::CoherenceOnly,
            ..Default::default()
        });
        let d = dims(1.0, 1.0, 0.0, 1.0, 1.0, 1.0);
        assert_eq!(engine.decide(engine.compute_coherence(&d), &d), Decision::Buy);
        assert_eq!(engine.decide(-0.6, &d), Decision::Sell);
        assert_eq!(engine.decide(0.0, &d), Decision::Hold);
    }

    #[test]
    fn test_alignment_mode() {
        let engine = CoherenceEngine::with_config(CoherenceConfig {
            mode: CoherenceMode::Alignment,
            ..Default::default()
        });

        let aligned = dims(-0.4, -0.4, -0.4, -0.4, -0.4, -0.4);
        assert_eq!(engine.compute_coherence(&aligned), 1.0);

        let split = dims(1.0, -1.0, 1.0, -1.0, 1.0, -1.0);
        assert_eq!(engine.compute_coherence(&split), 0.0);
    }

    #[test]
    fn test_coherence_is_clamped_and_nan_safe() {
        let heavy = CoherenceEngine::with_config(CoherenceConfig {
            weights: DimensionWeights {
                price: 3.0,
                ..Default::default()
            },
            ..Default::default()
        });
        assert_eq!(heavy.compute_coherence(&dims(1.0, 1.0, 1.0, 1.0, 1.0, 1.0)), 1.0);

        let engine = CoherenceEngine::new();
        let broken = dims(f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0);
        let coherence = engine.compute_coherence(&broken);
        assert_eq!(coherence, 0.0);
        assert_eq!(engine.decide(coherence, &broken), Decision::Hold);
    }

    #[test]
    fn test_phase_angle_range() {
        let engine = CoherenceEngine::new();
        assert_eq!(engine.phase_angle(&dims(1.0, 0.0, 0.0, 0.0, 0.0, 0.0)), 0.0);
        assert!((engine.phase_angle(&dims(0.0, 0.0, 1.0, 0.0, 0.0, 0.0)) - 90.0).abs() < 1e-9);
        assert!((engine.phase_angle(&dims(0.0, 0.0, -1.0, 0.0, 0.0, 0.0)) - 270.0).abs() < 1e-9);
        assert_eq!(engine.phase_angle(&dims(1.0, 0.0, -1e-300, 0.0, 0.0, 0.0)), 0.0);
        assert_eq!(engine.phase_angle(&EigenstateDimensions::default()), 0.0);

        for i in -20..=20 {
            for j in -20..=20 {
                let (price, momentum) = (i as f64 / 20.0, j as f64 / 20.0);
                let angle = engine.phase_angle(&dims(price, 0.0, momentum, 0.0, 0.0, 0.0));
                assert!((0.0..360.0).contains(&angle), "{angle}");
            }
        }
    }

    #[test]
    fn test_evaluate_normalizes_asset_symbol() {
        let engine = CoherenceEngine::new();
        let eigenstate = engine.evaluate(" btc ", 42, dims(0.9, 0.5, 0.8, 0.7, 0.1, 0.1), None);

        assert_eq!(eigenstate.asset, "BTC");
        assert_eq!(eigenstate.timestamp, 42);
        assert_eq!(eigenstate.decision, Decision::Buy);
        assert!(eigenstate.truth_certificate.is_none());
    }

    #[test]
    fn test_snapshot_evaluation_is_deterministic() {
        let engine = CoherenceEngine::new();
        let normalizer = DimensionNormalizer::new();
        let snapshot = MarketSnapshot::new(97_000.0, 3.2e10, 4.2, 1.9e12);

        let a = engine.evaluate_snapshot(&normalizer, "BTC", &snapshot, 1_767_225_600_000);
        let b = engine.evaluate_snapshot(&normalizer, "BTC", &snapshot, 1_767_225_600_000);
        assert_eq!(a, b);
        assert_eq!(a.coherence.to_bits(), b.coherence.to_bits());
        assert!((-1.0..=1.0).contains(&a.coherence));
    }

    #[test]
    fn test_config_validation() {
        assert!(CoherenceConfig::default().validate().is_ok());

        let unbalanced = CoherenceConfig {
            weights: DimensionWeights {
                spatial: 0.2,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            unbalanced.validate(),
            Err(EigenstateError::InvalidConfig { field: "weights", .. })
        ));

        let inverted = CoherenceConfig {
            buy_threshold: -0.5,
            sell_threshold: 0.5,
            ..Default::default()
        };
        let err = inverted.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid sell_threshold: must be below buy_threshold");
    }
}
