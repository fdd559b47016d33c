//! Configuration for the oracle service.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use honest_eigenstate::{CoherenceConfig, NormalizerConfig};
use honest_truth::{CertificateConfig, VerifierConfig};

use crate::types::{OracleError, Result};

/// Complete oracle configuration.
///
/// Every section is optional in YAML and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Feed freshness
    pub verifier: VerifierConfig,
    /// Certificate thresholds
    pub certificate: CertificateConfig,
    /// Dimension scaling
    pub normalizer: NormalizerConfig,
    /// Coherence mode, weights and decision thresholds
    pub coherence: CoherenceConfig,
    /// Service-level settings
    pub service: ServiceConfig,
}

impl OracleConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.verifier.freshness_window_ms <= 0 {
            return Err(OracleError::Config(
                "verifier.freshness_window_ms must be positive".to_string(),
            ));
        }

        let cert = &self.certificate;
        if cert.min_sources == 0 {
            return Err(OracleError::Config(
                "certificate.min_sources must be at least 1".to_string(),
            ));
        }
        if !(cert.outlier_threshold.is_finite() && cert.outlier_threshold > 0.0) {
            return Err(OracleError::Config(format!(
                "certificate.outlier_threshold must be positive, got {}",
                cert.outlier_threshold
            )));
        }
        if !(0.0..=1.0).contains(&cert.min_consistency) {
            return Err(OracleError::Config(format!(
                "certificate.min_consistency must lie in [0, 1], got {}",
                cert.min_consistency
            )));
        }
        if cert.max_age_ms <= 0 || cert.max_sync_range_ms <= 0 {
            return Err(OracleError::Config(
                "certificate age limits must be positive".to_string(),
            ));
        }

        self.normalizer
            .validate()
            .map_err(|e| OracleError::Config(format!("normalizer: {e}")))?;
        self.coherence
            .validate()
            .map_err(|e| OracleError::Config(format!("coherence: {e}")))?;
        self.service.validate()
    }
}

/// Service-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// How long a computed eigenstate is served from cache (ms)
    pub cache_ttl_ms: u64,
    /// Upper bound on a single source fetch (ms)
    pub fetch_timeout_ms: u64,
    /// Consensus prices kept per asset for momentum analysis
    pub max_price_history: usize,
    /// Records kept in the in-memory log
    pub max_records: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 5_000,
            fetch_timeout_ms: 5_000,
            max_price_history: 500,
            max_records: 10_000,
        }
    }
}

impl ServiceConfig {
    /// Fetch timeout as a duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.cache_ttl_ms == 0 {
            return Err(OracleError::Config("service.cache_ttl_ms must be non-zero".to_string()));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(OracleError::Config(
                "service.fetch_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.max_price_history == 0 || self.max_records == 0 {
            return Err(OracleError::Config(
                "service history and record limits must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use honest_eigenstate::{CoherenceMode, DecisionRule};

    #[test]
    fn test_defaults() {
        let config = OracleConfig::default();
        assert_eq!(config.verifier.freshness_window_ms, 60_000);
        assert_eq!(config.certificate.min_sources, 2);
        assert_eq!(config.service.cache_ttl_ms, 5_000);
        assert_eq!(config.service.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.coherence.mode, CoherenceMode::Weighted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = OracleConfig::default();
        config.service.cache_ttl_ms = 1_000;
        config.coherence.rule = DecisionRule::CoherenceOnly;

        let yaml = config.to_yaml().unwrap();
        let parsed = OracleConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.service.cache_ttl_ms, 1_000);
        assert_eq!(parsed.coherence.rule, DecisionRule::CoherenceOnly);
        assert_eq!(parsed.coherence.weights, config.coherence.weights);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
service:
  fetch_timeout_ms: 250
coherence:
  mode: alignment
"#;
        let config = OracleConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.service.fetch_timeout_ms, 250);
        assert_eq!(config.service.cache_ttl_ms, 5_000);
        assert_eq!(config.coherence.mode, CoherenceMode::Alignment);
        assert_eq!(config.coherence.buy_threshold, 0.5);
        assert_eq!(config.certificate.min_sources, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = OracleConfig::default();
        config.coherence.weights.price = 0.5;
        assert!(matches!(config.validate(), Err(OracleError::Config(_))));

        let mut config = OracleConfig::default();
        config.service.fetch_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(OracleError::Config(_))));

        let mut config = OracleConfig::default();
        config.normalizer.temporal_period_ms = -1;
        assert!(matches!(config.validate(), Err(OracleError::Config(_))));

        let mut config = OracleConfig::default();
        config.coherence.momentum_threshold = 1.5;
        assert!(matches!(config.validate(), Err(OracleError::Config(_))));
    }
}
