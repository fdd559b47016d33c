//! Oracle feeds and single-feed verification.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Default freshness window for a feed (one minute).
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 60_000;

/// A single observation reported by an external data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct OracleFeed {
    /// Identifier of the reporting source (e.g. "coingecko")
    pub source: String,
    /// Asset symbol (e.g. "BTC")
    pub asset: String,
    /// Metric name (e.g. "price")
    pub metric: String,
    /// Observed value
    pub value: f64,
    /// Observation time in epoch milliseconds
    pub timestamp: i64,
    /// Optional source signature over the observation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl OracleFeed {
    /// Create an unsigned feed.
    pub fn new(
        source: impl Into<String>,
        asset: impl Into<String>,
        metric: impl Into<String>,
        value: f64,
        timestamp: i64,
    ) -> Self {
        Self {
            source: source.into(),
            asset: asset.into(),
            metric: metric.into(),
            value,
            timestamp,
            signature: None,
        }
    }

    /// Shorthand for a `price` feed.
    pub fn price(
        source: impl Into<String>,
        asset: impl Into<String>,
        value: f64,
        timestamp: i64,
    ) -> Self {
        Self::new(source, asset, "price", value, timestamp)
    }

    /// Attach a signature.
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// Verifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// A feed is fresh while `now - timestamp` is strictly below this window
    pub freshness_window_ms: i64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
        }
    }
}

/// Validates individual feeds.
///
/// Verification never fails loudly: a malformed or stale feed simply does
/// not count. Callers decide whether to drop it or look for a fresher one.
#[derive(Clone)]
pub struct FeedVerifier {
    config: VerifierConfig,
    clock: Arc<dyn Clock>,
}

impl FeedVerifier {
    /// Create a verifier with default configuration and the system clock.
    pub fn new() -> Self {
        Self::with_config(VerifierConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: VerifierConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current time according to this verifier's clock.
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Get the configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a feed against the current time.
    pub fn verify(&self, feed: &OracleFeed) -> bool {
        self.verify_at(feed, self.now_millis())
    }

    /// Verify a feed against an explicit `now`.
    pub fn verify_at(&self, feed: &OracleFeed, now_millis: i64) -> bool {
        match self.rejection_reason(feed, now_millis) {
            None => true,
            Some(reason) => {
                debug!(
                    source = %feed.source,
                    asset = %feed.asset,
                    metric = %feed.metric,
                    reason,
                    "Feed rejected"
                );
                false
            }
        }
    }

    /// Keep only the feeds that pass verification, preserving order.
    pub fn retain_verified<'a>(
        &self,
        feeds: &'a [OracleFeed],
        now_millis: i64,
    ) -> Vec<&'a OracleFeed> {
        feeds
            .iter()
            .filter(|feed| self.verify_at(feed, now_millis))
            .collect()
    }

    fn rejection_reason(&self, feed: &OracleFeed, now_millis: i64) -> Option<&'static str> {
        if feed.source.trim().is_empty() {
            return Some("missing source");
        }
        if feed.asset.trim().is_empty() {
            return Some("missing asset");
        }
        if feed.metric.trim().is_empty() {
            return Some("missing metric");
        }
        if !feed.value.is_finite() || feed.value <= 0.0 {
            return Some("value must be finite and positive");
        }
        if now_millis.saturating_sub(feed.timestamp) >= self.config.freshness_window_ms {
            return Some("stale");
        }
        None
    }
}

impl Default for FeedVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FeedVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const NOW: i64 = 1_767_225_600_000;

    fn verifier() -> FeedVerifier {
        FeedVerifier::new().with_clock(Arc::new(ManualClock::new(NOW)))
    }

    #[test]
    fn test_fresh_feed_is_valid() {
        let feed = OracleFeed::price("binance", "BTC", 97_000.0, NOW - 1_000);
        assert!(verifier().verify(&feed));
    }

    #[test]
    fn test_stale_feed_is_rejected_regardless_of_value() {
        let feed = OracleFeed::price("binance", "BTC", 97_000.0, NOW - 120_000);
        assert!(!verifier().verify(&feed));
    }

    #[test]
    fn test_freshness_window_is_exclusive() {
        let v = verifier();
        assert!(v.verify(&OracleFeed::price("a", "BTC", 1.0, NOW - 59_999)));
        assert!(!v.verify(&OracleFeed::price("a", "BTC", 1.0, NOW - 60_000)));
    }

    #[test]
    fn test_non_positive_and_non_finite_values_are_rejected() {
        let v = verifier();
        for value in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let feed = OracleFeed::price("a", "BTC", value, NOW);
            assert!(!v.verify(&feed), "value {value} should be rejected");
        }
    }

    #[test]
    fn test_identity_fields_are_required() {
        let v = verifier();
        assert!(!v.verify(&OracleFeed::price("", "BTC", 1.0, NOW)));
        assert!(!v.verify(&OracleFeed::price("a", "  ", 1.0, NOW)));
        assert!(!v.verify(&OracleFeed::new("a", "BTC", "", 1.0, NOW)));
    }

    #[test]
    fn test_retain_verified_preserves_order() {
        let feeds = vec![
            OracleFeed::price("a", "BTC", 1.0, NOW),
            OracleFeed::price("b", "BTC", -1.0, NOW),
            OracleFeed::price("c", "BTC", 3.0, NOW - 1),
        ];
        let kept = verifier().retain_verified(&feeds, NOW);
        let sources: Vec<_> = kept.iter().map(|f| f.source.as_str()).collect();
        assert_eq!(sources, vec!["a", "c"]);
    }

    #[test]
    fn test_feed_json_shape() {
        let feed = OracleFeed::price("pyth", "ETH", 3_200.5, NOW).with_signature("sig");
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["metric"], "price");
        assert_eq!(json["signature"], "sig");

        let unsigned = serde_json::to_value(OracleFeed::price("pyth", "ETH", 1.0, NOW)).unwrap();
        assert!(unsigned.get("signature").is_none());
    }
}
