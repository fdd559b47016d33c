//! Market data sources.
//!
//! A [`FeedSource`] is an external collaborator (exchange API, price
//! aggregator, on-chain oracle). The service only needs one quote per asset
//! per call; transport, authentication and retry live behind the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use honest_truth::{Clock, OracleFeed, SystemClock};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Error types for source fetches.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// Source is not available
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// Request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Fetch exceeded the configured timeout
    #[error("Source {source_id} timed out after {timeout_ms}ms")]
    Timeout { source_id: String, timeout_ms: u64 },

    /// Source answered with an unusable quote
    #[error("Invalid quote from {source_id}: {reason}")]
    InvalidQuote { source_id: String, reason: String },
}

/// One source's view of an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct MarketQuote {
    /// Source identifier
    pub source: String,
    /// Asset symbol
    pub asset: String,
    pub price: f64,
    /// 24h traded volume
    pub volume_24h: f64,
    /// 24h price change in percent
    pub price_change_24h: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Observation time (epoch ms)
    pub timestamp: i64,
}

impl MarketQuote {
    /// Price feed for consensus.
    pub fn to_feed(&self) -> OracleFeed {
        OracleFeed::price(&self.source, &self.asset, self.price, self.timestamp)
    }

    /// Check that the quote answers the question that was asked.
    pub fn check(&self, requested_asset: &str) -> Result<(), SourceError> {
        if !self.asset.trim().eq_ignore_ascii_case(requested_asset) {
            return Err(SourceError::InvalidQuote {
                source_id: self.source.clone(),
                reason: format!("asked for {requested_asset}, got {}", self.asset),
            });
        }
        if !self.price.is_finite() {
            return Err(SourceError::InvalidQuote {
                source_id: self.source.clone(),
                reason: "non-finite price".to_string(),
            });
        }
        Ok(())
    }
}

/// Core trait for market data sources.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Get the source identifier.
    fn id(&self) -> &str;

    /// Fetch the current quote for `asset` (upper-case symbol).
    async fn fetch(&self, asset: &str) -> Result<MarketQuote, SourceError>;
}

/// Quote fields served by [`MockFeedSource`].
#[derive(Debug, Clone, Copy)]
struct MockQuote {
    price: f64,
    volume_24h: f64,
    price_change_24h: f64,
    market_cap: Option<f64>,
    age_ms: i64,
}

/// Mock source for testing.
///
/// Serves a configurable quote stamped with its clock, with optional latency
/// and an availability switch.
pub struct MockFeedSource {
    source_id: String,
    quote: RwLock<MockQuote>,
    latency: Option<Duration>,
    available: AtomicBool,
    call_count: AtomicU32,
    clock: Arc<dyn Clock>,
}

impl MockFeedSource {
    /// Create a new mock source quoting `price`.
    pub fn new(source_id: impl Into<String>, price: f64) -> Self {
        Self {
            source_id: source_id.into(),
            quote: RwLock::new(MockQuote {
                price,
                volume_24h: 1e8,
                price_change_24h: 0.0,
                market_cap: None,
                age_ms: 0,
            }),
            latency: None,
            available: AtomicBool::new(true),
            call_count: AtomicU32::new(0),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set 24h volume and change.
    pub fn with_market(mut self, volume_24h: f64, price_change_24h: f64) -> Self {
        let quote = self.quote.get_mut();
        quote.volume_24h = volume_24h;
        quote.price_change_24h = price_change_24h;
        self
    }

    /// Set market cap.
    pub fn with_market_cap(mut self, market_cap: f64) -> Self {
        self.quote.get_mut().market_cap = Some(market_cap);
        self
    }

    /// Stamp quotes `age_ms` in the past.
    pub fn with_age(mut self, age_ms: i64) -> Self {
        self.quote.get_mut().age_ms = age_ms;
        self
    }

    /// Delay every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Replace the clock used for timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Toggle availability on a shared source.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Change the quoted price and 24h change.
    pub async fn set_price(&self, price: f64, price_change_24h: f64) {
        let mut quote = self.quote.write().await;
        quote.price = price;
        quote.price_change_24h = price_change_24h;
    }

    /// Get the number of times fetch was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call count.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    async fn fetch(&self, asset: &str) -> Result<MarketQuote, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable(format!("{} disabled", self.source_id)));
        }

        let quote = *self.quote.read().await;
        Ok(MarketQuote {
            source: self.source_id.clone(),
            asset: asset.to_uppercase(),
            price: quote.price,
            volume_24h: quote.volume_24h,
            price_change_24h: quote.price_change_24h,
            market_cap: quote.market_cap,
            timestamp: self.clock.now_millis() - quote.age_ms,
        })
    }
}
