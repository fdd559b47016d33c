//! Oracle service: per-asset eigenstates from live feed sources.
//!
//! ```text
//! FeedSource* ──join_all + timeout──► MarketQuote* ──► feeds + snapshot
//!                                                          │
//!                       EigenstatePipeline (certify → normalize → score)
//!                                                          │
//!        price history ◄── consensus          Arc<Eigenstate> ──► cache
//!              │                                           │
//!          exhaustion ─────────────────► HonestRecord ──► RecordLog
//! ```
//!
//! Source failures never stall a request: each fetch is bounded by the
//! configured timeout, and when a refresh fails the last cached eigenstate
//! is served (stale) if one exists.

use dashmap::DashMap;
use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

use honest_eigenstate::analysis::analyze_prices;
use honest_eigenstate::{
    CoherenceEngine, DimensionNormalizer, Eigenstate, EigenstatePipeline, MarketSnapshot,
};
use honest_ledger::{HonestRecord, RecordLog};
use honest_truth::consensus::{mean, median};
use honest_truth::{Clock, FeedVerifier, OracleFeed, SystemClock, TruthEngine};

use crate::cache::EigenstateCache;
use crate::config::OracleConfig;
use crate::source::{FeedSource, MarketQuote, SourceError};
use crate::types::{OracleError, Result};

/// The oracle service.
pub struct OracleService {
    config: OracleConfig,
    pipeline: EigenstatePipeline,
    sources: Vec<Arc<dyn FeedSource>>,
    clock: Arc<dyn Clock>,
    cache: EigenstateCache,
    history: DashMap<String, VecDeque<f64>>,
    records: RecordLog,
}

impl OracleService {
    /// Create a service on the system clock.
    pub fn new(config: OracleConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a service on an explicit clock.
    pub fn with_clock(config: OracleConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let verifier =
            FeedVerifier::with_config(config.verifier.clone()).with_clock(Arc::clone(&clock));
        let pipeline = EigenstatePipeline::with_components(
            TruthEngine::with_config(config.certificate.clone(), verifier),
            DimensionNormalizer::with_config(config.normalizer.clone()),
            CoherenceEngine::with_config(config.coherence.clone()),
        );

        Ok(Self {
            cache: EigenstateCache::new(config.service.cache_ttl_ms),
            records: RecordLog::with_max_records(config.service.max_records),
            history: DashMap::new(),
            sources: Vec::new(),
            pipeline,
            clock,
            config,
        })
    }

    /// Add a feed source.
    pub fn with_source(mut self, source: Arc<dyn FeedSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Get the eigenstate cache.
    pub fn cache(&self) -> &EigenstateCache {
        &self.cache
    }

    /// Get the record log.
    pub fn records(&self) -> &RecordLog {
        &self.records
    }

    /// Identifiers of the configured sources.
    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    /// Current eigenstate for `asset`.
    ///
    /// Served from cache while fresh. Otherwise recomputed from all sources;
    /// if that fails, the last cached value is returned even when stale.
    pub async fn eigenstate(&self, asset: &str) -> Result<Arc<Eigenstate>> {
        let asset = normalize_asset(asset)?;
        let now = self.clock.now_millis();

        if let Some(cached) = self.cache.get_fresh(&asset, now) {
            debug!(asset = %asset, "Eigenstate cache hit");
            return Ok(cached);
        }

        match self.refresh(&asset, now).await {
            Ok(eigenstate) => Ok(eigenstate),
            Err(err) => match self.cache.get_any(&asset) {
                Some(stale) => {
                    warn!(
                        asset = %asset,
                        error = %err,
                        age_ms = stale.age_ms(now),
                        "Refresh failed, serving stale eigenstate"
                    );
                    Ok(stale.eigenstate)
                }
                None => Err(err),
            },
        }
    }

    /// Momentum exhaustion over the consensus price history.
    ///
    /// `None` until enough history exists for a MACD histogram.
    pub fn exhaustion(&self, asset: &str) -> Option<f64> {
        let asset = normalize_asset(asset).ok()?;
        let prices: Vec<f64> = self.history.get(&asset)?.iter().copied().collect();
        analyze_prices(&prices).map(|analysis| analysis.exhaustion)
    }

    /// Consensus prices recorded for `asset`, oldest first.
    pub fn price_history(&self, asset: &str) -> Vec<f64> {
        normalize_asset(asset)
            .ok()
            .and_then(|asset| self.history.get(&asset).map(|h| h.iter().copied().collect()))
            .unwrap_or_default()
    }

    /// Seal the current eigenstate into a record and append it to the log.
    ///
    /// Sealing an unchanged eigenstate again (a cache hit) yields the same
    /// record, which is returned without being logged twice.
    pub async fn record(&self, asset: &str) -> Result<HonestRecord> {
        let eigenstate = self.eigenstate(asset).await?;
        let exhaustion = self.exhaustion(asset);

        let record = HonestRecord::from_eigenstate(&eigenstate, exhaustion)?;
        if self.records.get_by_hash(&record.record_hash).await.is_some() {
            debug!(
                asset = %eigenstate.asset,
                record_hash = %record.record_hash,
                "Record already logged"
            );
            return Ok(record);
        }
        self.records.append(record.clone()).await?;

        info!(
            asset = %eigenstate.asset,
            record_hash = %record.record_hash,
            decision = %eigenstate.decision,
            "Eigenstate recorded"
        );

        Ok(record)
    }

    async fn refresh(&self, asset: &str, now: i64) -> Result<Arc<Eigenstate>> {
        let quotes = self.fetch_quotes(asset).await?;
        let feeds: Vec<OracleFeed> = quotes.iter().map(MarketQuote::to_feed).collect();

        // Quotes whose feed fails verification are absent from the snapshot too
        let verifier = self.pipeline.truth.aggregator().verifier();
        let verified: Vec<MarketQuote> = quotes
            .iter()
            .zip(&feeds)
            .filter(|(_, feed)| verifier.verify_at(feed, now))
            .map(|(quote, _)| quote.clone())
            .collect();
        let snapshot = merge_quotes(&verified);

        let (eigenstate, certificate) = self.pipeline.run(asset, &feeds, &snapshot, now)?;
        self.push_price(asset, certificate.consensus_value);

        info!(
            asset = %asset,
            coherence = eigenstate.coherence,
            decision = %eigenstate.decision,
            sources = certificate.source_count,
            consistency = certificate.consistency_score,
            "Eigenstate computed"
        );

        let eigenstate = Arc::new(eigenstate);
        self.cache.insert(asset, Arc::clone(&eigenstate), now);
        Ok(eigenstate)
    }

    /// Fetch every source concurrently; failures are logged and dropped.
    async fn fetch_quotes(&self, asset: &str) -> Result<Vec<MarketQuote>> {
        if self.sources.is_empty() {
            return Err(OracleError::NoData(format!("{asset}: no feed sources configured")));
        }

        let timeout = self.config.service.fetch_timeout();
        let timeout_ms = self.config.service.fetch_timeout_ms;

        let results = join_all(self.sources.iter().map(|source| async move {
            match tokio::time::timeout(timeout, source.fetch(asset)).await {
                Ok(result) => result.and_then(|quote| quote.check(asset).map(|_| quote)),
                Err(_) => Err(SourceError::Timeout {
                    source_id: source.id().to_string(),
                    timeout_ms,
                }),
            }
        }))
        .await;

        let mut quotes = Vec::with_capacity(results.len());
        let mut first_error = None;
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(quote) => quotes.push(quote),
                Err(err) => {
                    warn!(
                        asset = %asset,
                        source = %source.id(),
                        error = %err,
                        "Feed source failed"
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        match (quotes.is_empty(), first_error) {
            (true, Some(err)) => Err(OracleError::Source(err)),
            (true, None) => Err(OracleError::NoData(asset.to_string())),
            (false, _) => Ok(quotes),
        }
    }

    fn push_price(&self, asset: &str, price: f64) {
        let max = self.config.service.max_price_history;
        let mut history = self.history.entry(asset.to_string()).or_default();
        history.push_back(price);
        while history.len() > max {
            history.pop_front();
        }
    }
}

/// Combine per-source quotes into one snapshot.
///
/// Price is left at the median quote; the pipeline replaces it with the
/// certified consensus. The reference price is the median of each source's
/// implied 24h open. Volume is the mean of positive volumes, change and
/// market cap are medians of what sources reported.
pub fn merge_quotes(quotes: &[MarketQuote]) -> MarketSnapshot {
    let prices: Vec<f64> = quotes
        .iter()
        .map(|q| q.price)
        .filter(|p| p.is_finite())
        .collect();
    let opens: Vec<f64> = quotes
        .iter()
        .filter(|q| q.price.is_finite() && q.price > 0.0)
        .filter(|q| q.price_change_24h.is_finite() && q.price_change_24h > -100.0)
        .map(|q| q.price / (1.0 + q.price_change_24h / 100.0))
        .filter(|open| open.is_finite())
        .collect();
    let volumes: Vec<f64> = quotes
        .iter()
        .map(|q| q.volume_24h)
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    let changes: Vec<f64> = quotes
        .iter()
        .map(|q| q.price_change_24h)
        .filter(|c| c.is_finite())
        .collect();
    let caps: Vec<f64> = quotes
        .iter()
        .filter_map(|q| q.market_cap)
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect();

    MarketSnapshot::new(median(&prices), mean(&volumes), median(&changes), median(&caps))
        .with_reference_price(median(&opens))
}

fn normalize_asset(asset: &str) -> Result<String> {
    let asset = asset.trim();
    if asset.is_empty() {
        return Err(OracleError::NoData("empty asset symbol".to_string()));
    }
    Ok(asset.to_uppercase())
}
