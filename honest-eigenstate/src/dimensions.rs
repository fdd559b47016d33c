//! Dimension normalization.
//!
//! Every real dimension goes through `tanh` after scaling, so typical
//! magnitudes land mid-range and extremes saturate smoothly towards ±1
//! instead of being clipped.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::types::{EigenstateDimensions, EigenstateError, Result};

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Raw market fields for one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Current price
    pub price: f64,
    /// 24h traded volume (quote currency)
    pub volume_24h: f64,
    /// 24h price change in percent
    pub price_change_24h: f64,
    /// Market capitalization, 0 when unknown
    #[serde(default)]
    pub market_cap: f64,
    /// Price 24h ago, 0 when unknown
    #[serde(default)]
    pub reference_price: f64,
}

impl MarketSnapshot {
    /// Create a snapshot without a reference price.
    pub fn new(price: f64, volume_24h: f64, price_change_24h: f64, market_cap: f64) -> Self {
        Self {
            price,
            volume_24h,
            price_change_24h,
            market_cap,
            reference_price: 0.0,
        }
    }

    /// Replace the price (e.g. with a certified consensus value).
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Set the price 24h ago.
    pub fn with_reference_price(mut self, reference_price: f64) -> Self {
        self.reference_price = reference_price;
        self
    }

    /// Percent move from the reference price to the current price.
    ///
    /// Falls back to the reported 24h change when either price is not
    /// positive.
    pub fn effective_change(&self) -> f64 {
        if self.price > 0.0 && self.reference_price > 0.0 {
            (self.price / self.reference_price - 1.0) * 100.0
        } else {
            self.price_change_24h
        }
    }

    /// Copy with non-finite fields zeroed and volume/market cap clipped at 0.
    pub fn sanitized(&self) -> Self {
        Self {
            price: finite_or_zero(self.price),
            volume_24h: finite_or_zero(self.volume_24h).max(0.0),
            price_change_24h: finite_or_zero(self.price_change_24h),
            market_cap: finite_or_zero(self.market_cap).max(0.0),
            reference_price: finite_or_zero(self.reference_price).max(0.0),
        }
    }
}

/// Normalizer scaling constants.
///
/// These are tuning knobs, not invariants; the output stays in [-1, 1]
/// for any positive divisors and periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Percent change that maps to tanh(1) on the price dimension
    pub price_change_divisor: f64,
    /// Percent change that maps to tanh(1) on the momentum dimension at unit turnover weight
    pub momentum_divisor: f64,
    /// log10(volume) that maps to 0 on the volume dimension
    pub volume_log_center: f64,
    /// Decades of volume per unit of tanh input
    pub volume_log_scale: f64,
    /// Period of the temporal oscillation (ms)
    pub temporal_period_ms: i64,
    /// Period of the spatial oscillation (ms)
    pub spatial_period_ms: i64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            price_change_divisor: 10.0,
            momentum_divisor: 5.0,
            volume_log_center: 8.0, // $100M daily volume
            volume_log_scale: 2.0,
            temporal_period_ms: 4 * HOUR_MS,
            spatial_period_ms: 6 * HOUR_MS,
        }
    }
}

impl NormalizerConfig {
    /// Check that divisors and periods are usable.
    pub fn validate(&self) -> Result<()> {
        let divisors = [
            ("price_change_divisor", self.price_change_divisor),
            ("momentum_divisor", self.momentum_divisor),
            ("volume_log_scale", self.volume_log_scale),
        ];
        for (name, value) in divisors {
            if !(value.is_finite() && value > 0.0) {
                let reason = format!("must be positive, got {value}");
                return Err(EigenstateError::invalid(name, reason));
            }
        }
        if !self.volume_log_center.is_finite() {
            return Err(EigenstateError::invalid("volume_log_center", "must be finite"));
        }
        for (name, period) in [
            ("temporal_period_ms", self.temporal_period_ms),
            ("spatial_period_ms", self.spatial_period_ms),
        ] {
            if period <= 0 {
                let reason = format!("must be positive, got {period}");
                return Err(EigenstateError::invalid(name, reason));
            }
        }
        Ok(())
    }
}

/// Maps market snapshots to bounded dimensions.
#[derive(Debug, Clone, Default)]
pub struct DimensionNormalizer {
    config: NormalizerConfig,
}

impl DimensionNormalizer {
    /// Create a normalizer with default constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration.
    pub fn with_config(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a snapshot taken at `timestamp_ms`.
    ///
    /// The price dimension measures the current price against the reference
    /// price when both are known, and the reported 24h change otherwise.
    /// The timestamp seeds the temporal and spatial oscillations, so equal
    /// inputs always give bit-identical dimensions.
    pub fn normalize(&self, snapshot: &MarketSnapshot, timestamp_ms: i64) -> EigenstateDimensions {
        let s = snapshot.sanitized();

        let price = (s.effective_change() / self.config.price_change_divisor).tanh();
        let volume = self.volume_dimension(s.volume_24h);
        let momentum = self.momentum_dimension(&s);

        EigenstateDimensions {
            price,
            volume,
            momentum,
            sentiment: (price + momentum) / 2.0,
            temporal: oscillation(timestamp_ms, self.config.temporal_period_ms).sin(),
            spatial: oscillation(timestamp_ms, self.config.spatial_period_ms).cos(),
        }
    }

    fn volume_dimension(&self, volume: f64) -> f64 {
        let decades = (1.0 + volume).log10();
        ((decades - self.config.volume_log_center) / self.config.volume_log_scale).tanh()
    }

    /// Price change amplified by turnover (volume / market cap, capped at 1).
    fn momentum_dimension(&self, s: &MarketSnapshot) -> f64 {
        let turnover = if s.market_cap > 0.0 {
            (s.volume_24h / s.market_cap).min(1.0)
        } else {
            0.0
        };
        let weight = 0.5 + turnover;
        (s.price_change_24h / self.config.momentum_divisor * weight).tanh()
    }
}

/// Phase of `timestamp_ms` within `period_ms`, in radians.
fn oscillation(timestamp_ms: i64, period_ms: i64) -> f64 {
    let period = period_ms.max(1);
    TAU * timestamp_ms.rem_euclid(period) as f64 / period as f64
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
