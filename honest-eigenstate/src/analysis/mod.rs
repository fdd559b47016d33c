//! Momentum analysis over a price history.
//!
//! ```text
//! prices ──► MACD histogram ──┬──► slice_histogram ──► exhaustion
//!                             └──► golden_harmony  ──► harmony
//! ```
//!
//! Exhaustion is the value attached to metrics and ledger records.

pub mod exhaustion;
pub mod harmony;
pub mod macd;

use serde::{Deserialize, Serialize};

pub use exhaustion::{slice_histogram, HistogramSlice, SliceAnalysis, DEFAULT_SLICES};
pub use harmony::{
    golden_harmony, Construction, HarmonyAnalysis, DEFAULT_CONSTRUCTIONS, GOLDEN_RATIO,
};
pub use macd::{ema, macd_histogram, MacdConfig};

/// Summary of momentum over a price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumAnalysis {
    pub histogram: Vec<f64>,
    /// 0.0 - 1.0
    pub exhaustion: f64,
    /// 0.0 - 1.0
    pub harmony: f64,
    /// Net signed histogram area
    pub net_force: f64,
}

/// Analyze prices with default periods, slices and constructions.
///
/// Returns `None` when the history is too short for a histogram.
pub fn analyze_prices(prices: &[f64]) -> Option<MomentumAnalysis> {
    analyze_prices_with(prices, &MacdConfig::default())
}

/// Analyze prices with custom MACD periods.
pub fn analyze_prices_with(prices: &[f64], config: &MacdConfig) -> Option<MomentumAnalysis> {
    let histogram = macd_histogram(prices, config);
    if histogram.is_empty() {
        return None;
    }

    let slices = slice_histogram(&histogram, DEFAULT_SLICES);
    let harmony = golden_harmony(&histogram, DEFAULT_CONSTRUCTIONS);

    Some(MomentumAnalysis {
        exhaustion: slices.exhaustion,
        harmony: harmony.harmony,
        net_force: slices.net_force,
        histogram,
    })
}
