//! Exponential moving averages and the MACD histogram.

use serde::{Deserialize, Serialize};

/// MACD periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

impl MacdConfig {
    /// Prices needed before the first histogram value exists.
    pub fn min_prices(&self) -> usize {
        (self.slow_period.max(self.fast_period) + self.signal_period).saturating_sub(1)
    }
}

/// SMA-seeded exponential moving average.
///
/// Only seeded values are returned: `data.len() - period + 1` of them, the
/// first being the simple mean of the first `period` inputs.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let seed = data[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(data.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for value in &data[period..] {
        prev = (value - prev) * multiplier + prev;
        out.push(prev);
    }
    out
}

/// MACD histogram (`MACD line - signal line`) over the seeded window.
pub fn macd_histogram(prices: &[f64], config: &MacdConfig) -> Vec<f64> {
    let fast = ema(prices, config.fast_period);
    let slow = ema(prices, config.slow_period);
    if fast.is_empty() || slow.is_empty() {
        return Vec::new();
    }

    // Both series end at the last price; pair them from the back.
    let len = fast.len().min(slow.len());
    let line: Vec<f64> = fast[fast.len() - len..]
        .iter()
        .zip(&slow[slow.len() - len..])
        .map(|(f, s)| f - s)
        .collect();

    let signal = ema(&line, config.signal_period);
    line[line.len() - signal.len()..]
        .iter()
        .zip(&signal)
        .map(|(l, s)| l - s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_is_seeded_with_sma() {
        let values = ema(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 2.0);
        // multiplier 0.5
        assert_eq!(values[1], 3.0);
        assert_eq!(values[2], 4.0);
    }

    #[test]
    fn test_ema_too_short() {
        assert!(ema(&[1.0, 2.0], 3).is_empty());
        assert!(ema(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_flat_prices_give_zero_histogram() {
        let prices = vec![100.0; 60];
        let hist = macd_histogram(&prices, &MacdConfig::default());
        assert_eq!(hist.len(), 60 - 33);
        assert!(hist.iter().all(|h| h.abs() < 1e-9));
    }

    #[test]
    fn test_histogram_length_threshold() {
        let config = MacdConfig::default();
        assert_eq!(config.min_prices(), 34);

        let rising: Vec<f64> = (0..33).map(|i| 100.0 + i as f64).collect();
        assert!(macd_histogram(&rising, &config).is_empty());

        let rising: Vec<f64> = (0..34).map(|i| 100.0 + i as f64).collect();
        assert_eq!(macd_histogram(&rising, &config).len(), 1);
    }

    #[test]
    fn test_accelerating_rally_has_positive_histogram() {
        let prices: Vec<f64> = (0..80).map(|i| 100.0 + 0.05 * (i * i) as f64).collect();
        let hist = macd_histogram(&prices, &MacdConfig::default());
        assert!(!hist.is_empty());
        assert!(*hist.last().unwrap() > 0.0);
    }
}
