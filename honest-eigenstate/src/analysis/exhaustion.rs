//! Histogram slicing and momentum exhaustion.
//!
//! The histogram is cut into contiguous slices whose summed bars are
//! treated as signed areas. When positive and negative areas cancel, the
//! prevailing move has nothing left behind it:
//!
//! ```text
//! exhaustion = 1 - |positive + negative| / (|positive| + |negative|)
//! ```

use serde::{Deserialize, Serialize};

/// Default slice count.
pub const DEFAULT_SLICES: usize = 20;

/// One contiguous slice of the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramSlice {
    /// Index of the first bar in the slice
    pub start: usize,
    /// Sum of the bars in the slice
    pub area: f64,
}

/// Result of slicing a histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceAnalysis {
    pub slices: Vec<HistogramSlice>,
    pub total_area: f64,
    pub positive_area: f64,
    /// Sum of the non-positive slice areas (≤ 0)
    pub negative_area: f64,
    pub net_force: f64,
    /// 0.0 = one-sided momentum, 1.0 = fully cancelled
    pub exhaustion: f64,
}

impl SliceAnalysis {
    fn empty() -> Self {
        Self {
            slices: Vec::new(),
            total_area: 0.0,
            positive_area: 0.0,
            negative_area: 0.0,
            net_force: 0.0,
            exhaustion: 1.0,
        }
    }
}

/// Slice `histogram` into at most `n_slices` parts and measure exhaustion.
///
/// The slice count is capped at the histogram length; the last slice takes
/// any remainder. Non-finite bars count as zero.
pub fn slice_histogram(histogram: &[f64], n_slices: usize) -> SliceAnalysis {
    let n = n_slices.min(histogram.len());
    if n == 0 {
        return SliceAnalysis::empty();
    }

    let width = histogram.len() as f64 / n as f64;
    let mut slices = Vec::with_capacity(n);
    let mut positive_area = 0.0;
    let mut negative_area = 0.0;

    for i in 0..n {
        let start = (i as f64 * width) as usize;
        let end = if i == n - 1 {
            histogram.len()
        } else {
            ((i + 1) as f64 * width) as usize
        };
        if start >= end {
            continue;
        }

        let area: f64 = histogram[start..end].iter().filter(|v| v.is_finite()).sum();
        slices.push(HistogramSlice { start, area });

        if area > 0.0 {
            positive_area += area;
        } else {
            negative_area += area;
        }
    }

    let net_force = positive_area + negative_area;
    let magnitude = positive_area - negative_area;
    let exhaustion = if magnitude > 0.0 {
        (1.0 - net_force.abs() / magnitude).clamp(0.0, 1.0)
    } else {
        1.0
    };

    SliceAnalysis {
        slices,
        total_area: net_force,
        positive_area,
        negative_area,
        net_force,
        exhaustion,
    }
}

/// Exhaustion of `histogram` with [`DEFAULT_SLICES`].
pub fn exhaustion(histogram: &[f64]) -> f64 {
    slice_histogram(histogram, DEFAULT_SLICES).exhaustion
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram_is_fully_exhausted() {
        let analysis = slice_histogram(&[], DEFAULT_SLICES);
        assert_eq!(analysis.exhaustion, 1.0);
        assert!(analysis.slices.is_empty());
        assert_eq!(exhaustion(&[0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_one_sided_momentum_is_not_exhausted() {
        assert_eq!(exhaustion(&[0.5, 0.8, 1.2, 0.9]), 0.0);
        assert_eq!(exhaustion(&[-0.5, -0.8]), 0.0);
    }

    #[test]
    fn test_cancelling_areas_are_exhausted() {
        assert!((exhaustion(&[1.0, -1.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_five_slice_scenario() {
        let hist = [0.5, 0.8, 1.2, 0.9, -0.3, -0.7, 0.4, 0.1, -0.2, -0.5];
        let analysis = slice_histogram(&hist, 5);

        let starts: Vec<usize> = analysis.slices.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 2, 4, 6, 8]);
        assert!((analysis.positive_area - 3.9).abs() < 1e-9);
        assert!((analysis.negative_area + 1.7).abs() < 1e-9);
        assert!((analysis.net_force - 2.2).abs() < 1e-9);
        assert!((analysis.exhaustion - (1.0 - 2.2 / 5.6)).abs() < 1e-9);
    }

    #[test]
    fn test_slice_count_is_capped_and_remainder_kept() {
        let analysis = slice_histogram(&[1.0, 2.0, 3.0], 20);
        assert_eq!(analysis.slices.len(), 3);

        let analysis = slice_histogram(&[1.0, 1.0, 1.0, 1.0, 1.0], 2);
        assert_eq!(analysis.slices.len(), 2);
        assert_eq!(analysis.slices[1].start, 2);
        assert_eq!(analysis.slices[1].area, 3.0);
    }

    #[test]
    fn test_exhaustion_stays_in_unit_range() {
        let hist: Vec<f64> = (0..97).map(|i| ((i * 37 % 11) as f64 - 5.0) * 0.3).collect();
        for n in [1, 3, 7, 20, 200] {
            let e = slice_histogram(&hist, n).exhaustion;
            assert!((0.0..=1.0).contains(&e), "{n}: {e}");
        }
    }
}
