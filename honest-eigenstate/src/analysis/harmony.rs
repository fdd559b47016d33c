//! Golden-ratio harmony of a histogram.

use serde::{Deserialize, Serialize};

/// Ratio the bisections are measured against.
pub const GOLDEN_RATIO: f64 = 1.618;

/// Default number of bisections.
pub const DEFAULT_CONSTRUCTIONS: usize = 5;

/// One golden-ratio bisection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Construction {
    pub left_sum: f64,
    pub right_sum: f64,
    /// `|left / right - φ|`, with a zero right side read as proportion 0
    pub deviation: f64,
}

/// Bisection trace and overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonyAnalysis {
    pub constructions: Vec<Construction>,
    /// `1 / (1 + mean deviation)`, in (0, 1]; 0 for an empty histogram
    pub harmony: f64,
}

/// Repeatedly cut the histogram at `len / φ`, keeping the heavier side.
///
/// Stops after `n_constructions` cuts or once fewer than two bars remain.
pub fn golden_harmony(histogram: &[f64], n_constructions: usize) -> HarmonyAnalysis {
    if histogram.is_empty() {
        return HarmonyAnalysis {
            constructions: Vec::new(),
            harmony: 0.0,
        };
    }

    let mut constructions = Vec::with_capacity(n_constructions);
    let mut segment = histogram;

    for _ in 0..n_constructions {
        let cut = ((segment.len() as f64 / GOLDEN_RATIO) as usize).min(segment.len() - 1);
        let (left, right) = segment.split_at(cut);
        let left_sum: f64 = left.iter().sum();
        let right_sum: f64 = right.iter().sum();

        let proportion = if right_sum != 0.0 { left_sum / right_sum } else { 0.0 };
        constructions.push(Construction {
            left_sum,
            right_sum,
            deviation: (proportion - GOLDEN_RATIO).abs(),
        });

        segment = if left_sum > right_sum { left } else { right };
        if segment.len() < 2 {
            break;
        }
    }

    let mean_deviation = if constructions.is_empty() {
        GOLDEN_RATIO
    } else {
        constructions.iter().map(|c| c.deviation).sum::<f64>() / constructions.len() as f64
    };
    let harmony = 1.0 / (1.0 + mean_deviation);

    HarmonyAnalysis {
        constructions,
        harmony: if harmony.is_finite() { harmony } else { 0.0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram_has_no_harmony() {
        let analysis = golden_harmony(&[], DEFAULT_CONSTRUCTIONS);
        assert_eq!(analysis.harmony, 0.0);
        assert!(analysis.constructions.is_empty());
    }

    #[test]
    fn test_first_cut_of_reference_histogram() {
        let hist = [0.5, 0.8, 1.2, 0.9, -0.3, -0.7, 0.4];
        let analysis = golden_harmony(&hist, DEFAULT_CONSTRUCTIONS);

        // 7 / 1.618 -> 4
        let first = analysis.constructions[0];
        assert!((first.left_sum - 3.4).abs() < 1e-9);
        assert!((first.right_sum + 0.6).abs() < 1e-9);
        assert!(analysis.harmony > 0.0 && analysis.harmony <= 1.0);
    }

    #[test]
    fn test_perfect_golden_split() {
        // left 1.618, right 1.0 on the first cut, then a single bar remains
        let analysis = golden_harmony(&[1.618, 1.0], 1);
        assert_eq!(analysis.constructions.len(), 1);
        assert!((analysis.harmony - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_bar_stops_after_one_cut() {
        let analysis = golden_harmony(&[2.0], DEFAULT_CONSTRUCTIONS);
        assert_eq!(analysis.constructions.len(), 1);
        assert_eq!(analysis.constructions[0].left_sum, 0.0);
        assert_eq!(analysis.constructions[0].right_sum, 2.0);
        assert!((analysis.harmony - 1.0 / (1.0 + GOLDEN_RATIO)).abs() < 1e-12);
    }
}
