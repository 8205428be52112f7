//! Reduction of an NDVI grid to summary statistics.

use crate::models::NdviStatistics;

use ndarray::ArrayView2;
use ndarray_stats::QuantileExt;

/// Raw summary statistics, which may contain non-finite values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

impl Summary {
    /// Compute summary statistics over every value in `grid`.
    ///
    /// No values are masked. The standard deviation is the population standard deviation.
    /// Every statistic of an empty grid is NaN.
    pub fn of(grid: ArrayView2<f64>) -> Self {
        Summary {
            min: grid.min().copied().unwrap_or(f64::NAN),
            max: grid.max().copied().unwrap_or(f64::NAN),
            mean: grid.mean().unwrap_or(f64::NAN),
            median: median(grid),
            std: if grid.is_empty() {
                f64::NAN
            } else {
                grid.std(0.0)
            },
        }
    }

    /// Replace each non-finite statistic with a missing value.
    pub fn sanitize(self) -> NdviStatistics {
        NdviStatistics {
            min: finite(self.min),
            max: finite(self.max),
            mean: finite(self.mean),
            median: finite(self.median),
            std: finite(self.std),
        }
    }
}

/// Returns `Some(value)` if `value` is neither NaN nor infinite.
fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Median of all values, averaging the two middle values for an even count.
///
/// NaN values sort last. Returns NaN for an empty grid.
fn median(grid: ArrayView2<f64>) -> f64 {
    let mut values = grid.iter().copied().collect::<Vec<f64>>();
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    let mid = n / 2;
    let (below, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        upper
    } else {
        // The lower middle value is the largest value below the partition point.
        let lower = below
            .iter()
            .copied()
            .max_by(f64::total_cmp)
            .unwrap_or(upper);
        (lower + upper) / 2.0
    }
}
