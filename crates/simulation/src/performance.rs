//! Portfolio value series produced by strategy evaluation.

use serde::Serialize;

/// Portfolio values aligned step-by-step with a price path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSeries {
    values: Vec<f64>,
    liquidated_at: Option<usize>,
}

impl PerformanceSeries {
    /// Creates a series. `liquidated_at` marks the step at which the
    /// position was forcibly closed, if it was.
    #[must_use]
    pub fn new(values: Vec<f64>, liquidated_at: Option<usize>) -> Self {
        Self {
            values,
            liquidated_at,
        }
    }

    /// The portfolio values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at the last step.
    #[must_use]
    pub fn final_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Step at which the position was liquidated.
    #[must_use]
    pub fn liquidated_at(&self) -> Option<usize> {
        self.liquidated_at
    }

    /// Whether the position hit its liquidation threshold.
    #[must_use]
    pub fn is_liquidated(&self) -> bool {
        self.liquidated_at.is_some()
    }

    /// Largest peak-to-trough decline as a fraction of the peak, in [0, 1].
    ///
    /// Steps where the running peak is not positive contribute nothing.
    #[must_use]
    pub fn max_drawdown(&self) -> f64 {
        let mut peak = f64::NEG_INFINITY;
        let mut max_drawdown = 0.0_f64;

        for &value in &self.values {
            peak = peak.max(value);
            if peak > 0.0 {
                let drawdown = ((peak - value) / peak).clamp(0.0, 1.0);
                max_drawdown = max_drawdown.max(drawdown);
            }
        }

        max_drawdown
    }

    /// Simple return of the final value over `initial_capital`.
    #[must_use]
    pub fn total_return(&self, initial_capital: f64) -> Option<f64> {
        self.final_value()
            .map(|value| (value - initial_capital) / initial_capital)
    }
}
