use crate::error::{EngineError, Result};
use crate::schema::{Forecast, TimeSeriesPoint};
use crate::utils::{advance_period_end, is_month_key, period_end_date};
use log::debug;
use std::collections::BTreeMap;

/// Hard minimum-sample policy for trend fitting. Not configurable per call:
/// fewer points than this and the fit is noise.
pub const MIN_HISTORY_POINTS: usize = 12;

/// Least-squares trend extrapolation over an aggregated series.
///
/// Fully deterministic: identical inputs always yield identical outputs.
/// This is the property that distinguishes it from the Monte Carlo
/// simulator, which draws from a random source.
pub struct TrendForecaster;

impl TrendForecaster {
    /// Fits `value ~ index` by ordinary least squares and projects the value
    /// at `target_index` (indices are 0-based positions in the series, so
    /// `series.len()` is the first unobserved bucket).
    pub fn forecast(series: &[TimeSeriesPoint], target_index: i64) -> Result<Forecast> {
        if series.len() < MIN_HISTORY_POINTS {
            return Err(EngineError::InsufficientHistory {
                required: MIN_HISTORY_POINTS,
                actual: series.len(),
            });
        }

        let n = series.len() as f64;
        let sum_x: f64 = (0..series.len()).map(|i| i as f64).sum();
        let sum_y: f64 = series.iter().map(|p| p.value).sum();
        let sum_xx: f64 = (0..series.len()).map(|i| (i as f64) * (i as f64)).sum();
        let sum_xy: f64 = series
            .iter()
            .enumerate()
            .map(|(i, p)| i as f64 * p.value)
            .sum();

        let denominator = n * sum_xx - sum_x * sum_x;
        let slope = (n * sum_xy - sum_x * sum_y) / denominator;
        let intercept = (sum_y - slope * sum_x) / n;

        // Revenue/expense values are never negative; clamp the projection.
        let predicted_value = (slope * target_index as f64 + intercept).max(0.0);

        let variance = series
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let fitted = slope * i as f64 + intercept;
                (p.value - fitted).powi(2)
            })
            .sum::<f64>()
            / n;

        let confidence = if predicted_value == 0.0 {
            0.1
        } else {
            (1.0 - variance.sqrt() / predicted_value.abs()).clamp(0.1, 0.95)
        };

        debug!(
            "Trend fit over {} points: slope={:.4}, intercept={:.4}, variance={:.4}",
            series.len(),
            slope,
            intercept,
            variance
        );

        let last = series.last().unwrap();
        let last_date = period_end_date(&last.period).ok_or_else(|| {
            EngineError::InvalidSimulationParams(format!("unparseable period key: {}", last.period))
        })?;
        let steps = target_index - (series.len() as i64 - 1);
        let target_date = advance_period_end(last_date, is_month_key(&last.period), steps);

        let mut features = BTreeMap::new();
        features.insert("slope".to_string(), slope);
        features.insert("intercept".to_string(), intercept);
        features.insert("variance".to_string(), variance);
        features.insert("sample_size".to_string(), n);

        Ok(Forecast {
            target_date,
            predicted_value,
            confidence,
            features,
        })
    }
}
