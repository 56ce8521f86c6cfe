use crate::error::{EngineError, Result};
use crate::schema::{CashEvent, CashEventSource, Forecast, TimeSeriesPoint};
use chrono::NaiveDate;
use log::{debug, info};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use std::collections::BTreeMap;

/// Share of open receivables assumed to actually convert to cash. Confirmed
/// cash events are not haircut.
pub const COLLECTION_RATE: f64 = 0.8;

/// Trial counts below this produce percentile bands too coarse to report.
pub const MIN_TRIALS: usize = 100;

pub const DEFAULT_TRIALS: usize = 1000;

/// Monte Carlo cash-position simulator.
///
/// Each trial draws a base value uniformly within one historical standard
/// deviation of the mean (a bounded random walk, not a Gaussian draw), then
/// layers known future cash events on top. The random source is injected so
/// trials are reproducible under a seeded generator.
pub struct MonteCarloSimulator;

impl MonteCarloSimulator {
    pub fn simulate<R: Rng>(
        series: &[TimeSeriesPoint],
        known_inflows: &[CashEvent],
        known_outflows: &[CashEvent],
        target_date: NaiveDate,
        trials: usize,
        rng: &mut R,
    ) -> Result<Forecast> {
        if trials < MIN_TRIALS {
            return Err(EngineError::InvalidSimulationParams(format!(
                "trial count {} is below the minimum of {}",
                trials, MIN_TRIALS
            )));
        }
        if series.is_empty() {
            return Err(EngineError::InsufficientHistory {
                required: 1,
                actual: 0,
            });
        }

        let n = series.len() as f64;
        let mean = series.iter().map(|p| p.value).sum::<f64>() / n;
        let variance = series
            .iter()
            .map(|p| (p.value - mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        let inflow_total: f64 = known_inflows
            .iter()
            .filter(|e| e.date <= target_date)
            .map(|e| match e.source {
                CashEventSource::Invoice => e.amount * COLLECTION_RATE,
                CashEventSource::Committed => e.amount,
            })
            .sum();
        let outflow_total: f64 = known_outflows
            .iter()
            .filter(|e| e.date <= target_date)
            .map(|e| e.amount)
            .sum();
        let net_known = inflow_total - outflow_total;

        debug!(
            "Simulating {} trials: mean={:.2}, std_dev={:.2}, net known events={:.2}",
            trials, mean, std_dev, net_known
        );

        let unit = Uniform::new(0.0f64, 1.0);
        let mut outcomes = Vec::with_capacity(trials);
        for _ in 0..trials {
            let u = unit.sample(rng);
            let base = mean + u * 2.0 * std_dev - std_dev;
            outcomes.push(base + net_known);
        }

        outcomes.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let p10 = percentile(&outcomes, 0.10);
        let p50 = percentile(&outcomes, 0.50);
        let p90 = percentile(&outcomes, 0.90);

        let confidence = if p50 == 0.0 {
            0.1
        } else {
            (1.0 - (p90 - p10) / p50.abs()).clamp(0.1, 0.95)
        };

        info!(
            "Simulation complete: p50={:.2}, band=[{:.2}, {:.2}], confidence={:.2}",
            p50, p10, p90, confidence
        );

        let mut features = BTreeMap::new();
        features.insert("p10".to_string(), p10);
        features.insert("p50".to_string(), p50);
        features.insert("p90".to_string(), p90);
        features.insert("mean".to_string(), mean);
        features.insert("std_dev".to_string(), std_dev);
        features.insert("trials".to_string(), trials as f64);

        Ok(Forecast {
            target_date,
            predicted_value: p50.max(0.0),
            confidence,
            features,
        })
    }
}

/// Nearest-rank percentile over an ascending-sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let idx = (q * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx]
}
