use crate::schema::{Forecast, Scenario, ScenarioImpact, ScenarioTier};
use std::collections::BTreeMap;

/// Multiplier, probability weight, and planning assumptions for one tier.
/// The assumptions are static planning constants, not statistically fitted;
/// this is an intentional simplification of the product, not a defect.
struct TierProfile {
    tier: ScenarioTier,
    multiplier: f64,
    probability: f64,
    impact: ScenarioImpact,
    growth_rate: f64,
    retention_rate: f64,
    acquisition_rate: f64,
}

const TIER_PROFILES: [TierProfile; 3] = [
    TierProfile {
        tier: ScenarioTier::Optimistic,
        multiplier: 1.15,
        probability: 0.2,
        impact: ScenarioImpact::Positive,
        growth_rate: 0.15,
        retention_rate: 0.95,
        acquisition_rate: 0.20,
    },
    TierProfile {
        tier: ScenarioTier::MostLikely,
        multiplier: 1.0,
        probability: 0.6,
        impact: ScenarioImpact::Neutral,
        growth_rate: 0.05,
        retention_rate: 0.85,
        acquisition_rate: 0.10,
    },
    TierProfile {
        tier: ScenarioTier::Pessimistic,
        multiplier: 0.8,
        probability: 0.2,
        impact: ScenarioImpact::Negative,
        growth_rate: -0.05,
        retention_rate: 0.70,
        acquisition_rate: 0.05,
    },
];

/// Expands a single point forecast into the fixed Optimistic / Most Likely /
/// Pessimistic triple. Probabilities always sum to exactly 1.0.
pub struct ScenarioGenerator;

impl ScenarioGenerator {
    pub fn expand(forecast: &Forecast) -> [Scenario; 3] {
        TIER_PROFILES
            .iter()
            .map(|profile| {
                let mut assumptions = BTreeMap::new();
                assumptions.insert("growth_rate".to_string(), profile.growth_rate);
                assumptions.insert("retention_rate".to_string(), profile.retention_rate);
                assumptions.insert("acquisition_rate".to_string(), profile.acquisition_rate);

                Scenario {
                    name: profile.tier,
                    probability: profile.probability,
                    predicted_value: forecast.predicted_value * profile.multiplier,
                    impact: profile.impact,
                    assumptions,
                }
            })
            .collect::<Vec<_>>()
            .try_into()
            .expect("tier table has exactly three entries")
    }
}
