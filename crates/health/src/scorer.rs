use cellwise_protocol::{Condition, HealthAssessment, SensorReading};

/// Assumed battery lifetime in cycles; a prediction of this many remaining
/// cycles scores 100.
pub const MAX_LIFETIME_CYCLES: f64 = 1500.0;

/// Temperatures strictly above this trigger the overheat override.
pub const OVERHEAT_THRESHOLD_C: f64 = 40.0;

/// Health points removed by the overheat override.
pub const OVERHEAT_PENALTY: f64 = 10.0;

/// Added on top of the tier cost by the overheat override.
pub const OVERHEAT_SURCHARGE: u32 = 100;

/// A degradation tier: applies when health is strictly below `below`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tier {
    pub below: f64,
    pub condition: Condition,
    pub cost: u32,
}

/// Outcome when no tier applies.
pub const BASELINE: Tier = Tier {
    below: f64::INFINITY,
    condition: Condition::Excellent,
    cost: 0,
};

/// Evaluated in order; every matching tier overwrites the previous one, so
/// the last match wins.
pub const TIERS: [Tier; 3] = [
    Tier {
        below: 75.0,
        condition: Condition::Good,
        cost: 20,
    },
    Tier {
        below: 50.0,
        condition: Condition::FairRisk,
        cost: 150,
    },
    Tier {
        below: 25.0,
        condition: Condition::Critical,
        cost: 300,
    },
];

/// Tier selected for a health value before any temperature adjustment.
pub fn tier_for(health: f64) -> Tier {
    TIERS
        .iter()
        .fold(BASELINE, |current, tier| if health < tier.below { *tier } else { current })
}

/// Score a reading given the model's raw RUL prediction.
///
/// `rul_pred` is expected to be finite; model output always is.
pub fn score(reading: &SensorReading, rul_pred: f64) -> HealthAssessment {
    debug_assert!(rul_pred.is_finite(), "RUL prediction must be finite");

    let mut health = (rul_pred / MAX_LIFETIME_CYCLES * 100.0).clamp(0.0, 100.0);
    let tier = tier_for(health);
    let mut condition = tier.condition;
    let mut cost = tier.cost;

    if reading.temperature > OVERHEAT_THRESHOLD_C {
        condition = Condition::OverheatingWarning;
        health = (health - OVERHEAT_PENALTY).max(0.0);
        cost += OVERHEAT_SURCHARGE;
    }

    HealthAssessment {
        rul: rul_pred.max(0.0).trunc() as u32,
        health_score: health.trunc() as u8,
        condition,
        recommendation: condition.recommendation().to_string(),
        cost,
        severity: condition.severity(),
    }
}
