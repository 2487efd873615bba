//! Rule-based battery health scoring.
//!
//! Turns a raw remaining-useful-life prediction into a [`HealthAssessment`]:
//! a 0-100 score, a condition label, a recommendation, an estimated repair
//! cost and a severity class.
//!
//! # Example
//!
//! ```
//! use cellwise_health::score;
//! use cellwise_protocol::{Condition, SensorReading};
//!
//! let reading = SensorReading::new(3.7, -2.0, 25.0, 900.0).unwrap();
//! let assessment = score(&reading, 50.0);
//! assert_eq!(assessment.condition, Condition::Critical);
//! assert_eq!(assessment.health_score, 3);
//! ```

mod scorer;

pub use scorer::{
    score, tier_for, Tier, BASELINE, MAX_LIFETIME_CYCLES, OVERHEAT_PENALTY, OVERHEAT_SURCHARGE,
    OVERHEAT_THRESHOLD_C, TIERS,
};

pub use cellwise_protocol::{Condition, HealthAssessment, Severity};
