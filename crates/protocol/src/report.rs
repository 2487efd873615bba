//! Fixed-shape report data handed to renderers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::reading::SensorReading;
use crate::types::{Condition, HealthAssessment};

/// Keys every renderer can rely on in [`ReportData::to_flat_map`].
pub const REQUIRED_KEYS: [&str; 10] = [
    "voltage",
    "current",
    "temperature",
    "cycle",
    "rul",
    "health_score",
    "condition",
    "recommendation",
    "cost",
    "css_class",
];

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report data is missing required key '{0}'")]
    MissingKey(&'static str),

    #[error("Failed to encode report data: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInputs {
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
    pub cycle: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResults {
    pub rul: u32,
    pub health_score: u8,
    pub condition: Condition,
    pub recommendation: String,
    pub cost: u32,
    pub css_class: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub inputs: ReportInputs,
    pub results: ReportResults,
}

impl ReportData {
    /// Package a reading and its assessment. No values are recomputed; the
    /// result is rejected only if a required key would be absent or null.
    pub fn assemble(
        reading: &SensorReading,
        assessment: &HealthAssessment,
    ) -> Result<Self, ReportError> {
        let data = Self {
            inputs: ReportInputs {
                voltage: reading.voltage,
                current: reading.current,
                temperature: reading.temperature,
                cycle: reading.cycle,
            },
            results: ReportResults {
                rul: assessment.rul,
                health_score: assessment.health_score,
                condition: assessment.condition,
                recommendation: assessment.recommendation.clone(),
                cost: assessment.cost,
                css_class: assessment.severity.css_class().to_string(),
            },
        };
        data.validate()?;
        Ok(data)
    }

    /// Single-level mapping of inputs and results.
    pub fn to_flat_map(&self) -> Result<Map<String, Value>, ReportError> {
        let mut map = Map::new();
        for part in [
            serde_json::to_value(&self.inputs)?,
            serde_json::to_value(&self.results)?,
        ] {
            if let Value::Object(fields) = part {
                map.extend(fields);
            }
        }
        Ok(map)
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        let map = self.to_flat_map()?;
        for key in REQUIRED_KEYS {
            match map.get(key) {
                None | Some(Value::Null) => return Err(ReportError::MissingKey(key)),
                Some(_) => {}
            }
        }
        Ok(())
    }
}
