//! Inference input: a single instantaneous battery reading.

use serde::{Deserialize, Serialize};

/// Number of model inputs: voltage, current, temperature, cycle.
pub const FEATURE_COUNT: usize = 4;

/// Errors raised while turning raw request fields into a [`SensorReading`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Missing required field '{field}'")]
    Missing { field: &'static str },

    #[error("Field '{field}' must be a number, got '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("Field '{field}' must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("Field '{field}' is out of range ({value}): {reason}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// A validated reading.
///
/// Construct with [`SensorReading::new`] or [`RawReading::parse`]; both reject
/// non-finite values, non-positive voltage and negative cycle counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Terminal voltage in volts.
    pub voltage: f64,
    /// Current in amperes. Negative while discharging.
    pub current: f64,
    /// Cell temperature in degrees Celsius.
    pub temperature: f64,
    /// Charge/discharge cycles completed so far.
    pub cycle: u32,
}

impl SensorReading {
    /// Validate and build a reading. A fractional cycle is truncated toward zero.
    pub fn new(voltage: f64, current: f64, temperature: f64, cycle: f64) -> Result<Self, InputError> {
        let voltage = finite("voltage", voltage)?;
        let current = finite("current", current)?;
        let temperature = finite("temperature", temperature)?;
        let cycle = finite("cycle", cycle)?;

        if voltage <= 0.0 {
            return Err(InputError::OutOfRange {
                field: "voltage",
                value: voltage,
                reason: "voltage must be greater than zero",
            });
        }
        if cycle < 0.0 {
            return Err(InputError::OutOfRange {
                field: "cycle",
                value: cycle,
                reason: "cycle count cannot be negative",
            });
        }
        if cycle > u32::MAX as f64 {
            return Err(InputError::OutOfRange {
                field: "cycle",
                value: cycle,
                reason: "cycle count is too large",
            });
        }

        Ok(Self {
            voltage,
            current,
            temperature,
            cycle: cycle.trunc() as u32,
        })
    }

    /// Model input vector in training column order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.voltage, self.current, self.temperature, self.cycle as f64]
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, InputError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InputError::NotFinite { field, value })
    }
}

/// A request field as it arrives: a JSON number or free text (form fields, CLI args).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f64),
    Text(String),
}

impl RawField {
    fn parse(&self, field: &'static str) -> Result<f64, InputError> {
        match self {
            RawField::Number(n) => Ok(*n),
            RawField::Text(s) => s.trim().parse::<f64>().map_err(|_| InputError::NotNumeric {
                field,
                value: s.clone(),
            }),
        }
    }
}

impl From<&str> for RawField {
    fn from(s: &str) -> Self {
        RawField::Text(s.to_string())
    }
}

impl From<f64> for RawField {
    fn from(n: f64) -> Self {
        RawField::Number(n)
    }
}

/// Unvalidated inference request. Every field is optional so that a missing
/// field is reported as such instead of as a generic decode failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawReading {
    pub voltage: Option<RawField>,
    pub current: Option<RawField>,
    pub temperature: Option<RawField>,
    pub cycle: Option<RawField>,
}

impl RawReading {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Fields are checked in input order; the first problem wins.
    pub fn parse(&self) -> Result<SensorReading, InputError> {
        let voltage = required("voltage", self.voltage.as_ref())?;
        let current = required("current", self.current.as_ref())?;
        let temperature = required("temperature", self.temperature.as_ref())?;
        let cycle = required("cycle", self.cycle.as_ref())?;
        SensorReading::new(voltage, current, temperature, cycle)
    }
}

fn required(field: &'static str, raw: Option<&RawField>) -> Result<f64, InputError> {
    raw.ok_or(InputError::Missing { field })?.parse(field)
}
