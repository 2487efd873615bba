mod reading;
mod report;
mod response;
mod types;

pub use reading::{InputError, RawField, RawReading, SensorReading, FEATURE_COUNT};
pub use report::{ReportData, ReportError, ReportInputs, ReportResults, REQUIRED_KEYS};
pub use response::{ErrorKind, InferenceResponse};
pub use types::{Condition, HealthAssessment, Severity};
