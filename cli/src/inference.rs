//! Request boundary: raw reading in, validated report data out.
//!
//! The model artifact is loaded into a [`ModelSlot`] once, before any
//! request is served, and is read-only afterwards. Every failure on the way
//! is turned into an [`InferenceError`] so callers can report it per request.

use std::path::Path;
use std::sync::OnceLock;

use cellwise_health::score;
use cellwise_model::{ModelError, RulModel};
use cellwise_protocol::{
    ErrorKind, InferenceResponse, InputError, RawReading, ReportData, ReportError,
};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("No trained model is loaded. Run `cellwise train` first.")]
    ModelNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Model(ModelError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Report rendering unavailable: {0}")]
    RenderingUnavailable(String),
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::ModelNotFound => ErrorKind::ModelNotFound,
            InferenceError::InvalidInput(_) => ErrorKind::InvalidInput,
            InferenceError::Model(_) => ErrorKind::Model,
            InferenceError::Report(_) => ErrorKind::Report,
            InferenceError::RenderingUnavailable(_) => ErrorKind::RenderingUnavailable,
        }
    }

    pub fn into_response(self) -> InferenceResponse {
        InferenceResponse::Error {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<InputError> for InferenceError {
    fn from(e: InputError) -> Self {
        InferenceError::InvalidInput(e.to_string())
    }
}

impl From<ModelError> for InferenceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::NotFound { .. } => InferenceError::ModelNotFound,
            other => InferenceError::Model(other),
        }
    }
}

/// Holds the model shared by all requests of this process.
pub struct ModelSlot {
    model: OnceLock<RulModel>,
}

static GLOBAL: ModelSlot = ModelSlot::new();

impl ModelSlot {
    pub const fn new() -> Self {
        Self {
            model: OnceLock::new(),
        }
    }

    pub fn global() -> &'static ModelSlot {
        &GLOBAL
    }

    /// Load the artifact at `path` unless a model is already installed.
    pub fn init(&self, path: &Path) -> Result<&RulModel, InferenceError> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }
        let model = RulModel::load(path)?;
        info!(
            path = %path.display(),
            trees = model.metadata().params.n_estimators,
            "Model loaded"
        );
        Ok(self.model.get_or_init(|| model))
    }

    #[cfg(test)]
    pub fn install(&self, model: RulModel) -> &RulModel {
        self.model.get_or_init(|| model)
    }

    pub fn get(&self) -> Result<&RulModel, InferenceError> {
        self.model.get().ok_or(InferenceError::ModelNotFound)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}

/// Validate, predict, score and assemble one reading.
pub fn assess(slot: &ModelSlot, raw: &RawReading) -> Result<ReportData, InferenceError> {
    let model = slot.get()?;
    let reading = raw.parse()?;

    let rul_pred = model.predict_reading(&reading);
    if !rul_pred.is_finite() {
        return Err(InferenceError::InvalidInput(format!(
            "model produced a non-finite estimate for {:?}",
            reading
        )));
    }

    let assessment = score(&reading, rul_pred);
    debug!(
        rul_pred,
        health = assessment.health_score,
        condition = %assessment.condition,
        "Reading assessed"
    );

    Ok(ReportData::assemble(&reading, &assessment)?)
}

/// Handle one `pipe` line. Never fails; errors become error responses.
pub fn respond(slot: &ModelSlot, line: &str) -> InferenceResponse {
    let result = RawReading::from_json(line)
        .map_err(|e| InferenceError::InvalidInput(format!("malformed request: {}", e)))
        .and_then(|raw| assess(slot, &raw))
        .and_then(|data| data.to_flat_map().map_err(InferenceError::from));

    match result {
        Ok(map) => InferenceResponse::Ok(map),
        Err(e) => e.into_response(),
    }
}

/// Slot holding a small model trained on synthetic rows.
#[cfg(test)]
pub(crate) fn trained_slot() -> ModelSlot {
    use cellwise_model::{synthetic, DataSource, TrainOptions, TrainingSet};

    let set = TrainingSet::new(
        synthetic::generate(200, 3),
        DataSource::Synthetic { samples: 200 },
    );
    let options = TrainOptions {
        n_estimators: 6,
        ..TrainOptions::default()
    };
    let slot = ModelSlot::new();
    slot.install(RulModel::train(&set, &options).unwrap());
    slot
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellwise_protocol::{Condition, RawField};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(v: &str, i: &str, t: &str, c: &str) -> RawReading {
        RawReading {
            voltage: Some(RawField::from(v)),
            current: Some(RawField::from(i)),
            temperature: Some(RawField::from(t)),
            cycle: Some(RawField::from(c)),
        }
    }

    #[test]
    fn test_predict_before_init_is_model_not_found() {
        let slot = ModelSlot::new();
        let err = assess(&slot, &raw("3.7", "-2.0", "25", "900")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelNotFound);
        assert!(!slot.is_loaded());
    }

    #[test]
    fn test_init_missing_artifact() {
        let dir = tempfile::TempDir::new().unwrap();
        let slot = ModelSlot::new();
        let err = slot.init(&dir.path().join("battery_model.bin")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelNotFound);
        assert!(err.to_string().contains("cellwise train"));
    }

    #[test]
    fn test_init_loads_persisted_model() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("battery_model.bin");
        let trained = trained_slot();
        trained.get().unwrap().persist(&path).unwrap();

        let slot = ModelSlot::new();
        slot.init(&path).unwrap();
        assert!(slot.is_loaded());

        let sample = [4.0, -2.0, 26.0, 300.0];
        assert_eq!(
            slot.get().unwrap().predict(&sample),
            trained.get().unwrap().predict(&sample)
        );
    }

    #[test]
    fn test_assess_valid_reading() {
        let slot = trained_slot();
        let data = assess(&slot, &raw("4.1", "-2.0", "25", "100")).unwrap();

        assert_eq!(data.inputs.cycle, 100);
        assert!(data.results.health_score <= 100);
        assert_eq!(
            data.results.recommendation,
            data.results.condition.recommendation()
        );
    }

    #[test]
    fn test_assess_hot_reading_overrides() {
        let slot = trained_slot();
        let data = assess(&slot, &raw("4.1", "-2.0", "45", "100")).unwrap();
        assert_eq!(data.results.condition, Condition::OverheatingWarning);
        assert_eq!(data.results.css_class, "text-danger-custom");
    }

    #[test]
    fn test_assess_rejects_non_numeric() {
        let slot = trained_slot();
        let err = assess(&slot, &raw("abc", "-2.0", "25", "100")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("voltage"));
    }

    #[test]
    fn test_respond_ok_line() {
        let slot = trained_slot();
        let response = respond(
            &slot,
            r#"{"voltage": 3.9, "current": "-2.0", "temperature": 27, "cycle": 400}"#,
        );
        match response {
            InferenceResponse::Ok(map) => {
                assert_eq!(map.get("cycle"), Some(&json!(400)));
                assert_eq!(map.len(), 10);
            }
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[test]
    fn test_respond_error_lines_do_not_poison_slot() {
        let slot = trained_slot();

        let missing = respond(&slot, r#"{"voltage": 3.9, "current": -2.0, "temperature": 27}"#);
        assert_eq!(
            missing,
            InferenceResponse::Error {
                kind: ErrorKind::InvalidInput,
                message: "Invalid input: Missing required field 'cycle'".to_string(),
            }
        );

        let garbage = respond(&slot, "not json");
        assert!(matches!(
            garbage,
            InferenceResponse::Error {
                kind: ErrorKind::InvalidInput,
                ..
            }
        ));

        assert!(respond(&slot, r#"{"voltage":4,"current":-2,"temperature":25,"cycle":1}"#).is_ok());
    }
}
