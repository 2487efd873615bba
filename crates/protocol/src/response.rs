use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category of a failed inference request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    ModelNotFound,
    Model,
    Report,
    RenderingUnavailable,
}

/// One line of `pipe` output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceResponse {
    Ok(Map<String, Value>),
    Error { kind: ErrorKind, message: String },
}

impl InferenceResponse {
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, InferenceResponse::Ok(_))
    }
}
