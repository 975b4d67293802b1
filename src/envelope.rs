use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{AnalysisError, ErrorKind};

/// Uniform outcome of every session operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope {
    Success { payload: JsonValue },
    Error { kind: ErrorKind, message: String },
}

impl Envelope {
    pub fn success(payload: JsonValue) -> Self {
        Envelope::Success { payload }
    }

    pub fn error(err: &AnalysisError) -> Self {
        Envelope::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn payload(&self) -> Option<&JsonValue> {
        match self {
            Envelope::Success { payload } => Some(payload),
            Envelope::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Envelope::Success { .. } => None,
            Envelope::Error { kind, .. } => Some(*kind),
        }
    }
}

impl From<Result<JsonValue, AnalysisError>> for Envelope {
    fn from(result: Result<JsonValue, AnalysisError>) -> Self {
        match result {
            Ok(payload) => Envelope::success(payload),
            Err(err) => Envelope::error(&err),
        }
    }
}
