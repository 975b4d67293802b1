use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by session operations and transforms.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No data loaded")]
    NoDataset,

    #[error("Failed to load dataset: {0}")]
    Load(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Failed to encode result: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Machine-readable error name carried in error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoDataset,
    LoadError,
    ColumnNotFound,
    InvalidArgument,
    InsufficientData,
    Serialization,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::NoDataset => ErrorKind::NoDataset,
            AnalysisError::Load(_) => ErrorKind::LoadError,
            AnalysisError::ColumnNotFound(_) => ErrorKind::ColumnNotFound,
            AnalysisError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AnalysisError::InsufficientData(_) => ErrorKind::InsufficientData,
            AnalysisError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

impl From<anyhow::Error> for AnalysisError {
    fn from(error: anyhow::Error) -> Self {
        AnalysisError::Load(format!("{error:#}"))
    }
}
