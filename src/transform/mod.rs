//! Pure transforms over a dataset snapshot.
//!
//! Nothing here knows about the session: every function takes a borrowed
//! [`Dataset`](crate::data::Dataset) and returns either a new dataset or a
//! serializable report.

pub mod clean;
pub mod correlate;
pub mod describe;
pub mod features;
pub mod stats;

pub use clean::{clean_dataset, CleanOptions, CleanStep, Cleaned, StepReport};
pub use correlate::{
    calculate_correlations, CorrelationMethod, CorrelationReport, StrongCorrelation,
    STRONG_CORRELATION_THRESHOLD,
};
pub use describe::{describe_dataset, summarize, DatasetDescription, DatasetSummary, NumericSummary};
pub use features::{engineer_features, Engineered, FeatureSpec};
