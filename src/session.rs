use std::path::Path;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::CsvConfig;
use crate::data::{load_file, Dataset};
use crate::envelope::Envelope;
use crate::error::AnalysisError;
use crate::transform::{
    calculate_correlations, clean_dataset, describe_dataset, engineer_features, summarize,
    CleanOptions, CorrelationMethod, FeatureSpec, StepReport,
};

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Holds at most one dataset and routes operations to the transforms.
///
/// Every operation returns an [`Envelope`]; errors never escape. A dataset
/// is only replaced after the operation producing it has fully succeeded.
#[derive(Debug, Default)]
pub struct Session {
    /// Loaded dataset (None until a load succeeds).
    dataset: Option<Dataset>,
    csv: CsvConfig,
}

#[derive(Debug, Serialize)]
struct CleanPayload<'a> {
    rows_before: usize,
    rows_after: usize,
    columns: Vec<String>,
    steps: &'a [StepReport],
}

#[derive(Debug, Serialize)]
struct FeaturePayload<'a> {
    rows: usize,
    columns: Vec<String>,
    added_columns: &'a [String],
    overwritten_columns: &'a [String],
}

impl Session {
    pub fn new(csv: CsvConfig) -> Self {
        Self { dataset: None, csv }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.is_some()
    }

    /// Parse `path` and make it the current dataset.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Envelope {
        let path = path.as_ref();
        respond("load", self.try_load(path))
    }

    pub fn describe(&self) -> Envelope {
        respond("describe", self.try_describe())
    }

    /// Options are read permissively; see [`CleanOptions::from_json`].
    pub fn clean(&mut self, options: &JsonValue) -> Envelope {
        self.clean_with(&CleanOptions::from_json(options))
    }

    pub fn clean_with(&mut self, options: &CleanOptions) -> Envelope {
        respond("clean", self.try_clean(options))
    }

    pub fn engineer_features(&mut self, specs: &JsonValue) -> Envelope {
        let result = self
            .require_loaded()
            .and_then(|()| FeatureSpec::parse_list(specs))
            .and_then(|specs| self.try_engineer(&specs));
        respond("engineer_features", result)
    }

    pub fn engineer_features_with(&mut self, specs: &[FeatureSpec]) -> Envelope {
        respond("engineer_features", self.try_engineer(specs))
    }

    pub fn correlate(&self, method: &str) -> Envelope {
        respond("correlate", self.try_correlate(method))
    }

    fn require_loaded(&self) -> Result<(), AnalysisError> {
        self.current().map(|_| ())
    }

    fn current(&self) -> Result<&Dataset, AnalysisError> {
        self.dataset.as_ref().ok_or(AnalysisError::NoDataset)
    }

    fn replace(&mut self, dataset: Dataset) {
        log::info!(
            "Dataset {}: {} rows x {} columns",
            if self.dataset.is_some() { "replaced" } else { "loaded" },
            dataset.n_rows(),
            dataset.n_cols()
        );
        self.dataset = Some(dataset);
    }

    fn try_load(&mut self, path: &Path) -> Result<JsonValue, AnalysisError> {
        let dataset = load_file(path, &self.csv)?;
        let payload = serde_json::to_value(summarize(&dataset))?;
        log::info!("Loaded {}", path.display());
        self.replace(dataset);
        Ok(payload)
    }

    fn try_describe(&self) -> Result<JsonValue, AnalysisError> {
        let ds = self.current()?;
        Ok(serde_json::to_value(describe_dataset(ds))?)
    }

    fn try_clean(&mut self, options: &CleanOptions) -> Result<JsonValue, AnalysisError> {
        let ds = self.current()?;
        let cleaned = clean_dataset(ds, options);
        let payload = serde_json::to_value(CleanPayload {
            rows_before: ds.n_rows(),
            rows_after: cleaned.dataset.n_rows(),
            columns: cleaned.dataset.column_names(),
            steps: &cleaned.steps,
        })?;
        self.replace(cleaned.dataset);
        Ok(payload)
    }

    fn try_engineer(&mut self, specs: &[FeatureSpec]) -> Result<JsonValue, AnalysisError> {
        let ds = self.current()?;
        let engineered = engineer_features(ds, specs)?;
        let payload = serde_json::to_value(FeaturePayload {
            rows: engineered.dataset.n_rows(),
            columns: engineered.dataset.column_names(),
            added_columns: &engineered.added,
            overwritten_columns: &engineered.overwritten,
        })?;
        self.replace(engineered.dataset);
        Ok(payload)
    }

    fn try_correlate(&self, method: &str) -> Result<JsonValue, AnalysisError> {
        let ds = self.current()?;
        let method: CorrelationMethod = method.parse()?;
        Ok(serde_json::to_value(calculate_correlations(ds, method)?)?)
    }
}

fn respond(op: &str, result: Result<JsonValue, AnalysisError>) -> Envelope {
    if let Err(err) = &result {
        log::warn!("{op} failed: {err}");
    }
    Envelope::from(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;
    use std::io::Write;

    const SCENARIO: &str = "a,b\n1,10\n2,20\n2,20\n,40\n";

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn loaded(contents: &str) -> (Session, tempfile::NamedTempFile) {
        let file = csv_file(contents);
        let mut session = Session::default();
        assert!(session.load(file.path()).is_success());
        (session, file)
    }

    #[test]
    fn operations_require_a_dataset() {
        let mut session = Session::default();
        let envelopes = [
            session.describe(),
            session.clean(&json!({"drop_na": true})),
            session.engineer_features(&json!([{"type": "standardize", "columns": ["a"]}])),
            session.correlate("pearson"),
        ];
        for env in envelopes {
            assert_eq!(env.error_kind(), Some(ErrorKind::NoDataset));
        }
        assert!(!session.is_loaded());
    }

    #[test]
    fn no_dataset_takes_precedence_over_bad_arguments() {
        let mut session = Session::default();
        assert_eq!(session.correlate("cosine").error_kind(), Some(ErrorKind::NoDataset));
        assert_eq!(
            session.engineer_features(&json!("garbage")).error_kind(),
            Some(ErrorKind::NoDataset)
        );
    }

    #[test]
    fn load_returns_summary() {
        let (session, _file) = loaded(SCENARIO);
        let env = session.describe();
        assert!(env.is_success());

        let file = csv_file(SCENARIO);
        let mut fresh = Session::default();
        let payload = fresh.load(file.path()).payload().cloned().unwrap();
        assert_eq!(payload["rows"], 4);
        assert_eq!(payload["columns"], json!(["a", "b"]));
        assert_eq!(payload["dtypes"]["b"], "int64");
        assert_eq!(payload["summary"][0]["column"], "a");
        assert_eq!(payload["summary"][0]["count"], 3);
    }

    #[test]
    fn failed_load_keeps_empty_state() {
        let mut session = Session::default();
        let env = session.load("/no/such/file.csv");
        assert_eq!(env.error_kind(), Some(ErrorKind::LoadError));
        assert!(!session.is_loaded());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let (mut session, _file) = loaded(SCENARIO);
        let before = session.dataset().cloned();

        let bad = csv_file("a,b\n1,2\n3\n");
        assert_eq!(session.load(bad.path()).error_kind(), Some(ErrorKind::LoadError));
        assert_eq!(session.dataset().cloned(), before);
    }

    #[test]
    fn successful_load_replaces_dataset() {
        let (mut session, _file) = loaded(SCENARIO);
        let other = csv_file("x,y,z\n1,2,3\n");
        assert!(session.load(other.path()).is_success());
        let ds = session.dataset().unwrap();
        assert_eq!(ds.column_names(), vec!["x", "y", "z"]);
        assert_eq!(ds.n_rows(), 1);
    }

    #[test]
    fn scenario_drop_na_then_fresh_drop_duplicates() {
        let (mut session, file) = loaded(SCENARIO);
        let env = session.clean(&json!({"drop_na": true}));
        assert_eq!(env.payload().unwrap()["rows_after"], 3);
        assert_eq!(session.dataset().unwrap().n_rows(), 3);

        assert!(session.load(file.path()).is_success());
        let env = session.clean(&json!({"drop_duplicates": true}));
        assert_eq!(env.payload().unwrap()["rows_after"], 3);
        let ds = session.dataset().unwrap();
        assert_eq!(ds.n_rows(), 3);
        assert!(ds.row_has_null(2));
    }

    #[test]
    fn empty_clean_is_a_no_op() {
        let (mut session, _file) = loaded(SCENARIO);
        let before = session.dataset().cloned();
        let env = session.clean(&json!({}));
        assert!(env.is_success());
        assert_eq!(session.dataset().cloned(), before);
    }

    #[test]
    fn clean_reports_each_step() {
        let (mut session, _file) = loaded(SCENARIO);
        let env = session.clean(&json!({"drop_na": true, "fill_na": 0, "drop_duplicates": true}));
        let steps = &env.payload().unwrap()["steps"];
        assert_eq!(steps[0], json!({"step": "drop_na", "rows_before": 4, "rows_after": 3}));
        assert_eq!(steps[1], json!({"step": "fill_na", "rows_before": 3, "rows_after": 3}));
        assert_eq!(steps[2], json!({"step": "drop_duplicates", "rows_before": 3, "rows_after": 2}));
    }

    #[test]
    fn read_only_operations_do_not_mutate() {
        let (session, _file) = loaded("a,b,c\n1,2,9\n2,4,7\n3,7,8\n4,8,1\n");
        let snapshot = session.dataset().cloned();

        let d1 = session.describe();
        let c1 = session.correlate("spearman");
        let d2 = session.describe();
        let c2 = session.correlate("spearman");

        assert_eq!(d1, d2);
        assert_eq!(c1, c2);
        assert!(c1.is_success());
        assert_eq!(session.dataset().cloned(), snapshot);
    }

    #[test]
    fn correlate_validates_method_and_columns() {
        let (session, _file) = loaded(SCENARIO);
        assert_eq!(
            session.correlate("cosine").error_kind(),
            Some(ErrorKind::InvalidArgument)
        );

        let (single, _file) = loaded("n,label\n1,x\n2,y\n");
        assert_eq!(
            single.correlate("pearson").error_kind(),
            Some(ErrorKind::InsufficientData)
        );
    }

    #[test]
    fn standardize_round_trip() {
        let (mut session, _file) = loaded("x,y\n1,5\n2,3\n4,8\n9,1\n");
        let env = session.engineer_features(&json!([{"type": "standardize", "columns": ["x"]}]));
        assert!(env.is_success());
        let x = session.dataset().unwrap().column("x").unwrap().present_f64s();
        let mean = x.iter().sum::<f64>() / x.len() as f64;
        let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / x.len() as f64;
        assert!(mean.abs() < 1e-9);
        assert!((var.sqrt() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn engineer_unknown_column_leaves_dataset_unchanged() {
        let (mut session, _file) = loaded(SCENARIO);
        let before = session.dataset().cloned();
        let env = session.engineer_features(&json!([
            {"type": "standardize", "columns": ["b"]},
            {"type": "standardize", "columns": ["missing"]}
        ]));
        assert_eq!(env.error_kind(), Some(ErrorKind::ColumnNotFound));
        assert_eq!(session.dataset().cloned(), before);
    }

    #[test]
    fn pca_appends_components() {
        let (mut session, _file) = loaded("a,b,c\n1,2,9\n2,4,7\n3,7,8\n4,8,1\n");
        let env = session.engineer_features(&json!([
            {"type": "dimensionality-reduction", "columns": ["a", "b", "c"], "n_components": 2}
        ]));
        let payload = env.payload().unwrap();
        assert_eq!(payload["added_columns"], json!(["component_1", "component_2"]));
        assert_eq!(session.dataset().unwrap().n_cols(), 5);
    }

    #[test]
    fn session_recovers_after_errors() {
        let (mut session, _file) = loaded(SCENARIO);
        assert!(!session.correlate("nope").is_success());
        assert!(!session.engineer_features(&json!([{"type": "bogus"}])).is_success());
        assert!(session.describe().is_success());
        assert!(session.clean(&json!({"drop_na": true})).is_success());
    }
}
