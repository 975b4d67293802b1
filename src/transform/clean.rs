use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::data::{Dataset, Value};

/// Which cleaning steps to run. Steps always run in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanOptions {
    pub drop_na: bool,
    pub fill_na: Option<Value>,
    pub drop_duplicates: bool,
}

impl CleanOptions {
    /// Read options from a JSON object.
    ///
    /// Parsing never fails: unknown keys are ignored, non-boolean flags
    /// count as `false`, and a `fill_na` that is null, an array or an
    /// object counts as absent. Falsy scalars such as `0` or `""` are
    /// valid fill values.
    pub fn from_json(options: &JsonValue) -> Self {
        let flag = |key: &str| options.get(key).and_then(JsonValue::as_bool).unwrap_or(false);
        Self {
            drop_na: flag("drop_na"),
            fill_na: options.get("fill_na").and_then(Value::from_json_scalar),
            drop_duplicates: flag("drop_duplicates"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanStep {
    DropNa,
    FillNa,
    DropDuplicates,
}

/// Row counts around one applied step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: CleanStep,
    pub rows_before: usize,
    pub rows_after: usize,
}

#[derive(Debug, Clone)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub steps: Vec<StepReport>,
}

/// Apply the enabled steps in order: drop rows with missing values, fill
/// remaining missing values, then drop repeated rows (first occurrence kept).
pub fn clean_dataset(ds: &Dataset, options: &CleanOptions) -> Cleaned {
    let mut current = ds.clone();
    let mut steps = Vec::new();

    if options.drop_na {
        let before = current.n_rows();
        let keep: Vec<usize> = (0..before).filter(|&i| !current.row_has_null(i)).collect();
        current = current.take_rows(&keep);
        steps.push(report(CleanStep::DropNa, before, &current));
    }

    if let Some(fill) = &options.fill_na {
        let before = current.n_rows();
        current.fill_nulls(fill);
        steps.push(report(CleanStep::FillNa, before, &current));
    }

    if options.drop_duplicates {
        let before = current.n_rows();
        let keep = first_occurrences(&current);
        current = current.take_rows(&keep);
        steps.push(report(CleanStep::DropDuplicates, before, &current));
    }

    for s in &steps {
        log::debug!("clean {:?}: {} -> {} rows", s.step, s.rows_before, s.rows_after);
    }
    Cleaned {
        dataset: current,
        steps,
    }
}

fn report(step: CleanStep, rows_before: usize, ds: &Dataset) -> StepReport {
    StepReport {
        step,
        rows_before,
        rows_after: ds.n_rows(),
    }
}

fn first_occurrences(ds: &Dataset) -> Vec<usize> {
    let mut seen = HashSet::new();
    (0..ds.n_rows()).filter(|&i| seen.insert(ds.row(i))).collect()
}
