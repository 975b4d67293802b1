use std::collections::BTreeMap;

use serde::Serialize;

use super::stats;
use crate::data::{Column, ColumnType, Dataset};

/// Aggregate information about the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: usize,
    pub memory_usage_bytes: usize,
    /// Human-readable footprint, e.g. `"0.01 MB"`.
    pub memory_usage: String,
}

/// Per-column type and completeness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: ColumnType,
    pub unique_count: usize,
    pub missing_count: usize,
    pub missing_fraction: f64,
    /// Formatted as a percentage with two decimals, e.g. `"25.00%"`.
    pub missing_percent: String,
}

/// Descriptive statistics for one numeric column. Undefined values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub p25: Option<f64>,
    #[serde(rename = "50%")]
    pub p50: Option<f64>,
    #[serde(rename = "75%")]
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Full description returned by `describe`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetDescription {
    pub info: DatasetInfo,
    pub columns: Vec<ColumnInfo>,
    pub missing_values: BTreeMap<String, usize>,
    pub numeric_summary: Vec<NumericSummary>,
}

/// Short summary returned after a successful load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub dtypes: BTreeMap<String, ColumnType>,
    pub summary: Vec<NumericSummary>,
}

pub fn describe_dataset(ds: &Dataset) -> DatasetDescription {
    let rows = ds.n_rows();
    let memory = ds.memory_usage();

    let columns = ds
        .columns()
        .iter()
        .map(|col| {
            let missing = col.null_count();
            let fraction = if rows == 0 {
                0.0
            } else {
                missing as f64 / rows as f64
            };
            ColumnInfo {
                name: col.name.clone(),
                dtype: col.dtype(),
                unique_count: col.distinct_count(),
                missing_count: missing,
                missing_fraction: fraction,
                missing_percent: format!("{:.2}%", fraction * 100.0),
            }
        })
        .collect();

    let missing_values = ds
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.null_count()))
        .collect();

    DatasetDescription {
        info: DatasetInfo {
            rows,
            columns: ds.n_cols(),
            memory_usage_bytes: memory,
            memory_usage: format!("{:.2} MB", memory as f64 / (1024.0 * 1024.0)),
        },
        columns,
        missing_values,
        numeric_summary: numeric_summary(ds),
    }
}

pub fn summarize(ds: &Dataset) -> DatasetSummary {
    DatasetSummary {
        rows: ds.n_rows(),
        columns: ds.column_names(),
        dtypes: ds
            .columns()
            .iter()
            .map(|c| (c.name.clone(), c.dtype()))
            .collect(),
        summary: numeric_summary(ds),
    }
}

/// Statistics for every numeric column, in column order.
pub fn numeric_summary(ds: &Dataset) -> Vec<NumericSummary> {
    ds.numeric_columns().into_iter().map(summarize_column).collect()
}

fn summarize_column(col: &Column) -> NumericSummary {
    let values = stats::sorted(&col.present_f64s());
    NumericSummary {
        column: col.name.clone(),
        count: values.len(),
        mean: stats::mean(&values),
        std: stats::std_dev(&values, 1),
        min: values.first().copied(),
        p25: stats::quantile(&values, 0.25),
        p50: stats::quantile(&values, 0.5),
        p75: stats::quantile(&values, 0.75),
        max: values.last().copied(),
    }
}
