use nalgebra::linalg::SymmetricEigen;
use nalgebra::DMatrix;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::stats;
use crate::data::{Column, Dataset};
use crate::error::AnalysisError;

const DEFAULT_COMPONENTS: usize = 2;

/// One feature-engineering directive.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSpec {
    /// Rescale each column to zero mean and unit (population) variance, in place.
    Standardize { columns: Vec<String> },
    /// Project the columns onto their top `n_components` principal axes,
    /// appended as `component_1..component_n`.
    DimensionalityReduction {
        columns: Vec<String>,
        n_components: usize,
    },
}

#[derive(Deserialize)]
struct RawSpec {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    columns: Vec<String>,
    n_components: Option<usize>,
}

impl FeatureSpec {
    /// Decode a JSON array of `{type, columns, n_components?}` objects.
    pub fn parse_list(specs: &JsonValue) -> Result<Vec<FeatureSpec>, AnalysisError> {
        let raw: Vec<RawSpec> = serde_json::from_value(specs.clone())
            .map_err(|e| AnalysisError::InvalidArgument(format!("malformed feature specs: {e}")))?;
        raw.into_iter().map(FeatureSpec::from_raw).collect()
    }

    fn from_raw(raw: RawSpec) -> Result<FeatureSpec, AnalysisError> {
        match raw.kind.as_str() {
            "standardize" => Ok(FeatureSpec::Standardize {
                columns: raw.columns,
            }),
            "dimensionality-reduction" | "dimensionality_reduction" | "pca" => {
                Ok(FeatureSpec::DimensionalityReduction {
                    columns: raw.columns,
                    n_components: raw.n_components.unwrap_or(DEFAULT_COMPONENTS),
                })
            }
            other => Err(AnalysisError::InvalidArgument(format!(
                "unsupported feature type '{other}' (expected 'standardize' or 'dimensionality-reduction')"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Engineered {
    pub dataset: Dataset,
    /// Columns that did not exist in the input.
    pub added: Vec<String>,
    /// Input columns whose values were replaced.
    pub overwritten: Vec<String>,
}

/// Apply `specs` in order. Every spec reads from `ds` itself, never from
/// the output of an earlier spec in the same call; results accumulate
/// into one output dataset.
pub fn engineer_features(ds: &Dataset, specs: &[FeatureSpec]) -> Result<Engineered, AnalysisError> {
    let mut output = ds.clone();
    let mut added = Vec::new();
    let mut overwritten = Vec::new();

    for spec in specs {
        let produced = match spec {
            FeatureSpec::Standardize { columns } => columns
                .iter()
                .map(|name| numeric_column(ds, name).map(standardize))
                .collect::<Result<Vec<_>, _>>()?,
            FeatureSpec::DimensionalityReduction {
                columns,
                n_components,
            } => principal_components(ds, columns, *n_components)?,
        };

        for column in produced {
            let bucket = if ds.column(&column.name).is_some() {
                &mut overwritten
            } else {
                &mut added
            };
            if !bucket.contains(&column.name) {
                bucket.push(column.name.clone());
            }
            output.set_column(column)?;
        }
    }

    Ok(Engineered {
        dataset: output,
        added,
        overwritten,
    })
}

fn numeric_column<'a>(ds: &'a Dataset, name: &str) -> Result<&'a Column, AnalysisError> {
    let col = ds
        .column(name)
        .ok_or_else(|| AnalysisError::ColumnNotFound(name.to_string()))?;
    if !col.is_numeric() {
        return Err(AnalysisError::InvalidArgument(format!(
            "column '{name}' is {} and cannot be used as a numeric feature",
            col.dtype()
        )));
    }
    Ok(col)
}

/// z-score with population std; missing cells stay missing and a constant
/// column maps to all zeros.
fn standardize(col: &Column) -> Column {
    let present = col.present_f64s();
    let mean = stats::mean(&present).unwrap_or(0.0);
    let scale = match stats::std_dev(&present, 0) {
        Some(s) if s > 0.0 && s.is_finite() => s,
        _ => 1.0,
    };
    Column::from_f64s(
        col.name.clone(),
        col.numeric_values()
            .into_iter()
            .map(|v| v.map(|x| (x - mean) / scale)),
    )
}

fn principal_components(
    ds: &Dataset,
    names: &[String],
    n_components: usize,
) -> Result<Vec<Column>, AnalysisError> {
    if names.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "dimensionality reduction needs at least one column".to_string(),
        ));
    }
    let columns = names
        .iter()
        .map(|name| numeric_column(ds, name))
        .collect::<Result<Vec<_>, _>>()?;

    let rows = ds.n_rows();
    let width = columns.len();
    let max_components = rows.min(width);
    if n_components == 0 || n_components > max_components {
        return Err(AnalysisError::InvalidArgument(format!(
            "n_components must be between 1 and {max_components}, got {n_components}"
        )));
    }

    let mut data = DMatrix::<f64>::zeros(rows, width);
    for (j, col) in columns.iter().enumerate() {
        for (i, value) in col.values.iter().enumerate() {
            data[(i, j)] = value.as_f64().ok_or_else(|| {
                AnalysisError::InvalidArgument(format!(
                    "column '{}' has a missing value at row {i}",
                    col.name
                ))
            })?;
        }
    }

    for j in 0..width {
        let mean = data.column(j).mean();
        for i in 0..rows {
            data[(i, j)] -= mean;
        }
    }

    let denom = rows.saturating_sub(1).max(1) as f64;
    let cov = (data.transpose() * &data) / denom;
    let eig = SymmetricEigen::new(cov);

    let mut order: Vec<usize> = (0..width).collect();
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));

    let components = order
        .iter()
        .take(n_components)
        .enumerate()
        .map(|(k, &idx)| {
            let mut axis = eig.eigenvectors.column(idx).into_owned();
            // fix the sign so the dominant loading is positive
            let pivot = axis
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if pivot < 0.0 {
                axis = -axis;
            }
            let scores = &data * &axis;
            Column::from_f64s(format!("component_{}", k + 1), scores.iter().map(|&s| Some(s)))
        })
        .collect();
    Ok(components)
}
