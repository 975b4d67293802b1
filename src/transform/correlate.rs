use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::stats;
use crate::data::{Column, Dataset};
use crate::error::AnalysisError;

/// Pairs with |r| strictly above this are reported as strong.
pub const STRONG_CORRELATION_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    #[default]
    Pearson,
    Spearman,
    Kendall,
}

impl CorrelationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        }
    }

    fn coefficient(self, x: &[f64], y: &[f64]) -> Option<f64> {
        match self {
            CorrelationMethod::Pearson => stats::pearson(x, y),
            CorrelationMethod::Spearman => stats::spearman(x, y),
            CorrelationMethod::Kendall => stats::kendall_tau_b(x, y),
        }
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CorrelationMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pearson" => Ok(CorrelationMethod::Pearson),
            "spearman" => Ok(CorrelationMethod::Spearman),
            "kendall" => Ok(CorrelationMethod::Kendall),
            other => Err(AnalysisError::InvalidArgument(format!(
                "unknown correlation method '{other}' (expected pearson, spearman or kendall)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrongCorrelation {
    pub var1: String,
    pub var2: String,
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub method: CorrelationMethod,
    /// Numeric columns in dataset order.
    pub columns: Vec<String>,
    /// `matrix[a][b]`; `None` where the coefficient is undefined.
    pub matrix: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    pub strong_correlations: Vec<StrongCorrelation>,
}

/// Pairwise correlations over the numeric columns, using only rows where
/// both values are present.
pub fn calculate_correlations(
    ds: &Dataset,
    method: CorrelationMethod,
) -> Result<CorrelationReport, AnalysisError> {
    let numeric = ds.numeric_columns();
    if numeric.len() < 2 {
        return Err(AnalysisError::InsufficientData(format!(
            "correlation needs at least two numeric columns, found {}",
            numeric.len()
        )));
    }

    let n = numeric.len();
    let mut coeffs = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pairwise(method, numeric[i], numeric[j]);
            coeffs[i][j] = r;
            coeffs[j][i] = r;
        }
    }

    let mut strong = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if let Some(r) = coeffs[i][j] {
                if is_strong(r) {
                    strong.push(StrongCorrelation {
                        var1: numeric[i].name.clone(),
                        var2: numeric[j].name.clone(),
                        correlation: r,
                    });
                }
            }
        }
    }

    let matrix = numeric
        .iter()
        .zip(&coeffs)
        .map(|(a, row)| {
            let inner = numeric
                .iter()
                .zip(row)
                .map(|(b, r)| (b.name.clone(), *r))
                .collect();
            (a.name.clone(), inner)
        })
        .collect();

    Ok(CorrelationReport {
        method,
        columns: numeric.iter().map(|c| c.name.clone()).collect(),
        matrix,
        strong_correlations: strong,
    })
}

fn is_strong(r: f64) -> bool {
    r.abs() > STRONG_CORRELATION_THRESHOLD
}

fn pairwise(method: CorrelationMethod, a: &Column, b: &Column) -> Option<f64> {
    let (x, y): (Vec<f64>, Vec<f64>) = a
        .values
        .iter()
        .zip(&b.values)
        .filter_map(|(u, v)| Some((u.as_f64()?, v.as_f64()?)))
        .unzip();
    method.coefficient(&x, &y)
}
