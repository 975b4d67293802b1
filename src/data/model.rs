use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::AnalysisError;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. `Null` is the missing-marker.
///
/// Equality, ordering and hashing all agree (floats compare by `total_cmp`
/// and hash by bit pattern, with `-0.0` folded into `0.0`), so rows of
/// values can go into hash sets. Build floats with [`Value::float`] so that
/// NaN becomes `Null`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

// -- Manual Eq/Ord so rows can be de-duplicated --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => unsigned_zero(*a).total_cmp(&unsigned_zero(*b)),
            (Text(a), Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => unsigned_zero(*f).to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

fn unsigned_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::Float(_) => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl Value {
    /// Float cell; NaN is treated as missing.
    pub fn float(v: f64) -> Self {
        if v.is_nan() {
            Value::Null
        } else {
            Value::Float(v)
        }
    }

    /// Interpret the value as an `f64` (integers widen, everything else is `None`).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Map a JSON value onto a cell. Nested arrays/objects are kept as their JSON text.
    pub fn from_json(val: &JsonValue) -> Self {
        match val {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::float(f)
                } else {
                    Value::Text(n.to_string())
                }
            }
            JsonValue::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    /// Like [`Value::from_json`] but only for non-null scalars.
    pub fn from_json_scalar(val: &JsonValue) -> Option<Self> {
        match val {
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
            scalar => Some(Value::from_json(scalar)),
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – declared type derived from a column's cells
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Boolean => "bool",
            ColumnType::Text => "object",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Build a float column from optional numbers (`None` becomes `Null`).
    pub fn from_f64s(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::float))
            .collect();
        Self::new(name, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declared type from the non-null cells. A column with no non-null
    /// cells counts as `float64`.
    pub fn dtype(&self) -> ColumnType {
        let mut saw_int = false;
        let mut saw_float = false;
        let mut saw_bool = false;
        for v in &self.values {
            match v {
                Value::Null => {}
                Value::Integer(_) => saw_int = true,
                Value::Float(_) => saw_float = true,
                Value::Bool(_) => saw_bool = true,
                Value::Text(_) => return ColumnType::Text,
            }
        }
        match (saw_int, saw_float, saw_bool) {
            (_, _, true) if saw_int || saw_float => ColumnType::Text,
            (false, false, true) => ColumnType::Boolean,
            (true, false, false) => ColumnType::Integer,
            _ => ColumnType::Float,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.dtype().is_numeric()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Number of distinct non-null values.
    pub fn distinct_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Cells as optional floats; non-numeric cells read as `None`.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(Value::as_f64).collect()
    }

    /// Non-null numeric cells only.
    pub fn present_f64s(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    /// Widen integer cells to floats when the column also holds floats.
    /// Replace every `Null` with `fill`. An integer fill stored into a float
    /// column is stored as a float, and a float fill widens an integer column.
    pub fn fill_nulls(&mut self, fill: &Value) {
        let fill = match fill {
            Value::Integer(i) if self.dtype() == ColumnType::Float => Value::Float(*i as f64),
            other => other.clone(),
        };
        for v in &mut self.values {
            if v.is_null() {
                *v = fill.clone();
            }
        }
        self.widen_integers();
    }

    pub fn widen_integers(&mut self) {
        let has_float = self.values.iter().any(|v| matches!(v, Value::Float(_)));
        let has_int = self.values.iter().any(|v| matches!(v, Value::Integer(_)));
        if !(has_float && has_int) {
            return;
        }
        for v in &mut self.values {
            if let Value::Integer(i) = v {
                *v = Value::Float(*i as f64);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – rectangular table of named columns
// ---------------------------------------------------------------------------

/// Ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Validate shape and build a dataset.
    pub fn new(columns: Vec<Column>) -> Result<Self, AnalysisError> {
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(AnalysisError::InvalidArgument(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        if let Some(first) = columns.first() {
            let n = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != n) {
                return Err(AnalysisError::InvalidArgument(format!(
                    "column '{}' has {} rows, expected {n}",
                    bad.name,
                    bad.len()
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build a dataset from row-major data.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Value>>) -> Result<Self, AnalysisError> {
        let mut columns: Vec<Column> = names
            .iter()
            .map(|n| Column::new(*n, Vec::with_capacity(rows.len())))
            .collect();
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(AnalysisError::InvalidArgument(format!(
                    "row {i} has {} values, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.values.push(value);
            }
        }
        Self::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    /// Borrow row `i` across all columns.
    pub fn row(&self, i: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[i]).collect()
    }

    /// Whether row `i` contains a missing value.
    pub fn row_has_null(&self, i: usize) -> bool {
        self.columns.iter().any(|c| c.values[i].is_null())
    }

    /// New dataset holding only the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.values[i].clone()).collect()))
            .collect();
        Dataset { columns }
    }

    /// Replace the column with the same name, or append it.
    pub fn set_column(&mut self, column: Column) -> Result<(), AnalysisError> {
        if !self.columns.is_empty() && column.len() != self.n_rows() {
            return Err(AnalysisError::InvalidArgument(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.n_rows()
            )));
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Apply `f` to every cell in place.
    pub fn fill_nulls(&mut self, fill: &Value) {
        for col in &mut self.columns {
            col.fill_nulls(fill);
        }
    }

    /// Shallow footprint estimate in bytes: a fixed 128-byte row index plus
    /// 8 bytes per cell (1 byte for boolean columns).
    pub fn memory_usage(&self) -> usize {
        const INDEX_BYTES: usize = 128;
        INDEX_BYTES
            + self
                .columns
                .iter()
                .map(|c| match c.dtype() {
                    ColumnType::Boolean => c.len(),
                    _ => c.len() * 8,
                })
                .sum::<usize>()
    }
}
