use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Dataset, Value};
use crate::config::CsvConfig;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` (and anything unrecognised) – delimited text with a header row
/// * `.tsv`     – tab-delimited text with a header row
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.parquet` – flat Parquet file with scalar columns
pub fn load_file(path: &Path, config: &CsvConfig) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "tsv" => load_delimited(path, b'\t', config),
        _ => {
            let delimiter = config
                .delimiter_byte()
                .with_context(|| format!("delimiter {:?} is not a single ASCII byte", config.delimiter))?;
            load_delimited(path, delimiter, config)
        }
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "Parsed {} ({} rows x {} columns)",
        path.display(),
        dataset.n_rows(),
        dataset.n_cols()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Delimited-text loader
// ---------------------------------------------------------------------------

/// Header row with column names, then one record per row. Every record must
/// carry exactly as many fields as the header.
fn load_delimited(path: &Path, delimiter: u8, config: &CsvConfig) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .context("opening delimited file")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() {
        bail!("no header row found");
    }

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("malformed record at data row {row_no}"))?;
        for (col_idx, cell) in record.iter().enumerate() {
            let cell = if config.is_null(cell) {
                None
            } else if config.trim_whitespace {
                Some(cell.trim().to_string())
            } else {
                Some(cell.to_string())
            };
            raw[col_idx].push(cell);
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_column(name, cells))
        .collect();
    Ok(Dataset::new(columns)?)
}

/// Pick one type for the whole column: integer, then float, then boolean,
/// falling back to text.
fn infer_column(name: String, cells: Vec<Option<String>>) -> Column {
    let present = || cells.iter().flatten();

    let values = if present().all(|s| s.parse::<i64>().is_ok()) {
        cells
            .iter()
            .map(|c| c.as_deref().and_then(|s| s.parse().ok()).map_or(Value::Null, Value::Integer))
            .collect()
    } else if present().all(|s| s.parse::<f64>().is_ok()) {
        cells
            .iter()
            .map(|c| c.as_deref().and_then(|s| s.parse().ok()).map_or(Value::Null, Value::float))
            .collect()
    } else if present().all(|s| parse_bool(s).is_some()) {
        cells
            .iter()
            .map(|c| c.as_deref().and_then(parse_bool).map_or(Value::Null, Value::Bool))
            .collect()
    } else {
        cells
            .into_iter()
            .map(|c| c.map_or(Value::Null, Value::Text))
            .collect()
    };

    Column::new(name, values)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON:
///
/// ```json
/// [
///   { "sample": "A", "concentration": 1.5 },
///   { "sample": "B", "concentration": null, "operator": "Bob" }
/// ]
/// ```
///
/// Columns appear in first-seen key order; keys missing from a record are null.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<Column> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !index.contains_key(key) {
                index.insert(key.clone(), columns.len());
                columns.push(Column::new(key.clone(), vec![Value::Null; i]));
            }
        }
        for col in &mut columns {
            let value = obj.get(&col.name).map_or(Value::Null, Value::from_json);
            col.values.push(value);
        }
    }

    for col in &mut columns {
        col.widen_integers();
    }
    Ok(Dataset::new(columns)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file. Scalar columns map onto cells directly; any
/// other Arrow type is rendered as text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let mut columns: Vec<Column> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| Column::new(f.name().clone(), Vec::new()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                let value = arrow_cell(array, row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", column.name))?;
                column.values.push(value);
            }
        }
    }

    for col in &mut columns {
        col.widen_integers();
    }
    Ok(Dataset::new(columns)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &ArrayRef, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Boolean => Value::Bool(col.as_boolean().value(row)),
        DataType::Int8 => Value::Integer(col.as_primitive::<Int8Type>().value(row).into()),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row).into()),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row).into()),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => Value::Integer(col.as_primitive::<UInt8Type>().value(row).into()),
        DataType::UInt16 => Value::Integer(col.as_primitive::<UInt16Type>().value(row).into()),
        DataType::UInt32 => Value::Integer(col.as_primitive::<UInt32Type>().value(row).into()),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(Value::float(v as f64), Value::Integer)
        }
        DataType::Float32 => Value::float(col.as_primitive::<Float32Type>().value(row).into()),
        DataType::Float64 => Value::float(col.as_primitive::<Float64Type>().value(row)),
        _ => Value::Text(array_value_to_string(col, row).context("formatting arrow value")?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnType;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn csv_types_and_nulls() {
        let file = write_temp(
            ".csv",
            "id,score,flag,name\n1,1.5,true,alice\n2,,false,NA\n3,2,True,carol\n",
        );
        let ds = load_file(file.path(), &CsvConfig::default()).unwrap();

        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.column_names(), vec!["id", "score", "flag", "name"]);
        assert_eq!(ds.column("id").unwrap().dtype(), ColumnType::Integer);
        assert_eq!(ds.column("score").unwrap().dtype(), ColumnType::Float);
        assert_eq!(ds.column("flag").unwrap().dtype(), ColumnType::Boolean);
        assert_eq!(ds.column("name").unwrap().dtype(), ColumnType::Text);

        let score = &ds.column("score").unwrap().values;
        assert_eq!(score[1], Value::Null);
        assert_eq!(score[2], Value::Float(2.0));
        assert_eq!(ds.column("name").unwrap().values[1], Value::Null);
    }

    #[test]
    fn ragged_rows_fail() {
        let file = write_temp(".csv", "a,b\n1,2\n3\n");
        let err = load_file(file.path(), &CsvConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("malformed record"));
    }

    #[test]
    fn missing_file_fails() {
        let err = load_file(Path::new("/definitely/not/here.csv"), &CsvConfig::default());
        assert!(err.is_err());
    }

    #[test]
    fn duplicate_headers_fail() {
        let file = write_temp(".csv", "a,a\n1,2\n");
        assert!(load_file(file.path(), &CsvConfig::default()).is_err());
    }

    #[test]
    fn custom_delimiter_and_tsv() {
        let file = write_temp(".txt", "a;b\n1;x\n");
        let config = CsvConfig {
            delimiter: ';',
            ..CsvConfig::default()
        };
        let ds = load_file(file.path(), &config).unwrap();
        assert_eq!(ds.column("b").unwrap().values, vec![Value::Text("x".into())]);

        let tsv = write_temp(".tsv", "a\tb\n1\t2\n");
        let ds = load_file(tsv.path(), &CsvConfig::default()).unwrap();
        assert_eq!(ds.n_cols(), 2);
    }

    #[test]
    fn json_records_fill_missing_keys() {
        let file = write_temp(
            ".json",
            r#"[{"a": 1, "b": "x"}, {"a": 2.5, "c": true}]"#,
        );
        let ds = load_file(file.path(), &CsvConfig::default()).unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b", "c"]);
        assert_eq!(ds.column("a").unwrap().values, vec![Value::Float(1.0), Value::Float(2.5)]);
        assert_eq!(ds.column("b").unwrap().values[1], Value::Null);
        assert_eq!(ds.column("c").unwrap().values[0], Value::Null);
    }

    #[test]
    fn json_must_be_array_of_objects() {
        let file = write_temp(".json", r#"{"a": 1}"#);
        assert!(load_file(file.path(), &CsvConfig::default()).is_err());
        let file = write_temp(".json", r#"[1, 2]"#);
        assert!(load_file(file.path(), &CsvConfig::default()).is_err());
    }

    #[test]
    fn parquet_round_trips_scalar_columns() {
        use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;
        use std::sync::Arc;

        let schema = Arc::new(Schema::new(vec![
            Field::new("n", DataType::Int32, true),
            Field::new("x", DataType::Float64, true),
            Field::new("s", DataType::Utf8, true),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(vec![Some(1), None])),
            Arc::new(Float64Array::from(vec![0.5, 1.5])),
            Arc::new(StringArray::from(vec![Some("a"), None])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path(), &CsvConfig::default()).unwrap();
        assert_eq!(ds.column_names(), vec!["n", "x", "s"]);
        assert_eq!(ds.column("n").unwrap().values, vec![Value::Integer(1), Value::Null]);
        assert_eq!(ds.column("x").unwrap().dtype(), ColumnType::Float);
        assert_eq!(ds.column("s").unwrap().values[1], Value::Null);
    }

    #[test]
    fn parquet_nan_is_missing() {
        use arrow::array::{ArrayRef, Float64Array};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;
        use std::sync::Arc;

        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Float64, true)]));
        let columns: Vec<ArrayRef> = vec![Arc::new(Float64Array::from(vec![1.0, f64::NAN, 3.0]))];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(file.path(), &CsvConfig::default()).unwrap();
        let x = ds.column("x").unwrap();
        assert_eq!(x.values, vec![Value::Float(1.0), Value::Null, Value::Float(3.0)]);
        assert_eq!(x.null_count(), 1);
    }
}
