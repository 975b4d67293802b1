use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One row of the demo dataset.
#[derive(Clone)]
struct Row {
    id: i64,
    sample: String,
    operator: String,
    concentration: Option<f64>,
    absorbance: f64,
    temperature: f64,
    valid: bool,
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row> {
    let samples = ["Sample_A", "Sample_B", "Sample_C"];
    let concentrations = [0.1, 0.5, 1.0, 2.0, 5.0];
    let operators = ["Alice", "Bob"];

    let mut rows = Vec::new();
    let mut id = 0;
    for (s_idx, sample) in samples.iter().enumerate() {
        let slope = 0.8 + 0.1 * s_idx as f64;
        for &conc in &concentrations {
            for &operator in &operators {
                let absorbance = slope * conc + rng.gauss(0.0, 0.05);
                let temperature = rng.gauss(22.0, 1.5);
                // every seventh concentration reading is missing
                let concentration = (id % 7 != 6).then_some(conc);
                rows.push(Row {
                    id,
                    sample: sample.to_string(),
                    operator: operator.to_string(),
                    concentration,
                    absorbance,
                    temperature,
                    valid: rng.next_f64() > 0.1,
                });
                id += 1;
            }
        }
    }

    // exact duplicates of two rows, for drop_duplicates
    for dup in [3, 11] {
        rows.push(rows[dup].clone());
    }
    rows
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV output")?;
    writer.write_record([
        "id",
        "sample",
        "operator",
        "concentration",
        "absorbance",
        "temperature",
        "valid",
    ])?;
    for r in rows {
        writer.write_record([
            r.id.to_string(),
            r.sample.clone(),
            r.operator.clone(),
            r.concentration.map(|c| c.to_string()).unwrap_or_default(),
            r.absorbance.to_string(),
            r.temperature.to_string(),
            r.valid.to_string(),
        ])?;
    }
    writer.flush().context("flushing CSV output")?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("sample", DataType::Utf8, false),
        Field::new("operator", DataType::Utf8, false),
        Field::new("concentration", DataType::Float64, true),
        Field::new("absorbance", DataType::Float64, false),
        Field::new("temperature", DataType::Float64, false),
        Field::new("valid", DataType::Boolean, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.id))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.sample.as_str()))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.operator.as_str()))),
        Arc::new(Float64Array::from(rows.iter().map(|r| r.concentration).collect::<Vec<_>>())),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.absorbance))),
        Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.temperature))),
        Arc::new(BooleanArray::from(rows.iter().map(|r| r.valid).collect::<Vec<_>>())),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating parquet output")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    write_csv(&rows, "sample_data.csv")?;
    write_parquet(&rows, "sample_data.parquet")?;

    println!(
        "Wrote {} rows to sample_data.csv and sample_data.parquet",
        rows.len()
    );
    Ok(())
}
