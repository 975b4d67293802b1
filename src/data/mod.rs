//! Data layer: core types and loading.
//!
//! Architecture:
//! ```text
//!  .csv / .tsv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ Dataset   │  Vec<Column>, equal row counts
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;

pub use loader::load_file;
pub use model::{Column, ColumnType, Dataset, Value};
