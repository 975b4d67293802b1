//! Exploratory data analysis over one in-memory dataset.
//!
//! A [`Session`] holds at most one [`Dataset`] and exposes `load`,
//! `describe`, `clean`, `engineer_features` and `correlate`, each returning
//! an [`Envelope`]. The [`server`] module puts a line-delimited JSON
//! request loop in front of a session.

pub mod config;
pub mod data;
pub mod envelope;
pub mod error;
pub mod server;
pub mod session;
pub mod transform;

pub use config::{Config, CsvConfig};
pub use data::{Column, ColumnType, Dataset, Value};
pub use envelope::Envelope;
pub use error::{AnalysisError, ErrorKind};
pub use server::Server;
pub use session::Session;
