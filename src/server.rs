//! Line-delimited JSON front end for a [`Session`].
//!
//! Each input line is one request, each output line one response:
//!
//! ```text
//! → {"id": 1, "method": "load", "params": {"path": "data.csv"}}
//! ← {"id": 1, "status": "success", "payload": {...}}
//! ```

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::envelope::Envelope;
use crate::error::AnalysisError;
use crate::session::Session;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: JsonValue,
    pub method: String,
    #[serde(default)]
    pub params: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub id: JsonValue,
    #[serde(flatten)]
    pub envelope: Envelope,
}

/// Owns one session and feeds it requests one at a time.
#[derive(Debug, Default)]
pub struct Server {
    session: Session,
}

impl Server {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn handle(&mut self, request: Request) -> Response {
        log::debug!("request {} id={}", request.method, request.id);
        let envelope = dispatch(&mut self.session, &request.method, &request.params);
        Response {
            id: request.id,
            envelope,
        }
    }

    /// Decode and answer one request line. Undecodable lines get an error
    /// response with a null id.
    pub fn handle_line(&mut self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                log::warn!("rejecting malformed request: {e}");
                Response {
                    id: JsonValue::Null,
                    envelope: Envelope::error(&AnalysisError::InvalidArgument(format!(
                        "malformed request: {e}"
                    ))),
                }
            }
        }
    }

    /// Serve until `input` reaches EOF. Only I/O failures end the loop early.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("reading request")?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response).context("encoding response")?;
            output.write_all(b"\n").context("writing response")?;
            output.flush().context("flushing response")?;
        }
        log::info!("input closed, shutting down");
        Ok(())
    }
}

fn dispatch(session: &mut Session, method: &str, params: &JsonValue) -> Envelope {
    match method {
        "load" | "load_csv" => match str_param(params, &["path", "file_path"]) {
            Ok(path) => session.load(path),
            Err(e) => Envelope::error(&e),
        },
        "describe" | "describe_dataset" => session.describe(),
        "clean" | "clean_dataset" => {
            let options = params.get("options").unwrap_or(params);
            session.clean(options)
        }
        "engineer_features" | "engineerFeatures" | "feature_engineering" => {
            let specs = if params.is_array() {
                Some(params)
            } else {
                params.get("specs").or_else(|| params.get("features"))
            };
            match specs {
                Some(specs) => session.engineer_features(specs),
                None => Envelope::error(&AnalysisError::InvalidArgument(
                    "missing parameter 'specs'".to_string(),
                )),
            }
        }
        "correlate" | "calculate_correlations" => match params.get("method") {
            None | Some(JsonValue::Null) => session.correlate("pearson"),
            Some(JsonValue::String(m)) => session.correlate(m),
            Some(other) => Envelope::error(&AnalysisError::InvalidArgument(format!(
                "parameter 'method' must be a string, got {other}"
            ))),
        },
        other => Envelope::error(&AnalysisError::InvalidArgument(format!(
            "unknown method '{other}'"
        ))),
    }
}

/// First of `keys` present in `params` as a string.
fn str_param<'a>(params: &'a JsonValue, keys: &[&str]) -> Result<&'a str, AnalysisError> {
    keys.iter()
        .find_map(|k| params.get(*k))
        .ok_or_else(|| AnalysisError::InvalidArgument(format!("missing parameter '{}'", keys[0])))?
        .as_str()
        .ok_or_else(|| AnalysisError::InvalidArgument(format!("parameter '{}' must be a string", keys[0])))
}
