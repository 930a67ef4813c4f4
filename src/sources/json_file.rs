use std::path::{Path, PathBuf};

use serde_json::Value;

use super::{CandidateSource, DetectionResult, SourceError};
use crate::model::types::Candidate;

/// Keys under which an exported profile dump may nest its rows.
const WRAPPER_KEYS: &[&str] = &["candidates", "profiles"];

/// Reads candidates from a JSON export: either a top-level array or an
/// object wrapping the array under `candidates` / `profiles`.
///
/// Rows that don't deserialize are logged and skipped.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rows(doc: Value) -> Result<Vec<Value>, SourceError> {
        match doc {
            Value::Array(rows) => Ok(rows),
            Value::Object(mut map) => WRAPPER_KEYS
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(rows)) => Some(rows),
                    _ => None,
                })
                .ok_or_else(|| {
                    SourceError::Shape(format!(
                        "object without a {} array",
                        WRAPPER_KEYS.join("/")
                    ))
                }),
            other => Err(SourceError::Shape(format!(
                "expected array or object, found {}",
                value_kind(&other)
            ))),
        }
    }
}

impl CandidateSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-file"
    }

    fn detect(&self) -> DetectionResult {
        if self.path.is_file() {
            DetectionResult {
                detected: true,
                evidence: vec![format!("found {}", self.path.display())],
            }
        } else {
            DetectionResult::not_found()
        }
    }

    fn load(&self) -> Result<Vec<Candidate>, SourceError> {
        let _span = tracing::info_span!("json_file_load", path = %self.path.display()).entered();
        if !self.path.exists() {
            return Err(SourceError::NotFound(self.path.display().to_string()));
        }

        let content = std::fs::read_to_string(&self.path)?;
        let doc: Value = serde_json::from_str(&content)?;

        let mut candidates = Vec::new();
        let mut skipped = 0usize;
        for (idx, row) in Self::rows(doc)?.into_iter().enumerate() {
            match serde_json::from_value::<Candidate>(row) {
                Ok(candidate) => candidates.push(candidate),
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(row = idx, error = %err, "candidate_row_skipped");
                }
            }
        }

        tracing::info!(
            source = self.name(),
            count = candidates.len(),
            skipped,
            "candidates_loaded"
        );
        Ok(candidates)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
