//! Candidate sources.
//!
//! The search core never fetches data itself. A [`CandidateSource`] produces
//! a snapshot of profiles that the consumer hands to the orchestrator and
//! refreshes whenever it likes.

pub mod json_file;

use thiserror::Error;

use crate::model::types::Candidate;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("candidate file not found: {0}")]
    NotFound(String),

    #[error("failed to read candidates: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse candidates: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unexpected candidate document shape: {0}")]
    Shape(String),
}

#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub detected: bool,
    pub evidence: Vec<String>,
}

impl DetectionResult {
    pub fn not_found() -> Self {
        Self {
            detected: false,
            evidence: Vec::new(),
        }
    }
}

pub trait CandidateSource {
    fn name(&self) -> &str;
    fn detect(&self) -> DetectionResult;
    fn load(&self) -> Result<Vec<Candidate>, SourceError>;
}
