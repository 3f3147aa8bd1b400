use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `POST /query` request body.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    #[error("question must not be empty")]
    EmptyQuestion,
}

impl QuestionRequest {
    pub fn parse_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), QuestionValidationError> {
        if self.question.trim().is_empty() {
            return Err(QuestionValidationError::EmptyQuestion);
        }
        Ok(())
    }
}

/// A single matched edge, rendered for the `results` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResultRecord {
    pub source: String,
    pub relation: String,
    pub target: String,
    pub confidence: f32,
    pub source_url: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

/// `POST /query` response body. Never errors on "no match": an empty `results` with the
/// fixed-text answer is itself the well-formed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResponse {
    pub answer: String,
    pub path: Vec<String>,
    pub results: Vec<QueryResultRecord>,
    pub query: String,
}

pub const NO_ANSWER: &str = "I don't have enough information to answer that.";
