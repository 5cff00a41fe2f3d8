use thiserror::Error;
use std::io;

#[derive(Error, Debug)]
pub enum CourtSeerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Oracle {source_id} unavailable: {reason}")]
    OracleUnavailable { source_id: String, reason: String },

    #[error("Oracle {source_id} timed out after {secs}s")]
    OracleTimeout { source_id: String, secs: u64 },

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl CourtSeerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn oracle_unavailable(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::OracleUnavailable {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    pub fn oracle_timeout(source_id: impl Into<String>, secs: u64) -> Self {
        Self::OracleTimeout {
            source_id: source_id.into(),
            secs,
        }
    }

    pub fn parse_failure(msg: impl Into<String>) -> Self {
        Self::ParseFailure(msg.into())
    }

    pub fn validation_error(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CourtSeerError>;
