use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::evaluator::Vote;
use crate::fact_pack::AnalystRole;

/// A natural-language analysis source.
///
/// The only contract is "prompt in, text out". Whether the text holds the
/// requested JSON object is checked later by the response parser.
#[async_trait]
pub trait OracleAdapter: Send + Sync + std::fmt::Debug {
    fn source_id(&self) -> &str;

    async fn submit(&self, prompt: &str) -> Result<String>;
}

/// Raw text returned by one oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleResponse {
    #[serde(alias = "source_id")]
    pub source_id: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl OracleResponse {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }
}

/// Settled result of one oracle call inside a council round.
#[derive(Debug)]
pub struct OracleOutcome {
    pub source_id: String,
    pub role: AnalystRole,
    pub result: Result<OracleResponse>,
}

/// What an oracle contributed to a decision, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OracleVerdict {
    Vote(Vote),
    ParseError {
        #[serde(rename = "sourceId")]
        source_id: String,
        reason: String,
    },
    AdapterError {
        #[serde(rename = "sourceId")]
        source_id: String,
        reason: String,
    },
}

impl OracleVerdict {
    pub fn source_id(&self) -> &str {
        match self {
            OracleVerdict::Vote(vote) => &vote.source_id,
            OracleVerdict::ParseError { source_id, .. } => source_id,
            OracleVerdict::AdapterError { source_id, .. } => source_id,
        }
    }

    pub fn vote(&self) -> Option<&Vote> {
        match self {
            OracleVerdict::Vote(vote) => Some(vote),
            _ => None,
        }
    }
}
