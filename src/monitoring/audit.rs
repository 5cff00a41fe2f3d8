use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::engine::Prediction;
use crate::fact_pack::FactPack;

const AUDIT_FILE: &str = "predictions.jsonl";

/// One evaluated game: the evidence that went in and what came out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    pub matchup: String,
    pub fact_pack: FactPack,
    pub prediction: Prediction,
}

impl AuditRecord {
    pub fn new(fact_pack: &FactPack, prediction: &Prediction) -> Self {
        Self {
            timestamp: Utc::now(),
            game_id: fact_pack.game_id.clone(),
            matchup: fact_pack.matchup(),
            fact_pack: fact_pack.clone(),
            prediction: prediction.clone(),
        }
    }
}

/// Append-only JSON Lines trail of predictions.
pub struct AuditLog {
    log_path: PathBuf,
}

impl AuditLog {
    pub fn new(log_dir: Option<&Path>) -> Result<Self> {
        let log_dir = log_dir.unwrap_or_else(|| Path::new("./logs"));

        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create audit log dir {:?}", log_dir))?;

        Ok(Self {
            log_path: log_dir.join(AUDIT_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub async fn record(&self, fact_pack: &FactPack, prediction: &Prediction) -> Result<AuditRecord> {
        let record = AuditRecord::new(fact_pack, prediction);
        info!(
            "Recording {} -> {} ({})",
            record.matchup, prediction.predicted_winner, prediction.decision.action
        );

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await
            .with_context(|| format!("Failed to open audit log {:?}", self.log_path))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(record)
    }

    /// Oldest first. Lines that no longer decode are skipped.
    pub async fn history(&self) -> Result<Vec<AuditRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.log_path)
            .await
            .with_context(|| format!("Failed to read audit log {:?}", self.log_path))?;

        let records = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .filter_map(|(index, line)| match serde_json::from_str(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping audit line {}: {}", index + 1, e);
                    None
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ConsensusEngine;
    use crate::oracle::OracleResponse;

    fn evaluated() -> (FactPack, Prediction) {
        let pack = FactPack::new("Boston Celtics", "Miami Heat");
        let prediction = ConsensusEngine::default().evaluate(
            &pack,
            &[OracleResponse::new("Gemini", r#"{"winner": "Celtics", "confidence": 66, "reason": "depth"}"#)],
        );
        (pack, prediction)
    }

    #[tokio::test]
    async fn test_history_is_empty_before_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(Some(dir.path())).unwrap();
        assert!(log.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_records_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(Some(dir.path())).unwrap();
        let (pack, prediction) = evaluated();

        log.record(&pack, &prediction).await.unwrap();
        let mut later = pack.clone();
        later.game_id = Some("0022400123".to_string());
        log.record(&later, &prediction).await.unwrap();

        let history = log.history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].matchup, "Miami Heat @ Boston Celtics");
        assert_eq!(history[0].prediction, prediction);
        assert_eq!(history[1].game_id.as_deref(), Some("0022400123"));
    }

    #[tokio::test]
    async fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(Some(dir.path())).unwrap();
        let (pack, prediction) = evaluated();

        log.record(&pack, &prediction).await.unwrap();
        let mut raw = std::fs::read_to_string(log.path()).unwrap();
        raw.push_str("{not json\n");
        std::fs::write(log.path(), raw).unwrap();

        assert_eq!(log.history().await.unwrap().len(), 1);
    }
}
