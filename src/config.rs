use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::CourtSeerError;
use crate::evaluator::consensus::{UnresolvedPolicy, DEFAULT_QUORUM};
use crate::evaluator::decision_maker::{
    DEFAULT_CONFIDENCE_HIGH, DEFAULT_CONFIDENCE_MEDIUM, DEFAULT_EDGE_THRESHOLD,
};
use crate::fact_pack::{AnalystRole, FactPack};
use crate::oracle::council::{DEFAULT_MAX_CONCURRENCY, DEFAULT_ORACLE_TIMEOUT};
use crate::oracle::providers::{
    DEFAULT_CLAUDE_MODEL, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL,
};
use crate::oracle::{AnthropicOracle, GeminiOracle, OpenAiOracle, OracleCouncil, SimulatedOracle};

/// Decision policy knobs. Built once per process and handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Agreeing votes needed for consensus. Not scaled to the number of
    /// oracles that answered.
    pub quorum: usize,
    pub edge_threshold: f64,
    pub confidence_high: u8,
    pub confidence_medium: u8,
    /// Consensus gate only passes when the oracles back the edge side.
    pub require_side_agreement: bool,
    pub unresolved_policy: UnresolvedPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quorum: DEFAULT_QUORUM,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            confidence_high: DEFAULT_CONFIDENCE_HIGH,
            confidence_medium: DEFAULT_CONFIDENCE_MEDIUM,
            require_side_agreement: true,
            unresolved_policy: UnresolvedPolicy::CountAsAway,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config at {:?}", path))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid engine config JSON at {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.quorum == 0 {
            return Err(CourtSeerError::config_error("quorum must be at least 1"));
        }
        if !self.edge_threshold.is_finite() || self.edge_threshold < 0.0 {
            return Err(CourtSeerError::config_error("edge_threshold must be a non-negative number"));
        }
        if self.confidence_medium > self.confidence_high || self.confidence_high > 100 {
            return Err(CourtSeerError::config_error(
                "confidence thresholds must satisfy medium <= high <= 100",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub claude_api_key: Option<String>,
    pub claude_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    /// Source id for the OpenAI-compatible seat, e.g. "Perplexity" when the
    /// base URL points elsewhere.
    pub openai_source_name: String,

    // Council settings
    pub oracle_timeout_secs: u64,
    pub max_concurrency: usize,

    pub audit_log_dir: PathBuf,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            claude_api_key: None,
            claude_model: DEFAULT_CLAUDE_MODEL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_source_name: "OpenAI".to_string(),
            oracle_timeout_secs: DEFAULT_ORACLE_TIMEOUT.as_secs(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            audit_log_dir: PathBuf::from("./logs"),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs.max(1))
    }

    /// Seats one oracle per configured API key: Gemini as the general
    /// analyst, Claude on defense, OpenAI on offense and value.
    pub fn build_council(&self) -> OracleCouncil {
        let mut council = OracleCouncil::new(self.oracle_timeout(), self.max_concurrency);

        if let Some(key) = &self.gemini_api_key {
            council = council.with_oracle(
                Arc::new(GeminiOracle::new(key.clone(), self.gemini_model.clone())),
                AnalystRole::General,
            );
        }

        if let Some(key) = &self.claude_api_key {
            council = council.with_oracle(
                Arc::new(AnthropicOracle::new(key.clone(), self.claude_model.clone())),
                AnalystRole::Defensive,
            );
        }

        if let Some(key) = &self.openai_api_key {
            let oracle = OpenAiOracle::new(key.clone(), self.openai_model.clone())
                .with_base_url(self.openai_base_url.clone())
                .with_name(self.openai_source_name.clone());
            council = council.with_oracle(Arc::new(oracle), AnalystRole::Offensive);
        }

        council
    }

    /// Three offline oracles answering from the fact pack itself.
    pub fn build_simulated_council(&self, fact_pack: &FactPack) -> OracleCouncil {
        let seats = [
            ("Gemini (sim)", AnalystRole::General, 0),
            ("Claude (sim)", AnalystRole::Defensive, -4),
            ("OpenAI (sim)", AnalystRole::Offensive, 3),
        ];

        seats
            .into_iter()
            .fold(
                OracleCouncil::new(self.oracle_timeout(), self.max_concurrency),
                |council, (id, role, bias)| {
                    council.with_oracle(Arc::new(SimulatedOracle::from_fact_pack(id, fact_pack, bias)), role)
                },
            )
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub async fn load_config() -> Result<Config> {
    let mut config = Config::default();

    // Override defaults with environment variables
    config.gemini_api_key = env::var("GEMINI_API_KEY").ok().and_then(non_blank);
    config.claude_api_key = env::var("CLAUDE_API_KEY").ok().and_then(non_blank);
    config.openai_api_key = env::var("OPENAI_API_KEY").ok().and_then(non_blank);

    if let Ok(model) = env::var("GEMINI_MODEL") {
        config.gemini_model = model;
    }

    if let Ok(model) = env::var("CLAUDE_MODEL") {
        config.claude_model = model;
    }

    if let Ok(model) = env::var("OPENAI_MODEL") {
        config.openai_model = model;
    }

    if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
        config.openai_base_url = base_url;
    }

    if let Some(name) = env::var("OPENAI_SOURCE_NAME").ok().and_then(non_blank) {
        config.openai_source_name = name;
    }

    if let Ok(secs) = env::var("ORACLE_TIMEOUT_SECS") {
        config.oracle_timeout_secs = secs
            .parse()
            .with_context(|| format!("ORACLE_TIMEOUT_SECS is not a number: {}", secs))?;
    }

    if let Ok(limit) = env::var("ORACLE_MAX_CONCURRENCY") {
        config.max_concurrency = limit
            .parse()
            .with_context(|| format!("ORACLE_MAX_CONCURRENCY is not a number: {}", limit))?;
    }

    if let Ok(dir) = env::var("AUDIT_LOG_DIR") {
        config.audit_log_dir = PathBuf::from(dir);
    }

    Ok(config)
}

pub async fn initialize_config() -> Result<()> {
    info!("Checking oracle configuration...");

    let config = load_config().await?;

    let oracles = [
        ("Gemini", config.gemini_api_key.is_some(), "GEMINI_API_KEY", &config.gemini_model),
        ("Claude", config.claude_api_key.is_some(), "CLAUDE_API_KEY", &config.claude_model),
        ("OpenAI", config.openai_api_key.is_some(), "OPENAI_API_KEY", &config.openai_model),
    ];

    let mut configured = 0;
    for (name, present, var, model) in oracles {
        if present {
            info!("{} oracle configured (model {})", name, model);
            configured += 1;
        } else {
            warn!("{} oracle disabled: {} not set", name, var);
        }
    }

    if configured < config.engine.quorum {
        warn!(
            "Only {} oracles configured; consensus needs {} agreeing votes and will never be reached",
            configured, config.engine.quorum
        );
    }

    std::fs::create_dir_all(&config.audit_log_dir)
        .with_context(|| format!("Failed to create audit log dir {:?}", config.audit_log_dir))?;
    info!("Audit trail will be written to {:?}", config.audit_log_dir);

    info!("Configuration check complete!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.quorum, 3);
        assert_eq!(engine.edge_threshold, 0.03);
        assert_eq!(engine.confidence_high, 70);
        assert_eq!(engine.confidence_medium, 60);
        assert!(engine.require_side_agreement);
        assert_eq!(engine.unresolved_policy, UnresolvedPolicy::CountAsAway);
    }

    #[test]
    fn test_engine_config_partial_json() {
        let engine: EngineConfig =
            serde_json::from_str(r#"{"require_side_agreement": false, "unresolved_policy": "abstain"}"#).unwrap();
        assert!(!engine.require_side_agreement);
        assert_eq!(engine.unresolved_policy, UnresolvedPolicy::Abstain);
        assert_eq!(engine.quorum, 3);
        assert!(engine.validate().is_ok());
    }

    #[test]
    fn test_engine_config_rejects_inverted_thresholds() {
        let engine = EngineConfig {
            confidence_high: 55,
            confidence_medium: 60,
            ..Default::default()
        };
        assert!(engine.validate().is_err());
    }

    #[test]
    fn test_engine_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"quorum": 2, "edge_threshold": 0.05}"#).unwrap();

        let engine = EngineConfig::from_file(&path).unwrap();
        assert_eq!(engine.quorum, 2);
        assert_eq!(engine.edge_threshold, 0.05);
    }

    #[test]
    fn test_council_only_seats_configured_oracles() {
        let config = Config {
            claude_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert_eq!(config.build_council().source_ids(), vec!["Claude".to_string()]);
        assert!(Config::default().build_council().is_empty());
    }

    #[test]
    fn test_openai_compatible_seat_uses_configured_name() {
        let config = Config {
            openai_api_key: Some("pplx-test".to_string()),
            openai_base_url: "https://api.perplexity.ai".to_string(),
            openai_source_name: "Perplexity".to_string(),
            ..Default::default()
        };
        assert_eq!(config.build_council().source_ids(), vec!["Perplexity".to_string()]);
        assert_eq!(
            Config {
                openai_api_key: Some("sk-test".to_string()),
                ..Default::default()
            }
            .build_council()
            .source_ids(),
            vec!["OpenAI".to_string()]
        );
    }

    #[test]
    fn test_simulated_council_has_three_seats() {
        let pack = FactPack::new("Boston Celtics", "Miami Heat");
        assert_eq!(Config::default().build_simulated_council(&pack).len(), 3);
    }
}
