use async_trait::async_trait;
use tracing::info;

use super::adapter::OracleAdapter;
use crate::error::Result;
use crate::fact_pack::FactPack;

/// Offline stand-in for a real oracle, used for `--sim` runs.
///
/// Leans toward the side the math model favours (net rating difference
/// when there is no model) and answers in a fenced JSON block, the way the
/// hosted models usually do. Output is deterministic.
#[derive(Debug, Clone)]
pub struct SimulatedOracle {
    source_id: String,
    answer: String,
}

impl SimulatedOracle {
    /// `confidence_bias` shifts this oracle's confidence so that several
    /// simulated oracles do not answer identically.
    pub fn from_fact_pack(source_id: impl Into<String>, fact_pack: &FactPack, confidence_bias: i32) -> Self {
        let leaning = Self::home_leaning(fact_pack);

        let (winner, cited) = if leaning >= 0.0 {
            (&fact_pack.teams.home, "home")
        } else {
            (&fact_pack.teams.away, "away")
        };

        let base = 55.0 + (leaning.abs() * 100.0).min(30.0);
        let confidence = (base.round() as i32 + confidence_bias).clamp(0, 100);

        let answer = format!(
            "```json\n{}\n```",
            serde_json::json!({
                "winner": winner,
                "confidence": confidence,
                "reason": format!("Simulated read: {} side leaning {:+.3}", cited, leaning),
            })
        );

        Self {
            source_id: source_id.into(),
            answer,
        }
    }

    /// Positive favours home.
    fn home_leaning(fact_pack: &FactPack) -> f64 {
        if let Some(model) = &fact_pack.math_model {
            if let (Some(p_home), Some(p_away)) = (model.p_home, model.p_away) {
                return p_home - p_away;
            }
        }

        let metrics = &fact_pack.team_metrics;
        let home = metrics.home.net_rating.as_ref().and_then(|f| f.as_f64());
        let away = metrics.away.net_rating.as_ref().and_then(|f| f.as_f64());
        match (home, away) {
            (Some(h), Some(a)) => (h - a) / 100.0,
            _ => 0.0,
        }
    }
}

#[async_trait]
impl OracleAdapter for SimulatedOracle {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn submit(&self, _prompt: &str) -> Result<String> {
        info!("[SIMULATION] {} answering from fact pack", self.source_id);
        Ok(self.answer.clone())
    }
}
