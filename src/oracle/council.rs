use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::adapter::{OracleAdapter, OracleOutcome, OracleResponse};
use crate::error::CourtSeerError;
use crate::fact_pack::{AnalystRole, FactPack, PromptBuilder};

pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

#[derive(Debug, Clone)]
struct CouncilSeat {
    adapter: Arc<dyn OracleAdapter>,
    role: AnalystRole,
}

/// Fans one fact pack out to every seated oracle and waits for all of them
/// to settle.
///
/// Each call runs in its own task with its own timeout. A failing,
/// panicking or slow oracle only loses its own seat; the outcome list keeps
/// the seating order regardless of which oracle answered first.
#[derive(Debug, Clone)]
pub struct OracleCouncil {
    seats: Vec<CouncilSeat>,
    timeout: Duration,
    max_concurrency: usize,
}

impl Default for OracleCouncil {
    fn default() -> Self {
        Self::new(DEFAULT_ORACLE_TIMEOUT, DEFAULT_MAX_CONCURRENCY)
    }
}

impl OracleCouncil {
    pub fn new(timeout: Duration, max_concurrency: usize) -> Self {
        Self {
            seats: Vec::new(),
            timeout,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn with_oracle(mut self, adapter: Arc<dyn OracleAdapter>, role: AnalystRole) -> Self {
        self.seats.push(CouncilSeat { adapter, role });
        self
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.seats
            .iter()
            .map(|seat| seat.adapter.source_id().to_string())
            .collect()
    }

    pub async fn convene(&self, fact_pack: &FactPack) -> Vec<OracleOutcome> {
        info!(
            "Sending {} to a council of {} oracles",
            fact_pack.matchup(),
            self.seats.len()
        );

        let calls = self.seats.iter().map(|seat| {
            let adapter = Arc::clone(&seat.adapter);
            let role = seat.role;
            let prompt = PromptBuilder::build(role, fact_pack);
            let timeout = self.timeout;

            async move {
                let source_id = adapter.source_id().to_string();
                let task = tokio::spawn(async move {
                    tokio::time::timeout(timeout, adapter.submit(&prompt)).await
                });

                let result = match task.await {
                    Ok(Ok(Ok(text))) => {
                        info!("{} ({}) answered", source_id, role);
                        Ok(OracleResponse::new(source_id.clone(), text))
                    }
                    Ok(Ok(Err(e))) => {
                        error!("{} prediction failed: {}", source_id, e);
                        Err(match e {
                            unavailable @ CourtSeerError::OracleUnavailable { .. } => unavailable,
                            other => CourtSeerError::oracle_unavailable(&source_id, other.to_string()),
                        })
                    }
                    Ok(Err(_elapsed)) => {
                        warn!("{} timed out after {:?}", source_id, timeout);
                        Err(CourtSeerError::oracle_timeout(&source_id, timeout.as_secs()))
                    }
                    Err(join_error) => {
                        error!("{} task aborted: {}", source_id, join_error);
                        Err(CourtSeerError::oracle_unavailable(&source_id, join_error.to_string()))
                    }
                };

                OracleOutcome {
                    source_id,
                    role,
                    result,
                }
            }
        });

        let outcomes: Vec<OracleOutcome> = stream::iter(calls)
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let answered = outcomes.iter().filter(|o| o.result.is_ok()).count();
        info!("Council settled: {}/{} oracles answered", answered, outcomes.len());

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct ScriptedOracle {
        id: String,
        delay: Duration,
        reply: std::result::Result<String, String>,
    }

    impl ScriptedOracle {
        fn answering(id: &str, delay_ms: u64, text: &str) -> Arc<dyn OracleAdapter> {
            Arc::new(Self {
                id: id.to_string(),
                delay: Duration::from_millis(delay_ms),
                reply: Ok(text.to_string()),
            })
        }

        fn failing(id: &str, reason: &str) -> Arc<dyn OracleAdapter> {
            Arc::new(Self {
                id: id.to_string(),
                delay: Duration::ZERO,
                reply: Err(reason.to_string()),
            })
        }
    }

    #[async_trait]
    impl OracleAdapter for ScriptedOracle {
        fn source_id(&self) -> &str {
            &self.id
        }

        async fn submit(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("Miami Heat"));
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(reason) => Err(CourtSeerError::validation_error(reason.clone())),
            }
        }
    }

    #[derive(Debug)]
    struct PanickingOracle;

    #[async_trait]
    impl OracleAdapter for PanickingOracle {
        fn source_id(&self) -> &str {
            "panicky"
        }

        async fn submit(&self, _prompt: &str) -> Result<String> {
            panic!("adapter bug");
        }
    }

    fn pack() -> FactPack {
        FactPack::new("Boston Celtics", "Miami Heat")
    }

    #[tokio::test]
    async fn test_outcomes_keep_seating_order() {
        let council = OracleCouncil::default()
            .with_oracle(ScriptedOracle::answering("slow", 50, "a"), AnalystRole::General)
            .with_oracle(ScriptedOracle::answering("fast", 0, "b"), AnalystRole::Defensive);

        let outcomes = council.convene(&pack()).await;
        let ids: Vec<&str> = outcomes.iter().map(|o| o.source_id.as_str()).collect();
        assert_eq!(ids, vec!["slow", "fast"]);
        assert_eq!(outcomes[0].result.as_ref().unwrap().text, "a");
        assert_eq!(outcomes[1].role, AnalystRole::Defensive);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let council = OracleCouncil::default()
            .with_oracle(ScriptedOracle::answering("ok", 0, "fine"), AnalystRole::General)
            .with_oracle(ScriptedOracle::failing("broken", "401 unauthorized"), AnalystRole::Defensive)
            .with_oracle(Arc::new(PanickingOracle), AnalystRole::Offensive);

        let outcomes = council.convene(&pack()).await;
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(
            outcomes[1].result,
            Err(CourtSeerError::OracleUnavailable { ref source_id, .. }) if source_id == "broken"
        ));
        assert!(matches!(
            outcomes[2].result,
            Err(CourtSeerError::OracleUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_slow_oracle_times_out() {
        let council = OracleCouncil::new(Duration::from_millis(20), 4)
            .with_oracle(ScriptedOracle::answering("sleepy", 5_000, "late"), AnalystRole::General)
            .with_oracle(ScriptedOracle::answering("quick", 0, "on time"), AnalystRole::Offensive);

        let outcomes = council.convene(&pack()).await;
        assert!(matches!(outcomes[0].result, Err(CourtSeerError::OracleTimeout { .. })));
        assert!(outcomes[1].result.is_ok());
    }

    #[tokio::test]
    async fn test_empty_council_settles_immediately() {
        let council = OracleCouncil::default();
        assert!(council.is_empty());
        assert!(council.convene(&pack()).await.is_empty());
    }
}
