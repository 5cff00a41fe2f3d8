use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::evaluator::{
    ConsensusResolver, ConsensusResult, Decision, DecisionMaker, Side, TeamResolver, Vote,
};
use crate::fact_pack::{FactPack, MathModel, Odds};
use crate::oracle::{OracleCouncil, OracleOutcome, OracleResponse, OracleVerdict, ResponseParser};

const EXCERPT_CHARS: usize = 120;
const FALLBACK_FACTORS: [&str; 2] = ["Service interruption", "Fallback active"];

/// Prediction payload handed to the CLI and the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub predicted_winner: String,
    pub confidence: u8,
    pub analysis: String,
    pub key_factors: Vec<String>,
    pub is_consensus: bool,
    pub decision: Decision,
    pub odds: Odds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_model: Option<MathModel>,
    /// Per-source attribution, in council seating order.
    #[serde(default)]
    pub votes: Vec<OracleVerdict>,
}

/// Turns oracle output for one fact pack into a [`Prediction`].
///
/// Everything after the oracle calls is synchronous and infallible: bad
/// oracle text loses its vote, no votes at all yields the home-court
/// fallback, and a missing math model yields PASS with every gate RED.
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    resolver: ConsensusResolver,
    decision_maker: DecisionMaker,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ConsensusEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            resolver: ConsensusResolver::new(config.quorum, config.unresolved_policy),
            decision_maker: DecisionMaker::new(
                config.edge_threshold,
                config.confidence_high,
                config.confidence_medium,
                config.require_side_agreement,
            ),
        }
    }

    /// Convenes the council and evaluates whatever it returns.
    pub async fn predict(&self, council: &OracleCouncil, fact_pack: &FactPack) -> Prediction {
        let outcomes = council.convene(fact_pack).await;
        self.evaluate_outcomes(fact_pack, outcomes)
    }

    pub fn evaluate_outcomes(&self, fact_pack: &FactPack, outcomes: Vec<OracleOutcome>) -> Prediction {
        let teams = TeamResolver::new(&fact_pack.teams.home, &fact_pack.teams.away);

        let verdicts = outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(response) => Self::verdict(&teams, &response),
                Err(e) => OracleVerdict::AdapterError {
                    source_id: outcome.source_id,
                    reason: e.to_string(),
                },
            })
            .collect();

        self.conclude(fact_pack, verdicts)
    }

    /// Offline evaluation over already collected responses.
    pub fn evaluate(&self, fact_pack: &FactPack, responses: &[OracleResponse]) -> Prediction {
        let teams = TeamResolver::new(&fact_pack.teams.home, &fact_pack.teams.away);
        let verdicts = responses
            .iter()
            .map(|response| Self::verdict(&teams, response))
            .collect();

        self.conclude(fact_pack, verdicts)
    }

    fn verdict(teams: &TeamResolver, response: &OracleResponse) -> OracleVerdict {
        match ResponseParser::parse(&response.text) {
            Ok(parsed) => {
                let winner_side = teams.resolve(&parsed.winner);
                info!(
                    "{} picks {} ({:?}, {}%)",
                    response.source_id, parsed.winner, winner_side, parsed.confidence
                );
                OracleVerdict::Vote(Vote {
                    source_id: response.source_id.clone(),
                    winner: parsed.winner,
                    winner_side,
                    confidence: parsed.confidence,
                    rationale: parsed.reason,
                })
            }
            Err(e) => {
                warn!(
                    "{} returned an invalid result ({}): {:?}",
                    response.source_id,
                    e,
                    excerpt(&response.text)
                );
                OracleVerdict::ParseError {
                    source_id: response.source_id.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn conclude(&self, fact_pack: &FactPack, verdicts: Vec<OracleVerdict>) -> Prediction {
        let votes: Vec<Vote> = verdicts.iter().filter_map(|v| v.vote().cloned()).collect();
        let consensus = self.resolver.resolve(&votes);

        let math_model = fact_pack.math_model.clone();
        let edge_home = math_model.as_ref().and_then(|model| model.edge(&fact_pack.odds));
        if edge_home.is_none() {
            warn!("No usable math model for {}", fact_pack.matchup());
        }
        let decision = self.decision_maker.make_decision(edge_home, &consensus);

        let predicted_winner = match consensus.predicted_side {
            Side::Home => fact_pack.teams.home.clone(),
            Side::Away => fact_pack.teams.away.clone(),
        };

        let (analysis, mut key_factors) = if consensus.is_fallback {
            (
                consensus.message.clone(),
                FALLBACK_FACTORS.iter().map(|f| f.to_string()).collect::<Vec<_>>(),
            )
        } else {
            (
                Self::analysis(&consensus, &predicted_winner),
                vec![
                    format!("Consensus: {}/{}", consensus.agreement_count, consensus.total_votes),
                    format!("Analyst Votes: {}", Self::vote_summary(&votes)),
                ],
            )
        };
        if edge_home.is_none() {
            key_factors.push("Math model unavailable".to_string());
        }

        info!(
            "{}: {} -> {} ({}%)",
            fact_pack.matchup(),
            predicted_winner,
            decision.action,
            consensus.average_confidence
        );

        Prediction {
            predicted_winner,
            confidence: consensus.average_confidence,
            analysis,
            key_factors,
            is_consensus: consensus.is_consensus,
            decision,
            odds: fact_pack.odds.clone(),
            math_model,
            votes: verdicts,
        }
    }

    fn analysis(consensus: &ConsensusResult, winner: &str) -> String {
        format!(
            "{}: {}/{} models favor {}.",
            if consensus.is_consensus { "CONSENSUS REACHED" } else { "MIXED SIGNALS" },
            consensus.agreement_count,
            consensus.total_votes,
            winner
        )
    }

    fn vote_summary(votes: &[Vote]) -> String {
        votes
            .iter()
            .map(|v| format!("{}: {} ({}%)", v.source_id, v.winner, v.confidence))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
