use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ConsensusResult, Side, Vote};

pub const DEFAULT_QUORUM: usize = 3;
pub const FALLBACK_CONFIDENCE: u8 = 50;
pub const FALLBACK_MESSAGE: &str =
    "AI consensus engine failed to reach a conclusion. Using home court fallback.";

/// What to do with a vote whose winner matched neither team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPolicy {
    /// The oracle named *some* winner, so the vote is kept and counted for
    /// the away side.
    #[default]
    CountAsAway,
    /// Drop the vote from the tally. It stays in the audit trail.
    Abstain,
}

/// Tallies resolved votes into a [`ConsensusResult`]. The result depends
/// only on the multiset of votes, never on their order.
#[derive(Debug, Clone)]
pub struct ConsensusResolver {
    quorum: usize,
    unresolved_policy: UnresolvedPolicy,
}

impl Default for ConsensusResolver {
    fn default() -> Self {
        Self::new(DEFAULT_QUORUM, UnresolvedPolicy::default())
    }
}

impl ConsensusResolver {
    /// `quorum` is a fixed agreeing-vote count; it is not scaled to the
    /// number of oracles that answered.
    pub fn new(quorum: usize, unresolved_policy: UnresolvedPolicy) -> Self {
        Self {
            quorum,
            unresolved_policy,
        }
    }

    pub fn resolve(&self, votes: &[Vote]) -> ConsensusResult {
        let mut home_votes = 0usize;
        let mut away_votes = 0usize;
        let mut confidence_sum = 0u32;
        let mut counted = 0usize;

        for vote in votes {
            let side = match vote.winner_side.side() {
                Some(side) => side,
                None => match self.unresolved_policy {
                    UnresolvedPolicy::CountAsAway => {
                        warn!(
                            "{} named {:?}, which matches neither team; counting it for the away side",
                            vote.source_id, vote.winner
                        );
                        Side::Away
                    }
                    UnresolvedPolicy::Abstain => {
                        warn!(
                            "{} named {:?}, which matches neither team; vote abstains",
                            vote.source_id, vote.winner
                        );
                        continue;
                    }
                },
            };

            match side {
                Side::Home => home_votes += 1,
                Side::Away => away_votes += 1,
            }
            confidence_sum += u32::from(vote.confidence);
            counted += 1;
        }

        if counted == 0 {
            warn!("No usable votes, applying home court fallback");
            return Self::fallback();
        }

        // Ties go to the home side.
        let predicted_side = if home_votes >= away_votes {
            Side::Home
        } else {
            Side::Away
        };
        let agreement_count = home_votes.max(away_votes);
        let is_consensus = agreement_count >= self.quorum;
        let average_confidence = (confidence_sum / counted as u32).min(100) as u8;

        let message = format!(
            "{}: {}/{} models favor {}.",
            if is_consensus { "CONSENSUS REACHED" } else { "MIXED SIGNALS" },
            agreement_count,
            counted,
            predicted_side
        );
        info!("{} (home {}, away {}, avg confidence {}%)", message, home_votes, away_votes, average_confidence);

        ConsensusResult {
            predicted_side,
            agreement_count,
            total_votes: counted,
            average_confidence,
            is_consensus,
            is_fallback: false,
            message,
        }
    }

    pub fn fallback() -> ConsensusResult {
        ConsensusResult {
            predicted_side: Side::Home,
            agreement_count: 0,
            total_votes: 0,
            average_confidence: FALLBACK_CONFIDENCE,
            is_consensus: false,
            is_fallback: true,
            message: FALLBACK_MESSAGE.to_string(),
        }
    }
}
