pub mod consensus;
pub mod decision_maker;
pub mod edge;
pub mod team_resolver;

pub use consensus::{ConsensusResolver, UnresolvedPolicy};
pub use decision_maker::DecisionMaker;
pub use edge::EdgeCalculator;
pub use team_resolver::{ResolvedSide, TeamResolver};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => write!(f, "Home"),
            Side::Away => write!(f, "Away"),
        }
    }
}

/// One oracle's resolved opinion. Only produced for responses that parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub source_id: String,
    /// Winner exactly as the oracle wrote it.
    pub winner: String,
    pub winner_side: ResolvedSide,
    /// 0-100.
    pub confidence: u8,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub predicted_side: Side,
    pub agreement_count: usize,
    pub total_votes: usize,
    pub average_confidence: u8,
    pub is_consensus: bool,
    /// True when no vote was available and the home-court fallback applies.
    pub is_fallback: bool,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Green,
    Amber,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub status: GateStatus,
    pub value: String,
}

impl Gate {
    pub fn new(status: GateStatus, value: impl Into<String>) -> Self {
        Self {
            status,
            value: value.into(),
        }
    }

    pub fn is_green(&self) -> bool {
        self.status == GateStatus::Green
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gates {
    pub edge: Gate,
    pub consensus: Gate,
    pub confidence: Gate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    BetMax,
    BetSmall,
    Pass,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::BetMax => write!(f, "BET_MAX"),
            Action::BetSmall => write!(f, "BET_SMALL"),
            Action::Pass => write!(f, "PASS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: Action,
    pub gates: Gates,
    pub target_side: Option<Side>,
}
