use tracing::{debug, info};

use super::{Action, ConsensusResult, Decision, Gate, GateStatus, Gates, Side};

pub const DEFAULT_EDGE_THRESHOLD: f64 = 0.03;
pub const DEFAULT_CONFIDENCE_HIGH: u8 = 70;
pub const DEFAULT_CONFIDENCE_MEDIUM: u8 = 60;

/// Three-gate decision policy: math edge, oracle consensus, confidence.
///
/// The action is a pure function of the edge and the consensus result.
/// A bet needs a GREEN edge gate, a GREEN consensus gate and a confidence
/// of at least `confidence_medium`; at `confidence_high` or above it is
/// sized to the maximum.
#[derive(Debug, Clone)]
pub struct DecisionMaker {
    edge_threshold: f64,
    confidence_high: u8,
    confidence_medium: u8,
    require_side_agreement: bool,
}

impl Default for DecisionMaker {
    fn default() -> Self {
        Self::new(
            DEFAULT_EDGE_THRESHOLD,
            DEFAULT_CONFIDENCE_HIGH,
            DEFAULT_CONFIDENCE_MEDIUM,
            true,
        )
    }
}

impl DecisionMaker {
    /// With `require_side_agreement` the consensus gate only turns GREEN when
    /// the oracles agree on the same side the edge points to. Without it the
    /// gate looks at the quorum alone.
    pub fn new(
        edge_threshold: f64,
        confidence_high: u8,
        confidence_medium: u8,
        require_side_agreement: bool,
    ) -> Self {
        Self {
            edge_threshold,
            confidence_high,
            confidence_medium,
            require_side_agreement,
        }
    }

    /// `edge_home` is `None` when the math model is absent or malformed.
    pub fn make_decision(&self, edge_home: Option<f64>, consensus: &ConsensusResult) -> Decision {
        info!("Making final bet decision...");

        let edge_home = match edge_home.filter(|edge| edge.is_finite()) {
            Some(edge) => edge,
            None => {
                debug!("Math model missing or malformed, all gates RED");
                return Self::no_model_decision();
            }
        };

        let (edge_gate, target_side) = self.evaluate_edge(edge_home);
        let consensus_gate = self.evaluate_consensus(consensus, target_side);
        let confidence_gate = self.evaluate_confidence(consensus.average_confidence);

        let action = match target_side {
            // No edge: the other gates are still reported, but never bet.
            None => Action::Pass,
            Some(_) => self.final_action(&edge_gate, &consensus_gate, consensus.average_confidence),
        };

        info!(
            "Gates: edge={:?} consensus={:?} confidence={:?} -> {}",
            edge_gate.status, consensus_gate.status, confidence_gate.status, action
        );

        Decision {
            action,
            gates: Gates {
                edge: edge_gate,
                consensus: consensus_gate,
                confidence: confidence_gate,
            },
            target_side,
        }
    }

    fn evaluate_edge(&self, edge_home: f64) -> (Gate, Option<Side>) {
        if edge_home > self.edge_threshold {
            let value = format!("+{:.1}% (Home)", edge_home * 100.0);
            (Gate::new(GateStatus::Green, value), Some(Side::Home))
        } else if edge_home < -self.edge_threshold {
            let value = format!("+{:.1}% (Away)", edge_home.abs() * 100.0);
            (Gate::new(GateStatus::Green, value), Some(Side::Away))
        } else {
            (Gate::new(GateStatus::Red, "No Edge"), None)
        }
    }

    fn evaluate_consensus(&self, consensus: &ConsensusResult, target_side: Option<Side>) -> Gate {
        if !consensus.is_consensus {
            return Gate::new(GateStatus::Red, "Mixed");
        }

        match target_side {
            Some(target) if self.require_side_agreement && consensus.predicted_side != target => {
                debug!(
                    "Consensus favours {} but the edge points to {}",
                    consensus.predicted_side, target
                );
                Gate::new(
                    GateStatus::Red,
                    format!("Reached for {} (opposes edge)", consensus.predicted_side),
                )
            }
            _ => Gate::new(GateStatus::Green, "Reached"),
        }
    }

    fn evaluate_confidence(&self, confidence: u8) -> Gate {
        if confidence >= self.confidence_high {
            Gate::new(GateStatus::Green, format!("{}% (High)", confidence))
        } else if confidence >= self.confidence_medium {
            Gate::new(GateStatus::Amber, format!("{}% (Med)", confidence))
        } else {
            Gate::new(GateStatus::Red, format!("{}% (Low)", confidence))
        }
    }

    fn final_action(&self, edge: &Gate, consensus: &Gate, confidence: u8) -> Action {
        if edge.is_green() && consensus.is_green() && confidence >= self.confidence_medium {
            if confidence >= self.confidence_high {
                Action::BetMax
            } else {
                Action::BetSmall
            }
        } else {
            Action::Pass
        }
    }

    fn no_model_decision() -> Decision {
        Decision {
            action: Action::Pass,
            gates: Gates {
                edge: Gate::new(GateStatus::Red, "N/A"),
                consensus: Gate::new(GateStatus::Red, "Mixed"),
                confidence: Gate::new(GateStatus::Red, "Low"),
            },
            target_side: None,
        }
    }
}
