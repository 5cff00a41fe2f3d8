use serde::{Deserialize, Serialize};
use std::fmt;

use super::model::{display_figure, FactPack, Injury, TeamMetrics};

/// The angle an oracle is asked to analyse the game from. Every role gets
/// its own prompt built from the same fact pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalystRole {
    /// Team history and overall metrics.
    General,
    /// Matchup and injury impact.
    Defensive,
    /// Scoring trends, efficiency and moneyline value.
    Offensive,
}

impl fmt::Display for AnalystRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalystRole::General => "general",
            AnalystRole::Defensive => "defensive",
            AnalystRole::Offensive => "offensive",
        };
        write!(f, "{}", name)
    }
}

const OUTPUT_INSTRUCTION: &str = "You MUST return a JSON object with exactly these 3 keys: \
    \"winner\", \"confidence\", \"reason\". Do NOT return nested objects.\n\
    Example Response:\n\
    {\"winner\": \"Team Name\", \"confidence\": 75, \"reason\": \"Cite the specific metric\"}";

pub struct PromptBuilder;

impl PromptBuilder {
    /// Builds a fresh prompt string for one oracle.
    pub fn build(role: AnalystRole, fact_pack: &FactPack) -> String {
        match role {
            AnalystRole::General => Self::general_prompt(fact_pack),
            AnalystRole::Defensive => Self::defensive_prompt(fact_pack),
            AnalystRole::Offensive => Self::offensive_prompt(fact_pack),
        }
    }

    fn general_prompt(fact_pack: &FactPack) -> String {
        format!(
            "Analyze {}.\n\n\
            === GAME FACT PACK ===\n{}\n\
            TASK:\n\
            Predict the winner using ONLY these facts. \
            Weight 'Last 5', 'Splits', and 'Injuries' heavily.\n\n{}",
            fact_pack.matchup(),
            Self::format_context(fact_pack),
            OUTPUT_INSTRUCTION
        )
    }

    fn defensive_prompt(fact_pack: &FactPack) -> String {
        format!(
            "You are a defensive matchup analyst. Evaluate {} with emphasis on \
            defensive ratings, matchups and the impact of injuries.\n\n\
            FACT PACK JSON:\n{}\n\n\
            TASK:\n\
            Based on the above, predict the winner.\n{}",
            fact_pack.matchup(),
            Self::fact_pack_json(fact_pack),
            OUTPUT_INSTRUCTION
        )
    }

    fn offensive_prompt(fact_pack: &FactPack) -> String {
        format!(
            "Analyze {}.\n\n\
            DATA SOURCE (Strict):\n{}\n\n\
            Focus on VALUE (Moneyline vs Metrics) and OFFENSIVE EFFICIENCY (ORtg, Pace). \
            The reason must cite a metric against the odds.\n{}",
            fact_pack.matchup(),
            Self::fact_pack_json(fact_pack),
            OUTPUT_INSTRUCTION
        )
    }

    fn fact_pack_json(fact_pack: &FactPack) -> String {
        serde_json::to_string_pretty(fact_pack).unwrap_or_else(|_| Self::format_context(fact_pack))
    }

    fn format_context(fact_pack: &FactPack) -> String {
        let odds = &fact_pack.odds;
        let mut context = format!(
            "TIP-OFF: {} at {}\n",
            fact_pack.time.as_deref().unwrap_or("TBD"),
            fact_pack
                .venue
                .clone()
                .unwrap_or_else(|| format!("Home of {}", fact_pack.teams.home)),
        );
        context.push_str(&format!(
            "ODDS: Spread {}, Total {}, Moneyline Home {} (Source: {}, Timestamp: {})\n",
            display_figure(odds.spread.as_ref()),
            display_figure(odds.total.as_ref()),
            display_figure(odds.home_moneyline.as_ref()),
            odds.source.as_deref().unwrap_or("N/A"),
            odds.timestamp.as_deref().unwrap_or("N/A"),
        ));

        context.push_str(&format!(
            "\nHOME METRICS ({}):\n{}",
            fact_pack.teams.home,
            Self::format_metrics(&fact_pack.team_metrics.home, "Home")
        ));
        context.push_str(&format!(
            "\nAWAY METRICS ({}):\n{}",
            fact_pack.teams.away,
            Self::format_metrics(&fact_pack.team_metrics.away, "Road")
        ));

        context.push_str(&format!(
            "\nREST/TRAVEL:\n- Home: {}\n- Away: {}\n",
            fact_pack.rest_travel.home, fact_pack.rest_travel.away
        ));

        context.push_str(&format!(
            "\nINJURIES (Critical):\n- Home: {}\n- Away: {}\n",
            Self::format_injuries(&fact_pack.injuries.home),
            Self::format_injuries(&fact_pack.injuries.away)
        ));

        context
    }

    fn format_metrics(metrics: &TeamMetrics, default_location: &str) -> String {
        format!(
            "- NetRtg: {}\n\
            - ORtg: {}\n\
            - DRtg: {}\n\
            - Pace: {}\n\
            - Last 5 NetRtg: {}\n\
            - {} Split NetRtg: {}\n",
            display_figure(metrics.net_rating.as_ref()),
            display_figure(metrics.offensive_rating.as_ref()),
            display_figure(metrics.defensive_rating.as_ref()),
            display_figure(metrics.pace.as_ref()),
            display_figure(metrics.last_five.net_rating.as_ref()),
            metrics.split.location.as_deref().unwrap_or(default_location),
            display_figure(metrics.split.net_rating.as_ref()),
        )
    }

    fn format_injuries(injuries: &[Injury]) -> String {
        if injuries.is_empty() {
            return "none reported".to_string();
        }

        injuries
            .iter()
            .map(|injury| {
                format!(
                    "{} ({})",
                    injury.player,
                    injury.status.as_deref().unwrap_or("unknown status")
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
