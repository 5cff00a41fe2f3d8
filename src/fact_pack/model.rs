use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{CourtSeerError, Result};
use crate::evaluator::edge::EdgeCalculator;

/// A scalar from an upstream feed: either a number or whatever text the
/// source handed back (`"N/A"`, `"-2.5 (Home)"`, `"+120"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Figure {
    Number(f64),
    Text(String),
}

impl Figure {
    /// Numeric value, if the figure holds one. Text is parsed leniently
    /// (leading `+` and surrounding whitespace allowed); non-finite values
    /// are rejected.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Figure::Number(n) => *n,
            Figure::Text(text) => text.trim().parse::<f64>().ok()?,
        };

        value.is_finite().then_some(value)
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Figure::Number(n) => write!(f, "{}", n),
            Figure::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Renders an optional figure the way prompts expect it.
pub fn display_figure(figure: Option<&Figure>) -> String {
    figure.map(|f| f.to_string()).unwrap_or_else(|| "N/A".to_string())
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct HomeAway<T> {
    #[serde(default)]
    pub home: T,
    #[serde(default)]
    pub away: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teams {
    pub home: String,
    pub away: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Odds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<Figure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Figure>,
    #[serde(default, alias = "home_odds", skip_serializing_if = "Option::is_none")]
    pub home_moneyline: Option<Figure>,
    #[serde(default, alias = "away_odds", skip_serializing_if = "Option::is_none")]
    pub away_moneyline: Option<Figure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecentForm {
    #[serde(rename = "W_PCT", default, skip_serializing_if = "Option::is_none")]
    pub win_pct: Option<Figure>,
    #[serde(rename = "NetRtg", default, skip_serializing_if = "Option::is_none")]
    pub net_rating: Option<Figure>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SituationalSplit {
    #[serde(rename = "Location", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "W_PCT", default, skip_serializing_if = "Option::is_none")]
    pub win_pct: Option<Figure>,
    #[serde(rename = "NetRtg", default, skip_serializing_if = "Option::is_none")]
    pub net_rating: Option<Figure>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamMetrics {
    #[serde(rename = "ORtg", default, skip_serializing_if = "Option::is_none")]
    pub offensive_rating: Option<Figure>,
    #[serde(rename = "DRtg", default, skip_serializing_if = "Option::is_none")]
    pub defensive_rating: Option<Figure>,
    #[serde(rename = "Pace", default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<Figure>,
    #[serde(rename = "NetRtg", default, skip_serializing_if = "Option::is_none")]
    pub net_rating: Option<Figure>,
    #[serde(rename = "Last5", default)]
    pub last_five: RecentForm,
    #[serde(rename = "Split", default)]
    pub split: SituationalSplit,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RestTravel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_b2b: Option<bool>,
    #[serde(rename = "3_in_4", default, skip_serializing_if = "Option::is_none")]
    pub three_in_four: Option<bool>,
}

impl fmt::Display for RestTravel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rest = self
            .rest_days
            .map(|d| d.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        write!(
            f,
            "rest_days={}, back_to_back={}, three_in_four={}",
            rest,
            self.is_b2b.unwrap_or(false),
            self.three_in_four.unwrap_or(false)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Injury {
    #[serde(default)]
    pub player: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub est_return_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_minutes_change: Option<Figure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance_score: Option<f64>,
}

/// Output of the upstream probability model. Every field may be missing;
/// [`MathModel::edge`] decides whether what is present is usable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MathModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_home: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_away: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implied_home: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_home: Option<f64>,
}

impl MathModel {
    /// Builds the model block from raw probabilities and the home moneyline,
    /// rounding every value to three decimals.
    pub fn from_probabilities(p_home: f64, p_away: f64, home_moneyline: Option<&Figure>) -> Self {
        let implied_home = EdgeCalculator::implied_probability(home_moneyline);
        let edge_home = p_home - implied_home;

        Self {
            p_home: Some(round3(p_home)),
            p_away: Some(round3(p_away)),
            implied_home: Some(round3(implied_home)),
            edge_home: Some(round3(edge_home)),
        }
    }

    /// Signed home edge. Uses the stored `edge_home` when present, otherwise
    /// derives it from `p_home` and the moneyline. `None` means the model is
    /// unusable: a probability that is present but not in [0, 1] discards
    /// the whole model, stored edge included.
    pub fn edge(&self, odds: &Odds) -> Option<f64> {
        if !is_probability(self.p_home) || !is_probability(self.p_away) {
            return None;
        }

        if let Some(edge) = self.edge_home {
            return edge.is_finite().then_some(edge);
        }

        let p_home = self.p_home?;
        Some(EdgeCalculator::edge_home(p_home, odds.home_moneyline.as_ref()))
    }
}

/// Absent is fine; present must be a finite value in [0, 1].
fn is_probability(value: Option<f64>) -> bool {
    value.map_or(true, |p| p.is_finite() && (0.0..=1.0).contains(&p))
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Immutable evidence snapshot for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactPack {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    /// Tip-off as the upstream feed wrote it ("7:30 PM ET", "TBD").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub teams: Teams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    #[serde(default)]
    pub odds: Odds,
    #[serde(default)]
    pub team_metrics: HomeAway<TeamMetrics>,
    #[serde(default)]
    pub rest_travel: HomeAway<RestTravel>,
    #[serde(default)]
    pub injuries: HomeAway<Vec<Injury>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math_model: Option<MathModel>,
    /// Top-level keys this crate does not model, kept so the audit copy
    /// matches what the builder sent.
    #[serde(flatten, default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl FactPack {
    pub fn new(home: impl Into<String>, away: impl Into<String>) -> Self {
        Self {
            game_id: None,
            time: None,
            teams: Teams {
                home: home.into(),
                away: away.into(),
            },
            venue: None,
            odds: Odds::default(),
            team_metrics: HomeAway::default(),
            rest_travel: HomeAway::default(),
            injuries: HomeAway::default(),
            math_model: None,
            extra: Map::new(),
        }
    }

    pub fn with_odds(mut self, odds: Odds) -> Self {
        self.odds = odds;
        self
    }

    pub fn with_math_model(mut self, math_model: MathModel) -> Self {
        self.math_model = Some(math_model);
        self
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let pack: FactPack = serde_json::from_str(raw)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Both team names are required; everything else may be defaulted.
    pub fn validate(&self) -> Result<()> {
        if self.teams.home.trim().is_empty() {
            return Err(CourtSeerError::validation_error("teams.home is required"));
        }
        if self.teams.away.trim().is_empty() {
            return Err(CourtSeerError::validation_error("teams.away is required"));
        }
        Ok(())
    }

    /// Game label used in logs and prompts.
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.teams.away, self.teams.home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_figure_parses_signed_text() {
        assert_eq!(Figure::Text("+120".to_string()).as_f64(), Some(120.0));
        assert_eq!(Figure::Text(" -150 ".to_string()).as_f64(), Some(-150.0));
        assert_eq!(Figure::Text("N/A".to_string()).as_f64(), None);
        assert_eq!(Figure::Text("NaN".to_string()).as_f64(), None);
        assert_eq!(Figure::Number(3.5).as_f64(), Some(3.5));
    }

    #[test]
    fn test_fact_pack_minimal_json() {
        let pack = FactPack::from_json(
            r#"{"teams": {"home": "Golden State Warriors", "away": "Los Angeles Lakers"}}"#,
        )
        .unwrap();

        assert_eq!(pack.teams.home, "Golden State Warriors");
        assert!(pack.math_model.is_none());
        assert!(pack.injuries.home.is_empty());
        assert_eq!(pack.matchup(), "Los Angeles Lakers @ Golden State Warriors");
    }

    #[test]
    fn test_fact_pack_rejects_blank_team() {
        let result = FactPack::from_json(r#"{"teams": {"home": " ", "away": "Lakers"}}"#);
        assert!(matches!(result, Err(CourtSeerError::Validation(_))));
    }

    #[test]
    fn test_fact_pack_accepts_upstream_shape() {
        let raw = r#"{
            "game_id": "2025-12-25-Los Angeles Lakers-Golden State Warriors",
            "teams": {"home": "Golden State Warriors", "away": "Los Angeles Lakers"},
            "odds": {"home_odds": "-150", "away_odds": "N/A", "spread": "-3.5 (Home)",
                     "total": "228.5", "source": "DraftKings", "timestamp": null},
            "team_metrics": {
                "home": {"ORtg": 117.2, "DRtg": 112.0, "Pace": 99.1, "NetRtg": 5.2,
                         "Last5": {"W_PCT": 0.8, "NetRtg": 7.5},
                         "Split": {"Location": "Home", "W_PCT": 0.7, "NetRtg": 6.1}},
                "away": {"NetRtg": "N/A"}
            },
            "rest_travel": {"home": {"rest_days": 2, "is_b2b": false, "3_in_4": false},
                            "away": {"rest_days": 0, "is_b2b": true, "3_in_4": true}},
            "injuries": {"home": [], "away": [{"player": "LeBron James", "status": "Out",
                         "expected_minutes_change": "-30", "importance_score": 9.5}]},
            "math_model": {"p_home": 0.6, "p_away": 0.4, "implied_home": 0.6, "edge_home": 0.0}
        }"#;

        let pack = FactPack::from_json(raw).unwrap();
        assert_eq!(pack.odds.home_moneyline.as_ref().and_then(Figure::as_f64), Some(-150.0));
        assert_eq!(pack.rest_travel.away.three_in_four, Some(true));
        assert_eq!(pack.injuries.away[0].player, "LeBron James");
        assert_eq!(
            pack.team_metrics.home.last_five.net_rating,
            Some(Figure::Number(7.5))
        );
    }

    #[test]
    fn test_fact_pack_keeps_schedule_and_unknown_keys() {
        let raw = r#"{
            "game_id": "2025-12-25-Los Angeles Lakers-Golden State Warriors",
            "time": "5:00 PM ET",
            "teams": {"home": "Golden State Warriors", "away": "Los Angeles Lakers"},
            "venue": "Chase Center",
            "broadcast": {"national": "ABC"}
        }"#;

        let pack = FactPack::from_json(raw).unwrap();
        assert_eq!(pack.time.as_deref(), Some("5:00 PM ET"));
        assert_eq!(pack.venue.as_deref(), Some("Chase Center"));
        assert_eq!(pack.extra["broadcast"]["national"], "ABC");

        let stored = serde_json::to_value(&pack).unwrap();
        assert_eq!(stored["venue"], "Chase Center");
        assert_eq!(stored["broadcast"]["national"], "ABC");
        assert!(stored.get("extra").is_none());

        let reloaded: FactPack = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded, pack);
    }

    #[test]
    fn test_math_model_from_probabilities_rounds() {
        let moneyline = Figure::Text("+120".to_string());
        let model = MathModel::from_probabilities(0.65, 0.35, Some(&moneyline));

        assert_eq!(model.implied_home, Some(0.455));
        assert_eq!(model.edge_home, Some(0.195));
    }

    #[test]
    fn test_math_model_edge_prefers_stored_value() {
        let model = MathModel {
            p_home: Some(0.9),
            edge_home: Some(-0.05),
            ..Default::default()
        };
        assert_eq!(model.edge(&Odds::default()), Some(-0.05));
    }

    #[test]
    fn test_math_model_edge_derived_from_probability() {
        let model = MathModel {
            p_home: Some(0.6),
            ..Default::default()
        };
        let odds = Odds {
            home_moneyline: Some(Figure::Number(-150.0)),
            ..Default::default()
        };
        let edge = model.edge(&odds).unwrap();
        assert!(edge.abs() < 1e-9);
    }

    #[test]
    fn test_math_model_without_inputs_is_unusable() {
        assert_eq!(MathModel::default().edge(&Odds::default()), None);

        let bad = MathModel {
            p_home: Some(1.7),
            ..Default::default()
        };
        assert_eq!(bad.edge(&Odds::default()), None);
    }

    #[test]
    fn test_stored_edge_ignored_when_probabilities_are_out_of_range() {
        let inflated = MathModel {
            p_home: Some(1.7),
            edge_home: Some(0.2),
            ..Default::default()
        };
        assert_eq!(inflated.edge(&Odds::default()), None);

        let negative_away = MathModel {
            p_home: Some(0.6),
            p_away: Some(-0.1),
            edge_home: Some(0.2),
            ..Default::default()
        };
        assert_eq!(negative_away.edge(&Odds::default()), None);

        let not_a_number = MathModel {
            p_home: Some(f64::NAN),
            edge_home: Some(0.2),
            ..Default::default()
        };
        assert_eq!(not_a_number.edge(&Odds::default()), None);
    }
}
