use crate::fact_pack::Figure;

/// Market-implied probability when the moneyline is missing or unreadable.
pub const NEUTRAL_PRIOR: f64 = 0.5;

pub struct EdgeCalculator;

impl EdgeCalculator {
    /// Implied win probability of an American moneyline price.
    pub fn american_to_implied(price: f64) -> f64 {
        if price < 0.0 {
            -price / (-price + 100.0)
        } else {
            100.0 / (price + 100.0)
        }
    }

    /// Implied probability of an optional quote, falling back to the neutral
    /// prior for absent or non-numeric odds.
    pub fn implied_probability(moneyline: Option<&Figure>) -> f64 {
        moneyline
            .and_then(Figure::as_f64)
            .map(Self::american_to_implied)
            .unwrap_or(NEUTRAL_PRIOR)
    }

    /// Signed edge of the model over the market on the home side.
    pub fn edge_home(p_home: f64, home_moneyline: Option<&Figure>) -> f64 {
        p_home - Self::implied_probability(home_moneyline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_favourite_price() {
        assert!(approx(EdgeCalculator::american_to_implied(-150.0), 0.6));
        assert!(approx(EdgeCalculator::american_to_implied(-110.0), 0.5238));
    }

    #[test]
    fn test_underdog_price() {
        assert!(approx(EdgeCalculator::american_to_implied(120.0), 0.4545));
        assert!(approx(EdgeCalculator::american_to_implied(100.0), 0.5));
    }

    #[test]
    fn test_no_edge_at_fair_price() {
        let moneyline = Figure::Number(-150.0);
        let edge = EdgeCalculator::edge_home(0.60, Some(&moneyline));
        assert!(approx(edge, 0.0));
    }

    #[test]
    fn test_positive_edge_on_underdog() {
        let moneyline = Figure::Text("+120".to_string());
        let edge = EdgeCalculator::edge_home(0.65, Some(&moneyline));
        assert!(approx(edge, 0.1955));
    }

    #[test]
    fn test_missing_or_garbage_odds_use_neutral_prior() {
        assert_eq!(EdgeCalculator::implied_probability(None), NEUTRAL_PRIOR);

        let garbage = Figure::Text("N/A".to_string());
        assert_eq!(EdgeCalculator::implied_probability(Some(&garbage)), NEUTRAL_PRIOR);
        assert!(approx(EdgeCalculator::edge_home(0.55, Some(&garbage)), 0.05));
    }
}
