use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::Side;

/// Outcome of mapping an oracle's free-text winner onto the game's two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolvedSide {
    Home,
    Away,
    Unresolved,
}

impl ResolvedSide {
    pub fn side(&self) -> Option<Side> {
        match self {
            ResolvedSide::Home => Some(Side::Home),
            ResolvedSide::Away => Some(Side::Away),
            ResolvedSide::Unresolved => None,
        }
    }
}

/// Lookup table built once per game from the two canonical team names.
///
/// Names and winner text are compared word by word, never as raw
/// substrings, so "la" does not match inside "lakers". Matching runs in two
/// passes: the full team name as a run of words first, then single words
/// that belong to only one of the two names. Words the teams share ("los",
/// "angeles") never decide a side. Within a pass the home side is tested
/// first.
#[derive(Debug, Clone)]
pub struct TeamResolver {
    home_name: Vec<String>,
    away_name: Vec<String>,
    home_tokens: HashSet<String>,
    away_tokens: HashSet<String>,
}

impl TeamResolver {
    pub fn new(home: &str, away: &str) -> Self {
        let home_name = words(home);
        let away_name = words(away);

        let home_tokens = distinctive_tokens(&home_name, &away_name);
        let away_tokens = distinctive_tokens(&away_name, &home_name);

        Self {
            home_name,
            away_name,
            home_tokens,
            away_tokens,
        }
    }

    pub fn resolve(&self, winner: &str) -> ResolvedSide {
        let winner = words(winner);
        if winner.is_empty() {
            return ResolvedSide::Unresolved;
        }

        let home_full = contains_phrase(&winner, &self.home_name);
        let away_full = contains_phrase(&winner, &self.away_name);
        match (home_full, away_full) {
            (true, false) => return ResolvedSide::Home,
            (false, true) => return ResolvedSide::Away,
            // One name contains the other ("Lakers" vs "Los Angeles Lakers").
            (true, true) => {
                return if self.home_name.len() >= self.away_name.len() {
                    ResolvedSide::Home
                } else {
                    ResolvedSide::Away
                };
            }
            (false, false) => {}
        }

        if winner.iter().any(|word| self.home_tokens.contains(word)) {
            return ResolvedSide::Home;
        }
        if winner.iter().any(|word| self.away_tokens.contains(word)) {
            return ResolvedSide::Away;
        }

        debug!("Winner text {:?} matches neither {:?} nor {:?}", winner, self.home_name, self.away_name);
        ResolvedSide::Unresolved
    }
}

/// Lowercased alphanumeric words; punctuation separates words.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn contains_phrase(haystack: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && haystack.windows(phrase.len()).any(|window| window == phrase)
}

fn distinctive_tokens(name: &[String], other: &[String]) -> HashSet<String> {
    name.iter()
        .filter(|token| !other.contains(*token))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_away_name() {
        let resolver = TeamResolver::new("Golden State Warriors", "Los Angeles Lakers");
        assert_eq!(resolver.resolve("Los Angeles Lakers"), ResolvedSide::Away);
    }

    #[test]
    fn test_nickname_and_city() {
        let resolver = TeamResolver::new("Golden State Warriors", "Los Angeles Lakers");
        assert_eq!(resolver.resolve("Warriors"), ResolvedSide::Home);
        assert_eq!(resolver.resolve("the lakers by 6"), ResolvedSide::Away);
        assert_eq!(resolver.resolve("GOLDEN STATE"), ResolvedSide::Home);
    }

    #[test]
    fn test_shared_city_does_not_decide() {
        let resolver = TeamResolver::new("Los Angeles Clippers", "Los Angeles Lakers");
        assert_eq!(resolver.resolve("Los Angeles Lakers"), ResolvedSide::Away);
        assert_eq!(resolver.resolve("Lakers"), ResolvedSide::Away);
        assert_eq!(resolver.resolve("Los Angeles"), ResolvedSide::Unresolved);

        let official = TeamResolver::new("LA Clippers", "Los Angeles Lakers");
        assert_eq!(official.resolve("Lakers"), ResolvedSide::Away);
        assert_eq!(official.resolve("Los Angeles Lakers"), ResolvedSide::Away);
        assert_eq!(official.resolve("LA Clippers"), ResolvedSide::Home);
        assert_eq!(official.resolve("Clippers"), ResolvedSide::Home);
    }

    #[test]
    fn test_tokens_match_whole_words_only() {
        let resolver = TeamResolver::new("Utah Jazz", "Miami Heat");
        assert_eq!(resolver.resolve("Heat, by a wide margin."), ResolvedSide::Away);
        assert_eq!(resolver.resolve("Theatrical defense wins"), ResolvedSide::Unresolved);
    }

    #[test]
    fn test_nested_names_prefer_longer_match() {
        let resolver = TeamResolver::new("Lakers", "Los Angeles Lakers");
        assert_eq!(resolver.resolve("Los Angeles Lakers"), ResolvedSide::Away);
    }

    #[test]
    fn test_unknown_or_empty_winner() {
        let resolver = TeamResolver::new("Boston Celtics", "Miami Heat");
        assert_eq!(resolver.resolve("Denver Nuggets"), ResolvedSide::Unresolved);
        assert_eq!(resolver.resolve("   "), ResolvedSide::Unresolved);
        assert_eq!(ResolvedSide::Unresolved.side(), None);
    }
}
