use std::collections::HashMap;

use serde::Serialize;

use super::Lookup;
use crate::clubs::ClubResolver;
use crate::upstream::football_data::MatchRecord;

/// Rate reported for a split with no matches.
pub const NEUTRAL_RATE: f64 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HomeAwayRecord {
    pub team: String,
    pub home_wins: u32,
    pub home_matches: u32,
    pub home_ties: u32,
    pub away_wins: u32,
    pub away_matches: u32,
    pub away_ties: u32,
}

impl HomeAwayRecord {
    pub fn new(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            ..Self::default()
        }
    }

    pub fn home_win_rate(&self) -> f64 {
        rate(self.home_wins, self.home_matches)
    }

    pub fn home_tie_rate(&self) -> f64 {
        rate(self.home_ties, self.home_matches)
    }

    pub fn away_win_rate(&self) -> f64 {
        rate(self.away_wins, self.away_matches)
    }

    pub fn away_tie_rate(&self) -> f64 {
        rate(self.away_ties, self.away_matches)
    }

    pub fn home_losses(&self) -> u32 {
        self.home_matches - self.home_wins - self.home_ties
    }

    pub fn away_losses(&self) -> u32 {
        self.away_matches - self.away_wins - self.away_ties
    }

    pub fn total_matches(&self) -> u32 {
        self.home_matches + self.away_matches
    }
}

fn rate(count: u32, matches: u32) -> f64 {
    if matches == 0 {
        NEUTRAL_RATE
    } else {
        f64::from(count) / f64::from(matches)
    }
}

/// Folds completed matches into one record per canonical team name.
/// Matches without a final score are ignored.
pub fn aggregate(matches: &[MatchRecord], resolver: &ClubResolver) -> HomeAwayTable {
    let mut records: HashMap<String, HomeAwayRecord> = HashMap::new();
    for m in matches {
        let Some((home_goals, away_goals)) = m.final_score() else {
            continue;
        };
        let home = resolver.canonical(&m.home_team).to_string();
        let away = resolver.canonical(&m.away_team).to_string();

        let h = records
            .entry(home.clone())
            .or_insert_with(|| HomeAwayRecord::new(home));
        h.home_matches += 1;
        if home_goals > away_goals {
            h.home_wins += 1;
        } else if home_goals == away_goals {
            h.home_ties += 1;
        }

        let a = records
            .entry(away.clone())
            .or_insert_with(|| HomeAwayRecord::new(away));
        a.away_matches += 1;
        if away_goals > home_goals {
            a.away_wins += 1;
        } else if home_goals == away_goals {
            a.away_ties += 1;
        }
    }
    HomeAwayTable { records }
}

#[derive(Debug, Clone, Default)]
pub struct HomeAwayTable {
    records: HashMap<String, HomeAwayRecord>,
}

impl HomeAwayTable {
    /// Lookup by canonical name. An unknown team gets an empty record, whose
    /// rates are all [`NEUTRAL_RATE`].
    pub fn lookup(&self, canonical: &str) -> Lookup<HomeAwayRecord> {
        match self.records.get(canonical) {
            Some(record) => Lookup::found(record.clone()),
            None => Lookup::defaulted(HomeAwayRecord::new(canonical)),
        }
    }

    pub fn get(&self, canonical: &str) -> Option<&HomeAwayRecord> {
        self.records.get(canonical)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &HomeAwayRecord> {
        self.records.values()
    }
}
