use std::collections::HashMap;

use serde::Serialize;

use super::Lookup;
use crate::clubs::ClubResolver;
use crate::upstream::fbref::ExpectedGoalsEntry;

pub const DEFAULT_HOME_XG: f64 = 1.5;
pub const DEFAULT_HOME_XGA: f64 = 1.0;
pub const DEFAULT_AWAY_XG: f64 = 1.2;
pub const DEFAULT_AWAY_XGA: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamXg {
    pub xg: f64,
    pub xga: f64,
}

impl TeamXg {
    pub fn fallback(side: Side) -> Self {
        match side {
            Side::Home => Self {
                xg: DEFAULT_HOME_XG,
                xga: DEFAULT_HOME_XGA,
            },
            Side::Away => Self {
                xg: DEFAULT_AWAY_XG,
                xga: DEFAULT_AWAY_XGA,
            },
        }
    }
}

/// Scraped xG rows keyed by canonical squad name.
#[derive(Debug, Clone, Default)]
pub struct XgTable {
    by_team: HashMap<String, TeamXg>,
}

impl XgTable {
    pub fn from_entries(entries: &[ExpectedGoalsEntry], resolver: &ClubResolver) -> Self {
        let by_team = entries
            .iter()
            .map(|e| {
                let value = TeamXg {
                    xg: non_negative(e.xg),
                    xga: non_negative(e.xga),
                };
                (resolver.canonical(&e.squad).to_string(), value)
            })
            .collect();
        Self { by_team }
    }

    pub fn lookup(&self, canonical: &str, side: Side) -> Lookup<TeamXg> {
        match self.by_team.get(canonical) {
            Some(v) => Lookup::found(*v),
            None => Lookup::defaulted(TeamXg::fallback(side)),
        }
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.by_team.contains_key(canonical)
    }

    pub fn len(&self) -> usize {
        self.by_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }
}

fn non_negative(v: f64) -> f64 {
    if v.is_finite() && v >= 0.0 { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn lookup_resolves_fbref_spelling() {
        let entries = vec![ExpectedGoalsEntry {
            rank: Some(1),
            squad: "Manchester City".to_string(),
            league: "Premier League".to_string(),
            xg: 2.1,
            xga: 0.9,
            fetched_at: Utc::now(),
        }];
        let table = XgTable::from_entries(&entries, &ClubResolver::default());
        let hit = table.lookup("Man City", Side::Home);
        assert!(hit.resolved);
        assert_eq!(hit.value.xg, 2.1);
    }

    #[test]
    fn missing_team_uses_side_fallback() {
        let table = XgTable::default();
        let home = table.lookup("Nobody", Side::Home);
        let away = table.lookup("Nobody", Side::Away);
        assert!(!home.resolved);
        assert_eq!((home.value.xg, home.value.xga), (1.5, 1.0));
        assert_eq!((away.value.xg, away.value.xga), (1.2, 0.8));
    }
}
