//! Club name reconciliation across providers.
//!
//! Canonical names follow ClubElo's spelling, since the Elo feed is the one
//! source we cannot re-key. football-data.org and FBref spellings map onto it.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::upstream::clubelo::EloEntry;

const ALIAS_PAIRS: &[(&str, &str)] = &[
    // football-data.org
    ("Arsenal FC", "Arsenal"),
    ("Aston Villa FC", "Aston Villa"),
    ("AFC Bournemouth", "Bournemouth"),
    ("Bournemouth FC", "Bournemouth"),
    ("Brentford FC", "Brentford"),
    ("Brighton & Hove Albion FC", "Brighton"),
    ("Brighton & Hove Albion", "Brighton"),
    ("Burnley FC", "Burnley"),
    ("Chelsea FC", "Chelsea"),
    ("Crystal Palace FC", "Crystal Palace"),
    ("Everton FC", "Everton"),
    ("Fulham FC", "Fulham"),
    ("Ipswich Town FC", "Ipswich"),
    ("Leicester City FC", "Leicester"),
    ("Liverpool FC", "Liverpool"),
    ("Luton Town FC", "Luton"),
    ("Manchester City FC", "Man City"),
    ("Manchester United FC", "Man United"),
    ("Newcastle United FC", "Newcastle"),
    ("Nottingham Forest FC", "Forest"),
    ("Sheffield United FC", "Sheffield United"),
    ("Southampton FC", "Southampton"),
    ("Tottenham Hotspur FC", "Tottenham"),
    ("West Ham United FC", "West Ham"),
    ("Wolverhampton Wanderers FC", "Wolves"),
    ("FC Barcelona", "Barcelona"),
    ("Real Madrid CF", "Real Madrid"),
    ("Club Atlético de Madrid", "Atletico"),
    ("Athletic Club", "Bilbao"),
    ("FC Bayern München", "Bayern"),
    ("Borussia Dortmund", "Dortmund"),
    ("Bayer 04 Leverkusen", "Leverkusen"),
    ("RB Leipzig", "RB Leipzig"),
    ("FC Internazionale Milano", "Inter"),
    ("AC Milan", "Milan"),
    ("Juventus FC", "Juventus"),
    ("SSC Napoli", "Napoli"),
    ("Paris Saint-Germain FC", "Paris SG"),
    ("Olympique de Marseille", "Marseille"),
    ("AS Monaco FC", "Monaco"),
    // FBref
    ("Manchester City", "Man City"),
    ("Manchester Utd", "Man United"),
    ("Manchester United", "Man United"),
    ("Newcastle Utd", "Newcastle"),
    ("Newcastle United", "Newcastle"),
    ("Nott'ham Forest", "Forest"),
    ("Nottingham Forest", "Forest"),
    ("Tottenham Hotspur", "Tottenham"),
    ("West Ham United", "West Ham"),
    ("Wolverhampton Wanderers", "Wolves"),
    ("Sheffield Utd", "Sheffield United"),
    ("Luton Town", "Luton"),
    ("Leicester City", "Leicester"),
    ("Ipswich Town", "Ipswich"),
    ("Atlético Madrid", "Atletico"),
    ("Athletic Club Bilbao", "Bilbao"),
    ("Bayern Munich", "Bayern"),
    ("Inter Milan", "Inter"),
    ("Internazionale", "Inter"),
    ("Paris S-G", "Paris SG"),
    ("Paris Saint-Germain", "Paris SG"),
];

static DEFAULT_RESOLVER: Lazy<ClubResolver> =
    Lazy::new(|| ClubResolver::from_pairs(ALIAS_PAIRS.iter().copied()));

/// Canonical identity of a club, derived from an Elo row on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClubRecord {
    pub name: String,
    pub country: String,
    pub level: u8,
}

#[derive(Debug, Clone)]
pub struct ClubResolver {
    aliases: HashMap<String, String>,
}

impl Default for ClubResolver {
    fn default() -> Self {
        DEFAULT_RESOLVER.clone()
    }
}

impl ClubResolver {
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut resolver = Self::empty();
        for (alias, canonical) in pairs {
            resolver.register(alias, canonical);
        }
        resolver
    }

    pub fn register(&mut self, alias: &str, canonical: &str) {
        self.aliases
            .insert(alias.to_string(), canonical.to_string());
    }

    /// Canonical spelling for `name`, or `name` unchanged when no alias is known.
    /// This is a best-effort join key: an unknown spelling degrades to a miss
    /// in the joined dataset, never to an error.
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn club_record(&self, entry: &EloEntry) -> ClubRecord {
        ClubRecord {
            name: self.canonical(&entry.club).to_string(),
            country: entry.country.clone(),
            level: entry.level.trim().parse::<u8>().unwrap_or(1),
        }
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }
}
