use std::collections::HashMap;

use super::Lookup;
use crate::clubs::{ClubRecord, ClubResolver};
use crate::upstream::clubelo::{EloEntry, NEUTRAL_ELO};

/// Latest Elo rating per canonical club name.
#[derive(Debug, Clone, Default)]
pub struct EloTable {
    ratings: HashMap<String, f64>,
    clubs: HashMap<String, ClubRecord>,
}

impl EloTable {
    pub fn from_entries(entries: &[EloEntry], resolver: &ClubResolver) -> Self {
        let mut table = Self::default();
        for entry in entries {
            let record = resolver.club_record(entry);
            table
                .ratings
                .insert(record.name.clone(), sanitize(entry.rating));
            table.clubs.insert(record.name.clone(), record);
        }
        table
    }

    /// Rating for `canonical`, or [`NEUTRAL_ELO`] when absent. Never NaN.
    pub fn lookup(&self, canonical: &str) -> Lookup<f64> {
        match self.ratings.get(canonical) {
            Some(&rating) => Lookup::found(sanitize(rating)),
            None => Lookup::defaulted(NEUTRAL_ELO),
        }
    }

    pub fn club(&self, canonical: &str) -> Option<&ClubRecord> {
        self.clubs.get(canonical)
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}

pub fn sanitize(rating: f64) -> f64 {
    if rating.is_finite() { rating } else { NEUTRAL_ELO }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn entry(club: &str, rating: f64) -> EloEntry {
        let day = NaiveDate::from_ymd_opt(2024, 10, 1).expect("date");
        EloEntry {
            rank: None,
            club: club.to_string(),
            country: "ENG".to_string(),
            level: "1".to_string(),
            rating,
            valid_from: day,
            valid_to: day,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn missing_and_nan_ratings_are_neutral() {
        let table = EloTable::from_entries(
            &[entry("Man City", 1900.0), entry("Leeds", f64::NAN)],
            &ClubResolver::default(),
        );
        assert_eq!(table.lookup("Man City").value, 1900.0);
        assert_eq!(table.lookup("Leeds").value, NEUTRAL_ELO);
        let miss = table.lookup("Atlantis FC");
        assert!(!miss.resolved);
        assert_eq!(miss.value, NEUTRAL_ELO);
    }

    #[test]
    fn empty_feed_defaults_everyone() {
        let table = EloTable::from_entries(&[], &ClubResolver::default());
        assert!(table.is_empty());
        assert_eq!(table.lookup("Liverpool").value, NEUTRAL_ELO);
        assert_eq!(table.club("Liverpool"), None);
    }
}
