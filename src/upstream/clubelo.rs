use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{FetchError, Upstream};
use crate::http_client::get_text_with_timeout;

const CLUBELO_BASE_URL: &str = "http://api.clubelo.com";
const ELO_TIMEOUT: Duration = Duration::from_secs(10);

/// Rating used whenever a club is missing or its rating does not parse.
pub const NEUTRAL_ELO: f64 = 1500.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EloEntry {
    pub rank: Option<u32>,
    pub club: String,
    pub country: String,
    pub level: String,
    pub rating: f64,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub fetched_at: DateTime<Utc>,
}

/// Ratings valid on `date`. An empty body is an empty set, not an error.
pub fn fetch_ratings(client: &Client, date: NaiveDate) -> Result<Vec<EloEntry>, FetchError> {
    let url = format!("{CLUBELO_BASE_URL}/{}", date.format("%Y-%m-%d"));
    let body = get_text_with_timeout(client, Upstream::ClubElo, &url, &[], Some(ELO_TIMEOUT))?;
    let entries = parse_ratings_csv(&body, date, Utc::now())?;
    if entries.is_empty() {
        warn!(%date, "clubelo returned no ratings");
    } else {
        debug!(%date, count = entries.len(), "clubelo ratings parsed");
    }
    Ok(entries)
}

/// Parses the `Rank,Club,Country,Level,Elo,From,To` feed.
///
/// Rows without a club name are dropped. A rating that is missing, not a
/// number, or not finite becomes [`NEUTRAL_ELO`]. Validity dates that do not
/// parse fall back to `as_of`.
pub fn parse_ratings_csv(
    raw: &str,
    as_of: NaiveDate,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<EloEntry>, FetchError> {
    let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
    let Some(header) = lines.next() else {
        return Ok(Vec::new());
    };

    let columns: HashMap<&str, usize> = header
        .split(',')
        .enumerate()
        .map(|(idx, name)| (name.trim(), idx))
        .collect();
    let Some(&club_idx) = columns.get("Club") else {
        return Err(FetchError::unavailable(
            Upstream::ClubElo,
            format!("unexpected header: {header}"),
        ));
    };
    let col = |name: &str| columns.get(name).copied();
    let (rank_idx, country_idx, level_idx, elo_idx, from_idx, to_idx) = (
        col("Rank"),
        col("Country"),
        col("Level"),
        col("Elo"),
        col("From"),
        col("To"),
    );

    let mut out = Vec::new();
    for line in lines {
        let cells = line.split(',').map(str::trim).collect::<Vec<_>>();
        let cell = |idx: Option<usize>| idx.and_then(|i| cells.get(i).copied()).unwrap_or("");

        let club = cell(Some(club_idx));
        if club.is_empty() {
            continue;
        }
        out.push(EloEntry {
            rank: cell(rank_idx).parse::<u32>().ok(),
            club: club.to_string(),
            country: cell(country_idx).to_string(),
            level: cell(level_idx).to_string(),
            rating: parse_rating(cell(elo_idx)),
            valid_from: parse_date(cell(from_idx)).unwrap_or(as_of),
            valid_to: parse_date(cell(to_idx)).unwrap_or(as_of),
            fetched_at,
        });
    }
    Ok(out)
}

pub fn parse_rating(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(NEUTRAL_ELO)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 18).expect("date")
    }

    #[test]
    fn empty_body_is_empty_set() {
        assert!(parse_ratings_csv("", as_of(), Utc::now()).expect("parse").is_empty());
        assert!(parse_ratings_csv("  \n\n", as_of(), Utc::now()).expect("parse").is_empty());
    }

    #[test]
    fn header_only_is_empty_set() {
        let raw = "Rank,Club,Country,Level,Elo,From,To\n";
        assert!(parse_ratings_csv(raw, as_of(), Utc::now()).expect("parse").is_empty());
    }

    #[test]
    fn bad_ratings_default_to_neutral() {
        assert_eq!(parse_rating("abc"), NEUTRAL_ELO);
        assert_eq!(parse_rating(""), NEUTRAL_ELO);
        assert_eq!(parse_rating("NaN"), NEUTRAL_ELO);
        assert_eq!(parse_rating("inf"), NEUTRAL_ELO);
        assert_eq!(parse_rating("1923.5"), 1923.5);
    }

    #[test]
    fn rows_with_missing_cells_are_tolerated() {
        let raw = "Rank,Club,Country,Level,Elo,From,To\n\
                   None,Bodo/Glimt,NOR,1,,2024-10-01,bad\n\
                   ,,ENG,1,1800,2024-10-01,2024-10-05\n";
        let rows = parse_ratings_csv(raw, as_of(), Utc::now()).expect("parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].club, "Bodo/Glimt");
        assert_eq!(rows[0].rank, None);
        assert_eq!(rows[0].rating, NEUTRAL_ELO);
        assert_eq!(rows[0].valid_to, as_of());
    }

    #[test]
    fn missing_club_column_is_rejected() {
        let err = parse_ratings_csv("<html>oops</html>\nx", as_of(), Utc::now()).unwrap_err();
        assert!(matches!(err, FetchError::UpstreamUnavailable { .. }));
    }
}
