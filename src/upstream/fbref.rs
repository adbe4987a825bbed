use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::League;
use crate::error::{FetchError, Upstream};
use crate::http_client::get_text;

static TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.stats_table").expect("valid table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody tr").expect("valid row selector"));
static RANK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th[data-stat='rank']").expect("valid rank selector"));
static TEAM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td[data-stat='team']").expect("valid team selector"));
static TEAM_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid link selector"));
static XG_FOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td[data-stat='xg_for']").expect("valid xg selector"));
static XG_AGAINST: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td[data-stat='xg_against']").expect("valid xga selector"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedGoalsEntry {
    pub rank: Option<u32>,
    pub squad: String,
    pub league: String,
    pub xg: f64,
    pub xga: f64,
    pub fetched_at: DateTime<Utc>,
}

pub fn fetch_league_table(
    client: &Client,
    league: League,
) -> Result<Vec<ExpectedGoalsEntry>, FetchError> {
    let html = get_text(client, Upstream::Fbref, league.fbref_url(), &[])?;
    let rows = parse_league_table(&html, league, Utc::now())?;
    debug!(league = league.name(), count = rows.len(), "fbref table parsed");
    Ok(rows)
}

/// Reads the first `stats_table` on the page.
///
/// Rows without a team cell are skipped. A missing, unparseable or negative
/// xG / xGA cell reads as 0.0. A page with no table, or a table with no usable
/// rows, is rejected so an empty set never replaces a stored one.
pub fn parse_league_table(
    html: &str,
    league: League,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<ExpectedGoalsEntry>, FetchError> {
    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&TABLE).next() else {
        return Err(FetchError::unavailable(
            Upstream::Fbref,
            format!("{}: table not found", league.name()),
        ));
    };

    let mut out = Vec::new();
    for row in table.select(&ROW) {
        let Some(squad) = team_name(row) else {
            continue;
        };
        out.push(ExpectedGoalsEntry {
            rank: cell_text(row, &RANK).and_then(|s| s.parse::<u32>().ok()),
            squad,
            league: league.name().to_string(),
            xg: stat_value(row, &XG_FOR),
            xga: stat_value(row, &XG_AGAINST),
            fetched_at,
        });
    }

    if out.is_empty() {
        warn!(league = league.name(), "fbref table had no usable rows");
        return Err(FetchError::unavailable(
            Upstream::Fbref,
            format!("{}: no data found", league.name()),
        ));
    }
    Ok(out)
}

fn team_name(row: ElementRef<'_>) -> Option<String> {
    let cell = row.select(&TEAM).next()?;
    let text = match cell.select(&TEAM_LINK).next() {
        Some(link) => link.text().collect::<String>(),
        None => cell.text().collect::<String>(),
    };
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn cell_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    let cell = row.select(selector).next()?;
    let text = cell.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn stat_value(row: ElementRef<'_>, selector: &Selector) -> f64 {
    cell_text(row, selector)
        .and_then(|s| s.replace(',', "").parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_is_an_error() {
        let err = parse_league_table("<html><body>blocked</body></html>", League::LaLiga, Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::unavailable(Upstream::Fbref, "La Liga: table not found")
        );
    }

    #[test]
    fn spacer_rows_and_bad_cells_are_tolerated() {
        let html = r#"
<table class="stats_table"><tbody>
<tr><th data-stat="rank">1</th><td data-stat="team">Girona</td>
    <td data-stat="xg_for">-</td><td data-stat="xg_against">12.5</td></tr>
<tr class="spacer"><td colspan="5"></td></tr>
</tbody></table>"#;
        let rows = parse_league_table(html, League::LaLiga, Utc::now()).expect("parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].squad, "Girona");
        assert_eq!(rows[0].xg, 0.0);
        assert_eq!(rows[0].xga, 12.5);
        assert_eq!(rows[0].league, "La Liga");
    }
}
