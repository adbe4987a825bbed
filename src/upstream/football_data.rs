use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::League;
use crate::error::{FetchError, Upstream};
use crate::http_client::get_text;

const FOOTBALL_DATA_BASE_URL: &str = "https://api.football-data.org/v4";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: u64,
    pub utc_date: String,
    pub status: String,
    pub competition_code: Option<String>,
    pub competition_name: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub home_crest: Option<String>,
    pub away_crest: Option<String>,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
}

impl MatchRecord {
    /// Full-time score, present only once both sides have one.
    pub fn final_score(&self) -> Option<(u32, u32)> {
        Some((self.home_goals?, self.away_goals?))
    }

    pub fn is_completed(&self) -> bool {
        self.final_score().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingRow {
    pub position: u32,
    pub team_id: u64,
    pub team_name: String,
    pub played_games: u32,
    pub won: u32,
    pub draw: u32,
    pub lost: u32,
    pub points: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub goal_difference: i32,
    pub form: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
    pub short_name: Option<String>,
    pub tla: Option<String>,
    pub crest: Option<String>,
    pub venue: Option<String>,
}

/// One player move as listed by the transfers feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferRecord {
    pub player: String,
    pub player_image: Option<String>,
    pub from: String,
    pub to: String,
    pub transfer_fee: Option<String>,
    pub transfer_type: Option<String>,
    pub position: Option<String>,
    pub contract: Option<String>,
    pub market_value: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Competition {
    pub id: u64,
    pub code: String,
    pub name: String,
    pub emblem: Option<String>,
}

pub fn fetch_competition_matches(
    client: &Client,
    api_key: Option<&str>,
    league: League,
    season: &str,
) -> Result<Vec<MatchRecord>, FetchError> {
    let season = require(season, "season")?;
    let url = format!(
        "{FOOTBALL_DATA_BASE_URL}/competitions/{}/matches?season={season}",
        league.code()
    );
    let body = get(client, api_key, &url)?;
    let rows = parse_matches_json(&body)?;
    debug!(league = league.code(), season, count = rows.len(), "competition matches parsed");
    Ok(rows)
}

pub fn fetch_matches_on(
    client: &Client,
    api_key: Option<&str>,
    date: Option<NaiveDate>,
) -> Result<Vec<MatchRecord>, FetchError> {
    let url = match date {
        Some(date) => format!("{FOOTBALL_DATA_BASE_URL}/matches?date={}", date.format("%Y-%m-%d")),
        None => format!("{FOOTBALL_DATA_BASE_URL}/matches"),
    };
    let body = get(client, api_key, &url)?;
    parse_matches_json(&body)
}

pub fn fetch_standings(
    client: &Client,
    api_key: Option<&str>,
    league: League,
    season: &str,
) -> Result<Vec<StandingRow>, FetchError> {
    let season = require(season, "season")?;
    let url = format!(
        "{FOOTBALL_DATA_BASE_URL}/competitions/{}/standings?season={season}",
        league.code()
    );
    let body = get(client, api_key, &url)?;
    parse_standings_json(&body)
}

/// Squads registered in a competition for one season.
pub fn fetch_competition_teams(
    client: &Client,
    api_key: Option<&str>,
    league: League,
    season: &str,
) -> Result<Vec<Team>, FetchError> {
    let season = require(season, "season")?;
    let url = format!(
        "{FOOTBALL_DATA_BASE_URL}/competitions/{}/teams?season={season}",
        league.code()
    );
    let body = get(client, api_key, &url)?;
    parse_teams_json(&body)
}

/// Every match one team plays in a season, across competitions.
pub fn fetch_team_matches(
    client: &Client,
    api_key: Option<&str>,
    team_id: u64,
    season: &str,
) -> Result<Vec<MatchRecord>, FetchError> {
    let season = require(season, "season")?;
    let url = format!("{FOOTBALL_DATA_BASE_URL}/teams/{team_id}/matches?season={season}");
    let body = get(client, api_key, &url)?;
    let rows = parse_matches_json(&body)?;
    debug!(team_id, season, count = rows.len(), "team matches parsed");
    Ok(rows)
}

pub fn fetch_transfers(
    client: &Client,
    api_key: Option<&str>,
) -> Result<Vec<TransferRecord>, FetchError> {
    let url = format!("{FOOTBALL_DATA_BASE_URL}/transfers");
    let body = get(client, api_key, &url)?;
    parse_transfers_json(&body)
}

pub fn fetch_competitions(
    client: &Client,
    api_key: Option<&str>,
) -> Result<Vec<Competition>, FetchError> {
    let url = format!("{FOOTBALL_DATA_BASE_URL}/competitions");
    let body = get(client, api_key, &url)?;
    parse_competitions_json(&body)
}

fn get(client: &Client, api_key: Option<&str>, url: &str) -> Result<String, FetchError> {
    match api_key {
        Some(key) => get_text(client, Upstream::FootballData, url, &[("X-Auth-Token", key)]),
        None => get_text(client, Upstream::FootballData, url, &[]),
    }
}

fn require<'a>(value: &'a str, name: &str) -> Result<&'a str, FetchError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FetchError::MissingInput(name.to_string()))
    } else {
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct MatchesResponse {
    matches: Option<Vec<RawMatch>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMatch {
    id: u64,
    #[serde(default)]
    utc_date: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    competition: Option<RawCompetition>,
    home_team: RawTeam,
    away_team: RawTeam,
    #[serde(default)]
    score: Option<RawScore>,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    crest: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScore {
    #[serde(default)]
    full_time: Option<RawGoals>,
}

#[derive(Debug, Deserialize)]
struct RawGoals {
    home: Option<u32>,
    away: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawCompetition {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    emblem: Option<String>,
}

/// Rows whose team names are not yet known (e.g. undrawn cup ties) are skipped.
pub fn parse_matches_json(raw: &str) -> Result<Vec<MatchRecord>, FetchError> {
    let resp: MatchesResponse = decode(raw)?;
    let Some(matches) = resp.matches else {
        return Err(malformed("response has no matches array"));
    };

    let mut out = Vec::with_capacity(matches.len());
    for m in matches {
        let home_team = non_empty(m.home_team.name);
        let away_team = non_empty(m.away_team.name);
        let (Some(home_team), Some(away_team)) = (home_team, away_team) else {
            continue;
        };
        let goals = m.score.and_then(|s| s.full_time);
        let competition = m.competition;
        out.push(MatchRecord {
            id: m.id,
            utc_date: m.utc_date.unwrap_or_default(),
            status: m.status.unwrap_or_default(),
            competition_code: competition.as_ref().and_then(|c| c.code.clone()),
            competition_name: competition.as_ref().and_then(|c| c.name.clone()),
            home_team,
            away_team,
            home_crest: m.home_team.crest,
            away_crest: m.away_team.crest,
            home_goals: goals.as_ref().and_then(|g| g.home),
            away_goals: goals.as_ref().and_then(|g| g.away),
        });
    }
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct StandingsResponse {
    standings: Option<Vec<RawStanding>>,
}

#[derive(Debug, Deserialize)]
struct RawStanding {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    table: Vec<RawTableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTableRow {
    position: u32,
    team: RawTeam,
    #[serde(default)]
    played_games: u32,
    #[serde(default)]
    won: u32,
    #[serde(default)]
    draw: u32,
    #[serde(default)]
    lost: u32,
    #[serde(default)]
    points: i32,
    #[serde(default)]
    goals_for: i32,
    #[serde(default)]
    goals_against: i32,
    #[serde(default)]
    goal_difference: i32,
    #[serde(default)]
    form: Option<String>,
}

/// Returns the `TOTAL` table (or the first one when none is tagged).
pub fn parse_standings_json(raw: &str) -> Result<Vec<StandingRow>, FetchError> {
    let resp: StandingsResponse = decode(raw)?;
    let Some(standings) = resp.standings else {
        return Err(malformed("response has no standings array"));
    };
    let total_idx = standings
        .iter()
        .position(|s| s.kind.as_deref() == Some("TOTAL"))
        .unwrap_or(0);
    let Some(standing) = standings.into_iter().nth(total_idx) else {
        return Ok(Vec::new());
    };

    let rows = standing
        .table
        .into_iter()
        .filter_map(|row| {
            let team_id = row.team.id?;
            let team_name = non_empty(row.team.name)?;
            Some(StandingRow {
                position: row.position,
                team_id,
                team_name,
                played_games: row.played_games,
                won: row.won,
                draw: row.draw,
                lost: row.lost,
                points: row.points,
                goals_for: row.goals_for,
                goals_against: row.goals_against,
                goal_difference: row.goal_difference,
                form: row.form,
            })
        })
        .collect();
    Ok(rows)
}

/// Keeps the rows whose team id is in `team_ids`, in table order.
pub fn filter_standings(rows: &[StandingRow], team_ids: &[u64]) -> Vec<StandingRow> {
    rows.iter()
        .filter(|row| team_ids.contains(&row.team_id))
        .cloned()
        .collect()
}

#[derive(Debug, Deserialize)]
struct TeamsResponse {
    teams: Option<Vec<RawSquad>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSquad {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    tla: Option<String>,
    #[serde(default)]
    crest: Option<String>,
    #[serde(default)]
    venue: Option<String>,
}

pub fn parse_teams_json(raw: &str) -> Result<Vec<Team>, FetchError> {
    let resp: TeamsResponse = decode(raw)?;
    let Some(teams) = resp.teams else {
        return Err(malformed("response has no teams array"));
    };
    let rows = teams
        .into_iter()
        .filter_map(|t| {
            Some(Team {
                id: t.id?,
                name: non_empty(t.name)?,
                short_name: non_empty(t.short_name),
                tla: non_empty(t.tla),
                crest: t.crest,
                venue: non_empty(t.venue),
            })
        })
        .collect();
    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct TransfersResponse {
    transfers: Option<Vec<RawTransfer>>,
}

#[derive(Debug, Deserialize)]
struct RawTransfer {
    #[serde(default)]
    player: Option<String>,
    #[serde(default)]
    player_image: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    transfer_fee: Option<String>,
    #[serde(default)]
    transfer_type: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    contract: Option<String>,
    #[serde(default)]
    market_value: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

/// Moves without a player or either club are dropped.
pub fn parse_transfers_json(raw: &str) -> Result<Vec<TransferRecord>, FetchError> {
    let resp: TransfersResponse = decode(raw)?;
    let Some(transfers) = resp.transfers else {
        return Err(malformed("response has no transfers array"));
    };
    let rows = transfers
        .into_iter()
        .filter_map(|t| {
            Some(TransferRecord {
                player: non_empty(t.player)?,
                player_image: non_empty(t.player_image),
                from: non_empty(t.from)?,
                to: non_empty(t.to)?,
                transfer_fee: non_empty(t.transfer_fee),
                transfer_type: non_empty(t.transfer_type),
                position: non_empty(t.position),
                contract: non_empty(t.contract),
                market_value: non_empty(t.market_value),
                date: non_empty(t.date),
            })
        })
        .collect();
    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct CompetitionsResponse {
    competitions: Option<Vec<RawCompetition>>,
}

/// Keeps only the five leagues the engine knows about.
pub fn parse_competitions_json(raw: &str) -> Result<Vec<Competition>, FetchError> {
    let resp: CompetitionsResponse = decode(raw)?;
    let Some(competitions) = resp.competitions else {
        return Err(malformed("response has no competitions array"));
    };
    let rows = competitions
        .into_iter()
        .filter_map(|c| {
            let code = c.code?;
            if !League::ALL.iter().any(|l| l.code() == code) {
                return None;
            }
            Some(Competition {
                id: c.id?,
                code,
                name: c.name.unwrap_or_default(),
                emblem: c.emblem,
            })
        })
        .collect();
    Ok(rows)
}

fn decode<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, FetchError> {
    serde_json::from_str(raw.trim()).map_err(|err| malformed(format!("invalid json: {err}")))
}

fn malformed(message: impl Into<String>) -> FetchError {
    FetchError::unavailable(Upstream::FootballData, message)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
