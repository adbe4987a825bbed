use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use tracing::debug;

use crate::upstream::fbref::ExpectedGoalsEntry;
use crate::upstream::football_data::MatchRecord;

/// Local sqlite persistence: scraped xG sets (replaced per league) and
/// football-data matches (upserted by id).
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Drops every stored row for the league and writes `entries` in one
    /// transaction. An empty set is refused so a bad scrape cannot wipe a league.
    pub fn replace_xg_league(
        &mut self,
        league: &str,
        entries: &[ExpectedGoalsEntry],
    ) -> Result<usize> {
        if entries.is_empty() {
            anyhow::bail!("refusing to replace {league} xG with an empty set");
        }
        let tx = self.conn.transaction().context("begin xg transaction")?;
        tx.execute("DELETE FROM xg_entries WHERE league = ?1", params![league])
            .context("delete league xg")?;
        for e in entries {
            tx.execute(
                "INSERT INTO xg_entries (league, squad, rank, xg, xga, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    league,
                    e.squad,
                    e.rank.map(i64::from),
                    e.xg,
                    e.xga,
                    timestamp(e.fetched_at),
                ],
            )
            .context("insert xg row")?;
        }
        tx.commit().context("commit xg transaction")?;
        debug!(league, count = entries.len(), "stored xg set");
        Ok(entries.len())
    }

    /// The stored set for `league` when it was scraped within `max_age` of
    /// `now`, otherwise empty.
    pub fn load_xg_entries(
        &self,
        league: &str,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpectedGoalsEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT squad, rank, xg, xga, fetched_at FROM xg_entries
                 WHERE league = ?1 ORDER BY rank ASC, squad ASC",
            )
            .context("prepare load xg query")?;
        let rows = stmt
            .query_map(params![league], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .context("query load xg")?;

        let cutoff = now - max_age;
        let mut out = Vec::new();
        for row in rows {
            let (squad, rank, xg, xga, fetched_at) = row.context("decode xg row")?;
            let Some(fetched_at) = parse_timestamp(&fetched_at) else {
                return Ok(Vec::new());
            };
            if fetched_at < cutoff {
                return Ok(Vec::new());
            }
            out.push(ExpectedGoalsEntry {
                rank: rank.and_then(|r| u32::try_from(r).ok()),
                squad,
                league: league.to_string(),
                xg,
                xga,
                fetched_at,
            });
        }
        Ok(out)
    }

    pub fn upsert_matches(&mut self, rows: &[MatchRecord]) -> Result<usize> {
        let tx = self.conn.transaction().context("begin match transaction")?;
        for m in rows {
            tx.execute(
                r#"
                INSERT INTO matches (
                    match_id, season, utc_date, status, competition_code, competition_name,
                    home_team, away_team, home_crest, away_crest,
                    home_goals, away_goals, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(match_id) DO UPDATE SET
                    season = excluded.season,
                    utc_date = excluded.utc_date,
                    status = excluded.status,
                    competition_code = excluded.competition_code,
                    competition_name = excluded.competition_name,
                    home_team = excluded.home_team,
                    away_team = excluded.away_team,
                    home_crest = excluded.home_crest,
                    away_crest = excluded.away_crest,
                    home_goals = excluded.home_goals,
                    away_goals = excluded.away_goals,
                    updated_at = excluded.updated_at
                "#,
                params![
                    m.id as i64,
                    season_of(&m.utc_date),
                    m.utc_date,
                    m.status,
                    m.competition_code,
                    m.competition_name,
                    m.home_team,
                    m.away_team,
                    m.home_crest,
                    m.away_crest,
                    m.home_goals.map(i64::from),
                    m.away_goals.map(i64::from),
                    timestamp(Utc::now()),
                ],
            )
            .context("upsert match")?;
        }
        tx.commit().context("commit match transaction")?;
        Ok(rows.len())
    }

    /// Completed matches of one competition season, oldest first.
    pub fn load_completed_matches(
        &self,
        competition_code: &str,
        season: &str,
    ) -> Result<Vec<MatchRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT match_id, utc_date, status, competition_code, competition_name,
                       home_team, away_team, home_crest, away_crest, home_goals, away_goals
                FROM matches
                WHERE competition_code = ?1
                  AND season = ?2
                  AND home_goals IS NOT NULL
                  AND away_goals IS NOT NULL
                ORDER BY utc_date ASC, match_id ASC
                "#,
            )
            .context("prepare load matches query")?;
        let rows = stmt
            .query_map(params![competition_code, season], |row| {
                Ok(MatchRecord {
                    id: row.get::<_, i64>(0)? as u64,
                    utc_date: row.get(1)?,
                    status: row.get(2)?,
                    competition_code: row.get(3)?,
                    competition_name: row.get(4)?,
                    home_team: row.get(5)?,
                    away_team: row.get(6)?,
                    home_crest: row.get(7)?,
                    away_crest: row.get(8)?,
                    home_goals: row.get::<_, Option<i64>>(9)?.and_then(|g| u32::try_from(g).ok()),
                    away_goals: row.get::<_, Option<i64>>(10)?.and_then(|g| u32::try_from(g).ok()),
                })
            })
            .context("query load matches")?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode match row")?);
        }
        Ok(out)
    }

    pub fn match_count(&self) -> Result<usize> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get::<_, i64>(0))
            .context("count matches")?;
        Ok(n as usize)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS xg_entries (
            league TEXT NOT NULL,
            squad TEXT NOT NULL,
            rank INTEGER NULL,
            xg REAL NOT NULL,
            xga REAL NOT NULL,
            fetched_at TEXT NOT NULL,
            PRIMARY KEY (league, squad)
        );
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            season TEXT NULL,
            utc_date TEXT NOT NULL,
            status TEXT NOT NULL,
            competition_code TEXT NULL,
            competition_name TEXT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_crest TEXT NULL,
            away_crest TEXT NULL,
            home_goals INTEGER NULL,
            away_goals INTEGER NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_competition ON matches(competition_code, season);
        CREATE INDEX IF NOT EXISTS idx_matches_utc_date ON matches(utc_date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// football-data season label (start year) for a kickoff time. European
/// seasons start in July, so a January kickoff belongs to the previous year.
pub fn season_of(utc_date: &str) -> Option<String> {
    let date = utc_date
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())?;
    let start_year = if date.month() >= 7 {
        date.year()
    } else {
        date.year() - 1
    };
    Some(start_year.to_string())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
