use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::cache::{ResponseCache, TtlCache, XG_TTL, cache_key};
use crate::clubs::ClubResolver;
use crate::config::Config;
use crate::error::FetchError;
use crate::predict::engine::{self, MatchupInputs, PredictionResult, TeamInputs};
use crate::predict::scoring::{QuickPrediction, ScoringInputs, quick_predict};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper, with_rate_limit_retry};
use crate::stats::elo::EloTable;
use crate::stats::home_away::{self, HomeAwayTable};
use crate::stats::xg::{Side, XgTable};
use crate::store::Store;
use crate::upstream::article::ArticleText;
use crate::upstream::clubelo::EloEntry;
use crate::upstream::fbref::ExpectedGoalsEntry;
use crate::upstream::football_data::{
    Competition, MatchRecord, StandingRow, Team, TransferRecord, filter_standings,
};
use crate::upstream::news::NewsArticle;
use crate::upstream::{DataSource, HttpSource, League, today};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub home_team: String,
    pub away_team: String,
    pub league: Option<String>,
    pub season: Option<String>,
    /// Elo ratings date; today when absent.
    pub date: Option<NaiveDate>,
}

struct ValidRequest<'a> {
    home: &'a str,
    away: &'a str,
    league: League,
    season: String,
    date: NaiveDate,
}

/// Long-lived facade over the upstream sources. Owns the response cache,
/// the club resolver and the optional local store.
pub struct FootyService {
    source: Arc<dyn DataSource>,
    cache: ResponseCache,
    resolver: ClubResolver,
    store: Option<Mutex<Store>>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    season: String,
}

impl FootyService {
    pub fn new(source: Arc<dyn DataSource>, cache: ResponseCache) -> Self {
        Self {
            source,
            cache,
            resolver: ClubResolver::default(),
            store: None,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
            season: Config::default().season,
        }
    }

    /// Live sources, system clock, and the sqlite store when enabled. A store
    /// that fails to open is logged and skipped.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = Arc::new(HttpSource::new(config)?);
        let mut service = Self::new(source, ResponseCache::with_system_clock())
            .with_retry(config.retry, Arc::new(ThreadSleeper))
            .with_season(&config.season);
        if config.store_enabled
            && let Some(path) = config.db_path.as_deref()
        {
            match Store::open(path) {
                Ok(store) => service = service.with_store(store),
                Err(err) => warn!(error = %err, path = %path.display(), "store disabled"),
            }
        }
        Ok(service)
    }

    pub fn with_retry(mut self, policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        self.retry = policy;
        self.sleeper = sleeper;
        self
    }

    pub fn with_resolver(mut self, resolver: ClubResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(Mutex::new(store));
        self
    }

    pub fn with_season(mut self, season: &str) -> Self {
        self.season = season.to_string();
        self
    }

    /// Runs the three source loads in parallel and blends them.
    ///
    /// A source that fails degrades to neutral defaults and leaves a note in
    /// the trace. The call fails only when every source failed (first error
    /// wins) or when neither team turns up in any source.
    pub fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, FetchError> {
        let req = self.validate(request)?;
        let home = self.resolver.canonical(req.home).to_string();
        let away = self.resolver.canonical(req.away).to_string();

        let (matches, (elo, xg)) = rayon::join(
            || self.competition_matches(req.league, &req.season),
            || {
                rayon::join(
                    || self.elo_ratings(req.date),
                    || self.xg_entries(req.league),
                )
            },
        );

        let mut notes = Vec::new();
        let mut errors = Vec::new();

        let home_away = match matches {
            Ok(rows) => home_away::aggregate(&rows, &self.resolver),
            Err(err) => match self.stored_matches(req.league, &req.season) {
                Some(rows) => {
                    notes.push(format!(
                        "match history served from local store ({} matches): {err}",
                        rows.len()
                    ));
                    home_away::aggregate(&rows, &self.resolver)
                }
                None => {
                    degrade("match history", &err, &mut notes);
                    errors.push(err);
                    HomeAwayTable::default()
                }
            },
        };
        let elo = match elo {
            Ok(rows) => EloTable::from_entries(&rows, &self.resolver),
            Err(err) => {
                degrade("Elo ratings", &err, &mut notes);
                errors.push(err);
                EloTable::default()
            }
        };
        let xg = match xg {
            Ok(rows) => XgTable::from_entries(&rows, &self.resolver),
            Err(err) => {
                degrade("xG table", &err, &mut notes);
                errors.push(err);
                XgTable::default()
            }
        };

        if errors.len() == 3 {
            return Err(errors.remove(0));
        }

        let inputs = MatchupInputs {
            home: TeamInputs::from_tables(&home, Side::Home, &home_away, &xg, &elo),
            away: TeamInputs::from_tables(&away, Side::Away, &home_away, &xg, &elo),
        };
        if !inputs.home.resolved.any() && !inputs.away.resolved.any() {
            return Err(FetchError::MissingInput(format!(
                "neither {} nor {} was found in any source",
                req.home, req.away
            )));
        }

        let result = engine::predict_with_notes(&inputs, notes);
        info!(
            home = %home,
            away = %away,
            league = req.league.code(),
            home_pct = result.home_win_pct,
            draw_pct = result.draw_pct,
            away_pct = result.away_win_pct,
            sum = result.trace.pct_sum,
            "prediction computed"
        );
        Ok(result)
    }

    /// Standings-based quick prediction for two teams of the same league.
    pub fn quick_predict(
        &self,
        home_team: &str,
        away_team: &str,
        league: League,
        season: Option<&str>,
    ) -> Result<QuickPrediction, FetchError> {
        let home_team = required(home_team, "homeTeam")?;
        let away_team = required(away_team, "awayTeam")?;
        let season = season.unwrap_or(&self.season);
        let table = self.standings(league, season)?;

        let find = |name: &str| {
            let wanted = self.resolver.canonical(name);
            table
                .iter()
                .find(|row| self.resolver.canonical(&row.team_name) == wanted)
                .ok_or_else(|| {
                    FetchError::MissingInput(format!("{name} is not in the {} table", league.name()))
                })
        };
        let home_row = find(home_team)?;
        let away_row = find(away_team)?;
        Ok(quick_predict(&ScoringInputs::from_standings(home_row, away_row)))
    }

    pub fn competition_matches(
        &self,
        league: League,
        season: &str,
    ) -> Result<Arc<Vec<MatchRecord>>, FetchError> {
        let season = required(season, "season")?;
        let key = cache_key("matches", &[league.code(), season]);
        self.cache.competition_matches.get_or_try_fetch(&key, || {
            let rows = self.retrying(|| self.source.competition_matches(league, season))?;
            if let Some(mut store) = self.store()
                && let Err(err) = store.upsert_matches(&rows)
            {
                warn!(error = %err, league = league.code(), "failed to store matches");
            }
            Ok(rows)
        })
    }

    /// Matches on `date`, or upcoming matches from the default listing when
    /// no date is given.
    pub fn fixtures(&self, date: Option<NaiveDate>) -> Result<Vec<MatchRecord>, FetchError> {
        self.fixtures_at(date, Utc::now())
    }

    pub fn fixtures_at(
        &self,
        date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Vec<MatchRecord>, FetchError> {
        let day = date.map(|d| d.format("%Y-%m-%d").to_string());
        let key = cache_key("fixtures", &[day.as_deref().unwrap_or("")]);
        let rows = self.cached(&self.cache.fixtures, &key, || self.source.matches_on(date))?;
        if date.is_some() {
            return Ok(rows.as_ref().clone());
        }
        Ok(rows
            .iter()
            .filter(|m| kickoff(m).is_some_and(|k| k > now))
            .cloned()
            .collect())
    }

    pub fn standings(
        &self,
        league: League,
        season: &str,
    ) -> Result<Arc<Vec<StandingRow>>, FetchError> {
        let season = required(season, "season")?;
        let key = cache_key("standings", &[league.code(), season]);
        self.cached(&self.cache.standings, &key, || {
            self.source.standings(league, season)
        })
    }

    /// The league table narrowed to `team_ids`, for side-by-side comparison.
    pub fn standings_for_teams(
        &self,
        league: League,
        season: &str,
        team_ids: &[u64],
    ) -> Result<Vec<StandingRow>, FetchError> {
        if team_ids.is_empty() {
            return Err(FetchError::MissingInput("teams".to_string()));
        }
        let table = self.standings(league, season)?;
        Ok(filter_standings(&table, team_ids))
    }

    pub fn competition_teams(
        &self,
        league: League,
        season: &str,
    ) -> Result<Arc<Vec<Team>>, FetchError> {
        let season = required(season, "season")?;
        let key = cache_key("teams", &[league.code(), season]);
        self.cached(&self.cache.teams, &key, || {
            self.source.competition_teams(league, season)
        })
    }

    pub fn team_matches(
        &self,
        team_id: u64,
        season: &str,
    ) -> Result<Arc<Vec<MatchRecord>>, FetchError> {
        let season = required(season, "season")?;
        let key = cache_key("team_matches", &[&team_id.to_string(), season]);
        self.cached(&self.cache.team_matches, &key, || {
            self.source.team_matches(team_id, season)
        })
    }

    pub fn transfers(&self) -> Result<Arc<Vec<TransferRecord>>, FetchError> {
        let key = cache_key("transfers", &[]);
        self.cached(&self.cache.transfers, &key, || self.source.transfers())
    }

    pub fn competitions(&self) -> Result<Arc<Vec<Competition>>, FetchError> {
        let key = cache_key("competitions", &[]);
        self.cached(&self.cache.competitions, &key, || self.source.competitions())
    }

    pub fn elo_ratings(&self, date: NaiveDate) -> Result<Arc<Vec<EloEntry>>, FetchError> {
        let key = cache_key("elo", &[&date.format("%Y-%m-%d").to_string()]);
        self.cached(&self.cache.elo, &key, || self.source.elo_ratings(date))
    }

    /// Cache, then a fresh stored set, then a scrape that is written back.
    pub fn xg_entries(&self, league: League) -> Result<Arc<Vec<ExpectedGoalsEntry>>, FetchError> {
        let key = cache_key("xg", &[league.code()]);
        self.cache.xg.get_or_try_fetch(&key, || {
            if let Some(stored) = self.fresh_stored_xg(league) {
                return Ok(stored);
            }
            let rows = self.retrying(|| self.source.xg_table(league))?;
            if let Some(mut store) = self.store()
                && let Err(err) = store.replace_xg_league(league.name(), &rows)
            {
                warn!(error = %err, league = league.name(), "failed to store xg set");
            }
            Ok(rows)
        })
    }

    pub fn news(&self, category: Option<&str>) -> Result<Arc<Vec<NewsArticle>>, FetchError> {
        let key = cache_key("news", &[category.unwrap_or("")]);
        self.cached(&self.cache.news, &key, || self.source.news(category))
    }

    pub fn article(&self, url: &str) -> Result<Arc<ArticleText>, FetchError> {
        let url = required(url, "url")?;
        let key = cache_key("article", &[url]);
        self.cached(&self.cache.articles, &key, || self.source.article_text(url))
    }

    fn validate<'a>(&self, request: &'a PredictionRequest) -> Result<ValidRequest<'a>, FetchError> {
        let home = required(&request.home_team, "homeTeam")?;
        let away = required(&request.away_team, "awayTeam")?;
        let raw_league = request
            .league
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| FetchError::MissingInput("league".to_string()))?;
        let league = League::parse(raw_league)
            .ok_or_else(|| FetchError::MissingInput(format!("league: unknown code {raw_league}")))?;
        let season = request
            .season
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.season)
            .to_string();
        Ok(ValidRequest {
            home,
            away,
            league,
            season,
            date: request.date.unwrap_or_else(today),
        })
    }

    fn stored_matches(&self, league: League, season: &str) -> Option<Vec<MatchRecord>> {
        let store = self.store()?;
        match store.load_completed_matches(league.code(), season) {
            Ok(rows) if !rows.is_empty() => Some(rows),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "failed to read stored matches");
                None
            }
        }
    }

    fn fresh_stored_xg(&self, league: League) -> Option<Vec<ExpectedGoalsEntry>> {
        let store = self.store()?;
        let max_age = chrono::Duration::seconds(XG_TTL.as_secs() as i64);
        match store.load_xg_entries(league.name(), max_age, Utc::now()) {
            Ok(rows) if !rows.is_empty() => Some(rows),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "failed to read stored xg");
                None
            }
        }
    }

    fn cached<T, F>(&self, cache: &TtlCache<T>, key: &str, fetch: F) -> Result<Arc<T>, FetchError>
    where
        F: FnMut() -> Result<T, FetchError>,
    {
        cache.get_or_try_fetch(key, || self.retrying(fetch))
    }

    fn retrying<T, F>(&self, fetch: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Result<T, FetchError>,
    {
        with_rate_limit_retry(self.retry, self.sleeper.as_ref(), fetch)
    }

    fn store(&self) -> Option<MutexGuard<'_, Store>> {
        self.store
            .as_ref()
            .map(|s| s.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn degrade(what: &str, err: &FetchError, notes: &mut Vec<String>) {
    warn!(error = %err, "{what} unavailable, using defaults");
    notes.push(format!("{what} unavailable ({err}); defaults used"));
}

fn required<'a>(value: &'a str, name: &str) -> Result<&'a str, FetchError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FetchError::MissingInput(name.to_string()))
    } else {
        Ok(value)
    }
}

fn kickoff(m: &MatchRecord) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&m.utc_date)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
