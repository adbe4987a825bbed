//! Typed adapters over the third-party providers.
//!
//! Each provider module splits into a `fetch_*` function (one outbound request,
//! status translation) and a pure `parse_*` function that validates the body.
//! No caching or retrying happens here.

pub mod article;
pub mod clubelo;
pub mod fbref;
pub mod football_data;
pub mod news;

use chrono::{NaiveDate, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::FetchError;
use crate::http_client::build_client;

use self::article::ArticleText;
use self::clubelo::EloEntry;
use self::fbref::ExpectedGoalsEntry;
use self::football_data::{Competition, MatchRecord, StandingRow, Team, TransferRecord};
use self::news::NewsArticle;

/// The five leagues every provider covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
    PremierLeague,
    LaLiga,
    Bundesliga,
    SerieA,
    Ligue1,
}

impl League {
    pub const ALL: [League; 5] = [
        League::PremierLeague,
        League::LaLiga,
        League::Bundesliga,
        League::SerieA,
        League::Ligue1,
    ];

    /// football-data.org competition code.
    pub fn code(self) -> &'static str {
        match self {
            League::PremierLeague => "PL",
            League::LaLiga => "PD",
            League::Bundesliga => "BL1",
            League::SerieA => "SA",
            League::Ligue1 => "FL1",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            League::PremierLeague => "Premier League",
            League::LaLiga => "La Liga",
            League::Bundesliga => "Bundesliga",
            League::SerieA => "Serie A",
            League::Ligue1 => "Ligue 1",
        }
    }

    pub fn fbref_url(self) -> &'static str {
        match self {
            League::PremierLeague => "https://fbref.com/en/comps/9/Premier-League-Stats",
            League::LaLiga => "https://fbref.com/en/comps/12/La-Liga-Stats",
            League::Bundesliga => "https://fbref.com/en/comps/20/Bundesliga-Stats",
            League::SerieA => "https://fbref.com/en/comps/11/Serie-A-Stats",
            League::Ligue1 => "https://fbref.com/en/comps/13/Ligue-1-Stats",
        }
    }

    /// Accepts a competition code (`PL`) or a league name (`premier league`).
    pub fn parse(raw: &str) -> Option<League> {
        let key = raw.trim().to_ascii_lowercase();
        League::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(&key) || l.name().to_ascii_lowercase() == key)
    }
}

/// Everything the service layer reads from the outside world.
pub trait DataSource: Send + Sync {
    fn competition_matches(
        &self,
        league: League,
        season: &str,
    ) -> Result<Vec<MatchRecord>, FetchError>;
    fn matches_on(&self, date: Option<NaiveDate>) -> Result<Vec<MatchRecord>, FetchError>;
    fn standings(&self, league: League, season: &str) -> Result<Vec<StandingRow>, FetchError>;
    fn competitions(&self) -> Result<Vec<Competition>, FetchError>;
    fn competition_teams(&self, league: League, season: &str) -> Result<Vec<Team>, FetchError>;
    fn team_matches(&self, team_id: u64, season: &str) -> Result<Vec<MatchRecord>, FetchError>;
    fn transfers(&self) -> Result<Vec<TransferRecord>, FetchError>;
    fn elo_ratings(&self, date: NaiveDate) -> Result<Vec<EloEntry>, FetchError>;
    fn xg_table(&self, league: League) -> Result<Vec<ExpectedGoalsEntry>, FetchError>;
    fn news(&self, category: Option<&str>) -> Result<Vec<NewsArticle>, FetchError>;
    fn article_text(&self, url: &str) -> Result<ArticleText, FetchError>;
}

/// Live HTTP implementation over one shared blocking client.
pub struct HttpSource {
    client: Client,
    football_data_key: Option<String>,
    news_api_key: Option<String>,
}

impl HttpSource {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(config.http_timeout)?,
            football_data_key: config.football_data_key.clone(),
            news_api_key: config.news_api_key.clone(),
        })
    }
}

impl DataSource for HttpSource {
    fn competition_matches(
        &self,
        league: League,
        season: &str,
    ) -> Result<Vec<MatchRecord>, FetchError> {
        football_data::fetch_competition_matches(
            &self.client,
            self.football_data_key.as_deref(),
            league,
            season,
        )
    }

    fn matches_on(&self, date: Option<NaiveDate>) -> Result<Vec<MatchRecord>, FetchError> {
        football_data::fetch_matches_on(&self.client, self.football_data_key.as_deref(), date)
    }

    fn standings(&self, league: League, season: &str) -> Result<Vec<StandingRow>, FetchError> {
        football_data::fetch_standings(
            &self.client,
            self.football_data_key.as_deref(),
            league,
            season,
        )
    }

    fn competitions(&self) -> Result<Vec<Competition>, FetchError> {
        football_data::fetch_competitions(&self.client, self.football_data_key.as_deref())
    }

    fn competition_teams(&self, league: League, season: &str) -> Result<Vec<Team>, FetchError> {
        football_data::fetch_competition_teams(
            &self.client,
            self.football_data_key.as_deref(),
            league,
            season,
        )
    }

    fn team_matches(&self, team_id: u64, season: &str) -> Result<Vec<MatchRecord>, FetchError> {
        football_data::fetch_team_matches(
            &self.client,
            self.football_data_key.as_deref(),
            team_id,
            season,
        )
    }

    fn transfers(&self) -> Result<Vec<TransferRecord>, FetchError> {
        football_data::fetch_transfers(&self.client, self.football_data_key.as_deref())
    }

    fn elo_ratings(&self, date: NaiveDate) -> Result<Vec<EloEntry>, FetchError> {
        clubelo::fetch_ratings(&self.client, date)
    }

    fn xg_table(&self, league: League) -> Result<Vec<ExpectedGoalsEntry>, FetchError> {
        fbref::fetch_league_table(&self.client, league)
    }

    fn news(&self, category: Option<&str>) -> Result<Vec<NewsArticle>, FetchError> {
        news::fetch_news(&self.client, self.news_api_key.as_deref(), category)
    }

    fn article_text(&self, url: &str) -> Result<ArticleText, FetchError> {
        article::fetch_article_text(&self.client, url)
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::League;

    #[test]
    fn league_parse_accepts_codes_and_names() {
        assert_eq!(League::parse("PL"), Some(League::PremierLeague));
        assert_eq!(League::parse("bl1"), Some(League::Bundesliga));
        assert_eq!(League::parse(" Serie A "), Some(League::SerieA));
        assert_eq!(League::parse("MLS"), None);
    }
}
