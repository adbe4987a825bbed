use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::upstream::article::ArticleText;
use crate::upstream::clubelo::EloEntry;
use crate::upstream::fbref::ExpectedGoalsEntry;
use crate::upstream::football_data::{
    Competition, MatchRecord, StandingRow, Team, TransferRecord,
};
use crate::upstream::news::NewsArticle;

/// Elo and xG upstreams refresh once a day.
pub const ELO_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const XG_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const NEWS_TTL: Duration = Duration::from_secs(15 * 60);
pub const FIXTURES_TTL: Duration = Duration::from_secs(60 * 60);
pub const ARTICLE_TTL: Duration = Duration::from_secs(60 * 60);

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builds `source:param:param`, or `source:all` when no parameter is set.
pub fn cache_key(source: &str, params: &[&str]) -> String {
    let parts = params
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>();
    if parts.is_empty() {
        format!("{source}:all")
    } else {
        format!("{source}:{}", parts.join(":"))
    }
}

#[derive(Debug)]
struct CacheEntry<T> {
    payload: Arc<T>,
    expires_at: Instant,
}

/// Process-local cache with a single freshness window.
///
/// Entries are only dropped when they are found stale. The lock is released
/// while a fetch runs, so two cold callers may both fetch; the later store wins.
pub struct TtlCache<T> {
    name: &'static str,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
}

impl<T> TtlCache<T> {
    pub fn new(name: &'static str, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(Arc::clone(&entry.payload)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: &str, payload: T) -> Arc<T> {
        let payload = Arc::new(payload);
        let entry = CacheEntry {
            payload: Arc::clone(&payload),
            expires_at: self.clock.now() + self.ttl,
        };
        self.lock().insert(key.to_string(), entry);
        payload
    }

    /// Returns the fresh entry for `key`, or runs `fetch` and stores its result.
    /// A failed fetch leaves the cache untouched.
    pub fn get_or_try_fetch<E, F>(&self, key: &str, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(hit) = self.get(key) {
            debug!(cache = self.name, key, "cache hit");
            return Ok(hit);
        }
        debug!(cache = self.name, key, "cache miss");
        let payload = fetch()?;
        Ok(self.insert(key, payload))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One cache per upstream source class. Built once at startup and shared.
pub struct ResponseCache {
    pub elo: TtlCache<Vec<EloEntry>>,
    pub xg: TtlCache<Vec<ExpectedGoalsEntry>>,
    pub competition_matches: TtlCache<Vec<MatchRecord>>,
    pub fixtures: TtlCache<Vec<MatchRecord>>,
    pub standings: TtlCache<Vec<StandingRow>>,
    pub competitions: TtlCache<Vec<Competition>>,
    pub teams: TtlCache<Vec<Team>>,
    pub team_matches: TtlCache<Vec<MatchRecord>>,
    pub transfers: TtlCache<Vec<TransferRecord>>,
    pub news: TtlCache<Vec<NewsArticle>>,
    pub articles: TtlCache<ArticleText>,
}

impl ResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            elo: TtlCache::new("elo", ELO_TTL, Arc::clone(&clock)),
            xg: TtlCache::new("xg", XG_TTL, Arc::clone(&clock)),
            competition_matches: TtlCache::new(
                "competition_matches",
                FIXTURES_TTL,
                Arc::clone(&clock),
            ),
            fixtures: TtlCache::new("fixtures", FIXTURES_TTL, Arc::clone(&clock)),
            standings: TtlCache::new("standings", FIXTURES_TTL, Arc::clone(&clock)),
            competitions: TtlCache::new("competitions", FIXTURES_TTL, Arc::clone(&clock)),
            teams: TtlCache::new("teams", FIXTURES_TTL, Arc::clone(&clock)),
            team_matches: TtlCache::new("team_matches", FIXTURES_TTL, Arc::clone(&clock)),
            transfers: TtlCache::new("transfers", FIXTURES_TTL, Arc::clone(&clock)),
            news: TtlCache::new("news", NEWS_TTL, Arc::clone(&clock)),
            articles: TtlCache::new("articles", ARTICLE_TTL, clock),
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn cache_with_clock(ttl: Duration) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let cache = TtlCache::new("test", ttl, clock.clone() as Arc<dyn Clock>);
        (cache, clock)
    }

    #[test]
    fn cache_key_uses_all_when_no_params() {
        assert_eq!(cache_key("fixtures", &[]), "fixtures:all");
        assert_eq!(cache_key("fixtures", &["  "]), "fixtures:all");
        assert_eq!(cache_key("matches", &["PL", "2024"]), "matches:PL:2024");
    }

    #[test]
    fn hit_within_window_returns_same_payload() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        let fetches = Cell::new(0);
        let fetch = || -> Result<String, ()> {
            fetches.set(fetches.get() + 1);
            Ok("payload".to_string())
        };

        let first = cache.get_or_try_fetch("k", fetch).expect("first");
        clock.advance(Duration::from_secs(59));
        let second = cache.get_or_try_fetch("k", fetch).expect("second");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn expiry_triggers_refetch() {
        let (cache, clock) = cache_with_clock(Duration::from_secs(60));
        let fetches = Cell::new(0);
        let fetch = || -> Result<String, ()> {
            fetches.set(fetches.get() + 1);
            Ok(format!("v{}", fetches.get()))
        };

        let first = cache.get_or_try_fetch("k", fetch).expect("first");
        clock.advance(Duration::from_secs(60));
        let second = cache.get_or_try_fetch("k", fetch).expect("second");

        assert_eq!(fetches.get(), 2);
        assert_eq!(first.as_str(), "v1");
        assert_eq!(second.as_str(), "v2");
    }

    #[test]
    fn failed_fetch_is_not_stored() {
        let (cache, _clock) = cache_with_clock(Duration::from_secs(60));
        let out: Result<_, &str> = cache.get_or_try_fetch("k", || Err("boom"));
        assert_eq!(out.err(), Some("boom"));
        assert!(cache.is_empty());

        let ok: Result<_, &str> = cache.get_or_try_fetch("k", || Ok("fine".to_string()));
        assert_eq!(ok.expect("second fetch").as_str(), "fine");
    }

    #[test]
    fn windows_per_source_class() {
        let cache = ResponseCache::with_system_clock();
        assert_eq!(cache.elo.ttl(), Duration::from_secs(86_400));
        assert_eq!(cache.xg.ttl(), Duration::from_secs(86_400));
        assert_eq!(cache.news.ttl(), Duration::from_secs(900));
        assert_eq!(cache.fixtures.ttl(), Duration::from_secs(3_600));
        assert_eq!(cache.teams.ttl(), Duration::from_secs(3_600));
        assert_eq!(cache.transfers.ttl(), Duration::from_secs(3_600));
        assert_eq!(cache.articles.ttl(), Duration::from_secs(3_600));
    }
}
