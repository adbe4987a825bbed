use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

const CACHE_DIR: &str = "footy_predict";
const DB_FILE: &str = "footy.sqlite";

const DEFAULT_SEASON: &str = "2024";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub football_data_key: Option<String>,
    pub news_api_key: Option<String>,
    pub season: String,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    pub store_enabled: bool,
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            football_data_key: None,
            news_api_key: None,
            season: DEFAULT_SEASON.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            store_enabled: true,
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let football_data_key =
            env_string("FOOTBALL_DATA_API_KEY").or_else(|| env_string("API_KEY"));
        let news_api_key = env_string("NEWS_API_KEY");
        let season = env_string("FOOTY_SEASON").unwrap_or_else(|| DEFAULT_SEASON.to_string());
        let timeout_secs = env_u64("FOOTY_HTTP_TIMEOUT_SECS")
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS)
            .clamp(1, 60);
        let retry_delay = env_u64("FOOTY_RETRY_DELAY_SECS").unwrap_or(DEFAULT_RETRY_DELAY_SECS);
        let retry_attempts = env_u64("FOOTY_RETRY_ATTEMPTS")
            .map(|v| v.clamp(1, 10) as u32)
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS);
        let store_enabled = env_bool("FOOTY_STORE_ENABLED", true);
        let db_path = env_string("FOOTY_DB_PATH")
            .map(PathBuf::from)
            .or_else(default_db_path);

        Self {
            football_data_key,
            news_api_key,
            season,
            http_timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy {
                max_attempts: retry_attempts,
                delay: Duration::from_secs(retry_delay),
            },
            store_enabled,
            db_path,
        }
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key).and_then(|v| v.parse::<u64>().ok())
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}
