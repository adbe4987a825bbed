use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::{info, warn};

use footy_predict::config::Config;
use footy_predict::http_client::build_client;
use footy_predict::logging;
use footy_predict::retry::{ThreadSleeper, with_rate_limit_retry};
use footy_predict::store::Store;
use footy_predict::upstream::football_data;

const DEFAULT_DAYS: i64 = 30;

fn main() -> Result<()> {
    logging::init();
    let config = Config::from_env();
    let days = parse_days_arg().unwrap_or(DEFAULT_DAYS);
    let db_path = parse_db_path_arg()
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")?;

    let client = build_client(config.http_timeout)?;
    let mut store = Store::open(&db_path)?;
    let today = chrono::Utc::now().date_naive();

    let mut days_ok = 0usize;
    let mut upserted = 0usize;
    let mut errors = Vec::new();
    for offset in -days..=days {
        let date = today + Duration::days(offset);
        let fetched = with_rate_limit_retry(config.retry, &ThreadSleeper, || {
            football_data::fetch_matches_on(&client, config.football_data_key.as_deref(), Some(date))
        });
        match fetched {
            Ok(rows) => {
                upserted += store.upsert_matches(&rows)?;
                days_ok += 1;
                info!(%date, count = rows.len(), "matches stored");
            }
            Err(err) => {
                warn!(%date, error = %err, "match fetch failed");
                errors.push(format!("{date}: {err}"));
            }
        }
    }

    println!("Match ingest complete");
    println!("DB: {}", db_path.display());
    println!("Days: {}/{}", days_ok, 2 * days + 1);
    println!("Matches upserted: {upserted}");
    println!("Matches stored: {}", store.match_count()?);
    if !errors.is_empty() {
        println!("Errors: {}", errors.len());
        for err in errors.iter().take(8) {
            println!(" - {err}");
        }
    }
    Ok(())
}

fn parse_days_arg() -> Option<i64> {
    arg_value("--days")
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(|d| d.clamp(0, 365))
}

fn parse_db_path_arg() -> Option<PathBuf> {
    arg_value("--db").map(PathBuf::from)
}

fn arg_value(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(name).and_then(|r| r.strip_prefix('=')) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
