use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::warn;

use footy_predict::config::Config;
use footy_predict::http_client::build_client;
use footy_predict::logging;
use footy_predict::retry::{ThreadSleeper, with_rate_limit_retry};
use footy_predict::store::Store;
use footy_predict::upstream::{League, fbref};

fn main() -> Result<()> {
    logging::init();
    let config = Config::from_env();
    let leagues = parse_leagues_arg()?.unwrap_or_else(|| League::ALL.to_vec());
    let db_path = parse_db_path_arg()
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")?;

    let client = build_client(config.http_timeout)?;
    let mut store = Store::open(&db_path)?;

    println!("DB: {}", db_path.display());
    let mut failed = 0usize;
    for league in &leagues {
        let scraped = with_rate_limit_retry(config.retry, &ThreadSleeper, || {
            fbref::fetch_league_table(&client, *league)
        });
        match scraped {
            Ok(rows) => {
                let n = store.replace_xg_league(league.name(), &rows)?;
                println!("{}: {n} squads", league.name());
            }
            Err(err) => {
                failed += 1;
                warn!(league = league.name(), error = %err, "xg scrape failed");
                println!("{}: failed ({err})", league.name());
            }
        }
    }
    if failed == leagues.len() {
        return Err(anyhow!("every league scrape failed"));
    }
    Ok(())
}

fn parse_leagues_arg() -> Result<Option<Vec<League>>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut raw = None;
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix("--leagues=") {
            raw = Some(value.to_string());
        } else if arg == "--leagues"
            && let Some(next) = args.get(idx + 1)
        {
            raw = Some(next.clone());
        }
    }
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut out = Vec::new();
    for code in raw.split([',', ' ']).map(str::trim).filter(|c| !c.is_empty()) {
        let league = League::parse(code).ok_or_else(|| anyhow!("unknown league: {code}"))?;
        if !out.contains(&league) {
            out.push(league);
        }
    }
    if out.is_empty() {
        return Ok(None);
    }
    Ok(Some(out))
}

fn parse_db_path_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
