use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use footy_predict::config::Config;
use footy_predict::error::{ErrorBody, FetchError};
use footy_predict::logging;
use footy_predict::predict::PredictionResponse;
use footy_predict::service::{FootyService, PredictionRequest};
use footy_predict::upstream::League;

const USAGE: &str = "usage: footy_predict <command> [flags]

commands:
  predict   --home <team> --away <team> --league <code> [--season <year>] [--date <YYYY-MM-DD>] [--trace]
  quick     --home <team> --away <team> --league <code> [--season <year>]
  fixtures  [--date <YYYY-MM-DD>]
  standings --league <code> [--season <year>] [--teams <id,id,...>]
  teams     --league <code> [--season <year>] [--team <id>]
  transfers
  leagues
  news      [--category <name>]
  article   --url <url>";

fn main() -> Result<()> {
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    if matches!(command, "-h" | "--help" | "help") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = Config::from_env();
    debug!(season = %config.season, store = config.store_enabled, "config loaded");
    let service = FootyService::from_config(&config)?;
    let flags = &args[1..];

    match command {
        "predict" => {
            let request = PredictionRequest {
                home_team: flag_value(flags, "--home").unwrap_or_default(),
                away_team: flag_value(flags, "--away").unwrap_or_default(),
                league: flag_value(flags, "--league"),
                season: flag_value(flags, "--season"),
                date: parse_date_flag(flags)?,
            };
            let result = service.predict(&request);
            if has_flag(flags, "--trace")
                && let Ok(r) = &result
            {
                for line in r.trace.lines() {
                    eprintln!("{line}");
                }
            }
            let failed = result.is_err();
            print_json(&PredictionResponse::from(result))?;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        "quick" => {
            let league = league_flag(flags)?;
            let home = flag_value(flags, "--home").unwrap_or_default();
            let away = flag_value(flags, "--away").unwrap_or_default();
            let season = flag_value(flags, "--season");
            emit(service.quick_predict(&home, &away, league, season.as_deref()))
        }
        "fixtures" => emit(service.fixtures(parse_date_flag(flags)?)),
        "standings" => {
            let league = league_flag(flags)?;
            let season = flag_value(flags, "--season").unwrap_or_else(|| config.season.clone());
            match flag_value(flags, "--teams") {
                Some(raw) => {
                    let ids = parse_team_ids(&raw)?;
                    emit(service.standings_for_teams(league, &season, &ids))
                }
                None => emit(service.standings(league, &season)),
            }
        }
        "teams" => {
            let league = league_flag(flags)?;
            let season = flag_value(flags, "--season").unwrap_or_else(|| config.season.clone());
            match flag_value(flags, "--team") {
                Some(raw) => {
                    let team_id = parse_team_id(&raw)?;
                    emit(service.team_matches(team_id, &season))
                }
                None => emit(service.competition_teams(league, &season)),
            }
        }
        "transfers" => emit(service.transfers()),
        "leagues" => emit(service.competitions()),
        "news" => emit(service.news(flag_value(flags, "--category").as_deref())),
        "article" => {
            let url = flag_value(flags, "--url").unwrap_or_default();
            emit(service.article(&url))
        }
        other => {
            eprintln!("unknown command: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    }
}

/// Prints the value, or the error object and exits non-zero.
fn emit<T: Serialize>(result: Result<T, FetchError>) -> Result<()> {
    match result {
        Ok(value) => print_json(&value),
        Err(err) => {
            print_json(&ErrorBody::from(&err))?;
            std::process::exit(1);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn league_flag(flags: &[String]) -> Result<League> {
    let raw = flag_value(flags, "--league").ok_or_else(|| anyhow!("--league is required"))?;
    League::parse(&raw).ok_or_else(|| anyhow!("unknown league: {raw} (use PL, PD, SA, BL1 or FL1)"))
}

fn parse_date_flag(flags: &[String]) -> Result<Option<NaiveDate>> {
    let Some(raw) = flag_value(flags, "--date") else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --date {raw}, expected YYYY-MM-DD"))?;
    Ok(Some(date))
}

fn parse_team_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .with_context(|| format!("invalid team id {raw}"))
}

fn parse_team_ids(raw: &str) -> Result<Vec<u64>> {
    let mut ids = Vec::new();
    for part in raw.split(',') {
        if part.trim().is_empty() {
            continue;
        }
        ids.push(parse_team_id(part)?);
    }
    Ok(ids)
}

fn has_flag(flags: &[String], name: &str) -> bool {
    flags.iter().any(|f| f == name)
}

/// Accepts both `--name value` and `--name=value`.
fn flag_value(flags: &[String], name: &str) -> Option<String> {
    for (idx, arg) in flags.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(name).and_then(|r| r.strip_prefix('=')) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = flags.get(idx + 1)
            && !next.trim().is_empty()
            && !next.starts_with("--")
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
