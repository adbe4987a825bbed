use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};

use footy_predict::clubs::ClubResolver;
use footy_predict::stats::elo::EloTable;
use footy_predict::stats::xg::{Side, XgTable};
use footy_predict::upstream::League;
use footy_predict::upstream::article::extract_article_text;
use footy_predict::upstream::clubelo::{NEUTRAL_ELO, parse_ratings_csv};
use footy_predict::upstream::fbref::parse_league_table;
use footy_predict::upstream::football_data::{
    parse_competitions_json, parse_matches_json, parse_standings_json, parse_teams_json,
    parse_transfers_json,
};
use footy_predict::upstream::news::parse_news_json;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_clubelo_fixture() {
    let raw = read_fixture("clubelo.csv");
    let as_of = NaiveDate::from_ymd_opt(2024, 10, 18).expect("date");
    let rows = parse_ratings_csv(&raw, as_of, Utc::now()).expect("fixture should parse");
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0].club, "Man City");
    assert_eq!(rows[0].rank, Some(1));
    assert_eq!(rows[0].rating, 2042.68);
    assert_eq!(rows[4].rank, None);
    assert_eq!(rows[5].club, "Brighton");
    assert_eq!(rows[5].rating, NEUTRAL_ELO);
    assert_eq!(rows[0].valid_to, NaiveDate::from_ymd_opt(2024, 10, 19).expect("date"));
}

#[test]
fn elo_table_joins_football_data_names() {
    let raw = read_fixture("clubelo.csv");
    let as_of = NaiveDate::from_ymd_opt(2024, 10, 18).expect("date");
    let rows = parse_ratings_csv(&raw, as_of, Utc::now()).expect("fixture should parse");
    let resolver = ClubResolver::default();
    let table = EloTable::from_entries(&rows, &resolver);

    let city = table.lookup(resolver.canonical("Manchester City FC"));
    assert!(city.resolved);
    assert_eq!(city.value, 2042.68);
    let forest = table.lookup(resolver.canonical("Nottingham Forest FC"));
    assert_eq!(forest.value, 1781.02);
    assert_eq!(table.club("Arsenal").map(|c| c.level), Some(1));
}

#[test]
fn parses_fbref_fixture() {
    let raw = read_fixture("fbref_premier_league.html");
    let rows =
        parse_league_table(&raw, League::PremierLeague, Utc::now()).expect("fixture should parse");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1].squad, "Manchester City");
    assert_eq!(rows[1].xg, 16.1);
    assert_eq!(rows[2].xga, 0.0);
    assert_eq!(rows[3].rank, Some(4));
    assert!(rows.iter().all(|r| r.league == "Premier League"));

    let table = XgTable::from_entries(&rows, &ClubResolver::default());
    assert!(table.lookup("Man City", Side::Home).resolved);
    assert!(table.lookup("Man United", Side::Away).resolved);
    assert!(table.lookup("Forest", Side::Home).resolved);
}

#[test]
fn parses_football_data_matches_fixture() {
    let raw = read_fixture("football_data_matches.json");
    let rows = parse_matches_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].home_team, "Manchester United FC");
    assert_eq!(rows[0].final_score(), Some((1, 0)));
    assert_eq!(rows[0].competition_code.as_deref(), Some("PL"));
    assert_eq!(rows.iter().filter(|m| m.is_completed()).count(), 4);
    assert!(!rows[4].is_completed());
}

#[test]
fn parses_standings_total_table() {
    let raw = read_fixture("football_data_standings.json");
    let rows = parse_standings_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].team_name, "Liverpool FC");
    assert_eq!(rows[0].points, 22);
    assert_eq!(rows[1].form.as_deref(), Some("W,D,W,W,W"));
    assert_eq!(rows[2].goal_difference, -11);
}

#[test]
fn competitions_are_limited_to_big_five() {
    let raw = read_fixture("football_data_competitions.json");
    let rows = parse_competitions_json(&raw).expect("fixture should parse");
    let codes = rows.iter().map(|c| c.code.as_str()).collect::<Vec<_>>();
    assert_eq!(codes, ["PL", "PD"]);
}

#[test]
fn parses_competition_teams_fixture() {
    let raw = read_fixture("football_data_teams.json");
    let rows = parse_teams_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].id, 64);
    assert_eq!(rows[1].short_name.as_deref(), Some("Liverpool"));
    assert_eq!(rows[0].venue.as_deref(), Some("Emirates Stadium"));
    assert_eq!(rows[2].venue, None);
}

#[test]
fn parses_transfers_fixture() {
    let raw = read_fixture("football_data_transfers.json");
    let rows = parse_transfers_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].player, "Riccardo Calafiori");
    assert_eq!(rows[0].to, "Arsenal FC");
    assert_eq!(rows[1].transfer_fee.as_deref(), Some("Transfer"));
    assert_eq!(rows[1].player_image, None);
}

#[test]
fn news_is_sorted_newest_first_with_content_blanked() {
    let raw = read_fixture("newsapi.json");
    let rows = parse_news_json(&raw).expect("fixture should parse");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].source_name.as_deref(), Some("Siamsport"));
    assert!(rows[0].published_at > rows[1].published_at);
    assert!(rows.iter().all(|a| a.content.is_empty()));
}

#[test]
fn empty_news_result_is_not_an_error() {
    let rows = parse_news_json(r#"{"status":"ok","totalResults":0,"articles":[]}"#)
        .expect("empty set should parse");
    assert!(rows.is_empty());
}

#[test]
fn article_paragraphs_are_extracted() {
    let raw = read_fixture("article.html");
    let text = extract_article_text(&raw, "https://example.com/report");
    assert_eq!(
        text,
        "Liverpool and Manchester City shared the points on Saturday.\n\n\
         Both sides hit the woodwork in a tense second half."
    );
}
