use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use footy_predict::error::FetchError;
use footy_predict::predict::PredictionResponse;
use footy_predict::predict::engine::{
    MatchupInputs, Resolution, TeamInputs, elo_estimate, predict, xg_estimate,
};
use footy_predict::stats::xg::Side;

fn resolved() -> Resolution {
    Resolution {
        home_away: true,
        xg: true,
        elo: true,
    }
}

fn city_vs_liverpool() -> MatchupInputs {
    MatchupInputs {
        home: TeamInputs {
            name: "Man City".to_string(),
            win_rate: 0.6,
            tie_rate: 0.2,
            xg: 2.1,
            elo: 1900.0,
            resolved: resolved(),
        },
        away: TeamInputs {
            name: "Liverpool".to_string(),
            win_rate: 0.4,
            tie_rate: 0.25,
            xg: 1.8,
            elo: 1850.0,
            resolved: resolved(),
        },
    }
}

fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

#[test]
fn city_liverpool_arithmetic_chain() {
    let elo = elo_estimate(1900.0, 1850.0);
    assert!(close(elo.estimate.home, 0.5715, 1e-4));

    let xg = xg_estimate(2.1, 1.8);
    assert!(close(xg.adjusted_home_xg, 2.31, 1e-12));
    assert!(close(xg.adjusted_away_xg, 1.62, 1e-12));
    assert!(close(xg.estimate.home, 0.5878, 1e-4));

    let r = predict(&city_vs_liverpool());
    assert!(close(r.trace.strength.home, 0.6, 1e-12));
    assert!(close(r.home_win_pct, 58.64, 0.01), "{}", r.home_win_pct);
    assert!(close(r.away_win_pct, 41.36, 0.01), "{}", r.away_win_pct);
    assert!(close(r.draw_pct, 32.31, 0.01), "{}", r.draw_pct);
}

// Home and away average three signals while draw averages four, so the
// total overshoots 100. The trace reports it instead of rescaling.
#[test]
fn percentages_are_not_renormalized() {
    let r = predict(&city_vs_liverpool());
    assert!(close(r.trace.pct_sum, 132.31, 0.01), "{}", r.trace.pct_sum);
    assert!(!r.trace.renormalized);
    assert!(
        r.trace
            .lines()
            .iter()
            .any(|l| l.contains("132.31") && l.contains("not renormalized"))
    );
}

#[test]
fn neutral_defaults_give_even_split() {
    let r = predict(&MatchupInputs {
        home: TeamInputs {
            xg: 1.0,
            ..TeamInputs::neutral("A", Side::Home)
        },
        away: TeamInputs {
            xg: 1.0,
            ..TeamInputs::neutral("B", Side::Away)
        },
    });
    // xG still carries the 1.10 / 0.90 home adjustment.
    assert!(close(r.trace.xg.estimate.home, 0.55, 1e-12));
    assert!(close(r.trace.elo.estimate.home, 0.5, 1e-12));
    assert!(close(r.home_win_pct, (0.5 + 0.55 + 0.5) / 3.0 * 100.0, 1e-9));
}

#[test]
fn random_inputs_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(0x5eed_2024);
    let mut sums = Vec::new();
    for _ in 0..2_000 {
        let team = |rng: &mut StdRng, name: &str| TeamInputs {
            name: name.to_string(),
            win_rate: rng.gen_range(0.0..=1.0),
            tie_rate: rng.gen_range(0.0..=1.0),
            xg: rng.gen_range(0.0..4.0),
            elo: rng.gen_range(1000.0..2200.0),
            resolved: resolved(),
        };
        let inputs = MatchupInputs {
            home: team(&mut rng, "H"),
            away: team(&mut rng, "A"),
        };
        let r = predict(&inputs);
        for pct in [r.home_win_pct, r.draw_pct, r.away_win_pct] {
            assert!((0.0..=100.0).contains(&pct), "{pct} out of range for {inputs:?}");
        }
        sums.push(r.trace.pct_sum);
    }
    let min = sums.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    eprintln!("observed pct sum range: {min:.2} ..= {max:.2}");
    // home + away lies in [200/3, 400/3] and draw in [0, 100].
    assert!(min >= 200.0 / 3.0 - 1e-9);
    assert!(max <= 700.0 / 3.0 + 1e-9);
}

#[test]
fn response_serializes_either_result_or_error() {
    let ok = PredictionResponse::from(Ok(predict(&city_vs_liverpool())));
    let json = serde_json::to_value(&ok).expect("json");
    assert!(json.get("homeWinPct").is_some());
    assert!(json.get("error").is_none());

    let err = PredictionResponse::from(Err(FetchError::MissingInput("league".to_string())));
    let json = serde_json::to_value(&err).expect("json");
    assert_eq!(json["error"], "missing input: league");
    assert!(json.get("homeWinPct").is_none());
}
