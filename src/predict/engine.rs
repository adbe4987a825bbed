use serde::Serialize;

use crate::stats::elo::{self, EloTable};
use crate::stats::home_away::{HomeAwayTable, NEUTRAL_RATE};
use crate::stats::xg::{Side, TeamXg, XgTable};
use crate::upstream::clubelo::NEUTRAL_ELO;

/// Home-advantage multiplier on the home side's xG.
pub const HOME_XG_BOOST: f64 = 1.10;
/// Away-side xG multiplier.
pub const AWAY_XG_FACTOR: f64 = 0.90;
const ELO_SCALE: f64 = 400.0;
const ELO_TIE_SCALE: f64 = 100.0;

/// Which source a team's value came from. `false` means a neutral default was used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub home_away: bool,
    pub xg: bool,
    pub elo: bool,
}

impl Resolution {
    pub fn any(&self) -> bool {
        self.home_away || self.xg || self.elo
    }
}

/// One side's inputs. `win_rate` and `tie_rate` are the split that applies:
/// the home split for the home team, the away split for the away team.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInputs {
    pub name: String,
    pub win_rate: f64,
    pub tie_rate: f64,
    pub xg: f64,
    pub elo: f64,
    pub resolved: Resolution,
}

impl TeamInputs {
    /// Neutral values used when nothing is known about a team.
    pub fn neutral(name: impl Into<String>, side: Side) -> Self {
        Self {
            name: name.into(),
            win_rate: NEUTRAL_RATE,
            tie_rate: NEUTRAL_RATE,
            xg: TeamXg::fallback(side).xg,
            elo: NEUTRAL_ELO,
            resolved: Resolution::default(),
        }
    }

    pub fn from_tables(
        canonical: &str,
        side: Side,
        home_away: &HomeAwayTable,
        xg: &XgTable,
        elo: &EloTable,
    ) -> Self {
        let record = home_away.lookup(canonical);
        let (win_rate, tie_rate) = match side {
            Side::Home => (record.value.home_win_rate(), record.value.home_tie_rate()),
            Side::Away => (record.value.away_win_rate(), record.value.away_tie_rate()),
        };
        let team_xg = xg.lookup(canonical, side);
        let rating = elo.lookup(canonical);
        Self {
            name: canonical.to_string(),
            win_rate,
            tie_rate,
            xg: team_xg.value.xg,
            elo: rating.value,
            resolved: Resolution {
                home_away: record.resolved,
                xg: team_xg.resolved,
                elo: rating.resolved,
            },
        }
    }

    /// Clamps rates into [0,1], negative or non-finite xG to 0 and a
    /// non-finite Elo to neutral.
    fn sanitized(&self) -> Self {
        Self {
            name: self.name.clone(),
            win_rate: unit(self.win_rate),
            tie_rate: unit(self.tie_rate),
            xg: if self.xg.is_finite() && self.xg > 0.0 { self.xg } else { 0.0 },
            elo: elo::sanitize(self.elo),
            resolved: self.resolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupInputs {
    pub home: TeamInputs,
    pub away: TeamInputs,
}

/// One estimator's output, each value a probability in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub home: f64,
    pub away: f64,
    pub tie: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XgEstimate {
    pub adjusted_home_xg: f64,
    pub adjusted_away_xg: f64,
    #[serde(flatten)]
    pub estimate: Estimate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EloEstimate {
    pub rating_gap: f64,
    #[serde(flatten)]
    pub estimate: Estimate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionTrace {
    pub inputs: MatchupInputs,
    /// Home = home team's home win rate, away = away team's away win rate,
    /// tie = mean of the two tie rates (reported only; the draw blend uses
    /// both tie rates directly).
    pub strength: Estimate,
    pub xg: XgEstimate,
    pub elo: EloEstimate,
    /// Sum of the three percentages. Usually not 100.
    pub pct_sum: f64,
    pub renormalized: bool,
    pub notes: Vec<String>,
}

impl PredictionTrace {
    /// Human-readable rendering, one step per line.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (label, team) in [("home", &self.inputs.home), ("away", &self.inputs.away)] {
            out.push(format!(
                "{} ({label}): win rate {:.3}{}, tie rate {:.3}, xG {:.2}{}, Elo {:.1}{}",
                team.name,
                team.win_rate,
                default_marker(team.resolved.home_away),
                team.tie_rate,
                team.xg,
                default_marker(team.resolved.xg),
                team.elo,
                default_marker(team.resolved.elo),
            ));
        }
        out.push(format!(
            "strength: home {:.4}, away {:.4}, tie {:.4}",
            self.strength.home, self.strength.away, self.strength.tie
        ));
        out.push(format!(
            "xG: adjusted {:.2} vs {:.2}, home {:.4}, away {:.4}, tie {:.4}",
            self.xg.adjusted_home_xg,
            self.xg.adjusted_away_xg,
            self.xg.estimate.home,
            self.xg.estimate.away,
            self.xg.estimate.tie
        ));
        out.push(format!(
            "Elo: gap {:+.1}, home {:.4}, away {:.4}, tie {:.4}",
            self.elo.rating_gap, self.elo.estimate.home, self.elo.estimate.away, self.elo.estimate.tie
        ));
        out.push(format!("sum {:.2}% (not renormalized)", self.pct_sum));
        out.extend(self.notes.iter().map(|n| format!("note: {n}")));
        out
    }
}

fn default_marker(resolved: bool) -> &'static str {
    if resolved { "" } else { " (default)" }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub home_win_pct: f64,
    pub draw_pct: f64,
    pub away_win_pct: f64,
    pub trace: PredictionTrace,
}

/// Blends the strength, xG and Elo estimators.
///
/// Home and away percentages average three signals; the draw percentage
/// averages four (xG tie, Elo tie and both tie rates). The three are not
/// rescaled to sum to 100; `trace.pct_sum` carries the actual sum.
pub fn predict(inputs: &MatchupInputs) -> PredictionResult {
    predict_with_notes(inputs, Vec::new())
}

pub fn predict_with_notes(inputs: &MatchupInputs, mut notes: Vec<String>) -> PredictionResult {
    let home = inputs.home.sanitized();
    let away = inputs.away.sanitized();

    let strength = strength_estimate(&home, &away);
    let xg = xg_estimate(home.xg, away.xg);
    let elo = elo_estimate(home.elo, away.elo);

    let home_win_pct = pct(mean(&[strength.home, xg.estimate.home, elo.estimate.home]));
    let away_win_pct = pct(mean(&[strength.away, xg.estimate.away, elo.estimate.away]));
    let draw_pct = pct(mean(&[
        xg.estimate.tie,
        elo.estimate.tie,
        home.tie_rate,
        away.tie_rate,
    ]));
    let pct_sum = home_win_pct + draw_pct + away_win_pct;

    for (label, team) in [("home", &home), ("away", &away)] {
        if !team.resolved.home_away {
            notes.push(format!(
                "{label} team {} has no match history; rates default to 0.5",
                team.name
            ));
        }
        if !team.resolved.xg {
            notes.push(format!("{label} team {} has no xG row; fallback xG used", team.name));
        }
        if !team.resolved.elo {
            notes.push(format!("{label} team {} has no Elo rating; 1500 used", team.name));
        }
    }

    PredictionResult {
        home_win_pct,
        draw_pct,
        away_win_pct,
        trace: PredictionTrace {
            inputs: MatchupInputs { home, away },
            strength,
            xg,
            elo,
            pct_sum,
            renormalized: false,
            notes,
        },
    }
}

pub fn strength_estimate(home: &TeamInputs, away: &TeamInputs) -> Estimate {
    Estimate {
        home: home.win_rate,
        away: away.win_rate,
        tie: (home.tie_rate + away.tie_rate) / 2.0,
    }
}

/// The tie term grows with the xG gap, which reads backwards for a
/// "closeness" heuristic; it is kept as-is so outputs stay comparable.
pub fn xg_estimate(home_xg: f64, away_xg: f64) -> XgEstimate {
    let adj_home = home_xg * HOME_XG_BOOST;
    let adj_away = away_xg * AWAY_XG_FACTOR;
    let total = adj_home + adj_away;
    let estimate = if total > 0.0 {
        let home = adj_home / total;
        Estimate {
            home,
            away: 1.0 - home,
            tie: (adj_home - adj_away).abs() / total,
        }
    } else {
        Estimate {
            home: 0.5,
            away: 0.5,
            tie: 0.0,
        }
    };
    XgEstimate {
        adjusted_home_xg: adj_home,
        adjusted_away_xg: adj_away,
        estimate,
    }
}

pub fn elo_estimate(home_elo: f64, away_elo: f64) -> EloEstimate {
    let home = 1.0 / (1.0 + 10f64.powf((away_elo - home_elo) / ELO_SCALE));
    let gap = home_elo - away_elo;
    EloEstimate {
        rating_gap: gap,
        estimate: Estimate {
            home,
            away: 1.0 - home,
            tie: 1.0 / (1.0 + gap.abs() / ELO_TIE_SCALE),
        },
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn pct(p: f64) -> f64 {
    (p * 100.0).clamp(0.0, 100.0)
}

fn unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { NEUTRAL_RATE }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(name: &str, win: f64, tie: f64, xg: f64, elo: f64) -> TeamInputs {
        TeamInputs {
            name: name.to_string(),
            win_rate: win,
            tie_rate: tie,
            xg,
            elo,
            resolved: Resolution {
                home_away: true,
                xg: true,
                elo: true,
            },
        }
    }

    #[test]
    fn elo_estimator_is_logistic() {
        let e = elo_estimate(1900.0, 1850.0);
        assert!((e.estimate.home - 0.571_463).abs() < 1e-6);
        assert!((e.estimate.tie - 2.0 / 3.0).abs() < 1e-12);

        let even = elo_estimate(1500.0, 1500.0);
        assert_eq!(even.estimate.home, 0.5);
        assert_eq!(even.estimate.tie, 1.0);
    }

    #[test]
    fn xg_estimator_zero_total() {
        let e = xg_estimate(0.0, 0.0);
        assert_eq!(e.estimate.home, 0.5);
        assert_eq!(e.estimate.away, 0.5);
        assert_eq!(e.estimate.tie, 0.0);
    }

    #[test]
    fn garbage_inputs_are_sanitized() {
        let inputs = MatchupInputs {
            home: team("A", 1.7, f64::NAN, -3.0, f64::NAN),
            away: team("B", -0.2, 0.1, f64::INFINITY, 1500.0),
        };
        let r = predict(&inputs);
        for v in [r.home_win_pct, r.draw_pct, r.away_win_pct] {
            assert!(v.is_finite() && (0.0..=100.0).contains(&v), "{v}");
        }
        assert_eq!(r.trace.inputs.home.elo, 1500.0);
        assert_eq!(r.trace.inputs.home.win_rate, 1.0);
        assert_eq!(r.trace.inputs.away.win_rate, 0.0);
    }

    #[test]
    fn unresolved_inputs_are_noted() {
        let mut home = TeamInputs::neutral("Ghosts", Side::Home);
        home.resolved.elo = true;
        let away = TeamInputs::neutral("Phantoms", Side::Away);
        let r = predict(&MatchupInputs { home, away });
        assert_eq!(r.trace.notes.len(), 5);
        assert!(r.trace.lines().iter().any(|l| l.contains("(default)")));
    }

    #[test]
    fn result_serializes_camel_case() {
        let inputs = MatchupInputs {
            home: team("A", 0.5, 0.2, 1.5, 1600.0),
            away: team("B", 0.3, 0.3, 1.1, 1550.0),
        };
        let json = serde_json::to_value(predict(&inputs)).expect("json");
        assert!(json.get("homeWinPct").is_some());
        assert!(json.get("drawPct").is_some());
        assert!(json["trace"]["xg"].get("adjustedHomeXg").is_some());
        assert_eq!(json["trace"]["renormalized"], false);
    }
}
