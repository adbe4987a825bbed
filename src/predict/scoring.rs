//! Standings-based quick predictor: a points score from table position,
//! recent form and goal record, mapped onto integer percentages.

use serde::{Deserialize, Serialize};

use crate::upstream::football_data::StandingRow;

const HOME_ADVANTAGE: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringInputs {
    pub home_rank: i64,
    pub away_rank: i64,
    pub home_goals_scored: i64,
    pub away_goals_scored: i64,
    pub home_goals_conceded: i64,
    pub away_goals_conceded: i64,
    /// Points over the recent-form window; zero when unknown.
    #[serde(default)]
    pub home_form: i64,
    #[serde(default)]
    pub away_form: i64,
}

impl ScoringInputs {
    /// Form counts only when both rows carry a readable form string.
    pub fn from_standings(home: &StandingRow, away: &StandingRow) -> Self {
        let (home_form, away_form) = match (form_points(home), form_points(away)) {
            (Some(h), Some(a)) => (h, a),
            _ => (0, 0),
        };
        Self {
            home_rank: i64::from(home.position),
            away_rank: i64::from(away.position),
            home_goals_scored: i64::from(home.goals_for),
            away_goals_scored: i64::from(away.goals_for),
            home_goals_conceded: i64::from(home.goals_against),
            away_goals_conceded: i64::from(away.goals_against),
            home_form,
            away_form,
        }
    }

    /// Home advantage, plus how far the away side sits below the home side,
    /// plus the form gap, plus the goal-record gap in both directions.
    pub fn score(&self) -> i64 {
        let rank_difference = self.away_rank - self.home_rank;
        let form_score = self.home_form - self.away_form;
        let goal_score = (self.home_goals_scored - self.away_goals_scored)
            + (self.away_goals_conceded - self.home_goals_conceded);
        HOME_ADVANTAGE + rank_difference + form_score + goal_score
    }
}

/// League points earned over a `W,D,L` form string (3 / 1 / 0).
pub fn form_points(row: &StandingRow) -> Option<i64> {
    let form = row.form.as_deref()?.trim();
    if form.is_empty() {
        return None;
    }
    let mut points = 0;
    for result in form.split(',') {
        match result.trim() {
            "W" => points += 3,
            "D" => points += 1,
            "L" => {}
            _ => return None,
        }
    }
    Some(points)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickPrediction {
    pub home_win: u32,
    pub draw: u32,
    pub away_win: u32,
}

pub fn quick_predict(inputs: &ScoringInputs) -> QuickPrediction {
    let s = inputs.score() as f64;
    let home = (50.0 + s).max(0.0);
    // Clamped at zero, unlike the unclamped web predictor: a negative draw
    // weight would push the other two shares above 100.
    let draw = (25.0 - s.abs() / 2.0).max(0.0);
    let away = (50.0 - s).max(0.0);
    let total = home + draw + away;

    let share = |v: f64| ((v / total) * 100.0).round() as u32;
    QuickPrediction {
        home_win: share(home),
        draw: share(draw),
        away_win: share(away),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(home_rank: i64, away_rank: i64) -> ScoringInputs {
        ScoringInputs {
            home_rank,
            away_rank,
            home_goals_scored: 20,
            away_goals_scored: 20,
            home_goals_conceded: 10,
            away_goals_conceded: 10,
            home_form: 0,
            away_form: 0,
        }
    }

    fn row(position: u32, form: Option<&str>) -> StandingRow {
        StandingRow {
            position,
            team_id: u64::from(position),
            team_name: format!("Team {position}"),
            played_games: 5,
            won: 0,
            draw: 0,
            lost: 0,
            points: 0,
            goals_for: 8,
            goals_against: 8,
            goal_difference: 0,
            form: form.map(str::to_string),
        }
    }

    #[test]
    fn level_teams_get_home_advantage_only() {
        let p = quick_predict(&inputs(5, 5));
        // s = 5: 55 / 22.5 / 45 over 122.5
        assert_eq!(p, QuickPrediction { home_win: 45, draw: 18, away_win: 37 });
    }

    #[test]
    fn lopsided_score_clamps_draw_and_away() {
        let mut i = inputs(1, 20);
        i.home_goals_scored = 60;
        let p = quick_predict(&i);
        assert_eq!(i.score(), 64);
        assert_eq!(p, QuickPrediction { home_win: 100, draw: 0, away_win: 0 });
    }

    #[test]
    fn form_gap_moves_the_score() {
        let home = row(4, Some("W,W,W,D,L"));
        let away = row(4, Some("L,L,D,W,L"));
        assert_eq!(form_points(&home), Some(10));
        assert_eq!(form_points(&away), Some(4));

        let i = ScoringInputs::from_standings(&home, &away);
        assert_eq!((i.home_form, i.away_form), (10, 4));
        // 5 + 0 rank + 6 form + 0 goals
        assert_eq!(i.score(), 11);
    }

    #[test]
    fn form_is_ignored_unless_both_sides_have_it() {
        let home = row(4, Some("W,W,W,W,W"));
        let away = row(4, None);
        let i = ScoringInputs::from_standings(&home, &away);
        assert_eq!((i.home_form, i.away_form), (0, 0));
        assert_eq!(i.score(), 5);
        assert_eq!(form_points(&row(1, Some("W,?,D"))), None);
    }
}
