//! Per-match score generation and outcome classification.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::form::FormMap;
use crate::team::Team;
use crate::tournament::SimConfig;

/// How a match ended, seen from the first-named team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Win,
    Loss,
    Forfeit,
}

/// An immutable record of one played match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home: String,
    pub away: String,
    /// Final rounded scores; `None` when the match was forfeited (the table
    /// treats it as 0-0)
    pub score: Option<(u32, u32)>,
    pub outcome: MatchOutcome,
    /// The side that conceded, on a forfeit
    pub forfeited_by: Option<String>,
}

impl MatchRecord {
    /// Code of the side that takes the win.
    pub fn winner(&self) -> &str {
        match self.outcome {
            MatchOutcome::Win => &self.home,
            MatchOutcome::Loss => &self.away,
            MatchOutcome::Forfeit => {
                if self.forfeited_by.as_deref() == Some(self.home.as_str()) {
                    &self.away
                } else {
                    &self.home
                }
            }
        }
    }

    /// Code of the side that takes the loss.
    pub fn loser(&self) -> &str {
        if self.winner() == self.home {
            &self.away
        } else {
            &self.home
        }
    }
}

/// Generate a clamped integer score pair for one match.
///
/// Each side's base score is `(80 + (20 - (ranking - form))) * (1 + U(0, 0.1))`,
/// then `U(-5, 5)` spread is added and the ranking gap
/// `ranking(away) - ranking(home)` is subtracted from BOTH sides, sign
/// unadjusted. Draw order is fixed (home base, away base, home spread, away
/// spread) so a seeded run replays exactly.
pub fn simulate_score<R: Rng>(
    home: &Team,
    away: &Team,
    form: &FormMap,
    config: &SimConfig,
    rng: &mut R,
) -> (u32, u32) {
    let home_form = form.get(&home.code).copied().unwrap_or(0.0);
    let away_form = form.get(&away.code).copied().unwrap_or(0.0);
    let ranking_gap = away.ranking as f64 - home.ranking as f64;

    let home_base =
        (80.0 + (20.0 - (home.ranking as f64 - home_form))) * (1.0 + rng.gen_range(0.0..0.1));
    let away_base =
        (80.0 + (20.0 - (away.ranking as f64 - away_form))) * (1.0 + rng.gen_range(0.0..0.1));

    let home_raw = home_base + rng.gen_range(-5.0..5.0) - ranking_gap;
    let away_raw = away_base + rng.gen_range(-5.0..5.0) - ranking_gap;

    (clamp_score(home_raw, config), clamp_score(away_raw, config))
}

fn clamp_score(raw: f64, config: &SimConfig) -> u32 {
    raw.round()
        .clamp(config.min_score as f64, config.max_score as f64) as u32
}

/// Classify a simulated scoreline into win/loss/forfeit.
///
/// The forfeit draw comes first and ignores the scores entirely; the
/// conceding side is then drawn uniformly. Equal scores resolve in the
/// first-named team's favour.
pub fn classify<R: Rng>(
    home: &str,
    away: &str,
    home_score: u32,
    away_score: u32,
    config: &SimConfig,
    rng: &mut R,
) -> (MatchOutcome, Option<String>) {
    if rng.gen::<f64>() < config.forfeit_prob {
        let forfeiter = if rng.gen::<f64>() < 0.5 { home } else { away };
        return (MatchOutcome::Forfeit, Some(forfeiter.to_string()));
    }

    if home_score > away_score {
        (MatchOutcome::Win, None)
    } else if home_score < away_score {
        (MatchOutcome::Loss, None)
    } else {
        (MatchOutcome::Win, None)
    }
}

/// Simulate and classify one match.
///
/// Returns the record plus the underlying simulated scores, which stay
/// relevant even on a forfeit (the record zeroes them, the caller may not).
pub fn play_match<R: Rng>(
    home: &Team,
    away: &Team,
    form: &FormMap,
    config: &SimConfig,
    rng: &mut R,
) -> (MatchRecord, (u32, u32)) {
    let (home_score, away_score) = simulate_score(home, away, form, config, rng);
    let (outcome, forfeited_by) = classify(
        &home.code,
        &away.code,
        home_score,
        away_score,
        config,
        rng,
    );

    let score = match outcome {
        MatchOutcome::Forfeit => None,
        _ => Some((home_score, away_score)),
    };

    let record = MatchRecord {
        home: home.code.clone(),
        away: away.code.clone(),
        score,
        outcome,
        forfeited_by,
    };
    (record, (home_score, away_score))
}
