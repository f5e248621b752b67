//! Team form: a running momentum score fed back into score generation.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{BLOWOUT_MARGIN, FORM_BLOWOUT_BONUS, FORM_STEP};
use crate::error::SimError;
use crate::team::{ExhibitionsInput, Roster};

/// Current form per team code. Starts at 0.0 for every roster team and is
/// mutated by every decided match, exhibition or tournament alike.
pub type FormMap = HashMap<String, f64>;

/// Form of one team before and after a match, kept for reporting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormUpdate {
    pub team: String,
    pub before: f64,
    pub after: f64,
}

/// The two [`FormUpdate`]s belonging to one fixture.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchFormDelta {
    pub home: FormUpdate,
    pub away: FormUpdate,
}

/// Apply the form rule for one decided scoreline.
///
/// Winner gains [`FORM_STEP`], loser drops by the same amount; a margin of
/// [`BLOWOUT_MARGIN`] or more adds [`FORM_BLOWOUT_BONUS`] in the same
/// direction. A level scoreline moves nothing. Forfeited matches must not be
/// passed here at all.
pub fn apply_result(form: &mut FormMap, home: &str, away: &str, home_score: u32, away_score: u32) {
    let diff = home_score as i64 - away_score as i64;
    let (winner, loser) = match diff {
        d if d > 0 => (home, away),
        d if d < 0 => (away, home),
        _ => return,
    };

    let mut swing = FORM_STEP;
    if diff.unsigned_abs() >= BLOWOUT_MARGIN as u64 {
        swing += FORM_BLOWOUT_BONUS;
    }

    *form.entry(winner.to_string()).or_insert(0.0) += swing;
    *form.entry(loser.to_string()).or_insert(0.0) -= swing;
}

/// Derive the pre-tournament form of every roster team from the exhibition
/// history.
///
/// A match usually appears under both teams' lists; the canonical pair key
/// makes sure each unordered pair is processed exactly once. Unparseable
/// result strings and codes missing from the roster abort the run.
pub fn initial_form(exhibitions: &ExhibitionsInput, roster: &Roster) -> Result<FormMap, SimError> {
    let mut form: FormMap = roster.codes().map(|code| (code.clone(), 0.0)).collect();
    let mut processed: HashSet<(String, String)> = HashSet::new();

    for (team, matches) in exhibitions {
        if !roster.contains(team) {
            return Err(SimError::UnknownTeam(team.clone()));
        }
        for m in matches {
            if !roster.contains(&m.opponent) {
                return Err(SimError::UnknownTeam(m.opponent.clone()));
            }
            if !processed.insert(pair_key(team, &m.opponent)) {
                continue;
            }
            let (own, other) = parse_result(&m.result).ok_or_else(|| SimError::MalformedRecord {
                team: team.clone(),
                opponent: m.opponent.clone(),
                raw: m.result.clone(),
            })?;
            apply_result(&mut form, team, &m.opponent, own, other);
        }
    }

    debug!("derived initial form for {} teams from exhibitions", form.len());
    Ok(form)
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn parse_result(raw: &str) -> Option<(u32, u32)> {
    let (a, b) = raw.split_once('-')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::team::{GroupsInput, Roster};

    fn roster() -> Roster {
        let groups: GroupsInput = serde_json::from_str(
            r#"{
                "A": [
                    {"code": "USA", "name": "United States", "ranking": 1},
                    {"code": "SRB", "name": "Serbia", "ranking": 4},
                    {"code": "GRE", "name": "Greece", "ranking": 14},
                    {"code": "CAN", "name": "Canada", "ranking": 7}
                ]
            }"#,
        )
        .unwrap();
        Roster::from_groups(&groups)
    }

    fn exhibitions(json: &str) -> ExhibitionsInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn blowout_win_moves_form_by_015() {
        let input = exhibitions(r#"{"USA": [{"opponent": "SRB", "result": "110-90"}]}"#);
        let form = initial_form(&input, &roster()).unwrap();
        assert!((form["USA"] - 0.15).abs() < 1e-12);
        assert!((form["SRB"] + 0.15).abs() < 1e-12);
        assert_eq!(form["GRE"], 0.0);
    }

    #[test]
    fn narrow_loss_moves_form_by_01() {
        let input = exhibitions(r#"{"GRE": [{"opponent": "CAN", "result": "80-84"}]}"#);
        let form = initial_form(&input, &roster()).unwrap();
        assert!((form["GRE"] + 0.1).abs() < 1e-12);
        assert!((form["CAN"] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn reciprocal_entries_count_once() {
        let input = exhibitions(
            r#"{
                "USA": [{"opponent": "SRB", "result": "110-90"}],
                "SRB": [{"opponent": "USA", "result": "90-110"}]
            }"#,
        );
        let form = initial_form(&input, &roster()).unwrap();
        assert!((form["USA"] - 0.15).abs() < 1e-12);
        assert!((form["SRB"] + 0.15).abs() < 1e-12);
    }

    #[test]
    fn level_scoreline_moves_nothing() {
        let input = exhibitions(r#"{"USA": [{"opponent": "SRB", "result": "95-95"}]}"#);
        let form = initial_form(&input, &roster()).unwrap();
        assert_eq!(form["USA"], 0.0);
        assert_eq!(form["SRB"], 0.0);
    }

    #[test]
    fn malformed_result_aborts() {
        let input = exhibitions(r#"{"USA": [{"opponent": "SRB", "result": "95:88"}]}"#);
        let err = initial_form(&input, &roster()).unwrap_err();
        assert!(matches!(err, SimError::MalformedRecord { raw, .. } if raw == "95:88"));
    }

    #[test]
    fn unknown_opponent_aborts() {
        let input = exhibitions(r#"{"USA": [{"opponent": "FRA", "result": "95-88"}]}"#);
        assert_eq!(
            initial_form(&input, &roster()).unwrap_err(),
            SimError::UnknownTeam("FRA".to_string())
        );
    }

    #[test]
    fn independent_runs_agree() {
        let input = exhibitions(
            r#"{
                "USA": [{"opponent": "SRB", "result": "102-86"}, {"opponent": "GRE", "result": "89-91"}],
                "CAN": [{"opponent": "SRB", "result": "79-77"}]
            }"#,
        );
        let a = initial_form(&input, &roster()).unwrap();
        let b = initial_form(&input, &roster()).unwrap();
        assert_eq!(a, b);
    }
}
