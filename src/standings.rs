//! Round-robin scheduling, the points table, and in-group ranking.

use std::cmp::Ordering;
use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{POINTS_FORFEIT_LOSS, POINTS_LOSS, POINTS_WIN};
use crate::error::SimError;
use crate::form::{self, FormMap, FormUpdate, MatchFormDelta};
use crate::score::{self, MatchOutcome, MatchRecord};
use crate::team::Team;
use crate::tournament::SimConfig;

/// Accumulated group-stage statistics of one team.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    /// Signed sum of rounded score margins, winner positive
    pub score_diff: i32,
    pub scored: u32,
    pub received: u32,
}

/// Points table keyed by team code, shared by all groups.
pub type PointsTable = HashMap<String, TableEntry>;

/// Zeroed entries for every given team.
pub fn init_table<'a, I: IntoIterator<Item = &'a String>>(codes: I) -> PointsTable {
    codes
        .into_iter()
        .map(|code| (code.clone(), TableEntry::default()))
        .collect()
}

/// All pairings of one group, circle method: position 0 stays fixed, the
/// rest rotate by one place per round. `n - 1` rounds of `n / 2` matches,
/// every unordered pair exactly once.
pub fn round_robin_rounds(codes: &[String]) -> Vec<Vec<(String, String)>> {
    let n = codes.len();
    let mut order: Vec<String> = codes.to_vec();
    let mut rounds = Vec::with_capacity(n.saturating_sub(1));

    for _ in 0..n.saturating_sub(1) {
        let pairs: Vec<(String, String)> = (0..n / 2)
            .map(|i| (order[i].clone(), order[n - 1 - i].clone()))
            .collect();
        rounds.push(pairs);

        if let Some(last) = order.pop() {
            order.insert(1, last);
        }
    }
    rounds
}

/// Fixtures and form deltas of one completed group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupPlayed {
    /// `fixtures[round]` holds that round's match records
    pub fixtures: Vec<Vec<MatchRecord>>,
    /// One entry per match, in play order across all rounds
    pub form_deltas: Vec<MatchFormDelta>,
}

/// Simulate one group's full round-robin, mutating the shared form map and
/// points table match by match.
pub fn play_group<R: Rng>(
    label: &str,
    members: &[Team],
    form: &mut FormMap,
    table: &mut PointsTable,
    config: &SimConfig,
    rng: &mut R,
) -> Result<GroupPlayed, SimError> {
    if members.is_empty() || members.len() % 2 != 0 {
        return Err(SimError::UnevenGroup {
            label: label.to_string(),
            size: members.len(),
        });
    }

    let by_code: HashMap<&str, &Team> =
        members.iter().map(|t| (t.code.as_str(), t)).collect();
    let codes: Vec<String> = members.iter().map(|t| t.code.clone()).collect();

    let mut fixtures = Vec::new();
    let mut form_deltas = Vec::new();

    for round in round_robin_rounds(&codes) {
        let mut round_records = Vec::with_capacity(round.len());
        for (home_code, away_code) in round {
            let home = by_code[home_code.as_str()];
            let away = by_code[away_code.as_str()];

            let (record, raw) = score::play_match(home, away, form, config, rng);
            update_table(table, &record);

            let home_before = form.get(&record.home).copied().unwrap_or(0.0);
            let away_before = form.get(&record.away).copied().unwrap_or(0.0);
            if record.outcome != MatchOutcome::Forfeit {
                form::apply_result(form, &record.home, &record.away, raw.0, raw.1);
            }
            form_deltas.push(MatchFormDelta {
                home: FormUpdate {
                    team: record.home.clone(),
                    before: home_before,
                    after: form.get(&record.home).copied().unwrap_or(0.0),
                },
                away: FormUpdate {
                    team: record.away.clone(),
                    before: away_before,
                    after: form.get(&record.away).copied().unwrap_or(0.0),
                },
            });

            round_records.push(record);
        }
        fixtures.push(round_records);
    }

    Ok(GroupPlayed {
        fixtures,
        form_deltas,
    })
}

/// Book one match into the table: scored/received totals, the signed margin,
/// win/loss counters and points. A forfeit contributes a 0-0 scoreline, two
/// points to the surviving side and none to the conceding one.
pub fn update_table(table: &mut PointsTable, record: &MatchRecord) {
    let (home_score, away_score) = record.score.unwrap_or((0, 0));
    let margin = home_score as i32 - away_score as i32;

    {
        let home = table.entry(record.home.clone()).or_default();
        home.scored += home_score;
        home.received += away_score;
        home.score_diff += margin;
    }
    {
        let away = table.entry(record.away.clone()).or_default();
        away.scored += away_score;
        away.received += home_score;
        away.score_diff -= margin;
    }

    let (winner, loser) = (record.winner().to_string(), record.loser().to_string());
    let loser_points = match record.outcome {
        MatchOutcome::Forfeit => POINTS_FORFEIT_LOSS,
        _ => POINTS_LOSS,
    };

    let w = table.entry(winner).or_default();
    w.points += POINTS_WIN;
    w.wins += 1;

    let l = table.entry(loser).or_default();
    l.points += loser_points;
    l.losses += 1;
}

/// Order two level-on-points teams.
///
/// Head-to-head rounded margin first, when the pair met and the meeting was
/// not forfeited; otherwise the aggregate score differential across all
/// group matches. Pairwise only: a three-way tie is not guaranteed a
/// transitive ordering, the stable sort in [`rank_group`] just makes the
/// result deterministic for a fixed fixture history.
pub fn resolve_tie(
    a: &str,
    b: &str,
    fixtures: &[Vec<MatchRecord>],
    table: &PointsTable,
) -> Ordering {
    let mut head_to_head = 0i32;
    for record in fixtures.iter().flatten() {
        let Some((home_score, away_score)) = record.score else {
            continue;
        };
        if record.home == a && record.away == b {
            head_to_head += home_score as i32 - away_score as i32;
        } else if record.home == b && record.away == a {
            head_to_head += away_score as i32 - home_score as i32;
        }
    }
    if head_to_head != 0 {
        return if head_to_head > 0 {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    let diff_a = table.get(a).map(|e| e.score_diff).unwrap_or(0);
    let diff_b = table.get(b).map(|e| e.score_diff).unwrap_or(0);
    diff_b.cmp(&diff_a)
}

/// Rank one group's members: points descending, ties via [`resolve_tie`].
pub fn rank_group(
    codes: &[String],
    table: &PointsTable,
    fixtures: &[Vec<MatchRecord>],
) -> Vec<String> {
    let mut ranked = codes.to_vec();
    ranked.sort_by(|a, b| {
        let points_a = table.get(a).map(|e| e.points).unwrap_or(0);
        let points_b = table.get(b).map(|e| e.points).unwrap_or(0);
        points_b
            .cmp(&points_a)
            .then_with(|| resolve_tie(a, b, fixtures, table))
    });
    ranked
}
