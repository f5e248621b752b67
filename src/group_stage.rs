//! Drives the round-robin stage across all groups and ranks the qualifiers.

use std::collections::BTreeMap;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::form::{FormMap, MatchFormDelta};
use crate::score::MatchRecord;
use crate::standings::{self, PointsTable, TableEntry};
use crate::team::{GroupsInput, Roster, Team};
use crate::tournament::SimConfig;

/// Everything the group stage produced for one group.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupReport {
    /// `fixtures[round]` holds that round's match records
    pub fixtures: Vec<Vec<MatchRecord>>,
    /// One entry per match, in play order
    pub form_deltas: Vec<MatchFormDelta>,
    /// Table rows in ranked order
    pub table: Vec<(String, TableEntry)>,
    /// Member codes, best first
    pub ranking: Vec<String>,
}

/// Cross-group ranking buckets, each sorted by points, then score
/// differential, then total scored points.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RankedBuckets {
    pub winners: Vec<String>,
    pub runners_up: Vec<String>,
    pub thirds: Vec<String>,
}

/// Group-stage output feeding both reporting and the knockout seeder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupStageReport {
    pub groups: BTreeMap<String, GroupReport>,
    pub buckets: RankedBuckets,
    /// Cross-group ranking: top three of each bucket, concatenated
    pub final_ranking: Vec<String>,
    /// The first eight of `final_ranking`, the knockout field
    pub qualifiers: Vec<String>,
}

/// Simulate every group in label order against one shared points table.
pub fn run_group_stage<R: Rng>(
    groups: &GroupsInput,
    roster: &Roster,
    form: &mut FormMap,
    config: &SimConfig,
    rng: &mut R,
) -> Result<GroupStageReport, SimError> {
    let mut table = standings::init_table(roster.codes());
    let mut reports = BTreeMap::new();

    for (label, records) in groups {
        let members: Vec<Team> = records
            .iter()
            .map(|rec| roster.get(&rec.code).cloned())
            .collect::<Result<_, _>>()?;

        let played = standings::play_group(label, &members, form, &mut table, config, rng)?;
        let codes: Vec<String> = members.iter().map(|t| t.code.clone()).collect();
        let ranking = standings::rank_group(&codes, &table, &played.fixtures);

        debug!("group {label} final order: {ranking:?}");
        reports.insert(
            label.clone(),
            GroupReport {
                fixtures: played.fixtures,
                form_deltas: played.form_deltas,
                table: ranking
                    .iter()
                    .map(|code| (code.clone(), table.get(code).cloned().unwrap_or_default()))
                    .collect(),
                ranking,
            },
        );
    }

    let buckets = rank_across_groups(&reports, &table);
    let final_ranking = top_teams(&buckets);
    let qualifiers: Vec<String> = final_ranking
        .iter()
        .take(crate::constants::KNOCKOUT_TEAMS)
        .cloned()
        .collect();

    info!(
        "group stage complete: {} groups, {} qualifiers",
        reports.len(),
        qualifiers.len()
    );
    Ok(GroupStageReport {
        groups: reports,
        buckets,
        final_ranking,
        qualifiers,
    })
}

/// Bucket the group finishers by place and sort each bucket by the
/// cross-group criteria.
fn rank_across_groups(
    reports: &BTreeMap<String, GroupReport>,
    table: &PointsTable,
) -> RankedBuckets {
    let mut buckets = RankedBuckets::default();
    for report in reports.values() {
        for (bucket, place) in [
            (&mut buckets.winners, 0),
            (&mut buckets.runners_up, 1),
            (&mut buckets.thirds, 2),
        ] {
            if let Some(code) = report.ranking.get(place) {
                bucket.push(code.clone());
            }
        }
    }

    for bucket in [
        &mut buckets.winners,
        &mut buckets.runners_up,
        &mut buckets.thirds,
    ] {
        sort_by_criteria(bucket, table);
    }
    buckets
}

/// Points descending, score differential descending, scored points
/// descending.
fn sort_by_criteria(codes: &mut [String], table: &PointsTable) {
    codes.sort_by(|a, b| {
        let ea = table.get(a).cloned().unwrap_or_default();
        let eb = table.get(b).cloned().unwrap_or_default();
        eb.points
            .cmp(&ea.points)
            .then(eb.score_diff.cmp(&ea.score_diff))
            .then(eb.scored.cmp(&ea.scored))
    });
}

fn top_teams(buckets: &RankedBuckets) -> Vec<String> {
    buckets
        .winners
        .iter()
        .take(3)
        .chain(buckets.runners_up.iter().take(3))
        .chain(buckets.thirds.iter().take(3))
        .cloned()
        .collect()
}
