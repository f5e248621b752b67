//! Knockout-stage seeding and the single-elimination bracket.

use std::collections::HashMap;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::form::{self, FormMap};
use crate::group_stage::RankedBuckets;
use crate::score::{self, MatchOutcome, MatchRecord};
use crate::team::{GroupsInput, Roster};
use crate::tournament::SimConfig;

/// The four seeding pots of an eight-team bracket, pre-shuffle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pots {
    pub d: Vec<String>,
    pub e: Vec<String>,
    pub f: Vec<String>,
    pub g: Vec<String>,
}

/// One drawn quarterfinal pairing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub home: String,
    pub away: String,
}

/// Bracket progression states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnockoutStage {
    Quarterfinals,
    Semifinals,
    ThirdPlaceAndFinal,
    Complete,
}

/// The medal standings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podium {
    pub gold: String,
    pub silver: String,
    pub bronze: String,
}

/// Full knockout-stage output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KnockoutReport {
    pub pots: Pots,
    pub quarterfinals: Vec<MatchRecord>,
    pub semifinals: Vec<MatchRecord>,
    pub third_place: MatchRecord,
    pub final_match: MatchRecord,
    pub podium: Podium,
}

/// Build the pots from the cross-group buckets and draw the quarterfinals.
///
/// Pot D takes the top two group winners, pot E the third winner plus the
/// best runner-up, pot F the remaining runners-up, pot G the top two
/// third-placed teams. Each pot is shuffled, then D is drawn against G and E
/// against F, skipping same-group opponents while any eligible one remains.
pub fn seed_knockout<R: Rng>(
    buckets: &RankedBuckets,
    groups: &GroupsInput,
    rng: &mut R,
) -> Result<(Pots, Vec<Matchup>), SimError> {
    check_bucket("group-winning", &buckets.winners, 3)?;
    check_bucket("runner-up", &buckets.runners_up, 3)?;
    check_bucket("third-placed", &buckets.thirds, 2)?;

    let pots = Pots {
        d: buckets.winners[0..2].to_vec(),
        e: vec![buckets.winners[2].clone(), buckets.runners_up[0].clone()],
        f: buckets.runners_up[1..3].to_vec(),
        g: buckets.thirds[0..2].to_vec(),
    };

    let group_of: HashMap<&str, &str> = groups
        .iter()
        .flat_map(|(label, members)| {
            members.iter().map(move |rec| (rec.code.as_str(), label.as_str()))
        })
        .collect();

    let mut pot_d = pots.d.clone();
    let mut pot_e = pots.e.clone();
    let mut pot_f = pots.f.clone();
    let mut pot_g = pots.g.clone();
    pot_d.shuffle(rng);
    pot_e.shuffle(rng);
    pot_f.shuffle(rng);
    pot_g.shuffle(rng);

    let mut matchups = Vec::with_capacity(4);
    draw_pairs(pot_d, pot_g, &group_of, &mut matchups);
    draw_pairs(pot_e, pot_f, &group_of, &mut matchups);

    info!("quarterfinal draw: {matchups:?}");
    Ok((pots, matchups))
}

fn check_bucket(place: &'static str, bucket: &[String], needed: usize) -> Result<(), SimError> {
    if bucket.len() < needed {
        return Err(SimError::InsufficientTeams {
            place,
            needed,
            got: bucket.len(),
        });
    }
    Ok(())
}

/// Greedy draw of one pot against another. The first opponent from a
/// different original group is taken; when none is left the same-group
/// pairing is accepted so every team still gets drawn.
fn draw_pairs(
    first: Vec<String>,
    mut second: Vec<String>,
    group_of: &HashMap<&str, &str>,
    matchups: &mut Vec<Matchup>,
) {
    for home in first {
        if second.is_empty() {
            break;
        }
        let pick = second
            .iter()
            .position(|away| group_of.get(home.as_str()) != group_of.get(away.as_str()))
            .unwrap_or(0);
        let away = second.remove(pick);
        matchups.push(Matchup { home, away });
    }
}

/// Play the bracket to completion: quarterfinals, semifinals, then the
/// third-place match and the final.
///
/// Semifinal pairing is fixed-index (winner 1 v winner 3, winner 2 v
/// winner 4); [`SimConfig::shuffle_semifinal_pairing`] switches to a
/// re-drawn pairing instead. Every decided match moves form by the same
/// rule as the group stage.
pub fn run_knockout<R: Rng>(
    buckets: &RankedBuckets,
    groups: &GroupsInput,
    roster: &Roster,
    form: &mut FormMap,
    config: &SimConfig,
    rng: &mut R,
) -> Result<KnockoutReport, SimError> {
    let (pots, quarterfinal_draw) = seed_knockout(buckets, groups, rng)?;

    let mut stage = KnockoutStage::Quarterfinals;
    let mut quarterfinals = Vec::new();
    let mut semifinals = Vec::new();
    let mut qf_winners: Vec<String> = Vec::new();
    let mut finalists: Vec<String> = Vec::new();
    let mut sf_losers: Vec<String> = Vec::new();
    let mut third_place = None;
    let mut final_match = None;
    let mut podium = None;

    while stage != KnockoutStage::Complete {
        match stage {
            KnockoutStage::Quarterfinals => {
                for matchup in &quarterfinal_draw {
                    let record = play_bracket_match(&matchup.home, &matchup.away, roster, form, config, rng)?;
                    qf_winners.push(record.winner().to_string());
                    quarterfinals.push(record);
                }
                debug!("quarterfinal winners: {qf_winners:?}");
                stage = KnockoutStage::Semifinals;
            }
            KnockoutStage::Semifinals => {
                if config.shuffle_semifinal_pairing {
                    qf_winners.shuffle(rng);
                }
                for (a, b) in [(0, 2), (1, 3)] {
                    let record =
                        play_bracket_match(&qf_winners[a], &qf_winners[b], roster, form, config, rng)?;
                    finalists.push(record.winner().to_string());
                    sf_losers.push(record.loser().to_string());
                    semifinals.push(record);
                }
                stage = KnockoutStage::ThirdPlaceAndFinal;
            }
            KnockoutStage::ThirdPlaceAndFinal => {
                let third =
                    play_bracket_match(&sf_losers[0], &sf_losers[1], roster, form, config, rng)?;
                let bronze = third.winner().to_string();

                let last =
                    play_bracket_match(&finalists[0], &finalists[1], roster, form, config, rng)?;
                podium = Some(Podium {
                    gold: last.winner().to_string(),
                    silver: last.loser().to_string(),
                    bronze,
                });

                third_place = Some(third);
                final_match = Some(last);
                stage = KnockoutStage::Complete;
            }
            KnockoutStage::Complete => {}
        }
    }

    // The loop cannot leave ThirdPlaceAndFinal without filling these.
    let (third_place, final_match, podium) = match (third_place, final_match, podium) {
        (Some(t), Some(f), Some(p)) => (t, f, p),
        _ => unreachable!("knockout loop ended before the final"),
    };

    info!("podium: {podium:?}");
    Ok(KnockoutReport {
        pots,
        quarterfinals,
        semifinals,
        third_place,
        final_match,
        podium,
    })
}

/// One knockout match: simulate, classify, adjust form unless forfeited.
fn play_bracket_match<R: Rng>(
    home: &str,
    away: &str,
    roster: &Roster,
    form: &mut FormMap,
    config: &SimConfig,
    rng: &mut R,
) -> Result<MatchRecord, SimError> {
    let home_team = roster.get(home)?;
    let away_team = roster.get(away)?;

    let (record, raw) = score::play_match(home_team, away_team, form, config, rng);
    if record.outcome != MatchOutcome::Forfeit {
        form::apply_result(form, &record.home, &record.away, raw.0, raw.1);
    }
    Ok(record)
}
