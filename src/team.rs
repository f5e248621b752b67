use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// One roster entry as supplied by the (external) data loader.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamRecord {
    /// Unique team code, e.g. an ISO country code
    pub code: String,
    /// Display name
    pub name: String,
    /// FIBA-style strength ranking, lower is stronger
    pub ranking: u32,
}

/// Group label mapped to its ordered members.
///
/// `BTreeMap` keeps group iteration order deterministic, which fixes the RNG
/// draw order across the whole pipeline.
pub type GroupsInput = BTreeMap<String, Vec<TeamRecord>>;

/// One prior exhibition match, seen from the listing team's side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExhibitionMatch {
    /// Opponent team code
    #[serde(alias = "Opponent")]
    pub opponent: String,
    /// Scoreline as `"scoreA-scoreB"`, listing team first
    #[serde(alias = "Result")]
    pub result: String,
}

/// Team code mapped to its prior exhibition matches.
pub type ExhibitionsInput = BTreeMap<String, Vec<ExhibitionMatch>>;

/// A validated tournament participant.
///
/// Form deliberately lives outside this type, in [`crate::form::FormMap`]:
/// it is the one table the whole pipeline mutates, so it is threaded through
/// each stage explicitly rather than hidden on the team.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub code: String,
    pub name: String,
    pub ranking: u32,
}

impl From<&TeamRecord> for Team {
    fn from(rec: &TeamRecord) -> Self {
        Team {
            code: rec.code.clone(),
            name: rec.name.clone(),
            ranking: rec.ranking,
        }
    }
}

/// Every team in the tournament, keyed by code.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Roster {
    teams: HashMap<String, Team>,
}

impl Roster {
    /// Collect all group members into one lookup table.
    pub fn from_groups(groups: &GroupsInput) -> Self {
        let mut teams = HashMap::new();
        for members in groups.values() {
            for rec in members {
                teams.insert(rec.code.clone(), Team::from(rec));
            }
        }
        Roster { teams }
    }

    /// Look a team up, failing the run if the code is unknown.
    pub fn get(&self, code: &str) -> Result<&Team, SimError> {
        self.teams
            .get(code)
            .ok_or_else(|| SimError::UnknownTeam(code.to_string()))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.teams.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &String> {
        self.teams.keys()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
