//! Tournament Sim - group-stage plus knockout basketball tournament engine.
//!
//! Takes a roster split into groups, strength rankings and a prior exhibition
//! history, and simulates the whole tournament: team form, round-robin group
//! play with a points table and tie-break cascade, pot-based knockout seeding
//! that avoids same-group rematches, and the bracket down to the podium. All
//! randomness flows through an injectable source, so a fixed seed replays the
//! identical tournament.

pub mod constants;
pub mod error;
pub mod form;
pub mod group_stage;
pub mod knockout;
pub mod score;
pub mod standings;
pub mod team;
pub mod tournament;

pub use constants::{BLOWOUT_MARGIN, FORFEIT_PROB, KNOCKOUT_TEAMS, MAX_SCORE, MIN_SCORE};
pub use error::SimError;
pub use form::{initial_form, FormMap, FormUpdate, MatchFormDelta};
pub use group_stage::{GroupReport, GroupStageReport, RankedBuckets};
pub use knockout::{KnockoutReport, KnockoutStage, Matchup, Podium, Pots};
pub use score::{classify, simulate_score, MatchOutcome, MatchRecord};
pub use standings::{resolve_tie, round_robin_rounds, PointsTable, TableEntry};
pub use team::{ExhibitionMatch, ExhibitionsInput, GroupsInput, Roster, Team, TeamRecord};
pub use tournament::{SimConfig, Tournament, TournamentReport};
