use thiserror::Error;

/// Fatal data-integrity errors.
///
/// Any of these aborts the whole simulation: a malformed record would poison
/// every downstream form value, and a missing team or an undersized bucket
/// leaves the bracket unfillable. Randomness-driven branches (forfeits, score
/// spread) are expected nondeterminism and never surface here.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    /// An exhibition result string did not parse into two integer scores.
    #[error("unparseable result {raw:?} in exhibition {team} vs {opponent}")]
    MalformedRecord {
        team: String,
        opponent: String,
        raw: String,
    },

    /// A referenced team code has no roster entry.
    #[error("team {0} has no roster entry")]
    UnknownTeam(String),

    /// A seeding bucket came up short of the teams the pots require.
    #[error("knockout seeding needs {needed} {place} teams, got {got}")]
    InsufficientTeams {
        place: &'static str,
        needed: usize,
        got: usize,
    },

    /// A group cannot be scheduled with the circle method.
    #[error("group {label} has {size} teams, round-robin pairing needs an even count of at least 2")]
    UnevenGroup { label: String, size: usize },
}
