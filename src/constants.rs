/// Lowest final score the generator can produce
pub const MIN_SCORE: u32 = 44;

/// Highest final score the generator can produce
pub const MAX_SCORE: u32 = 122;

/// Probability that a match ends with one side forfeiting
pub const FORFEIT_PROB: f64 = 0.05;

/// Form swing applied to the winner (+) and loser (-) of a decided match
pub const FORM_STEP: f64 = 0.1;

/// Extra form swing when the margin reaches `BLOWOUT_MARGIN`
pub const FORM_BLOWOUT_BONUS: f64 = 0.05;

/// Score margin at which the blowout form bonus kicks in
pub const BLOWOUT_MARGIN: u32 = 15;

/// Points awarded for a win, forfeit wins included
pub const POINTS_WIN: u32 = 2;

/// Points awarded for an ordinary loss
pub const POINTS_LOSS: u32 = 1;

/// Points awarded for a forfeit loss
pub const POINTS_FORFEIT_LOSS: u32 = 0;

/// Number of teams advancing to the knockout bracket
pub const KNOCKOUT_TEAMS: usize = 8;
