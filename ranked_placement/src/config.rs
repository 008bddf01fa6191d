// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A contestant in a race.
///
/// The `id` is the reference used by ballots. It must be unique within a single
/// tabulation: if it is repeated, only the first occurrence is registered.
#[derive(PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    /// Externally supplied ranking signal (for example accumulated points).
    /// It is only used to decide which candidate is eliminated when several
    /// candidates share the lowest count: the lower score is eliminated.
    pub tiebreak_score: f64,
}

impl Candidate {
    pub fn new(id: &str, name: &str, tiebreak_score: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            tiebreak_score,
        }
    }
}

/// The ordered choices of one voter. The first element is the first choice.
///
/// Ids that do not refer to a candidate of the tabulation are ignored.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct Ballot {
    pub preferences: Vec<String>,
}

impl Ballot {
    pub fn new(preferences: &[&str]) -> Ballot {
        Ballot {
            preferences: preferences.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ******** Output data structures *********

/// What happened to the ballots of an eliminated candidate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EliminationStats {
    pub name: String,
    /// Ballots that moved to their next valid preference, in candidate order.
    pub transfers: Vec<(String, u64)>,
    /// Ballots left without any valid preference.
    pub exhausted: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RoundOutcome {
    Elected(String),
    Eliminated(EliminationStats),
}

/// Statistics for one round
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundStats {
    /// The placement being decided (1 for the first place).
    pub seat: u32,
    /// The round number, starting at 1 for every seat.
    pub round: u32,
    /// The winning threshold of this seat. Absent when a single candidate
    /// was running and won without any count.
    pub threshold: Option<u64>,
    /// First-choice counts of the running candidates, in candidate order.
    pub tally: Vec<(String, u64)>,
    pub outcome: RoundOutcome,
}

impl RoundStats {
    pub fn elected(&self) -> Option<&str> {
        match &self.outcome {
            RoundOutcome::Elected(name) => Some(name.as_str()),
            RoundOutcome::Eliminated(_) => None,
        }
    }

    pub fn eliminated(&self) -> Option<&str> {
        match &self.outcome {
            RoundOutcome::Elected(_) => None,
            RoundOutcome::Eliminated(es) => Some(es.name.as_str()),
        }
    }

    pub fn count_for(&self, name: &str) -> Option<u64> {
        self.tally
            .iter()
            .find_map(|(n, c)| if n == name { Some(*c) } else { None })
    }
}

/// The outcome of one single-winner election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SingleWinnerResult {
    pub winner: Option<String>,
    pub threshold: Option<u64>,
    pub round_stats: Vec<RoundStats>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Placement {
    pub rank: u32,
    pub candidate: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PlacementResult {
    /// Ordered by rank, starting at 1.
    pub placements: Vec<Placement>,
    /// Every round of every seat, in chronological order.
    pub round_stats: Vec<RoundStats>,
}

impl PlacementResult {
    pub fn winner_of(&self, rank: u32) -> Option<&str> {
        self.placements
            .iter()
            .find(|p| p.rank == rank)
            .map(|p| p.candidate.as_str())
    }
}

/// Errors raised while assembling an election with the builder.
///
/// The tabulation itself never fails.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    DuplicateCandidate(String),
    EmptyCandidateId,
    InvalidTopN(u32),
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::DuplicateCandidate(id) => {
                write!(f, "candidate {:?} is registered more than once", id)
            }
            VotingErrors::EmptyCandidateId => write!(f, "candidate ids may not be empty"),
            VotingErrors::InvalidTopN(n) => {
                write!(f, "the number of placements must be at least 1, got {}", n)
            }
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PlacementRules {
    /// The number of placements to compute (1st, 2nd, ...).
    pub top_n: u32,
}

impl PlacementRules {
    pub const DEFAULT_RULES: PlacementRules = PlacementRules { top_n: 3 };
}

impl Default for PlacementRules {
    fn default() -> Self {
        PlacementRules::DEFAULT_RULES
    }
}
