mod config;
pub mod builder;
pub mod manual;

use log::{debug, info};

use std::{
    collections::{BTreeMap, HashMap},
    ops::{Add, AddAssign},
};

pub use crate::config::*;

// **** Private structures ****

type RoundId = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

impl CandidateId {
    fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
    const ONE: VoteCount = VoteCount(1);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

/// The registered candidates. The position in the input is the CandidateId,
/// which makes the candidate order the last resort of every tiebreak.
struct Roster {
    names: Vec<String>,
    scores: Vec<f64>,
    by_name: HashMap<String, CandidateId>,
}

impl Roster {
    fn new(candidates: &[Candidate]) -> Roster {
        let mut roster = Roster {
            names: Vec::new(),
            scores: Vec::new(),
            by_name: HashMap::new(),
        };
        for c in candidates.iter() {
            if roster.by_name.contains_key(&c.id) {
                debug!(
                    "Roster::new: candidate {:?} is repeated, keeping the first occurrence",
                    c.id
                );
                continue;
            }
            let cid = CandidateId(roster.names.len() as u32);
            roster.by_name.insert(c.id.clone(), cid);
            roster.names.push(c.id.clone());
            roster.scores.push(c.tiebreak_score);
        }
        roster
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn ids(&self) -> impl Iterator<Item = CandidateId> {
        (0..self.names.len() as u32).map(CandidateId)
    }

    fn name(&self, cid: CandidateId) -> &str {
        self.names[cid.idx()].as_str()
    }

    fn score(&self, cid: CandidateId) -> f64 {
        self.scores[cid.idx()]
    }
}

/// All the ballots, translated once to candidate ids.
///
/// Unknown ids are dropped here. The set of candidates only shrinks during a
/// tabulation, so an unknown id can never become a valid choice later.
/// Ballots left empty are kept: they still count as ballots passed in.
struct BallotArena {
    ballots: Vec<Vec<CandidateId>>,
}

impl BallotArena {
    fn new(ballots: &[Ballot], roster: &Roster) -> BallotArena {
        let ballots = ballots
            .iter()
            .map(|b| {
                b.preferences
                    .iter()
                    .filter_map(|p| roster.by_name.get(p).cloned())
                    .collect()
            })
            .collect();
        BallotArena { ballots }
    }

    fn len(&self) -> usize {
        self.ballots.len()
    }
}

fn next_running(prefs: &[CandidateId], from: usize, running: &[bool]) -> Option<usize> {
    prefs
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, cid)| running[cid.idx()])
        .map(|(pos, _)| pos)
}

/// The working set of one single-winner election.
///
/// Each ballot keeps the position of its first preference that is still
/// running. Candidates are only ever removed within an election, so this
/// position only moves forward.
struct ElectionState<'a> {
    arena: &'a BallotArena,
    running: Vec<bool>,
    heads: Vec<Option<usize>>,
}

impl<'a> ElectionState<'a> {
    fn new(arena: &'a BallotArena, running: Vec<bool>) -> ElectionState<'a> {
        let heads = arena
            .ballots
            .iter()
            .map(|prefs| next_running(prefs, 0, &running))
            .collect();
        ElectionState {
            arena,
            running,
            heads,
        }
    }

    /// The number of ballots that still have a running preference.
    fn continuing(&self) -> VoteCount {
        VoteCount(self.heads.iter().filter(|h| h.is_some()).count() as u64)
    }

    /// First-choice counts of the given candidates, in the same order.
    fn compute_tally(&self, candidates: &[CandidateId]) -> Vec<(CandidateId, VoteCount)> {
        let mut counts: Vec<VoteCount> = vec![VoteCount::EMPTY; self.running.len()];
        for (prefs, head) in self.arena.ballots.iter().zip(self.heads.iter()) {
            if let Some(pos) = head {
                counts[prefs[*pos].idx()] += VoteCount::ONE;
            }
        }
        candidates
            .iter()
            .map(|cid| (*cid, counts[cid.idx()]))
            .collect()
    }

    /// Removes a candidate and moves its ballots to their next running preference.
    ///
    /// Returns the transfers to each candidate and the number of exhausted ballots.
    fn eliminate(&mut self, loser: CandidateId) -> (BTreeMap<CandidateId, VoteCount>, VoteCount) {
        self.running[loser.idx()] = false;
        let mut transfers: BTreeMap<CandidateId, VoteCount> = BTreeMap::new();
        let mut exhausted = VoteCount::EMPTY;
        for (prefs, head) in self.arena.ballots.iter().zip(self.heads.iter_mut()) {
            match *head {
                Some(pos) if prefs[pos] == loser => {
                    *head = next_running(prefs, pos + 1, &self.running);
                    match *head {
                        Some(new_pos) => {
                            *transfers.entry(prefs[new_pos]).or_insert(VoteCount::EMPTY) +=
                                VoteCount::ONE;
                        }
                        None => {
                            exhausted += VoteCount::ONE;
                        }
                    }
                }
                _ => {
                    // The first choice is the same.
                }
            }
        }
        (transfers, exhausted)
    }
}

struct SeatOutcome {
    winner: Option<CandidateId>,
    threshold: Option<VoteCount>,
    stats: Vec<RoundStats>,
}

/// Runs the voting algorithm for a single winner.
///
/// Arguments:
/// * `candidates` the running candidates, in order. The order is used as the last
/// tiebreak when eliminating candidates.
/// * `ballots` the ballots. They do not need to be filtered to the candidates.
///
/// This function does not fail: an empty election has no winner, and a single
/// candidate always wins.
pub fn run_single_winner(candidates: &[Candidate], ballots: &[Ballot]) -> SingleWinnerResult {
    info!(
        "run_single_winner: Processing {:?} ballots, {:?} candidates",
        ballots.len(),
        candidates.len()
    );
    let roster = Roster::new(candidates);
    let arena = BallotArena::new(ballots, &roster);
    let placed = vec![false; roster.len()];
    let outcome = run_seat(&roster, &arena, &placed, 1);
    SingleWinnerResult {
        winner: outcome.winner.map(|cid| roster.name(cid).to_string()),
        threshold: outcome.threshold.map(|vc| vc.0),
        round_stats: outcome.stats,
    }
}

/// Computes up to `rules.top_n` placements.
///
/// Every placement is decided by a new single-winner election over the
/// candidates that are not placed yet. The previous winners are removed from
/// all the ballots, so that the next preferences of their voters are counted.
/// It is not a multi-winner transfer process: the threshold is computed again
/// for each placement.
///
/// Fewer placements are returned when the candidates run out.
pub fn run_placements(
    candidates: &[Candidate],
    ballots: &[Ballot],
    rules: &PlacementRules,
) -> PlacementResult {
    info!(
        "run_placements: Processing {:?} ballots, {:?} candidates, rules: {:?}",
        ballots.len(),
        candidates.len(),
        rules
    );
    let roster = Roster::new(candidates);
    let arena = BallotArena::new(ballots, &roster);
    for cid in roster.ids() {
        info!(
            "Candidate: {}: {} (tiebreak score {})",
            cid.0 + 1,
            roster.name(cid),
            roster.score(cid)
        );
    }

    let mut placed: Vec<bool> = vec![false; roster.len()];
    let mut placements: Vec<Placement> = Vec::new();
    let mut round_stats: Vec<RoundStats> = Vec::new();
    let mut rank: u32 = 1;
    while rank <= rules.top_n && placed.iter().any(|p| !p) {
        let outcome = run_seat(&roster, &arena, &placed, rank);
        round_stats.extend(outcome.stats);
        match outcome.winner {
            Some(cid) => {
                info!("Placement {}: {}", rank, roster.name(cid));
                placements.push(Placement {
                    rank,
                    candidate: roster.name(cid).to_string(),
                });
                placed[cid.idx()] = true;
                rank += 1;
            }
            None => {
                debug!("run_placements: no winner for placement {}, stopping", rank);
                break;
            }
        }
    }

    PlacementResult {
        placements,
        round_stats,
    }
}

/// A digest of everything that determines the outcome of a tabulation.
///
/// Two runs with the same fingerprint produce the same result.
pub fn input_fingerprint(
    candidates: &[Candidate],
    ballots: &[Ballot],
    rules: &PlacementRules,
) -> String {
    let mut canonical = String::new();
    for c in candidates.iter() {
        canonical.push_str(&format!(
            "candidate {:?} {:?} {}\n",
            c.id, c.name, c.tiebreak_score
        ));
    }
    for b in ballots.iter() {
        canonical.push_str(&format!("ballot {:?}\n", b.preferences));
    }
    canonical.push_str(&format!("top_n {}\n", rules.top_n));
    sha256::digest(canonical)
}

fn get_threshold(total_count: VoteCount) -> VoteCount {
    VoteCount((total_count.0 / 2) + 1)
}

// The candidates that are not placed are running, and the ballots only see them.
fn run_seat(roster: &Roster, arena: &BallotArena, placed: &[bool], seat: u32) -> SeatOutcome {
    let running: Vec<bool> = placed.iter().map(|p| !p).collect();
    let mut remaining: Vec<CandidateId> = roster.ids().filter(|cid| running[cid.idx()]).collect();
    debug!(
        "run_seat: seat {}: {} candidates running",
        seat,
        remaining.len()
    );

    match remaining.as_slice() {
        [] => {
            debug!("run_seat: seat {}: no candidate left", seat);
            return SeatOutcome {
                winner: None,
                threshold: None,
                stats: Vec::new(),
            };
        }
        [only] => {
            // Default winner: the count is all the ballots, not a tally.
            let count = VoteCount(arena.len() as u64);
            info!(
                "Seat {} round 1: {} is the only candidate, elected with {} ballots",
                seat,
                roster.name(*only),
                count.0
            );
            let stats = RoundStats {
                seat,
                round: 1,
                threshold: None,
                tally: vec![(roster.name(*only).to_string(), count.0)],
                outcome: RoundOutcome::Elected(roster.name(*only).to_string()),
            };
            return SeatOutcome {
                winner: Some(*only),
                threshold: None,
                stats: vec![stats],
            };
        }
        _ => {}
    }

    let mut state = ElectionState::new(arena, running);
    let total_valid = state.continuing();
    let threshold = get_threshold(total_valid);
    info!(
        "Seat {} (valid ballots: {}, winning threshold: {})",
        seat, total_valid.0, threshold.0
    );

    let mut stats: Vec<RoundStats> = Vec::new();
    let mut round_id: RoundId = 1;
    while remaining.len() > 1 {
        let tally = state.compute_tally(&remaining);
        debug!("run_seat: seat {} round {} tally: {:?}", seat, round_id, tally);

        if let Some((cid, count)) = tally.iter().find(|(_, vc)| *vc >= threshold) {
            info!(
                "Seat {} round {}: {} {} -> elected",
                seat,
                round_id,
                count.0,
                roster.name(*cid)
            );
            stats.push(RoundStats {
                seat,
                round: round_id,
                threshold: Some(threshold.0),
                tally: public_tally(roster, &tally),
                outcome: RoundOutcome::Elected(roster.name(*cid).to_string()),
            });
            return SeatOutcome {
                winner: Some(*cid),
                threshold: Some(threshold),
                stats,
            };
        }

        let loser = match find_eliminated_candidate(&tally, roster) {
            Some(cid) => cid,
            None => break,
        };
        let (transfers, exhausted) = state.eliminate(loser);
        remaining.retain(|cid| *cid != loser);
        info!(
            "Seat {} round {}: {} -> eliminated: {:?} transferred, {} exhausted",
            seat,
            round_id,
            roster.name(loser),
            transfers
                .iter()
                .map(|(cid, vc)| (roster.name(*cid), vc.0))
                .collect::<Vec<_>>(),
            exhausted.0
        );
        stats.push(RoundStats {
            seat,
            round: round_id,
            threshold: Some(threshold.0),
            tally: public_tally(roster, &tally),
            outcome: RoundOutcome::Eliminated(EliminationStats {
                name: roster.name(loser).to_string(),
                transfers: transfers
                    .iter()
                    .map(|(cid, vc)| (roster.name(*cid).to_string(), vc.0))
                    .collect(),
                exhausted: exhausted.0,
            }),
        });
        round_id += 1;
    }

    // Last candidate standing: it wins with whatever ballots still reach it.
    let last = remaining[0];
    let count = state.continuing();
    info!(
        "Seat {} round {}: {} {} -> elected as last candidate",
        seat,
        round_id,
        count.0,
        roster.name(last)
    );
    stats.push(RoundStats {
        seat,
        round: round_id,
        threshold: Some(threshold.0),
        tally: vec![(roster.name(last).to_string(), count.0)],
        outcome: RoundOutcome::Elected(roster.name(last).to_string()),
    });
    SeatOutcome {
        winner: Some(last),
        threshold: Some(threshold),
        stats,
    }
}

fn public_tally(roster: &Roster, tally: &[(CandidateId, VoteCount)]) -> Vec<(String, u64)> {
    tally
        .iter()
        .map(|(cid, vc)| (roster.name(*cid).to_string(), vc.0))
        .collect()
}

// The candidate to eliminate is the smallest for the order
// (count, tiebreak score, candidate order). The tally is in candidate order.
fn find_eliminated_candidate(
    tally: &[(CandidateId, VoteCount)],
    roster: &Roster,
) -> Option<CandidateId> {
    let min_count: VoteCount = tally.iter().map(|(_, vc)| *vc).min()?;
    let all_smallest: Vec<CandidateId> = tally
        .iter()
        .filter_map(|(cid, vc)| if *vc == min_count { Some(*cid) } else { None })
        .collect();

    // No tiebreak
    if all_smallest.len() == 1 {
        return all_smallest.first().cloned();
    }

    // min_by returns the first of several equal elements, which is the earliest candidate.
    let loser = all_smallest.iter().cloned().min_by(|c1, c2| {
        roster
            .score(*c1)
            .total_cmp(&roster.score(*c2))
            .then_with(|| c1.cmp(c2))
    });
    debug!(
        "find_eliminated_candidate: tie at {} between {:?}, eliminating {:?}",
        min_count.0,
        all_smallest
            .iter()
            .map(|cid| (roster.name(*cid), roster.score(*cid)))
            .collect::<Vec<_>>(),
        loser.map(|cid| roster.name(cid))
    );
    loser
}
