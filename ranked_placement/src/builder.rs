pub use crate::config::*;

use std::collections::HashSet;

/// A builder for assembling a race before tabulating it.
///
/// Unlike the tabulation functions, the builder refuses ill-formed races:
/// repeated or empty candidate ids, or asking for no placement at all.
///
/// ```
/// use ranked_placement::builder::Builder;
/// use ranked_placement::{Candidate, PlacementRules};
/// # use ranked_placement::VotingErrors;
///
/// let mut builder = Builder::new(&PlacementRules::DEFAULT_RULES)?
///     .candidates(&[
///         Candidate::new("anna", "Anna", 12.0),
///         Candidate::new("bob", "Bob", 3.0),
///     ])?;
///
/// builder.add_ballot(&["anna".to_string(), "bob".to_string()]);
/// // Rank-tagged rows do not need to be sorted.
/// builder.add_ranked_rows(&[("anna".to_string(), 2), ("bob".to_string(), 1)]);
///
/// let result = builder.tabulate();
/// assert_eq!(result.placements.len(), 2);
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: PlacementRules,
    pub(crate) _candidates: Vec<Candidate>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &PlacementRules) -> Result<Builder, VotingErrors> {
        if rules.top_n == 0 {
            return Err(VotingErrors::InvalidTopN(rules.top_n));
        }
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: Vec::new(),
            _ballots: Vec::new(),
        })
    }

    /// Registers the candidates. The order matters: it settles the ties that the
    /// tiebreak scores cannot.
    pub fn candidates(self, cands: &[Candidate]) -> Result<Builder, VotingErrors> {
        let mut seen: HashSet<&str> = HashSet::new();
        for c in cands.iter() {
            if c.id.is_empty() {
                return Err(VotingErrors::EmptyCandidateId);
            }
            if !seen.insert(c.id.as_str()) {
                return Err(VotingErrors::DuplicateCandidate(c.id.clone()));
            }
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
            _ballots: self._ballots,
        })
    }

    /// Adds a ballot with the choices already in order.
    pub fn add_ballot(&mut self, preferences: &[String]) {
        self._ballots.push(Ballot {
            preferences: preferences.to_vec(),
        });
    }

    /// Adds a ballot given as rows of (candidate, rank), where rank 1 is the first choice.
    ///
    /// The rows are sorted by rank. If a candidate appears several times, only its
    /// best rank is kept.
    pub fn add_ranked_rows(&mut self, rows: &[(String, u32)]) {
        self._ballots.push(ballot_from_ranks(rows));
    }

    pub fn num_ballots(&self) -> usize {
        self._ballots.len()
    }

    pub fn tabulate(&self) -> PlacementResult {
        crate::run_placements(&self._candidates, &self._ballots, &self._rules)
    }

    pub fn fingerprint(&self) -> String {
        crate::input_fingerprint(&self._candidates, &self._ballots, &self._rules)
    }
}

/// Turns rank-tagged rows into an ordered ballot.
///
/// The sort is stable: rows sharing a rank keep their relative order.
pub fn ballot_from_ranks(rows: &[(String, u32)]) -> Ballot {
    let mut sorted: Vec<&(String, u32)> = rows.iter().collect();
    sorted.sort_by_key(|(_, rank)| *rank);
    let mut preferences: Vec<String> = Vec::new();
    for (name, _) in sorted {
        if !preferences.contains(name) {
            preferences.push(name.clone());
        }
    }
    Ballot { preferences }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_races() {
        assert_eq!(
            Builder::new(&PlacementRules { top_n: 0 }).err(),
            Some(VotingErrors::InvalidTopN(0))
        );
        let b = Builder::new(&PlacementRules::DEFAULT_RULES).unwrap();
        let res = b.candidates(&[Candidate::new("a", "A", 0.0), Candidate::new("a", "B", 1.0)]);
        assert_eq!(
            res.err(),
            Some(VotingErrors::DuplicateCandidate("a".to_string()))
        );
        let b = Builder::new(&PlacementRules::DEFAULT_RULES).unwrap();
        assert_eq!(
            b.candidates(&[Candidate::new("", "A", 0.0)]).err(),
            Some(VotingErrors::EmptyCandidateId)
        );
    }

    #[test]
    fn ranks_are_sorted() {
        let b = ballot_from_ranks(&[
            ("c".to_string(), 3),
            ("a".to_string(), 1),
            ("b".to_string(), 2),
            ("a".to_string(), 4),
        ]);
        assert_eq!(b, Ballot::new(&["a", "b", "c"]));
        assert_eq!(ballot_from_ranks(&[]), Ballot::default());
    }

    #[test]
    fn builder_tabulates() {
        let mut b = Builder::new(&PlacementRules { top_n: 2 })
            .unwrap()
            .candidates(&[
                Candidate::new("a", "A", 0.0),
                Candidate::new("b", "B", 0.0),
                Candidate::new("c", "C", 0.0),
            ])
            .unwrap();
        b.add_ballot(&["b".to_string(), "a".to_string()]);
        b.add_ranked_rows(&[("b".to_string(), 1), ("c".to_string(), 2)]);
        b.add_ranked_rows(&[("a".to_string(), 1)]);
        assert_eq!(b.num_ballots(), 3);
        let res = b.tabulate();
        assert_eq!(res.winner_of(1), Some("b"));
        assert_eq!(res.placements.len(), 2);
        assert_eq!(b.fingerprint(), b.fingerprint());
    }
}
