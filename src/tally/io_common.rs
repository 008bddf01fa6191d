use std::collections::HashMap;
use std::path::Path;

use crate::tally::*;

/// A row of a ballot source, as read by the readers.
/// This is before grouping the rows into ballots.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankRow {
    pub lineno: usize,
    pub race: Option<String>,
    pub voter: String,
    pub candidate: String,
    pub rank: u32,
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Rows without a voter id are attributed to a voter named after their line.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

pub fn parse_rank(content: &str, lineno: usize) -> TallyResult<u32> {
    match content.trim().parse::<u32>() {
        Ok(rank) if rank >= 1 => Ok(rank),
        _ => InvalidRankSnafu {
            lineno,
            content: content.to_string(),
        }
        .fail(),
    }
}

/// Groups the rows into the ranked choices of each voter of a race.
///
/// Voters are returned in the order of their first row. A voter is
/// identified by its race and its id, so that one voter casts at most one
/// ballot per race. If `race_id` is provided, the rows of other races are dropped.
pub fn group_rows(rows: &[RankRow], race_id: Option<&str>) -> Vec<Vec<(String, u32)>> {
    let mut positions: HashMap<(Option<&str>, &str), usize> = HashMap::new();
    let mut groups: Vec<Vec<(String, u32)>> = Vec::new();
    for row in rows.iter() {
        if let (Some(wanted), Some(race)) = (race_id, row.race.as_deref()) {
            if wanted != race {
                debug!(
                    "group_rows: line {}: skipping row of race {:?}",
                    row.lineno, race
                );
                continue;
            }
        }
        let key = (row.race.as_deref(), row.voter.as_str());
        let pos = match positions.get(&key) {
            Some(pos) => *pos,
            None => {
                groups.push(Vec::new());
                positions.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[pos].push((row.candidate.clone(), row.rank));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(lineno: usize, race: &str, voter: &str, candidate: &str, rank: u32) -> RankRow {
        RankRow {
            lineno,
            race: Some(race.to_string()),
            voter: voter.to_string(),
            candidate: candidate.to_string(),
            rank,
        }
    }

    #[test]
    fn rows_are_grouped_by_voter_and_race() {
        let rows = vec![
            row(1, "r1", "v2", "b", 2),
            row(2, "r1", "v1", "a", 1),
            row(3, "r2", "v2", "c", 1),
            row(4, "r1", "v2", "a", 1),
        ];
        let all = group_rows(&rows, None);
        assert_eq!(
            all,
            vec![
                vec![("b".to_string(), 2), ("a".to_string(), 1)],
                vec![("a".to_string(), 1)],
                vec![("c".to_string(), 1)],
            ]
        );
        let r2 = group_rows(&rows, Some("r2"));
        assert_eq!(r2, vec![vec![("c".to_string(), 1)]]);
    }

    #[test]
    fn ranks() {
        assert_eq!(parse_rank(" 2 ", 1).ok(), Some(2));
        assert!(parse_rank("0", 1).is_err());
        assert!(parse_rank("first", 1).is_err());
        assert!(parse_rank("", 1).is_err());
    }

    #[test]
    fn default_ids() {
        let f = make_default_id("/tmp/some/ranks.csv");
        assert_eq!(f(12), "ranks.csv-00000012");
    }
}
