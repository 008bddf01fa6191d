use log::{debug, info, warn};

use ranked_placement::builder::{ballot_from_ranks, Builder};
use ranked_placement::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;

use crate::tally::config_reader::*;
use crate::tally::io_common::{group_rows, RankRow};

#[derive(Debug, Snafu)]
pub enum TallyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet {name:?} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("No worksheet in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Line {lineno}: cannot read cell {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Missing column index {name}"))]
    MissingColumn { name: String },
    #[snafu(display("Cannot read a column index from {content}"))]
    ParsingColumnIndex { content: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading CSV line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} has no column {column}"))]
    LineTooShort { lineno: usize, column: usize },
    #[snafu(display("Line {lineno}: {content:?} is not a rank"))]
    InvalidRank { lineno: usize, content: String },
    #[snafu(display("Ballot provider not implemented: {provider:?}"))]
    UnknownProvider { provider: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Invalid election"))]
    InvalidElection { source: VotingErrors },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },
}

pub type TallyResult<T> = Result<T, TallyError>;

fn result_stats_to_json(rs: &PlacementResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.round_stats.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(count.to_string()));
        }

        let tally_results: Vec<JSValue> = match &round_stat.outcome {
            RoundOutcome::Elected(name) => vec![json!({
                "elected": name,
                "transfers": {}
            })],
            RoundOutcome::Eliminated(elim_stats) => {
                let mut transfers: JSMap<String, JSValue> = JSMap::new();
                for (name, count) in elim_stats.transfers.iter() {
                    transfers.insert(name.clone(), json!(count.to_string()));
                }
                if elim_stats.exhausted > 0 {
                    transfers.insert(
                        "exhausted".to_string(),
                        json!(elim_stats.exhausted.to_string()),
                    );
                }
                vec![json!({
                    "eliminated": elim_stats.name,
                    "transfers": transfers
                })]
            }
        };

        let js = json!({
            "seat": round_stat.seat,
            "round": round_stat.round,
            "threshold": round_stat.threshold.map(|t| t.to_string()),
            "tally": tally,
            "tallyResults": tally_results
        });
        l.push(js);
    }
    l
}

fn build_summary_js(
    config: &TallyConfig,
    rules: &PlacementRules,
    fingerprint: String,
    rv: &PlacementResult,
) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_juridiction.clone(),
        office: config.output_settings.contest_office.clone(),
        top_n: rules.top_n.to_string(),
        fingerprint,
    };
    let placements: Vec<JSValue> = rv
        .placements
        .iter()
        .map(|p| json!({"rank": p.rank, "candidate": p.candidate}))
        .collect();
    json!({
        "config": c,
        "placements": placements,
        "results": result_stats_to_json(rv)
    })
}

fn read_ranking_data(root_path: &Path, cfs: &FileSource) -> TallyResult<Vec<Vec<(String, u32)>>> {
    let p: PathBuf = root_path.join(cfs.file_path.as_str());
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read rank file {:?}", p2);
    let rows: Vec<RankRow> = match cfs.provider.as_str() {
        "csv" => io_csv::read_csv_rows(&p2, cfs)?,
        "xlsx" => io_xlsx::read_xlsx_rows(&p2, cfs)?,
        x => {
            return UnknownProviderSnafu { provider: x }.fail();
        }
    };
    debug!("read_ranking_data: {} rows in {:?}", rows.len(), p2);
    let ballots = group_rows(&rows, cfs.race_id.as_deref());
    info!("read_ranking_data: {} ballots in {:?}", ballots.len(), p2);
    Ok(ballots)
}

fn warn_unknown_candidates(config: &TallyConfig, ballots: &[Vec<String>]) {
    let known: HashSet<&str> = config.candidates.iter().map(|c| c.id.as_str()).collect();
    for (idx, prefs) in ballots.iter().enumerate() {
        for p in prefs.iter().filter(|p| !known.contains(p.as_str())) {
            warn!("ballot {}: {:?} is not a candidate, ignoring it", idx + 1, p);
        }
    }
}

// An empty `out` is the same as no `out`.
fn summary_path(out: Option<String>, settings: &OutputSettings, root_path: &Path) -> Option<PathBuf> {
    match (out.filter(|o| !o.is_empty()), settings.output_directory.as_ref()) {
        (Some(o), _) if o == "stdout" => None,
        (Some(o), _) => Some(PathBuf::from(o)),
        (None, Some(dir)) => Some(
            root_path
                .join(dir)
                .join(format!("{}_summary.json", settings.contest_name)),
        ),
        (None, None) => None,
    }
}

fn write_summary(
    pretty_js_stats: &str,
    out: Option<String>,
    config: &TallyConfig,
    root_path: &Path,
) -> TallyResult<()> {
    match summary_path(out, &config.output_settings, root_path) {
        Some(p) => {
            if let Some(dir_p) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir_p).context(WritingSummarySnafu {
                    path: dir_p.display().to_string(),
                })?;
            }
            info!("Writing summary to {:?}", p);
            fs::write(&p, pretty_js_stats).context(WritingSummarySnafu {
                path: p.display().to_string(),
            })?;
        }
        None => {
            println!("{}", pretty_js_stats);
        }
    }
    Ok(())
}

/// Runs the election described by a configuration file.
///
/// If a reference summary is provided, the run fails when the computed summary
/// differs from it.
pub fn run_election(
    config_path: String,
    check_summary_path: Option<String>,
    out: Option<String>,
    top_n_override: Option<u32>,
) -> TallyResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config: TallyConfig = read_config(config_path.as_str())?;
    info!("config: {:?}", config);
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;

    let rules = config.placement_rules(top_n_override);
    let candidates: Vec<Candidate> = config
        .candidates
        .iter()
        .map(|c| c.to_candidate())
        .collect();

    let mut builder = Builder::new(&rules)
        .context(InvalidElectionSnafu {})?
        .candidates(&candidates)
        .context(InvalidElectionSnafu {})?;

    let mut all_ballots: Vec<Vec<String>> = config.ballots.clone().unwrap_or_default();
    for b in all_ballots.iter() {
        builder.add_ballot(b);
    }
    for cfs in config.ballot_sources.iter().flatten() {
        for ranked in read_ranking_data(root_p, cfs)? {
            let ballot = ballot_from_ranks(&ranked);
            builder.add_ballot(&ballot.preferences);
            all_ballots.push(ballot.preferences);
        }
    }
    info!("Processing {} ballots", builder.num_ballots());
    warn_unknown_candidates(&config, &all_ballots);

    let result = builder.tabulate();
    info!("res {:?}", result.placements);

    // Assemble the final json
    let result_js = build_summary_js(&config, &rules, builder.fingerprint(), &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_summary(pretty_js_stats.as_str(), out, &config, root_p)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p.clone())?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu { path: summary_p }.fail();
        }
        info!("The summary matches the reference {:?}", summary_p);
    }

    Ok(())
}

#[cfg(test)]
fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let test_dir = option_env!("TALLY_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {}", test_name);
    let res = run_election(
        format!("{}/{}/{}", test_dir, test_name, config_lpath),
        Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        Some("stdout".to_string()),
        None,
    );
    if let Err(e) = res {
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    run_election_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}

#[cfg(test)]
mod tests {

    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn first_round_majority() {
        init();
        test_wrapper("first_round_majority");
    }

    #[test]
    fn tiebreak_transfer() {
        init();
        test_wrapper("tiebreak_transfer");
    }

    #[test]
    fn csv_rank_rows() {
        init();
        test_wrapper("csv_rank_rows");
    }

    #[test]
    fn xlsx_rank_rows() {
        init();
        test_wrapper("xlsx_rank_rows");
    }

    #[test]
    fn single_candidate() {
        init();
        test_wrapper("single_candidate");
    }

    #[test]
    fn empty_race() {
        init();
        test_wrapper("empty_race");
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        init();
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
        // The second place differs when only one placement is computed.
        let res = run_election(
            format!("{}/tiebreak_transfer/tiebreak_transfer_config.json", dir),
            Some(format!(
                "{}/tiebreak_transfer/tiebreak_transfer_expected_summary.json",
                dir
            )),
            Some("stdout".to_string()),
            Some(1),
        );
        assert!(matches!(res, Err(TallyError::ReferenceMismatch { .. })));
    }

    #[test]
    fn duplicate_candidates_are_rejected() {
        init();
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data");
        let res = run_election(
            format!("{}/invalid/duplicate_candidates_config.json", dir),
            None,
            Some("stdout".to_string()),
            None,
        );
        assert!(matches!(res, Err(TallyError::InvalidElection { .. })));
    }

    #[test]
    fn summary_destination() {
        let mut settings = OutputSettings {
            contest_name: "final".to_string(),
            output_directory: None,
            contest_date: None,
            contest_juridiction: None,
            contest_office: None,
        };
        let root = Path::new("/data/race");
        assert_eq!(summary_path(None, &settings, root), None);
        assert_eq!(summary_path(Some("".to_string()), &settings, root), None);
        assert_eq!(summary_path(Some("stdout".to_string()), &settings, root), None);
        assert_eq!(
            summary_path(Some("out.json".to_string()), &settings, root),
            Some(PathBuf::from("out.json"))
        );

        settings.output_directory = Some("output".to_string());
        let expected = Some(PathBuf::from("/data/race/output/final_summary.json"));
        assert_eq!(summary_path(None, &settings, root), expected);
        assert_eq!(summary_path(Some("".to_string()), &settings, root), expected);
        assert_eq!(summary_path(Some("stdout".to_string()), &settings, root), None);
    }

    #[test]
    fn summary_json_layout() {
        let rv = PlacementResult {
            placements: vec![Placement {
                rank: 1,
                candidate: "a".to_string(),
            }],
            round_stats: vec![RoundStats {
                seat: 1,
                round: 1,
                threshold: Some(2),
                tally: vec![("a".to_string(), 1), ("b".to_string(), 1)],
                outcome: RoundOutcome::Eliminated(EliminationStats {
                    name: "b".to_string(),
                    transfers: vec![],
                    exhausted: 1,
                }),
            }],
        };
        let js = result_stats_to_json(&rv);
        assert_eq!(
            js,
            vec![json!({
                "seat": 1,
                "round": 1,
                "threshold": "2",
                "tally": {"a": "1", "b": "1"},
                "tallyResults": [{"eliminated": "b", "transfers": {"exhausted": "1"}}]
            })]
        );
    }
}
