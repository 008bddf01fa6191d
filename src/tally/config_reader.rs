use crate::tally::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_juridiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    #[serde(rename = "topN")]
    pub top_n: String,
    pub fingerprint: String,
}

/// A file of rank-tagged rows: one row per (voter, candidate, rank).
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "raceId")]
    pub race_id: Option<String>,
    #[serde(rename = "raceColumnIndex")]
    _race_column_index: Option<JSValue>,
    #[serde(rename = "voterColumnIndex")]
    _voter_column_index: Option<JSValue>,
    #[serde(rename = "candidateColumnIndex")]
    _candidate_column_index: Option<JSValue>,
    #[serde(rename = "rankColumnIndex")]
    _rank_column_index: Option<JSValue>,
    #[serde(rename = "firstRowIndex")]
    _first_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

/// The 0-based positions of the columns of a rank row.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RowColumns {
    pub race: Option<usize>,
    pub voter: usize,
    pub candidate: usize,
    pub rank: usize,
}

impl FileSource {
    pub fn columns(&self) -> TallyResult<RowColumns> {
        let race = match (&self._race_column_index, &self.race_id) {
            (Some(_), _) => Some(read_column(&self._race_column_index, "raceColumnIndex")?),
            // Filtering on a race needs the column that holds it.
            (None, Some(_)) => return MissingColumnSnafu { name: "raceColumnIndex" }.fail(),
            (None, None) => None,
        };
        Ok(RowColumns {
            race,
            voter: read_column(&self._voter_column_index, "voterColumnIndex")?,
            candidate: read_column(&self._candidate_column_index, "candidateColumnIndex")?,
            rank: read_column(&self._rank_column_index, "rankColumnIndex")?,
        })
    }

    /// The first row holding data, 1-based. Defaults to 1 (no header).
    pub fn first_row_index(&self) -> TallyResult<usize> {
        match self._first_row_index {
            Some(_) => read_js_int(&self._first_row_index),
            None => Ok(1),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyCandidate {
    pub id: String,
    pub name: Option<String>,
    #[serde(rename = "tiebreakScore")]
    pub tiebreak_score: Option<f64>,
}

impl TallyCandidate {
    pub fn to_candidate(&self) -> Candidate {
        Candidate {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            tiebreak_score: self.tiebreak_score.unwrap_or(0.0),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyRules {
    #[serde(rename = "topN")]
    pub top_n: Option<u32>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub candidates: Vec<TallyCandidate>,
    pub ballots: Option<Vec<Vec<String>>>,
    #[serde(rename = "ballotSources")]
    pub ballot_sources: Option<Vec<FileSource>>,
    pub rules: Option<TallyRules>,
}

impl TallyConfig {
    pub fn placement_rules(&self, top_n_override: Option<u32>) -> PlacementRules {
        let top_n = top_n_override
            .or_else(|| self.rules.as_ref().and_then(|r| r.top_n))
            .unwrap_or(PlacementRules::DEFAULT_RULES.top_n);
        PlacementRules { top_n }
    }
}

pub fn read_config(path: &str) -> TallyResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: TallyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: String) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_column(x: &Option<JSValue>, name: &str) -> TallyResult<usize> {
    if x.is_none() {
        return MissingColumnSnafu { name }.fail();
    }
    let idx = read_js_int(x)?;
    Ok(idx - 1)
}

// 1-based, either as a number or as Excel-style letters ("A", "AB").
fn read_js_int(x: &Option<JSValue>) -> TallyResult<usize> {
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(s.to_ascii_uppercase().chars().fold(0, |acc, c| {
                acc * 26 + (c as usize - 'A' as usize + 1)
            }))
        }
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(idx) if idx >= 1 => Ok(idx),
        _ => ParsingColumnIndexSnafu {
            content: format!("{:?}", x),
        }
        .fail(),
    }
}
