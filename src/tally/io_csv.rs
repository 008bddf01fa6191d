// Primitives for reading rank rows from CSV files.

use csv::StringRecord;

use crate::tally::{
    io_common::{make_default_id, parse_rank, RankRow},
    *,
};

pub fn read_csv_rows(path: &str, cfs: &FileSource) -> TallyResult<Vec<RankRow>> {
    let default_id = make_default_id(path);
    let columns = cfs.columns()?;
    // The index starts at 1 to respect most conventions in the excel world
    let first_row = cfs.first_row_index()?;

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;

    let mut res: Vec<RankRow> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        if lineno < first_row {
            continue;
        }
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("read_csv_rows: lineno: {:?} row: {:?}", lineno, line);

        let candidate = get_cell(&line, columns.candidate, lineno)?;
        if candidate.is_empty() {
            warn!("read_csv_rows: {}: line {}: no candidate, skipping", path, lineno);
            continue;
        }
        let rank = parse_rank(get_cell(&line, columns.rank, lineno)?, lineno)?;
        let voter = match get_cell(&line, columns.voter, lineno)? {
            "" => default_id(lineno),
            v => v.to_string(),
        };
        let race = match columns.race {
            Some(race_idx) => Some(get_cell(&line, race_idx, lineno)?.to_string()),
            None => None,
        };

        res.push(RankRow {
            lineno,
            race,
            voter,
            candidate: candidate.to_string(),
            rank,
        });
    }
    Ok(res)
}

fn get_cell(line: &StringRecord, column: usize, lineno: usize) -> TallyResult<&str> {
    line.get(column).map(|s| s.trim()).context(LineTooShortSnafu {
        lineno,
        column: column + 1,
    })
}
