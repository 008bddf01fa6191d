use calamine::{open_workbook, DataType, Reader, Xlsx};

use crate::tally::{
    io_common::{make_default_id, parse_rank, RankRow},
    *,
};

pub fn read_xlsx_rows(path: &str, cfs: &FileSource) -> TallyResult<Vec<RankRow>> {
    let default_id = make_default_id(path);
    let columns = cfs.columns()?;
    let first_row = cfs.first_row_index()?;

    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match cfs.excel_worksheet_name.as_deref() {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?,
    }
    .context(OpeningExcelSnafu { path })?;

    // The range starts at the first non-empty cell, not necessarily at A1.
    let (start_row, start_col) = wrange.start().unwrap_or((0, 0));
    let start_col = start_col as usize;

    let mut res: Vec<RankRow> = Vec::new();
    for (idx, row) in wrange.rows().enumerate() {
        let lineno = start_row as usize + idx + 1;
        if lineno < first_row {
            continue;
        }
        debug!("read_xlsx_rows: lineno: {:?} row: {:?}", lineno, row);

        let cell = |column: usize| -> TallyResult<String> {
            if column < start_col {
                return Ok(String::new());
            }
            match row.get(column - start_col) {
                Some(c) => read_cell(c, lineno),
                None => Ok(String::new()),
            }
        };

        let candidate = cell(columns.candidate)?;
        if candidate.is_empty() {
            warn!("read_xlsx_rows: {}: line {}: no candidate, skipping", path, lineno);
            continue;
        }
        let rank = parse_rank(cell(columns.rank)?.as_str(), lineno)?;
        let voter = match cell(columns.voter)? {
            v if v.is_empty() => default_id(lineno),
            v => v,
        };
        let race = match columns.race {
            Some(race_idx) => Some(cell(race_idx)?),
            None => None,
        };

        res.push(RankRow {
            lineno,
            race,
            voter,
            candidate,
            rank,
        });
    }
    Ok(res)
}

// Ids and ranks are often typed as numbers by spreadsheets.
fn read_cell(cell: &DataType, lineno: usize) -> TallyResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        DataType::Empty => Ok(String::new()),
        _ => ExcelWrongCellTypeSnafu {
            lineno,
            content: format!("{:?}", cell),
        }
        .fail(),
    }
}
