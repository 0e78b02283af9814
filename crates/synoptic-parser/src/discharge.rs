use std::path::Path;

use crate::cells::{parse_optional_f64, parse_required_day, parse_required_f64};
use crate::errors::LoadError;
use crate::model::DischargeRecord;
use crate::schema::DISCHARGE_COLUMNS;
use crate::table::{read_input, record_line, HeaderIndex};

const TABLE: &str = "discharge";

/// Reads the long-term `DATE, CFS, TP` discharge record.
pub fn parse_discharge(content: &str) -> Result<Vec<DischargeRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| LoadError::Csv {
            table: TABLE,
            source: err,
        })?
        .clone();
    let index = HeaderIndex::new(&headers);
    let [date_col, cfs_col, tp_col] = DISCHARGE_COLUMNS;
    let date_idx = index.require(TABLE, date_col)?;
    let cfs_idx = index.require(TABLE, cfs_col)?;
    let tp_idx = index.require(TABLE, tp_col)?;

    let mut records = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| LoadError::Csv {
            table: TABLE,
            source: err,
        })?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = record_line(&record, row_idx);
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        records.push(DischargeRecord {
            line,
            date: parse_required_day(TABLE, cell(date_idx), line, "DATE")?,
            cfs: parse_required_f64(TABLE, cell(cfs_idx), line, "CFS")?,
            tp: parse_optional_f64(TABLE, cell(tp_idx), line, "TP")?,
        });
    }

    if records.is_empty() {
        return Err(LoadError::EmptyData { table: TABLE });
    }

    Ok(records)
}

pub fn load_discharge(path: impl AsRef<Path>) -> Result<Vec<DischargeRecord>, LoadError> {
    let content = read_input(path.as_ref())?;
    parse_discharge(&content)
}
