use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::LoadError;
use crate::model::{HydroPeriod, Measurement, Sentinel, SentinelSet, SiteId};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

pub(crate) fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed.eq_ignore_ascii_case("nan")
}

pub(crate) fn parse_optional_text(value: &str) -> Option<String> {
    if is_missing(value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

pub(crate) fn parse_site(
    table: &'static str,
    value: &str,
    line: usize,
    column: &str,
) -> Result<SiteId, LoadError> {
    SiteId::try_from(value).map_err(|err| LoadError::parse(table, line, column, err))
}

/// Reads a measurement cell. Sentinel tokens are only accepted when the table allows them.
pub(crate) fn parse_measurement(
    table: &'static str,
    value: &str,
    line: usize,
    column: &str,
    sentinels: SentinelSet,
) -> Result<Option<Measurement>, LoadError> {
    if is_missing(value) {
        return Ok(None);
    }
    let trimmed = value.trim();

    if let Some(sentinel) = Sentinel::from_token(trimmed) {
        if sentinels.contains(sentinel) {
            return Ok(Some(Measurement::Sentinel(sentinel)));
        }
        return Err(LoadError::parse(
            table,
            line,
            column,
            format!(
                "sentinel '{sentinel}' is not accepted here (allowed: {:?})",
                sentinels.tokens()
            ),
        ));
    }

    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(Some(Measurement::Numeric(parsed))),
        Ok(parsed) => Err(LoadError::parse(
            table,
            line,
            column,
            format!("non-finite value {parsed}"),
        )),
        Err(err) => Err(LoadError::parse(
            table,
            line,
            column,
            format!("failed to parse '{trimmed}' as float: {err}"),
        )),
    }
}

pub(crate) fn parse_optional_f64(
    table: &'static str,
    value: &str,
    line: usize,
    column: &str,
) -> Result<Option<f64>, LoadError> {
    if is_missing(value) {
        return Ok(None);
    }
    let trimmed = value.trim();
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
        Ok(parsed) => Err(LoadError::parse(
            table,
            line,
            column,
            format!("non-finite value {parsed}"),
        )),
        Err(err) => Err(LoadError::parse(
            table,
            line,
            column,
            format!("failed to parse '{trimmed}' as float: {err}"),
        )),
    }
}

pub(crate) fn parse_required_f64(
    table: &'static str,
    value: &str,
    line: usize,
    column: &str,
) -> Result<f64, LoadError> {
    parse_optional_f64(table, value, line, column)?
        .ok_or_else(|| LoadError::parse(table, line, column, "missing value"))
}

pub(crate) fn parse_optional_date(
    table: &'static str,
    value: &str,
    line: usize,
    column: &str,
) -> Result<Option<NaiveDate>, LoadError> {
    if is_missing(value) {
        return Ok(None);
    }
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(Some(date));
        }
    }
    Err(LoadError::parse(
        table,
        line,
        column,
        format!("invalid date '{trimmed}'"),
    ))
}

/// Like [`parse_optional_date`] but also accepts a date-time, keeping the date part.
pub(crate) fn parse_required_day(
    table: &'static str,
    value: &str,
    line: usize,
    column: &str,
) -> Result<NaiveDate, LoadError> {
    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt.date());
        }
    }
    parse_optional_date(table, value, line, column)?
        .ok_or_else(|| LoadError::parse(table, line, column, "missing date"))
}

pub(crate) fn parse_optional_hydro(
    table: &'static str,
    value: &str,
    line: usize,
    column: &str,
) -> Result<Option<HydroPeriod>, LoadError> {
    if is_missing(value) {
        return Ok(None);
    }
    HydroPeriod::try_from(value)
        .map(Some)
        .map_err(|err| LoadError::parse(table, line, column, err))
}
