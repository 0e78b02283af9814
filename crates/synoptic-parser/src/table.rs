use std::collections::HashMap;
use std::fs;
use std::path::Path;

use csv::StringRecord;

use crate::cells::{
    parse_measurement, parse_optional_date, parse_optional_hydro, parse_optional_text, parse_site,
};
use crate::errors::LoadError;
use crate::model::{Fraction, FractionValues, SampleRow, SampleTable};
use crate::schema::{TableKind, FRACTION_COLUMNS};

/// Header name (lowercased) to column position.
#[derive(Debug, Clone)]
pub(crate) struct HeaderIndex {
    lookup: HashMap<String, usize>,
    width: usize,
}

impl HeaderIndex {
    pub(crate) fn new(headers: &StringRecord) -> Self {
        let mut lookup = HashMap::with_capacity(headers.len());
        for (idx, name) in headers.iter().enumerate() {
            let key = name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            lookup.entry(key).or_insert(idx);
        }
        Self {
            lookup,
            width: headers.len(),
        }
    }

    pub(crate) fn find(&self, column: &str) -> Option<usize> {
        self.lookup.get(column).copied()
    }

    pub(crate) fn require(
        &self,
        table: &'static str,
        column: &'static str,
    ) -> Result<usize, LoadError> {
        self.find(column)
            .ok_or(LoadError::Schema { table, column })
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }
}

/// Resolved positions of every column a [`SampleRow`] can be built from.
#[derive(Debug, Clone)]
struct SampleColumns {
    id: Option<usize>,
    site: usize,
    stream: Option<usize>,
    date: Option<usize>,
    hydro: Option<usize>,
    cfs: Option<usize>,
    ls: Option<usize>,
    fractions: Option<[usize; 5]>,
}

impl SampleColumns {
    fn resolve(kind: TableKind, index: &HeaderIndex) -> Result<Self, LoadError> {
        let table = kind.name();
        let lookup = |column: &'static str| -> Result<Option<usize>, LoadError> {
            if kind.is_required(column) {
                index.require(table, column).map(Some)
            } else {
                Ok(index.find(column))
            }
        };

        let fractions = if kind.has_fractions() {
            let mut positions = [0usize; 5];
            for (slot, column) in positions.iter_mut().zip(FRACTION_COLUMNS) {
                *slot = index.require(table, column)?;
            }
            Some(positions)
        } else {
            None
        };

        Ok(Self {
            id: lookup("id")?,
            site: index.require(table, "site")?,
            stream: lookup("stream")?,
            date: lookup("date")?,
            hydro: lookup("hydro")?,
            cfs: lookup("cfs")?,
            ls: lookup("ls")?,
            fractions,
        })
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

pub(crate) fn record_line(record: &StringRecord, row_idx: usize) -> usize {
    record
        .position()
        .map(|pos| pos.line() as usize)
        .unwrap_or(row_idx + 2)
}

/// Reads a sampling table of the given kind from CSV text.
pub fn parse_table(content: &str, kind: TableKind) -> Result<SampleTable, LoadError> {
    let table = kind.name();
    let sentinels = kind.sentinels();
    let mut reader = reader_builder().from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| LoadError::Csv { table, source: err })?
        .clone();
    let index = HeaderIndex::new(&headers);
    let columns = SampleColumns::resolve(kind, &index)?;

    let mut rows = Vec::new();
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.map_err(|err| LoadError::Csv { table, source: err })?;
        let line = record_line(&record, row_idx);

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if record.len() != index.width() {
            return Err(LoadError::parse(
                table,
                line,
                "*",
                format!(
                    "expected {} columns but found {}",
                    index.width(),
                    record.len()
                ),
            ));
        }

        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let text = |idx: Option<usize>| idx.and_then(|i| parse_optional_text(cell(i)));
        let measurement = |idx: Option<usize>, column: &str| match idx {
            Some(i) => parse_measurement(table, cell(i), line, column, sentinels),
            None => Ok(None),
        };

        let site = parse_site(table, cell(columns.site), line, "site")?;
        let mut row = SampleRow::new(line, site);
        row.id = text(columns.id);
        row.stream = text(columns.stream);
        row.date = match columns.date {
            Some(i) => parse_optional_date(table, cell(i), line, "date")?,
            None => None,
        };
        row.hydro = match columns.hydro {
            Some(i) => parse_optional_hydro(table, cell(i), line, "hydro")?,
            None => None,
        };
        row.cfs = measurement(columns.cfs, "cfs")?;
        row.ls = measurement(columns.ls, "ls")?;

        if let Some(positions) = columns.fractions {
            let mut values = FractionValues::default();
            for (fraction, idx) in Fraction::ORDER.into_iter().zip(positions) {
                let parsed =
                    parse_measurement(table, cell(idx), line, fraction.column_name(), sentinels)?;
                values.set(fraction, parsed);
            }
            row.fractions = Some(values);
        }

        rows.push(row);
    }

    if rows.is_empty() {
        return Err(LoadError::EmptyData { table });
    }

    Ok(SampleTable::new(kind, rows))
}

pub(crate) fn read_input(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a sampling table from disk. A missing path is reported as [`LoadError::MissingFile`].
pub fn load_table(path: impl AsRef<Path>, kind: TableKind) -> Result<SampleTable, LoadError> {
    let content = read_input(path.as_ref())?;
    parse_table(&content, kind)
}
