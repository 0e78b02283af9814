use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use polars::io::parquet::write::{ParquetCompression, ParquetWriter};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use synoptic_parser::{DischargeRecord, Fraction, Measurement, SampleTable};

use crate::aggregate::SiteMean;
use crate::error::Result;
use crate::reshape::{FractionReading, SampleIdentity};
use crate::split::{FlaggedReading, FlowFlag, FlowPoint, NumericReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

/// A measurement split into a nullable float column and a `<name>_status` label column.
struct MeasurementColumn {
    name: &'static str,
    values: Vec<Option<f64>>,
    status: Vec<Option<&'static str>>,
}

impl MeasurementColumn {
    fn new(name: &'static str, capacity: usize) -> Self {
        Self {
            name,
            values: Vec::with_capacity(capacity),
            status: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, value: Option<Measurement>) {
        self.values.push(value.and_then(|m| m.numeric()));
        self.status.push(value.map(|m| m.status()));
    }

    fn into_columns(self) -> [Column; 2] {
        [
            Series::new(self.name.into(), self.values).into(),
            Series::new(format!("{}_status", self.name).into(), self.status).into(),
        ]
    }
}

struct IdentityColumns {
    id: Vec<Option<String>>,
    site: Vec<String>,
    stream_group: Vec<String>,
    stream: Vec<Option<String>>,
    date: Vec<Option<NaiveDate>>,
    hydro: Vec<Option<&'static str>>,
    cfs: MeasurementColumn,
    ls: MeasurementColumn,
}

impl IdentityColumns {
    fn new(capacity: usize) -> Self {
        Self {
            id: Vec::with_capacity(capacity),
            site: Vec::with_capacity(capacity),
            stream_group: Vec::with_capacity(capacity),
            stream: Vec::with_capacity(capacity),
            date: Vec::with_capacity(capacity),
            hydro: Vec::with_capacity(capacity),
            cfs: MeasurementColumn::new("cfs", capacity),
            ls: MeasurementColumn::new("ls", capacity),
        }
    }

    fn push(&mut self, identity: &SampleIdentity) {
        self.id.push(identity.id.clone());
        self.site.push(identity.site.to_string());
        self.stream_group
            .push(identity.site.stream_group().to_string());
        self.stream.push(identity.stream.clone());
        self.date.push(identity.date);
        self.hydro.push(identity.hydro.map(|h| h.label()));
        self.cfs.push(identity.cfs);
        self.ls.push(identity.ls);
    }

    fn into_columns(self) -> Vec<Column> {
        let mut columns: Vec<Column> = vec![
            Series::new("id".into(), self.id).into(),
            Series::new("site".into(), self.site).into(),
            Series::new("stream_group".into(), self.stream_group).into(),
            Series::new("stream".into(), self.stream).into(),
            Series::new("date".into(), self.date).into(),
            Series::new("hydro".into(), self.hydro).into(),
        ];
        columns.extend(self.cfs.into_columns());
        columns.extend(self.ls.into_columns());
        columns
    }
}

/// Long-format readings, sentinels and missing cells included.
pub fn readings_frame(readings: &[FractionReading]) -> Result<DataFrame> {
    let mut identity = IdentityColumns::new(readings.len());
    let mut fraction = Vec::with_capacity(readings.len());
    let mut value = MeasurementColumn::new("value", readings.len());

    for reading in readings {
        identity.push(&reading.identity);
        fraction.push(reading.fraction.label());
        value.push(reading.value);
    }

    let mut columns = identity.into_columns();
    columns.push(Series::new("fraction".into(), fraction).into());
    columns.extend(value.into_columns());
    Ok(DataFrame::new(columns)?)
}

/// Readings with a numeric value; `value` is a non-null Float64 column.
pub fn numeric_frame(readings: &[NumericReading]) -> Result<DataFrame> {
    let mut identity = IdentityColumns::new(readings.len());
    let mut fraction = Vec::with_capacity(readings.len());
    let mut value = Vec::with_capacity(readings.len());

    for reading in readings {
        identity.push(&reading.identity);
        fraction.push(reading.fraction.label());
        value.push(reading.value);
    }

    let mut columns = identity.into_columns();
    columns.push(Series::new("fraction".into(), fraction).into());
    columns.push(Series::new("value".into(), value).into());
    Ok(DataFrame::new(columns)?)
}

/// Readings recorded as dry / no access / lost, for the annotation layer.
pub fn flagged_frame(readings: &[FlaggedReading]) -> Result<DataFrame> {
    let mut identity = IdentityColumns::new(readings.len());
    let mut fraction = Vec::with_capacity(readings.len());
    let mut sentinel = Vec::with_capacity(readings.len());

    for reading in readings {
        identity.push(&reading.identity);
        fraction.push(reading.fraction.label());
        sentinel.push(reading.sentinel.token());
    }

    let mut columns = identity.into_columns();
    columns.push(Series::new("fraction".into(), fraction).into());
    columns.push(Series::new("sentinel".into(), sentinel).into());
    Ok(DataFrame::new(columns)?)
}

pub fn flow_points_frame(points: &[FlowPoint]) -> Result<DataFrame> {
    let mut identity = IdentityColumns::new(points.len());
    for point in points {
        identity.push(&point.identity);
    }
    Ok(DataFrame::new(identity.into_columns())?)
}

pub fn flow_flags_frame(flags: &[FlowFlag]) -> Result<DataFrame> {
    let mut identity = IdentityColumns::new(flags.len());
    let mut sentinel = Vec::with_capacity(flags.len());
    for flag in flags {
        identity.push(&flag.identity);
        sentinel.push(flag.sentinel.token());
    }
    let mut columns = identity.into_columns();
    columns.push(Series::new("sentinel".into(), sentinel).into());
    Ok(DataFrame::new(columns)?)
}

/// Wide frame of a loaded or computed table: identity columns plus one pair per fraction.
pub fn table_frame(table: &SampleTable) -> Result<DataFrame> {
    let rows = table.rows.len();
    let mut identity = IdentityColumns::new(rows);
    let mut fractions: Vec<MeasurementColumn> = Fraction::ORDER
        .iter()
        .map(|fraction| MeasurementColumn::new(fraction.column_name(), rows))
        .collect();

    for row in &table.rows {
        identity.push(&SampleIdentity::from(row));
        if let Some(values) = row.fractions {
            for (column, (_, value)) in fractions.iter_mut().zip(values.iter()) {
                column.push(value);
            }
        }
    }

    let mut columns = identity.into_columns();
    if table.kind.has_fractions() {
        for column in fractions {
            columns.extend(column.into_columns());
        }
    }
    Ok(DataFrame::new(columns)?)
}

pub fn site_means_frame(means: &[SiteMean]) -> Result<DataFrame> {
    let mut site = Vec::with_capacity(means.len());
    let mut stream_group = Vec::with_capacity(means.len());
    let mut hydro = Vec::with_capacity(means.len());
    let mut samples = Vec::with_capacity(means.len());
    let mut cfs = MeasurementColumn::new("cfs", means.len());
    let mut ls = MeasurementColumn::new("ls", means.len());
    let mut fractions: Vec<MeasurementColumn> = Fraction::ORDER
        .iter()
        .map(|fraction| MeasurementColumn::new(fraction.column_name(), means.len()))
        .collect();
    let has_fractions = means.iter().any(|mean| mean.fractions.is_some());

    for mean in means {
        site.push(mean.site.to_string());
        stream_group.push(mean.site.stream_group().to_string());
        hydro.push(mean.hydro.label());
        samples.push(mean.samples as u32);
        cfs.push(mean.cfs);
        ls.push(mean.ls);
        for (idx, column) in fractions.iter_mut().enumerate() {
            column.push(mean.fractions.and_then(|v| v.get(Fraction::ORDER[idx])));
        }
    }

    let mut columns: Vec<Column> = vec![
        Series::new("site".into(), site).into(),
        Series::new("stream_group".into(), stream_group).into(),
        Series::new("hydro".into(), hydro).into(),
        Series::new("samples".into(), samples).into(),
    ];
    columns.extend(cfs.into_columns());
    columns.extend(ls.into_columns());
    if has_fractions {
        for column in fractions {
            columns.extend(column.into_columns());
        }
    }
    Ok(DataFrame::new(columns)?)
}

pub fn discharge_frame(records: &[DischargeRecord]) -> Result<DataFrame> {
    let date: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    let cfs: Vec<f64> = records.iter().map(|r| r.cfs).collect();
    let tp: Vec<Option<f64>> = records.iter().map(|r| r.tp).collect();

    Ok(DataFrame::new(vec![
        Series::new("date".into(), date).into(),
        Series::new("cfs".into(), cfs).into(),
        Series::new("tp".into(), tp).into(),
    ])?)
}

/// Writes `df` to `path`, creating parent directories.
pub fn write_frame(df: &mut DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    match format {
        OutputFormat::Csv => {
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        OutputFormat::Parquet => {
            ParquetWriter::new(&mut file)
                .with_compression(ParquetCompression::Zstd(None))
                .finish(df)?;
        }
    }
    Ok(())
}
