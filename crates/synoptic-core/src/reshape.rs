use chrono::NaiveDate;
use synoptic_parser::{Fraction, HydroPeriod, Measurement, SampleRow, SampleTable, SiteId};

use crate::error::{PipelineError, Result};
use crate::site_filter::SiteKeyed;

/// The identifier columns carried onto every long-format row.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleIdentity {
    pub id: Option<String>,
    pub site: SiteId,
    pub stream: Option<String>,
    pub date: Option<NaiveDate>,
    pub hydro: Option<HydroPeriod>,
    pub cfs: Option<Measurement>,
    pub ls: Option<Measurement>,
}

impl From<&SampleRow> for SampleIdentity {
    fn from(row: &SampleRow) -> Self {
        Self {
            id: row.id.clone(),
            site: row.site.clone(),
            stream: row.stream.clone(),
            date: row.date,
            hydro: row.hydro,
            cfs: row.cfs,
            ls: row.ls,
        }
    }
}

/// One (sample row, fraction) pair after the wide-to-long reshape.
#[derive(Debug, Clone, PartialEq)]
pub struct FractionReading {
    pub identity: SampleIdentity,
    pub fraction: Fraction,
    pub value: Option<Measurement>,
}

impl SiteKeyed for FractionReading {
    fn site(&self) -> &SiteId {
        &self.identity.site
    }
}

/// Gathers the five fraction columns into `(fraction, value)` rows.
///
/// Every input row yields exactly five readings, in TP, PP, TDP, DRP, DOP order.
/// Sentinels and missing cells are passed through untouched.
pub fn gather_fractions(table: &SampleTable) -> Result<Vec<FractionReading>> {
    if !table.kind.has_fractions() {
        return Err(PipelineError::Schema(format!(
            "{} table has no phosphorus fraction columns to reshape",
            table.kind
        )));
    }

    let mut readings = Vec::with_capacity(table.rows.len() * Fraction::ORDER.len());
    for row in &table.rows {
        let values = row.fractions.ok_or_else(|| {
            PipelineError::Schema(format!(
                "{} line {} is missing its fraction columns",
                table.kind, row.line
            ))
        })?;
        let identity = SampleIdentity::from(row);
        readings.extend(values.iter().map(|(fraction, value)| FractionReading {
            identity: identity.clone(),
            fraction,
            value,
        }));
    }

    Ok(readings)
}
