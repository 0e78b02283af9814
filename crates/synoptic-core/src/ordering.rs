use chrono::NaiveDate;
use polars::prelude::*;
use synoptic_parser::{Fraction, HydroPeriod, SiteId};

use crate::error::{PipelineError, Result};
use crate::reshape::{FractionReading, SampleIdentity};
use crate::split::{FlaggedReading, FlowFlag, FlowPoint, NumericReading};

pub const HYDRO_ORDER_COLUMN: &str = "hydro_order";
pub const FRACTION_ORDER_COLUMN: &str = "fraction_order";

/// Rows that can be placed on the hydrologic-period and fraction axes.
pub trait Categorized {
    fn identity(&self) -> &SampleIdentity;

    fn fraction(&self) -> Option<Fraction> {
        None
    }
}

impl Categorized for FractionReading {
    fn identity(&self) -> &SampleIdentity {
        &self.identity
    }

    fn fraction(&self) -> Option<Fraction> {
        Some(self.fraction)
    }
}

impl Categorized for NumericReading {
    fn identity(&self) -> &SampleIdentity {
        &self.identity
    }

    fn fraction(&self) -> Option<Fraction> {
        Some(self.fraction)
    }
}

impl Categorized for FlaggedReading {
    fn identity(&self) -> &SampleIdentity {
        &self.identity
    }

    fn fraction(&self) -> Option<Fraction> {
        Some(self.fraction)
    }
}

impl Categorized for FlowPoint {
    fn identity(&self) -> &SampleIdentity {
        &self.identity
    }
}

impl Categorized for FlowFlag {
    fn identity(&self) -> &SampleIdentity {
        &self.identity
    }
}

fn category_key<T: Categorized>(item: &T) -> (u32, u32, &SiteId, Option<NaiveDate>) {
    let identity = item.identity();
    (
        identity.hydro.map(|h| h.rank()).unwrap_or(u32::MAX),
        item.fraction().map(|f| f.rank()).unwrap_or(0),
        &identity.site,
        identity.date,
    )
}

/// Sorts by period (Rise, Peak, Base), then fraction (TP, PP, TDP, DRP, DOP), then site and date.
/// Same priority as [`with_category_order`]. Rows without a period sort after Base.
pub fn sort_by_category<T: Categorized>(items: &mut [T]) {
    items.sort_by(|a, b| category_key(a).cmp(&category_key(b)));
}

fn rank_column<F>(df: &DataFrame, column: &str, rank: F) -> Result<Vec<Option<u32>>>
where
    F: Fn(&str) -> std::result::Result<u32, String>,
{
    let labels = df.column(column)?.str()?;
    labels
        .into_iter()
        .map(|label| label.map(&rank).transpose())
        .collect::<std::result::Result<Vec<_>, String>>()
        .map_err(|err| PipelineError::Validation(format!("column '{column}': {err}")))
}

/// Adds ordinal `hydro_order` / `fraction_order` columns for whichever of `hydro` and
/// `fraction` the frame carries, then sorts by them (period first).
pub fn with_category_order(df: &DataFrame) -> Result<DataFrame> {
    let has_hydro = df.column("hydro").is_ok();
    let has_fraction = df.column("fraction").is_ok();
    if !has_hydro && !has_fraction {
        return Err(PipelineError::Schema(
            "frame has neither a 'hydro' nor a 'fraction' column to order".to_string(),
        ));
    }

    let mut output = df.clone();
    let mut sort_by: Vec<&str> = Vec::with_capacity(2);

    if has_hydro {
        let ranks = rank_column(df, "hydro", |label| {
            HydroPeriod::try_from(label).map(|period| period.rank())
        })?;
        output.with_column(Series::new(HYDRO_ORDER_COLUMN.into(), ranks))?;
        sort_by.push(HYDRO_ORDER_COLUMN);
    }

    if has_fraction {
        let ranks = rank_column(df, "fraction", |label| {
            Fraction::try_from(label).map(|fraction| fraction.rank())
        })?;
        output.with_column(Series::new(FRACTION_ORDER_COLUMN.into(), ranks))?;
        sort_by.push(FRACTION_ORDER_COLUMN);
    }

    let sorted = output.sort(
        sort_by,
        SortMultipleOptions::default()
            .with_maintain_order(true)
            .with_nulls_last(true),
    )?;
    Ok(sorted)
}
