use std::collections::BTreeMap;

use synoptic_parser::{
    Fraction, FractionValues, HydroPeriod, Measurement, SampleRow, SampleTable, Sentinel, SiteId,
    TableKind,
};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::site_filter::{exclude_site, SiteKeyed};

/// Per (site, hydrologic period) average over both sampling years.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteMean {
    pub site: SiteId,
    pub stream: Option<String>,
    pub hydro: HydroPeriod,
    /// Number of sample rows that fell in this group.
    pub samples: usize,
    pub cfs: Option<Measurement>,
    pub ls: Option<Measurement>,
    pub fractions: Option<FractionValues>,
}

impl SiteKeyed for SiteMean {
    fn site(&self) -> &SiteId {
        &self.site
    }
}

/// Averages the numeric observations only.
///
/// With no numeric observation, the group becomes a sentinel: the most frequent one, with ties
/// going to `dry`, then `no_access`, then `lost`. With nothing defined at all, it stays missing.
pub fn mean_measurement<I>(values: I) -> Option<Measurement>
where
    I: IntoIterator<Item = Option<Measurement>>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut sentinel_counts = [0usize; 3];

    for value in values.into_iter().flatten() {
        match value {
            Measurement::Numeric(v) => {
                sum += v;
                count += 1;
            }
            Measurement::Sentinel(sentinel) => {
                let slot = match sentinel {
                    Sentinel::Dry => 0,
                    Sentinel::NoAccess => 1,
                    Sentinel::Lost => 2,
                };
                sentinel_counts[slot] += 1;
            }
        }
    }

    if count > 0 {
        return Some(Measurement::Numeric(sum / count as f64));
    }

    Sentinel::ALL
        .into_iter()
        .zip(sentinel_counts)
        .filter(|(_, n)| *n > 0)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(sentinel, _)| Measurement::Sentinel(sentinel))
}

#[derive(Default)]
struct GroupAccumulator {
    stream: Option<String>,
    samples: usize,
    cfs: Vec<Option<Measurement>>,
    ls: Vec<Option<Measurement>>,
    fractions: [Vec<Option<Measurement>>; 5],
    has_fractions: bool,
}

impl GroupAccumulator {
    fn push(&mut self, row: &SampleRow) {
        if self.stream.is_none() {
            self.stream = row.stream.clone();
        }
        self.samples += 1;
        self.cfs.push(row.cfs);
        self.ls.push(row.ls);
        if let Some(values) = row.fractions {
            self.has_fractions = true;
            for (fraction, value) in values.iter() {
                self.fractions[fraction.rank() as usize].push(value);
            }
        }
    }

    fn finish(self, site: SiteId, hydro: HydroPeriod) -> SiteMean {
        let fractions = if self.has_fractions {
            let mut values = FractionValues::default();
            for (fraction, observed) in Fraction::ORDER.into_iter().zip(self.fractions) {
                values.set(fraction, mean_measurement(observed));
            }
            Some(values)
        } else {
            None
        };

        SiteMean {
            site,
            stream: self.stream,
            hydro,
            samples: self.samples,
            cfs: mean_measurement(self.cfs),
            ls: mean_measurement(self.ls),
            fractions,
        }
    }
}

/// Groups a per-sample table by (site, hydrologic period) and averages every measurement column.
///
/// Output is ordered by site, then Rise, Peak, Base.
pub fn mean_by_period(table: &SampleTable) -> Result<Vec<SiteMean>> {
    if table.kind.is_mean_table() {
        return Err(PipelineError::Schema(format!(
            "{} is already averaged by period",
            table.kind
        )));
    }

    let mut groups: BTreeMap<(SiteId, HydroPeriod), GroupAccumulator> = BTreeMap::new();
    for row in &table.rows {
        let hydro = row.hydro.ok_or_else(|| {
            PipelineError::Validation(format!(
                "{} line {} (site {}) has no hydrologic period to group by",
                table.kind, row.line, row.site
            ))
        })?;
        groups
            .entry((row.site.clone(), hydro))
            .or_default()
            .push(row);
    }

    let means: Vec<SiteMean> = groups
        .into_iter()
        .map(|((site, hydro), acc)| acc.finish(site, hydro))
        .collect();

    debug!(
        table = table.kind.name(),
        rows = table.rows.len(),
        groups = means.len(),
        "averaged by site and period"
    );

    Ok(means)
}

/// Drops `excluded`, then averages by period.
pub fn site_means(table: &SampleTable, excluded: &SiteId) -> Result<Vec<SiteMean>> {
    mean_by_period(&exclude_site(table, excluded))
}

/// The mean-table kind that an averaged per-sample table corresponds to.
pub fn means_kind(kind: TableKind) -> TableKind {
    match kind {
        TableKind::Streamflow | TableKind::FlowMeans => TableKind::FlowMeans,
        TableKind::Concentration | TableKind::ConcMeans => TableKind::ConcMeans,
        TableKind::Load | TableKind::LoadMeans => TableKind::LoadMeans,
    }
}

/// Re-expresses computed means as a mean table so they flow through the same reshape and export.
/// Row numbers are positions in `means`, starting at 1.
pub fn means_table(source: TableKind, means: &[SiteMean]) -> SampleTable {
    let rows = means
        .iter()
        .enumerate()
        .map(|(idx, mean)| {
            let mut row = SampleRow::new(idx + 1, mean.site.clone());
            row.stream = mean.stream.clone();
            row.hydro = Some(mean.hydro);
            row.cfs = mean.cfs;
            row.ls = mean.ls;
            row.fractions = mean.fractions;
            row
        })
        .collect();
    SampleTable::new(means_kind(source), rows)
}
