use synoptic_parser::{Fraction, Measurement, SampleTable, Sentinel, SiteId};

use crate::reshape::{FractionReading, SampleIdentity};
use crate::site_filter::SiteKeyed;

#[derive(Debug, Clone, PartialEq)]
pub struct NumericReading {
    pub identity: SampleIdentity,
    pub fraction: Fraction,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlaggedReading {
    pub identity: SampleIdentity,
    pub fraction: Fraction,
    pub sentinel: Sentinel,
}

impl SiteKeyed for NumericReading {
    fn site(&self) -> &SiteId {
        &self.identity.site
    }
}

impl SiteKeyed for FlaggedReading {
    fn site(&self) -> &SiteId {
        &self.identity.site
    }
}

/// Quantitative readings and sentinel readings, kept apart so each can be drawn as its own layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitReadings {
    pub numeric: Vec<NumericReading>,
    pub flagged: Vec<FlaggedReading>,
    /// Readings with no value at all; they appear in neither output.
    pub missing: usize,
}

impl SplitReadings {
    pub fn total(&self) -> usize {
        self.numeric.len() + self.flagged.len() + self.missing
    }

    pub fn count_sentinel(&self, sentinel: Sentinel) -> usize {
        self.flagged
            .iter()
            .filter(|reading| reading.sentinel == sentinel)
            .count()
    }
}

pub fn split_readings(readings: Vec<FractionReading>) -> SplitReadings {
    let mut split = SplitReadings::default();
    for reading in readings {
        match reading.value {
            Some(Measurement::Numeric(value)) => split.numeric.push(NumericReading {
                identity: reading.identity,
                fraction: reading.fraction,
                value,
            }),
            Some(Measurement::Sentinel(sentinel)) => split.flagged.push(FlaggedReading {
                identity: reading.identity,
                fraction: reading.fraction,
                sentinel,
            }),
            None => split.missing += 1,
        }
    }
    split
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowPoint {
    pub identity: SampleIdentity,
    pub ls: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowFlag {
    pub identity: SampleIdentity,
    pub sentinel: Sentinel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowSplit {
    pub numeric: Vec<FlowPoint>,
    pub flagged: Vec<FlowFlag>,
    pub missing: usize,
}

impl FlowSplit {
    pub fn total(&self) -> usize {
        self.numeric.len() + self.flagged.len() + self.missing
    }
}

/// Same policy as [`split_readings`], applied to the streamflow (`ls`) column of each row.
pub fn split_flow(table: &SampleTable) -> FlowSplit {
    let mut split = FlowSplit::default();
    for row in &table.rows {
        let identity = SampleIdentity::from(row);
        match row.ls {
            Some(Measurement::Numeric(ls)) => split.numeric.push(FlowPoint { identity, ls }),
            Some(Measurement::Sentinel(sentinel)) => {
                split.flagged.push(FlowFlag { identity, sentinel })
            }
            None => split.missing += 1,
        }
    }
    split
}
