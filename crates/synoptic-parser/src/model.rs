use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schema::TableKind;

/// A non-numeric outcome recorded in place of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel {
    Dry,
    NoAccess,
    Lost,
}

impl Sentinel {
    pub const ALL: [Sentinel; 3] = [Sentinel::Dry, Sentinel::NoAccess, Sentinel::Lost];

    pub fn token(&self) -> &'static str {
        match self {
            Sentinel::Dry => "dry",
            Sentinel::NoAccess => "no_access",
            Sentinel::Lost => "lost",
        }
    }

    pub fn from_token(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Sentinel::ALL
            .into_iter()
            .find(|sentinel| trimmed.eq_ignore_ascii_case(sentinel.token()))
    }

    const fn bit(self) -> u8 {
        match self {
            Sentinel::Dry => 0b001,
            Sentinel::NoAccess => 0b010,
            Sentinel::Lost => 0b100,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// The sentinel tokens a given input file is allowed to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SentinelSet(u8);

impl SentinelSet {
    pub const EMPTY: SentinelSet = SentinelSet(0);

    pub const fn with(self, sentinel: Sentinel) -> Self {
        SentinelSet(self.0 | sentinel.bit())
    }

    pub fn contains(&self, sentinel: Sentinel) -> bool {
        self.0 & sentinel.bit() != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Sentinel> + '_ {
        Sentinel::ALL
            .into_iter()
            .filter(move |sentinel| self.contains(*sentinel))
    }

    pub fn tokens(&self) -> Vec<&'static str> {
        self.iter().map(|sentinel| sentinel.token()).collect()
    }
}

impl FromIterator<Sentinel> for SentinelSet {
    fn from_iter<I: IntoIterator<Item = Sentinel>>(iter: I) -> Self {
        iter.into_iter().fold(SentinelSet::EMPTY, SentinelSet::with)
    }
}

/// A single measured quantity: either a number or a tagged sentinel.
///
/// Absent cells are modelled as `Option<Measurement>::None`, never as a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Measurement {
    Numeric(f64),
    Sentinel(Sentinel),
}

impl Measurement {
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Measurement::Numeric(value) => Some(*value),
            Measurement::Sentinel(_) => None,
        }
    }

    pub fn sentinel(&self) -> Option<Sentinel> {
        match self {
            Measurement::Numeric(_) => None,
            Measurement::Sentinel(sentinel) => Some(*sentinel),
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            Measurement::Numeric(_) => "numeric",
            Measurement::Sentinel(sentinel) => sentinel.token(),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Numeric(value) => write!(f, "{value}"),
            Measurement::Sentinel(sentinel) => f.write_str(sentinel.token()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SiteId(String);

impl SiteId {
    pub fn new(value: &str) -> Result<Self, String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("missing site identifier".to_string());
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("invalid site identifier '{trimmed}'"));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First letter of the site identifier: `M` for Main Creek, `S` for Spring Creek.
    pub fn stream_group(&self) -> char {
        self.0.chars().next().unwrap_or('?')
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for SiteId {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        SiteId::new(value)
    }
}

/// Phase of the snowmelt-driven discharge cycle. Ordering follows the cycle, not the alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HydroPeriod {
    Rise,
    Peak,
    Base,
}

impl HydroPeriod {
    pub const ORDER: [HydroPeriod; 3] = [HydroPeriod::Rise, HydroPeriod::Peak, HydroPeriod::Base];

    pub fn label(&self) -> &'static str {
        match self {
            HydroPeriod::Rise => "Rise",
            HydroPeriod::Peak => "Peak",
            HydroPeriod::Base => "Base",
        }
    }

    pub fn rank(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for HydroPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for HydroPeriod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        HydroPeriod::ORDER
            .into_iter()
            .find(|period| trimmed.eq_ignore_ascii_case(period.label()))
            .ok_or_else(|| format!("unknown hydrologic period '{trimmed}'"))
    }
}

/// Phosphorus fraction. TP = TDP + PP and TDP = DRP + DOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fraction {
    TP,
    PP,
    TDP,
    DRP,
    DOP,
}

impl Fraction {
    pub const ORDER: [Fraction; 5] = [
        Fraction::TP,
        Fraction::PP,
        Fraction::TDP,
        Fraction::DRP,
        Fraction::DOP,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Fraction::TP => "TP",
            Fraction::PP => "PP",
            Fraction::TDP => "TDP",
            Fraction::DRP => "DRP",
            Fraction::DOP => "DOP",
        }
    }

    pub fn column_name(&self) -> &'static str {
        match self {
            Fraction::TP => "tp",
            Fraction::PP => "pp",
            Fraction::TDP => "tdp",
            Fraction::DRP => "drp",
            Fraction::DOP => "dop",
        }
    }

    pub fn rank(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for Fraction {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        Fraction::ORDER
            .into_iter()
            .find(|fraction| trimmed.eq_ignore_ascii_case(fraction.label()))
            .ok_or_else(|| format!("unknown phosphorus fraction '{trimmed}'"))
    }
}

/// The five fraction cells of one row, indexed by [`Fraction`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FractionValues([Option<Measurement>; 5]);

impl FractionValues {
    pub fn get(&self, fraction: Fraction) -> Option<Measurement> {
        self.0[fraction.rank() as usize]
    }

    pub fn set(&mut self, fraction: Fraction, value: Option<Measurement>) {
        self.0[fraction.rank() as usize] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fraction, Option<Measurement>)> + '_ {
        Fraction::ORDER
            .into_iter()
            .map(move |fraction| (fraction, self.get(fraction)))
    }
}

/// One measurement event (or one pre-averaged site/period row for the mean tables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    /// 1-based line in the source file.
    pub line: usize,
    pub id: Option<String>,
    pub site: SiteId,
    pub stream: Option<String>,
    pub date: Option<NaiveDate>,
    pub hydro: Option<HydroPeriod>,
    pub cfs: Option<Measurement>,
    pub ls: Option<Measurement>,
    pub fractions: Option<FractionValues>,
}

impl SampleRow {
    pub fn new(line: usize, site: SiteId) -> Self {
        Self {
            line,
            id: None,
            site,
            stream: None,
            date: None,
            hydro: None,
            cfs: None,
            ls: None,
            fractions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    pub kind: TableKind,
    pub rows: Vec<SampleRow>,
}

impl SampleTable {
    pub fn new(kind: TableKind, rows: Vec<SampleRow>) -> Self {
        Self { kind, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row of the long-term discharge record used for the hydrograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DischargeRecord {
    pub line: usize,
    pub date: NaiveDate,
    pub cfs: f64,
    pub tp: Option<f64>,
}
