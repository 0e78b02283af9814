use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Sentinel, SentinelSet};

pub const SAMPLE_COLUMNS: [&str; 7] = ["id", "site", "stream", "date", "hydro", "cfs", "ls"];
pub const MEAN_KEY_COLUMNS: [&str; 2] = ["site", "hydro"];
pub const FRACTION_COLUMNS: [&str; 5] = ["tp", "pp", "tdp", "drp", "dop"];
pub const DISCHARGE_COLUMNS: [&str; 3] = ["date", "cfs", "tp"];

/// Which input file a table was read from. Fixes its columns and accepted sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Streamflow,
    Concentration,
    Load,
    FlowMeans,
    ConcMeans,
    LoadMeans,
}

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Streamflow,
        TableKind::Concentration,
        TableKind::Load,
        TableKind::FlowMeans,
        TableKind::ConcMeans,
        TableKind::LoadMeans,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Streamflow => "streamflow",
            TableKind::Concentration => "concentration",
            TableKind::Load => "load",
            TableKind::FlowMeans => "flowmeans",
            TableKind::ConcMeans => "concmeans",
            TableKind::LoadMeans => "loadmeans",
        }
    }

    pub fn sentinels(&self) -> SentinelSet {
        match self {
            TableKind::Streamflow => SentinelSet::EMPTY.with(Sentinel::NoAccess),
            TableKind::Concentration => SentinelSet::EMPTY
                .with(Sentinel::Dry)
                .with(Sentinel::NoAccess)
                .with(Sentinel::Lost),
            TableKind::Load => SentinelSet::EMPTY
                .with(Sentinel::NoAccess)
                .with(Sentinel::Lost),
            TableKind::FlowMeans | TableKind::ConcMeans | TableKind::LoadMeans => {
                SentinelSet::EMPTY.with(Sentinel::Dry)
            }
        }
    }

    pub fn has_fractions(&self) -> bool {
        matches!(
            self,
            TableKind::Concentration | TableKind::Load | TableKind::ConcMeans | TableKind::LoadMeans
        )
    }

    pub fn is_mean_table(&self) -> bool {
        matches!(
            self,
            TableKind::FlowMeans | TableKind::ConcMeans | TableKind::LoadMeans
        )
    }

    /// Unit of the fraction columns, if any.
    pub fn fraction_unit(&self) -> Option<&'static str> {
        match self {
            TableKind::Concentration | TableKind::ConcMeans => Some("mg/L"),
            TableKind::Load | TableKind::LoadMeans => Some("mg/s"),
            TableKind::Streamflow | TableKind::FlowMeans => None,
        }
    }

    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut columns: Vec<&'static str> = match self {
            TableKind::Streamflow | TableKind::Concentration | TableKind::Load => {
                SAMPLE_COLUMNS.to_vec()
            }
            TableKind::FlowMeans => vec!["site", "hydro", "ls"],
            TableKind::ConcMeans | TableKind::LoadMeans => MEAN_KEY_COLUMNS.to_vec(),
        };
        if self.has_fractions() {
            columns.extend(FRACTION_COLUMNS);
        }
        columns
    }

    pub fn is_required(&self, column: &str) -> bool {
        self.required_columns().contains(&column)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "streamflow" | "flow" => Ok(TableKind::Streamflow),
            "concentration" | "conc" => Ok(TableKind::Concentration),
            "load" => Ok(TableKind::Load),
            "flowmeans" => Ok(TableKind::FlowMeans),
            "concmeans" => Ok(TableKind::ConcMeans),
            "loadmeans" => Ok(TableKind::LoadMeans),
            _ => Err(format!("unknown table kind '{}'", value.trim())),
        }
    }
}
