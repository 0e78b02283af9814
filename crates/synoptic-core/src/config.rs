use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use synoptic_parser::{SiteId, TableKind};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::frames::OutputFormat;
use crate::site_filter::DEFAULT_EXCLUDED_SITE;

pub const DATA_DIR_ENV: &str = "SYNOPTIC_DATA_DIR";
pub const OUTPUT_DIR_ENV: &str = "SYNOPTIC_OUTPUT_DIR";
pub const EXCLUDED_SITE_ENV: &str = "SYNOPTIC_EXCLUDED_SITE";

/// One independently failing unit of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Streamflow,
    Concentration,
    Load,
    FlowMeans,
    ConcMeans,
    LoadMeans,
    ComputedFlowMeans,
    ComputedConcMeans,
    ComputedLoadMeans,
    Historic,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::Streamflow,
        Section::Concentration,
        Section::Load,
        Section::FlowMeans,
        Section::ConcMeans,
        Section::LoadMeans,
        Section::ComputedFlowMeans,
        Section::ComputedConcMeans,
        Section::ComputedLoadMeans,
        Section::Historic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Streamflow => "streamflow",
            Section::Concentration => "concentration",
            Section::Load => "load",
            Section::FlowMeans => "flow_means",
            Section::ConcMeans => "conc_means",
            Section::LoadMeans => "load_means",
            Section::ComputedFlowMeans => "computed_flow_means",
            Section::ComputedConcMeans => "computed_conc_means",
            Section::ComputedLoadMeans => "computed_load_means",
            Section::Historic => "historic",
        }
    }

    /// Table kind the section reads; `None` for the historic discharge record.
    pub fn table_kind(&self) -> Option<TableKind> {
        match self {
            Section::Streamflow | Section::ComputedFlowMeans => Some(TableKind::Streamflow),
            Section::Concentration | Section::ComputedConcMeans => Some(TableKind::Concentration),
            Section::Load | Section::ComputedLoadMeans => Some(TableKind::Load),
            Section::FlowMeans => Some(TableKind::FlowMeans),
            Section::ConcMeans => Some(TableKind::ConcMeans),
            Section::LoadMeans => Some(TableKind::LoadMeans),
            Section::Historic => None,
        }
    }

    pub fn is_computed_means(&self) -> bool {
        matches!(
            self,
            Section::ComputedFlowMeans | Section::ComputedConcMeans | Section::ComputedLoadMeans
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// File names, relative to the data directory. An unset entry skips the sections that read it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputFiles {
    pub streamflow: Option<String>,
    pub concentration: Option<String>,
    pub load: Option<String>,
    pub flow_means: Option<String>,
    pub conc_means: Option<String>,
    pub load_means: Option<String>,
    pub historic: Option<String>,
}

impl InputFiles {
    pub fn standard() -> Self {
        Self {
            streamflow: Some("streamflow.csv".to_string()),
            concentration: Some("concentration.csv".to_string()),
            load: Some("load.csv".to_string()),
            flow_means: Some("flowmeans.csv".to_string()),
            conc_means: Some("concmeans.csv".to_string()),
            load_means: Some("loadmeans.csv".to_string()),
            historic: Some("historic.csv".to_string()),
        }
    }

    pub fn for_section(&self, section: Section) -> Option<&str> {
        let name = match section {
            Section::Streamflow | Section::ComputedFlowMeans => &self.streamflow,
            Section::Concentration | Section::ComputedConcMeans => &self.concentration,
            Section::Load | Section::ComputedLoadMeans => &self.load,
            Section::FlowMeans => &self.flow_means,
            Section::ConcMeans => &self.conc_means,
            Section::LoadMeans => &self.load_means,
            Section::Historic => &self.historic,
        };
        name.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_excluded_site")]
    pub excluded_site: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "InputFiles::standard")]
    pub inputs: InputFiles,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_excluded_site() -> String {
    DEFAULT_EXCLUDED_SITE.to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            excluded_site: default_excluded_site(),
            output_format: OutputFormat::default(),
            inputs: InputFiles::standard(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| PipelineError::Config(err.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// File values (or defaults), then `.env`, then `SYNOPTIC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var(DATA_DIR_ENV) {
            debug!(env = DATA_DIR_ENV, %value, "overriding data_dir");
            self.data_dir = PathBuf::from(value);
        }
        if let Ok(value) = env::var(OUTPUT_DIR_ENV) {
            debug!(env = OUTPUT_DIR_ENV, %value, "overriding output_dir");
            self.output_dir = PathBuf::from(value);
        }
        if let Ok(value) = env::var(EXCLUDED_SITE_ENV) {
            debug!(env = EXCLUDED_SITE_ENV, %value, "overriding excluded_site");
            self.excluded_site = value;
        }
    }

    pub fn excluded_site(&self) -> Result<SiteId> {
        SiteId::new(&self.excluded_site)
            .map_err(|err| PipelineError::Config(format!("excluded_site: {err}")))
    }

    pub fn input_path(&self, section: Section) -> Option<PathBuf> {
        self.inputs
            .for_section(section)
            .map(|name| self.data_dir.join(name))
    }

    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.output_dir
            .join(format!("{stem}.{}", self.output_format.extension()))
    }
}
