use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use serde::Serialize;
use synoptic_parser::{load_discharge, load_table, SampleTable, SiteId};
use tracing::{error, info, warn};

use crate::aggregate::{means_table, site_means, SiteMean};
use crate::config::{PipelineConfig, Section};
use crate::discharge::exclude_fault_readings;
use crate::error::{PipelineError, Result};
use crate::frames::{
    discharge_frame, flagged_frame, flow_flags_frame, flow_points_frame, numeric_frame,
    readings_frame, site_means_frame, table_frame, write_frame,
};
use crate::ordering::{sort_by_category, with_category_order};
use crate::reshape::{gather_fractions, FractionReading};
use crate::site_filter::exclude_site;
use crate::split::{split_flow, split_readings, FlowSplit, SplitReadings};

/// Everything derived from one sampling table, before anything is written.
#[derive(Debug, Clone)]
pub struct TableOutputs {
    /// The table with the excluded site removed.
    pub filtered: SampleTable,
    /// Long-format readings; `None` for tables without fraction columns.
    pub readings: Option<Vec<FractionReading>>,
    pub split: Option<SplitReadings>,
    pub flow: FlowSplit,
}

/// Site filter, then reshape, then split, then categorical order. The filter always runs first.
pub fn process_table(table: &SampleTable, excluded: &SiteId) -> Result<TableOutputs> {
    let filtered = exclude_site(table, excluded);

    let (readings, split) = if filtered.kind.has_fractions() {
        let readings = gather_fractions(&filtered)?;
        let mut split = split_readings(readings.clone());
        sort_by_category(&mut split.numeric);
        sort_by_category(&mut split.flagged);
        (Some(readings), Some(split))
    } else {
        (None, None)
    };

    let mut flow = split_flow(&filtered);
    sort_by_category(&mut flow.numeric);
    sort_by_category(&mut flow.flagged);

    Ok(TableOutputs {
        filtered,
        readings,
        split,
        flow,
    })
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SectionSummary {
    pub input: PathBuf,
    pub rows_loaded: usize,
    pub rows_kept: usize,
    pub long_rows: usize,
    pub numeric: usize,
    pub flagged: usize,
    pub missing: usize,
    pub outputs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    Completed(SectionSummary),
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub section: Section,
    pub outcome: SectionOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub excluded_site: String,
    pub sections: Vec<SectionReport>,
}

impl PipelineReport {
    pub fn failures(&self) -> impl Iterator<Item = (&Section, &str)> + '_ {
        self.sections.iter().filter_map(|report| match &report.outcome {
            SectionOutcome::Failed { error } => Some((&report.section, error.as_str())),
            _ => None,
        })
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn outcome(&self, section: Section) -> Option<&SectionOutcome> {
        self.sections
            .iter()
            .find(|report| report.section == section)
            .map(|report| &report.outcome)
    }
}

struct SectionWriter<'a> {
    config: &'a PipelineConfig,
    outputs: Vec<PathBuf>,
}

impl<'a> SectionWriter<'a> {
    fn new(config: &'a PipelineConfig) -> Self {
        Self {
            config,
            outputs: Vec::new(),
        }
    }

    fn write(&mut self, stem: &str, mut df: DataFrame, ordered: bool) -> Result<()> {
        if ordered {
            df = with_category_order(&df)?;
        }
        let path = self.config.output_path(stem);
        write_frame(&mut df, &path, self.config.output_format)?;
        self.outputs.push(path);
        Ok(())
    }
}

fn write_table_outputs(
    writer: &mut SectionWriter<'_>,
    prefix: &str,
    outputs: &TableOutputs,
    summary: &mut SectionSummary,
) -> Result<()> {
    writer.write(prefix, table_frame(&outputs.filtered)?, true)?;
    summary.rows_kept = outputs.filtered.len();

    match (&outputs.readings, &outputs.split) {
        (Some(readings), Some(split)) => {
            writer.write(&format!("{prefix}_long"), readings_frame(readings)?, true)?;
            writer.write(&format!("{prefix}_numeric"), numeric_frame(&split.numeric)?, true)?;
            writer.write(&format!("{prefix}_flagged"), flagged_frame(&split.flagged)?, true)?;
            summary.long_rows = readings.len();
            summary.numeric = split.numeric.len();
            summary.flagged = split.flagged.len();
            summary.missing = split.missing;
        }
        _ => {
            let flow = &outputs.flow;
            writer.write(&format!("{prefix}_flow"), flow_points_frame(&flow.numeric)?, true)?;
            writer.write(
                &format!("{prefix}_flow_flagged"),
                flow_flags_frame(&flow.flagged)?,
                true,
            )?;
            summary.numeric = flow.numeric.len();
            summary.flagged = flow.flagged.len();
            summary.missing = flow.missing;
        }
    }
    Ok(())
}

fn run_table_section(
    config: &PipelineConfig,
    section: Section,
    input: &Path,
    excluded: &SiteId,
) -> Result<SectionSummary> {
    let kind = section.table_kind().ok_or_else(|| {
        PipelineError::Config(format!("section {section} does not read a sampling table"))
    })?;
    let table = load_table(input, kind).map_err(|err| PipelineError::load(input, err))?;

    let mut summary = SectionSummary {
        input: input.to_path_buf(),
        rows_loaded: table.len(),
        ..SectionSummary::default()
    };
    let mut writer = SectionWriter::new(config);

    if section.is_computed_means() {
        let means: Vec<SiteMean> = site_means(&table, excluded)?;
        writer.write(section.name(), site_means_frame(&means)?, true)?;

        let averaged = means_table(kind, &means);
        let outputs = process_table(&averaged, excluded)?;
        let prefix = format!("{}_table", section.name());
        write_table_outputs(&mut writer, &prefix, &outputs, &mut summary)?;
    } else {
        let outputs = process_table(&table, excluded)?;
        write_table_outputs(&mut writer, section.name(), &outputs, &mut summary)?;
    }

    summary.outputs = writer.outputs;
    Ok(summary)
}

fn run_historic_section(config: &PipelineConfig, input: &Path) -> Result<SectionSummary> {
    let records = load_discharge(input).map_err(|err| PipelineError::load(input, err))?;
    let kept = exclude_fault_readings(&records);

    let mut writer = SectionWriter::new(config);
    writer.write("historic_discharge", discharge_frame(&kept)?, false)?;

    Ok(SectionSummary {
        input: input.to_path_buf(),
        rows_loaded: records.len(),
        rows_kept: kept.len(),
        numeric: kept.len(),
        outputs: writer.outputs,
        ..SectionSummary::default()
    })
}

fn run_section(
    config: &PipelineConfig,
    section: Section,
    input: &Path,
    excluded: &SiteId,
) -> Result<SectionSummary> {
    match section {
        Section::Historic => run_historic_section(config, input),
        _ => run_table_section(config, section, input, excluded),
    }
}

/// Runs every configured section. A failing section is reported and the rest still run.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    let excluded = config.excluded_site()?;
    fs::create_dir_all(&config.output_dir)?;

    let mut report = PipelineReport {
        excluded_site: excluded.to_string(),
        sections: Vec::with_capacity(Section::ALL.len()),
    };

    for section in Section::ALL {
        let outcome = match config.input_path(section) {
            None => {
                info!(section = section.name(), "no input configured; skipping section");
                SectionOutcome::Skipped
            }
            Some(input) => {
                info!(section = section.name(), input = %input.display(), "running section");
                match run_section(config, section, &input, &excluded) {
                    Ok(summary) => {
                        info!(
                            section = section.name(),
                            rows_loaded = summary.rows_loaded,
                            rows_kept = summary.rows_kept,
                            numeric = summary.numeric,
                            flagged = summary.flagged,
                            "section complete"
                        );
                        SectionOutcome::Completed(summary)
                    }
                    Err(err) => {
                        error!(section = section.name(), error = %err, "section failed");
                        SectionOutcome::Failed {
                            error: err.to_string(),
                        }
                    }
                }
            }
        };
        report.sections.push(SectionReport { section, outcome });
    }

    let report_path = config.output_dir.join("report.json");
    fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;

    if !report.is_success() {
        warn!(
            failed = report.failures().count(),
            "pipeline finished with failed sections"
        );
    }

    Ok(report)
}
