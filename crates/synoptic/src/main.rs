use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use synoptic_core::aggregate::{site_means, SiteMean};
use synoptic_core::config::PipelineConfig;
use synoptic_core::frames::OutputFormat;
use synoptic_core::pipeline::{run_pipeline, PipelineReport, SectionOutcome};
use synoptic_parser::{load_table, Fraction, Measurement, SampleTable, Sentinel, TableKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synoptic stream phosphorus sampling pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every configured table, filter, reshape, split and export
    Run(RunArgs),
    /// Load one table and report how many cells are numeric, flagged or missing
    Inspect(InspectArgs),
    /// Average a per-sample table by site and hydrologic period
    Means(MeansArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Site removed from every table before reshaping
    #[arg(long)]
    exclude_site: Option<String>,
    /// Output format: csv or parquet
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    file: PathBuf,
    /// streamflow, concentration, load, flow_means, conc_means or load_means
    #[arg(short, long)]
    kind: TableKind,
}

#[derive(Args, Debug)]
struct MeansArgs {
    file: PathBuf,
    /// streamflow, concentration or load
    #[arg(short, long)]
    kind: TableKind,
    /// Overrides the configured excluded site
    #[arg(long)]
    exclude_site: Option<String>,
}

fn parse_format(value: &str) -> std::result::Result<OutputFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "csv" => Ok(OutputFormat::Csv),
        "parquet" => Ok(OutputFormat::Parquet),
        other => Err(format!("unknown output format '{other}'")),
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Inspect(args) => handle_inspect(args).map(|_| ExitCode::SUCCESS),
        Command::Means(args) => handle_means(args).map(|_| ExitCode::SUCCESS),
    }
}

fn handle_run(args: RunArgs) -> Result<ExitCode> {
    let mut config = PipelineConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(site) = args.exclude_site {
        config.excluded_site = site;
    }
    if let Some(format) = args.format {
        config.output_format = format;
    }

    info!(
        data_dir = %config.data_dir.display(),
        output_dir = %config.output_dir.display(),
        excluded_site = %config.excluded_site,
        "starting pipeline run"
    );

    let report = run_pipeline(&config).context("pipeline run failed")?;
    print_report(&report);

    if report.is_success() {
        println!("\nOutputs written to {}", config.output_dir.display());
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("\nSome sections failed:");
        for (section, error) in report.failures() {
            eprintln!("  {section}: {error}");
        }
        Ok(ExitCode::FAILURE)
    }
}

fn print_report(report: &PipelineReport) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "section", "status", "loaded", "kept", "long", "numeric", "flagged", "missing",
    ]);

    for section in &report.sections {
        let row = match &section.outcome {
            SectionOutcome::Completed(summary) => vec![
                section.section.to_string(),
                "ok".to_string(),
                summary.rows_loaded.to_string(),
                summary.rows_kept.to_string(),
                summary.long_rows.to_string(),
                summary.numeric.to_string(),
                summary.flagged.to_string(),
                summary.missing.to_string(),
            ],
            SectionOutcome::Skipped => vec![section.section.to_string(), "skipped".to_string()],
            SectionOutcome::Failed { .. } => {
                vec![section.section.to_string(), "FAILED".to_string()]
            }
        };
        table.add_row(row);
    }

    println!("Excluded site: {}", report.excluded_site);
    println!("{table}");
}

/// numeric, dry, no_access, lost, missing
fn tally<I>(values: I) -> [usize; 5]
where
    I: IntoIterator<Item = Option<Measurement>>,
{
    let mut counts = [0usize; 5];
    for value in values {
        let slot = match value {
            Some(Measurement::Numeric(_)) => 0,
            Some(Measurement::Sentinel(Sentinel::Dry)) => 1,
            Some(Measurement::Sentinel(Sentinel::NoAccess)) => 2,
            Some(Measurement::Sentinel(Sentinel::Lost)) => 3,
            None => 4,
        };
        counts[slot] += 1;
    }
    counts
}

fn measurement_columns(table: &SampleTable) -> Vec<(&'static str, [usize; 5])> {
    let mut columns = vec![
        ("cfs", tally(table.rows.iter().map(|row| row.cfs))),
        ("ls", tally(table.rows.iter().map(|row| row.ls))),
    ];
    if table.kind.has_fractions() {
        for fraction in Fraction::ORDER {
            let values = table
                .rows
                .iter()
                .map(|row| row.fractions.and_then(|v| v.get(fraction)));
            columns.push((fraction.column_name(), tally(values)));
        }
    }
    columns
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let table = load_table(&args.file, args.kind)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    let mut sites: Vec<&str> = table.rows.iter().map(|row| row.site.as_str()).collect();
    sites.sort_unstable();
    sites.dedup();

    println!("{} ({} table)", args.file.display(), table.kind);
    println!("  rows: {}", table.len());
    println!("  sites: {}", sites.join(", "));
    println!("  sentinels allowed: {}", table.kind.sentinels().tokens().join(", "));
    if let Some(unit) = table.kind.fraction_unit() {
        println!("  fraction unit: {unit}");
    }

    let mut output = Table::new();
    output.load_preset(UTF8_FULL).set_header(vec![
        "column", "numeric", "dry", "no_access", "lost", "missing",
    ]);
    for (name, counts) in measurement_columns(&table) {
        let mut row = vec![name.to_string()];
        row.extend(counts.iter().map(|n| n.to_string()));
        output.add_row(row);
    }
    println!("{output}");

    Ok(())
}

fn cell(value: Option<Measurement>) -> String {
    match value {
        Some(Measurement::Numeric(v)) => format!("{v:.3}"),
        Some(Measurement::Sentinel(sentinel)) => sentinel.token().to_string(),
        None => String::new(),
    }
}

fn handle_means(args: MeansArgs) -> Result<()> {
    if args.kind.is_mean_table() {
        bail!("{} is already averaged; pass a per-sample table", args.kind);
    }

    let mut config = PipelineConfig::load(None)?;
    if let Some(site) = args.exclude_site {
        config.excluded_site = site;
    }
    let excluded = config.excluded_site()?;

    let table = load_table(&args.file, args.kind)
        .with_context(|| format!("failed to load {}", args.file.display()))?;
    let means: Vec<SiteMean> = site_means(&table, &excluded)?;
    info!(excluded_site = %excluded, groups = means.len(), "computed means");

    let mut header = vec!["site", "hydro", "samples", "cfs", "ls"];
    if table.kind.has_fractions() {
        header.extend(Fraction::ORDER.iter().map(|f| f.label()));
    }

    let mut output = Table::new();
    output.load_preset(UTF8_FULL).set_header(header);
    for mean in &means {
        let mut row = vec![
            mean.site.to_string(),
            mean.hydro.to_string(),
            mean.samples.to_string(),
            cell(mean.cfs),
            cell(mean.ls),
        ];
        if let Some(values) = mean.fractions {
            row.extend(values.iter().map(|(_, value)| cell(value)));
        }
        output.add_row(row);
    }
    println!("{output}");

    Ok(())
}
