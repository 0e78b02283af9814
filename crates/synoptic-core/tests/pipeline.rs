use std::path::{Path, PathBuf};

use polars::prelude::*;
use synoptic_core::config::{PipelineConfig, Section};
use synoptic_core::pipeline::{run_pipeline, SectionOutcome};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../synoptic-parser/tests/data")
}

fn config_for(output_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        data_dir: fixture_dir(),
        output_dir: output_dir.to_path_buf(),
        ..PipelineConfig::default()
    }
}

fn read_csv(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .unwrap()
        .finish()
        .unwrap()
}

#[test]
fn runs_every_section_against_the_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let report = run_pipeline(&config).expect("pipeline failed");

    assert!(report.is_success(), "{:?}", report.failures().collect::<Vec<_>>());
    assert_eq!(report.excluded_site, "MC04");
    assert_eq!(report.sections.len(), Section::ALL.len());

    for name in [
        "streamflow.csv",
        "streamflow_flow.csv",
        "streamflow_flow_flagged.csv",
        "concentration.csv",
        "concentration_long.csv",
        "concentration_numeric.csv",
        "concentration_flagged.csv",
        "load_numeric.csv",
        "conc_means_numeric.csv",
        "computed_conc_means.csv",
        "computed_conc_means_table_numeric.csv",
        "historic_discharge.csv",
        "report.json",
    ] {
        assert!(dir.path().join(name).exists(), "missing output {name}");
    }

    match report.outcome(Section::Concentration) {
        Some(SectionOutcome::Completed(summary)) => {
            assert_eq!(summary.rows_loaded, 8);
            assert_eq!(summary.rows_kept, 6);
            assert_eq!(summary.long_rows, 30);
            assert_eq!(summary.numeric, 18);
            assert_eq!(summary.flagged, 11);
            assert_eq!(summary.missing, 1);
            assert_eq!(summary.outputs.len(), 4);
        }
        other => panic!("unexpected concentration outcome: {other:?}"),
    }

    match report.outcome(Section::Historic) {
        Some(SectionOutcome::Completed(summary)) => {
            assert_eq!(summary.rows_loaded, 5);
            assert_eq!(summary.rows_kept, 3);
        }
        other => panic!("unexpected historic outcome: {other:?}"),
    }
}

#[test]
fn numeric_output_is_float_and_excludes_the_site() {
    let dir = tempfile::tempdir().unwrap();
    run_pipeline(&config_for(dir.path())).unwrap();

    let df = read_csv(&dir.path().join("concentration_numeric.csv"));

    assert_eq!(df.height(), 18);
    assert_eq!(df.column("value").unwrap().dtype(), &DataType::Float64);
    assert_eq!(df.column("value").unwrap().null_count(), 0);

    let sites = df.column("site").unwrap().str().unwrap();
    assert!(sites.into_no_null_iter().all(|site| site != "MC04"));

    let hydro: Vec<&str> = df
        .column("hydro")
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .collect();
    let first_peak = hydro.iter().position(|h| *h == "Peak").unwrap();
    assert!(hydro[..first_peak].iter().all(|h| *h == "Rise"));
    assert!(hydro[first_peak..].iter().all(|h| *h == "Peak"));
}

#[test]
fn failing_section_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.inputs.concentration = Some("not_there.csv".to_string());

    let report = run_pipeline(&config).unwrap();

    assert!(!report.is_success());
    let failed: Vec<Section> = report.failures().map(|(section, _)| *section).collect();
    assert_eq!(
        failed,
        vec![Section::Concentration, Section::ComputedConcMeans]
    );
    let (_, error) = report.failures().next().unwrap();
    assert!(error.contains("does not exist"), "{error}");

    assert!(matches!(
        report.outcome(Section::Load),
        Some(SectionOutcome::Completed(_))
    ));
    assert!(dir.path().join("load_numeric.csv").exists());
    assert!(!dir.path().join("concentration_numeric.csv").exists());

    let report_json = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    assert!(report_json.contains("\"status\": \"failed\""));
}

#[test]
fn unset_inputs_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.inputs.historic = None;

    let report = run_pipeline(&config).unwrap();

    assert!(report.is_success());
    assert!(matches!(
        report.outcome(Section::Historic),
        Some(SectionOutcome::Skipped)
    ));
    assert!(!dir.path().join("historic_discharge.csv").exists());
}

#[test]
fn invalid_excluded_site_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.excluded_site = "MC 04".to_string();

    assert!(run_pipeline(&config).is_err());
}
