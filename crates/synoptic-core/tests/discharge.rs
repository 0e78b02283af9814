use std::path::PathBuf;

use chrono::NaiveDate;
use synoptic_core::discharge::{exclude_fault_readings, FAULT_TP_THRESHOLD};
use synoptic_parser::{load_discharge, DischargeRecord};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../synoptic-parser/tests/data")
        .join(name)
}

fn record(line: usize, day: u32, tp: Option<f64>) -> DischargeRecord {
    DischargeRecord {
        line,
        date: NaiveDate::from_ymd_opt(2016, 4, day).unwrap(),
        cfs: 10.0 + day as f64,
        tp,
    }
}

#[test]
fn drops_readings_at_or_above_the_fault_threshold() {
    let records = load_discharge(fixture_path("historic.csv")).unwrap();
    assert_eq!(records.len(), 5);

    let kept = exclude_fault_readings(&records);

    assert_eq!(kept.len(), 3);
    assert!(kept
        .iter()
        .all(|r| r.tp.map_or(true, |tp| tp < FAULT_TP_THRESHOLD)));
    let days: Vec<NaiveDate> = kept.iter().map(|r| r.date).collect();
    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2016, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2016, 4, 2).unwrap(),
            NaiveDate::from_ymd_opt(2016, 4, 4).unwrap(),
        ]
    );
}

#[test]
fn missing_tp_rows_are_kept() {
    let kept = exclude_fault_readings(&[record(2, 1, None)]);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].tp, None);
}

#[test]
fn output_is_in_date_order() {
    let records = vec![
        record(2, 9, Some(0.1)),
        record(3, 3, Some(0.2)),
        record(4, 6, Some(2.5)),
        record(5, 1, Some(0.3)),
    ];

    let kept = exclude_fault_readings(&records);

    let lines: Vec<usize> = kept.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![5, 3, 2]);
}
