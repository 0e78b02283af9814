use synoptic_parser::DischargeRecord;
use tracing::debug;

/// TP readings at or above this (mg/L) come from an instrument fault.
pub const FAULT_TP_THRESHOLD: f64 = 1.0;

/// Drops instrument-fault rows and returns the rest in date order for the hydrograph.
/// Rows with no TP reading still carry discharge and are kept.
pub fn exclude_fault_readings(records: &[DischargeRecord]) -> Vec<DischargeRecord> {
    let mut kept: Vec<DischargeRecord> = records
        .iter()
        .filter(|record| record.tp.map_or(true, |tp| tp < FAULT_TP_THRESHOLD))
        .cloned()
        .collect();
    kept.sort_by_key(|record| record.date);

    debug!(
        input = records.len(),
        kept = kept.len(),
        "excluded fault readings from discharge record"
    );
    kept
}
