use std::path::PathBuf;

use synoptic_core::site_filter::{exclude_site, without_site, DEFAULT_EXCLUDED_SITE};
use synoptic_parser::{load_table, SiteId, TableKind};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../synoptic-parser/tests/data")
        .join(name)
}

#[test]
fn removes_exactly_the_excluded_site_from_every_table() {
    let excluded = SiteId::new(DEFAULT_EXCLUDED_SITE).unwrap();
    let inputs = [
        ("streamflow.csv", TableKind::Streamflow),
        ("concentration.csv", TableKind::Concentration),
        ("load.csv", TableKind::Load),
        ("flowmeans.csv", TableKind::FlowMeans),
        ("concmeans.csv", TableKind::ConcMeans),
        ("loadmeans.csv", TableKind::LoadMeans),
    ];

    for (name, kind) in inputs {
        let table = load_table(fixture_path(name), kind).expect("fixture load failed");
        let matching = table.rows.iter().filter(|row| row.site == excluded).count();

        let filtered = exclude_site(&table, &excluded);

        assert_eq!(filtered.kind, kind);
        assert_eq!(filtered.len(), table.len() - matching, "{name}");
        assert!(filtered.rows.iter().all(|row| row.site != excluded), "{name}");
    }
}

#[test]
fn filtering_twice_is_a_no_op() {
    let excluded = SiteId::new("MC04").unwrap();
    let table = load_table(fixture_path("concentration.csv"), TableKind::Concentration).unwrap();

    let once = exclude_site(&table, &excluded);
    let twice = exclude_site(&once, &excluded);

    assert_eq!(once, twice);
    assert_eq!(once.len(), 6);
}

#[test]
fn unknown_site_leaves_rows_in_order() {
    let table = load_table(fixture_path("streamflow.csv"), TableKind::Streamflow).unwrap();
    let kept = without_site(&table.rows, &SiteId::new("XX99").unwrap());
    assert_eq!(kept, table.rows);
}
