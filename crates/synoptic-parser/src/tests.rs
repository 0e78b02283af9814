use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::errors::LoadError;
use crate::model::{Fraction, HydroPeriod, Measurement, Sentinel, SiteId};
use crate::schema::TableKind;
use crate::{load_table, parse_discharge, parse_table};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

fn fixture(name: &str) -> String {
    let full_path = fixture_path(name);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

#[test]
fn parses_concentration_table_with_sentinels() {
    let table = parse_table(&fixture("concentration.csv"), TableKind::Concentration)
        .expect("concentration parse failed");

    assert_eq!(table.kind, TableKind::Concentration);
    assert_eq!(table.len(), 8);

    let first = &table.rows[0];
    assert_eq!(first.site.as_str(), "MC01");
    assert_eq!(first.site.stream_group(), 'M');
    assert_eq!(first.line, 2);
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2017, 5, 2));
    assert_eq!(first.hydro, Some(HydroPeriod::Rise));
    assert_eq!(first.ls, Some(Measurement::Numeric(342.6)));
    let fractions = first.fractions.expect("fraction cells missing");
    assert_eq!(fractions.get(Fraction::TP), Some(Measurement::Numeric(0.052)));
    assert_eq!(fractions.get(Fraction::DOP), Some(Measurement::Numeric(0.007)));

    let no_access = &table.rows[3];
    assert_eq!(no_access.site.stream_group(), 'S');
    assert_eq!(no_access.ls, Some(Measurement::Sentinel(Sentinel::NoAccess)));

    let dry = table.rows[4].fractions.expect("fraction cells missing");
    for (_, value) in dry.iter() {
        assert_eq!(value, Some(Measurement::Sentinel(Sentinel::Dry)));
    }

    let partial = table.rows[6].fractions.expect("fraction cells missing");
    assert_eq!(partial.get(Fraction::TP), Some(Measurement::Sentinel(Sentinel::Lost)));
    assert_eq!(partial.get(Fraction::PP), Some(Measurement::Numeric(0.070)));
    assert_eq!(partial.get(Fraction::DRP), None);
}

#[test]
fn parses_streamflow_table_without_fraction_columns() {
    let table = load_table(fixture_path("streamflow.csv"), TableKind::Streamflow)
        .expect("streamflow parse failed");

    assert_eq!(table.len(), 5);
    assert!(table.rows.iter().all(|row| row.fractions.is_none()));
    assert_eq!(
        table.rows[2].ls,
        Some(Measurement::Sentinel(Sentinel::NoAccess))
    );
}

#[test]
fn mean_tables_only_accept_dry() {
    let table = parse_table(&fixture("concmeans.csv"), TableKind::ConcMeans)
        .expect("concmeans parse failed");
    assert_eq!(table.len(), 5);
    assert!(table.rows.iter().all(|row| row.date.is_none() && row.id.is_none()));
    assert_eq!(table.rows[3].site, SiteId::new("SC02").unwrap());

    let content = "site,hydro,tp,pp,tdp,drp,dop\nMC01,Rise,lost,0.1,0.1,0.1,0.1\n";
    let err = parse_table(content, TableKind::ConcMeans).unwrap_err();
    match err {
        LoadError::Parse { line, column, .. } => {
            assert_eq!(line, 2);
            assert_eq!(column, "tp");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn load_table_rejects_dry_token() {
    let content = "id,site,stream,date,hydro,cfs,ls,tp,pp,tdp,drp,dop\n\
                   1,MC01,Main,2017-05-02,Rise,1,2,dry,1,1,1,1\n";
    let err = parse_table(content, TableKind::Load).unwrap_err();
    assert!(err.is_parse_error());
}

#[test]
fn non_numeric_cell_is_parse_error() {
    let content = "id,site,stream,date,hydro,cfs,ls\n1,MC01,Main,2017-05-02,Rise,abc,2\n";
    let err = parse_table(content, TableKind::Streamflow).unwrap_err();
    let message = err.to_string();
    assert!(err.is_parse_error());
    assert!(message.contains("cfs"), "message was {message}");
    assert!(message.contains("line 2"), "message was {message}");
}

#[test]
fn missing_fraction_column_is_schema_error() {
    let content = "id,site,stream,date,hydro,cfs,ls,tp,pp,tdp,drp\n\
                   1,MC01,Main,2017-05-02,Rise,1,2,1,1,1,1\n";
    let err = parse_table(content, TableKind::Concentration).unwrap_err();
    match err {
        LoadError::Schema { table, column } => {
            assert_eq!(table, "concentration");
            assert_eq!(column, "dop");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn columns_are_located_by_name_not_position() {
    let content = "dop,drp,tdp,pp,tp,ls,cfs,hydro,date,stream,site,id\n\
                   0.5,0.4,0.3,0.2,0.1,2,1,peak,6/6/2018,Main,mc01,7\n";
    let table = parse_table(content, TableKind::Concentration).expect("parse failed");
    let row = &table.rows[0];
    assert_eq!(row.site.as_str(), "MC01");
    assert_eq!(row.hydro, Some(HydroPeriod::Peak));
    assert_eq!(row.date, NaiveDate::from_ymd_opt(2018, 6, 6));
    let fractions = row.fractions.unwrap();
    assert_eq!(fractions.get(Fraction::TP), Some(Measurement::Numeric(0.1)));
    assert_eq!(fractions.get(Fraction::DOP), Some(Measurement::Numeric(0.5)));
}

#[test]
fn missing_file_is_reported_with_path() {
    let err = load_table(fixture_path("does_not_exist.csv"), TableKind::Load).unwrap_err();
    match err {
        LoadError::MissingFile { path } => assert!(path.ends_with("does_not_exist.csv")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn header_only_file_is_empty_data() {
    let err = parse_table("site,hydro,ls\n", TableKind::FlowMeans).unwrap_err();
    assert!(matches!(err, LoadError::EmptyData { table: "flowmeans" }));
}

#[test]
fn parses_discharge_record() {
    let records = parse_discharge(&fixture("historic.csv")).expect("discharge parse failed");
    assert_eq!(records.len(), 5);
    assert_eq!(records[1].tp, None);
    assert_eq!(records[2].tp, Some(1.2));
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2016, 4, 1).unwrap());

    let with_times = "DATE,CFS,TP\n2016-04-01 00:15:00,10.0,0.1\n";
    let records = parse_discharge(with_times).expect("datetime parse failed");
    assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2016, 4, 1).unwrap());
}

#[test]
fn discharge_rejects_infinite_values() {
    for content in [
        "DATE,CFS,TP\n2016-04-01,inf,0.1\n",
        "DATE,CFS,TP\n2016-04-01,10.0,-inf\n",
    ] {
        let err = parse_discharge(content).unwrap_err();
        assert!(err.is_parse_error(), "{err:?}");
        assert!(err.to_string().contains("non-finite"), "{err}");
    }

    let err = parse_table(
        "id,site,stream,date,hydro,cfs,ls\n1,MC01,Main,2017-05-02,Rise,inf,2\n",
        TableKind::Streamflow,
    )
    .unwrap_err();
    assert!(err.to_string().contains("non-finite"), "{err}");
}

#[test]
fn table_kind_parses_cli_names() {
    assert_eq!("concentration".parse::<TableKind>(), Ok(TableKind::Concentration));
    assert_eq!("conc_means".parse::<TableKind>(), Ok(TableKind::ConcMeans));
    assert_eq!("flow-means".parse::<TableKind>(), Ok(TableKind::FlowMeans));
    assert!("nutrients".parse::<TableKind>().is_err());
}
