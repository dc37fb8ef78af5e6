//! End-to-end tests: CSV in, scored accounts and report out.

use std::io::Write;
use std::path::PathBuf;

use account_health::report::{build_report, ReportInput};
use account_health::{
    load_accounts, pipeline, score_batch, summarize, AccountFilter, AnomalyKind, ConfigError,
    HealthBand, Ingested, RenewalRisk, RuleId, RunError, Thresholds, ValidationError,
};
use chrono::NaiveDate;
use tempfile::NamedTempFile;
use uuid::Uuid;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/sample_accounts.csv")
}

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).expect("date")
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    write!(file, "{contents}").expect("write temp file");
    file
}

#[test]
fn sample_export_scores_end_to_end() {
    let ingested = load_accounts(&sample_path()).expect("load sample");
    assert_eq!(ingested.records.len(), 12);
    assert!(ingested.rejected.is_empty());

    let outcome = score_batch(&ingested.records, &Thresholds::default(), as_of());
    assert_eq!(outcome.scored.len(), 12);
    assert!(outcome.rejected.is_empty());

    let kinds: Vec<(&str, AnomalyKind)> = outcome
        .anomalies
        .iter()
        .map(|a| (a.customer.as_str(), a.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("Soylent Foods", AnomalyKind::Missing),
            ("Cyberdyne Systems", AnomalyKind::OutOfRange),
            ("Vandelay Imports", AnomalyKind::ZeroSeats),
        ]
    );

    let find = |name: &str| {
        outcome
            .scored
            .iter()
            .find(|a| a.record.customer == name)
            .expect("account present")
    };

    let northwind = find("Northwind Traders");
    assert_eq!(northwind.health_score, 92);
    assert_eq!(northwind.health_band, HealthBand::Green);
    assert_eq!(northwind.renewal_risk, RenewalRisk::Low);

    let globex = find("Globex Industries");
    assert_eq!(globex.health_score, 11);
    assert_eq!(globex.health_band, HealthBand::Red);
    assert_eq!(globex.renewal_risk, RenewalRisk::High);
    assert!(globex
        .recommendations
        .iter()
        .any(|rec| rec.rule == RuleId::HighTicketBurden));

    let wayne = find("Wayne Analytics");
    assert!(wayne.overdue);
    assert_eq!(wayne.renewal_risk, RenewalRisk::High);

    let summary = summarize(&outcome.scored);
    assert_eq!(summary.accounts, 12);
    assert_eq!(summary.total_arr, 3_387_500.0);
    assert_eq!(summary.bands.iter().map(|b| b.accounts).sum::<usize>(), 12);
}

#[test]
fn report_contains_every_section() {
    let ingested = load_accounts(&sample_path()).expect("load sample");
    let outcome = score_batch(&ingested.records, &Thresholds::default(), as_of());
    let filter = AccountFilter {
        bands: vec![HealthBand::Red],
        ..AccountFilter::default()
    };
    let report = build_report(&ReportInput {
        run_id: Uuid::nil(),
        as_of: as_of(),
        source: "sample_accounts.csv",
        outcome: &outcome,
        filter: &filter,
    });

    for heading in [
        "# Customer Health Report",
        "## Portfolio Summary",
        "## Health Band Distribution",
        "## ARR by Health Band",
        "## Account-level View",
        "## Recommended Actions",
        "## Data Quality",
    ] {
        assert!(report.contains(heading), "missing {heading}");
    }
    assert!(report.contains("### Globex Industries (Red 11"));
    assert!(!report.contains("### Northwind Traders"));
    assert!(report.contains("Cyberdyne Systems: CSAT was 5.4, scored as 5"));
}

#[test]
fn filtered_report_keeps_portfolio_totals() {
    let ingested = load_accounts(&sample_path()).expect("load sample");
    let outcome = score_batch(&ingested.records, &Thresholds::default(), as_of());
    let portfolio = summarize(&outcome.scored);
    let filter = AccountFilter {
        bands: vec![HealthBand::Red],
        ..AccountFilter::default()
    };
    let report = build_report(&ReportInput {
        run_id: Uuid::nil(),
        as_of: as_of(),
        source: "sample_accounts.csv",
        outcome: &outcome,
        filter: &filter,
    });

    assert!(report.contains("- Total ARR: $3,387,500"));
    assert!(report.contains(&format!("- Red accounts: {} of 12", portfolio.red_accounts)));
    for band in &portfolio.bands {
        let row = format!("{:<6} ", band.band.as_str());
        let line = report
            .lines()
            .skip_while(|line| *line != "## Health Band Distribution")
            .find(|line| line.starts_with(&row))
            .expect("band row");
        assert!(line.ends_with(&format!(" {}", band.accounts)), "{line}");
    }
}

const HEADER: &str =
    "Customer,Segment,ARR,Renewal_Date,NPS,Tickets_Last_90d,CSAT,Logins_Last_30d,Active_Users,Total_Seats";

/// One clean row and one that fails ingestion, plus a record only the
/// scoring engine rejects.
fn mixed_batch() -> Ingested {
    let file = write_temp(&format!(
        "{HEADER}\n\
         Acme,SMB,1000,2026-05-01,20,2,4.0,10,5,10\n\
         Broken,SMB,lots,2026-05-01,20,2,4.0,10,5,10\n"
    ));
    let mut ingested = load_accounts(file.path()).expect("load");
    let mut nan = ingested.records[0].clone();
    nan.customer = "Nan Co".to_string();
    nan.csat = Some(f64::NAN);
    ingested.records.push(nan);
    ingested
}

#[test]
fn strict_run_fails_on_any_rejected_row() {
    let err = pipeline::run(mixed_batch(), &Thresholds::default(), as_of(), true).unwrap_err();
    assert_eq!(
        err,
        RunError::StrictRejected {
            count: 2,
            first: ValidationError::InvalidValue {
                row: 2,
                field: "ARR",
                value: "lots".to_string()
            },
        }
    );
}

#[test]
fn strict_run_fails_on_engine_rejection_alone() {
    let mut ingested = load_accounts(&sample_path()).expect("load sample");
    let mut nan = ingested.records[0].clone();
    nan.csat = Some(f64::NAN);
    ingested.records.push(nan);

    let err = pipeline::run(ingested, &Thresholds::default(), as_of(), true).unwrap_err();
    assert_eq!(
        err,
        RunError::StrictRejected {
            count: 1,
            first: ValidationError::NonFinite { field: "CSAT" },
        }
    );
}

#[test]
fn lenient_run_reports_rejections_from_both_stages() {
    let outcome =
        pipeline::run(mixed_batch(), &Thresholds::default(), as_of(), false).expect("run");
    assert_eq!(outcome.scored.len(), 1);
    assert_eq!(outcome.scored[0].record.customer, "Acme");

    let rejected: Vec<(Option<usize>, Option<&str>)> = outcome
        .rejected
        .iter()
        .map(|r| (r.row, r.customer.as_deref()))
        .collect();
    assert_eq!(rejected, vec![(Some(2), Some("Broken")), (None, Some("Nan Co"))]);
}

#[test]
fn strict_run_passes_a_clean_export() {
    let ingested = load_accounts(&sample_path()).expect("load sample");
    let outcome = pipeline::run(ingested, &Thresholds::default(), as_of(), true).expect("run");
    assert_eq!(outcome.scored.len(), 12);
    assert!(outcome.rejected.is_empty());
}

#[test]
fn missing_columns_abort_the_load() {
    let file = write_temp("Customer,Segment,ARR,NPS\nAcme,SMB,100,10\n");
    let err = load_accounts(file.path()).unwrap_err();
    let validation = err
        .downcast_ref::<ValidationError>()
        .expect("validation error");
    assert_eq!(
        validation,
        &ValidationError::MissingColumns(vec![
            "Renewal_Date".to_string(),
            "Tickets_Last_90d".to_string(),
            "CSAT".to_string(),
            "Logins_Last_30d".to_string(),
            "Active_Users".to_string(),
            "Total_Seats".to_string(),
        ])
    );
}

#[test]
fn rejected_rows_are_reported_and_excluded() {
    let file = write_temp(
        "Customer,Segment,ARR,Renewal_Date,NPS,Tickets_Last_90d,CSAT,Logins_Last_30d,Active_Users,Total_Seats\n\
         Acme,SMB,1000,2026-05-01,20,2,4.0,10,5,10\n\
         Broken,SMB,lots,2026-05-01,20,2,4.0,10,5,10\n",
    );
    let ingested = load_accounts(file.path()).expect("load");
    assert_eq!(ingested.records.len(), 1);
    assert_eq!(ingested.rejected.len(), 1);
    assert_eq!(ingested.rejected[0].customer.as_deref(), Some("Broken"));
    assert_eq!(
        ingested.rejected[0].error,
        ValidationError::InvalidValue {
            row: 2,
            field: "ARR",
            value: "lots".to_string()
        }
    );
}

#[test]
fn thresholds_file_with_bad_weights_fails_before_scoring() {
    let file = write_temp(
        r#"{"weights": {"nps": 0.4, "csat": 0.4, "usage": 0.4, "logins": 0.0, "tickets": 0.0}}"#,
    );
    let err = Thresholds::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::WeightsSum { .. }));
}

#[test]
fn thresholds_round_trip_through_json() {
    let defaults = Thresholds::default();
    let json = serde_json::to_string(&defaults).expect("encode");
    let file = write_temp(&json);
    assert_eq!(Thresholds::load(file.path()).expect("load"), defaults);
}
