//! Capacity and bounds tests — series captation, debenture emission value,
//! and per-series investment limits, all checked before insert.

use chrono::NaiveDate;
use debenture_core::{
    engine::{CommissionEngine, NewDebenture, NewInvestment, NewSeries, NewUser},
    error::EngineError,
    investment::CommissionSplit,
    types::Role,
};

struct Fixture {
    engine: CommissionEngine,
    investor_id: String,
    debenture_id: String,
}

fn setup() -> Fixture {
    let engine = CommissionEngine::build_test().unwrap();

    let master = engine
        .register_user(NewUser {
            full_name: "Mara Master".to_string(),
            email: "mara@desk.test".to_string(),
            role: Role::Master,
            superior_user_id: None,
            pix_key: None,
        })
        .unwrap();
    let investor = engine
        .register_user(NewUser {
            full_name: "Ivy Investor".to_string(),
            email: "ivy@desk.test".to_string(),
            role: Role::Investor,
            superior_user_id: Some(master.user_id),
            pix_key: None,
        })
        .unwrap();

    let debenture = engine
        .create_debenture(NewDebenture {
            name: "Deb I".to_string(),
            issuer_name: "Issuer SA".to_string(),
            total_emission_value: 300_000.0,
            emission_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .unwrap();

    Fixture {
        engine,
        investor_id: investor.user_id,
        debenture_id: debenture.debenture_id,
    }
}

fn series(f: &Fixture, code: &str, max_captation: Option<f64>) -> String {
    f.engine
        .create_series(NewSeries {
            debenture_id: f.debenture_id.clone(),
            series_code: code.to_string(),
            name: format!("Series {code}"),
            term_months: 12,
            annual_yield_percent: 14.0,
            max_commission_percent: Some(10.0),
            minimum_investment: 10_000.0,
            maximum_investment: Some(150_000.0),
            max_captation,
        })
        .unwrap()
        .series_id
}

fn invest(f: &Fixture, series_id: &str, amount: f64) -> Result<String, EngineError> {
    f.engine
        .create_investment(NewInvestment {
            series_id: series_id.to_string(),
            investor_user_id: f.investor_id.clone(),
            split: CommissionSplit::default(),
            amount,
            yield_percent: None,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        })
        .map(|i| i.investment_id)
}

/// Series captation is a running, derived sum; the investment that would
/// push it past the cap is rejected.
#[test]
fn series_captation_cap_blocks_overflow() {
    let f = setup();
    let series_id = series(&f, "A1", Some(200_000.0));

    invest(&f, &series_id, 120_000.0).unwrap();
    assert!((f.engine.series_captured(&series_id).unwrap() - 120_000.0).abs() < 1e-9);

    match invest(&f, &series_id, 100_000.0) {
        Err(EngineError::CapacityExceeded { scope, attempted, capacity }) => {
            assert_eq!(scope, "series");
            assert!((attempted - 220_000.0).abs() < 1e-9);
            assert!((capacity - 200_000.0).abs() < 1e-9);
        }
        other => panic!("expected series CapacityExceeded, got {other:?}"),
    }

    // Filling exactly to the cap is fine.
    invest(&f, &series_id, 80_000.0).unwrap();
}

/// The debenture's total emission value bounds the sum across all series.
#[test]
fn debenture_emission_value_bounds_all_series() {
    let f = setup();
    let series_a = series(&f, "A1", None);
    let series_b = series(&f, "B1", None);

    invest(&f, &series_a, 150_000.0).unwrap();
    invest(&f, &series_b, 100_000.0).unwrap();

    // 150k + 100k captured; another 100k would pass both series' own
    // limits but breach the 300k debenture total.
    match invest(&f, &series_b, 100_000.0) {
        Err(EngineError::CapacityExceeded { scope, .. }) => assert_eq!(scope, "debenture"),
        other => panic!("expected debenture CapacityExceeded, got {other:?}"),
    }
}

/// Cancelled investments release their capacity: captured sums count
/// active rows only.
#[test]
fn cancelled_investments_release_capacity() {
    let f = setup();
    let series_id = series(&f, "A1", Some(200_000.0));

    let first = invest(&f, &series_id, 150_000.0).unwrap();
    f.engine.cancel_investment(&first).unwrap();
    assert!((f.engine.series_captured(&series_id).unwrap()).abs() < 1e-9);

    invest(&f, &series_id, 150_000.0).unwrap();
}

/// A series taken off the shelf stops accepting investments.
#[test]
fn inactive_series_rejects_investment() {
    let f = setup();
    let series_id = series(&f, "A1", None);

    f.engine
        .store()
        .set_series_status(&series_id, debenture_core::types::IssueStatus::Inactive)
        .unwrap();

    assert!(matches!(
        invest(&f, &series_id, 50_000.0),
        Err(EngineError::ValidationFailed { .. })
    ));
}

/// Per-investment bounds: below the series minimum or above the maximum is
/// rejected before anything persists.
#[test]
fn amount_bounds_are_enforced() {
    let f = setup();
    let series_id = series(&f, "A1", None);

    assert!(matches!(
        invest(&f, &series_id, 5_000.0),
        Err(EngineError::ValidationFailed { .. })
    ));
    assert!(matches!(
        invest(&f, &series_id, 151_000.0),
        Err(EngineError::ValidationFailed { .. })
    ));
    assert_eq!(f.engine.store().investment_count().unwrap(), 0);
}
