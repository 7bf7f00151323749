//! Ledger writer tests — the generate-exactly-once guarantee, payment
//! transitions, and batch ownership (cascade delete).

use chrono::NaiveDate;
use debenture_core::{
    engine::{CommissionEngine, NewDebenture, NewInvestment, NewSeries, NewUser},
    error::EngineError,
    investment::{BeneficiarySlot, CommissionSplit},
    types::{InstallmentStatus, Role},
};

struct Fixture {
    engine: CommissionEngine,
    series_id: String,
    master_id: String,
    investor_id: String,
}

fn setup() -> Fixture {
    let engine = CommissionEngine::build_test().unwrap();

    let global = engine
        .register_user(NewUser {
            full_name: "Root Admin".to_string(),
            email: "root@desk.test".to_string(),
            role: Role::Global,
            superior_user_id: None,
            pix_key: None,
        })
        .unwrap();
    let master = engine
        .register_user(NewUser {
            full_name: "Alice Master".to_string(),
            email: "alice@desk.test".to_string(),
            role: Role::Master,
            superior_user_id: Some(global.user_id),
            pix_key: Some("alice-pix".to_string()),
        })
        .unwrap();
    let investor = engine
        .register_user(NewUser {
            full_name: "Ivan Investor".to_string(),
            email: "ivan@desk.test".to_string(),
            role: Role::Investor,
            superior_user_id: Some(master.user_id.clone()),
            pix_key: None,
        })
        .unwrap();

    let debenture = engine
        .create_debenture(NewDebenture {
            name: "Deb I".to_string(),
            issuer_name: "Issuer SA".to_string(),
            total_emission_value: 10_000_000.0,
            emission_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .unwrap();
    let series = engine
        .create_series(NewSeries {
            debenture_id: debenture.debenture_id,
            series_code: "A1".to_string(),
            name: "Series A1".to_string(),
            term_months: 12,
            annual_yield_percent: 14.0,
            max_commission_percent: Some(10.0),
            minimum_investment: 0.0,
            maximum_investment: None,
            max_captation: None,
        })
        .unwrap();

    Fixture {
        engine,
        series_id: series.series_id,
        master_id: master.user_id,
        investor_id: investor.user_id,
    }
}

fn create_investment(f: &Fixture) -> String {
    f.engine
        .create_investment(NewInvestment {
            series_id: f.series_id.clone(),
            investor_user_id: f.investor_id.clone(),
            split: CommissionSplit {
                master: BeneficiarySlot::new(f.master_id.clone(), 4.0),
                ..Default::default()
            },
            amount: 100_000.0,
            yield_percent: Some(14.0),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        })
        .unwrap()
        .investment_id
}

/// generate_once called twice produces installments exactly once. The
/// second call reports AlreadyGenerated and counts are unchanged.
#[test]
fn second_generation_is_an_idempotent_no_op() {
    let f = setup();
    let investment_id = create_investment(&f);

    let receipt = f.engine.generate_once(&investment_id).unwrap();
    assert_eq!(receipt.commission_installments, 12);
    assert_eq!(receipt.remuneration_installments, 12);

    let before = f.engine.store().installment_count(&investment_id).unwrap();
    assert_eq!(before, 24);

    match f.engine.generate_once(&investment_id) {
        Err(EngineError::AlreadyGenerated { investment_id: id }) => {
            assert_eq!(id, investment_id);
        }
        other => panic!("expected AlreadyGenerated, got {other:?}"),
    }

    let after = f.engine.store().installment_count(&investment_id).unwrap();
    assert_eq!(after, before, "retry must not change the installment count");
}

/// Generating for an id with no investment row is a ValidationFailed — an
/// upstream defect, not a user-facing condition.
#[test]
fn unknown_investment_is_a_validation_failure() {
    let f = setup();
    match f.engine.generate_once("inv-does-not-exist") {
        Err(EngineError::ValidationFailed { reason }) => {
            assert!(reason.contains("inv-does-not-exist"));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
}

/// Paying an installment is one-way: a paid row never reverts and a second
/// mark is a no-op.
#[test]
fn payment_transition_is_one_way() {
    let f = setup();
    let investment_id = create_investment(&f);
    f.engine.generate_once(&investment_id).unwrap();

    let pending = f.engine.store().pending_commission_ids(&investment_id).unwrap();
    assert_eq!(pending.len(), 12);

    let first = &pending[0];
    assert!(f.engine.mark_commission_paid(first).unwrap(), "first mark pays");
    assert!(
        !f.engine.mark_commission_paid(first).unwrap(),
        "second mark is a no-op"
    );

    let totals = f.engine.commission_totals().unwrap();
    assert_eq!(totals.paid_count, 1);
    assert_eq!(totals.pending_count, 11);
}

/// Cancelling an investment voids pending installments but keeps paid
/// history.
#[test]
fn cancellation_voids_pending_keeps_paid() {
    let f = setup();
    let investment_id = create_investment(&f);
    f.engine.generate_once(&investment_id).unwrap();

    let pending = f.engine.store().pending_commission_ids(&investment_id).unwrap();
    f.engine.mark_commission_paid(&pending[0]).unwrap();

    // 11 pending commissions + 12 pending remunerations.
    let voided = f.engine.cancel_investment(&investment_id).unwrap();
    assert_eq!(voided, 23);

    let commissions = f
        .engine
        .store()
        .commissions_for_investment(&investment_id)
        .unwrap();
    let paid = commissions
        .iter()
        .filter(|c| c.status == InstallmentStatus::Paid)
        .count();
    let cancelled = commissions
        .iter()
        .filter(|c| c.status == InstallmentStatus::Cancelled)
        .count();
    assert_eq!(paid, 1, "paid history survives cancellation");
    assert_eq!(cancelled, 11);
}

/// The investment exclusively owns its installments: deleting it removes
/// the whole batch, which is the only path to regeneration.
#[test]
fn delete_cascades_and_reopens_generation() {
    let f = setup();
    let investment_id = create_investment(&f);
    f.engine.generate_once(&investment_id).unwrap();
    assert_eq!(f.engine.store().installment_count(&investment_id).unwrap(), 24);

    f.engine.delete_investment(&investment_id).unwrap();
    assert_eq!(
        f.engine.store().installment_count(&investment_id).unwrap(),
        0,
        "cascade delete must remove the full batch"
    );

    // A fresh investment with the same shape can generate again.
    let second = create_investment(&f);
    let receipt = f.engine.generate_once(&second).unwrap();
    assert_eq!(receipt.created(), 24);
}

/// Totals by status feed the dashboards; they must reconcile with the raw
/// rows.
#[test]
fn status_totals_reconcile() {
    let f = setup();
    let investment_id = create_investment(&f);
    f.engine.generate_once(&investment_id).unwrap();

    let totals = f.engine.commission_totals().unwrap();
    assert_eq!(totals.pending_count, 12);
    // 100_000 * 4% = 4_000 across the year.
    assert!((totals.pending_amount - 4_000.0).abs() < 1e-6);

    let remuneration = f.engine.remuneration_totals().unwrap();
    assert_eq!(remuneration.pending_count, 12);
    assert!((remuneration.pending_amount - 14_000.0).abs() < 1e-6);
}
