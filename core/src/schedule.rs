//! Installment scheduling.
//!
//! Expands an investment into its full amortized payment schedule: one
//! commission installment per (active beneficiary, month) plus, when the
//! investment carries an investor yield, one remuneration installment per
//! month. Pure — persistence happens in one atomic call afterwards.
//!
//! The arithmetic is deliberate legacy behavior and must not be "improved":
//! equal f64 division with no remainder-cent reconciliation, and a fixed
//! 30-day due-date cadence rather than true calendar months.

use crate::{
    catalog::SeriesRecord,
    investment::InvestmentRecord,
    types::{BeneficiaryRole, InstallmentStatus, InvestmentId, UserId},
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommissionInstallment {
    pub investment_id: InvestmentId,
    pub recipient_user_id: UserId,
    pub role: BeneficiaryRole,
    pub percentage: f64,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub installment_number: u32,
    pub status: InstallmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemunerationInstallment {
    pub investment_id: InvestmentId,
    pub investor_user_id: UserId,
    pub yield_percent: f64,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub installment_number: u32,
    pub status: InstallmentStatus,
}

/// Everything one investment generates, returned together so the ledger can
/// persist it in a single all-or-nothing call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleBatch {
    pub commissions: Vec<CommissionInstallment>,
    pub remunerations: Vec<RemunerationInstallment>,
}

impl ScheduleBatch {
    pub fn is_empty(&self) -> bool {
        self.commissions.is_empty() && self.remunerations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commissions.len() + self.remunerations.len()
    }
}

/// Due date of installment `number` (1-based): a fixed 30-day cadence from
/// the start date. Not calendar-month-aware, for compatibility with the
/// schedules already in production.
pub fn due_date(start_date: NaiveDate, interval_days: i64, number: u32) -> NaiveDate {
    start_date + Duration::days(interval_days * i64::from(number))
}

/// Expands `investment` against its series into the full installment batch.
///
/// Beneficiary slots with no user or a non-positive percentage are dropped.
/// An investment where every slot drops out still succeeds with an empty
/// commission side. A zero-month term produces an empty batch outright —
/// the series invariant makes that unreachable, but the scheduler must not
/// divide by it.
pub fn schedule(
    investment: &InvestmentRecord,
    series: &SeriesRecord,
    interval_days: i64,
) -> ScheduleBatch {
    let term_months = series.term_months;
    if term_months == 0 {
        log::error!(
            "schedule: series {} has a zero-month term; producing no installments",
            series.series_id
        );
        return ScheduleBatch::default();
    }

    let mut batch = ScheduleBatch::default();

    for beneficiary in investment.split.active_beneficiaries() {
        let total_commission = investment.amount * beneficiary.percent / 100.0;
        let monthly = total_commission / f64::from(term_months);

        for number in 1..=term_months {
            batch.commissions.push(CommissionInstallment {
                investment_id: investment.investment_id.clone(),
                recipient_user_id: beneficiary.user_id.clone(),
                role: beneficiary.role,
                percentage: beneficiary.percent,
                amount: monthly,
                due_date: due_date(investment.start_date, interval_days, number),
                installment_number: number,
                status: InstallmentStatus::Pending,
            });
        }
    }

    if let Some(yield_percent) = investment.yield_percent {
        if yield_percent > 0.0 {
            let total_yield = investment.amount * yield_percent / 100.0;
            let monthly = total_yield / f64::from(term_months);

            for number in 1..=term_months {
                batch.remunerations.push(RemunerationInstallment {
                    investment_id: investment.investment_id.clone(),
                    investor_user_id: investment.investor_user_id.clone(),
                    yield_percent,
                    amount: monthly,
                    due_date: due_date(investment.start_date, interval_days, number),
                    installment_number: number,
                    status: InstallmentStatus::Pending,
                });
            }
        }
    }

    batch
}
