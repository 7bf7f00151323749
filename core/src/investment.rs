//! Investment records and the four-slot commission split.
//!
//! RULE: the split (beneficiaries and percentages) is immutable once the
//! installment batch exists. Regeneration requires deleting the investment,
//! which cascades to its installments.

use crate::types::{BeneficiaryRole, InvestmentId, InvestmentStatus, SeriesId, UserId};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// One of the four beneficiary slots. A slot with no user or a zero
/// percentage simply does not generate installments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeneficiarySlot {
    pub user_id: Option<UserId>,
    pub percent: f64,
}

impl BeneficiarySlot {
    pub fn new(user_id: impl Into<UserId>, percent: f64) -> Self {
        Self {
            user_id: Some(user_id.into()),
            percent,
        }
    }
}

/// The full commission split attached to an investment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommissionSplit {
    pub master: BeneficiarySlot,
    pub branch_office: BeneficiarySlot,
    pub relationship_manager: BeneficiarySlot,
    pub agent: BeneficiarySlot,
}

/// A (role, percentage) pair as submitted for validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SplitLine {
    pub role: BeneficiaryRole,
    pub percent: f64,
}

/// A slot that survives filtering: a real recipient with a positive share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveBeneficiary {
    pub role: BeneficiaryRole,
    pub user_id: UserId,
    pub percent: f64,
}

impl CommissionSplit {
    pub fn slot(&self, role: BeneficiaryRole) -> &BeneficiarySlot {
        match role {
            BeneficiaryRole::Master => &self.master,
            BeneficiaryRole::BranchOffice => &self.branch_office,
            BeneficiaryRole::RelationshipManager => &self.relationship_manager,
            BeneficiaryRole::Agent => &self.agent,
        }
    }

    /// All four lines, zero or not, for ceiling validation.
    pub fn lines(&self) -> Vec<SplitLine> {
        BeneficiaryRole::ALL
            .iter()
            .map(|&role| SplitLine {
                role,
                percent: self.slot(role).percent,
            })
            .collect()
    }

    /// Slots that will actually generate installments: a beneficiary id is
    /// present and the percentage is positive.
    pub fn active_beneficiaries(&self) -> Vec<ActiveBeneficiary> {
        BeneficiaryRole::ALL
            .iter()
            .filter_map(|&role| {
                let slot = self.slot(role);
                match &slot.user_id {
                    Some(user_id) if slot.percent > 0.0 => Some(ActiveBeneficiary {
                        role,
                        user_id: user_id.clone(),
                        percent: slot.percent,
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    pub fn total_percent(&self) -> f64 {
        self.lines().iter().map(|l| l.percent).sum()
    }

    pub fn beneficiary_ids(&self) -> Vec<&UserId> {
        BeneficiaryRole::ALL
            .iter()
            .filter_map(|&role| self.slot(role).user_id.as_ref())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentRecord {
    pub investment_id: InvestmentId,
    pub series_id: SeriesId,
    pub investor_user_id: UserId,
    pub split: CommissionSplit,
    pub amount: f64,
    /// Investor yield. Absent means no remuneration schedule is generated.
    pub yield_percent: Option<f64>,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub status: InvestmentStatus,
}

impl InvestmentRecord {
    /// Every user who is a direct party to this investment: the investor
    /// plus whichever beneficiary slots are filled.
    pub fn is_party(&self, user_id: &str) -> bool {
        if self.investor_user_id == user_id {
            return true;
        }
        self.split
            .beneficiary_ids()
            .iter()
            .any(|id| id.as_str() == user_id)
    }
}

/// Maturity is derived, never entered: start date plus the series term in
/// calendar months (month-end dates clamp, per chrono).
pub fn maturity_date(start_date: NaiveDate, term_months: u32) -> NaiveDate {
    start_date
        .checked_add_months(Months::new(term_months))
        .unwrap_or(start_date)
}
