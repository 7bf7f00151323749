//! Debenture and series catalog records plus capacity arithmetic.
//!
//! Captured amounts are never stored redundantly: the store derives them by
//! summing active investments, and the checks here compare those sums to the
//! configured capacities.

use crate::{
    error::{EngineError, EngineResult},
    types::{DebentureId, IssueStatus, SeriesId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebentureRecord {
    pub debenture_id: DebentureId,
    pub name: String,
    pub issuer_name: String,
    pub total_emission_value: f64,
    pub emission_date: NaiveDate,
    pub status: IssueStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub series_id: SeriesId,
    pub debenture_id: DebentureId,
    pub series_code: String,
    pub name: String,
    pub term_months: u32,
    pub annual_yield_percent: f64,
    pub max_commission_percent: f64,
    pub minimum_investment: f64,
    pub maximum_investment: Option<f64>,
    pub max_captation: Option<f64>,
    pub status: IssueStatus,
}

impl SeriesRecord {
    /// The ceiling is configured as an annual percentage; screens display
    /// the derived monthly rate.
    pub fn monthly_commission_ceiling(&self) -> f64 {
        self.max_commission_percent / 12.0
    }
}

/// Checks that an additional `amount` fits within the series' own
/// fundraising capacity, given the amount already captured.
pub fn check_series_capacity(
    series: &SeriesRecord,
    captured: f64,
    amount: f64,
) -> EngineResult<()> {
    if let Some(cap) = series.max_captation {
        let attempted = captured + amount;
        if attempted > cap {
            return Err(EngineError::CapacityExceeded {
                scope: "series",
                attempted,
                capacity: cap,
            });
        }
    }
    Ok(())
}

/// Checks that an additional `amount` fits within the parent debenture's
/// total emission value, given the amount captured across all its series.
pub fn check_debenture_capacity(
    debenture: &DebentureRecord,
    captured: f64,
    amount: f64,
) -> EngineResult<()> {
    let attempted = captured + amount;
    if attempted > debenture.total_emission_value {
        return Err(EngineError::CapacityExceeded {
            scope: "debenture",
            attempted,
            capacity: debenture.total_emission_value,
        });
    }
    Ok(())
}
