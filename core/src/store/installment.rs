//! Installment persistence: the atomic batch insert behind the ledger's
//! idempotency guarantee, status transitions, and ledger aggregates.

use super::{parse_date, SqlStore};
use crate::{
    error::EngineResult,
    schedule::{CommissionInstallment, RemunerationInstallment, ScheduleBatch},
    types::InstallmentStatus,
};
use chrono::Utc;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counts of what one batch insert actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    pub commission_installments: usize,
    pub remuneration_installments: usize,
}

impl BatchReceipt {
    pub fn created(&self) -> usize {
        self.commission_installments + self.remuneration_installments
    }
}

/// Ledger totals by payment status, for dashboards and run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusTotals {
    pub pending_count: i64,
    pub pending_amount: f64,
    pub paid_count: i64,
    pub paid_amount: f64,
    pub cancelled_count: i64,
    pub cancelled_amount: f64,
}

impl SqlStore {
    /// Inserts the full batch iff no installment — commission or
    /// remuneration — exists for the investment yet. One transaction:
    /// either every record lands or none does, and a concurrent writer
    /// hitting the same investment is stopped by the re-check inside the
    /// transaction plus the schema UNIQUE constraints.
    ///
    /// Returns `None` when a batch already exists (the caller's
    /// idempotent-retry signal), `Some(receipt)` after a real insert.
    pub fn insert_installment_batch_if_absent(
        &self,
        investment_id: &str,
        batch: &ScheduleBatch,
    ) -> EngineResult<Option<BatchReceipt>> {
        let tx = self.connection().unchecked_transaction()?;

        let existing: i64 = tx.query_row(
            "SELECT (SELECT COUNT(*) FROM commission_installments WHERE investment_id = ?1)
                  + (SELECT COUNT(*) FROM remuneration_installments WHERE investment_id = ?1)",
            params![investment_id],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(None);
        }

        let created_at = Utc::now().to_rfc3339();

        for c in &batch.commissions {
            tx.execute(
                "INSERT INTO commission_installments (
                    installment_id, investment_id, recipient_user_id, role,
                    percentage, amount, due_date, installment_number,
                    status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    Uuid::new_v4().to_string(),
                    c.investment_id,
                    c.recipient_user_id,
                    c.role,
                    c.percentage,
                    c.amount,
                    c.due_date.to_string(),
                    c.installment_number,
                    c.status,
                    created_at,
                ],
            )?;
        }

        for r in &batch.remunerations {
            tx.execute(
                "INSERT INTO remuneration_installments (
                    installment_id, investment_id, investor_user_id,
                    yield_percent, amount, due_date, installment_number,
                    status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    Uuid::new_v4().to_string(),
                    r.investment_id,
                    r.investor_user_id,
                    r.yield_percent,
                    r.amount,
                    r.due_date.to_string(),
                    r.installment_number,
                    r.status,
                    created_at,
                ],
            )?;
        }

        tx.commit()?;

        Ok(Some(BatchReceipt {
            commission_installments: batch.commissions.len(),
            remuneration_installments: batch.remunerations.len(),
        }))
    }

    pub fn installment_count(&self, investment_id: &str) -> EngineResult<i64> {
        self.connection()
            .query_row(
                "SELECT (SELECT COUNT(*) FROM commission_installments WHERE investment_id = ?1)
                      + (SELECT COUNT(*) FROM remuneration_installments WHERE investment_id = ?1)",
                params![investment_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn commissions_for_investment(
        &self,
        investment_id: &str,
    ) -> EngineResult<Vec<CommissionInstallment>> {
        let mut stmt = self.connection().prepare(
            "SELECT investment_id, recipient_user_id, role, percentage,
                    amount, due_date, installment_number, status
             FROM commission_installments
             WHERE investment_id = ?1
             ORDER BY role ASC, installment_number ASC",
        )?;
        let rows = stmt.query_map(params![investment_id], |row| {
            Ok(CommissionInstallment {
                investment_id: row.get(0)?,
                recipient_user_id: row.get(1)?,
                role: row.get(2)?,
                percentage: row.get(3)?,
                amount: row.get(4)?,
                due_date: parse_date(5, row.get::<_, String>(5)?)?,
                installment_number: row.get(6)?,
                status: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn remunerations_for_investment(
        &self,
        investment_id: &str,
    ) -> EngineResult<Vec<RemunerationInstallment>> {
        let mut stmt = self.connection().prepare(
            "SELECT investment_id, investor_user_id, yield_percent,
                    amount, due_date, installment_number, status
             FROM remuneration_installments
             WHERE investment_id = ?1
             ORDER BY installment_number ASC",
        )?;
        let rows = stmt.query_map(params![investment_id], |row| {
            Ok(RemunerationInstallment {
                investment_id: row.get(0)?,
                investor_user_id: row.get(1)?,
                yield_percent: row.get(2)?,
                amount: row.get(3)?,
                due_date: parse_date(4, row.get::<_, String>(4)?)?,
                installment_number: row.get(5)?,
                status: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Total commission owed to one recipient across an investment.
    pub fn commission_total_for_recipient(
        &self,
        investment_id: &str,
        recipient_user_id: &str,
    ) -> EngineResult<f64> {
        self.connection()
            .query_row(
                "SELECT COALESCE(SUM(amount), 0.0) FROM commission_installments
                 WHERE investment_id = ?1 AND recipient_user_id = ?2",
                params![investment_id, recipient_user_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Marks one pending commission installment as paid. Returns false when
    /// the installment is not pending (already paid or cancelled) — paid
    /// rows are never reverted.
    pub fn mark_commission_paid(&self, installment_id: &str) -> EngineResult<bool> {
        let changed = self.connection().execute(
            "UPDATE commission_installments SET status = 'paid'
             WHERE installment_id = ?1 AND status = 'pending'",
            params![installment_id],
        )?;
        Ok(changed > 0)
    }

    pub fn mark_remuneration_paid(&self, installment_id: &str) -> EngineResult<bool> {
        let changed = self.connection().execute(
            "UPDATE remuneration_installments SET status = 'paid'
             WHERE installment_id = ?1 AND status = 'pending'",
            params![installment_id],
        )?;
        Ok(changed > 0)
    }

    /// Cancels every still-pending installment of an investment, both
    /// ledgers. Paid rows keep their history.
    pub fn cancel_pending_installments(&self, investment_id: &str) -> EngineResult<usize> {
        let commissions = self.connection().execute(
            "UPDATE commission_installments SET status = 'cancelled'
             WHERE investment_id = ?1 AND status = 'pending'",
            params![investment_id],
        )?;
        let remunerations = self.connection().execute(
            "UPDATE remuneration_installments SET status = 'cancelled'
             WHERE investment_id = ?1 AND status = 'pending'",
            params![investment_id],
        )?;
        Ok(commissions + remunerations)
    }

    pub fn pending_commission_ids(&self, investment_id: &str) -> EngineResult<Vec<String>> {
        let mut stmt = self.connection().prepare(
            "SELECT installment_id FROM commission_installments
             WHERE investment_id = ?1 AND status = 'pending'
             ORDER BY installment_number ASC",
        )?;
        let ids = stmt
            .query_map(params![investment_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn commission_totals_by_status(&self) -> EngineResult<StatusTotals> {
        self.totals_by_status("commission_installments")
    }

    pub fn remuneration_totals_by_status(&self) -> EngineResult<StatusTotals> {
        self.totals_by_status("remuneration_installments")
    }

    fn totals_by_status(&self, table: &str) -> EngineResult<StatusTotals> {
        // Table name is one of two compile-time constants, never user input.
        let sql = format!(
            "SELECT status, COUNT(*), COALESCE(SUM(amount), 0.0)
             FROM {table} GROUP BY status"
        );
        let mut stmt = self.connection().prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, InstallmentStatus>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?;

        let mut totals = StatusTotals::default();
        for row in rows {
            let (status, count, amount) = row?;
            match status {
                InstallmentStatus::Pending => {
                    totals.pending_count = count;
                    totals.pending_amount = amount;
                }
                InstallmentStatus::Paid => {
                    totals.paid_count = count;
                    totals.paid_amount = amount;
                }
                InstallmentStatus::Cancelled => {
                    totals.cancelled_count = count;
                    totals.cancelled_amount = amount;
                }
            }
        }
        Ok(totals)
    }
}
