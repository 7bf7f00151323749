//! Commission/remuneration ledger writer.
//!
//! The only concurrency-sensitive contract in the core: installments are
//! written exactly once per investment. The duplicate guard lives in the
//! store (transactional re-check plus UNIQUE constraints), never in
//! in-process state.

use crate::{
    config::EngineConfig,
    error::{EngineError, EngineResult},
    schedule,
    store::{BatchReceipt, SqlStore},
};

pub struct LedgerWriter<'a> {
    store: &'a SqlStore,
    config: &'a EngineConfig,
}

impl<'a> LedgerWriter<'a> {
    pub fn new(store: &'a SqlStore, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Generates and persists the installment batch for `investment_id`,
    /// exactly once.
    ///
    /// A second call — or a concurrent one that lost the race — gets
    /// `AlreadyGenerated`, which callers treat as a retry-safe no-op, not a
    /// failure. A missing investment or series is `ValidationFailed`:
    /// upstream invariants should make that impossible, so it is logged as
    /// a defect.
    pub fn generate_once(&self, investment_id: &str) -> EngineResult<BatchReceipt> {
        let investment = self.store.get_investment(investment_id)?.ok_or_else(|| {
            log::error!("ledger: generate_once for unknown investment {investment_id}");
            EngineError::validation(format!("investment {investment_id} not found"))
        })?;
        let series = self.store.get_series(&investment.series_id)?.ok_or_else(|| {
            log::error!(
                "ledger: investment {investment_id} references missing series {}",
                investment.series_id
            );
            EngineError::validation(format!("series {} not found", investment.series_id))
        })?;

        // Cheap short-circuit; the store re-checks inside the transaction.
        if self.store.installment_count(investment_id)? > 0 {
            return Err(EngineError::AlreadyGenerated {
                investment_id: investment_id.to_string(),
            });
        }

        let batch = schedule::schedule(
            &investment,
            &series,
            self.config.installment_interval_days,
        );

        match self
            .store
            .insert_installment_batch_if_absent(investment_id, &batch)?
        {
            Some(receipt) => {
                log::info!(
                    "ledger: investment {investment_id} generated {} commission + {} remuneration installments",
                    receipt.commission_installments,
                    receipt.remuneration_installments
                );
                Ok(receipt)
            }
            None => Err(EngineError::AlreadyGenerated {
                investment_id: investment_id.to_string(),
            }),
        }
    }

    /// Payment transition. Returns false when the installment was not
    /// pending; paid rows are never reverted.
    pub fn mark_commission_paid(&self, installment_id: &str) -> EngineResult<bool> {
        let changed = self.store.mark_commission_paid(installment_id)?;
        if changed {
            log::info!("ledger: commission installment {installment_id} marked paid");
        }
        Ok(changed)
    }

    pub fn mark_remuneration_paid(&self, installment_id: &str) -> EngineResult<bool> {
        let changed = self.store.mark_remuneration_paid(installment_id)?;
        if changed {
            log::info!("ledger: remuneration installment {installment_id} marked paid");
        }
        Ok(changed)
    }
}
