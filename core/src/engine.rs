//! The engine facade — wires the store, config, and the component modules
//! into the workflows the platform's screens call.
//!
//! CREATION ORDER (fixed, mirrors the production workflow):
//!   1. validate the split against the series ceiling,
//!   2. validate amount bounds and fundraising capacity,
//!   3. insert the investment row,
//!   4. generate the installment batch (idempotent, see ledger.rs).
//!
//! RULES:
//!   - Screens never reimplement gate logic; they call is_visible /
//!     field_access / can_access here.
//!   - The engine owns no mutable state of its own; everything lives in
//!     the store.

use crate::{
    access,
    catalog::{self, DebentureRecord, SeriesRecord},
    config::EngineConfig,
    error::{EngineError, EngineResult},
    hierarchy::{HierarchyResolver, UserRecord},
    investment::{maturity_date, CommissionSplit, InvestmentRecord},
    ledger::LedgerWriter,
    split::validate_split,
    store::{BatchReceipt, SqlStore, StatusTotals},
    types::{
        DebentureId, FieldTag, InvestmentStatus, IssueStatus, Module, ModuleAction, Role,
        SeriesId, UserId, UserStatus,
    },
    visibility::{self, FieldAccess},
};
use chrono::NaiveDate;
use uuid::Uuid;

pub struct CommissionEngine {
    store: SqlStore,
    config: EngineConfig,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub superior_user_id: Option<UserId>,
    pub pix_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDebenture {
    pub name: String,
    pub issuer_name: String,
    pub total_emission_value: f64,
    pub emission_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewSeries {
    pub debenture_id: DebentureId,
    pub series_code: String,
    pub name: String,
    pub term_months: u32,
    pub annual_yield_percent: f64,
    /// Falls back to the configured default ceiling when absent.
    pub max_commission_percent: Option<f64>,
    pub minimum_investment: f64,
    pub maximum_investment: Option<f64>,
    pub max_captation: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub series_id: SeriesId,
    pub investor_user_id: UserId,
    pub split: CommissionSplit,
    pub amount: f64,
    /// Investor yield for the remuneration schedule. Usually the series'
    /// annual yield; absent means no remuneration is generated.
    pub yield_percent: Option<f64>,
    pub start_date: NaiveDate,
}

impl CommissionEngine {
    pub fn new(store: SqlStore, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn open(path: &str, config: EngineConfig) -> EngineResult<Self> {
        let store = SqlStore::open(path)?;
        store.migrate()?;
        Ok(Self::new(store, config))
    }

    /// In-memory engine with a migrated schema. Used across the test suite.
    pub fn build_test() -> EngineResult<Self> {
        let store = SqlStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store, EngineConfig::default()))
    }

    pub fn store(&self) -> &SqlStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Users ──────────────────────────────────────────────────

    /// Administrative user registration. The superior, when given, must
    /// exist and must not be an investor (investors hold no subordinates).
    pub fn register_user(&self, new: NewUser) -> EngineResult<UserRecord> {
        if let Some(superior_id) = &new.superior_user_id {
            let superior = self.store.get_user(superior_id)?.ok_or_else(|| {
                EngineError::validation(format!("superior {superior_id} not found"))
            })?;
            if superior.role == Role::Investor {
                return Err(EngineError::validation(
                    "an investor cannot be a superior in the network",
                ));
            }
        }

        let user = UserRecord {
            user_id: format!("usr-{}", Uuid::new_v4()),
            full_name: new.full_name,
            email: new.email,
            role: new.role,
            superior_user_id: new.superior_user_id,
            pix_key: new.pix_key,
            status: UserStatus::Active,
        };
        self.store.insert_user(&user)?;
        log::info!("users: registered {} as {}", user.user_id, user.role.as_str());
        Ok(user)
    }

    /// Soft deactivation — users are never hard-deleted.
    pub fn deactivate_user(&self, user_id: &str) -> EngineResult<()> {
        self.store.set_user_status(user_id, UserStatus::Inactive)
    }

    pub fn reassign_superior(
        &self,
        user_id: &str,
        superior_user_id: Option<&str>,
    ) -> EngineResult<()> {
        self.store.update_user_superior(user_id, superior_user_id)
    }

    // ── Catalog ────────────────────────────────────────────────

    pub fn create_debenture(&self, new: NewDebenture) -> EngineResult<DebentureRecord> {
        if new.total_emission_value <= 0.0 {
            return Err(EngineError::validation(
                "debenture total emission value must be positive",
            ));
        }
        let debenture = DebentureRecord {
            debenture_id: format!("deb-{}", Uuid::new_v4()),
            name: new.name,
            issuer_name: new.issuer_name,
            total_emission_value: new.total_emission_value,
            emission_date: new.emission_date,
            status: IssueStatus::Active,
        };
        self.store.insert_debenture(&debenture)?;
        Ok(debenture)
    }

    pub fn create_series(&self, new: NewSeries) -> EngineResult<SeriesRecord> {
        let debenture = self.store.get_debenture(&new.debenture_id)?.ok_or_else(|| {
            EngineError::validation(format!("debenture {} not found", new.debenture_id))
        })?;
        if new.term_months == 0 {
            return Err(EngineError::validation(
                "series term must be at least one month",
            ));
        }
        let ceiling = new
            .max_commission_percent
            .unwrap_or(self.config.default_max_commission_percent);
        if ceiling < 0.0 {
            return Err(EngineError::validation(
                "commission ceiling cannot be negative",
            ));
        }

        let series = SeriesRecord {
            series_id: format!("ser-{}", Uuid::new_v4()),
            debenture_id: debenture.debenture_id,
            series_code: new.series_code,
            name: new.name,
            term_months: new.term_months,
            annual_yield_percent: new.annual_yield_percent,
            max_commission_percent: ceiling,
            minimum_investment: new.minimum_investment,
            maximum_investment: new.maximum_investment,
            max_captation: new.max_captation,
            status: IssueStatus::Active,
        };
        self.store.insert_series(&series)?;
        Ok(series)
    }

    // ── Investments ────────────────────────────────────────────

    /// The creation workflow's storage half: split pre-check, bounds and
    /// capacity checks, then the insert. Installment generation is the
    /// caller's next step (`generate_once`), matching the production flow
    /// where the investment row must exist before the batch references it.
    pub fn create_investment(&self, new: NewInvestment) -> EngineResult<InvestmentRecord> {
        let series = self.store.get_series(&new.series_id)?.ok_or_else(|| {
            EngineError::validation(format!("series {} not found", new.series_id))
        })?;
        if series.status != IssueStatus::Active {
            return Err(EngineError::validation(format!(
                "series {} is not open for investment",
                series.series_id
            )));
        }

        let investor = self.store.get_user(&new.investor_user_id)?.ok_or_else(|| {
            EngineError::validation(format!("investor {} not found", new.investor_user_id))
        })?;
        if investor.role != Role::Investor {
            return Err(EngineError::validation(format!(
                "user {} holds role {} and cannot hold an investment",
                investor.user_id,
                investor.role.as_str()
            )));
        }

        self.check_beneficiaries(&new.split)?;

        validate_split(&series, &new.split.lines())?;

        if new.amount < series.minimum_investment {
            return Err(EngineError::validation(format!(
                "amount {:.2} is below the series minimum of {:.2}",
                new.amount, series.minimum_investment
            )));
        }
        if let Some(max) = series.maximum_investment {
            if new.amount > max {
                return Err(EngineError::validation(format!(
                    "amount {:.2} is above the series maximum of {:.2}",
                    new.amount, max
                )));
            }
        }

        let series_captured = self.store.series_captured_amount(&series.series_id)?;
        catalog::check_series_capacity(&series, series_captured, new.amount)?;

        let debenture = self.store.get_debenture(&series.debenture_id)?.ok_or_else(|| {
            EngineError::validation(format!("debenture {} not found", series.debenture_id))
        })?;
        let debenture_captured = self
            .store
            .debenture_captured_amount(&debenture.debenture_id)?;
        catalog::check_debenture_capacity(&debenture, debenture_captured, new.amount)?;

        let investment = InvestmentRecord {
            investment_id: format!("inv-{}", Uuid::new_v4()),
            series_id: series.series_id.clone(),
            investor_user_id: investor.user_id,
            split: new.split,
            amount: new.amount,
            yield_percent: new.yield_percent,
            start_date: new.start_date,
            maturity_date: maturity_date(new.start_date, series.term_months),
            status: InvestmentStatus::Active,
        };
        self.store.insert_investment(&investment)?;
        log::info!(
            "investments: created {} of {:.2} in series {}",
            investment.investment_id,
            investment.amount,
            investment.series_id
        );
        Ok(investment)
    }

    fn check_beneficiaries(&self, split: &CommissionSplit) -> EngineResult<()> {
        for beneficiary in split.active_beneficiaries() {
            let user = self.store.get_user(&beneficiary.user_id)?.ok_or_else(|| {
                EngineError::validation(format!("beneficiary {} not found", beneficiary.user_id))
            })?;
            if user.role != beneficiary.role.role() {
                log::warn!(
                    "investments: {} fills the {} slot but holds role {}",
                    user.user_id,
                    beneficiary.role.as_str(),
                    user.role.as_str()
                );
            }
        }
        Ok(())
    }

    /// Idempotent installment generation. See [`LedgerWriter::generate_once`].
    pub fn generate_once(&self, investment_id: &str) -> EngineResult<BatchReceipt> {
        LedgerWriter::new(&self.store, &self.config).generate_once(investment_id)
    }

    /// Cancels the investment and every still-pending installment. Paid
    /// installments keep their history.
    pub fn cancel_investment(&self, investment_id: &str) -> EngineResult<usize> {
        self.store
            .set_investment_status(investment_id, InvestmentStatus::Cancelled)?;
        let cancelled = self.store.cancel_pending_installments(investment_id)?;
        log::info!(
            "investments: cancelled {investment_id}, {cancelled} pending installments voided"
        );
        Ok(cancelled)
    }

    /// Hard delete: removes the investment and, by cascade, its full
    /// installment batch. The only path to regeneration.
    pub fn delete_investment(&self, investment_id: &str) -> EngineResult<()> {
        self.store.delete_investment(investment_id)
    }

    pub fn mark_commission_paid(&self, installment_id: &str) -> EngineResult<bool> {
        LedgerWriter::new(&self.store, &self.config).mark_commission_paid(installment_id)
    }

    pub fn mark_remuneration_paid(&self, installment_id: &str) -> EngineResult<bool> {
        LedgerWriter::new(&self.store, &self.config).mark_remuneration_paid(installment_id)
    }

    // ── Gates ──────────────────────────────────────────────────

    /// A per-request resolver over the store. Build one and reuse it across
    /// the fields of a screen so the memo cache pays off.
    pub fn resolver(&self) -> HierarchyResolver<'_, SqlStore> {
        HierarchyResolver::new(&self.store, self.config.max_chain_depth)
    }

    /// By-id convenience over [`visibility::is_visible`]. Fails closed: an
    /// unknown viewer or investment renders nothing.
    pub fn is_visible(
        &self,
        viewer_id: &str,
        investment_id: &str,
        field: FieldTag,
    ) -> EngineResult<bool> {
        let Some(viewer) = self.store.get_user(viewer_id)? else {
            return Ok(false);
        };
        let Some(investment) = self.store.get_investment(investment_id)? else {
            return Ok(false);
        };
        let resolver = self.resolver();
        Ok(visibility::is_visible(&resolver, &viewer, &investment, field))
    }

    /// By-id convenience over [`visibility::field_access`]. A missing
    /// investment is `Unavailable`; a missing viewer is `Restricted`.
    pub fn field_access(
        &self,
        viewer_id: &str,
        investment_id: &str,
        field: FieldTag,
    ) -> EngineResult<FieldAccess> {
        let Some(investment) = self.store.get_investment(investment_id)? else {
            return Ok(FieldAccess::Unavailable);
        };
        let Some(viewer) = self.store.get_user(viewer_id)? else {
            return Ok(FieldAccess::Restricted);
        };
        let resolver = self.resolver();
        Ok(visibility::field_access(
            &resolver,
            &viewer,
            &investment,
            field,
        ))
    }

    pub fn can_access(&self, role: Role, module: Module, action: ModuleAction) -> bool {
        access::can_access(role, module, action)
    }

    // ── Summaries ──────────────────────────────────────────────

    pub fn commission_totals(&self) -> EngineResult<StatusTotals> {
        self.store.commission_totals_by_status()
    }

    pub fn remuneration_totals(&self) -> EngineResult<StatusTotals> {
        self.store.remuneration_totals_by_status()
    }

    pub fn series_captured(&self, series_id: &str) -> EngineResult<f64> {
        self.store.series_captured_amount(series_id)
    }
}
