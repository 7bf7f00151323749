//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Every other module calls store methods — nothing else executes SQL.

use crate::{
    catalog::{DebentureRecord, SeriesRecord},
    error::EngineResult,
    hierarchy::{UserDirectory, UserRecord},
    investment::{BeneficiarySlot, CommissionSplit, InvestmentRecord},
    types::{InvestmentStatus, IssueStatus, Role, UserStatus},
};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection};

mod installment;

pub use installment::{BatchReceipt, StatusTotals};

pub struct SqlStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SqlStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new isolated database.
    pub fn reopen(&self) -> EngineResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_users.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_catalog.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_investments.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_installments.sql"))?;
        Ok(())
    }

    // ── Users ──────────────────────────────────────────────────

    pub fn insert_user(&self, user: &UserRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO users (
                user_id, full_name, email, role, superior_user_id,
                pix_key, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.user_id,
                user.full_name,
                user.email,
                user.role,
                user.superior_user_id,
                user.pix_key,
                user.status,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> EngineResult<Option<UserRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, full_name, email, role, superior_user_id, pix_key, status
             FROM users WHERE user_id = ?1",
        )?;
        let user = stmt
            .query_row(params![user_id], |row| {
                Ok(UserRecord {
                    user_id: row.get(0)?,
                    full_name: row.get(1)?,
                    email: row.get(2)?,
                    role: row.get(3)?,
                    superior_user_id: row.get(4)?,
                    pix_key: row.get(5)?,
                    status: row.get(6)?,
                })
            })
            .ok();
        Ok(user)
    }

    pub fn update_user_superior(
        &self,
        user_id: &str,
        superior_user_id: Option<&str>,
    ) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE users SET superior_user_id = ?1 WHERE user_id = ?2",
            params![superior_user_id, user_id],
        )?;
        Ok(())
    }

    pub fn update_user_role(&self, user_id: &str, role: Role) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE users SET role = ?1 WHERE user_id = ?2",
            params![role, user_id],
        )?;
        Ok(())
    }

    /// Soft status flip. Users are never hard-deleted.
    pub fn set_user_status(&self, user_id: &str, status: UserStatus) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE users SET status = ?1 WHERE user_id = ?2",
            params![status, user_id],
        )?;
        Ok(())
    }

    pub fn users_with_role(&self, role: Role) -> EngineResult<Vec<UserRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, full_name, email, role, superior_user_id, pix_key, status
             FROM users WHERE role = ?1 ORDER BY user_id ASC",
        )?;
        let rows = stmt.query_map(params![role], |row| {
            Ok(UserRecord {
                user_id: row.get(0)?,
                full_name: row.get(1)?,
                email: row.get(2)?,
                role: row.get(3)?,
                superior_user_id: row.get(4)?,
                pix_key: row.get(5)?,
                status: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn user_count(&self, status: UserStatus) -> EngineResult<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    // ── Debentures ─────────────────────────────────────────────

    pub fn insert_debenture(&self, debenture: &DebentureRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO debentures (
                debenture_id, name, issuer_name, total_emission_value,
                emission_date, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                debenture.debenture_id,
                debenture.name,
                debenture.issuer_name,
                debenture.total_emission_value,
                debenture.emission_date.to_string(),
                debenture.status,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_debenture(&self, debenture_id: &str) -> EngineResult<Option<DebentureRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT debenture_id, name, issuer_name, total_emission_value, emission_date, status
             FROM debentures WHERE debenture_id = ?1",
        )?;
        let debenture = stmt
            .query_row(params![debenture_id], |row| {
                Ok(DebentureRecord {
                    debenture_id: row.get(0)?,
                    name: row.get(1)?,
                    issuer_name: row.get(2)?,
                    total_emission_value: row.get(3)?,
                    emission_date: parse_date(4, row.get::<_, String>(4)?)?,
                    status: row.get(5)?,
                })
            })
            .ok();
        Ok(debenture)
    }

    pub fn set_debenture_status(
        &self,
        debenture_id: &str,
        status: IssueStatus,
    ) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE debentures SET status = ?1 WHERE debenture_id = ?2",
            params![status, debenture_id],
        )?;
        Ok(())
    }

    // ── Series ─────────────────────────────────────────────────

    pub fn insert_series(&self, series: &SeriesRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO series (
                series_id, debenture_id, series_code, name, term_months,
                annual_yield_percent, max_commission_percent,
                minimum_investment, maximum_investment, max_captation,
                status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                series.series_id,
                series.debenture_id,
                series.series_code,
                series.name,
                series.term_months,
                series.annual_yield_percent,
                series.max_commission_percent,
                series.minimum_investment,
                series.maximum_investment,
                series.max_captation,
                series.status,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_series(&self, series_id: &str) -> EngineResult<Option<SeriesRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT series_id, debenture_id, series_code, name, term_months,
                    annual_yield_percent, max_commission_percent,
                    minimum_investment, maximum_investment, max_captation, status
             FROM series WHERE series_id = ?1",
        )?;
        let series = stmt
            .query_row(params![series_id], series_row_mapper)
            .ok();
        Ok(series)
    }

    pub fn series_for_debenture(&self, debenture_id: &str) -> EngineResult<Vec<SeriesRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT series_id, debenture_id, series_code, name, term_months,
                    annual_yield_percent, max_commission_percent,
                    minimum_investment, maximum_investment, max_captation, status
             FROM series WHERE debenture_id = ?1 ORDER BY series_code ASC",
        )?;
        let rows = stmt.query_map(params![debenture_id], series_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn set_series_status(&self, series_id: &str, status: IssueStatus) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE series SET status = ?1 WHERE series_id = ?2",
            params![status, series_id],
        )?;
        Ok(())
    }

    // ── Investments ────────────────────────────────────────────

    pub fn insert_investment(&self, investment: &InvestmentRecord) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO investments (
                investment_id, series_id, investor_user_id,
                master_user_id, master_percent,
                branch_office_user_id, branch_office_percent,
                relationship_manager_user_id, relationship_manager_percent,
                agent_user_id, agent_percent,
                amount, yield_percent, start_date, maturity_date,
                status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                investment.investment_id,
                investment.series_id,
                investment.investor_user_id,
                investment.split.master.user_id,
                investment.split.master.percent,
                investment.split.branch_office.user_id,
                investment.split.branch_office.percent,
                investment.split.relationship_manager.user_id,
                investment.split.relationship_manager.percent,
                investment.split.agent.user_id,
                investment.split.agent.percent,
                investment.amount,
                investment.yield_percent,
                investment.start_date.to_string(),
                investment.maturity_date.to_string(),
                investment.status,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_investment(&self, investment_id: &str) -> EngineResult<Option<InvestmentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT investment_id, series_id, investor_user_id,
                    master_user_id, master_percent,
                    branch_office_user_id, branch_office_percent,
                    relationship_manager_user_id, relationship_manager_percent,
                    agent_user_id, agent_percent,
                    amount, yield_percent, start_date, maturity_date, status
             FROM investments WHERE investment_id = ?1",
        )?;
        let investment = stmt
            .query_row(params![investment_id], investment_row_mapper)
            .ok();
        Ok(investment)
    }

    pub fn investments_for_series(&self, series_id: &str) -> EngineResult<Vec<InvestmentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT investment_id, series_id, investor_user_id,
                    master_user_id, master_percent,
                    branch_office_user_id, branch_office_percent,
                    relationship_manager_user_id, relationship_manager_percent,
                    agent_user_id, agent_percent,
                    amount, yield_percent, start_date, maturity_date, status
             FROM investments WHERE series_id = ?1 ORDER BY start_date ASC",
        )?;
        let rows = stmt.query_map(params![series_id], investment_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn set_investment_status(
        &self,
        investment_id: &str,
        status: InvestmentStatus,
    ) -> EngineResult<()> {
        self.conn.execute(
            "UPDATE investments SET status = ?1 WHERE investment_id = ?2",
            params![status, investment_id],
        )?;
        Ok(())
    }

    /// Hard delete. Installments cascade with the investment row.
    pub fn delete_investment(&self, investment_id: &str) -> EngineResult<()> {
        self.conn.execute(
            "DELETE FROM investments WHERE investment_id = ?1",
            params![investment_id],
        )?;
        Ok(())
    }

    /// Derived captured amount: the sum of active investments in a series.
    pub fn series_captured_amount(&self, series_id: &str) -> EngineResult<f64> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(amount), 0.0) FROM investments
                 WHERE series_id = ?1 AND status = 'active'",
                params![series_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    /// Derived captured amount across every series of a debenture.
    pub fn debenture_captured_amount(&self, debenture_id: &str) -> EngineResult<f64> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(i.amount), 0.0)
                 FROM investments i
                 JOIN series s ON i.series_id = s.series_id
                 WHERE s.debenture_id = ?1 AND i.status = 'active'",
                params![debenture_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn investment_count(&self) -> EngineResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM investments", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl UserDirectory for SqlStore {
    fn lookup_user(&self, user_id: &str) -> EngineResult<Option<UserRecord>> {
        self.get_user(user_id)
    }
}

fn series_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<SeriesRecord> {
    Ok(SeriesRecord {
        series_id: row.get(0)?,
        debenture_id: row.get(1)?,
        series_code: row.get(2)?,
        name: row.get(3)?,
        term_months: row.get(4)?,
        annual_yield_percent: row.get(5)?,
        max_commission_percent: row.get(6)?,
        minimum_investment: row.get(7)?,
        maximum_investment: row.get(8)?,
        max_captation: row.get(9)?,
        status: row.get(10)?,
    })
}

fn investment_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<InvestmentRecord> {
    Ok(InvestmentRecord {
        investment_id: row.get(0)?,
        series_id: row.get(1)?,
        investor_user_id: row.get(2)?,
        split: CommissionSplit {
            master: BeneficiarySlot {
                user_id: row.get(3)?,
                percent: row.get(4)?,
            },
            branch_office: BeneficiarySlot {
                user_id: row.get(5)?,
                percent: row.get(6)?,
            },
            relationship_manager: BeneficiarySlot {
                user_id: row.get(7)?,
                percent: row.get(8)?,
            },
            agent: BeneficiarySlot {
                user_id: row.get(9)?,
                percent: row.get(10)?,
            },
        },
        amount: row.get(11)?,
        yield_percent: row.get(12)?,
        start_date: parse_date(13, row.get::<_, String>(13)?)?,
        maturity_date: parse_date(14, row.get::<_, String>(14)?)?,
        status: row.get(15)?,
    })
}

/// Dates are stored as ISO-8601 text; a row that fails to parse surfaces
/// as a conversion error rather than a silent default.
fn parse_date(idx: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
