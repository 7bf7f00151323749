use crate::types::InvestmentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The proposed split sums past the series ceiling. Carries both numbers
    /// verbatim so the caller can explain the rejection.
    #[error("commission split of {attempted:.2}% exceeds the series ceiling of {ceiling:.2}%")]
    CapExceeded { attempted: f64, ceiling: f64 },

    /// Fundraising capacity would be breached by this investment.
    #[error("{scope} capacity exceeded: {attempted:.2} over a limit of {capacity:.2}")]
    CapacityExceeded {
        scope: &'static str,
        attempted: f64,
        capacity: f64,
    },

    /// Not a failure: the installment batch already exists. Callers treat
    /// this as an idempotent no-op signal.
    #[error("installments already generated for investment {investment_id}")]
    AlreadyGenerated { investment_id: InvestmentId },

    /// Malformed input that upstream invariants should have prevented.
    /// Logged as a defect, never shown to end users.
    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationFailed {
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
