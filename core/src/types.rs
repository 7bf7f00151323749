//! Shared primitive types used across the entire engine.
//!
//! RULE: Roles, modules, and statuses are closed enums with exhaustive
//! matching. Nothing in the engine branches on a role string.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A stable, unique identifier for any entity in the platform.
pub type EntityId = String;

pub type UserId = EntityId;
pub type DebentureId = EntityId;
pub type SeriesId = EntityId;
pub type InvestmentId = EntityId;
pub type InstallmentId = EntityId;

/// Organizational role, ordered root to leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Global,
    Master,
    BranchOffice,
    RelationshipManager,
    Agent,
    Investor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Master => "master",
            Self::BranchOffice => "branch_office",
            Self::RelationshipManager => "relationship_manager",
            Self::Agent => "agent",
            Self::Investor => "investor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "global" => Some(Self::Global),
            "master" => Some(Self::Master),
            "branch_office" => Some(Self::BranchOffice),
            "relationship_manager" => Some(Self::RelationshipManager),
            "agent" => Some(Self::Agent),
            "investor" => Some(Self::Investor),
            _ => None,
        }
    }

    /// Distribution roles sit between the issuer and the investor and may
    /// hold subordinates in the network tree.
    pub fn is_distribution(&self) -> bool {
        matches!(
            self,
            Self::Master | Self::BranchOffice | Self::RelationshipManager | Self::Agent
        )
    }
}

/// The four commission-beneficiary slots an investment carries.
/// A subset of [`Role`]: Global takes no commission and the Investor is
/// paid remuneration, not commission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryRole {
    Master,
    BranchOffice,
    RelationshipManager,
    Agent,
}

impl BeneficiaryRole {
    pub const ALL: [BeneficiaryRole; 4] = [
        Self::Master,
        Self::BranchOffice,
        Self::RelationshipManager,
        Self::Agent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::BranchOffice => "branch_office",
            Self::RelationshipManager => "relationship_manager",
            Self::Agent => "agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "master" => Some(Self::Master),
            "branch_office" => Some(Self::BranchOffice),
            "relationship_manager" => Some(Self::RelationshipManager),
            "agent" => Some(Self::Agent),
            _ => None,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Master => Role::Master,
            Self::BranchOffice => Role::BranchOffice,
            Self::RelationshipManager => Role::RelationshipManager,
            Self::Agent => Role::Agent,
        }
    }
}

/// Screens/feature areas gated by the module access matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Debentures,
    Series,
    Commissions,
    Remunerations,
    Investments,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleAction {
    View,
    Create,
    Edit,
    Delete,
}

/// The displayable fields of an investment that pass through the
/// field-visibility gate before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTag {
    Amount,
    StartDate,
    MaturityDate,
    YieldPercent,
    CommissionSplit,
    InvestorIdentity,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// Lifecycle of a debenture or one of its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Active,
    Inactive,
    Finished,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Active,
    Expired,
    Cancelled,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "expired" => Some(Self::Expired),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

// SQLite round-trips for the text-encoded enums. A value that fails to
// parse is a corrupt row, surfaced as a conversion error, never a default.

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                <$ty>::parse(s).ok_or_else(|| {
                    FromSqlError::Other(
                        format!("invalid {} value: {s:?}", stringify!($ty)).into(),
                    )
                })
            }
        }
    };
}

sql_text_enum!(Role);
sql_text_enum!(BeneficiaryRole);
sql_text_enum!(UserStatus);
sql_text_enum!(IssueStatus);
sql_text_enum!(InvestmentStatus);
sql_text_enum!(InstallmentStatus);
