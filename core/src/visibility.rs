//! Field-level visibility gate.
//!
//! RULE: every display surface calls this gate; no screen reimplements the
//! decision inline. The gate never errors — a chain that cannot be resolved
//! reads as cross-network and the field stays hidden.

use crate::{
    hierarchy::{HierarchyResolver, UserDirectory, UserRecord},
    investment::InvestmentRecord,
    types::{FieldTag, Role},
};
use serde::{Deserialize, Serialize};

/// What a screen should render for one field. `Unavailable` (no data) is
/// distinct from `Restricted` (data exists, viewer not entitled) so the UI
/// can message them differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    Visible,
    Restricted,
    Unavailable,
}

/// Whether `viewer` may see `field` on `investment`.
///
/// Decision order, first match wins:
///   1. Global sees everything.
///   2. A direct party to the split (any beneficiary slot or the investor)
///      sees the investment they are part of.
///   3. The recorded master sees it. Redundant with #2 today, but creator
///      rights must survive a later edit of the split record.
///   4. A viewer outside the master's network sees nothing.
///   5. Same network but not a party: still nothing.
pub fn is_visible<D: UserDirectory>(
    resolver: &HierarchyResolver<'_, D>,
    viewer: &UserRecord,
    investment: &InvestmentRecord,
    _field: FieldTag,
) -> bool {
    if viewer.role == Role::Global {
        return true;
    }

    if investment.is_party(&viewer.user_id) {
        return true;
    }

    if viewer.role == Role::Master
        && investment.split.master.user_id.as_deref() == Some(viewer.user_id.as_str())
    {
        return true;
    }

    let Some(master_id) = investment.split.master.user_id.as_deref() else {
        // No recorded master: network membership cannot be established.
        return false;
    };
    if !resolver.same_network(&viewer.user_id, master_id) {
        // Cross-network isolation is the default.
        return false;
    }

    // Same network but not a split party: still not entitled to the
    // financial detail of a peer's deal.
    false
}

/// Three-valued variant for rendering: separates "no data" from "not
/// authorized". An absent value renders as unavailable even for viewers the
/// gate would admit.
pub fn field_access<D: UserDirectory>(
    resolver: &HierarchyResolver<'_, D>,
    viewer: &UserRecord,
    investment: &InvestmentRecord,
    field: FieldTag,
) -> FieldAccess {
    if !field_present(investment, field) {
        return FieldAccess::Unavailable;
    }
    if is_visible(resolver, viewer, investment, field) {
        FieldAccess::Visible
    } else {
        FieldAccess::Restricted
    }
}

fn field_present(investment: &InvestmentRecord, field: FieldTag) -> bool {
    match field {
        FieldTag::Amount
        | FieldTag::StartDate
        | FieldTag::MaturityDate
        | FieldTag::InvestorIdentity
        | FieldTag::Status => true,
        FieldTag::YieldPercent => investment.yield_percent.is_some(),
        FieldTag::CommissionSplit => !investment.split.active_beneficiaries().is_empty(),
    }
}
