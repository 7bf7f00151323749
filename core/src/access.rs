//! Module access gate — the static role × module × action matrix.
//!
//! Pure lookup, no state. Row-level filtering of what a permitted viewer
//! actually sees inside a module belongs to the storage collaborator and the
//! field gate, not here.

use crate::types::{Module, ModuleAction, Role};

/// Whether `role` may perform `action` on `module` at all.
///
/// Investors are locked out of the issuance side (debentures, series,
/// commissions) entirely. Every role may view investments and users; the
/// rows they see are filtered elsewhere.
pub fn can_access(role: Role, module: Module, action: ModuleAction) -> bool {
    use Module::*;
    use ModuleAction::*;
    use Role::*;

    match (role, module, action) {
        // Global administers everything.
        (Global, _, _) => true,

        // Issuance catalog: distribution roles may look, only Global writes.
        (Master | BranchOffice | RelationshipManager | Agent, Debentures | Series, View) => true,
        (_, Debentures | Series, _) => false,

        // Commission ledger: visible to the distribution side, never to
        // investors; mutations (payment marking) stay with Global and Master.
        (Master | BranchOffice | RelationshipManager | Agent, Commissions, View) => true,
        (Master, Commissions, Edit) => true,
        (_, Commissions, _) => false,

        // Remuneration ledger: investors see their own payout schedule.
        (_, Remunerations, View) => true,
        (Master, Remunerations, Edit) => true,
        (_, Remunerations, _) => false,

        // Investments: everyone views (row-filtered), Master creates and
        // edits, nobody but Global deletes.
        (_, Investments, View) => true,
        (Master, Investments, Create | Edit) => true,
        (_, Investments, _) => false,

        // Users: everyone views their slice of the network; distribution
        // roles with subordinates may register them; edits stay with Master.
        (_, Users, View) => true,
        (Master | BranchOffice | RelationshipManager, Users, Create) => true,
        (Master, Users, Edit) => true,
        (_, Users, _) => false,
    }
}
