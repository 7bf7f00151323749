//! Module access gate tests — the static role × module × action matrix.

use debenture_core::{
    access::can_access,
    types::{Module, ModuleAction, Role},
};

const ALL_ROLES: [Role; 6] = [
    Role::Global,
    Role::Master,
    Role::BranchOffice,
    Role::RelationshipManager,
    Role::Agent,
    Role::Investor,
];

const ALL_ACTIONS: [ModuleAction; 4] = [
    ModuleAction::View,
    ModuleAction::Create,
    ModuleAction::Edit,
    ModuleAction::Delete,
];

#[test]
fn global_can_do_everything() {
    for module in [
        Module::Debentures,
        Module::Series,
        Module::Commissions,
        Module::Remunerations,
        Module::Investments,
        Module::Users,
    ] {
        for action in ALL_ACTIONS {
            assert!(can_access(Role::Global, module, action));
        }
    }
}

#[test]
fn investor_is_locked_out_of_the_issuance_side() {
    for module in [Module::Debentures, Module::Series, Module::Commissions] {
        for action in ALL_ACTIONS {
            assert!(
                !can_access(Role::Investor, module, action),
                "investor must be denied {action:?} on {module:?}"
            );
        }
    }
}

#[test]
fn investor_still_views_their_own_side() {
    assert!(can_access(Role::Investor, Module::Investments, ModuleAction::View));
    assert!(can_access(Role::Investor, Module::Remunerations, ModuleAction::View));
    assert!(can_access(Role::Investor, Module::Users, ModuleAction::View));
}

#[test]
fn only_global_writes_the_catalog() {
    for role in ALL_ROLES {
        for module in [Module::Debentures, Module::Series] {
            for action in [ModuleAction::Create, ModuleAction::Edit, ModuleAction::Delete] {
                assert_eq!(
                    can_access(role, module, action),
                    role == Role::Global,
                    "{role:?} {action:?} on {module:?}"
                );
            }
        }
    }
}

#[test]
fn distribution_roles_view_commissions() {
    for role in [
        Role::Master,
        Role::BranchOffice,
        Role::RelationshipManager,
        Role::Agent,
    ] {
        assert!(can_access(role, Module::Commissions, ModuleAction::View));
    }
}

#[test]
fn investment_creation_is_privileged() {
    for role in ALL_ROLES {
        let allowed = matches!(role, Role::Global | Role::Master);
        assert_eq!(
            can_access(role, Module::Investments, ModuleAction::Create),
            allowed,
            "{role:?} create on investments"
        );
    }
}

#[test]
fn nobody_below_global_deletes_users() {
    for role in ALL_ROLES {
        if role != Role::Global {
            assert!(!can_access(role, Module::Users, ModuleAction::Delete));
        }
    }
}
