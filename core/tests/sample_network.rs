//! Sample network determinism — the demo seeder must be reproducible so
//! desk-runner runs and fixtures can be compared across machines.

use debenture_core::{
    sample::{seed_network, SampleSpec},
    store::SqlStore,
    types::Role,
};

fn seeded(seed: u64) -> (SqlStore, debenture_core::sample::SampleNetwork) {
    let store = SqlStore::in_memory().unwrap();
    store.migrate().unwrap();
    let network = seed_network(&store, seed, &SampleSpec::default()).unwrap();
    (store, network)
}

#[test]
fn same_seed_produces_identical_networks() {
    let (_store_a, a) = seeded(42);
    let (_store_b, b) = seeded(42);

    assert_eq!(a.global.user_id, b.global.user_id);
    assert_eq!(a.global.full_name, b.global.full_name);

    assert_eq!(a.investors.len(), b.investors.len());
    for (x, y) in a.investors.iter().zip(b.investors.iter()) {
        assert_eq!(x.user_id, y.user_id);
        assert_eq!(x.full_name, y.full_name, "names must be seed-stable");
        assert_eq!(x.superior_user_id, y.superior_user_id);
    }
}

#[test]
fn different_seeds_produce_different_names() {
    let (_store_a, a) = seeded(1);
    let (_store_b, b) = seeded(2);

    let names_a: Vec<_> = a.investors.iter().map(|u| u.full_name.clone()).collect();
    let names_b: Vec<_> = b.investors.iter().map(|u| u.full_name.clone()).collect();
    assert_ne!(names_a, names_b, "seed must drive name selection");
}

#[test]
fn tree_structure_matches_the_requested_shape() {
    let (store, network) = seeded(7);
    let spec = SampleSpec::default();

    assert_eq!(network.masters.len(), spec.masters);
    assert_eq!(
        network.investors.len(),
        spec.masters
            * spec.offices_per_master
            * spec.managers_per_office
            * spec.agents_per_manager
            * spec.investors_per_agent
    );

    // Masters are roots; every investor chains up to one of them.
    for master in &network.masters {
        assert_eq!(master.superior_user_id, None);
        assert_eq!(master.role, Role::Master);
    }
    let users = store.users_with_role(Role::Investor).unwrap();
    assert_eq!(users.len(), network.investors.len());
    for investor in &users {
        assert!(investor.superior_user_id.is_some());
    }
}

#[test]
fn seeded_catalog_is_open_for_investment() {
    let (store, network) = seeded(7);
    let series = store.get_series(&network.series.series_id).unwrap().unwrap();
    assert_eq!(series.term_months, 12);
    assert!((series.max_commission_percent - 10.0).abs() < 1e-9);
    assert!(store.get_debenture(&network.debenture.debenture_id).unwrap().is_some());
}
