//! Deterministic sample-data generation.
//!
//! RULE: nothing here calls a platform RNG. All randomness flows through
//! [`SeedRng`], so the same seed always produces the same network — the
//! desk-runner demo and the test suite both rely on that.

use crate::{
    catalog::{DebentureRecord, SeriesRecord},
    error::EngineResult,
    hierarchy::UserRecord,
    store::SqlStore,
    types::{IssueStatus, Role, UserId, UserStatus},
};
use chrono::NaiveDate;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG stream.
pub struct SeedRng {
    inner: Pcg64Mcg,
}

impl SeedRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.next_u64_below(items.len() as u64) as usize]
    }
}

/// How many users to generate at each tier of the tree.
#[derive(Debug, Clone)]
pub struct SampleSpec {
    pub masters: usize,
    pub offices_per_master: usize,
    pub managers_per_office: usize,
    pub agents_per_manager: usize,
    pub investors_per_agent: usize,
}

impl Default for SampleSpec {
    fn default() -> Self {
        Self {
            masters: 2,
            offices_per_master: 2,
            managers_per_office: 1,
            agents_per_manager: 2,
            investors_per_agent: 2,
        }
    }
}

/// Everything one seeding pass creates, with the tree structure intact.
pub struct SampleNetwork {
    pub global: UserRecord,
    pub masters: Vec<UserRecord>,
    pub branch_offices: Vec<UserRecord>,
    pub managers: Vec<UserRecord>,
    pub agents: Vec<UserRecord>,
    pub investors: Vec<UserRecord>,
    pub debenture: DebentureRecord,
    pub series: SeriesRecord,
}

/// Seeds a full demo network plus one debenture with one open series.
/// User ids are sequential (`usr-0001`, ...) so reruns with the same seed
/// are byte-identical.
pub fn seed_network(
    store: &SqlStore,
    seed: u64,
    spec: &SampleSpec,
) -> EngineResult<SampleNetwork> {
    let mut rng = SeedRng::new(seed);
    let mut counter = 0usize;

    let make_user = |rng: &mut SeedRng,
                         counter: &mut usize,
                         role: Role,
                         superior: Option<&UserId>|
     -> UserRecord {
        *counter += 1;
        let first = rng.pick(FIRST_NAMES);
        let last = rng.pick(LAST_NAMES);
        UserRecord {
            user_id: format!("usr-{counter:04}"),
            full_name: format!("{first} {last}"),
            email: format!(
                "{}.{}{}@example.com",
                first.to_lowercase(),
                last.to_lowercase(),
                counter
            ),
            role,
            superior_user_id: superior.cloned(),
            pix_key: if rng.chance(0.8) {
                Some(format!("pix-{counter:04}"))
            } else {
                None
            },
            status: UserStatus::Active,
        }
    };

    let global = make_user(&mut rng, &mut counter, Role::Global, None);
    store.insert_user(&global)?;

    let mut masters = Vec::new();
    let mut branch_offices = Vec::new();
    let mut managers = Vec::new();
    let mut agents = Vec::new();
    let mut investors = Vec::new();

    for _ in 0..spec.masters {
        // Masters are network roots: each master subtree is its own
        // isolated branch, and Global stands outside the tree entirely.
        let master = make_user(&mut rng, &mut counter, Role::Master, None);
        store.insert_user(&master)?;

        for _ in 0..spec.offices_per_master {
            let office = make_user(
                &mut rng,
                &mut counter,
                Role::BranchOffice,
                Some(&master.user_id),
            );
            store.insert_user(&office)?;

            for _ in 0..spec.managers_per_office {
                let manager = make_user(
                    &mut rng,
                    &mut counter,
                    Role::RelationshipManager,
                    Some(&office.user_id),
                );
                store.insert_user(&manager)?;

                for _ in 0..spec.agents_per_manager {
                    let agent = make_user(
                        &mut rng,
                        &mut counter,
                        Role::Agent,
                        Some(&manager.user_id),
                    );
                    store.insert_user(&agent)?;

                    for _ in 0..spec.investors_per_agent {
                        let investor = make_user(
                            &mut rng,
                            &mut counter,
                            Role::Investor,
                            Some(&agent.user_id),
                        );
                        store.insert_user(&investor)?;
                        investors.push(investor);
                    }
                    agents.push(agent);
                }
                managers.push(manager);
            }
            branch_offices.push(office);
        }
        masters.push(master);
    }

    let debenture = DebentureRecord {
        debenture_id: "deb-0001".to_string(),
        name: "Infra Energia I".to_string(),
        issuer_name: "Infra Energia Participações".to_string(),
        total_emission_value: 50_000_000.0,
        emission_date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date"),
        status: IssueStatus::Active,
    };
    store.insert_debenture(&debenture)?;

    let series = SeriesRecord {
        series_id: "ser-0001".to_string(),
        debenture_id: debenture.debenture_id.clone(),
        series_code: "A1".to_string(),
        name: "Série A1".to_string(),
        term_months: 12,
        annual_yield_percent: 14.0,
        max_commission_percent: 10.0,
        minimum_investment: 5_000.0,
        maximum_investment: None,
        max_captation: Some(10_000_000.0),
        status: IssueStatus::Active,
    };
    store.insert_series(&series)?;

    log::info!(
        "sample: seeded {} users, 1 debenture, 1 series (seed {seed})",
        counter
    );

    Ok(SampleNetwork {
        global,
        masters,
        branch_offices,
        managers,
        agents,
        investors,
        debenture,
        series,
    })
}

const FIRST_NAMES: &[&str] = &[
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph",
    "Thomas", "Daniel", "Matthew", "Anthony", "Mark", "Steven", "Andrew", "Joshua",
    "Kevin", "Brian", "Timothy", "Jason", "Ryan", "Jacob", "Nicholas", "Eric",
    "Mary", "Patricia", "Jennifer", "Linda", "Barbara", "Elizabeth", "Susan",
    "Jessica", "Sarah", "Karen", "Lisa", "Nancy", "Sandra", "Ashley", "Emily",
    "Michelle", "Carol", "Amanda", "Melissa", "Stephanie", "Rebecca", "Laura",
    "Helen", "Rachel", "Olivia",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
    "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson",
    "White", "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson",
    "Walker", "Young", "Allen", "King", "Wright", "Scott", "Torres", "Nguyen",
    "Hill", "Flores", "Green", "Adams", "Nelson", "Baker", "Hall", "Rivera",
    "Campbell", "Mitchell",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SeedRng::new(99);
        let mut b = SeedRng::new(99);
        for _ in 0..64 {
            assert_eq!(a.next_u64_below(1000), b.next_u64_below(1000));
        }
    }

    #[test]
    fn chance_is_bounded() {
        let mut rng = SeedRng::new(7);
        assert!(!rng.chance(0.0));
        let mut rng = SeedRng::new(7);
        assert!(rng.chance(1.0));
    }
}
