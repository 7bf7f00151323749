//! Network hierarchy resolution.
//!
//! RULE: resolution never throws. A chain that cannot be resolved (missing
//! user, cycle, depth past the bound) reads as "different network", so
//! visibility degrades to hidden, never to visible by accident.

use crate::{
    error::EngineResult,
    types::{Role, UserId, UserStatus},
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub superior_user_id: Option<UserId>,
    pub pix_key: Option<String>,
    pub status: UserStatus,
}

/// The seam between the resolver and whatever holds the user table.
/// Implemented by the SQL store and by in-memory doubles in tests.
pub trait UserDirectory {
    fn lookup_user(&self, user_id: &str) -> EngineResult<Option<UserRecord>>;
}

/// Walks superior pointers to find network roots. Cheap to construct;
/// build one per request and let the memo cache absorb repeated field
/// renders over the same viewer/investment pairs.
pub struct HierarchyResolver<'a, D: UserDirectory> {
    directory: &'a D,
    max_depth: usize,
    root_cache: RefCell<HashMap<UserId, Option<UserId>>>,
}

impl<'a, D: UserDirectory> HierarchyResolver<'a, D> {
    pub fn new(directory: &'a D, max_depth: usize) -> Self {
        Self {
            directory,
            max_depth,
            root_cache: RefCell::new(HashMap::new()),
        }
    }

    /// The topmost ancestor reachable from `user_id`, or `None` when the
    /// chain cannot be resolved. `None` is memoized too: a broken chain
    /// stays broken for the life of this resolver.
    pub fn find_network_root(&self, user_id: &str) -> Option<UserId> {
        if let Some(cached) = self.root_cache.borrow().get(user_id) {
            return cached.clone();
        }
        let root = self.walk_to_root(user_id);
        self.root_cache
            .borrow_mut()
            .insert(user_id.to_string(), root.clone());
        root
    }

    /// True iff both users resolve to the same network root.
    pub fn same_network(&self, a: &str, b: &str) -> bool {
        match (self.find_network_root(a), self.find_network_root(b)) {
            (Some(root_a), Some(root_b)) => root_a == root_b,
            _ => false,
        }
    }

    fn walk_to_root(&self, user_id: &str) -> Option<UserId> {
        let mut current = user_id.to_string();
        let mut visited: HashSet<UserId> = HashSet::new();

        for _ in 0..=self.max_depth {
            if !visited.insert(current.clone()) {
                log::warn!("hierarchy: cycle detected in superior chain at {current}");
                return None;
            }

            let user = match self.directory.lookup_user(&current) {
                Ok(Some(user)) => user,
                Ok(None) => {
                    log::warn!("hierarchy: user {current} not found while resolving chain");
                    return None;
                }
                Err(e) => {
                    log::warn!("hierarchy: lookup failed for {current}: {e}");
                    return None;
                }
            };

            match user.superior_user_id {
                Some(superior) => current = superior,
                None => return Some(user.user_id),
            }
        }

        log::warn!(
            "hierarchy: superior chain from {user_id} exceeds {} hops",
            self.max_depth
        );
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, UserStatus};

    struct MapDirectory(HashMap<UserId, UserRecord>);

    impl MapDirectory {
        fn with_chain(links: &[(&str, Option<&str>)]) -> Self {
            let users = links
                .iter()
                .map(|(id, sup)| {
                    (
                        id.to_string(),
                        UserRecord {
                            user_id: id.to_string(),
                            full_name: id.to_string(),
                            email: format!("{id}@example.com"),
                            role: Role::Agent,
                            superior_user_id: sup.map(String::from),
                            pix_key: None,
                            status: UserStatus::Active,
                        },
                    )
                })
                .collect();
            Self(users)
        }
    }

    impl UserDirectory for MapDirectory {
        fn lookup_user(&self, user_id: &str) -> EngineResult<Option<UserRecord>> {
            Ok(self.0.get(user_id).cloned())
        }
    }

    #[test]
    fn resolves_root_through_chain() {
        let dir = MapDirectory::with_chain(&[
            ("root", None),
            ("mid", Some("root")),
            ("leaf", Some("mid")),
        ]);
        let resolver = HierarchyResolver::new(&dir, 10);
        assert_eq!(resolver.find_network_root("leaf").as_deref(), Some("root"));
        assert!(resolver.same_network("leaf", "mid"));
    }

    #[test]
    fn cycle_fails_closed() {
        let dir = MapDirectory::with_chain(&[("a", Some("b")), ("b", Some("a"))]);
        let resolver = HierarchyResolver::new(&dir, 10);
        assert_eq!(resolver.find_network_root("a"), None);
        assert!(!resolver.same_network("a", "b"));
    }

    #[test]
    fn missing_user_fails_closed() {
        let dir = MapDirectory::with_chain(&[("a", Some("ghost"))]);
        let resolver = HierarchyResolver::new(&dir, 10);
        assert_eq!(resolver.find_network_root("a"), None);
        assert!(!resolver.same_network("a", "a"));
    }

    #[test]
    fn depth_bound_fails_closed() {
        let links: Vec<(String, Option<String>)> = (0..15)
            .map(|i| {
                let id = format!("u{i}");
                let sup = if i == 14 { None } else { Some(format!("u{}", i + 1)) };
                (id, sup)
            })
            .collect();
        let borrowed: Vec<(&str, Option<&str>)> = links
            .iter()
            .map(|(id, sup)| (id.as_str(), sup.as_deref()))
            .collect();
        let dir = MapDirectory::with_chain(&borrowed);

        let resolver = HierarchyResolver::new(&dir, 10);
        assert_eq!(resolver.find_network_root("u0"), None);
        // A short chain inside the same directory still resolves.
        assert_eq!(resolver.find_network_root("u10").as_deref(), Some("u14"));
    }
}
