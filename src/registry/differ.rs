//! Registry reconciliation.
//!
//! Two phases, each a sequence of per-key atomic writes:
//! 1. prune keys the new snapshot no longer has
//! 2. upsert every key of the snapshot
//!
//! There is no whole-map lock; a concurrent reader can observe old entries
//! for some services and new ones for others while this runs.

use std::sync::Arc;

use crate::registry::{RegistrySnapshot, RegistryStore, ServiceName};

/// What a reconciliation did to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryDiff {
    /// Keys deleted because they are absent from the snapshot.
    pub removed: Vec<ServiceName>,
    /// Keys that did not exist before.
    pub added: usize,
    /// Keys whose backend list was overwritten with a different one.
    pub updated: usize,
    /// Keys rewritten with an identical list.
    pub unchanged: usize,
}

/// Keys present in `store` but absent from `snapshot`.
pub fn exclusive_keys(store: &RegistryStore, snapshot: &RegistrySnapshot) -> Vec<ServiceName> {
    store
        .service_names()
        .into_iter()
        .filter(|name| !snapshot.contains(name))
        .collect()
}

/// Make `store` equal to `snapshot`.
pub fn reconcile(store: &RegistryStore, snapshot: RegistrySnapshot) -> RegistryDiff {
    let mut diff = RegistryDiff {
        removed: exclusive_keys(store, &snapshot),
        ..Default::default()
    };

    for name in &diff.removed {
        store.remove(name);
    }

    for (name, backends) in snapshot.into_services() {
        let backends: Arc<[String]> = Arc::from(backends);
        match store.insert(name, backends.clone()) {
            None => diff.added += 1,
            Some(prev) if prev == backends => diff.unchanged += 1,
            Some(_) => diff.updated += 1,
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn snapshot(entries: &[(&str, &[&str])]) -> RegistrySnapshot {
        let map: HashMap<String, Vec<String>> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect();
        RegistrySnapshot::from(map)
    }

    #[test]
    fn test_exclusive_keys() {
        let store = RegistryStore::new();
        reconcile(&store, snapshot(&[("A", &["a:1"]), ("B", &["b:1"])]));

        let mut keys = exclusive_keys(&store, &snapshot(&[("B", &["b:1"]), ("C", &[])]));
        keys.sort();
        assert_eq!(keys, vec!["A".to_string()]);
    }

    #[test]
    fn test_reconcile_converges() {
        let store = RegistryStore::new();
        let a = snapshot(&[("A", &["a:1", "a:2"]), ("B", &["b:1"]), ("C", &[])]);
        let b = snapshot(&[("B", &["b:2"]), ("C", &[]), ("D", &["d:1"])]);

        let diff = reconcile(&store, a);
        assert_eq!(diff.added, 3);
        assert!(diff.removed.is_empty());

        let diff = reconcile(&store, b.clone());
        assert_eq!(diff.removed, vec!["A".to_string()]);
        assert_eq!(diff.added, 1);
        assert_eq!(diff.updated, 1);
        assert_eq!(diff.unchanged, 1);

        assert_eq!(store.to_map(), b.into_services());
    }

    #[test]
    fn test_reconcile_identical_snapshot_is_stable() {
        let store = RegistryStore::new();
        let a = snapshot(&[("A", &["a:1"])]);
        reconcile(&store, a.clone());
        let diff = reconcile(&store, a);
        assert_eq!(
            diff,
            RegistryDiff {
                unchanged: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_reconcile_to_empty_snapshot_clears_store() {
        let store = RegistryStore::new();
        reconcile(&store, snapshot(&[("A", &["a:1"])]));
        reconcile(&store, RegistrySnapshot::default());
        assert!(store.is_empty());
    }
}
