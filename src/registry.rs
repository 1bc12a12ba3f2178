//! Tracks which (version, namespace) source trees are available, pending or absent.
//!
//! `Absent -> Pending` on [`TaskRegistry::start_pending`], then `Pending -> Available` on
//! [`TaskRegistry::done`] or `Pending -> Absent` on [`TaskRegistry::failure`]. Only the
//! Available set is durable; pending markers live in memory and vanish on restart.

use dashmap::DashSet;
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::error;

use crate::error::Result;
use crate::store::StateStore;
use crate::symbol::TaskKey;

pub const AVAILABLE_KEY: &str = "source_available";

/// `{ "<namespace>": ["<version>", ...] }`
pub type AvailableSet = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Available,
    Pending,
    Absent,
}

#[derive(Debug)]
pub struct TaskRegistry {
    store: StateStore,
    available: RwLock<AvailableSet>,
    pending: DashSet<TaskKey>,
}

impl TaskRegistry {
    pub fn open(store: StateStore) -> Result<Self> {
        let available = match store.load_persisted(AVAILABLE_KEY)? {
            Some(raw) => serde_json::from_slice(&raw)?,
            None => AvailableSet::new(),
        };
        Ok(Self {
            store,
            available: RwLock::new(available),
            pending: DashSet::new(),
        })
    }

    pub fn is_available(&self, key: &TaskKey) -> bool {
        self.available
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key.namespace)
            .is_some_and(|versions| versions.contains(&key.version))
    }

    pub fn is_pending(&self, key: &TaskKey) -> bool {
        self.pending.contains(key)
    }

    pub fn state(&self, key: &TaskKey) -> TaskState {
        if self.is_available(key) {
            TaskState::Available
        } else if self.is_pending(key) {
            TaskState::Pending
        } else {
            TaskState::Absent
        }
    }

    pub fn can_add_task(&self, key: &TaskKey) -> bool {
        !self.is_available(key) && !self.is_pending(key)
    }

    /// Marks `key` pending. Returns `false` if it already was.
    pub fn start_pending(&self, key: &TaskKey) -> bool {
        self.pending.insert(key.clone())
    }

    pub fn failure(&self, key: &TaskKey) {
        self.pending.remove(key);
    }

    /// Moves `key` to Available and rewrites the whole persisted set.
    /// A version already present is not added twice.
    pub fn done(&self, key: &TaskKey) -> Result<()> {
        let mut available = self
            .available
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let versions = available.entry(key.namespace.clone()).or_default();
        if !versions.contains(&key.version) {
            versions.push(key.version.clone());
        }
        self.pending.remove(key);

        let json = serde_json::to_vec_pretty(&*available)?;
        self.store.persist(AVAILABLE_KEY, &json).inspect_err(|e| {
            error!(task = %key, error = %e, "failed to persist available sources");
        })
    }

    pub fn available(&self) -> AvailableSet {
        self.available
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_path;
    use std::sync::Arc;

    fn open(name: &str) -> (TaskRegistry, std::path::PathBuf) {
        let dir = temp_path(name);
        let store = StateStore::open(dir.join("state.lmdb")).unwrap();
        (TaskRegistry::open(store).unwrap(), dir)
    }

    #[test]
    fn state_machine_transitions() {
        let (registry, dir) = open("registry_transitions");
        let key = TaskKey::new("1.20.1", "yarn");

        assert!(registry.can_add_task(&key));
        assert_eq!(registry.state(&key), TaskState::Absent);

        assert!(registry.start_pending(&key));
        assert!(!registry.start_pending(&key));
        assert!(!registry.can_add_task(&key));
        assert_eq!(registry.state(&key), TaskState::Pending);

        registry.failure(&key);
        assert!(registry.can_add_task(&key));

        registry.start_pending(&key);
        registry.done(&key).unwrap();
        assert!(!registry.can_add_task(&key));
        assert!(!registry.is_pending(&key));
        assert_eq!(registry.state(&key), TaskState::Available);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn done_persists_and_dedupes() -> anyhow::Result<()> {
        let dir = temp_path("registry_persist");
        let db_path = dir.join("state.lmdb");
        let key = TaskKey::new("1.20.1", "official");
        {
            let registry = TaskRegistry::open(StateStore::open(db_path.clone())?)?;
            registry.done(&key)?;
            registry.done(&key)?;
            registry.done(&TaskKey::new("1.19.4", "official"))?;
        }

        let store = StateStore::open(db_path)?;
        let raw = store.load_persisted(AVAILABLE_KEY)?.unwrap();
        let persisted: AvailableSet = serde_json::from_slice(&raw)?;
        assert_eq!(persisted["official"], vec!["1.20.1", "1.19.4"]);

        let registry = TaskRegistry::open(store)?;
        assert!(registry.is_available(&key));
        assert!(!registry.is_pending(&key));

        drop(registry);
        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }

    #[test]
    fn racing_done_records_version_once() {
        let (registry, dir) = open("registry_race");
        let registry = Arc::new(registry);
        let key = TaskKey::new("1.20.1", "yarn");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let key = key.clone();
                std::thread::spawn(move || registry.done(&key))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(registry.available()["yarn"], vec!["1.20.1"]);
        let _ = std::fs::remove_dir_all(dir);
    }
}
