//! Non-blocking, non-reentrant lock keyed by name.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::hash::Hash;

#[derive(Debug)]
pub struct NamedLock<K: Eq + Hash> {
    held: DashMap<K, ()>,
}

impl<K: Eq + Hash> Default for NamedLock<K> {
    fn default() -> Self {
        Self {
            held: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> NamedLock<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires `key` if nobody holds it. Never waits: contention returns `None`.
    /// The returned guard releases the key when dropped, on every exit path.
    pub fn try_lock(&self, key: &K) -> Option<NamedLockGuard<'_, K>> {
        match self.held.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(NamedLockGuard {
                    lock: self,
                    key: key.clone(),
                })
            }
        }
    }

    pub fn is_locked(&self, key: &K) -> bool {
        self.held.contains_key(key)
    }
}

#[must_use = "the key is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct NamedLockGuard<'a, K: Eq + Hash> {
    lock: &'a NamedLock<K>,
    key: K,
}

impl<K: Eq + Hash> Drop for NamedLockGuard<'_, K> {
    fn drop(&mut self) {
        self.lock.held.remove(&self.key);
    }
}
