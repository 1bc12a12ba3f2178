use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::error::{MappingError, Result};
use crate::index::MappingIndex;
use crate::lock::NamedLock;
use crate::namespace::Namespaces;
use crate::symbol::TaskKey;

/// Parsed mapping indexes, one per (version, namespace), built at most once at a time.
pub struct MappingCache {
    namespaces: Namespaces,
    entries: DashMap<TaskKey, Arc<MappingIndex>>,
    building: NamedLock<TaskKey>,
}

impl MappingCache {
    pub fn new(namespaces: Namespaces) -> Self {
        Self {
            namespaces,
            entries: DashMap::new(),
            building: NamedLock::new(),
        }
    }

    pub fn cached_mapping(&self, version: &str, namespace: &str) -> bool {
        self.entries
            .contains_key(&TaskKey::new(version, namespace))
    }

    /// Returns the cached index or builds it.
    ///
    /// If another caller is already building the same key this fails with
    /// [`MappingError::Busy`] instead of waiting. A failed build caches nothing.
    pub fn load_mapping(&self, version: &str, namespace: &str) -> Result<Arc<MappingIndex>> {
        let service = self.namespaces.get(namespace)?;
        let key = TaskKey::new(version, namespace);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(&hit));
        }

        let Some(_guard) = self.building.try_lock(&key) else {
            return Err(MappingError::Busy(key));
        };
        // Another builder may have published between the lookup and the lock.
        if let Some(hit) = self.entries.get(&key) {
            return Ok(Arc::clone(&hit));
        }

        let start = Instant::now();
        let pairs = service.parse(version)?;
        let index = Arc::new(MappingIndex::from_pairs(pairs));
        info!(
            task = %key,
            symbols = index.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "mapping loaded"
        );
        self.entries.insert(key, Arc::clone(&index));
        Ok(index)
    }
}
