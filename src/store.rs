//! Durable key/value state.
//!
//! Uses LMDB (via heed) so each `persist` is an atomic, crash-safe replacement of the
//! value stored under one key. Values are opaque JSON documents.

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvFlags, EnvOpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{MappingError, Result};

pub const STATE_DB: &str = "state";

const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;
const DEFAULT_MAX_DBS: u32 = 4;

type StateDb = Database<Str, Bytes>;

#[derive(Debug, Clone)]
pub struct StateStore {
    env: Arc<Env>,
    state: StateDb,
}

impl StateStore {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MappingError::io(parent, e))?;
        }

        let env = Arc::new(open_env(&db_path)?);
        let mut wtxn = env.write_txn()?;
        let state = env.create_database::<Str, Bytes>(&mut wtxn, Some(STATE_DB))?;
        wtxn.commit()?;

        Ok(Self { env, state })
    }

    pub fn persist(&self, key: &str, json: &[u8]) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.state.put(&mut wtxn, key, json)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn load_persisted(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let rtxn = self.env.read_txn()?;
        Ok(self.state.get(&rtxn, key)?.map(<[u8]>::to_vec))
    }
}

fn open_env(db_path: &Path) -> Result<Env> {
    let mut options = EnvOpenOptions::new();
    options.map_size(DEFAULT_MAP_SIZE);
    options.max_dbs(DEFAULT_MAX_DBS);
    // SAFETY: We do not use NO_LOCK and keep default LMDB locking guarantees.
    // NO_SUB_DIR keeps the store as a single file next to its lock file.
    let env = unsafe {
        options.flags(EnvFlags::NO_SUB_DIR);
        options.open(db_path)?
    };
    Ok(env)
}

#[cfg(test)]
pub(crate) fn temp_path(name: &str) -> PathBuf {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "mapping_finder_test_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}
