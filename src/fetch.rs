use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing::info;

use crate::config::ensure_parent;
use crate::error::{MappingError, Result};

/// Retrieves raw bytes from a URL. Implementations block until the response
/// arrives or their timeout elapses.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches through the system `curl`.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    timeout: Duration,
}

impl CurlFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        info!(url, "fetching");
        let max_time = self.timeout.as_secs().max(1).to_string();
        let output = Command::new("curl")
            .args([
                "-L",
                "--fail",
                "--silent",
                "--show-error",
                "--max-time",
                max_time.as_str(),
                url,
            ])
            .output()
            .map_err(|e| MappingError::Network {
                url: url.to_string(),
                message: format!("failed to execute curl: {e}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MappingError::Network {
                url: url.to_string(),
                message: format!("curl exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(output.stdout)
    }
}

/// Writes `bytes` to a uniquely named file next to `target` and renames it into place,
/// so readers never see a partial file. Concurrent writers of the same target each
/// publish a complete copy.
pub fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(target)?;
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        target.file_name().unwrap_or_default().to_string_lossy()
    );

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| MappingError::io(parent, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| MappingError::io(tmp.path(), e))?;

    // A failed persist drops the temp file, which removes it.
    tmp.persist(target)
        .map_err(|e| MappingError::io(e.file.path(), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_path;

    #[test]
    fn write_atomically_replaces_existing_file() -> anyhow::Result<()> {
        let dir = temp_path("fetch_atomic");
        let target = dir.join("nested").join("1.20.1.txt");

        write_atomically(&target, b"first")?;
        write_atomically(&target, b"second")?;
        assert_eq!(std::fs::read(&target)?, b"second");

        let leftovers: Vec<_> = std::fs::read_dir(dir.join("nested"))?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp"))
            .collect();
        assert!(leftovers.is_empty());

        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }

    #[test]
    fn concurrent_writers_of_one_target_all_succeed() -> anyhow::Result<()> {
        use std::sync::{Arc, Barrier};

        let dir = temp_path("fetch_concurrent");
        let target = Arc::new(dir.join("artifacts").join("1.20.1.jar"));
        let barrier = Arc::new(Barrier::new(2));
        let payloads = [vec![b'a'; 4 << 20], vec![b'b'; 4 << 20]];

        for _ in 0..10 {
            let handles: Vec<_> = payloads
                .iter()
                .cloned()
                .map(|payload| {
                    let target = Arc::clone(&target);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        write_atomically(&target, &payload)
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap()?;
            }

            let written = std::fs::read(target.as_path())?;
            assert!(payloads.contains(&written), "target holds a torn write");
        }

        let leftovers = std::fs::read_dir(dir.join("artifacts"))?.count();
        assert_eq!(leftovers, 1);

        let _ = std::fs::remove_dir_all(dir);
        Ok(())
    }
}
