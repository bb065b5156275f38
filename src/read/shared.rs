//! Shared, refreshable container handle
//!
//! Long-running processes keep one `SharedMcdb` and hand out `Arc<Mcdb>`
//! snapshots to reader threads. When a new container is renamed over the
//! path, `refresh` maps the new file; readers still holding the old snapshot
//! keep using it until they drop it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;

use super::reader::Mcdb;
use super::source::FileStamp;

/// Thread-safe handle that follows atomic replacements of a container file
///
/// ## Concurrency:
/// - `current`: RwLock held only to clone or swap the `Arc`
/// - Lookups run on the snapshot without any lock
pub struct SharedMcdb {
    path: PathBuf,
    config: Config,
    current: RwLock<Arc<Mcdb>>,
}

impl SharedMcdb {
    pub fn open(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Mcdb::open_with(&path, config)?;
        Ok(Self {
            path,
            config: config.clone(),
            current: RwLock::new(Arc::new(db)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The container as of the last refresh
    pub fn current(&self) -> Arc<Mcdb> {
        Arc::clone(&self.current.read())
    }

    /// Whether the file at `path` differs from the mapped snapshot
    pub fn is_stale(&self) -> Result<bool> {
        let on_disk = FileStamp::read(&self.path)?;
        Ok(self.current.read().stamp() != Some(&on_disk))
    }

    /// Remap the container if the file was replaced. Returns whether a new
    /// snapshot was installed. On error the previous snapshot stays current.
    pub fn refresh(&self) -> Result<bool> {
        if !self.is_stale()? {
            return Ok(false);
        }

        let fresh = match Mcdb::open_with(&self.path, &self.config) {
            Ok(db) => db,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "refresh failed, keeping previous container");
                return Err(e);
            }
        };

        let mut current = self.current.write();
        // Another thread may have installed the same file meanwhile
        if current.stamp() == fresh.stamp() {
            return Ok(false);
        }
        *current = Arc::new(fresh);
        debug!(path = %self.path.display(), records = current.len(), "container refreshed");
        Ok(true)
    }
}
