//! File build transaction
//!
//! Builds into a uniquely named temporary file next to the destination and
//! renames it into place on `finish`, so readers only ever see a complete
//! container. Dropping or cancelling an unfinished build removes the
//! temporary file. Replacing a container keeps its permissions; new files
//! get `Config::file_mode`.

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::config::Config;
use crate::error::{McdbError, Result};

use super::builder::McdbBuilder;
use super::{BuildSummary, RecordSink};

type TempBuilder = McdbBuilder<BufWriter<NamedTempFile>>;

/// A build transaction targeting a file path
pub struct McdbMake {
    /// Final destination
    path: PathBuf,
    config: Config,
    /// Permissions of the container being replaced, carried to its successor
    existing: Option<fs::Permissions>,
    /// `None` once finished, failed in `finish`, or cancelled
    builder: Option<TempBuilder>,
}

impl McdbMake {
    /// Begin building a container that will be published at `path`
    pub fn create(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| McdbError::Value(format!("not a file path: {}", path.display())))?;

        let existing = match fs::metadata(&path) {
            Ok(meta) if !meta.is_file() => {
                return Err(McdbError::Value(format!(
                    "destination is not a regular file: {}",
                    path.display()
                )))
            }
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", name))
            .suffix(".tmp")
            .tempfile_in(&dir)?;
        debug!(temp = %temp.path().display(), dest = %path.display(), "build started");

        let builder = McdbBuilder::new(BufWriter::new(temp))?;

        Ok(Self {
            path,
            config: config.clone(),
            existing,
            builder: Some(builder),
        })
    }

    /// Destination path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the in-progress temporary file
    pub fn temp_path(&self) -> Option<&Path> {
        self.builder.as_ref().map(|b| b.get_ref().get_ref().path())
    }

    /// Number of records added so far
    pub fn record_count(&self) -> u64 {
        self.builder.as_ref().map_or(0, |b| b.record_count())
    }

    fn builder_mut(&mut self) -> Result<&mut TempBuilder> {
        self.builder
            .as_mut()
            .ok_or_else(|| McdbError::state("build already finished or cancelled"))
    }

    /// Append a record
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.builder_mut()?.add(key, value)
    }

    /// Append a record keyed by `tag` followed by `key`
    pub fn add_tagged(&mut self, tag: u8, key: &[u8], value: &[u8]) -> Result<()> {
        self.builder_mut()?.add_tagged(tag, key, value)
    }

    /// Write the index, sync, and atomically publish the container.
    ///
    /// On error the temporary file is removed and the destination is left
    /// untouched. A second call is a `State` error.
    pub fn finish(&mut self) -> Result<BuildSummary> {
        let mut builder = self
            .builder
            .take()
            .ok_or_else(|| McdbError::state("finish called twice"))?;

        let summary = builder.finish()?;

        let temp = builder
            .into_inner()?
            .into_inner()
            .map_err(|e| McdbError::Io(e.into_error()))?;

        if self.config.fsync_on_finish {
            temp.as_file().sync_all()?;
        }
        match self.existing.take() {
            Some(perms) => temp.as_file().set_permissions(perms)?,
            None => set_mode(temp.as_file(), self.config.file_mode)?,
        }

        temp.persist(&self.path).map_err(|e| McdbError::Io(e.error))?;
        debug!(
            dest = %self.path.display(),
            records = summary.records,
            size = summary.size,
            "container published"
        );

        Ok(summary)
    }

    /// Abandon the build and remove the temporary file
    pub fn cancel(mut self) {
        if let Some(builder) = self.builder.take() {
            debug!(dest = %self.path.display(), records = builder.record_count(), "build cancelled");
        }
    }
}

impl RecordSink for McdbMake {
    fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        McdbMake::add(self, key, value)
    }
}

#[cfg(unix)]
fn set_mode(file: &fs::File, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        file.set_permissions(fs::Permissions::from_mode(mode))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _mode: Option<u32>) -> Result<()> {
    Ok(())
}
