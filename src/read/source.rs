//! Container bytes
//!
//! A container is either memory-mapped read-only or held in an owned buffer.

use std::fs::{File, Metadata};
use std::io::Read;
use std::ops::Deref;
use std::path::Path;
use std::time::SystemTime;

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::config::Config;
use crate::error::{McdbError, Result};
use crate::format::MIN_CONTAINER_SIZE;

/// Backing storage of an open container
pub(crate) enum Source {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Source {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Source::Mapped(map) => map,
            Source::Owned(bytes) => bytes,
        }
    }
}

/// Identity of the file a container was opened from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
    #[cfg(unix)]
    inode: (u64, u64),
}

impl FileStamp {
    pub fn of(meta: &Metadata) -> Self {
        #[cfg(unix)]
        use std::os::unix::fs::MetadataExt;

        Self {
            len: meta.len(),
            modified: meta.modified().ok(),
            #[cfg(unix)]
            inode: (meta.dev(), meta.ino()),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        Ok(Self::of(&std::fs::metadata(path)?))
    }
}

impl Source {
    /// Open `path`, mapping it unless the config says otherwise
    pub fn open(path: &Path, config: &Config) -> Result<(Self, FileStamp)> {
        let mut file = File::open(path)?;
        let meta = file.metadata()?;
        let size = meta.len();

        debug!("Opening container: {:?} (size: {} bytes)", path, size);

        // Reject before mapping: zero-length maps are not portable
        if size < u64::from(MIN_CONTAINER_SIZE) {
            return Err(McdbError::format(format!(
                "container too small: {} bytes, need at least {}",
                size, MIN_CONTAINER_SIZE
            )));
        }
        if size > u64::from(u32::MAX) {
            return Err(McdbError::format(format!(
                "container too large for 32-bit offsets: {} bytes",
                size
            )));
        }

        let source = if config.use_mmap {
            // SAFETY: containers are never modified in place; replacements
            // arrive by rename, which leaves this mapping intact.
            let map = unsafe { MmapOptions::new().map(&file)? };
            if config.prefault {
                prefault(&map);
            }
            Source::Mapped(map)
        } else {
            let mut bytes = Vec::with_capacity(size as usize);
            file.read_to_end(&mut bytes)?;
            Source::Owned(bytes)
        };

        Ok((source, FileStamp::of(&meta)))
    }
}

#[cfg(unix)]
fn prefault(map: &Mmap) {
    if let Err(e) = map.advise(memmap2::Advice::WillNeed) {
        debug!("madvise(WILLNEED) failed: {}", e);
    }
}

#[cfg(not(unix))]
fn prefault(_map: &Mmap) {}
