//! Configuration for mcdb
//!
//! Centralized configuration with sensible defaults.

/// Options shared by builders and readers
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Build Configuration
    // -------------------------------------------------------------------------
    /// fsync the finished container before renaming it into place.
    /// Without it an OS crash shortly after `finish` may publish a torn file.
    pub fsync_on_finish: bool,

    /// Permission bits for newly created containers (unix only).
    /// A rebuild over an existing container keeps that file's permissions.
    /// `None` keeps whatever the temp file was created with (0600).
    pub file_mode: Option<u32>,

    // -------------------------------------------------------------------------
    // Read Configuration
    // -------------------------------------------------------------------------
    /// Memory-map containers; when false the file is read into memory
    pub use_mmap: bool,

    /// Ask the OS to fault the whole mapping in up front
    pub prefault: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fsync_on_finish: true,
            file_mode: Some(0o644),
            use_mmap: true,
            prefault: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Enable or disable fsync before publishing a finished container
    pub fn fsync_on_finish(mut self, enabled: bool) -> Self {
        self.config.fsync_on_finish = enabled;
        self
    }

    /// Set the permission bits of published containers
    pub fn file_mode(mut self, mode: Option<u32>) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Enable or disable memory mapping on open
    pub fn use_mmap(mut self, enabled: bool) -> Self {
        self.config.use_mmap = enabled;
        self
    }

    /// Prefault mapped pages on open
    pub fn prefault(mut self, enabled: bool) -> Self {
        self.config.prefault = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
