//! Runtime settings for segment opening and copying.
//!
//! Settings always have usable defaults. With the `config` feature enabled
//! they can also be read from a TOML file, either an explicit path or
//! `<config dir>/multiseek/config.toml`.

use crate::error::{MultiSeekError, Result};
#[cfg(feature = "config")]
use std::path::{Path, PathBuf};

/// Tunables used by the segment factory and the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct Settings {
    /// Uncompressed segments smaller than this are loaded into memory;
    /// larger ones are memory-mapped
    pub memory_threshold: u64,
    /// Compressed segments smaller than this are decompressed into memory;
    /// larger ones go through a temporary file
    pub compressed_memory_threshold: u64,
    /// Buffer size used when copying stream bytes to the output
    pub copy_buffer_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            memory_threshold: 50 * 1024 * 1024,    // 50MB
            compressed_memory_threshold: 10_000_000, // 10MB
            copy_buffer_size: 64 * 1024,
        }
    }
}

impl Settings {
    /// Reject settings the factory or CLI cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.copy_buffer_size == 0 {
            return Err(MultiSeekError::configuration(
                "copy_buffer_size must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Default location of the settings file, if the platform has a config dir
    #[cfg(feature = "config")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("multiseek").join("config.toml"))
    }

    /// Load settings from `path`, or from the default location
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// explicit file is an error.
    #[cfg(feature = "config")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            log::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|e| {
            MultiSeekError::configuration(format!(
                "cannot read settings file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&text)
    }

    /// Parse settings from TOML text; absent keys keep their defaults
    #[cfg(feature = "config")]
    pub fn from_toml(text: &str) -> Result<Self> {
        let settings: Self = toml::from_str(text)
            .map_err(|e| MultiSeekError::configuration(format!("invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}
