//! Buffer configuration.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $SLUICE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/sluice/config.toml
//!   3. ~/.config/sluice/config.toml
//!
//! Size limits use 0 for "unbounded".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::write::DEFAULT_WRITE_CHUNK_SIZE;

/// Bytes requested from the transport per read.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 64 * 1024;

/// Read buffer cap for the stream layer (100 MB).
pub const DEFAULT_MAX_READ_BUFFER_SIZE: usize = 104_857_600;

/// Sizing for one stream's read and write buffers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Bytes requested per transport read.
    pub read_chunk_size: usize,
    /// Ceiling on bytes offered per transport write attempt.
    pub write_chunk_size: usize,
    /// Read buffer cap while waiting for a read to match. 0 = unbounded.
    pub max_read_buffer_size: usize,
    /// Write buffer cap; enqueues past it are rejected. 0 = unbounded.
    pub max_write_buffer_size: usize,
    /// Default ceiling for delimiter and regex reads. 0 = unbounded.
    pub read_max_bytes: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            write_chunk_size: DEFAULT_WRITE_CHUNK_SIZE,
            max_read_buffer_size: DEFAULT_MAX_READ_BUFFER_SIZE,
            max_write_buffer_size: 0,
            read_max_bytes: 0,
        }
    }
}

impl BufferConfig {
    pub fn max_read_buffer_limit(&self) -> Option<usize> {
        nonzero(self.max_read_buffer_size)
    }

    pub fn max_write_buffer_limit(&self) -> Option<usize> {
        nonzero(self.max_write_buffer_size)
    }

    pub fn read_max_bytes_limit(&self) -> Option<usize> {
        nonzero(self.read_max_bytes)
    }

    /// Reject settings the engines cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_chunk_size == 0 {
            return Err(ConfigError::Invalid("read_chunk_size must be non-zero"));
        }
        if self.write_chunk_size == 0 {
            return Err(ConfigError::Invalid("write_chunk_size must be non-zero"));
        }
        Ok(())
    }
}

fn nonzero(v: usize) -> Option<usize> {
    (v != 0).then_some(v)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("sluice")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl BufferConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path(), |key| std::env::var(key).ok())
    }

    /// Load from `path` (defaults if it does not exist), then apply overrides
    /// from `lookup`.
    fn load_from(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?
        } else {
            BufferConfig::default()
        };
        config.apply_overrides(lookup);
        config.validate()?;
        tracing::debug!(path = %path.display(), ?config, "buffer config loaded");
        Ok(config)
    }

    /// Parse config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BufferConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("SLUICE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        Self::write_default_at(&path)?;
        Ok(path)
    }

    fn write_default_at(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))?;
        }
        let text = toml::to_string_pretty(&BufferConfig::default())
            .map_err(ConfigError::SerializeFailed)?;
        std::fs::write(path, text).map_err(|e| ConfigError::WriteFailed(path.to_path_buf(), e))
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut usize); 5] = [
            ("SLUICE_READ_CHUNK_SIZE", &mut self.read_chunk_size),
            ("SLUICE_WRITE_CHUNK_SIZE", &mut self.write_chunk_size),
            ("SLUICE_MAX_READ_BUFFER_SIZE", &mut self.max_read_buffer_size),
            ("SLUICE_MAX_WRITE_BUFFER_SIZE", &mut self.max_write_buffer_size),
            ("SLUICE_READ_MAX_BYTES", &mut self.read_max_bytes),
        ];
        for (key, field) in fields {
            let Some(v) = lookup(key) else { continue };
            match v.trim().parse() {
                Ok(n) => *field = n,
                Err(_) => tracing::warn!(key, value = %v, "ignoring unparseable override"),
            }
        }
    }
}
