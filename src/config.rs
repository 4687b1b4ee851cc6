//! Server configuration.
//!
//! All process-wide settings live in one immutable [`ServerConfig`], built
//! once at startup through [`ServerConfigBuilder`] and shared behind an
//! `Arc`. Components receive it explicitly; nothing in the library reads
//! the process environment after startup. The `docconv` binary maps the
//! `MAX_FILE_SIZE`, `TEMP_DIR`, `LOG_LEVEL`, `ENABLE_PANDOC`, … variables
//! onto the builder.

use crate::error::SetupError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default input size limit: 100 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Configuration shared by every conversion request.
///
/// # Example
/// ```rust
/// use edgequake_docconv::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .max_file_size(10 * 1024 * 1024)
///     .enable_pandoc(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_file_size, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Largest input file accepted, in bytes. Default: 100 MiB.
    ///
    /// This is the only size limit in the system: single conversions and
    /// batch runs both compare against it.
    pub max_file_size: u64,

    /// Directory for staging files written by conversion attempts.
    /// Default: the platform temp directory.
    pub temp_dir: PathBuf,

    /// Log filter directive used when `RUST_LOG` is unset. Default: "info".
    pub log_level: String,

    /// Whether the pandoc engine may be used at all. Default: true.
    ///
    /// When false, pandoc is reported unavailable without being probed.
    pub enable_pandoc: bool,

    /// Upper bound on a single strategy attempt, in seconds. Default: 120.
    ///
    /// A timed-out attempt counts as a failed attempt and the chain moves
    /// on to the next candidate.
    pub strategy_timeout_secs: u64,

    /// Files converted concurrently by a batch run. Default: 4.
    pub batch_concurrency: usize,

    /// Program name or path of the markitdown CLI. Default: "markitdown".
    pub markitdown_path: PathBuf,

    /// Program name or path of the pandoc CLI. Default: "pandoc".
    pub pandoc_path: PathBuf,

    /// Explicit pdfium shared library. If None, the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            temp_dir: std::env::temp_dir(),
            log_level: "info".to_string(),
            enable_pandoc: true,
            strategy_timeout_secs: 120,
            batch_concurrency: 4,
            markitdown_path: PathBuf::from("markitdown"),
            pandoc_path: PathBuf::from("pandoc"),
            pdfium_lib_path: None,
        }
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_secs(self.strategy_timeout_secs)
    }

    /// Size limit in MiB, for human-readable reports.
    pub fn max_file_size_mb(&self) -> f64 {
        self.max_file_size as f64 / (1024.0 * 1024.0)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    pub fn enable_pandoc(mut self, v: bool) -> Self {
        self.config.enable_pandoc = v;
        self
    }

    pub fn strategy_timeout_secs(mut self, secs: u64) -> Self {
        self.config.strategy_timeout_secs = secs;
        self
    }

    pub fn batch_concurrency(mut self, n: usize) -> Self {
        self.config.batch_concurrency = n.clamp(1, 64);
        self
    }

    pub fn markitdown_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.markitdown_path = path.into();
        self
    }

    pub fn pandoc_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pandoc_path = path.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, SetupError> {
        let c = &self.config;
        if c.max_file_size == 0 {
            return Err(SetupError::InvalidConfig(
                "MAX_FILE_SIZE must be greater than 0".into(),
            ));
        }
        if c.strategy_timeout_secs == 0 {
            return Err(SetupError::InvalidConfig(
                "Strategy timeout must be ≥ 1 second".into(),
            ));
        }
        if c.temp_dir.as_os_str().is_empty() {
            return Err(SetupError::InvalidConfig("TEMP_DIR must not be empty".into()));
        }
        Ok(self.config)
    }
}

/// The part of the configuration reported by the health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub max_file_size: u64,
    pub max_file_size_mb: String,
    pub temp_dir: PathBuf,
    pub pandoc_enabled: bool,
    pub strategy_timeout_secs: u64,
    pub batch_concurrency: usize,
}

impl From<&ServerConfig> for ConfigSummary {
    fn from(c: &ServerConfig) -> Self {
        Self {
            max_file_size: c.max_file_size,
            max_file_size_mb: format!("{:.1}MB", c.max_file_size_mb()),
            temp_dir: c.temp_dir.clone(),
            pandoc_enabled: c.enable_pandoc,
            strategy_timeout_secs: c.strategy_timeout_secs,
            batch_concurrency: c.batch_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ServerConfig::default();
        assert_eq!(c.max_file_size, 104_857_600);
        assert!(c.enable_pandoc);
        assert_eq!(c.strategy_timeout(), Duration::from_secs(120));
        assert_eq!(c.batch_concurrency, 4);
        assert_eq!(c.pdfium_lib_path, None);
    }

    #[test]
    fn builder_clamps_concurrency() {
        let c = ServerConfig::builder().batch_concurrency(0).build().unwrap();
        assert_eq!(c.batch_concurrency, 1);
    }

    #[test]
    fn zero_size_limit_is_rejected() {
        let err = ServerConfig::builder().max_file_size(0).build().unwrap_err();
        assert!(err.to_string().contains("MAX_FILE_SIZE"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(ServerConfig::builder()
            .strategy_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn summary_formats_megabytes() {
        let c = ServerConfig::builder()
            .max_file_size(10 * 1024 * 1024)
            .build()
            .unwrap();
        let s = ConfigSummary::from(&c);
        assert_eq!(s.max_file_size_mb, "10.0MB");
    }
}
