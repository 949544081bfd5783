//! Configuration layers
//!
//! Settings are resolved in three layers, later layers winning:
//! 1. Built-in defaults
//! 2. TOML file named by `BINMOCK_CONFIG`
//! 3. Individual environment overrides (`BINMOCK_RUSTC`, `BINMOCK_RUSTC_FLAGS`,
//!    `BINMOCK_SCRATCH_DIR`, `BINMOCK_BIND_ADDR`)

mod defaults;

pub use defaults::{default_bind_addr, default_scratch_dir, DEFAULT_RUSTC, SCRATCH_DIR_NAME};

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Names a TOML config file
pub const CONFIG_ENV: &str = "BINMOCK_CONFIG";
pub const RUSTC_ENV: &str = "BINMOCK_RUSTC";
/// Whitespace separated extra compiler flags
pub const RUSTC_FLAGS_ENV: &str = "BINMOCK_RUSTC_FLAGS";
pub const SCRATCH_DIR_ENV: &str = "BINMOCK_SCRATCH_DIR";
pub const BIND_ADDR_ENV: &str = "BINMOCK_BIND_ADDR";

/// Resolved configuration for stub synthesis and the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinmockConfig {
    /// Compiler used to build stub executables
    pub rustc: PathBuf,

    /// Extra flags passed to the compiler
    pub rustc_flags: Vec<String>,

    /// Where stub sources and binaries are written
    pub scratch_dir: PathBuf,

    /// Address the coordinator listens on; must be loopback
    pub bind_addr: SocketAddr,
}

impl BinmockConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the process environment
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Apply the individual environment overrides
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rustc) = lookup(RUSTC_ENV).filter(|v| !v.is_empty()) {
            self.rustc = PathBuf::from(rustc);
        }
        if let Some(flags) = lookup(RUSTC_FLAGS_ENV) {
            self.rustc_flags = flags.split_whitespace().map(str::to_string).collect();
        }
        if let Some(dir) = lookup(SCRATCH_DIR_ENV).filter(|v| !v.is_empty()) {
            self.scratch_dir = PathBuf::from(dir);
        }
        if let Some(addr) = lookup(BIND_ADDR_ENV).filter(|v| !v.is_empty()) {
            self.bind_addr = addr.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "{} is not a socket address: {}",
                    BIND_ADDR_ENV, addr
                ))
            })?;
        }
        Ok(())
    }

    /// Check invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rustc.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("rustc must not be empty".to_string()));
        }
        if !self.bind_addr.ip().is_loopback() {
            return Err(ConfigError::ValidationError(format!(
                "bind_addr must be a loopback address, got {}",
                self.bind_addr
            )));
        }
        Ok(())
    }

    pub fn with_rustc(mut self, rustc: impl Into<PathBuf>) -> Self {
        self.rustc = rustc.into();
        self
    }

    pub fn with_rustc_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rustc_flags = flags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
