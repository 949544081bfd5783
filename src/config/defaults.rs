//! Built-in defaults (layer 1)
//!
//! Hardcoded defaults for all configuration values.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use super::BinmockConfig;

/// Compiler used when nothing else is configured
pub const DEFAULT_RUSTC: &str = "rustc";

/// Directory name under the system temp dir holding stub builds
pub const SCRATCH_DIR_NAME: &str = "binmock";

/// Loopback with an OS-assigned port
pub fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 0))
}

pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_DIR_NAME)
}

impl Default for BinmockConfig {
    fn default() -> Self {
        Self {
            rustc: PathBuf::from(DEFAULT_RUSTC),
            rustc_flags: Vec::new(),
            scratch_dir: default_scratch_dir(),
            bind_addr: default_bind_addr(),
        }
    }
}
