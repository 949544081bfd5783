//! Top-level error type.

use crate::config::ConfigError;
use crate::coordinator::CoordinatorError;
use crate::synthesis::BuildError;

/// Anything that can stop a mock from being created.
#[derive(Debug, thiserror::Error)]
pub enum BinmockError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("Stub build failed: {0}")]
    Build(#[from] BuildError),
}
