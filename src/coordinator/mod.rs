//! Coordinator
//!
//! A loopback HTTP server that receives invocation reports from stub
//! processes and routes them to the owning mock by identifier. One
//! coordinator is shared by every mock in the process; it starts lazily on
//! first use and keeps running until the process exits.

mod registry;
mod server;

pub use registry::{DispatchError, InvocationHandler, Registry};

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::config::{BinmockConfig, ConfigError};

static GLOBAL: OnceCell<Coordinator> = OnceCell::new();

/// Coordinator errors
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("failed to bind coordinator to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("coordinator I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A running coordinator
#[derive(Debug)]
pub struct Coordinator {
    addr: SocketAddr,
    registry: Arc<Registry>,
}

impl Coordinator {
    /// Bind `config.bind_addr` and serve from a background thread.
    ///
    /// The listener is bound before this returns, so stubs may connect as
    /// soon as they know the address.
    pub fn start(config: &BinmockConfig) -> Result<Self, CoordinatorError> {
        let listener =
            TcpListener::bind(config.bind_addr).map_err(|source| CoordinatorError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        let addr = listener.local_addr()?;
        let registry = Arc::new(Registry::new());

        server::spawn(listener, Arc::clone(&registry))?;
        info!(%addr, "coordinator listening");

        Ok(Self { addr, registry })
    }

    /// The process-wide coordinator, started with configuration from the
    /// environment on first use.
    pub fn global() -> Result<&'static Self, CoordinatorError> {
        if let Some(coordinator) = GLOBAL.get() {
            return Ok(coordinator);
        }
        let config = BinmockConfig::load()?;
        Self::global_with(&config)
    }

    /// The process-wide coordinator, started with `config` on first use.
    ///
    /// Once running, later calls return the same instance and `config` is
    /// not consulted again.
    pub fn global_with(config: &BinmockConfig) -> Result<&'static Self, CoordinatorError> {
        GLOBAL.get_or_try_init(|| {
            debug!(bind_addr = %config.bind_addr, "starting process-wide coordinator");
            Self::start(config)
        })
    }

    /// Address stubs report to
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Route reports carrying `identifier` to `handler`
    pub fn register(&self, identifier: &str, handler: Arc<dyn InvocationHandler>) {
        self.registry.register(identifier, handler);
        debug!(mock = %identifier, "registered with coordinator");
    }
}
