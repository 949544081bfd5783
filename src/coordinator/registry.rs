//! Mock registry
//!
//! Maps stub identifiers to the handler that resolves their calls. The lock
//! here only guards lookup; each handler serializes its own state, so calls
//! to different mocks never wait on each other.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use binmock_protocol::{InvocationRequest, InvocationResponse};
use tracing::warn;

use crate::sync::{rwlock_read_or_recover, rwlock_write_or_recover};

/// Resolves invocation reports for one stub identifier
pub trait InvocationHandler: Send + Sync {
    fn handle(&self, request: &InvocationRequest) -> InvocationResponse;
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A stub reported an identifier nobody registered
    #[error("no mock registered for identifier '{0}'")]
    UnknownMock(String),
}

/// Identifier to handler mapping; entries are never removed
#[derive(Default)]
pub struct Registry {
    handlers: RwLock<HashMap<String, Arc<dyn InvocationHandler>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `identifier`
    pub fn register(&self, identifier: impl Into<String>, handler: Arc<dyn InvocationHandler>) {
        let identifier = identifier.into();
        let mut handlers = rwlock_write_or_recover(&self.handlers);
        if handlers.contains_key(&identifier) {
            warn!(mock = %identifier, "identifier registered twice; replacing handler");
        }
        handlers.insert(identifier, handler);
    }

    pub fn lookup(&self, identifier: &str) -> Option<Arc<dyn InvocationHandler>> {
        rwlock_read_or_recover(&self.handlers).get(identifier).cloned()
    }

    /// Route a request to its handler
    pub fn dispatch(
        &self,
        request: &InvocationRequest,
    ) -> Result<InvocationResponse, DispatchError> {
        let handler = self
            .lookup(&request.id)
            .ok_or_else(|| DispatchError::UnknownMock(request.id.clone()))?;
        Ok(handler.handle(request))
    }

    pub fn len(&self) -> usize {
        rwlock_read_or_recover(&self.handlers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = rwlock_read_or_recover(&self.handlers);
        f.debug_struct("Registry")
            .field("identifiers", &handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    struct Fixed(InvocationResponse);

    impl InvocationHandler for Fixed {
        fn handle(&self, _request: &InvocationRequest) -> InvocationResponse {
            self.0.clone()
        }
    }

    #[test]
    fn test_dispatch_routes_by_identifier() {
        let registry = Registry::new();
        registry.register("a", Arc::new(Fixed(InvocationResponse::new(0, "from a", ""))));
        registry.register("b", Arc::new(Fixed(InvocationResponse::new(0, "from b", ""))));

        let a = registry.dispatch(&InvocationRequest::new("a")).unwrap();
        let b = registry.dispatch(&InvocationRequest::new("b")).unwrap();

        assert_eq!(a.stdout, "from a");
        assert_eq!(b.stdout, "from b");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unknown_identifier() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        let result = registry.dispatch(&InvocationRequest::new("ghost"));
        match result {
            Err(DispatchError::UnknownMock(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected UnknownMock, got {:?}", other),
        }
    }

    /// Handler that blocks until released, to prove other mocks stay live.
    struct Gate {
        entered: mpsc::SyncSender<()>,
        release: std::sync::Mutex<mpsc::Receiver<()>>,
    }

    impl InvocationHandler for Gate {
        fn handle(&self, _request: &InvocationRequest) -> InvocationResponse {
            let _ = self.entered.send(());
            let _ = self.release.lock().unwrap().recv();
            InvocationResponse::new(0, "gate", "")
        }
    }

    #[test]
    fn test_slow_mock_does_not_block_other_mocks() {
        let (entered_tx, entered_rx) = mpsc::sync_channel(1);
        let (release_tx, release_rx) = mpsc::channel();
        let registry = Arc::new(Registry::new());
        registry.register(
            "slow",
            Arc::new(Gate {
                entered: entered_tx,
                release: std::sync::Mutex::new(release_rx),
            }),
        );
        registry.register("fast", Arc::new(Fixed(InvocationResponse::new(0, "fast", ""))));

        let slow_registry = Arc::clone(&registry);
        let slow =
            std::thread::spawn(move || slow_registry.dispatch(&InvocationRequest::new("slow")));
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let fast = registry.dispatch(&InvocationRequest::new("fast")).unwrap();
        assert_eq!(fast.stdout, "fast");

        release_tx.send(()).unwrap();
        assert_eq!(slow.join().unwrap().unwrap().stdout, "gate");
    }
}
