//! Mock executables
//!
//! A [`Mock`] owns one stub executable on disk plus the ordered list of
//! calls it expects. Declaring expectations and reading back invocations
//! happen on the test thread; resolution happens on the coordinator as stub
//! processes call in.
//!
//! # Resolution
//!
//! - **Match**: the next expectation accepts the arguments, its scripted
//!   response is returned
//! - **Mismatch**: the next expectation wanted other arguments; the failure
//!   is reported but its scripted response is still returned
//! - **Overrun**: no expectation is left; the failure is reported and the
//!   stub exits 1 with no output
//!
//! Every call is recorded, whatever the outcome.

mod expectation;
mod invocation;
mod state;

pub use expectation::ExpectationStub;
pub use invocation::RecordedInvocation;
pub use state::{MockState, Outcome, Resolution};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use binmock_protocol::{InvocationRequest, InvocationResponse};
use tracing::{debug, info, warn};

use crate::config::BinmockConfig;
use crate::coordinator::{Coordinator, InvocationHandler};
use crate::error::BinmockError;
use crate::failure::FailureReporter;
use crate::synthesis::{build_stub_binary, Rustc, DEFAULT_BINARY_NAME};
use crate::sync::mutex_lock_or_recover;

/// Generate a fresh mock identifier
pub fn new_identifier() -> String {
    ulid::Ulid::new().to_string().to_lowercase()
}

/// The shared part of a mock: what the coordinator resolves against.
pub struct MockCore {
    identifier: String,
    state: Mutex<MockState>,
    reporter: Box<dyn FailureReporter>,
}

impl MockCore {
    pub fn new(identifier: impl Into<String>, reporter: impl FailureReporter + 'static) -> Self {
        Self {
            identifier: identifier.into(),
            state: Mutex::new(MockState::new()),
            reporter: Box::new(reporter),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        mutex_lock_or_recover(&self.state)
    }
}

impl InvocationHandler for MockCore {
    fn handle(&self, request: &InvocationRequest) -> InvocationResponse {
        // Cursor read, comparison, advance and logging are one critical
        // section; the reporter runs after the lock is released.
        let resolution = self.state().resolve(request);

        debug!(
            mock = %self.identifier,
            position = ?resolution.position,
            args = ?request.args,
            "resolved invocation"
        );
        if let Some(message) = resolution.failure_message() {
            warn!(mock = %self.identifier, "{}", message);
            self.reporter.fail(&message, None);
        }
        resolution.response
    }
}

impl std::fmt::Debug for MockCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCore")
            .field("identifier", &self.identifier)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

/// A fake executable scripted by the test that created it
#[derive(Debug, Clone)]
pub struct Mock {
    core: Arc<MockCore>,
    path: PathBuf,
}

impl Mock {
    /// Build and register a stub using configuration from the environment.
    pub fn new(reporter: impl FailureReporter + 'static) -> Result<Self, BinmockError> {
        Self::builder().build(reporter)
    }

    pub fn builder() -> MockBuilder {
        MockBuilder::default()
    }

    /// Assemble a mock from a core that is already registered with a
    /// coordinator and a stub executable bound to it.
    pub fn from_parts(core: Arc<MockCore>, path: PathBuf) -> Self {
        Self { core, path }
    }

    /// Path of the stub executable
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier baked into the stub executable
    pub fn identifier(&self) -> &str {
        self.core.identifier()
    }

    /// Expect a call with any arguments
    pub fn when_called(&self) -> StubHandle {
        self.declare(ExpectationStub::any())
    }

    /// Expect a call with exactly `args`
    pub fn when_called_with<I, S>(&self, args: I) -> StubHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declare(ExpectationStub::with_args(args))
    }

    fn declare(&self, stub: ExpectationStub) -> StubHandle {
        let index = self.core.state().declare(stub);
        StubHandle {
            core: Arc::clone(&self.core),
            index,
        }
    }

    /// Every call received so far, in arrival order
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.core.state().invocations().to_vec()
    }

    /// Number of expectations consumed so far
    pub fn cursor(&self) -> usize {
        self.core.state().cursor()
    }

    /// Expectations declared but not yet consumed
    pub fn pending_expectations(&self) -> usize {
        self.core.state().pending()
    }
}

/// Options for building a [`Mock`]
#[derive(Debug, Default)]
pub struct MockBuilder {
    name: Option<String>,
    config: Option<BinmockConfig>,
}

impl MockBuilder {
    /// File name of the stub executable, for code that looks tools up by name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Use `config` instead of loading it from the environment
    pub fn config(mut self, config: BinmockConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Start the coordinator if needed, compile the stub and register it.
    pub fn build(self, reporter: impl FailureReporter + 'static) -> Result<Mock, BinmockError> {
        let config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => BinmockConfig::load()?,
        };
        let coordinator = Coordinator::global_with(&config)?;

        let identifier = new_identifier();
        let name = self.name.as_deref().unwrap_or(DEFAULT_BINARY_NAME);
        let path = build_stub_binary(
            &Rustc::from_config(&config),
            &config.scratch_dir,
            name,
            &identifier,
            coordinator.addr(),
        )?;

        let core = Arc::new(MockCore::new(identifier, reporter));
        coordinator.register(core.identifier(), Arc::clone(&core) as Arc<dyn InvocationHandler>);
        info!(mock = %core.identifier(), path = %path.display(), "mock ready");

        Ok(Mock::from_parts(core, path))
    }
}

/// Chained configuration of one declared expectation.
///
/// Setters only apply while the expectation has not been consumed by a call;
/// afterwards they are ignored with a warning.
#[derive(Debug, Clone)]
pub struct StubHandle {
    core: Arc<MockCore>,
    index: usize,
}

impl StubHandle {
    /// Exit code the stub terminates with (default 0)
    pub fn will_exit_with(self, exit_code: i32) -> Self {
        self.update(|stub| stub.exit_code = exit_code)
    }

    /// Text the stub writes to stdout (default empty)
    pub fn will_print_to_stdout(self, out: impl Into<String>) -> Self {
        let out = out.into();
        self.update(move |stub| stub.stdout = out)
    }

    /// Text the stub writes to stderr (default empty)
    pub fn will_print_to_stderr(self, err: impl Into<String>) -> Self {
        let err = err.into();
        self.update(move |stub| stub.stderr = err)
    }

    /// Position of this expectation in the mock's sequence
    pub fn index(&self) -> usize {
        self.index
    }

    fn update(self, apply: impl FnOnce(&mut ExpectationStub)) -> Self {
        match self.core.state().pending_mut(self.index) {
            Some(stub) => apply(stub),
            None => warn!(
                mock = %self.core.identifier(),
                index = self.index,
                "expectation already consumed; change ignored"
            ),
        }
        self
    }
}
