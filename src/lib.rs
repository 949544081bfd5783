//! Binmock - scriptable fake executables for tests
//!
//! A [`Mock`] is a real executable on disk that a test can hand to the code
//! under test in place of some external tool. Every time that executable
//! runs it reports its arguments, environment and stdin to an in-process
//! coordinator, which answers with the next scripted response:
//!
//! ```no_run
//! use binmock::{CollectingReporter, Mock};
//!
//! let failures = CollectingReporter::new();
//! let git = Mock::new(failures.clone()).expect("stub build failed");
//! git.when_called_with(["status", "--short"])
//!     .will_print_to_stdout(" M src/lib.rs\n")
//!     .will_exit_with(0);
//!
//! let output = std::process::Command::new(git.path())
//!     .args(["status", "--short"])
//!     .output()
//!     .unwrap();
//! assert_eq!(output.stdout, b" M src/lib.rs\n");
//! assert!(!failures.was_called());
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod failure;
pub mod mock;
pub mod synthesis;
pub mod sync;
pub mod telemetry;

pub use binmock_protocol;
pub use binmock_protocol::{InvocationRequest, InvocationResponse};
pub use config::{BinmockConfig, ConfigError};
pub use coordinator::{Coordinator, CoordinatorError, DispatchError, InvocationHandler, Registry};
pub use error::BinmockError;
pub use failure::{CollectingReporter, FailureReporter};
pub use mock::{
    ExpectationStub, Mock, MockBuilder, MockState, Outcome, RecordedInvocation, Resolution,
    StubHandle,
};
pub use synthesis::{build_stub_binary, BuildError, Rustc, StubTemplate, Toolchain};
