//! Binmock Protocol Types
//!
//! Defines the JSON messages exchanged between a stub executable and the
//! coordinator that scripts its behaviour, plus a blocking client for Rust
//! callers that want to speak the protocol directly.

pub mod client;
pub mod env;
pub mod error;
pub mod request;
pub mod response;

pub use env::parse_env;
pub use error::TransportError;
pub use request::InvocationRequest;
pub use response::InvocationResponse;

/// Path the coordinator accepts invocation reports on.
pub const INVOKE_PATH: &str = "/invoke";

/// Exit code returned to a stub invoked more often than it was scripted for.
pub const OVERRUN_EXIT_CODE: i32 = 1;
