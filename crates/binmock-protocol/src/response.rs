//! Invocation response types.

use serde::{Deserialize, Serialize};

use crate::OVERRUN_EXIT_CODE;

/// What a stub must reproduce: its output streams and exit code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    /// Written verbatim to the stub's standard output.
    #[serde(default)]
    pub stdout: String,
    /// Written verbatim to the stub's standard error.
    #[serde(default)]
    pub stderr: String,
    /// Exit code the stub terminates with.
    pub exit_code: i32,
}

impl InvocationResponse {
    /// Create a response.
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// The canned answer for a call beyond the scripted expectations.
    pub fn overrun() -> Self {
        Self::new(OVERRUN_EXIT_CODE, "", "")
    }
}
