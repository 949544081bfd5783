//! Recorded invocations

use std::collections::BTreeMap;

use binmock_protocol::{parse_env, InvocationRequest};
use chrono::{DateTime, Utc};

/// What one run of a stub was called with.
///
/// Recorded for every request routed to a mock, whether it matched,
/// mismatched or overran the scripted expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInvocation {
    args: Vec<String>,
    env: BTreeMap<String, String>,
    stdin: Vec<String>,
    position: Option<usize>,
    received_at: DateTime<Utc>,
}

impl RecordedInvocation {
    /// Capture a request resolved against expectation `position`
    /// (`None` for an overrun).
    pub fn new(request: &InvocationRequest, position: Option<usize>) -> Self {
        Self {
            args: request.args.clone(),
            env: parse_env(&request.env),
            stdin: request.stdin.clone(),
            position,
            received_at: Utc::now(),
        }
    }

    /// Arguments, excluding the program name
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Environment at the time of the call
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// A single environment variable
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Standard input, one entry per line
    pub fn stdin(&self) -> &[String] {
        &self.stdin
    }

    /// Index of the expectation this call consumed, `None` for an overrun
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}
