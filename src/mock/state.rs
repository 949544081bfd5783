//! Mock resolution state
//!
//! The strict sequence matcher behind every mock. Expectations are consumed
//! in declaration order, one per call, whether or not the call's arguments
//! match; nothing backtracks and nothing searches for a better fit.

use binmock_protocol::{InvocationRequest, InvocationResponse};

use super::expectation::ExpectationStub;
use super::invocation::RecordedInvocation;

/// How a request was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Arguments satisfied the next expectation
    Matched,
    /// Arguments differed from the next expectation, which is consumed anyway
    Mismatched {
        expected: Vec<String>,
        received: Vec<String>,
    },
    /// Every expectation was already consumed
    Overrun { received: Vec<String> },
}

/// Result of resolving one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Index of the consumed expectation, `None` for an overrun
    pub position: Option<usize>,
    pub outcome: Outcome,
    /// What the stub should reproduce
    pub response: InvocationResponse,
}

impl Resolution {
    /// Message for the failure reporter, `None` for a match
    pub fn failure_message(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Matched => None,
            Outcome::Mismatched { expected, received } => Some(format!(
                "Unexpected arguments for call #{}: Expected {:?} to equal {:?}",
                self.position.map_or(0, |p| p + 1),
                received,
                expected
            )),
            Outcome::Overrun { received } => Some(format!(
                "Too many calls to the mock! Last call with {:?}",
                received
            )),
        }
    }
}

/// Expectations, cursor and invocation log of one mock
#[derive(Debug, Default)]
pub struct MockState {
    expectations: Vec<ExpectationStub>,
    cursor: usize,
    invocations: Vec<RecordedInvocation>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an expectation and return its index
    pub fn declare(&mut self, stub: ExpectationStub) -> usize {
        self.expectations.push(stub);
        self.expectations.len() - 1
    }

    /// Mutable access to a declared expectation that has not been consumed
    pub fn pending_mut(&mut self, index: usize) -> Option<&mut ExpectationStub> {
        if index < self.cursor {
            return None;
        }
        self.expectations.get_mut(index)
    }

    /// Resolve one request, advancing the cursor and recording the call.
    pub fn resolve(&mut self, request: &InvocationRequest) -> Resolution {
        let resolution = match self.expectations.get(self.cursor) {
            None => Resolution {
                position: None,
                outcome: Outcome::Overrun {
                    received: request.args.clone(),
                },
                response: InvocationResponse::overrun(),
            },
            Some(stub) => {
                let position = self.cursor;
                let outcome = match &stub.expected_args {
                    Some(expected) if !stub.matches(&request.args) => Outcome::Mismatched {
                        expected: expected.clone(),
                        received: request.args.clone(),
                    },
                    _ => Outcome::Matched,
                };
                let response = stub.response();
                self.cursor += 1;
                Resolution {
                    position: Some(position),
                    outcome,
                    response,
                }
            }
        };

        self.invocations
            .push(RecordedInvocation::new(request, resolution.position));
        resolution
    }

    /// Number of expectations consumed so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Expectations declared but not yet consumed
    pub fn pending(&self) -> usize {
        self.expectations.len() - self.cursor
    }

    pub fn expectations(&self) -> &[ExpectationStub] {
        &self.expectations
    }

    pub fn invocations(&self) -> &[RecordedInvocation] {
        &self.invocations
    }
}
