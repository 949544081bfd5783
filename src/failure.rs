//! Failure reporting
//!
//! Mocks never decide how a test fails. Overruns and argument mismatches are
//! handed to a [`FailureReporter`] supplied by the test, which may record,
//! log, or forward them to whatever assertion machinery the test uses.

use std::sync::{Arc, Mutex};

use crate::sync::mutex_lock_or_recover;

/// Receives soft failures from a mock.
///
/// `caller_skip` is a stack-depth hint for reporters that attribute failures
/// to a source line. Reports raised on the coordinator thread pass `None`.
pub trait FailureReporter: Send + Sync {
    fn fail(&self, message: &str, caller_skip: Option<usize>);
}

impl<F> FailureReporter for F
where
    F: Fn(&str, Option<usize>) + Send + Sync,
{
    fn fail(&self, message: &str, caller_skip: Option<usize>) {
        self(message, caller_skip)
    }
}

/// Reporter that keeps every message for later assertions.
///
/// Clones share the same message log.
#[derive(Debug, Clone, Default)]
pub struct CollectingReporter {
    messages: Arc<Mutex<Vec<String>>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any failure has been reported
    pub fn was_called(&self) -> bool {
        !mutex_lock_or_recover(&self.messages).is_empty()
    }

    /// Number of failures reported
    pub fn count(&self) -> usize {
        mutex_lock_or_recover(&self.messages).len()
    }

    /// The most recent failure message
    pub fn last_message(&self) -> Option<String> {
        mutex_lock_or_recover(&self.messages).last().cloned()
    }

    /// All failure messages in report order
    pub fn messages(&self) -> Vec<String> {
        mutex_lock_or_recover(&self.messages).clone()
    }
}

impl FailureReporter for CollectingReporter {
    fn fail(&self, message: &str, _caller_skip: Option<usize>) {
        mutex_lock_or_recover(&self.messages).push(message.to_string());
    }
}
