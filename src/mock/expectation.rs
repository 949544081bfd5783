//! Expectation stubs
//!
//! One scripted call: the arguments it should arrive with (or none, meaning
//! any arguments are accepted) and the response to reproduce.

use binmock_protocol::InvocationResponse;

/// A declared (expected args, response) pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectationStub {
    /// `None` matches any argument vector
    pub expected_args: Option<Vec<String>>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExpectationStub {
    /// Stub accepting any arguments
    pub fn any() -> Self {
        Self::default()
    }

    /// Stub expecting exactly `args`
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            expected_args: Some(args.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Whether `args` satisfies this stub: same length, values and order
    pub fn matches(&self, args: &[String]) -> bool {
        match &self.expected_args {
            Some(expected) => expected.as_slice() == args,
            None => true,
        }
    }

    /// The response this stub scripts
    pub fn response(&self) -> InvocationResponse {
        InvocationResponse::new(self.exit_code, self.stdout.clone(), self.stderr.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_any_matches_everything() {
        let stub = ExpectationStub::any();
        assert!(stub.matches(&[]));
        assert!(stub.matches(&strings(&["foo", "bar"])));
    }

    #[test]
    fn test_exact_match_required() {
        let stub = ExpectationStub::with_args(["foo", "bar"]);
        assert!(stub.matches(&strings(&["foo", "bar"])));
        assert!(!stub.matches(&strings(&["bar", "foo"])));
        assert!(!stub.matches(&strings(&["foo"])));
        assert!(!stub.matches(&strings(&["foo", "bar", "baz"])));
    }

    #[test]
    fn test_empty_expected_args_is_not_a_wildcard() {
        let stub = ExpectationStub::with_args(Vec::<String>::new());
        assert!(stub.matches(&[]));
        assert!(!stub.matches(&strings(&["foo"])));
    }

    #[test]
    fn test_defaults() {
        let response = ExpectationStub::any().response();
        assert_eq!(response, InvocationResponse::new(0, "", ""));
    }
}
