//! Invocation request types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::env::parse_env;

/// A single execution of a stub, as reported to the coordinator.
///
/// Sequences missing from the payload decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Identifier baked into the stub at build time.
    pub id: String,
    /// Argument vector, excluding the program name.
    #[serde(default)]
    pub args: Vec<String>,
    /// Process environment in `KEY=VALUE` form.
    #[serde(default)]
    pub env: Vec<String>,
    /// Standard input, one entry per line.
    #[serde(default)]
    pub stdin: Vec<String>,
}

impl InvocationRequest {
    /// Create an empty request for the given stub identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the argument vector.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the environment entries (`KEY=VALUE`).
    pub fn with_env<I, S>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env = env.into_iter().map(Into::into).collect();
        self
    }

    /// Set the stdin lines.
    pub fn with_stdin<I, S>(mut self, stdin: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stdin = stdin.into_iter().map(Into::into).collect();
        self
    }

    /// The environment as a name to value mapping.
    pub fn env_map(&self) -> BTreeMap<String, String> {
        parse_env(&self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sequences_default_to_empty() {
        let request: InvocationRequest = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(request.id, "abc");
        assert!(request.args.is_empty());
        assert!(request.env.is_empty());
        assert!(request.stdin.is_empty());
    }

    #[test]
    fn test_wire_field_names() {
        let request = InvocationRequest::new("abc")
            .with_args(["foo", "bar"])
            .with_env(["foo=bar"])
            .with_stdin(["line"]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "abc",
                "args": ["foo", "bar"],
                "env": ["foo=bar"],
                "stdin": ["line"]
            })
        );
    }

    #[test]
    fn test_env_map() {
        let request = InvocationRequest::new("abc").with_env(["A=1", "B=2", "A=3"]);
        let env = request.env_map();
        assert_eq!(env.get("A").map(String::as_str), Some("3"));
        assert_eq!(env.get("B").map(String::as_str), Some("2"));
    }
}
