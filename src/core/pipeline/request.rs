//! The request flowing through the pipeline.

use serde::Serialize;
use serde_json::{Map, Value};

/// Tool arguments, in the order the client sent them.
pub type Arguments = Map<String, Value>;

/// A single tool call attempt.
///
/// A request is immutable; a retry produces a new request through
/// [`Request::next_attempt`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    tool_name: String,
    arguments: Arguments,
    attempt: u32,
}

impl Request {
    /// Create the first attempt of a call.
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            attempt: 1,
        }
    }

    /// Build a request from a JSON value; non-object arguments are treated as empty.
    pub fn from_value(tool_name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Arguments::new(),
        };
        Self::new(tool_name, arguments)
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// 1-based attempt number.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The same call, one attempt later.
    pub fn next_attempt(&self) -> Self {
        Self {
            tool_name: self.tool_name.clone(),
            arguments: self.arguments.clone(),
            attempt: self.attempt + 1,
        }
    }

    /// Look up a string argument.
    pub fn str_argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_request_starts_at_attempt_one() {
        let request = Request::from_value("quote_history", json!({ "symbol": "VNM" }));
        assert_eq!(request.attempt(), 1);
        assert_eq!(request.str_argument("symbol"), Some("VNM"));
    }

    #[test]
    fn test_next_attempt_keeps_name_and_arguments() {
        let first = Request::from_value("quote_history", json!({ "symbol": "FPT", "interval": "1D" }));
        let second = first.next_attempt();
        assert_eq!(second.attempt(), 2);
        assert_eq!(second.tool_name(), first.tool_name());
        assert_eq!(second.arguments(), first.arguments());
        assert_eq!(first.attempt(), 1);
    }

    #[test]
    fn test_argument_order_is_preserved() {
        let request = Request::from_value("t", json!({ "zeta": 1, "alpha": 2, "mid": 3 }));
        let keys: Vec<_> = request.arguments().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_non_object_arguments_become_empty() {
        let request = Request::from_value("t", json!("oops"));
        assert!(request.arguments().is_empty());
    }
}
