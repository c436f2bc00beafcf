//! Tool handler contract.
//!
//! A tool is a thin adapter: it validates its arguments, asks the provider
//! for one dataset and returns the payload untouched. Logging, retries,
//! timing and rendering all happen in the pipeline around it.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ToolError;
use crate::core::pipeline::{Arguments, Payload};

/// A single market-data capability exposed to MCP clients.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Tool name as registered in MCP.
    fn name(&self) -> &'static str;

    /// Tool description shown to clients.
    fn description(&self) -> &'static str;

    /// JSON schema of the accepted arguments.
    fn input_schema(&self) -> Arc<JsonObject>;

    /// Tool metadata for `tools/list`.
    fn to_tool(&self) -> Tool {
        Tool {
            name: self.name().into(),
            description: Some(self.description().into()),
            input_schema: self.input_schema(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Run the tool. Invalid arguments are reported as
    /// [`ToolError::InvalidArguments`].
    async fn invoke(&self, arguments: &Arguments) -> Result<Payload, ToolError>;
}

/// Deserialize tool arguments into their typed parameter struct.
pub fn parse_arguments<T: DeserializeOwned>(arguments: &Arguments) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Params {
        symbol: String,
        #[serde(default)]
        page: Option<u32>,
    }

    fn arguments(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_arguments() {
        let params: Params = parse_arguments(&arguments(json!({ "symbol": "VNM", "page": 2 }))).unwrap();
        assert_eq!(params.symbol, "VNM");
        assert_eq!(params.page, Some(2));
    }

    #[test]
    fn test_parse_arguments_missing_field() {
        let err = parse_arguments::<Params>(&arguments(json!({ "page": 2 }))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(ref msg) if msg.contains("symbol")));
    }

    #[test]
    fn test_parse_arguments_wrong_type() {
        let err = parse_arguments::<Params>(&arguments(json!({ "symbol": 42 }))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
