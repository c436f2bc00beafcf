//! Tool Router - builds the rmcp ToolRouter from the registry.
//!
//! Every route funnels into the same pipeline, so the rmcp transports get
//! the full middleware stack without knowing about it. The client's
//! cancellation token is handed to the pipeline with each call.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
    model::{CallToolResult, Content},
};

use super::registry::ToolRegistry;
use crate::core::pipeline::{Pipeline, Request, Response};

/// Build the tool router with one route per registered tool.
pub fn build_tool_router<S>(registry: &ToolRegistry, pipeline: Arc<Pipeline>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    registry
        .tools()
        .into_iter()
        .fold(ToolRouter::new(), |router, tool| {
            let pipeline = pipeline.clone();
            let name = tool.name.to_string();
            router.with_route(ToolRoute::new_dyn(tool, move |ctx: ToolCallContext<'_, S>| {
                let request = Request::new(name.clone(), ctx.arguments.clone().unwrap_or_default());
                let cancel = ctx.request_context.ct.clone();
                let pipeline = pipeline.clone();
                async move {
                    let response = pipeline.call_with(request, cancel).await;
                    Ok::<_, McpError>(to_call_tool_result(&response))
                }
                .boxed()
            }))
        })
}

/// Render a pipeline response as MCP tool output.
///
/// Failures become `isError` results, never protocol errors.
pub fn to_call_tool_result(response: &Response) -> CallToolResult {
    let text = vec![Content::text(response.to_text())];
    if response.is_success() {
        CallToolResult::success(text)
    } else {
        CallToolResult::error(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PipelineConfig;
    use crate::core::pipeline::{Failure, Payload};
    use crate::domains::provider::mock::MockProvider;
    use rmcp::model::RawContent;
    use serde_json::json;

    struct TestServer {}

    fn registry() -> ToolRegistry {
        ToolRegistry::with_market_tools(Arc::new(MockProvider::returning(json!([]))))
    }

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(text) => text.text.clone(),
            _ => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_registry_matches_router() {
        let tools = registry();
        let pipeline = Arc::new(Pipeline::from_config(&PipelineConfig::default(), Arc::new(registry())));
        let router: ToolRouter<TestServer> = build_tool_router(&tools, pipeline);

        let router_tools = router.list_all();
        let mut router_names: Vec<_> = router_tools.iter().map(|t| t.name.to_string()).collect();
        router_names.sort();

        assert_eq!(router_names, tools.tool_names());
    }

    #[test]
    fn test_success_result() {
        let result = to_call_tool_result(&Response::success(Payload::Text("No data available.".into())));
        assert_eq!(result.is_error, Some(false));
        assert_eq!(text_of(&result), "No data available.");
    }

    #[test]
    fn test_failure_result() {
        let result = to_call_tool_result(&Response::failure(Failure::connectivity("provider down")));
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Connectivity: provider down");
    }
}
