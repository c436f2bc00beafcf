//! STDIO transport implementation.
//!
//! Serves the rmcp tool router over stdin/stdout. Each `tools/call` enters
//! the pipeline with the request's cancellation token, so a client cancelling
//! a slow quote lookup also stops its retry backoff. Logs go to stderr so the
//! protocol stream stays clean.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!(
            "Ready - serving {} market-data tools via stdin/stdout",
            server.registry().len()
        );

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!("STDIO transport finished");
        Ok(())
    }
}
