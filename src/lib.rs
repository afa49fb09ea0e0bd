//! restmcp - REST to MCP protocol gateway
//!
//! Exposes a catalog of declarative REST endpoints as Model Context Protocol
//! tools. Each JSON-RPC request is dispatched through a gateway that records
//! its lifecycle in an immutable execution context and always answers with
//! exactly one envelope.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod tools;
pub mod utils;

pub use config::Settings;
pub use core::{DispatchOutcome, ExecutionContext, Gateway, JsonRpcRequest, JsonRpcResponse};
pub use error::{GatewayFailure, GatewayResult, TransportFailure};
pub use tools::{EndpointRegistry, HttpTransport, RestEndpoint, ToolExecutor, Transport};

use std::sync::Arc;

/// Build a gateway with the default catalog and the real HTTP transport.
pub fn build_gateway(settings: &Settings) -> GatewayResult<Gateway> {
    settings.validate()?;

    let transport = HttpTransport::new(settings.upstream.timeout()?);
    Gateway::from_settings(settings, Arc::new(transport))
}
