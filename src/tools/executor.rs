//! Tool Executor
//!
//! Information Hiding:
//! - Outbound request resolution hidden
//! - Timeout classification hidden
//! - Response-to-content folding hidden
//!
//! There is no retry loop: every failure is reported once.

use super::{EndpointRegistry, ToolCallResult, Transport, TransportResponse};
use crate::error::{GatewayFailure, GatewayResult, TransportFailure};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::time::{timeout, Duration};

/// Status codes at or above this mark the tool result as errored
pub const HTTP_ERROR_THRESHOLD: u16 = 400;

/// Executes validated tool calls against their remote endpoints
#[derive(Clone)]
pub struct ToolExecutor {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute a tool whose arguments have already been validated.
    ///
    /// The caller is trusted to have checked the tool name; an unknown name
    /// here is a `ContractViolation`. Timeouts are returned as
    /// `TransportFailure::Timeout`. Connectivity failures and upstream error
    /// statuses are folded into a result marked errored.
    pub async fn execute(
        &self,
        registry: &EndpointRegistry,
        name: &str,
        args: &Map<String, Value>,
    ) -> GatewayResult<ToolCallResult> {
        let endpoint = registry.get(name).ok_or_else(|| {
            GatewayFailure::contract(format!(
                "executor invoked with unregistered tool '{}'",
                name
            ))
        })?;

        let request = endpoint.build_request(args)?;
        let url = request.url(&self.base_url)?;

        let call = self.transport.invoke(
            request.verb,
            &url,
            &request.query,
            request.body.as_ref(),
        );

        let outcome = match timeout(self.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(TransportFailure::Timeout {
                timeout: self.timeout,
            }),
        };

        match outcome {
            Ok(response) => Ok(fold_response(name, response)),
            Err(TransportFailure::Connectivity(reason)) => {
                tracing::warn!("Tool '{}' could not reach {}: {}", name, url, reason);
                Ok(ToolCallResult::failure(format!("HTTP error: {}", reason)))
            }
            Err(timeout_failure) => {
                tracing::warn!("Tool '{}' timed out calling {}", name, url);
                Err(timeout_failure.into())
            }
        }
    }
}

/// Pretty-print JSON bodies, pass anything else through as text
fn fold_response(name: &str, response: TransportResponse) -> ToolCallResult {
    let text = match response.json() {
        Some(json) => serde_json::to_string_pretty(&json).unwrap_or(response.body.clone()),
        None => response.body.clone(),
    };

    if response.status >= HTTP_ERROR_THRESHOLD {
        let failure = GatewayFailure::upstream(
            format!("tool '{}' received an error response", name),
            Some(response.status),
        );
        tracing::warn!(category = failure.category(), "{}", failure);
        ToolCallResult::failure(text)
    } else {
        ToolCallResult::success(text)
    }
}
