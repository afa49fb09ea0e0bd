//! Gateway Dispatcher
//!
//! Turns one inbound request into exactly one response plus the sealed
//! execution context that recorded it.
//!
//! Information Hiding:
//! - Method routing hidden behind `dispatch`
//! - `tools/call` orchestration order (bind, lookup, validate, guard, execute, record) hidden
//! - All failures normalized to envelopes at one boundary

use super::context::ExecutionContext;
use super::protocol::{
    parse_request, ErrorCode, ErrorObject, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ListToolsResult, ServerInfo, ToolCallParams, METHOD_CALL_TOOL, METHOD_INITIALIZE,
    METHOD_LIST_TOOLS, METHOD_TOOLS_CALL, METHOD_TOOLS_LIST,
};
use crate::config::{ServerConfig, Settings};
use crate::error::{GatewayFailure, GatewayResult, TransportFailure};
use crate::tools::endpoint::IDENTIFIER_PARAM;
use crate::tools::{catalog, EndpointRegistry, ToolExecutor, Transport};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Response and the sealed context that produced it.
///
/// `context` is `None` only when the request identity was rejected before a
/// context could exist.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub response: JsonRpcResponse,
    pub context: Option<ExecutionContext>,
}

/// Why a routed request did not produce a result
#[derive(Debug)]
enum Rejection {
    /// Handled locally by orchestration; already an envelope error
    Invalid(ErrorObject),
    /// Typed failure, normalized at the boundary
    Failure(GatewayFailure),
}

impl From<GatewayFailure> for Rejection {
    fn from(failure: GatewayFailure) -> Self {
        Self::Failure(failure)
    }
}

fn invalid_params(message: impl Into<String>) -> Rejection {
    Rejection::Invalid(ErrorObject::new(ErrorCode::InvalidParams, message))
}

/// Protocol gateway over an immutable endpoint registry.
///
/// Safe to share across concurrent requests; nothing here mutates after construction.
pub struct Gateway {
    server: ServerConfig,
    registry: EndpointRegistry,
    executor: ToolExecutor,
}

impl Gateway {
    pub fn new(server: ServerConfig, registry: EndpointRegistry, executor: ToolExecutor) -> Self {
        tracing::info!(
            "Gateway ready: {} tools, default upstream {}",
            registry.len(),
            executor.base_url()
        );
        Self {
            server,
            registry,
            executor,
        }
    }

    /// Wire the default catalog against `transport` using validated settings.
    pub fn from_settings(settings: &Settings, transport: Arc<dyn Transport>) -> GatewayResult<Self> {
        settings.validate()?;

        let registry = EndpointRegistry::new(catalog::default_endpoints(&settings.upstream))?;
        let executor = ToolExecutor::new(
            transport,
            settings.upstream.base_url.clone(),
            settings.upstream.timeout()?,
        );

        Ok(Self::new(settings.server.clone(), registry, executor))
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Parse a raw message and dispatch it.
    pub async fn handle_message(&self, raw: &str) -> JsonRpcResponse {
        match parse_request(raw) {
            Ok(request) => self.dispatch(request).await.response,
            Err(response) => {
                tracing::warn!("Rejected malformed message: {:?}", response.error_object());
                response
            }
        }
    }

    /// Single entry point. Always yields one envelope; any context returned is sealed.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> DispatchOutcome {
        let ctx = match ExecutionContext::from_request(&request) {
            Ok(ctx) => ctx,
            Err(failure) => {
                tracing::warn!(category = failure.category(), "{}", failure);
                let id = (!request.id.is_blank()).then(|| request.id.clone());
                return DispatchOutcome {
                    response: JsonRpcResponse::error(
                        id,
                        ErrorObject::new(ErrorCode::InvalidRequest, failure.to_string()),
                    ),
                    context: None,
                };
            }
        };

        tracing::info!(request_id = %ctx.request_id(), method = ctx.method(), "Dispatching request");

        let mut ctx = ctx;
        let routed = AssertUnwindSafe(self.route(&mut ctx, request.params))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(Rejection::Failure(GatewayFailure::contract(format!(
                    "internal defect while handling '{}': {}",
                    request.method,
                    panic_message(panic.as_ref())
                ))))
            });

        let context = ctx.seal();
        let response = match routed {
            Ok(result) => JsonRpcResponse::success(context.request_id().clone(), result),
            Err(rejection) => JsonRpcResponse::error(
                Some(context.request_id().clone()),
                self.error_object(rejection, &context),
            ),
        };

        tracing::debug!("Dispatch finished: {}", context);

        DispatchOutcome {
            response,
            context: Some(context),
        }
    }

    async fn route(
        &self,
        ctx: &mut ExecutionContext,
        params: Option<Map<String, Value>>,
    ) -> Result<Value, Rejection> {
        let method = ctx.method().to_string();
        match method.as_str() {
            METHOD_INITIALIZE => to_result(&InitializeResult {
                protocol_version: self.server.protocol_version.clone(),
                server_info: ServerInfo {
                    name: self.server.name.clone(),
                    version: self.server.version.clone(),
                },
                capabilities: json!({"tools": {}}),
            }),
            METHOD_TOOLS_LIST | METHOD_LIST_TOOLS => to_result(&ListToolsResult {
                tools: self.registry.list_tools(),
            }),
            METHOD_TOOLS_CALL | METHOD_CALL_TOOL => self.call_tool(ctx, params).await,
            other => Err(Rejection::Invalid(ErrorObject::new(
                ErrorCode::MethodNotFound,
                format!("Unknown method: {}", other),
            ))),
        }
    }

    /// `tools/call` orchestration. Each step short-circuits; `ctx` keeps
    /// whatever was recorded before the failing step.
    async fn call_tool(
        &self,
        ctx: &mut ExecutionContext,
        params: Option<Map<String, Value>>,
    ) -> Result<Value, Rejection> {
        let params = params.ok_or_else(|| invalid_params("Missing params for tools/call"))?;
        let call: ToolCallParams = serde_json::from_value(Value::Object(params))
            .map_err(|e| invalid_params(format!("Invalid params: {}", e)))?;

        let name = call.name.trim();
        if name.is_empty() {
            return Err(invalid_params("Invalid params: tool name is empty"));
        }

        *ctx = ctx.with_tool_call(name, &call.arguments)?;

        let endpoint = self
            .registry
            .get(name)
            .ok_or_else(|| invalid_params(format!("Unknown tool: {}", name)))?;

        if let Err(errors) = endpoint.validate_arguments(ctx.arguments()) {
            tracing::warn!("Tool '{}' validation failed: {}", name, errors);
            let message = format!("Tool '{}' validation failed: {}", name, errors);
            return Err(Rejection::Invalid(
                ErrorObject::new(ErrorCode::InvalidParams, message)
                    .with_data(json!({"tool": name, "errors": errors.errors()})),
            ));
        }

        if let Err(message) = endpoint.check_destructive_guard(ctx.arguments()) {
            tracing::warn!("{}", message);
            return Err(Rejection::Invalid(
                ErrorObject::new(ErrorCode::InvalidParams, message)
                    .with_data(json!({"tool": name, "argument": IDENTIFIER_PARAM})),
            ));
        }

        let result = self
            .executor
            .execute(&self.registry, name, ctx.arguments())
            .await?;

        *ctx = ctx.with_result(result)?;
        let recorded = ctx
            .results()
            .last()
            .ok_or_else(|| GatewayFailure::contract("result was not recorded"))?;

        to_result(recorded)
    }

    /// The boundary: every rejection becomes an envelope error here.
    fn error_object(&self, rejection: Rejection, ctx: &ExecutionContext) -> ErrorObject {
        let failure = match rejection {
            Rejection::Invalid(error) => return error,
            Rejection::Failure(failure) => failure,
        };

        if let GatewayFailure::Transport(TransportFailure::Timeout { timeout }) = &failure {
            let tool = ctx.tool_name().unwrap_or("unknown");
            let seconds = timeout.as_secs_f64();
            return ErrorObject::new(
                ErrorCode::InternalError,
                format!(
                    "Tool '{}' timed out after {}s. The external service did not respond in time.",
                    tool, seconds
                ),
            )
            .with_data(json!({
                "tool": tool,
                "timeout_seconds": seconds,
                "failure_mode": "timeout",
            }));
        }

        tracing::error!(
            category = failure.category(),
            request_id = %ctx.request_id(),
            "Request failed at gateway boundary: {}",
            failure
        );

        let mut data = json!({"failure_category": failure.category()});
        if let GatewayFailure::UpstreamFailure {
            status: Some(status),
            ..
        } = &failure
        {
            data["status"] = json!(status);
        }

        ErrorObject::new(ErrorCode::InternalError, failure.to_string()).with_data(data)
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, Rejection> {
    serde_json::to_value(value).map_err(|e| {
        Rejection::Failure(GatewayFailure::contract(format!(
            "response could not be encoded: {}",
            e
        )))
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
