//! Execution Context
//!
//! The single source of truth for one request's lifecycle. It is a persistent
//! value: every transition returns a new context and leaves the receiver
//! untouched, so contexts are never shared or contended across requests.
//!
//! Invariants:
//! 1. Only `from_request` constructs a context; it rejects blank ids and methods.
//! 2. A bound tool name is never rebound.
//! 3. Results are only appended once a tool name is bound.
//! 4. A sealed context refuses every transition.

use super::protocol::{JsonRpcRequest, RequestId};
use crate::error::{GatewayFailure, GatewayResult};
use crate::tools::ToolCallResult;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionContext {
    request_id: RequestId,
    method: String,
    tool_name: Option<String>,
    arguments: Map<String, Value>,
    results: Vec<ToolCallResult>,
    created_at: DateTime<Utc>,
    sealed: bool,
}

impl ExecutionContext {
    /// The only way to create a context.
    pub fn from_request(request: &JsonRpcRequest) -> GatewayResult<Self> {
        if request.id.is_blank() {
            return Err(GatewayFailure::contract(
                "cannot create context: request id is empty",
            ));
        }
        if request.method.trim().is_empty() {
            return Err(GatewayFailure::contract(
                "cannot create context: request method is empty",
            ));
        }

        Ok(Self {
            request_id: request.id.clone(),
            method: request.method.clone(),
            tool_name: None,
            arguments: Map::new(),
            results: Vec::new(),
            created_at: Utc::now(),
            sealed: false,
        })
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    /// Arguments snapshotted when the tool was bound
    pub fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    pub fn results(&self) -> &[ToolCallResult] {
        &self.results
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Total characters of accumulated result content
    pub fn context_size(&self) -> usize {
        self.results.iter().map(ToolCallResult::size).sum()
    }

    /// Bind the tool being invoked. One-time only.
    pub fn with_tool_call(&self, name: &str, arguments: &Map<String, Value>) -> GatewayResult<Self> {
        self.check_not_sealed("with_tool_call")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(GatewayFailure::contract(
                "cannot bind tool call: name is empty",
            ));
        }
        if let Some(bound) = &self.tool_name {
            return Err(GatewayFailure::contract(format!(
                "cannot rebind tool call: already bound to '{}'",
                bound
            )));
        }

        Ok(Self {
            tool_name: Some(name.to_string()),
            arguments: arguments.clone(),
            ..self.clone()
        })
    }

    /// Append a result. Requires a bound tool.
    pub fn with_result(&self, result: ToolCallResult) -> GatewayResult<Self> {
        self.check_not_sealed("with_result")?;

        if self.tool_name.is_none() {
            return Err(GatewayFailure::contract(
                "cannot add result: no tool call is bound",
            ));
        }

        let mut next = self.clone();
        next.results.push(result);
        Ok(next)
    }

    /// Terminal transition.
    pub fn seal(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// Irreversibly drop every accumulated result.
    pub fn discard_results(&self) -> GatewayResult<Self> {
        self.with_reduced_results(0)
    }

    /// Keep only the `max_results` most recent results, in order.
    pub fn with_reduced_results(&self, max_results: usize) -> GatewayResult<Self> {
        self.check_not_sealed("with_reduced_results")?;

        let skip = self.results.len().saturating_sub(max_results);
        Ok(Self {
            results: self.results[skip..].to_vec(),
            ..self.clone_without_results()
        })
    }

    fn clone_without_results(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            method: self.method.clone(),
            tool_name: self.tool_name.clone(),
            arguments: self.arguments.clone(),
            results: Vec::new(),
            created_at: self.created_at,
            sealed: self.sealed,
        }
    }

    fn check_not_sealed(&self, operation: &str) -> GatewayResult<()> {
        if self.sealed {
            Err(GatewayFailure::contract(format!(
                "cannot perform '{}': context is sealed",
                operation
            )))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ExecutionContext id={} method={}", self.request_id, self.method)?;
        if let Some(tool) = &self.tool_name {
            write!(f, " tool={}", tool)?;
        }
        if !self.results.is_empty() {
            write!(f, " results={} size={}", self.results.len(), self.context_size())?;
        }
        if self.sealed {
            f.write_str(" SEALED")?;
        }
        f.write_str(">")
    }
}
