//! JSON-RPC 2.0 envelopes as carried by the Model Context Protocol
//!
//! Information Hiding:
//! - Wire field names (camelCase, `jsonrpc` tag) hidden behind typed structs
//! - Inbound parsing classifies malformed input into PARSE_ERROR / INVALID_REQUEST
//! - Exactly one of success or error is representable per response

use crate::tools::ToolSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_TOOLS_LIST: &str = "tools/list";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

/// Short-form aliases for `tools/list` and `tools/call`
pub const METHOD_LIST_TOOLS: &str = "list-tools";
pub const METHOD_CALL_TOOL: &str = "call-tool";

/// Request identifier: integer or string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl RequestId {
    /// A string id made only of whitespace carries no identity.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Number(_) => false,
            Self::String(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<i32> for RequestId {
    fn from(id: i32) -> Self {
        Self::Number(i64::from(id))
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::String(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

fn default_jsonrpc() -> String {
    JSONRPC_VERSION.to_string()
}

/// Inbound method-dispatch envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRpcRequest {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(mut self, params: Value) -> Self {
        self.params = match params {
            Value::Object(map) => Some(map),
            _ => None,
        };
        self
    }
}

/// Standard JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub jsonrpc: String,
    pub id: RequestId,
    pub result: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    pub error: ErrorObject,
}

/// Outbound envelope. Exactly one of the two shapes per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcResponse {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl JsonRpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Success(SuccessResponse {
            jsonrpc: default_jsonrpc(),
            id,
            result,
        })
    }

    pub fn error(id: Option<RequestId>, error: ErrorObject) -> Self {
        Self::Error(ErrorResponse {
            jsonrpc: default_jsonrpc(),
            id,
            error,
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Success(s) => Some(&s.id),
            Self::Error(e) => e.id.as_ref(),
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success(s) => Some(&s.result),
            Self::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&ErrorObject> {
        match self {
            Self::Success(_) => None,
            Self::Error(e) => Some(&e.error),
        }
    }
}

/// Parameters of `tools/call`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Result of `initialize`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub server_info: ServerInfo,
    pub capabilities: Value,
}

/// Result of `tools/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<ToolSchema>,
}

/// Parse a raw inbound message.
///
/// Invalid JSON is a PARSE_ERROR with a null id. Valid JSON that is not a
/// request object is an INVALID_REQUEST, echoing whatever id can be recovered.
pub fn parse_request(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        JsonRpcResponse::error(
            None,
            ErrorObject::new(ErrorCode::ParseError, format!("Invalid JSON: {}", e)),
        )
    })?;

    let recovered_id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

    let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        JsonRpcResponse::error(
            recovered_id.clone(),
            ErrorObject::new(ErrorCode::InvalidRequest, format!("Invalid request: {}", e)),
        )
    })?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(JsonRpcResponse::error(
            recovered_id,
            ErrorObject::new(
                ErrorCode::InvalidRequest,
                format!(
                    "Invalid request: jsonrpc must be \"{}\", got \"{}\"",
                    JSONRPC_VERSION, request.jsonrpc
                ),
            ),
        ));
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
    }

    #[test]
    fn test_parse_request_with_params() {
        let request = parse_request(
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"get_post"}}"#,
        )
        .unwrap();

        assert_eq!(request.id, RequestId::Number(7));
        assert_eq!(request.method, "tools/call");
        assert_eq!(request.params.unwrap()["name"], "get_post");
    }

    #[test]
    fn test_parse_request_defaults_version_and_accepts_string_id() {
        let request = parse_request(r#"{"id":"abc","method":"initialize"}"#).unwrap();

        assert_eq!(request.jsonrpc, "2.0");
        assert_eq!(request.id, RequestId::String("abc".into()));
        assert!(request.params.is_none());
    }

    #[test]
    fn test_parse_request_invalid_json() {
        let response = parse_request("{not json").unwrap_err();
        let error = response.error_object().unwrap();

        assert_eq!(error.code, -32700);
        assert!(response.id().is_none());
    }

    #[test]
    fn test_parse_request_missing_method_echoes_id() {
        let response = parse_request(r#"{"jsonrpc":"2.0","id":3}"#).unwrap_err();

        assert_eq!(response.error_object().unwrap().code, -32600);
        assert_eq!(response.id(), Some(&RequestId::Number(3)));
    }

    #[test]
    fn test_parse_request_rejects_wrong_version_and_extra_fields() {
        let response = parse_request(r#"{"jsonrpc":"1.0","id":1,"method":"x"}"#).unwrap_err();
        assert_eq!(response.error_object().unwrap().code, -32600);

        let response =
            parse_request(r#"{"jsonrpc":"2.0","id":1,"method":"x","extra":true}"#).unwrap_err();
        assert_eq!(response.error_object().unwrap().code, -32600);
    }

    #[test]
    fn test_parse_request_rejects_non_object_params() {
        let response = parse_request(r#"{"id":1,"method":"x","params":[1,2]}"#).unwrap_err();
        assert_eq!(response.error_object().unwrap().code, -32600);
    }

    #[test]
    fn test_response_serialization() {
        let ok = JsonRpcResponse::success(RequestId::Number(1), json!({"tools": []}));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"jsonrpc": "2.0", "id": 1, "result": {"tools": []}})
        );

        let err = JsonRpcResponse::error(
            None,
            ErrorObject::new(ErrorCode::MethodNotFound, "Unknown method: x"),
        );
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32601, "message": "Unknown method: x"}
            })
        );
    }

    #[test]
    fn test_tool_call_params_rejects_unknown_fields() {
        let parsed: Result<ToolCallParams, _> =
            serde_json::from_value(json!({"name": "x", "arguments": {}, "extra": 1}));
        assert!(parsed.is_err());

        let parsed: ToolCallParams = serde_json::from_value(json!({"name": "x"})).unwrap();
        assert!(parsed.arguments.is_empty());
    }

    #[test]
    fn test_blank_request_id() {
        assert!(RequestId::from("   ").is_blank());
        assert!(!RequestId::from("a").is_blank());
        assert!(!RequestId::from(0).is_blank());
    }
}
