//! REST Endpoint Descriptor
//!
//! Information Hiding:
//! - Path templating and argument classification hidden
//! - Validation collects every violation instead of failing fast
//! - Destructive-operation policy declared per endpoint, not per name
//! - Path values are confined to their own segment and percent-encoded

use super::{ToolInputSchema, ToolSchema};
use crate::error::{GatewayFailure, GatewayResult};
use regex::{Captures, Regex};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::OnceLock;

/// Argument that identifies the target of a guarded operation
pub const IDENTIFIER_PARAM: &str = "id";

/// `{name}` placeholders in a path template
pub(crate) fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder pattern is valid"))
}

/// HTTP verbs an endpoint may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// POST, PUT and PATCH carry a body whose declared fields are all required.
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every violation found for one call, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentErrors(Vec<String>);

impl ArgumentErrors {
    pub fn errors(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

}

impl fmt::Display for ArgumentErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

/// Fully resolved outbound call
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub verb: HttpVerb,
    /// Endpoint-specific base address; `None` means the gateway's configured base
    pub base_url: Option<String>,
    /// Decoded path segments, substituted values included
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Map<String, Value>>,
}

impl OutboundRequest {
    /// Absolute URL. Every segment is percent-encoded on its own, so a
    /// substituted value can never add segments, a query or a fragment.
    pub fn url(&self, default_base: &str) -> GatewayResult<String> {
        let base = self.base_url.as_deref().unwrap_or(default_base);
        let invalid_base = || {
            GatewayFailure::configuration(format!("base url '{}' cannot carry a path", base))
        };

        let mut url = Url::parse(base).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .extend(&self.segments);

        Ok(url.into())
    }
}

/// Declarative description of one remote operation exposed as a tool
#[derive(Debug, Clone, PartialEq)]
pub struct RestEndpoint {
    name: String,
    path: String,
    verb: HttpVerb,
    description: String,
    path_params: Vec<String>,
    query_params: Vec<String>,
    body_params: Vec<String>,
    base_url: Option<String>,
    requires_positive_integer_id: bool,
}

impl RestEndpoint {
    pub fn new(
        name: impl Into<String>,
        verb: HttpVerb,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            verb,
            description: description.into(),
            path_params: Vec::new(),
            query_params: Vec::new(),
            body_params: Vec::new(),
            base_url: None,
            requires_positive_integer_id: false,
        }
    }

    pub fn with_path_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_query_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_body_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Route this endpoint to a different origin than the gateway default
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Mark as destructive: the `id` argument must be a positive integer
    pub fn requires_positive_integer_id(mut self) -> Self {
        self.requires_positive_integer_id = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn path_params(&self) -> &[String] {
        &self.path_params
    }

    pub fn query_params(&self) -> &[String] {
        &self.query_params
    }

    pub fn body_params(&self) -> &[String] {
        &self.body_params
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn is_guarded(&self) -> bool {
        self.requires_positive_integer_id
    }

    /// True if `name` belongs to any of the three parameter sets
    pub fn accepts(&self, name: &str) -> bool {
        self.path_params
            .iter()
            .chain(&self.query_params)
            .chain(&self.body_params)
            .any(|p| p == name)
    }

    /// Derive the tool schema. Pure function of the descriptor.
    ///
    /// Properties keep declaration order: path, then query, then body.
    pub fn to_tool_schema(&self) -> ToolSchema {
        let mut schema = ToolInputSchema::default();

        for param in &self.path_params {
            schema
                .properties
                .insert(param.clone(), string_property(format!("Path parameter: {}", param)));
            schema.required.push(param.clone());
        }

        for param in &self.query_params {
            schema
                .properties
                .insert(param.clone(), string_property(format!("Query parameter: {}", param)));
        }

        for param in &self.body_params {
            schema
                .properties
                .insert(param.clone(), string_property(format!("Body field: {}", param)));
            if self.verb.is_mutating() {
                schema.required.push(param.clone());
            }
        }

        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: schema,
        }
    }

    /// Check arguments against the declared surface.
    ///
    /// All violations are collected: unknown arguments first, then missing,
    /// empty or dot-segment path parameters, then missing body fields for
    /// mutating verbs.
    pub fn validate_arguments(&self, args: &Map<String, Value>) -> Result<(), ArgumentErrors> {
        let mut errors = Vec::new();

        for arg in args.keys() {
            if !self.accepts(arg) {
                errors.push(format!(
                    "Unknown argument '{}' - tool '{}' does not accept this parameter",
                    arg, self.name
                ));
            }
        }

        for param in &self.path_params {
            match args.get(param) {
                None => errors.push(format!("Missing required path parameter: '{}'", param)),
                Some(value) => {
                    let value = value_to_string(value);
                    if value.trim().is_empty() {
                        errors.push(format!("Path parameter '{}' cannot be empty", param));
                    } else if value == "." || value == ".." {
                        errors.push(format!("Path parameter '{}' cannot be '{}'", param, value));
                    }
                }
            }
        }

        if self.verb.is_mutating() {
            for param in &self.body_params {
                if !args.contains_key(param) {
                    errors.push(format!("Missing required body parameter: '{}'", param));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ArgumentErrors(errors))
        }
    }

    /// Destructive-operation policy, separate from shape validation.
    ///
    /// Guarded endpoints only run when `id` parses as an integer greater than zero.
    pub fn check_destructive_guard(&self, args: &Map<String, Value>) -> Result<(), String> {
        if !self.requires_positive_integer_id {
            return Ok(());
        }

        let raw = args.get(IDENTIFIER_PARAM);
        if raw.and_then(positive_integer).is_some() {
            Ok(())
        } else {
            let shown = raw.map(value_to_string).unwrap_or_else(|| "nothing".to_string());
            Err(format!(
                "Destructive operation rejected: tool '{}' requires '{}' to be a positive integer, got '{}'",
                self.name, IDENTIFIER_PARAM, shown
            ))
        }
    }

    /// Resolve the outbound call for already-validated arguments.
    ///
    /// Every path parameter is checked before any substitution happens, so a
    /// partially substituted path is never produced. Placeholders are replaced
    /// in a single pass; substituted text is never rescanned.
    pub fn build_request(&self, args: &Map<String, Value>) -> GatewayResult<OutboundRequest> {
        if let Some(missing) = self.path_params.iter().find(|p| !args.contains_key(*p)) {
            return Err(GatewayFailure::contract(format!(
                "cannot build request for '{}': path parameter '{}' is absent",
                self.name, missing
            )));
        }

        let segments: Vec<String> = self
            .path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                placeholder_pattern()
                    .replace_all(segment, |caps: &Captures| match args.get(&caps[1]) {
                        Some(value) if self.accepts_path_param(&caps[1]) => {
                            self.path_value(&caps[1], value)
                        }
                        _ => caps[0].to_string(),
                    })
                    .into_owned()
            })
            .collect();

        let query = self
            .query_params
            .iter()
            .filter_map(|p| args.get(p).map(|v| (p.clone(), value_to_string(v))))
            .collect();

        let body = if self.body_params.is_empty() {
            None
        } else {
            let mut body = Map::new();
            for param in &self.body_params {
                match args.get(param) {
                    Some(value) => {
                        body.insert(param.clone(), value.clone());
                    }
                    None if self.verb.is_mutating() => {
                        return Err(GatewayFailure::contract(format!(
                            "cannot build request for '{}': body parameter '{}' is absent after validation",
                            self.name, param
                        )));
                    }
                    None => {}
                }
            }
            Some(body)
        };

        tracing::debug!(
            "Built {} request for tool '{}': segments={:?}",
            self.verb,
            self.name,
            segments
        );

        Ok(OutboundRequest {
            verb: self.verb,
            base_url: self.base_url.clone(),
            segments,
            query,
            body,
        })
    }
}

impl RestEndpoint {
    fn accepts_path_param(&self, name: &str) -> bool {
        self.path_params.iter().any(|p| p == name)
    }

    /// Guarded identifiers are sent in canonical integer form.
    fn path_value(&self, param: &str, value: &Value) -> String {
        if self.requires_positive_integer_id && param == IDENTIFIER_PARAM {
            if let Some(id) = positive_integer(value) {
                return id.to_string();
            }
        }
        value_to_string(value)
    }
}

fn positive_integer(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    id.filter(|&id| id > 0)
}

fn string_property(description: String) -> Value {
    json!({"type": "string", "description": description})
}

/// String form of an argument: strings verbatim, null empty, everything else as JSON
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    fn get_item() -> RestEndpoint {
        RestEndpoint::new("get_item", HttpVerb::Get, "/items/{id}", "Get item by ID")
            .with_path_params(["id"])
    }

    fn update_item() -> RestEndpoint {
        RestEndpoint::new("update_item", HttpVerb::Put, "/items/{id}", "Update item")
            .with_path_params(["id"])
            .with_query_params(["dry_run"])
            .with_body_params(["name", "value"])
            .requires_positive_integer_id()
    }

    #[test]
    fn test_schema_without_params() {
        let schema = RestEndpoint::new("get_items", HttpVerb::Get, "/items", "Get all items")
            .to_tool_schema();

        assert_eq!(schema.name, "get_items");
        assert_eq!(schema.description, "Get all items");
        assert_eq!(schema.input_schema.schema_type, "object");
        assert!(schema.input_schema.properties.is_empty());
        assert!(schema.input_schema.required.is_empty());
    }

    #[test]
    fn test_schema_classifies_params() {
        let schema = update_item().to_tool_schema();
        let input = &schema.input_schema;

        assert_eq!(input.properties.len(), 4);
        assert_eq!(input.required, vec!["id", "name", "value"]);
        assert!(!input.required.contains(&"dry_run".to_string()));
        assert_eq!(input.properties["id"]["description"], "Path parameter: id");
        assert_eq!(input.properties["dry_run"]["description"], "Query parameter: dry_run");
        assert_eq!(input.properties["name"]["type"], "string");
    }

    #[test]
    fn test_schema_properties_keep_declaration_order() {
        let schema = RestEndpoint::new("search", HttpVerb::Put, "/z/{zone}", "Search")
            .with_path_params(["zone"])
            .with_query_params(["limit", "after"])
            .with_body_params(["title", "body"])
            .to_tool_schema();

        let keys: Vec<&str> = schema.input_schema.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zone", "limit", "after", "title", "body"]);

        let encoded = serde_json::to_string(&schema).unwrap();
        assert!(encoded.find("\"zone\"").unwrap() < encoded.find("\"limit\"").unwrap());
        assert!(encoded.find("\"after\"").unwrap() < encoded.find("\"title\"").unwrap());
    }

    #[test]
    fn test_schema_body_params_optional_for_non_mutating_verb() {
        let schema = RestEndpoint::new("search", HttpVerb::Get, "/search", "Search")
            .with_body_params(["filter"])
            .to_tool_schema();

        assert!(schema.input_schema.properties.contains_key("filter"));
        assert!(schema.input_schema.required.is_empty());
    }

    #[test]
    fn test_schema_json_shape() {
        let schema = get_item().to_tool_schema();

        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "name": "get_item",
                "description": "Get item by ID",
                "inputSchema": {
                    "type": "object",
                    "properties": {"id": {"type": "string", "description": "Path parameter: id"}},
                    "required": ["id"]
                }
            })
        );
    }

    #[test]
    fn test_unknown_argument_rejected_with_single_error() {
        let errors = get_item()
            .validate_arguments(&args(json!({"id": "1", "extra": "x"})))
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors.errors()[0].contains("extra"));
    }

    #[test]
    fn test_missing_and_empty_path_params() {
        let endpoint = get_item();

        let errors = endpoint.validate_arguments(&Map::new()).unwrap_err();
        assert_eq!(errors.errors(), ["Missing required path parameter: 'id'"]);

        let errors = endpoint.validate_arguments(&args(json!({"id": "  "}))).unwrap_err();
        assert_eq!(errors.errors(), ["Path parameter 'id' cannot be empty"]);

        let errors = endpoint.validate_arguments(&args(json!({"id": null}))).unwrap_err();
        assert_eq!(errors.len(), 1);

        let errors = endpoint.validate_arguments(&args(json!({"id": ".."}))).unwrap_err();
        assert_eq!(errors.errors(), ["Path parameter 'id' cannot be '..'"]);

        assert!(endpoint.validate_arguments(&args(json!({"id": 5}))).is_ok());
    }

    #[test]
    fn test_all_errors_collected_in_order() {
        let errors = update_item()
            .validate_arguments(&args(json!({"bogus": 1, "name": "n"})))
            .unwrap_err();

        assert_eq!(
            errors.errors(),
            [
                "Unknown argument 'bogus' - tool 'update_item' does not accept this parameter",
                "Missing required path parameter: 'id'",
                "Missing required body parameter: 'value'",
            ]
        );
        assert!(errors.to_string().contains("; "));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let endpoint = update_item();
        let input = args(json!({"zzz": 1, "aaa": 2, "id": ""}));

        let first = endpoint.validate_arguments(&input);
        let second = endpoint.validate_arguments(&input);

        assert_eq!(first, second);
    }

    #[test]
    fn test_body_params_not_required_for_delete() {
        let endpoint = RestEndpoint::new("delete_item", HttpVerb::Delete, "/items/{id}", "Delete")
            .with_path_params(["id"])
            .with_body_params(["reason"]);

        assert!(endpoint.validate_arguments(&args(json!({"id": "3"}))).is_ok());
    }

    #[test]
    fn test_destructive_guard() {
        let endpoint = update_item();

        for bad in [json!("0"), json!("-5"), json!("abc"), json!(0), json!(-5), json!(1.5)] {
            let err = endpoint
                .check_destructive_guard(&args(json!({"id": bad})))
                .unwrap_err();
            assert!(err.contains("rejected"), "{}", err);
        }

        assert!(endpoint.check_destructive_guard(&Map::new()).is_err());
        assert!(endpoint.check_destructive_guard(&args(json!({"id": "42"}))).is_ok());
        assert!(endpoint.check_destructive_guard(&args(json!({"id": 7}))).is_ok());

        // Unguarded endpoints accept anything
        assert!(get_item().check_destructive_guard(&args(json!({"id": "abc"}))).is_ok());
    }

    #[test]
    fn test_build_request() {
        let request = update_item()
            .build_request(&args(json!({
                "id": 12,
                "dry_run": true,
                "name": "widget",
                "value": 3
            })))
            .unwrap();

        assert_eq!(request.verb, HttpVerb::Put);
        assert_eq!(request.segments, ["items", "12"]);
        assert_eq!(request.query, vec![("dry_run".to_string(), "true".to_string())]);
        assert_eq!(
            Value::Object(request.body.unwrap()),
            json!({"name": "widget", "value": 3})
        );
    }

    #[test]
    fn test_build_request_missing_path_param_is_contract_violation() {
        let endpoint = RestEndpoint::new("get_comment", HttpVerb::Get, "/posts/{postId}/comments/{id}", "c")
            .with_path_params(["postId", "id"]);

        let err = endpoint
            .build_request(&args(json!({"postId": "1"})))
            .unwrap_err();

        assert_eq!(err.category(), "contract_violation");
        assert!(err.to_string().contains("'id'"));
    }

    #[test]
    fn test_build_request_missing_body_param_is_contract_violation() {
        let err = update_item()
            .build_request(&args(json!({"id": "1", "name": "only"})))
            .unwrap_err();

        assert!(matches!(err, GatewayFailure::ContractViolation(_)));
    }

    #[test]
    fn test_build_request_uses_override_base() {
        let endpoint = RestEndpoint::new("forecast", HttpVerb::Get, "/v1/forecast", "Forecast")
            .with_query_params(["latitude"])
            .with_base_url("https://weather.example.com/");

        let request = endpoint.build_request(&args(json!({"latitude": "52.5"}))).unwrap();
        assert_eq!(
            request.url("https://default.example.com").unwrap(),
            "https://weather.example.com/v1/forecast"
        );

        let request = get_item().build_request(&args(json!({"id": "9"}))).unwrap();
        assert_eq!(
            request.url("https://default.example.com/").unwrap(),
            "https://default.example.com/items/9"
        );
        assert!(request.body.is_none());
    }

    #[test]
    fn test_path_value_stays_in_its_segment() {
        let endpoint = get_item();

        for (raw, expected) in [
            ("1/comments", "https://api.example.com/items/1%2Fcomments"),
            ("1?admin=true", "https://api.example.com/items/1%3Fadmin=true"),
            ("1#frag", "https://api.example.com/items/1%23frag"),
            ("../users", "https://api.example.com/items/..%2Fusers"),
        ] {
            let request = endpoint.build_request(&args(json!({"id": raw}))).unwrap();
            assert_eq!(request.segments, ["items", raw]);
            assert_eq!(request.url("https://api.example.com").unwrap(), expected);
        }
    }

    #[test]
    fn test_substituted_placeholder_text_is_not_rescanned() {
        let endpoint =
            RestEndpoint::new("get_comment", HttpVerb::Get, "/posts/{postId}/comments/{id}", "c")
                .with_path_params(["postId", "id"]);

        let request = endpoint
            .build_request(&args(json!({"postId": "{id}", "id": "7"})))
            .unwrap();

        assert_eq!(request.segments, ["posts", "{id}", "comments", "7"]);
        assert_eq!(
            request.url("https://api.example.com").unwrap(),
            "https://api.example.com/posts/%7Bid%7D/comments/7"
        );
    }

    #[test]
    fn test_guarded_id_is_sent_in_canonical_form() {
        let request = update_item()
            .build_request(&args(json!({"id": " 5 ", "name": "n", "value": 1})))
            .unwrap();
        assert_eq!(request.segments, ["items", "5"]);

        // Unguarded endpoints send the value as given
        let request = get_item().build_request(&args(json!({"id": " 5 "}))).unwrap();
        assert_eq!(request.segments, ["items", " 5 "]);
    }

    #[test]
    fn test_url_rejects_unusable_base() {
        let request = get_item().build_request(&args(json!({"id": "1"}))).unwrap();

        let err = request.url("mailto:someone@example.com").unwrap_err();
        assert_eq!(err.category(), "configuration_error");
        assert!(request.url("not a url").is_err());
    }
}
