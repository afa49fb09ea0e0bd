//! Endpoint Registry
//!
//! Information Hiding:
//! - Storage and lookup implementation hidden
//! - Catalog consistency checks run once, at construction
//! - No mutation is exposed after construction

use super::endpoint::{placeholder_pattern, IDENTIFIER_PARAM};
use super::{RestEndpoint, ToolSchema};
use crate::error::{GatewayFailure, GatewayResult};
use reqwest::Url;
use std::collections::{BTreeSet, HashMap};

/// Immutable, ordered mapping from tool name to endpoint descriptor
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    endpoints: Vec<RestEndpoint>,
    index: HashMap<String, usize>,
}

impl EndpointRegistry {
    /// Build the registry, rejecting an inconsistent catalog with `ConfigurationError`.
    pub fn new(endpoints: Vec<RestEndpoint>) -> GatewayResult<Self> {
        let mut index = HashMap::with_capacity(endpoints.len());

        for (position, endpoint) in endpoints.iter().enumerate() {
            check_endpoint(endpoint)?;

            if index.insert(endpoint.name().to_string(), position).is_some() {
                return Err(GatewayFailure::configuration(format!(
                    "duplicate tool name '{}'",
                    endpoint.name()
                )));
            }
            tracing::info!(
                "Registering tool: {} ({} {})",
                endpoint.name(),
                endpoint.verb(),
                endpoint.path()
            );
        }

        Ok(Self { endpoints, index })
    }

    /// Get an endpoint by tool name
    pub fn get(&self, name: &str) -> Option<&RestEndpoint> {
        self.index.get(name).map(|&i| &self.endpoints[i])
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.endpoints.iter().map(|e| e.name().to_string()).collect()
    }

    /// Tool schemas in registration order
    pub fn list_tools(&self) -> Vec<ToolSchema> {
        self.endpoints.iter().map(RestEndpoint::to_tool_schema).collect()
    }

    pub fn endpoints(&self) -> &[RestEndpoint] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Get tool metadata as formatted string for terminal listings
    pub fn tools_description(&self) -> String {
        let mut descriptions = Vec::new();
        for endpoint in &self.endpoints {
            let schema = endpoint.to_tool_schema();
            let params = schema
                .input_schema
                .properties
                .iter()
                .map(|(name, property)| {
                    let required = if schema.input_schema.required.contains(name) {
                        "required"
                    } else {
                        "optional"
                    };
                    format!(
                        "  - {} ({}): {} [{}]",
                        name,
                        property["type"].as_str().unwrap_or("string"),
                        property["description"].as_str().unwrap_or_default(),
                        required
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");

            descriptions.push(format!(
                "Tool: {}\nEndpoint: {} {}\nDescription: {}\nParameters:\n{}",
                schema.name,
                endpoint.verb(),
                endpoint.path(),
                schema.description,
                params
            ));
        }
        descriptions.join("\n\n")
    }
}

fn check_endpoint(endpoint: &RestEndpoint) -> GatewayResult<()> {
    let name = endpoint.name();
    let fail = |reason: String| {
        Err(GatewayFailure::configuration(format!(
            "endpoint '{}': {}",
            name, reason
        )))
    };

    if name.trim().is_empty() {
        return Err(GatewayFailure::configuration("endpoint name cannot be empty"));
    }

    if !endpoint.path().starts_with('/') {
        return fail(format!("path '{}' must start with '/'", endpoint.path()));
    }

    let mut seen = BTreeSet::new();
    for param in endpoint
        .path_params()
        .iter()
        .chain(endpoint.query_params())
        .chain(endpoint.body_params())
    {
        if param.trim().is_empty() {
            return fail("parameter names cannot be empty".to_string());
        }
        if !seen.insert(param.as_str()) {
            return fail(format!("parameter '{}' is declared more than once", param));
        }
    }

    let placeholders: BTreeSet<&str> = placeholder_pattern()
        .captures_iter(endpoint.path())
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let declared: BTreeSet<&str> = endpoint.path_params().iter().map(String::as_str).collect();
    if placeholders != declared {
        return fail(format!(
            "path placeholders {:?} do not match declared path params {:?}",
            placeholders, declared
        ));
    }

    if let Some(base) = endpoint.base_url() {
        if !is_http_base(base) {
            return fail(format!("base url '{}' must be an absolute http(s) url", base));
        }
    }

    if endpoint.is_guarded() && !endpoint.accepts(IDENTIFIER_PARAM) {
        return fail(format!(
            "guarded endpoint must declare an '{}' argument",
            IDENTIFIER_PARAM
        ));
    }

    Ok(())
}

/// Absolute http(s) URL that can take path segments
pub(crate) fn is_http_base(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https") && !u.cannot_be_a_base())
        .unwrap_or(false)
}
