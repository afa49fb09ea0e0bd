//! Tool System - Exposes declarative REST endpoints as callable tools
//!
//! Information Hiding:
//! - Endpoint descriptors hide URL templating and argument classification
//! - Registry hides lookup structure and startup validation
//! - Transport hides the HTTP client and its connection pool
//! - Executor hides timeout classification and response folding

pub mod catalog;
pub mod endpoint;
pub mod executor;
pub mod http;
pub mod registry;

pub use endpoint::{ArgumentErrors, HttpVerb, OutboundRequest, RestEndpoint};
pub use executor::ToolExecutor;
pub use http::{HttpTransport, Transport, TransportResponse};
pub use registry::EndpointRegistry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// JSON Schema describing a tool's arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    /// `{type, description}` per argument, in declaration order
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }
}

/// Tool definition as listed by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

impl fmt::Display for ToolSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// Content block carried in a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Number of characters this block contributes to a context
    pub fn size(&self) -> usize {
        match self {
            Self::Text { text } => text.chars().count(),
            Self::Image { data, .. } => data.len(),
        }
    }
}

/// Result of a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            is_error: true,
        }
    }

    pub fn size(&self) -> usize {
        self.content.iter().map(ContentBlock::size).sum()
    }

    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
