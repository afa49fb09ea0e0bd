//! Default endpoint catalog
//!
//! JSONPlaceholder endpoints resolve against the gateway's configured base
//! address. Open-Meteo endpoints carry their own origin.

use super::{HttpVerb, RestEndpoint};
use crate::config::UpstreamConfig;

/// https://jsonplaceholder.typicode.com
pub fn jsonplaceholder_endpoints() -> Vec<RestEndpoint> {
    vec![
        RestEndpoint::new(
            "get_posts",
            HttpVerb::Get,
            "/posts",
            "Get all posts. Optionally filter by userId.",
        )
        .with_query_params(["userId"]),
        RestEndpoint::new("get_post", HttpVerb::Get, "/posts/{id}", "Get a specific post by ID.")
            .with_path_params(["id"]),
        RestEndpoint::new(
            "create_post",
            HttpVerb::Post,
            "/posts",
            "Create a new post with title, body, and userId.",
        )
        .with_body_params(["title", "body", "userId"]),
        RestEndpoint::new("update_post", HttpVerb::Put, "/posts/{id}", "Update an existing post.")
            .with_path_params(["id"])
            .with_body_params(["title", "body", "userId"])
            .requires_positive_integer_id(),
        RestEndpoint::new("delete_post", HttpVerb::Delete, "/posts/{id}", "Delete a post by ID.")
            .with_path_params(["id"])
            .requires_positive_integer_id(),
        RestEndpoint::new(
            "get_comments",
            HttpVerb::Get,
            "/posts/{postId}/comments",
            "Get all comments for a specific post.",
        )
        .with_path_params(["postId"]),
        RestEndpoint::new("get_users", HttpVerb::Get, "/users", "Get all users."),
        RestEndpoint::new("get_user", HttpVerb::Get, "/users/{id}", "Get a specific user by ID.")
            .with_path_params(["id"]),
    ]
}

/// https://open-meteo.com/en/docs
pub fn open_meteo_endpoints(base_url: &str) -> Vec<RestEndpoint> {
    vec![
        RestEndpoint::new(
            "get_weather",
            HttpVerb::Get,
            "/v1/forecast",
            "Get current weather for coordinates. Returns temperature, wind speed, and conditions.",
        )
        .with_query_params(["latitude", "longitude", "current_weather"])
        .with_base_url(base_url),
        RestEndpoint::new(
            "get_forecast",
            HttpVerb::Get,
            "/v1/forecast",
            "Get 7-day weather forecast for coordinates.",
        )
        .with_query_params(["latitude", "longitude", "daily", "timezone"])
        .with_base_url(base_url),
    ]
}

pub fn default_endpoints(upstream: &UpstreamConfig) -> Vec<RestEndpoint> {
    let mut endpoints = jsonplaceholder_endpoints();
    endpoints.extend(open_meteo_endpoints(&upstream.open_meteo_base_url));
    endpoints
}
