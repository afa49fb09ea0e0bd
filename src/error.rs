//! Gateway failure taxonomy
//!
//! Every condition raised inside the gateway is one of the four
//! `GatewayFailure` kinds. Nothing else crosses the dispatch boundary.

use std::time::Duration;
use thiserror::Error;

pub type GatewayResult<T> = std::result::Result<T, GatewayFailure>;

#[derive(Debug, Error)]
pub enum GatewayFailure {
    /// Protocol requirement or internal invariant breached. Fatal to the request.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// The remote endpoint answered with an error or an unusable body.
    /// Non-fatal: surfaces as a tool result marked errored.
    #[error("upstream failure{}: {message}", status_suffix(.status))]
    UpstreamFailure {
        message: String,
        status: Option<u16>,
    },

    /// The outbound call could not complete. Fatal to the tool call.
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    /// The system cannot operate. Fatal at startup.
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

#[derive(Debug, Error)]
pub enum TransportFailure {
    #[error("request timed out after {}s; the external service did not respond in time", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("connection failed: {0}")]
    Connectivity(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl GatewayFailure {
    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    pub fn upstream(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::UpstreamFailure {
            message: message.into(),
            status,
        }
    }

    /// Stable category name, used in logs and error envelope data.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ContractViolation(_) => "contract_violation",
            Self::UpstreamFailure { .. } => "upstream_failure",
            Self::Transport(_) => "transport_failure",
            Self::ConfigurationError(_) => "configuration_error",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(TransportFailure::Timeout { .. }))
    }
}

impl From<config::ConfigError> for GatewayFailure {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigurationError(err.to_string())
    }
}
