use crate::error::{GatewayFailure, GatewayResult};
use crate::tools::registry::is_http_base;
use config::{Config, ConfigBuilder, Environment, File};
use config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "RESTMCP";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
}

/// Identity reported by `initialize`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Default origin for endpoints without their own base address
    pub base_url: String,
    pub open_meteo_base_url: String,
    pub timeout_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl UpstreamConfig {
    /// `timeout_secs` as a `Duration`; rejects zero, negative, non-finite and overflowing values.
    pub fn timeout(&self) -> GatewayResult<Duration> {
        let secs = self.timeout_secs;
        match Duration::try_from_secs_f64(secs) {
            Ok(timeout) if !timeout.is_zero() => Ok(timeout),
            _ => Err(GatewayFailure::configuration(format!(
                "upstream.timeout_secs must be a positive number of seconds, got {}",
                secs
            ))),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "rest-to-mcp-adapter".to_string(),
                version: "0.2.0".to_string(),
                protocol_version: "2024-11-05".to_string(),
            },
            upstream: UpstreamConfig {
                base_url: "https://jsonplaceholder.typicode.com".to_string(),
                open_meteo_base_url: "https://api.open-meteo.com".to_string(),
                timeout_secs: 30.0,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Defaults, then `config/{CONFIG_ENV}` if present, then `RESTMCP__*` variables.
    pub fn new() -> GatewayResult<Self> {
        let config_env = env::var("CONFIG_ENV").unwrap_or_else(|_| "default".to_string());

        let config = Self::builder()?
            .add_source(File::with_name(&format!("config/{}", config_env)).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Self::finish(config)
    }

    /// Defaults overlaid with an explicit file, then the environment.
    pub fn from_file(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GatewayFailure::configuration(format!(
                "config file '{}' does not exist",
                path.display()
            )));
        }

        let config = Self::builder()?
            .add_source(File::from(path))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        Self::finish(config)
    }

    fn builder() -> GatewayResult<ConfigBuilder<DefaultState>> {
        let defaults = Settings::default();
        let builder = Config::builder()
            .set_default("server.name", defaults.server.name)?
            .set_default("server.version", defaults.server.version)?
            .set_default("server.protocol_version", defaults.server.protocol_version)?
            .set_default("upstream.base_url", defaults.upstream.base_url)?
            .set_default("upstream.open_meteo_base_url", defaults.upstream.open_meteo_base_url)?
            .set_default("upstream.timeout_secs", defaults.upstream.timeout_secs)?
            .set_default("logging.level", defaults.logging.level)?;
        Ok(builder)
    }

    fn finish(config: Config) -> GatewayResult<Self> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the gateway cannot run with.
    pub fn validate(&self) -> GatewayResult<()> {
        self.upstream.timeout()?;

        for (key, url) in [
            ("upstream.base_url", &self.upstream.base_url),
            ("upstream.open_meteo_base_url", &self.upstream.open_meteo_base_url),
        ] {
            if !is_http_base(url) {
                return Err(GatewayFailure::configuration(format!(
                    "{} must be an absolute http(s) url, got '{}'",
                    key, url
                )));
            }
        }

        if self.server.name.trim().is_empty() {
            return Err(GatewayFailure::configuration("server.name cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.upstream.timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(settings.server.protocol_version, "2024-11-05");
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[upstream]\nbase_url = \"http://localhost:9999\"\ntimeout_secs = 2.5\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let settings = Settings::from_file(file.path()).unwrap();

        assert_eq!(settings.upstream.base_url, "http://localhost:9999");
        assert_eq!(settings.upstream.timeout().unwrap(), Duration::from_millis(2500));
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.server.name, "rest-to-mcp-adapter");
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[upstream]\ntimeout_secs = 0").unwrap();

        let err = Settings::from_file(file.path()).unwrap_err();
        assert_eq!(err.category(), "configuration_error");
    }

    #[test]
    fn test_from_file_rejects_overflowing_timeout() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[upstream]\ntimeout_secs = 1e20").unwrap();

        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GatewayFailure::ConfigurationError(_)));
    }

    #[test]
    fn test_timeout_rejects_unusable_values() {
        let mut settings = Settings::default();

        for secs in [-1.0, 0.0, 1e20, f64::NAN, f64::INFINITY] {
            settings.upstream.timeout_secs = secs;
            assert_eq!(settings.upstream.timeout().unwrap_err().category(), "configuration_error");
            assert!(settings.validate().is_err());
        }
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = Settings::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, GatewayFailure::ConfigurationError(_)));
    }

    #[test]
    fn test_validate_rejects_relative_base_url() {
        let mut settings = Settings::default();
        settings.upstream.base_url = "jsonplaceholder.typicode.com".to_string();

        assert!(settings.validate().is_err());
    }
}
