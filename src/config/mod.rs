mod settings;

pub use settings::{LoggingConfig, ServerConfig, Settings, UpstreamConfig, ENV_PREFIX};
