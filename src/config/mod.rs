pub mod env;
mod loader;

pub use env::{
    AgentConfig, BackoffPolicy, ConfigError, LimitsConfig, LoggingConfig, PageConfig,
    ProbeConfig, ServiceConfig,
};
pub use loader::load_config;
