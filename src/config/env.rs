use std::time::Duration;

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub service: ServiceConfig,
    pub probe: ProbeConfig,
    pub limits: LimitsConfig,
    pub page: PageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub server_base: Url,
    pub delivery_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub backoff: BackoffPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffPolicy {
    Exponential { floor: Duration, ceiling: Duration },
    Fixed(Duration),
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub queue_capacity: usize,
    pub dedup_capacity: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    pub url: String,
    pub title: String,
    pub cookies: Option<String>,
    pub referrer: Option<String>,
    pub agent: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub logs_dir: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub const DEFAULT_SERVER_BASE: &str = "http://127.0.0.1:5005";
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(5_000);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(2_000);
pub const DEFAULT_BACKOFF_FLOOR: Duration = Duration::from_millis(1_000);
pub const DEFAULT_BACKOFF_CEILING: Duration = Duration::from_millis(30_000);
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;
pub const DEFAULT_DEDUP_CAPACITY: usize = 2_000;

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_PROBE_INTERVAL,
            timeout: DEFAULT_PROBE_TIMEOUT,
            backoff: BackoffPolicy::Exponential {
                floor: DEFAULT_BACKOFF_FLOOR,
                ceiling: DEFAULT_BACKOFF_CEILING,
            },
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dedup_capacity: DEFAULT_DEDUP_CAPACITY,
        }
    }
}

impl AgentConfig {
    pub fn with_server_base(server_base: Url) -> Self {
        Self {
            service: ServiceConfig {
                server_base,
                delivery_timeout: None,
            },
            probe: ProbeConfig::default(),
            limits: LimitsConfig::default(),
            page: PageConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                logs_dir: None,
            },
        }
    }
}
