use std::{env, time::Duration};

use url::Url;

use super::env::{
    AgentConfig, BackoffPolicy, ConfigError, LimitsConfig, LoggingConfig, PageConfig,
    ProbeConfig, ServiceConfig, DEFAULT_BACKOFF_CEILING, DEFAULT_BACKOFF_FLOOR,
    DEFAULT_DEDUP_CAPACITY, DEFAULT_PROBE_INTERVAL, DEFAULT_PROBE_TIMEOUT,
    DEFAULT_QUEUE_CAPACITY, DEFAULT_SERVER_BASE,
};

pub fn load_config() -> Result<AgentConfig, ConfigError> {
    AgentConfig::from_lookup(|key| env::var(key).ok())
}

impl AgentConfig {
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_base = var("SERVER_BASE").unwrap_or_else(|| DEFAULT_SERVER_BASE.to_string());
        let server_base = parse_server_base(&raw_base)?;

        let service = ServiceConfig {
            server_base,
            delivery_timeout: parse_millis(&var, "DELIVERY_TIMEOUT_MS"),
        };

        let interval =
            parse_millis(&var, "PROBE_INTERVAL_MS").unwrap_or(DEFAULT_PROBE_INTERVAL);
        let timeout = parse_millis(&var, "PROBE_TIMEOUT_MS").unwrap_or(DEFAULT_PROBE_TIMEOUT);
        let backoff = match var("BACKOFF_MODE")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("exponential") => {
                let floor =
                    parse_millis(&var, "BACKOFF_FLOOR_MS").unwrap_or(DEFAULT_BACKOFF_FLOOR);
                let ceiling =
                    parse_millis(&var, "BACKOFF_CEILING_MS").unwrap_or(DEFAULT_BACKOFF_CEILING);
                if floor.is_zero() || floor > ceiling {
                    return Err(ConfigError::Invalid {
                        key: "BACKOFF_FLOOR_MS",
                        reason: format!(
                            "floor {}ms must be non-zero and not above ceiling {}ms",
                            floor.as_millis(),
                            ceiling.as_millis()
                        ),
                    });
                }
                BackoffPolicy::Exponential { floor, ceiling }
            }
            Some("fixed") => BackoffPolicy::Fixed(interval),
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "BACKOFF_MODE",
                    reason: format!("expected `exponential` or `fixed`, got `{other}`"),
                })
            }
        };
        let probe = ProbeConfig {
            interval,
            timeout,
            backoff,
        };

        let limits = LimitsConfig {
            queue_capacity: parse_usize(&var, "QUEUE_CAPACITY").unwrap_or(DEFAULT_QUEUE_CAPACITY),
            dedup_capacity: parse_usize(&var, "DEDUP_CAPACITY").unwrap_or(DEFAULT_DEDUP_CAPACITY),
        };

        let page = PageConfig {
            url: var("PAGE_URL").unwrap_or_default(),
            title: var("PAGE_TITLE").unwrap_or_default(),
            cookies: var("PAGE_COOKIES"),
            referrer: var("PAGE_REFERRER"),
            agent: var("PAGE_AGENT")
                .unwrap_or_else(|| format!("snipe-agent/{}", env!("CARGO_PKG_VERSION"))),
        };

        let logging = LoggingConfig {
            level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            logs_dir: var("LOGS_DIR"),
        };

        Ok(Self {
            service,
            probe,
            limits,
            page,
            logging,
        })
    }
}

fn parse_server_base(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|err| ConfigError::Invalid {
        key: "SERVER_BASE",
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            key: "SERVER_BASE",
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }
    Ok(url)
}

fn parse_millis<F>(var: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn parse_usize<F>(var: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    var(key).and_then(|v| v.trim().parse::<usize>().ok())
}
