use std::{fmt, str::FromStr, sync::Arc};

use parking_lot::RwLock;

use crate::{
    delivery::{Courier, DeliveryOutcome},
    domain::{PageContext, Payload},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level `{other}`")),
        }
    }
}

#[derive(Clone)]
pub struct RemoteLogger {
    courier: Arc<Courier>,
    page: Arc<RwLock<PageContext>>,
}

impl RemoteLogger {
    pub(crate) fn new(courier: Arc<Courier>, page: Arc<RwLock<PageContext>>) -> Self {
        Self { courier, page }
    }

    pub async fn log(&self, message: &str, level: LogLevel) -> DeliveryOutcome {
        let payload = Payload::diagnostic(message, level.as_str(), &self.page.read());
        tracing::debug!(target: "remote_log", %level, text = message, "forwarding diagnostic");
        self.courier.try_send(payload).await
    }
}
