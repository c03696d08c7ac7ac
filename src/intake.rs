use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    task::JoinSet,
};

use crate::{
    agent::CaptureAgent,
    domain::SourceTag,
    infrastructure::shutdown::{ShutdownListener, DRAIN_GRACE},
    remote_log::LogLevel,
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InterceptorEvent {
    Capture { url: String, source: SourceTag },
    Drm { key_system: String },
    Page(PageUpdate),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub page: Option<String>,
    pub cookies: Option<String>,
    pub referrer: Option<String>,
    pub agent: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeStats {
    pub captures: usize,
    pub drm_signals: usize,
    pub page_updates: usize,
    pub malformed: usize,
}

pub fn parse_event(line: &str) -> Result<InterceptorEvent, serde_json::Error> {
    serde_json::from_str(line)
}

pub async fn run<R>(
    agent: CaptureAgent,
    reader: R,
    mut shutdown: ShutdownListener,
) -> Result<IntakeStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut tasks = JoinSet::new();
    let mut stats = IntakeStats::default();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read interceptor stream")?,
            _ = shutdown.notified() => break,
        };
        let Some(line) = line else {
            break;
        };
        while tasks.try_join_next().is_some() {}

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_event(trimmed) {
            Ok(InterceptorEvent::Capture { url, source }) => {
                stats.captures += 1;
                let agent = agent.clone();
                tasks.spawn(async move {
                    agent.capture(&url, source).await;
                });
            }
            Ok(InterceptorEvent::Drm { key_system }) => {
                stats.drm_signals += 1;
                let agent = agent.clone();
                tasks.spawn(async move {
                    agent.drm_signal(&key_system).await;
                });
            }
            Ok(InterceptorEvent::Page(update)) => {
                stats.page_updates += 1;
                apply_page_update(&agent, update);
            }
            Err(err) => {
                stats.malformed += 1;
                tracing::warn!(target: "intake", error = %err, line = trimmed, "malformed interceptor event");
                let logger = agent.logger();
                let message = format!("malformed interceptor event: {err}");
                tasks.spawn(async move {
                    logger.log(&message, LogLevel::Warn).await;
                });
            }
        }
    }

    // In-flight deliveries finish on their own after EOF, but a send the
    // service never answers must not hold up shutdown.
    let abandoned = shutdown.drain(&mut tasks, DRAIN_GRACE).await;
    tracing::info!(
        target: "intake",
        captures = stats.captures,
        drm = stats.drm_signals,
        pages = stats.page_updates,
        malformed = stats.malformed,
        abandoned,
        "interceptor stream closed"
    );
    Ok(stats)
}

fn apply_page_update(agent: &CaptureAgent, update: PageUpdate) {
    let mut page = agent.page_context();
    if let Some(title) = update.title {
        page.title = title;
    }
    if let Some(url) = update.page {
        page.page = url;
    }
    if update.cookies.is_some() {
        page.cookies = update.cookies;
    }
    if update.referrer.is_some() {
        page.referrer = update.referrer;
    }
    if let Some(agent_string) = update.agent {
        page.agent = agent_string;
    }
    agent.set_page_context(page);
}
