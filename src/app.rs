use std::sync::Arc;

use anyhow::Result;
use tokio::{io::BufReader, task::JoinHandle};

use crate::{
    agent::CaptureAgent,
    config::AgentConfig,
    infrastructure::{
        notifier::TracingNotifier,
        shutdown::{join_or_abort, Shutdown, DRAIN_GRACE},
    },
    intake,
    remote_log::LogLevel,
};

pub struct SnipeAgentApp {
    agent: CaptureAgent,
    monitor_handle: JoinHandle<()>,
    shutdown: Shutdown,
}

impl SnipeAgentApp {
    pub fn initialize(config: &AgentConfig, shutdown: Shutdown) -> Result<Self> {
        let agent = CaptureAgent::connect(config, Arc::new(TracingNotifier))?;
        let monitor_handle = agent.start(shutdown.subscribe());
        Ok(Self {
            agent,
            monitor_handle,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let SnipeAgentApp {
            agent,
            mut monitor_handle,
            shutdown,
        } = self;

        tracing::info!(target: "agent", page = %agent.page_context().page, "capture agent started");
        let logger = agent.logger();
        tokio::spawn(async move {
            logger.log("capture agent attached", LogLevel::Info).await;
        });

        let reader = BufReader::new(tokio::io::stdin());
        match intake::run(agent.clone(), reader, shutdown.subscribe()).await {
            Ok(_) => {}
            Err(err) => tracing::error!(target: "intake", error = %err, "interceptor stream failed"),
        }

        // The agent outlives its event source; keep probing and flushing
        // until the host asks us to stop.
        let mut listener = shutdown.subscribe();
        tokio::select! {
            _ = listener.notified() => {}
            res = &mut monitor_handle => {
                if let Err(err) = res {
                    tracing::error!(target: "monitor", ?err, "connection monitor exited unexpectedly");
                }
                return Ok(());
            }
        }

        join_or_abort(monitor_handle, DRAIN_GRACE, "connection monitor").await;

        let queued = agent.queued();
        if queued.queued > 0 {
            tracing::warn!(
                target: "agent",
                queued = queued.queued,
                "exiting with undelivered payloads"
            );
        }
        tracing::info!(target: "agent", "capture agent stopped");
        Ok(())
    }
}
