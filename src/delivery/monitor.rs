use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{sleep, timeout},
};

use crate::infrastructure::shutdown::ShutdownListener;

use super::{connection::ProbeVerdict, courier::Courier};

pub struct ConnectionMonitor {
    courier: Arc<Courier>,
    probe_timeout: Duration,
}

impl ConnectionMonitor {
    pub fn new(courier: Arc<Courier>, probe_timeout: Duration) -> Self {
        Self {
            courier,
            probe_timeout,
        }
    }

    pub fn spawn(self, mut shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop(&mut shutdown).await;
        })
    }

    async fn run_loop(&self, shutdown: &mut ShutdownListener) {
        let mut delay = Duration::ZERO;
        loop {
            if shutdown.is_triggered() {
                break;
            }
            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.notified() => break,
            }

            let verdict = self.tick().await;
            if verdict.came_online {
                let courier = self.courier.clone();
                tokio::spawn(async move {
                    courier.flush().await;
                });
            }
            delay = verdict.next_delay;
        }
        tracing::info!(target: "monitor", "connection monitor stopped");
    }

    pub async fn tick(&self) -> ProbeVerdict {
        let ticket = self.courier.probe_ticket();
        let result = timeout(self.probe_timeout, self.courier.transport().probe()).await;

        let reachable = match result {
            Ok(Ok(status)) => {
                if let Some(status) = status {
                    tracing::debug!(
                        target: "monitor",
                        video_count = status.video_count,
                        sub_count = status.sub_count,
                        "service reachable"
                    );
                }
                true
            }
            Ok(Err(err)) => {
                tracing::debug!(target: "monitor", error = %err, "health probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(
                    target: "monitor",
                    timeout = ?self.probe_timeout,
                    "health probe timed out"
                );
                false
            }
        };

        let verdict = self.courier.record_probe(ticket, reachable);
        if verdict.came_online {
            tracing::info!(target: "monitor", "local service is online");
        } else if verdict.went_offline {
            tracing::warn!(
                target: "monitor",
                retry_in = ?verdict.next_delay,
                "local service went offline"
            );
        }
        verdict
    }
}
