use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    config::{LimitsConfig, ProbeConfig},
    domain::{ConnectionStatus, Payload, QueueSnapshot},
};

use super::{
    connection::{ConnectionState, ProbeTicket, ProbeVerdict},
    queue::{DeliveryQueue, EnqueueOutcome},
    transport::Transport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    Queued,
    DroppedDuplicate,
    DroppedFull,
}

impl From<EnqueueOutcome> for DeliveryOutcome {
    fn from(outcome: EnqueueOutcome) -> Self {
        match outcome {
            EnqueueOutcome::Queued => DeliveryOutcome::Queued,
            EnqueueOutcome::Duplicate => DeliveryOutcome::DroppedDuplicate,
            EnqueueOutcome::Full => DeliveryOutcome::DroppedFull,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub requeued: usize,
    pub dropped: usize,
}

/// Lock order is always connection, then queue. Neither lock is held across
/// an await.
pub struct Courier {
    connection: Mutex<ConnectionState>,
    queue: Mutex<DeliveryQueue>,
    transport: Arc<dyn Transport>,
}

impl Courier {
    pub fn new(
        transport: Arc<dyn Transport>,
        probe: &ProbeConfig,
        limits: &LimitsConfig,
    ) -> Self {
        Self {
            connection: Mutex::new(ConnectionState::new(probe)),
            queue: Mutex::new(DeliveryQueue::new(limits.queue_capacity)),
            transport,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.lock().status()
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.queue.lock().snapshot()
    }

    pub fn probe_ticket(&self) -> ProbeTicket {
        self.connection.lock().ticket()
    }

    pub fn record_probe(&self, ticket: ProbeTicket, reachable: bool) -> ProbeVerdict {
        self.connection.lock().record_probe(ticket, reachable)
    }

    pub async fn try_send(&self, payload: Payload) -> DeliveryOutcome {
        let payload = {
            let connection = self.connection.lock();
            if !connection.is_online() {
                return self.hold(payload);
            }
            payload
        };

        match self.transport.send(&payload).await {
            Ok(()) => {
                tracing::debug!(
                    target: "delivery",
                    url = %payload.url,
                    kind = %payload.kind,
                    source = %payload.source,
                    "payload delivered"
                );
                DeliveryOutcome::Delivered
            }
            Err(err) => {
                let mut connection = self.connection.lock();
                if connection.force_offline() {
                    tracing::warn!(
                        target: "delivery",
                        error = %err,
                        url = %payload.url,
                        "delivery failed; service marked offline"
                    );
                } else {
                    tracing::debug!(
                        target: "delivery",
                        error = %err,
                        url = %payload.url,
                        "delivery failed while already offline"
                    );
                }
                self.hold(payload)
            }
        }
    }

    /// Callers must hold the connection lock and have observed it offline.
    fn hold(&self, payload: Payload) -> DeliveryOutcome {
        let url = payload.url.clone();
        let outcome = self.queue.lock().enqueue(payload);
        match outcome {
            EnqueueOutcome::Queued => {
                tracing::debug!(target: "delivery", url = %url, "payload queued");
            }
            EnqueueOutcome::Duplicate => {
                tracing::debug!(target: "delivery", url = %url, "payload already queued");
            }
            EnqueueOutcome::Full => {
                tracing::warn!(target: "delivery", url = %url, "offline queue full; payload dropped");
            }
        }
        outcome.into()
    }

    pub async fn flush(&self) -> FlushReport {
        let batch = self.queue.lock().take_all();
        let mut report = FlushReport {
            attempted: batch.len(),
            ..FlushReport::default()
        };
        if batch.is_empty() {
            return report;
        }

        tracing::info!(target: "delivery", total = batch.len(), "flushing offline queue");
        for payload in batch {
            match self.try_send(payload).await {
                DeliveryOutcome::Delivered => report.delivered += 1,
                DeliveryOutcome::Queued => report.requeued += 1,
                DeliveryOutcome::DroppedDuplicate | DeliveryOutcome::DroppedFull => {
                    report.dropped += 1
                }
            }
        }
        tracing::info!(
            target: "delivery",
            delivered = report.delivered,
            requeued = report.requeued,
            dropped = report.dropped,
            "flush finished"
        );
        report
    }
}
