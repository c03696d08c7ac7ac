use std::time::Duration;

use crate::{
    config::{BackoffPolicy, ProbeConfig},
    domain::ConnectionStatus,
};

/// Generation counter value captured when a probe starts. A result whose
/// ticket no longer matches the state's generation is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeVerdict {
    pub came_online: bool,
    pub went_offline: bool,
    pub next_delay: Duration,
}

#[derive(Debug)]
pub struct ConnectionState {
    status: ConnectionStatus,
    next_probe_delay: Duration,
    generation: u64,
    interval: Duration,
    backoff: BackoffPolicy,
}

impl ConnectionState {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            status: ConnectionStatus::Offline,
            next_probe_delay: backoff_floor(config.backoff),
            generation: 0,
            interval: config.interval,
            backoff: config.backoff,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_online(&self) -> bool {
        self.status == ConnectionStatus::Online
    }

    pub fn next_probe_delay(&self) -> Duration {
        self.next_probe_delay
    }

    pub fn ticket(&self) -> ProbeTicket {
        ProbeTicket(self.generation)
    }

    pub fn record_probe(&mut self, ticket: ProbeTicket, reachable: bool) -> ProbeVerdict {
        let stale = ticket.0 != self.generation;
        if reachable {
            self.record_success(stale)
        } else {
            self.record_failure(stale)
        }
    }

    fn record_success(&mut self, stale: bool) -> ProbeVerdict {
        if stale {
            // The state moved while this probe was in flight; trust the
            // newer transition and just keep polling.
            return ProbeVerdict {
                came_online: false,
                went_offline: false,
                next_delay: self.idle_delay(),
            };
        }

        let came_online = !self.is_online();
        if came_online {
            self.transition(ConnectionStatus::Online);
            self.next_probe_delay = backoff_floor(self.backoff);
        }
        ProbeVerdict {
            came_online,
            went_offline: false,
            next_delay: self.interval,
        }
    }

    fn record_failure(&mut self, stale: bool) -> ProbeVerdict {
        let went_offline = !stale && self.is_online();
        if went_offline {
            self.transition(ConnectionStatus::Offline);
        }
        if self.is_online() {
            return ProbeVerdict {
                came_online: false,
                went_offline: false,
                next_delay: self.interval,
            };
        }

        let delay = self.next_probe_delay;
        self.next_probe_delay = grow(self.backoff, delay);
        ProbeVerdict {
            came_online: false,
            went_offline,
            next_delay: delay,
        }
    }

    pub fn force_offline(&mut self) -> bool {
        if !self.is_online() {
            return false;
        }
        self.transition(ConnectionStatus::Offline);
        true
    }

    fn transition(&mut self, status: ConnectionStatus) {
        self.status = status;
        self.generation = self.generation.wrapping_add(1);
    }

    fn idle_delay(&self) -> Duration {
        if self.is_online() {
            self.interval
        } else {
            self.next_probe_delay
        }
    }
}

fn backoff_floor(policy: BackoffPolicy) -> Duration {
    match policy {
        BackoffPolicy::Exponential { floor, .. } => floor,
        BackoffPolicy::Fixed(interval) => interval,
    }
}

fn grow(policy: BackoffPolicy, current: Duration) -> Duration {
    match policy {
        BackoffPolicy::Exponential { floor, ceiling } => {
            current.saturating_mul(2).clamp(floor, ceiling)
        }
        BackoffPolicy::Fixed(interval) => interval,
    }
}
