use std::collections::VecDeque;

use crate::domain::{Payload, QueueSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    Duplicate,
    Full,
}

#[derive(Debug)]
pub struct DeliveryQueue {
    entries: VecDeque<Payload>,
    capacity: usize,
}

impl DeliveryQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn enqueue(&mut self, payload: Payload) -> EnqueueOutcome {
        if self.entries.iter().any(|queued| queued.url == payload.url) {
            return EnqueueOutcome::Duplicate;
        }
        if self.entries.len() >= self.capacity {
            return EnqueueOutcome::Full;
        }
        self.entries.push_back(payload);
        EnqueueOutcome::Queued
    }

    pub fn take_all(&mut self) -> Vec<Payload> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            queued: self.entries.len(),
            capacity: self.capacity,
        }
    }
}
