//! In-process event bus.
//!
//! Behaves like a single JetStream stream with an unbounded deduplication
//! window: a repeated message id is acknowledged as a duplicate and not
//! stored again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{BusConnection, EventBus};
use crate::error::PublishError;
use crate::types::{OutboundMessage, PublishAck};

const STREAM: &str = "EVENTS";

#[derive(Default)]
struct Inner {
    messages: Mutex<Vec<OutboundMessage>>,
    sequences: Mutex<HashMap<String, u64>>,
    connects: AtomicUsize,
    fail_connect: AtomicBool,
    fail_publish: AtomicBool,
    connect_delay: Mutex<Option<Duration>>,
}

/// Event bus kept in memory; clones observe the same messages.
#[derive(Clone, Default)]
pub struct MemoryEventBus {
    inner: Arc<Inner>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages accepted so far, duplicates excluded
    pub fn messages(&self) -> Vec<OutboundMessage> {
        lock(&self.inner.messages).clone()
    }

    /// Number of connections opened
    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.inner.fail_connect.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.inner.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Delay every connect, widening the window for concurrent first use
    pub fn set_connect_delay(&self, delay: Duration) {
        *lock(&self.inner.connect_delay) = Some(delay);
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn connect(&self) -> Result<Arc<dyn BusConnection>, PublishError> {
        let delay = *lock(&self.inner.connect_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.fail_connect.load(Ordering::SeqCst) {
            return Err(PublishError::Connect("memory bus refused connection".to_string()));
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MemoryConnection {
            inner: self.inner.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryConnection {
    inner: Arc<Inner>,
}

#[async_trait]
impl BusConnection for MemoryConnection {
    async fn publish(&self, message: &OutboundMessage) -> Result<PublishAck, PublishError> {
        if self.inner.fail_publish.load(Ordering::SeqCst) {
            return Err(PublishError::Publish("memory bus rejected publish".to_string()));
        }

        let mut sequences = lock(&self.inner.sequences);
        if let Some(&sequence) = sequences.get(&message.message_id) {
            return Ok(PublishAck {
                stream: STREAM.to_string(),
                sequence,
                duplicate: true,
            });
        }

        let mut messages = lock(&self.inner.messages);
        messages.push(message.clone());
        let sequence = messages.len() as u64;
        sequences.insert(message.message_id.clone(), sequence);

        Ok(PublishAck {
            stream: STREAM.to_string(),
            sequence,
            duplicate: false,
        })
    }
}

// Poisoning is ignored: every critical section leaves the data consistent
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
