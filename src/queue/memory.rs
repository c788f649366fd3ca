//! In-memory queue gateway for tests and development
//!
//! Models just enough of the broker to exercise the relay end to end: named
//! queues holding FIFO messages, and explicit exchange/route bindings.
//! Publishing to a route nothing is bound to fails, mirroring an
//! unconfirmed delivery on the real broker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::{RelayError, Result};
use crate::queue::QueueGateway;

#[derive(Debug, Clone)]
struct StoredMessage {
    id: Uuid,
    body: Vec<u8>,
    enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
struct Binding {
    exchange: String,
    routing_key: String,
    queue: String,
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, VecDeque<StoredMessage>>,
    bindings: Vec<Binding>,
}

#[derive(Clone, Default)]
pub struct MemoryGateway {
    state: Arc<RwLock<BrokerState>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueGateway for MemoryGateway {
    async fn publish(&self, exchange: &str, route: &str, payload: &[u8]) -> Result<()> {
        let mut state = self.state.write().unwrap();

        let targets: Vec<String> = state
            .bindings
            .iter()
            .filter(|b| b.exchange == exchange && b.routing_key == route)
            .map(|b| b.queue.clone())
            .collect();

        if targets.is_empty() {
            return Err(RelayError::BrokerError(format!(
                "publish to exchange '{}' route '{}' was not confirmed: no queue bound",
                exchange, route
            )));
        }

        for queue in targets {
            let message = StoredMessage {
                id: Uuid::now_v7(),
                body: payload.to_vec(),
                enqueued_at: Utc::now(),
            };
            tracing::debug!(
                "Queued message {} on '{}' at {}",
                message.id,
                queue,
                message.enqueued_at
            );
            state.queues.entry(queue).or_default().push_back(message);
        }
        Ok(())
    }

    async fn declare_topology(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.queues.entry(name.to_string()).or_default();
        let binding = Binding {
            exchange: name.to_string(),
            routing_key: name.to_string(),
            queue: name.to_string(),
        };
        if !state.bindings.contains(&binding) {
            state.bindings.push(binding);
        }
        Ok(())
    }

    async fn message_count(&self, queue: &str) -> Result<u32> {
        let state = self.state.read().unwrap();
        let messages = state
            .queues
            .get(queue)
            .ok_or_else(|| RelayError::BrokerError(format!("no queue named '{}'", queue)))?;
        Ok(messages.len() as u32)
    }

    async fn read_one(&self, queue: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.write().unwrap();
        let messages = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| RelayError::BrokerError(format!("no queue named '{}'", queue)))?;
        Ok(messages.pop_front().map(|m| m.body))
    }

    async fn purge(&self, queue: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        let messages = state
            .queues
            .get_mut(queue)
            .ok_or_else(|| RelayError::BrokerError(format!("no queue named '{}'", queue)))?;
        messages.clear();
        Ok(())
    }

    async fn delete_topology(&self, queue: &str) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.queues.remove(queue);
        state
            .bindings
            .retain(|b| b.queue != queue && b.exchange != queue);
        Ok(())
    }
}
