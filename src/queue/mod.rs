//! Queue gateway over the message broker
//!
//! The relay only needs a thin capability: publish a payload to an
//! exchange/route with confirmed delivery, plus a handful of topology and
//! diagnostic operations used by tests and operational tooling. The trait
//! keeps the broker swappable: `AmqpGateway` talks to RabbitMQ, and
//! `MemoryGateway` backs the test suites.

pub mod amqp;
pub mod memory;

pub use amqp::AmqpGateway;
pub use memory::MemoryGateway;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait QueueGateway: Send + Sync {
    /// Publish a payload to an exchange with a routing key.
    ///
    /// Delivery is confirmed by the broker; an unconfirmed publish is a
    /// broker error. No retry is attempted here; webhook senders redeliver.
    async fn publish(&self, exchange: &str, route: &str, payload: &[u8]) -> Result<()>;

    /// Idempotently declare a topic exchange, a queue, and a binding, all
    /// sharing `name`. Non-durable, non-auto-deleted defaults; production
    /// durability is a deployment knob, not hard-coded here.
    async fn declare_topology(&self, name: &str) -> Result<()>;

    /// Number of messages currently waiting on the queue.
    async fn message_count(&self, queue: &str) -> Result<u32>;

    /// Take one message off the queue, acknowledging it implicitly.
    async fn read_one(&self, queue: &str) -> Result<Option<Vec<u8>>>;

    /// Drop every message waiting on the queue.
    async fn purge(&self, queue: &str) -> Result<()>;

    /// Delete the queue and its same-named exchange.
    async fn delete_topology(&self, queue: &str) -> Result<()>;
}
