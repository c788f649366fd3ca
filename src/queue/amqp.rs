//! RabbitMQ-backed queue gateway
//!
//! Connections are scoped to a single operation: open, enable publisher
//! confirms, cap in-flight deliveries at one, do the work, close. The close
//! runs on the failure path too, before the operation's result is returned,
//! so a broken publish never leaks a connection.

use async_trait::async_trait;
use lapin::options::{
    BasicGetOptions, BasicPublishOptions, BasicQosOptions, ConfirmSelectOptions,
    ExchangeDeclareOptions, ExchangeDeleteOptions, QueueBindOptions, QueueDeclareOptions,
    QueueDeleteOptions, QueuePurgeOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::queue::QueueGateway;

pub struct AmqpGateway {
    url: String,
}

impl AmqpGateway {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

fn broker_err(e: lapin::Error) -> RelayError {
    RelayError::BrokerError(e.to_string())
}

/// One connection + channel, configured for single-message publishing.
struct BrokerSession {
    connection: Connection,
    channel: Channel,
}

impl BrokerSession {
    async fn open(url: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(broker_err)?;
        let channel = connection.create_channel().await.map_err(broker_err)?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(broker_err)?;
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(broker_err)?;
        Ok(Self { connection, channel })
    }

    /// Close the connection; failures at this point only get logged.
    async fn close(self) {
        if let Err(e) = self.connection.close(200, "done").await {
            debug!("Broker connection close failed: {}", e);
        }
    }

    async fn publish(&self, exchange: &str, route: &str, payload: &[u8]) -> Result<()> {
        let confirmation = self
            .channel
            .basic_publish(
                exchange,
                route,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default(),
            )
            .await
            .map_err(broker_err)?
            .await
            .map_err(broker_err)?;

        match confirmation {
            Confirmation::Nack(_) => Err(RelayError::BrokerError(format!(
                "publish to exchange '{}' route '{}' was not confirmed",
                exchange, route
            ))),
            _ => Ok(()),
        }
    }

    async fn declare_topology(&self, name: &str) -> Result<()> {
        self.channel
            .exchange_declare(
                name,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: false,
                    auto_delete: false,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_err)?;
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: false,
                    auto_delete: false,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_err)?;
        self.channel
            .queue_bind(name, name, name, QueueBindOptions::default(), FieldTable::default())
            .await
            .map_err(broker_err)?;
        Ok(())
    }

    async fn message_count(&self, queue: &str) -> Result<u32> {
        let queue = self
            .channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    passive: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(broker_err)?;
        Ok(queue.message_count())
    }

    async fn read_one(&self, queue: &str) -> Result<Option<Vec<u8>>> {
        let message = self
            .channel
            .basic_get(queue, BasicGetOptions { no_ack: true })
            .await
            .map_err(broker_err)?;
        Ok(message.map(|m| m.delivery.data))
    }

    async fn purge(&self, queue: &str) -> Result<()> {
        self.channel
            .queue_purge(queue, QueuePurgeOptions::default())
            .await
            .map_err(broker_err)?;
        Ok(())
    }

    async fn delete_topology(&self, queue: &str) -> Result<()> {
        self.channel
            .queue_delete(queue, QueueDeleteOptions::default())
            .await
            .map_err(broker_err)?;
        self.channel
            .exchange_delete(queue, ExchangeDeleteOptions::default())
            .await
            .map_err(broker_err)?;
        Ok(())
    }
}

#[async_trait]
impl QueueGateway for AmqpGateway {
    async fn publish(&self, exchange: &str, route: &str, payload: &[u8]) -> Result<()> {
        let session = BrokerSession::open(&self.url).await?;
        let result = session.publish(exchange, route, payload).await;
        session.close().await;
        result
    }

    async fn declare_topology(&self, name: &str) -> Result<()> {
        let session = BrokerSession::open(&self.url).await?;
        let result = session.declare_topology(name).await;
        session.close().await;
        result
    }

    async fn message_count(&self, queue: &str) -> Result<u32> {
        let session = BrokerSession::open(&self.url).await?;
        let result = session.message_count(queue).await;
        session.close().await;
        result
    }

    async fn read_one(&self, queue: &str) -> Result<Option<Vec<u8>>> {
        let session = BrokerSession::open(&self.url).await?;
        let result = session.read_one(queue).await;
        session.close().await;
        result
    }

    async fn purge(&self, queue: &str) -> Result<()> {
        let session = BrokerSession::open(&self.url).await?;
        let result = session.purge(queue).await;
        session.close().await;
        result
    }

    async fn delete_topology(&self, queue: &str) -> Result<()> {
        let session = BrokerSession::open(&self.url).await?;
        let result = session.delete_topology(queue).await;
        session.close().await;
        result
    }
}
