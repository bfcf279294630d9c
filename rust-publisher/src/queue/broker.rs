//! Broker abstraction and its RabbitMQ implementation.
//!
//! The publisher only talks to these traits. [`AmqpConnector`] backs them with
//! lapin; tests back them with an in-memory fake.

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tracing::debug;

use super::types::{SendOutcome, CONTENT_TYPE, PERSISTENT_DELIVERY_MODE};
use crate::error::BoxError;

/// AMQP reply code used for a clean close.
pub const REPLY_SUCCESS: u16 = 200;

/// Opens sessions to a broker.
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: BrokerConnection;

    async fn connect(&self, uri: &str) -> Result<Self::Connection, BoxError>;
}

/// An open broker session.
#[async_trait]
pub trait BrokerConnection: Send + Sync {
    type Channel: BrokerChannel;

    async fn create_channel(&self) -> Result<Self::Channel, BoxError>;

    async fn close(&self) -> Result<(), BoxError>;
}

/// A channel on an open session.
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Switch the channel to publisher-confirm mode.
    async fn enable_confirms(&self) -> Result<(), BoxError>;

    /// Declare `name` as a durable queue. Succeeds when an equivalent queue exists.
    async fn declare_durable_queue(&self, name: &str) -> Result<(), BoxError>;

    /// Send `body` as a persistent message routed straight to `queue`.
    async fn send_persistent(&self, queue: &str, body: &[u8]) -> Result<SendOutcome, BoxError>;

    async fn close(&self) -> Result<(), BoxError>;
}

/// Connector backed by lapin.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpConnector;

pub struct AmqpConnection {
    inner: Connection,
}

pub struct AmqpChannel {
    inner: Channel,
}

#[async_trait]
impl Connector for AmqpConnector {
    type Connection = AmqpConnection;

    async fn connect(&self, uri: &str) -> Result<AmqpConnection, BoxError> {
        let inner = Connection::connect(uri, ConnectionProperties::default()).await?;
        Ok(AmqpConnection { inner })
    }
}

#[async_trait]
impl BrokerConnection for AmqpConnection {
    type Channel = AmqpChannel;

    async fn create_channel(&self) -> Result<AmqpChannel, BoxError> {
        let inner = self.inner.create_channel().await?;
        debug!(channel_id = inner.id(), "rabbitmq_channel_created");
        Ok(AmqpChannel { inner })
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.inner.close(REPLY_SUCCESS, "Normal shutdown").await?;
        Ok(())
    }
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn enable_confirms(&self) -> Result<(), BoxError> {
        self.inner
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        Ok(())
    }

    async fn declare_durable_queue(&self, name: &str) -> Result<(), BoxError> {
        self.inner
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    async fn send_persistent(&self, queue: &str, body: &[u8]) -> Result<SendOutcome, BoxError> {
        let confirmation = self
            .inner
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                body,
                BasicProperties::default()
                    .with_delivery_mode(PERSISTENT_DELIVERY_MODE)
                    .with_content_type(CONTENT_TYPE.into()),
            )
            .await?
            .await?;

        // NotRequested means confirms are off; the client took the message.
        Ok(match confirmation {
            Confirmation::Nack(_) => SendOutcome::Rejected,
            Confirmation::Ack(_) | Confirmation::NotRequested => SendOutcome::Accepted,
        })
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.inner.close(REPLY_SUCCESS, "Normal shutdown").await?;
        Ok(())
    }
}
