//! One-shot RabbitMQ publisher.
//!
//! A run opens one connection and one channel, makes sure the queue exists,
//! sends the envelope once, then closes the channel and the connection. The
//! close steps run on every path once their resource exists, including when
//! an earlier step failed.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::broker::{BrokerChannel, BrokerConnection, Connector};
use super::types::{Envelope, SendOutcome};
use crate::config::Config;
use crate::error::{BoxError, PublishError, StepTimeout};
use crate::progress::{Progress, Silent};

/// Per-run publishing options.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub timeout: Duration,
    pub confirms: bool,
    pub pretty: bool,
}

impl From<&Config> for PublishOptions {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.broker_timeout(),
            confirms: config.publish_confirms,
            pretty: config.pretty_payload,
        }
    }
}

/// The serialized envelope and what the broker did with it.
#[derive(Debug, Clone)]
pub struct Published {
    pub body: Vec<u8>,
    pub outcome: SendOutcome,
}

/// Which resources were closed cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Teardown {
    pub channel_closed: bool,
    pub connection_closed: bool,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub queue: String,
    pub event_count: usize,
    pub body: Vec<u8>,
    pub outcome: SendOutcome,
    pub teardown: Teardown,
}

impl PublishReport {
    pub fn byte_length(&self) -> usize {
        self.body.len()
    }
}

/// Publishes a single envelope to a durable queue.
pub struct Publisher<C> {
    connector: C,
    url: String,
    queue: String,
    options: PublishOptions,
}

impl<C: Connector> Publisher<C> {
    pub fn new(connector: C, url: String, queue: String, options: PublishOptions) -> Self {
        Self {
            connector,
            url,
            queue,
            options,
        }
    }

    pub fn from_config(connector: C, config: &Config) -> Self {
        Self::new(
            connector,
            config.broker_url.clone(),
            config.queue_name.clone(),
            PublishOptions::from(config),
        )
    }

    /// Run the whole session for `envelope`: connect, declare, send, tear down.
    pub async fn publish_envelope(&self, envelope: &Envelope) -> Result<PublishReport, PublishError> {
        self.publish_envelope_with(envelope, &Silent).await
    }

    /// Same as [`Publisher::publish_envelope`], reporting milestones to `progress`.
    pub async fn publish_envelope_with(
        &self,
        envelope: &Envelope,
        progress: &dyn Progress,
    ) -> Result<PublishReport, PublishError> {
        let limit = self.options.timeout;

        info!(url_length = self.url.len(), "rabbitmq_connecting");

        let connection = bounded("connect", limit, self.connector.connect(&self.url))
            .await
            .map_err(PublishError::Connect)?;

        info!("rabbitmq_connected");
        progress.connected();

        let (channel, result) =
            match bounded("create_channel", limit, connection.create_channel()).await {
                Ok(channel) => {
                    let result = self.exchange(&channel, envelope, progress).await;
                    (Some(channel), result)
                }
                Err(e) => (None, Err(PublishError::Channel(e))),
            };

        let teardown = teardown(channel.as_ref(), &connection, limit).await;
        let published = result?;

        Ok(PublishReport {
            queue: self.queue.clone(),
            event_count: envelope.len(),
            body: published.body,
            outcome: published.outcome,
            teardown,
        })
    }

    async fn exchange<Ch: BrokerChannel>(
        &self,
        channel: &Ch,
        envelope: &Envelope,
        progress: &dyn Progress,
    ) -> Result<Published, PublishError> {
        let limit = self.options.timeout;

        if self.options.confirms {
            bounded("confirm_select", limit, channel.enable_confirms())
                .await
                .map_err(PublishError::Channel)?;
        }

        ensure_queue(channel, &self.queue, limit).await?;
        progress.queue_ready(&self.queue);

        publish(channel, &self.queue, envelope, self.options.pretty, limit, progress).await
    }
}

/// Declare `queue` as durable. Safe to repeat with the same parameters.
pub async fn ensure_queue<Ch: BrokerChannel>(
    channel: &Ch,
    queue: &str,
    limit: Duration,
) -> Result<(), PublishError> {
    bounded("queue_declare", limit, channel.declare_durable_queue(queue))
        .await
        .map_err(|source| PublishError::Queue {
            queue: queue.to_string(),
            source,
        })?;

    info!(queue = queue, durable = true, "rabbitmq_queue_declared");
    Ok(())
}

/// Serialize `envelope` and send it once as a persistent message.
///
/// `progress` sees the exact body before it goes out.
pub async fn publish<Ch: BrokerChannel>(
    channel: &Ch,
    queue: &str,
    envelope: &Envelope,
    pretty: bool,
    limit: Duration,
    progress: &dyn Progress,
) -> Result<Published, PublishError> {
    let body = envelope.to_body(pretty)?;
    progress.sending(&body);

    let outcome = bounded("basic_publish", limit, channel.send_persistent(queue, &body))
        .await
        .map_err(|source| PublishError::Send {
            queue: queue.to_string(),
            source,
        })?;

    match outcome {
        SendOutcome::Accepted => info!(
            queue = queue,
            event_count = envelope.len(),
            body_length = body.len(),
            "rabbitmq_envelope_published"
        ),
        SendOutcome::Rejected => warn!(
            queue = queue,
            event_count = envelope.len(),
            body_length = body.len(),
            "rabbitmq_envelope_rejected"
        ),
    }

    Ok(Published { body, outcome })
}

/// Close the channel (if opened), then the connection. Failures are logged only.
pub async fn teardown<K: BrokerConnection>(
    channel: Option<&K::Channel>,
    connection: &K,
    limit: Duration,
) -> Teardown {
    let mut result = Teardown::default();

    if let Some(ch) = channel {
        match bounded("channel_close", limit, ch.close()).await {
            Ok(()) => result.channel_closed = true,
            Err(e) => warn!(error = %e, "rabbitmq_channel_close_error"),
        }
    }

    match bounded("connection_close", limit, connection.close()).await {
        Ok(()) => result.connection_closed = true,
        Err(e) => warn!(error = %e, "rabbitmq_connection_close_error"),
    }

    info!(
        channel_closed = result.channel_closed,
        connection_closed = result.connection_closed,
        "rabbitmq_publisher_closed"
    );

    result
}

/// Await a broker step, failing it once `limit` elapses.
async fn bounded<T, F>(step: &'static str, limit: Duration, fut: F) -> Result<T, BoxError>
where
    F: Future<Output = Result<T, BoxError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Box::new(StepTimeout {
            step,
            millis: limit.as_millis() as u64,
        })),
    }
}
