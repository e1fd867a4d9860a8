use futures::stream::{BoxStream, StreamExt};
use lapin::{
    message::Delivery,
    options::{BasicConsumeOptions, QueueBindOptions, QueueDeclareOptions},
    types::{AMQPValue, FieldTable},
    Channel, Connection, ConnectionProperties,
};
use tracing::{debug, info, warn};

use super::errors::{RabbitMQError, Result};
use super::publisher::ExchangePublisher;
use crate::message::Message;

/// Per-message TTL set on auto-declared queues.
pub const MESSAGE_TTL_MS: i32 = 300_000;

const REPLY_SUCCESS: u16 = 200;

/// Lazy, unbounded sequence of delivered messages. Ends when the channel or
/// connection goes away.
pub type DeliveryStream = BoxStream<'static, Result<Message>>;

/// One connection and one channel, held for the lifetime of the process.
pub struct Session {
    connection: Connection,
    channel: Channel,
}

impl Session {
    pub async fn connect(uri: &str) -> Result<Self> {
        info!("Connecting to RabbitMQ");
        let connection = Connection::connect(uri, ConnectionProperties::default())
            .await
            .map_err(RabbitMQError::Connect)?;
        debug!("Successfully connected to RabbitMQ");

        let channel = connection
            .create_channel()
            .await
            .map_err(RabbitMQError::OpenChannel)?;
        debug!(channel_id = channel.id(), "Channel opened");

        Ok(Self { connection, channel })
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Declares a short-lived queue and binds it to `exchange`.
    ///
    /// Returns the queue name as confirmed by the broker.
    pub async fn declare_and_bind(&self, queue: &str, exchange: &str, routing_key: &str) -> Result<String> {
        let declared = self
            .channel
            .queue_declare(queue, queue_declare_options(), queue_arguments())
            .await
            .map_err(|source| RabbitMQError::DeclareQueue {
                queue: queue.to_string(),
                source,
            })?;
        let name = declared.name().as_str().to_string();
        info!(queue = %name, messages = declared.message_count(), "Queue declared");

        self.channel
            .queue_bind(
                &name,
                exchange,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| RabbitMQError::BindQueue {
                queue: name.clone(),
                exchange: exchange.to_string(),
                source,
            })?;
        info!(queue = %name, exchange, routing_key, "Queue bound");

        Ok(name)
    }

    /// Starts an auto-ack consumer on `queue`.
    ///
    /// Every delivery counts as acknowledged the moment it arrives, whether
    /// or not it is written out afterwards.
    pub async fn consume(&self, queue: &str) -> Result<DeliveryStream> {
        let consumer = self
            .channel
            .basic_consume(queue, "", consume_options(), FieldTable::default())
            .await
            .map_err(|source| RabbitMQError::Consume {
                queue: queue.to_string(),
                source,
            })?;
        info!(queue, tag = ?consumer.tag(), "Started consuming");

        Ok(consumer
            .map(|delivery| delivery.map(message_from).map_err(RabbitMQError::Delivery))
            .boxed())
    }

    pub fn publisher(&self, exchange: &str, routing_key: &str) -> ExchangePublisher {
        ExchangePublisher::new(self.channel.clone(), exchange, routing_key)
    }

    /// Closes the channel, then the connection. Failures are only logged;
    /// the broker may already have torn both down.
    pub async fn close(self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "Closing rmqdump").await {
            warn!("Failed to close channel: {}", e);
        }
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "Closing rmqdump").await {
            warn!("Failed to close connection: {}", e);
        }
        debug!("Session closed");
    }
}

fn queue_declare_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        passive: false,
        durable: false,
        exclusive: false,
        auto_delete: true,
        nowait: false,
    }
}

fn queue_arguments() -> FieldTable {
    let mut args = FieldTable::default();
    args.insert("x-message-ttl".into(), AMQPValue::LongInt(MESSAGE_TTL_MS));
    args
}

fn consume_options() -> BasicConsumeOptions {
    BasicConsumeOptions {
        no_local: false,
        no_ack: true,
        exclusive: false,
        nowait: false,
    }
}

fn message_from(delivery: Delivery) -> Message {
    let content_type = delivery
        .properties
        .content_type()
        .as_ref()
        .map(|ct| ct.as_str().to_string())
        .unwrap_or_default();
    Message::new(content_type, delivery.data)
}
