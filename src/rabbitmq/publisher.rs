use async_trait::async_trait;
use lapin::{options::BasicPublishOptions, BasicProperties, Channel};
use tracing::debug;

use super::errors::{RabbitMQError, Result};
use crate::message::Message;

/// AMQP delivery mode 2: the broker writes the message to disk.
pub const PERSISTENT: u8 = 2;

/// Sink for messages produced by the publisher loop.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, message: &Message) -> Result<()>;
}

/// Publishes every message to one exchange under one routing key.
///
/// Publishing is non-mandatory: if nothing is bound to the exchange for the
/// routing key, the broker drops the message silently.
pub struct ExchangePublisher {
    channel: Channel,
    exchange: String,
    routing_key: String,
}

impl ExchangePublisher {
    pub fn new(channel: Channel, exchange: &str, routing_key: &str) -> Self {
        Self {
            channel,
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }
}

pub(crate) fn properties_for(message: &Message) -> BasicProperties {
    BasicProperties::default()
        .with_content_type(message.content_type.as_str().into())
        .with_delivery_mode(PERSISTENT)
        .with_timestamp(chrono::Utc::now().timestamp() as u64)
}

#[async_trait]
impl MessagePublisher for ExchangePublisher {
    async fn publish(&self, message: &Message) -> Result<()> {
        self.channel
            .basic_publish(
                &self.exchange,
                &self.routing_key,
                BasicPublishOptions {
                    mandatory: false,
                    immediate: false,
                },
                &message.body,
                properties_for(message),
            )
            .await
            .map_err(RabbitMQError::Publish)?;

        debug!(
            exchange = %self.exchange,
            routing_key = %self.routing_key,
            bytes = message.body.len(),
            "Published message"
        );
        Ok(())
    }
}
