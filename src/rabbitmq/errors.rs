// src/rabbitmq/errors.rs

use lapin::Error as LapinError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RabbitMQError {
    #[error("Failed to connect to RabbitMQ: {0}")]
    Connect(#[source] LapinError),

    #[error("Failed to open a channel: {0}")]
    OpenChannel(#[source] LapinError),

    #[error("Failed to declare queue '{queue}': {source}")]
    DeclareQueue {
        queue: String,
        #[source]
        source: LapinError,
    },

    #[error("Failed to bind queue '{queue}' to exchange '{exchange}': {source}")]
    BindQueue {
        queue: String,
        exchange: String,
        #[source]
        source: LapinError,
    },

    #[error("Failed to register a consumer on queue '{queue}': {source}")]
    Consume {
        queue: String,
        #[source]
        source: LapinError,
    },

    #[error("Failed to publish message: {0}")]
    Publish(#[source] LapinError),

    #[error("Delivery stream failed: {0}")]
    Delivery(#[source] LapinError),
}

// Custom Result type for RabbitMQ operations
pub type Result<T> = std::result::Result<T, RabbitMQError>;
