// src/errors.rs

use thiserror::Error;

use crate::config::ConfigError;
use crate::rabbitmq::RabbitMQError;

#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    RabbitMQ(#[from] RabbitMQError),

    #[error("Input line exceeds the maximum length of {0} bytes")]
    LineTooLong(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DumpError>;
