// src/rabbitmq/mod.rs
// Broker plumbing on top of lapin

pub mod errors;
pub mod publisher;
pub mod session;

pub use errors::{RabbitMQError, Result};
pub use publisher::{ExchangePublisher, MessagePublisher};
pub use session::{DeliveryStream, Session};
