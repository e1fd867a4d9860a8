//! Bridge between a RabbitMQ queue or exchange and line-oriented stdio.
//!
//! In consumer mode every delivered message becomes one line on stdout. In
//! publisher mode every non-blank stdin line becomes one published message.
//! Binary mode wraps message bytes in `{"ctype": .., "b64body": ..}`.

pub mod app;
pub mod config;
pub mod env;
pub mod errors;
pub mod message;
pub mod rabbitmq;
pub mod transfer;

pub use app::run;
pub use config::{Cli, LineFormat, Mode, QueueBinding, Settings};
pub use errors::{DumpError, Result};
pub use message::Message;
