// src/config.rs
use clap::Parser;
use rand::{distr::Alphanumeric, Rng};
use thiserror::Error;
use tracing::{debug, info};

/// Prefix of queue names generated for auto-declared queues.
pub const QUEUE_PREFIX: &str = "rmqdump-";

/// Number of random characters appended to [`QUEUE_PREFIX`].
pub const QUEUE_TOKEN_LEN: usize = 16;

pub const DEFAULT_ROUTING_KEY: &str = "#";

const USAGE_NOTES: &str = "\
<AMQP_URI> is a rabbitmq uri like amqp://rabbitmq:5672/

This tool works in consumer mode (default) or publisher mode (-p option).

In consumer mode there are 3 cases:
* -x specified, -q is not: autodeclare new queue with random name and bind to exchange by routing key
* -x specified, -q specified: autodeclare new queue with name from config and bind to exchange by routing key
* -x unspecified, -q specified: consume from existing queue, fail if it doesn't exist

In publisher mode you just have to specify an exchange.";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("existing queue name must be specified without exchange (-q is required when -x is not set)")]
    ExistingQueueRequired,

    #[error("exchange required in publisher mode (-x is required with -p)")]
    ExchangeRequired,
}

/// Raw command line, exactly as the user typed it.
#[derive(Parser, Debug, Clone)]
#[command(name = "rmqdump", version, about = "Dump a RabbitMQ queue to stdout, or publish stdin lines to an exchange")]
#[command(after_help = USAGE_NOTES)]
pub struct Cli {
    /// Publisher mode, read from stdin and publish to rabbitmq
    #[arg(short = 'p', long = "publisher")]
    pub publisher: bool,

    /// Queue to attach to
    #[arg(short = 'q', long, default_value = "")]
    pub queue: String,

    /// Exchange to bind to
    #[arg(short = 'x', long, default_value = "")]
    pub exchange: String,

    /// Routing key
    #[arg(short = 'k', long = "routing-key", default_value = DEFAULT_ROUTING_KEY)]
    pub routing_key: String,

    /// Assume binary messages, input/output format is {"ctype": "x", "b64body": "base64 body"}
    #[arg(short = 'b', long)]
    pub binary: bool,

    /// Broker URI
    #[arg(value_name = "AMQP_URI", env = "AMQP_ADDR")]
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Drain a queue and print every message body as a line.
    Consume,
    /// Read stdin lines and publish each one to an exchange.
    Publish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// One raw message body per line.
    Plain,
    /// One `{"ctype": .., "b64body": ..}` JSON object per line.
    Binary,
}

/// Where messages are consumed from, or published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBinding {
    /// Explicit or generated queue name. Always non-empty once validated.
    pub queue: String,

    /// `None` means "attach to an existing queue, declare nothing".
    pub exchange: Option<String>,

    pub routing_key: String,
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub uri: String,
    pub mode: Mode,
    pub format: LineFormat,
    pub binding: QueueBinding,
}

impl Settings {
    /// Validates the command line and resolves the queue name.
    ///
    /// Nothing here touches the network, so every configuration error
    /// surfaces before a connection is attempted.
    pub fn from_cli<R: Rng + ?Sized>(cli: Cli, rng: &mut R) -> Result<Self, ConfigError> {
        let exchange = Some(cli.exchange).filter(|x| !x.is_empty());
        let mode = if cli.publisher { Mode::Publish } else { Mode::Consume };

        if exchange.is_none() && cli.queue.is_empty() {
            return Err(ConfigError::ExistingQueueRequired);
        }
        if mode == Mode::Publish && exchange.is_none() {
            return Err(ConfigError::ExchangeRequired);
        }

        let queue = if cli.queue.is_empty() {
            let name = random_queue_name(rng);
            info!(queue = %name, "Generated queue name");
            name
        } else {
            cli.queue
        };

        let settings = Settings {
            uri: cli.uri,
            mode,
            format: if cli.binary { LineFormat::Binary } else { LineFormat::Plain },
            binding: QueueBinding {
                queue,
                exchange,
                routing_key: cli.routing_key,
            },
        };
        debug!(mode = ?settings.mode, format = ?settings.format, binding = ?settings.binding, "Settings resolved");

        Ok(settings)
    }
}

/// Builds `rmqdump-` followed by 16 random ASCII alphanumerics.
pub fn random_queue_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let token: String = (0..QUEUE_TOKEN_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect();
    format!("{QUEUE_PREFIX}{token}")
}
