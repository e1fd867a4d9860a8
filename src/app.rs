use tracing::{info, warn};

use crate::config::{ConfigError, Mode, Settings};
use crate::errors::Result;
use crate::rabbitmq::Session;
use crate::transfer::{dump_messages, publish_lines};

/// Connects, sets up topology if needed, and runs the transfer loop for the
/// configured mode until input ends, the broker closes the stream, or the
/// process is interrupted.
pub async fn run(settings: Settings) -> Result<()> {
    let session = Session::connect(&settings.uri).await?;

    let outcome = tokio::select! {
        outcome = transfer(&session, &settings) => outcome,
        _ = interrupted() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    session.close().await;
    outcome
}

async fn transfer(session: &Session, settings: &Settings) -> Result<()> {
    let binding = &settings.binding;

    match settings.mode {
        Mode::Publish => {
            let exchange = binding
                .exchange
                .as_deref()
                .ok_or(ConfigError::ExchangeRequired)?;
            let publisher = session.publisher(exchange, &binding.routing_key);
            info!(
                exchange = publisher.exchange(),
                routing_key = publisher.routing_key(),
                format = ?settings.format,
                "Publishing lines from stdin"
            );
            publish_lines(tokio::io::stdin(), settings.format, &publisher).await
        }
        Mode::Consume => {
            let queue = match binding.exchange.as_deref() {
                Some(exchange) => {
                    session
                        .declare_and_bind(&binding.queue, exchange, &binding.routing_key)
                        .await?
                }
                None => binding.queue.clone(),
            };
            let deliveries = session.consume(&queue).await?;
            dump_messages(deliveries, settings.format, tokio::io::stdout()).await
        }
    }
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
