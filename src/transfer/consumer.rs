use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::config::LineFormat;
use crate::errors::Result;
use crate::message::Message;
use crate::rabbitmq;

/// Writes every delivered message to `output`, one line each, until the
/// delivery stream ends.
///
/// A stream error is treated like the broker closing the stream. A failed
/// write is fatal; the message it carried was already acknowledged.
pub async fn dump_messages<S, W>(mut deliveries: S, format: LineFormat, mut output: W) -> Result<()>
where
    S: Stream<Item = rabbitmq::Result<Message>> + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(delivery) = deliveries.next().await {
        let message = match delivery {
            Ok(message) => message,
            Err(e) => {
                warn!("{}", e);
                break;
            }
        };

        let line = match format.encode_line(&message) {
            Ok(line) => line,
            Err(e) => {
                error!(content_type = %message.content_type, "Failed to encode message: {}", e);
                continue;
            }
        };

        output.write_all(&line).await?;
        output.flush().await?;
        debug!(content_type = %message.content_type, bytes = message.body.len(), "Message written");
    }

    info!("Delivery stream closed");
    Ok(())
}
