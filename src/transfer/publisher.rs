use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tracing::{debug, error, info, warn};

use crate::config::LineFormat;
use crate::errors::{DumpError, Result};
use crate::rabbitmq::MessagePublisher;

/// Longest accepted input line, terminator excluded.
pub const MAX_LINE_LEN: usize = 512 * 1024;

/// Publishes every non-blank line of `input` until EOF.
///
/// A line that fails to decode, or a publish call that fails, is logged and
/// dropped. Reading errors, including an over-long line, end the loop.
pub async fn publish_lines<R, P>(input: R, format: LineFormat, publisher: &P) -> Result<()>
where
    R: AsyncRead + Unpin,
    P: MessagePublisher + ?Sized,
{
    let codec = AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_LEN);
    let mut lines = FramedRead::new(input, codec);

    while let Some(line) = lines.next().await {
        let line = line.map_err(|e| match e {
            AnyDelimiterCodecError::MaxChunkLengthExceeded => DumpError::LineTooLong(MAX_LINE_LEN),
            AnyDelimiterCodecError::Io(e) => DumpError::Io(e),
        })?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
        if line.is_empty() {
            continue;
        }

        let message = match format.decode_line(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(line = %String::from_utf8_lossy(line), "Skipping line: {}", e);
                continue;
            }
        };

        if let Err(e) = publisher.publish(&message).await {
            error!("{}", e);
            continue;
        }
        debug!(content_type = %message.content_type, bytes = message.body.len(), "Line published");
    }

    info!("Input exhausted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use crate::rabbitmq::{RabbitMQError, Result as RabbitResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        published: Mutex<Vec<Message>>,
        attempts: Mutex<usize>,
        reject_body: Option<Vec<u8>>,
    }

    impl Recorder {
        fn rejecting(body: &[u8]) -> Self {
            Recorder {
                reject_body: Some(body.to_vec()),
                ..Recorder::default()
            }
        }

        fn published(&self) -> Vec<Message> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MessagePublisher for Recorder {
        async fn publish(&self, message: &Message) -> RabbitResult<()> {
            *self.attempts.lock().unwrap() += 1;
            if self.reject_body.as_deref() == Some(message.body.as_slice()) {
                return Err(RabbitMQError::Publish(lapin::Error::ChannelsLimitReached));
            }
            self.published.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_plain_lines_are_published_verbatim() {
        let recorder = Recorder::default();
        let input: &[u8] = b"{\"a\":1}\nplain text\n";

        publish_lines(input, LineFormat::Plain, &recorder).await.unwrap();

        assert_eq!(
            recorder.published(),
            vec![
                Message::new("application/json", "{\"a\":1}"),
                Message::new("application/json", "plain text"),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let recorder = Recorder::default();
        let input: &[u8] = b"\n\nfirst\n\r\n\nsecond\n\n";

        publish_lines(input, LineFormat::Plain, &recorder).await.unwrap();

        let bodies: Vec<_> = recorder.published().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[tokio::test]
    async fn test_crlf_and_unterminated_last_line() {
        let recorder = Recorder::default();
        let input: &[u8] = b"one\r\ntwo";

        publish_lines(input, LineFormat::Plain, &recorder).await.unwrap();

        let bodies: Vec<_> = recorder.published().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[tokio::test]
    async fn test_binary_lines_decode_envelopes() {
        let recorder = Recorder::default();
        let input: &[u8] = b"{\"ctype\": \"text/plain\", \"b64body\": \"aGVsbG8=\"}\n";

        publish_lines(input, LineFormat::Binary, &recorder).await.unwrap();

        assert_eq!(recorder.published(), vec![Message::new("text/plain", "hello")]);
    }

    #[tokio::test]
    async fn test_malformed_binary_lines_do_not_stop_the_loop() {
        let recorder = Recorder::default();
        let input: &[u8] = b"not json\n\
            {\"ctype\": \"a/b\", \"b64body\": \"%%%\"}\n\
            {\"ctype\": \"a/b\", \"b64body\": \"b2s=\"}\n";

        publish_lines(input, LineFormat::Binary, &recorder).await.unwrap();

        assert_eq!(recorder.published(), vec![Message::new("a/b", "ok")]);
        assert_eq!(*recorder.attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_publish_errors_are_not_fatal() {
        let recorder = Recorder::rejecting(b"bad");
        let input: &[u8] = b"good\nbad\nalso good\n";

        publish_lines(input, LineFormat::Plain, &recorder).await.unwrap();

        let bodies: Vec<_> = recorder.published().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec![b"good".to_vec(), b"also good".to_vec()]);
        assert_eq!(*recorder.attempts.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let recorder = Recorder::default();
        let mut input = vec![b'x'; MAX_LINE_LEN];
        input.push(b'\n');

        publish_lines(input.as_slice(), LineFormat::Plain, &recorder).await.unwrap();

        assert_eq!(recorder.published()[0].body.len(), MAX_LINE_LEN);
    }

    #[tokio::test]
    async fn test_overlong_line_is_fatal() {
        let recorder = Recorder::default();
        let mut input = b"short\n".to_vec();
        input.extend(vec![b'x'; MAX_LINE_LEN + 1]);
        input.extend_from_slice(b"\nnever\n");

        let err = publish_lines(input.as_slice(), LineFormat::Plain, &recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, DumpError::LineTooLong(MAX_LINE_LEN)));
        let bodies: Vec<_> = recorder.published().into_iter().map(|m| m.body).collect();
        assert_eq!(bodies, vec![b"short".to_vec()]);
    }
}
