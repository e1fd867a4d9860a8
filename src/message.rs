use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LineFormat;

/// Content type stamped on every message published in plain mode.
pub const PLAIN_CONTENT_TYPE: &str = "application/json";

/// A broker message as seen by this tool: a content type and opaque bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Line representation of a message in binary mode.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BinaryEnvelope {
    #[serde(default)]
    pub ctype: String,
    #[serde(default)]
    pub b64body: String,
}

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("Failed to unmarshal JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode message: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Message {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Message {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

impl From<&Message> for BinaryEnvelope {
    fn from(message: &Message) -> Self {
        BinaryEnvelope {
            ctype: message.content_type.clone(),
            b64body: STANDARD.encode(&message.body),
        }
    }
}

impl TryFrom<BinaryEnvelope> for Message {
    type Error = EnvelopeError;

    fn try_from(envelope: BinaryEnvelope) -> Result<Self, Self::Error> {
        let body = STANDARD.decode(envelope.b64body.as_bytes())?;
        Ok(Message::new(envelope.ctype, body))
    }
}

impl LineFormat {
    /// Turns one input line (without its terminator) into a message.
    pub fn decode_line(self, line: &[u8]) -> Result<Message, EnvelopeError> {
        match self {
            LineFormat::Plain => Ok(Message::new(PLAIN_CONTENT_TYPE, line)),
            LineFormat::Binary => {
                let envelope: BinaryEnvelope = serde_json::from_slice(line)?;
                Message::try_from(envelope)
            }
        }
    }

    /// Renders a message as one newline-terminated output line.
    ///
    /// Plain mode writes the body verbatim, so a body containing `\n`
    /// spans several output lines.
    pub fn encode_line(self, message: &Message) -> Result<Vec<u8>, EnvelopeError> {
        let mut line = match self {
            LineFormat::Plain => message.body.clone(),
            LineFormat::Binary => {
                let envelope = BinaryEnvelope::from(message);
                format!(
                    "{{\"ctype\": {}, \"b64body\": {}}}",
                    serde_json::to_string(&envelope.ctype)?,
                    serde_json::to_string(&envelope.b64body)?,
                )
                .into_bytes()
            }
        };
        line.push(b'\n');
        Ok(line)
    }
}
