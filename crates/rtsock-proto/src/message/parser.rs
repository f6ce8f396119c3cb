use bytes::BytesMut;

use super::KernelMessage;
use crate::{error::DecodeError, header::MessageHeader, wire_encoding::WireDecode};

/// A parser to split [`KernelMessage`]s off a [`BytesMut`] holding data read from a
/// routing socket.
///
/// Every message starts with its total length, so any number of messages, or a partial
/// message, may be present in the buffer.
#[derive(Debug, Default)]
pub struct MessageParser {
    dropped: u64,
}

impl MessageParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of malformed messages dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Parses the next message available in the buffer.
    ///
    /// Returns `Ok(None)` if the buffer does not yet hold a complete message. A malformed
    /// message is removed from the buffer before its error is returned, so parsing can
    /// continue with the next message.
    pub fn parse(&mut self, data: &mut BytesMut) -> Result<Option<KernelMessage>, DecodeError> {
        let Some((declared, _)) = MessageHeader::peek_length_and_version(data) else {
            return Ok(None);
        };

        let length = usize::from(declared);
        if length < MessageHeader::PREFIX_LENGTH {
            // The length can not be trusted to find the next message.
            let actual = data.len();
            data.clear();
            self.dropped += 1;
            return Err(DecodeError::LengthMismatch { declared, actual });
        }
        if data.len() < length {
            return Ok(None);
        }

        let mut message = data.split_to(length).freeze();
        KernelMessage::decode(&mut message).map(Some).inspect_err(|error| {
            self.dropped += 1;
            tracing::warn!(%error, length, "dropping malformed routing message");
        })
    }
}
