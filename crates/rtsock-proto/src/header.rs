//! The routing-message header, `struct rt_msghdr`.
//!
//! The encoded format of the header is
//!
//! ```plain
//!  2-bytes : rtm_msglen  (total message length including addresses)
//!  1-byte  : rtm_version (RTM_VERSION)
//!  1-byte  : rtm_type
//!  2-bytes : rtm_index   (interface index)
//!  2-bytes : padding
//!  4-bytes : rtm_flags
//!  4-bytes : rtm_addrs   (bitmask of address entries that follow)
//!  4-bytes : rtm_pid
//!  4-bytes : rtm_seq
//!  4-bytes : rtm_errno
//!  4-bytes : rtm_use
//!  4-bytes : rtm_inits
//! 56-bytes : rtm_rmx     (route metrics)
//! ```
//!
//! Integer fields are in host byte order, as the kernel reads them directly from memory.

use bytes::{Buf, BufMut};

use crate::{
    abi::{self, rtm},
    error::{DecodeError, InadequateBufferSize},
    flags::{AddressFlags, RouteFlags},
    wire_encoding::{WireDecode, WireEncode},
};

/// The routing operations that may be requested of the kernel.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Add a route, `RTM_ADD`.
    Add = rtm::ADD,
    /// Delete a route, `RTM_DELETE`.
    Delete = rtm::DELETE,
    /// Change the gateway, metrics or flags of a route, `RTM_CHANGE`.
    Change = rtm::CHANGE,
    /// Look up a route, `RTM_GET`.
    Get = rtm::GET,
}

impl MessageType {
    /// All message types that can be sent in a route request.
    pub const ALL: [MessageType; 4] = [Self::Add, Self::Delete, Self::Change, Self::Get];
}

impl From<MessageType> for u8 {
    fn from(value: MessageType) -> Self {
        value as u8
    }
}

/// Error returned when converting a byte that is not a requestable message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unsupported routing message type {0}")]
pub struct UnsupportedMessageType(pub u8);

impl TryFrom<u8> for MessageType {
    type Error = UnsupportedMessageType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            rtm::ADD => Ok(Self::Add),
            rtm::DELETE => Ok(Self::Delete),
            rtm::CHANGE => Ok(Self::Change),
            rtm::GET => Ok(Self::Get),
            other => Err(UnsupportedMessageType(other)),
        }
    }
}

/// Route metrics, `struct rt_metrics`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RouteMetrics {
    /// Kernel must leave these values alone.
    pub locks: u32,
    /// MTU for this path.
    pub mtu: u32,
    /// Max hops expected.
    pub hopcount: u32,
    /// Lifetime for route, e.g. redirect.
    pub expire: i32,
    /// Inbound delay-bandwidth product.
    pub recvpipe: u32,
    /// Outbound delay-bandwidth product.
    pub sendpipe: u32,
    /// Outbound gateway buffer limit.
    pub ssthresh: u32,
    /// Estimated round trip time.
    pub rtt: u32,
    /// Estimated rtt variance.
    pub rttvar: u32,
    /// Packets sent using this route.
    pub pksent: u32,
    /// Route state.
    pub state: u32,
}

impl RouteMetrics {
    /// The length of the encoded metrics, including three reserved words.
    pub const LENGTH: usize = 56;
    const FILLER_LENGTH: usize = 12;

    fn encode_to(&self, buffer: &mut impl BufMut) {
        buffer.put_u32_ne(self.locks);
        buffer.put_u32_ne(self.mtu);
        buffer.put_u32_ne(self.hopcount);
        buffer.put_i32_ne(self.expire);
        buffer.put_u32_ne(self.recvpipe);
        buffer.put_u32_ne(self.sendpipe);
        buffer.put_u32_ne(self.ssthresh);
        buffer.put_u32_ne(self.rtt);
        buffer.put_u32_ne(self.rttvar);
        buffer.put_u32_ne(self.pksent);
        buffer.put_u32_ne(self.state);
        buffer.put_bytes(0, Self::FILLER_LENGTH);
    }

    fn decode(data: &mut impl Buf) -> Self {
        let metrics = Self {
            locks: data.get_u32_ne(),
            mtu: data.get_u32_ne(),
            hopcount: data.get_u32_ne(),
            expire: data.get_i32_ne(),
            recvpipe: data.get_u32_ne(),
            sendpipe: data.get_u32_ne(),
            ssthresh: data.get_u32_ne(),
            rtt: data.get_u32_ne(),
            rttvar: data.get_u32_ne(),
            pksent: data.get_u32_ne(),
            state: data.get_u32_ne(),
        };
        data.advance(Self::FILLER_LENGTH);
        metrics
    }
}

/// Routing-message header, `struct rt_msghdr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Total length of the message, including the address entries.
    pub length: u16,
    /// The message format version.
    pub version: u8,
    /// The raw message type, see [`crate::abi::rtm`].
    pub message_type: u8,
    /// Index of the interface associated with the route.
    pub index: u16,
    /// Route flags.
    pub flags: RouteFlags,
    /// Bitmask of the address entries following the header.
    pub addrs: AddressFlags,
    /// Identifier of the process that sent the message.
    pub pid: i32,
    /// Sequence number chosen by the sender to identify the action.
    pub seq: i32,
    /// Reason the request failed, zero on success.
    pub errno: i32,
    /// Number of times the route was used.
    pub use_count: i32,
    /// Which metrics are being initialized.
    pub inits: u32,
    /// The metrics themselves.
    pub metrics: RouteMetrics,
}

impl MessageHeader {
    /// The length of an encoded header.
    pub const LENGTH: usize = 36 + RouteMetrics::LENGTH;

    /// The minimum number of bytes needed to read the length and version of a message.
    pub const PREFIX_LENGTH: usize = 4;

    /// Reads the declared message length and version without advancing the buffer.
    ///
    /// Returns `None` if fewer than [`Self::PREFIX_LENGTH`] bytes are available.
    pub fn peek_length_and_version(data: &[u8]) -> Option<(u16, u8)> {
        match data {
            [l0, l1, version, _, ..] => Some((u16::from_ne_bytes([*l0, *l1]), *version)),
            _ => None,
        }
    }

    /// Returns the message type if it is one that can be requested.
    pub fn request_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.message_type).ok()
    }
}

impl WireEncode for MessageHeader {
    type Error = InadequateBufferSize;

    #[inline]
    fn encoded_length(&self) -> usize {
        Self::LENGTH
    }

    fn encode_to<T: BufMut>(&self, buffer: &mut T) -> Result<(), Self::Error> {
        if buffer.remaining_mut() < Self::LENGTH {
            return Err(InadequateBufferSize);
        }

        buffer.put_u16_ne(self.length);
        buffer.put_u8(self.version);
        buffer.put_u8(self.message_type);
        buffer.put_u16_ne(self.index);
        buffer.put_u16(0);
        buffer.put_u32_ne(self.flags.bits());
        buffer.put_u32_ne(self.addrs.bits());
        buffer.put_i32_ne(self.pid);
        buffer.put_i32_ne(self.seq);
        buffer.put_i32_ne(self.errno);
        buffer.put_i32_ne(self.use_count);
        buffer.put_u32_ne(self.inits);
        self.metrics.encode_to(buffer);

        Ok(())
    }
}

impl<T: Buf> WireDecode<T> for MessageHeader {
    type Error = DecodeError;

    fn decode(data: &mut T) -> Result<Self, Self::Error> {
        if data.remaining() < Self::LENGTH {
            return Err(DecodeError::MessageEmptyOrTruncated);
        }

        let length = data.get_u16_ne();
        let version = data.get_u8();
        if version != abi::RTM_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        let message_type = data.get_u8();
        let index = data.get_u16_ne();
        data.advance(2);

        Ok(Self {
            length,
            version,
            message_type,
            index,
            flags: RouteFlags::from_bits_retain(data.get_u32_ne()),
            addrs: AddressFlags::from_bits_retain(data.get_u32_ne()),
            pid: data.get_i32_ne(),
            seq: data.get_i32_ne(),
            errno: data.get_i32_ne(),
            use_count: data.get_i32_ne(),
            inits: data.get_u32_ne(),
            metrics: RouteMetrics::decode(data),
        })
    }
}
