//! Interface and interface-address messages.
//!
//! Both share the first four bytes with [`MessageHeader`][crate::header::MessageHeader] but
//! otherwise have their own header layouts. Interface messages use `struct if_msghdr`:
//!
//! ```plain
//!  2-bytes : ifm_msglen
//!  1-byte  : ifm_version
//!  1-byte  : ifm_type    (RTM_IFINFO)
//!  4-bytes : ifm_addrs
//!  4-bytes : ifm_flags   (IFF_*)
//!  2-bytes : ifm_index
//!  2-bytes : padding
//! 96-bytes : ifm_data    (struct if_data)
//! ```
//!
//! `RTM_IFINFO2` messages use `struct if_msghdr2`, which inserts four send-queue counters
//! before a 128-byte `struct if_data64`. Address messages use `struct ifa_msghdr`:
//!
//! ```plain
//!  2-bytes : ifam_msglen
//!  1-byte  : ifam_version
//!  1-byte  : ifam_type   (RTM_NEWADDR or RTM_DELADDR)
//!  4-bytes : ifam_addrs
//!  4-bytes : ifam_flags  (RTF_*)
//!  2-bytes : ifam_index
//!  2-bytes : padding
//!  4-bytes : ifam_metric
//! ```

use bytes::{Buf, BufMut};

use super::AddressSet;
use crate::{
    abi::{self, rtm},
    error::{DecodeError, InadequateBufferSize},
    flags::{AddressFlags, LinkFlags, RouteFlags},
    wire_encoding::{WireDecode, WireEncode},
};

/// Interface message header, `struct if_msghdr` or `struct if_msghdr2`.
///
/// Only the identifying fields and a few fields of the interface data are kept; the
/// traffic counters are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkHeader {
    /// Total length of the message, including the address entries.
    pub length: u16,
    /// The message format version.
    pub version: u8,
    /// The raw message type, `RTM_IFINFO` or `RTM_IFINFO2`.
    pub message_type: u8,
    /// Bitmask of the address entries following the header.
    pub addrs: AddressFlags,
    /// Interface flags.
    pub flags: LinkFlags,
    /// Index of the interface.
    pub index: u16,
    /// The interface type (`IFT_*`).
    pub link_type: u8,
    /// Maximum transmission unit of the interface.
    pub mtu: u32,
    /// Routing metric of the interface.
    pub metric: u32,
}

impl LinkHeader {
    /// The length of an encoded `if_msghdr`.
    pub const LENGTH: usize = 112;
    /// The length of an encoded `if_msghdr2`.
    pub const EXTENDED_LENGTH: usize = 160;

    const DATA_OFFSET: usize = 16;
    const EXTENDED_DATA_OFFSET: usize = 32;
    // `ifi_type` and the other one-byte fields precede `ifi_mtu` and `ifi_metric`.
    const DATA_PREFIX_LENGTH: usize = 16;

    /// Returns the encoded header length for the given message type, if it is an
    /// interface message.
    pub const fn length_for(message_type: u8) -> Option<usize> {
        match message_type {
            rtm::IFINFO => Some(Self::LENGTH),
            rtm::IFINFO2 => Some(Self::EXTENDED_LENGTH),
            _ => None,
        }
    }

    /// Returns true for `RTM_IFINFO2` messages.
    pub fn is_extended(&self) -> bool {
        self.message_type == rtm::IFINFO2
    }

    fn data_offset(&self) -> usize {
        if self.is_extended() {
            Self::EXTENDED_DATA_OFFSET
        } else {
            Self::DATA_OFFSET
        }
    }
}

impl WireEncode for LinkHeader {
    type Error = InadequateBufferSize;

    #[inline]
    fn encoded_length(&self) -> usize {
        Self::length_for(self.message_type).unwrap_or(Self::LENGTH)
    }

    fn encode_to<T: BufMut>(&self, buffer: &mut T) -> Result<(), Self::Error> {
        let length = self.encoded_length();
        if buffer.remaining_mut() < length {
            return Err(InadequateBufferSize);
        }

        buffer.put_u16_ne(self.length);
        buffer.put_u8(self.version);
        buffer.put_u8(self.message_type);
        buffer.put_u32_ne(self.addrs.bits());
        buffer.put_u32_ne(self.flags.bits());
        buffer.put_u16_ne(self.index);
        buffer.put_bytes(0, self.data_offset() - 14);

        buffer.put_u8(self.link_type);
        buffer.put_bytes(0, 7);
        buffer.put_u32_ne(self.mtu);
        buffer.put_u32_ne(self.metric);
        buffer.put_bytes(0, length - self.data_offset() - Self::DATA_PREFIX_LENGTH);

        Ok(())
    }
}

impl<T: Buf> WireDecode<T> for LinkHeader {
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
        let Some(header_length) = Self::length_for(message_type) else {
            return Err(DecodeError::UnexpectedMessageType(message_type));
        };
        if data.remaining() + 4 < header_length {
            return Err(DecodeError::MessageEmptyOrTruncated);
        }

        let mut header = Self {
            length,
            version,
            message_type,
            addrs: AddressFlags::from_bits_retain(data.get_u32_ne()),
            flags: LinkFlags::from_bits_retain(data.get_u32_ne()),
            index: data.get_u16_ne(),
            link_type: 0,
            mtu: 0,
            metric: 0,
        };
        data.advance(header.data_offset() - 14);

        header.link_type = data.get_u8();
        data.advance(7);
        header.mtu = data.get_u32_ne();
        header.metric = data.get_u32_ne();
        data.advance(header_length - header.data_offset() - Self::DATA_PREFIX_LENGTH);

        Ok(header)
    }
}

/// A report on the state of an interface, sent when it goes up or down or changes flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMessage {
    /// The message header.
    pub header: LinkHeader,
    /// The address entries following the header, usually just the link address.
    pub addrs: AddressSet,
}

impl LinkMessage {
    /// The interface flags.
    pub fn flags(&self) -> LinkFlags {
        self.header.flags
    }

    /// The index of the interface.
    pub fn index(&self) -> u16 {
        self.header.index
    }
}

/// Whether an address was added to or removed from an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressOperation {
    /// `RTM_NEWADDR`
    Add,
    /// `RTM_DELADDR`
    Delete,
}

impl AddressOperation {
    /// Returns the operation of the given raw message type, if it is an address message.
    pub const fn from_message_type(message_type: u8) -> Option<Self> {
        match message_type {
            rtm::NEWADDR => Some(Self::Add),
            rtm::DELADDR => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Interface address message header, `struct ifa_msghdr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressHeader {
    /// Total length of the message, including the address entries.
    pub length: u16,
    /// The message format version.
    pub version: u8,
    /// The raw message type, `RTM_NEWADDR` or `RTM_DELADDR`.
    pub message_type: u8,
    /// Bitmask of the address entries following the header.
    pub addrs: AddressFlags,
    /// Flags of the route to the address.
    pub flags: RouteFlags,
    /// Index of the interface the address belongs to.
    pub index: u16,
    /// Routing metric of the address.
    pub metric: i32,
}

impl AddressHeader {
    /// The length of an encoded header.
    pub const LENGTH: usize = 20;
}

impl WireEncode for AddressHeader {
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
        buffer.put_u32_ne(self.addrs.bits());
        buffer.put_u32_ne(self.flags.bits());
        buffer.put_u16_ne(self.index);
        buffer.put_u16(0);
        buffer.put_i32_ne(self.metric);

        Ok(())
    }
}

impl<T: Buf> WireDecode<T> for AddressHeader {
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
        let addrs = AddressFlags::from_bits_retain(data.get_u32_ne());
        let flags = RouteFlags::from_bits_retain(data.get_u32_ne());
        let index = data.get_u16_ne();
        data.advance(2);

        Ok(Self {
            length,
            version,
            message_type,
            addrs,
            flags,
            index,
            metric: data.get_i32_ne(),
        })
    }
}

/// An address being added to or removed from an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMessage {
    /// Whether the address was added or removed.
    pub operation: AddressOperation,
    /// The message header.
    pub header: AddressHeader,
    /// The address entries following the header. The address itself is in the
    /// `interface_address` slot.
    pub addrs: AddressSet,
}

impl AddressMessage {
    /// The flags of the route to the address.
    pub fn flags(&self) -> RouteFlags {
        self.header.flags
    }

    /// The index of the interface the address belongs to.
    pub fn index(&self) -> u16 {
        self.header.index
    }
}
