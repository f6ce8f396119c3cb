//! Route requests written to a routing socket.
//!
//! A request is the routing-message header followed by exactly two IPv4 socket
//! addresses, the destination and the netmask:
//!
//! ```plain
//! 92-bytes : rt_msghdr, rtm_addrs = RTA_DST | RTA_NETMASK
//! 16-bytes : sockaddr_in destination
//! 16-bytes : sockaddr_in netmask
//! ```
//!
//! No gateway slot is carried. The kernel rejects requests whose declared length differs
//! from the bytes written, and interprets the address entries positionally, so the
//! header length, the address bitmask, and the entries written are kept consistent by
//! construction: a [`RouteRequest`] can only be created through [`RouteRequest::new`] or
//! [`RouteRequest::build`], and can not be mutated afterwards.
//!
//! Lookups scoped to an interface are built with [`InterfaceInfoRequest`].

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut};

use crate::{
    abi::{self, rtv},
    error::{DecodeError, InadequateBufferSize},
    flags::{AddressFlags, RouteFlags},
    header::{MessageHeader, MessageType, RouteMetrics, UnsupportedMessageType},
    sockaddr::SockAddrIn,
    wire_encoding::{WireDecode, WireEncode},
};

mod interface;
pub use interface::InterfaceInfoRequest;

/// Errors returned when the arguments of a route request are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    /// The message type is not one of add, delete, change or get.
    #[error(transparent)]
    UnsupportedMessageType(#[from] UnsupportedMessageType),
    /// The netmask has a one bit following a zero bit.
    #[error("netmask {0} is not contiguous")]
    NonContiguousNetmask(Ipv4Addr),
}

/// A request to add, delete, change or look up an IPv4 route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRequest {
    message_type: MessageType,
    header: MessageHeader,
    destination: SockAddrIn,
    netmask: SockAddrIn,
}

impl RouteRequest {
    /// The number of address entries following the header.
    const ADDRESS_COUNT: usize = 2;

    /// The exact length of an encoded request.
    pub const ENCODED_LENGTH: usize =
        MessageHeader::LENGTH + Self::ADDRESS_COUNT * SockAddrIn::LENGTH;

    /// The address bitmask of every request.
    pub const ADDRESSES: AddressFlags =
        AddressFlags::DESTINATION.union(AddressFlags::NETMASK);

    /// Builds a request from a raw message type.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::UnsupportedMessageType`] if `message_type` is not one of
    /// `RTM_ADD`, `RTM_DELETE`, `RTM_CHANGE` or `RTM_GET`, and
    /// [`InvalidArgument::NonContiguousNetmask`] if `netmask` is not a prefix mask.
    pub fn build(
        message_type: u8,
        sequence: i32,
        pid: i32,
        destination: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<Self, InvalidArgument> {
        let message_type = MessageType::try_from(message_type)?;
        Self::new(message_type, sequence, pid, destination, netmask)
    }

    /// Creates a request of the given type.
    ///
    /// The route is a host route, flagged `RTF_HOST`, if the netmask is all ones.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::NonContiguousNetmask`] if `netmask` is not a prefix mask.
    pub fn new(
        message_type: MessageType,
        sequence: i32,
        pid: i32,
        destination: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<Self, InvalidArgument> {
        if !is_contiguous(netmask) {
            return Err(InvalidArgument::NonContiguousNetmask(netmask));
        }

        let header = MessageHeader {
            length: Self::ENCODED_LENGTH as u16,
            version: abi::RTM_VERSION,
            message_type: message_type.into(),
            index: 0,
            flags: route_flags(message_type, netmask),
            addrs: Self::ADDRESSES,
            pid,
            seq: sequence,
            errno: 0,
            use_count: 0,
            inits: rtv::HOPCOUNT,
            metrics: RouteMetrics::default(),
        };

        Ok(Self {
            message_type,
            header,
            destination: destination.into(),
            netmask: netmask.into(),
        })
    }

    /// The header written ahead of the addresses.
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// The requested operation.
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// The sequence number identifying this request in the kernel's reply.
    pub fn sequence(&self) -> i32 {
        self.header.seq
    }

    /// The process identifier of the sender.
    pub fn pid(&self) -> i32 {
        self.header.pid
    }

    /// The destination network or host.
    pub fn destination(&self) -> Ipv4Addr {
        self.destination.address
    }

    /// The netmask applied to the destination.
    pub fn netmask(&self) -> Ipv4Addr {
        self.netmask.address
    }

    /// The prefix length of the netmask.
    pub fn prefix_length(&self) -> u8 {
        u32::from(self.netmask.address).leading_ones() as u8
    }

    /// The route flags.
    pub fn flags(&self) -> RouteFlags {
        self.header.flags
    }

    /// Returns true if the request is for a single host rather than a network.
    pub fn is_host_route(&self) -> bool {
        self.header.flags.is_host()
    }
}

fn is_contiguous(netmask: Ipv4Addr) -> bool {
    let bits = u32::from(netmask);
    bits.leading_ones() + bits.trailing_zeros() == u32::BITS
}

fn route_flags(message_type: MessageType, netmask: Ipv4Addr) -> RouteFlags {
    let mut flags = RouteFlags::UP;

    if netmask == Ipv4Addr::BROADCAST {
        flags |= RouteFlags::HOST;
    }

    match message_type {
        MessageType::Add | MessageType::Change => flags |= RouteFlags::STATIC,
        MessageType::Get => flags |= RouteFlags::GATEWAY,
        MessageType::Delete => (),
    }

    flags
}

impl WireEncode for RouteRequest {
    type Error = InadequateBufferSize;

    #[inline]
    fn encoded_length(&self) -> usize {
        Self::ENCODED_LENGTH
    }

    fn encode_to<T: BufMut>(&self, buffer: &mut T) -> Result<(), Self::Error> {
        if buffer.remaining_mut() < Self::ENCODED_LENGTH {
            return Err(InadequateBufferSize);
        }

        let initial_remaining = buffer.remaining_mut();

        self.header.encode_to(buffer)?;
        self.destination.encode_to(buffer)?;
        self.netmask.encode_to(buffer)?;

        let bytes_written = initial_remaining - buffer.remaining_mut();
        debug_assert_eq!(bytes_written, usize::from(self.header.length));

        Ok(())
    }
}

impl<T: Buf> WireDecode<T> for RouteRequest {
    type Error = DecodeError;

    /// Decodes a request previously encoded with [`WireEncode::encode_to`].
    fn decode(data: &mut T) -> Result<Self, Self::Error> {
        if data.remaining() < Self::ENCODED_LENGTH {
            return Err(DecodeError::MessageEmptyOrTruncated);
        }

        let header = MessageHeader::decode(data)?;

        if usize::from(header.length) != Self::ENCODED_LENGTH {
            return Err(DecodeError::LengthMismatch {
                declared: header.length,
                actual: Self::ENCODED_LENGTH,
            });
        }
        let Some(message_type) = header.request_type() else {
            return Err(DecodeError::UnexpectedMessageType(header.message_type));
        };
        if header.addrs != Self::ADDRESSES {
            return Err(DecodeError::UnexpectedAddressBitmask(header.addrs.bits()));
        }

        let destination = SockAddrIn::decode(data)?;
        let netmask = SockAddrIn::decode(data)?;

        Ok(Self {
            message_type,
            header,
            destination,
            netmask,
        })
    }
}
