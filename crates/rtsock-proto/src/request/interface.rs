use std::net::Ipv4Addr;

use bytes::{Buf, BufMut};

use crate::{
    abi::{self, rtm},
    error::{DecodeError, InadequateBufferSize},
    flags::{AddressFlags, RouteFlags},
    header::{MessageHeader, RouteMetrics},
    sockaddr::SockAddrIn,
    wire_encoding::{WireDecode, WireEncode},
};

/// A lookup of the route scoped to a single interface.
///
/// The request is an `RTM_GET` for the unspecified IPv4 address with `RTF_IFSCOPE` set,
/// so the kernel only considers routes through the interface in `rtm_index`. Setting
/// `RTA_IFP` and `RTA_IFA` in the bitmask asks the kernel to report the link address and
/// address of the interface in its reply; only the destination entry is written.
///
/// ```plain
/// 92-bytes : rt_msghdr, rtm_addrs = RTA_DST | RTA_IFP | RTA_IFA
/// 16-bytes : sockaddr_in destination (0.0.0.0)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceInfoRequest {
    header: MessageHeader,
    destination: SockAddrIn,
}

impl InterfaceInfoRequest {
    /// The exact length of an encoded request.
    pub const ENCODED_LENGTH: usize = MessageHeader::LENGTH + SockAddrIn::LENGTH;

    /// The address bitmask of every interface request.
    pub const ADDRESSES: AddressFlags = AddressFlags::DESTINATION
        .union(AddressFlags::INTERFACE_LINK)
        .union(AddressFlags::INTERFACE_ADDRESS);

    /// The route flags of every interface request.
    pub const FLAGS: RouteFlags = RouteFlags::IFSCOPE.union(RouteFlags::HOST);

    /// Creates a request for the interface with the given index.
    pub fn new(index: u16, sequence: i32, pid: i32) -> Self {
        Self {
            header: MessageHeader {
                length: Self::ENCODED_LENGTH as u16,
                version: abi::RTM_VERSION,
                message_type: rtm::GET,
                index,
                flags: Self::FLAGS,
                addrs: Self::ADDRESSES,
                pid,
                seq: sequence,
                errno: 0,
                use_count: 0,
                inits: 0,
                metrics: RouteMetrics::default(),
            },
            destination: SockAddrIn::new(Ipv4Addr::UNSPECIFIED),
        }
    }

    /// The header written ahead of the destination.
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// The index of the interface the lookup is scoped to.
    pub fn index(&self) -> u16 {
        self.header.index
    }

    /// The sequence number identifying this request in the kernel's reply.
    pub fn sequence(&self) -> i32 {
        self.header.seq
    }

    /// The process identifier of the sender.
    pub fn pid(&self) -> i32 {
        self.header.pid
    }
}

impl WireEncode for InterfaceInfoRequest {
    type Error = InadequateBufferSize;

    #[inline]
    fn encoded_length(&self) -> usize {
        Self::ENCODED_LENGTH
    }

    fn encode_to<T: BufMut>(&self, buffer: &mut T) -> Result<(), Self::Error> {
        if buffer.remaining_mut() < Self::ENCODED_LENGTH {
            return Err(InadequateBufferSize);
        }

        self.header.encode_to(buffer)?;
        self.destination.encode_to(buffer)
    }
}

impl<T: Buf> WireDecode<T> for InterfaceInfoRequest {
    type Error = DecodeError;

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
        if header.message_type != rtm::GET {
            return Err(DecodeError::UnexpectedMessageType(header.message_type));
        }
        if header.addrs != Self::ADDRESSES {
            return Err(DecodeError::UnexpectedAddressBitmask(header.addrs.bits()));
        }

        let destination = SockAddrIn::decode(data)?;

        Ok(Self {
            header,
            destination,
        })
    }
}
