//! Messages received from the kernel over a routing socket.
//!
//! Every message consists of a header followed by the address entries that are marked
//! present in its address bitmask, in the canonical slot order of [`AddressSlot::ALL`].
//! Route messages use [`MessageHeader`]; interface and address messages have the shorter
//! headers of [`LinkHeader`] and [`AddressHeader`].

use bytes::Buf;

use crate::{
    abi::{rta, rtm},
    error::DecodeError,
    flags::{AddressFlags, RouteFlags},
    header::{MessageHeader, MessageType},
    sockaddr::SockAddr,
    wire_encoding::{WireDecode, WireDecodeWithContext},
};

mod interface;
pub use interface::{
    AddressHeader,
    AddressMessage,
    AddressOperation,
    LinkHeader,
    LinkMessage,
};

mod parser;
pub use parser::MessageParser;

/// The positional address slots of a routing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSlot {
    /// `RTA_DST`
    Destination,
    /// `RTA_GATEWAY`
    Gateway,
    /// `RTA_NETMASK`
    Netmask,
    /// `RTA_GENMASK`
    Genmask,
    /// `RTA_IFP`
    InterfaceLink,
    /// `RTA_IFA`
    InterfaceAddress,
    /// `RTA_AUTHOR`
    Author,
    /// `RTA_BRD`
    Broadcast,
}

impl AddressSlot {
    /// All slots, in the order in which their entries appear in a message.
    pub const ALL: [AddressSlot; rta::MAX] = [
        Self::Destination,
        Self::Gateway,
        Self::Netmask,
        Self::Genmask,
        Self::InterfaceLink,
        Self::InterfaceAddress,
        Self::Author,
        Self::Broadcast,
    ];

    /// The bit marking this slot in the address bitmask.
    pub const fn bit(&self) -> u32 {
        match self {
            Self::Destination => rta::DST,
            Self::Gateway => rta::GATEWAY,
            Self::Netmask => rta::NETMASK,
            Self::Genmask => rta::GENMASK,
            Self::InterfaceLink => rta::IFP,
            Self::InterfaceAddress => rta::IFA,
            Self::Author => rta::AUTHOR,
            Self::Broadcast => rta::BRD,
        }
    }

    /// Returns true for slots holding masks rather than addresses.
    pub const fn is_mask(&self) -> bool {
        matches!(self, Self::Netmask | Self::Genmask)
    }
}

/// The address entries of a routing message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddressSet {
    /// The destination network or host.
    pub destination: Option<SockAddr>,
    /// The next hop.
    pub gateway: Option<SockAddr>,
    /// The netmask applied to the destination.
    pub netmask: Option<SockAddr>,
    /// The cloning mask.
    pub genmask: Option<SockAddr>,
    /// The link address of the interface.
    pub interface_link: Option<SockAddr>,
    /// The address of the interface.
    pub interface_address: Option<SockAddr>,
    /// The author of a redirect.
    pub author: Option<SockAddr>,
    /// The broadcast or point-to-point destination address.
    pub broadcast: Option<SockAddr>,
}

impl AddressSet {
    /// Returns the entry stored for the given slot.
    pub fn get(&self, slot: AddressSlot) -> Option<&SockAddr> {
        self.slot(slot).as_ref()
    }

    fn slot(&self, slot: AddressSlot) -> &Option<SockAddr> {
        match slot {
            AddressSlot::Destination => &self.destination,
            AddressSlot::Gateway => &self.gateway,
            AddressSlot::Netmask => &self.netmask,
            AddressSlot::Genmask => &self.genmask,
            AddressSlot::InterfaceLink => &self.interface_link,
            AddressSlot::InterfaceAddress => &self.interface_address,
            AddressSlot::Author => &self.author,
            AddressSlot::Broadcast => &self.broadcast,
        }
    }

    fn slot_mut(&mut self, slot: AddressSlot) -> &mut Option<SockAddr> {
        match slot {
            AddressSlot::Destination => &mut self.destination,
            AddressSlot::Gateway => &mut self.gateway,
            AddressSlot::Netmask => &mut self.netmask,
            AddressSlot::Genmask => &mut self.genmask,
            AddressSlot::InterfaceLink => &mut self.interface_link,
            AddressSlot::InterfaceAddress => &mut self.interface_address,
            AddressSlot::Author => &mut self.author,
            AddressSlot::Broadcast => &mut self.broadcast,
        }
    }
}

impl<T: Buf> WireDecodeWithContext<T> for AddressSet {
    type Error = DecodeError;
    type Context = AddressFlags;

    fn decode_with_context(data: &mut T, present: AddressFlags) -> Result<Self, Self::Error> {
        let mut addresses = AddressSet::default();

        for slot in AddressSlot::ALL {
            if !present.contains(AddressFlags::from_bits_retain(slot.bit())) {
                continue;
            }
            *addresses.slot_mut(slot) = SockAddr::decode_entry(data, slot)?;
        }

        Ok(addresses)
    }
}

/// A route message: a route request echoed back by the kernel, or a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMessage {
    /// The message header.
    pub header: MessageHeader,
    /// The address entries following the header.
    pub addrs: AddressSet,
}

impl RouteMessage {
    /// Returns true if the raw message type is carried in an `rt_msghdr`.
    pub const fn is_route_type(message_type: u8) -> bool {
        matches!(message_type, rtm::ADD..=rtm::RESOLVE)
    }

    /// The operation this message reports, if it is one that can be requested.
    pub fn operation(&self) -> Option<MessageType> {
        self.header.request_type()
    }

    /// The route flags.
    pub fn flags(&self) -> RouteFlags {
        self.header.flags
    }

    /// The kernel error reported for the request, if any.
    pub fn errno(&self) -> Option<i32> {
        (self.header.errno != 0).then_some(self.header.errno)
    }
}

/// A message read from a routing socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelMessage {
    /// A message about a route.
    Route(RouteMessage),
    /// A report on the state of an interface.
    Link(LinkMessage),
    /// An address being added to or removed from an interface.
    Address(AddressMessage),
    /// A message of a type that is not decoded, such as a multicast membership change.
    /// Only its type and length are reported.
    Other {
        /// The raw message type.
        message_type: u8,
        /// The length of the skipped message.
        length: u16,
    },
}

impl KernelMessage {
    /// Returns the route message, if this is one.
    pub fn into_route(self) -> Option<RouteMessage> {
        match self {
            KernelMessage::Route(route) => Some(route),
            _ => None,
        }
    }

    /// The index of the interface the message refers to.
    pub fn index(&self) -> Option<u16> {
        match self {
            KernelMessage::Route(route) => Some(route.header.index),
            KernelMessage::Link(link) => Some(link.index()),
            KernelMessage::Address(address) => Some(address.index()),
            KernelMessage::Other { .. } => None,
        }
    }

    /// The address entries of the message.
    pub fn addrs(&self) -> Option<&AddressSet> {
        match self {
            KernelMessage::Route(route) => Some(&route.addrs),
            KernelMessage::Link(link) => Some(&link.addrs),
            KernelMessage::Address(address) => Some(&address.addrs),
            KernelMessage::Other { .. } => None,
        }
    }

    /// Returns the length of the header preceding the address entries for the given
    /// message type, or `None` for types that are not decoded.
    fn header_length(message_type: u8) -> Option<usize> {
        if RouteMessage::is_route_type(message_type) {
            return Some(MessageHeader::LENGTH);
        }
        if AddressOperation::from_message_type(message_type).is_some() {
            return Some(AddressHeader::LENGTH);
        }
        LinkHeader::length_for(message_type)
    }
}

/// Decodes the address entries making up the rest of a message.
///
/// The remainder of the message is consumed even if an entry is invalid.
fn decode_addresses<T: Buf>(
    data: &mut T,
    present: AddressFlags,
) -> Result<AddressSet, DecodeError> {
    let addrs = AddressSet::decode_with_context(data, present);
    data.advance(data.remaining());
    addrs
}

impl<T: Buf> WireDecode<T> for KernelMessage {
    type Error = DecodeError;

    /// Decodes a single message, which must span exactly the remaining bytes of `data`.
    fn decode(data: &mut T) -> Result<Self, Self::Error> {
        let Some((declared, version)) = MessageHeader::peek_length_and_version(data.chunk())
        else {
            return Err(DecodeError::MessageEmptyOrTruncated);
        };

        let actual = data.remaining();
        if usize::from(declared) != actual {
            data.advance(actual);
            return Err(DecodeError::LengthMismatch { declared, actual });
        }
        if version != crate::abi::RTM_VERSION {
            data.advance(actual);
            return Err(DecodeError::UnsupportedVersion(version));
        }

        let message_type = data.chunk()[3];
        let Some(header_length) = Self::header_length(message_type) else {
            data.advance(actual);
            tracing::debug!(message_type, length = declared, "skipping routing message");
            return Ok(KernelMessage::Other {
                message_type,
                length: declared,
            });
        };
        if actual < header_length {
            data.advance(actual);
            return Err(DecodeError::MessageEmptyOrTruncated);
        }

        let message = if let Some(operation) = AddressOperation::from_message_type(message_type) {
            let header = AddressHeader::decode(data)?;
            KernelMessage::Address(AddressMessage {
                operation,
                header,
                addrs: decode_addresses(data, header.addrs)?,
            })
        } else if RouteMessage::is_route_type(message_type) {
            let header = MessageHeader::decode(data)?;
            KernelMessage::Route(RouteMessage {
                header,
                addrs: decode_addresses(data, header.addrs)?,
            })
        } else {
            let header = LinkHeader::decode(data)?;
            KernelMessage::Link(LinkMessage {
                header,
                addrs: decode_addresses(data, header.addrs)?,
            })
        };

        tracing::trace!(message_type, index = ?message.index(), "decoded routing message");
        Ok(message)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::net::Ipv4Addr;

    use bytes::{BufMut, Bytes, BytesMut};

    use test_utils::param_test;

    use super::*;
    use crate::{
        abi::{self, af},
        flags::LinkFlags,
        header::RouteMetrics,
        wire_encoding::WireEncode,
    };

    /// Builds a route message as the kernel would send it, with the given raw address
    /// entries appended after the header.
    pub(crate) fn kernel_route_message(
        message_type: u8,
        addrs: u32,
        seq: i32,
        entries: &[&[u8]],
    ) -> Bytes {
        let entries_length: usize = entries
            .iter()
            .map(|entry| abi::sockaddr_roundup(entry.len()))
            .sum();
        let header = MessageHeader {
            length: (MessageHeader::LENGTH + entries_length) as u16,
            version: abi::RTM_VERSION,
            message_type,
            index: 4,
            flags: RouteFlags::UP | RouteFlags::GATEWAY | RouteFlags::from_bits_retain(abi::rtf::DONE),
            addrs: AddressFlags::from_bits_retain(addrs),
            pid: 99,
            seq,
            errno: 0,
            use_count: 0,
            inits: 0,
            metrics: RouteMetrics::default(),
        };

        let mut buffer = BytesMut::new();
        header.encode_to(&mut buffer).expect("growable buffer");
        for entry in entries {
            buffer.put_slice(entry);
            buffer.put_bytes(0, abi::sockaddr_roundup(entry.len()) - entry.len());
        }
        buffer.freeze()
    }

    pub(crate) fn sockaddr_in(octets: [u8; 4]) -> [u8; 16] {
        let mut entry = [0u8; 16];
        entry[0] = 16;
        entry[1] = af::INET;
        entry[4..8].copy_from_slice(&octets);
        entry
    }

    #[test]
    fn default_route_reply() {
        let destination = sockaddr_in([0, 0, 0, 0]);
        let gateway = sockaddr_in([192, 168, 1, 1]);
        let netmask = [0u8, 0, 0, 0];
        let mut bytes = kernel_route_message(
            rtm::GET,
            rta::DST | rta::GATEWAY | rta::NETMASK,
            5,
            &[&destination, &gateway, &netmask[..1]],
        );

        let message = KernelMessage::decode(&mut bytes)
            .expect("valid message")
            .into_route()
            .expect("route message");

        assert!(bytes.is_empty());
        assert_eq!(message.operation(), Some(MessageType::Get));
        assert_eq!(message.header.seq, 5);
        assert_eq!(message.errno(), None);
        assert!(message.flags().is_gateway());
        assert_eq!(
            message.addrs.destination.as_ref().and_then(SockAddr::ipv4),
            Some(Ipv4Addr::UNSPECIFIED)
        );
        assert_eq!(
            message.addrs.gateway.as_ref().and_then(SockAddr::ipv4),
            Some(Ipv4Addr::new(192, 168, 1, 1))
        );
        assert_eq!(message.addrs.netmask, None);
        assert_eq!(message.addrs.get(AddressSlot::Author), None);
    }

    #[test]
    fn interface_scoped_route() {
        let destination = sockaddr_in([10, 0, 0, 0]);
        let netmask = [7u8, 0, 0, 0, 255, 255, 255];
        let mut link = [0u8; 20];
        link[0] = 20;
        link[1] = af::LINK;
        link[2..4].copy_from_slice(&4u16.to_ne_bytes());
        link[5] = 3;
        link[8..11].copy_from_slice(b"en0");
        let interface_address = sockaddr_in([10, 0, 0, 7]);

        let mut bytes = kernel_route_message(
            rtm::ADD,
            rta::DST | rta::NETMASK | rta::IFP | rta::IFA,
            0,
            &[&destination, &netmask, &link, &interface_address],
        );

        let KernelMessage::Route(message) = KernelMessage::decode(&mut bytes).expect("valid")
        else {
            panic!("expected a route message");
        };

        assert_eq!(message.operation(), Some(MessageType::Add));
        assert_eq!(
            message.addrs.netmask.as_ref().and_then(SockAddr::ipv4),
            Some(Ipv4Addr::new(255, 255, 255, 0))
        );
        assert_eq!(
            message
                .addrs
                .interface_link
                .as_ref()
                .and_then(SockAddr::link)
                .map(|link| link.name.as_str()),
            Some("en0")
        );
        assert_eq!(
            message.addrs.interface_address.as_ref().and_then(SockAddr::ipv4),
            Some(Ipv4Addr::new(10, 0, 0, 7))
        );
    }

    #[test]
    fn multicast_message_is_skipped() {
        let mut data = BytesMut::new();
        data.put_u16_ne(8);
        data.put_u8(abi::RTM_VERSION);
        data.put_u8(rtm::NEWMADDR);
        data.put_u32(0);
        let mut data = data.freeze();

        assert_eq!(
            KernelMessage::decode(&mut data),
            Ok(KernelMessage::Other {
                message_type: rtm::NEWMADDR,
                length: 8
            })
        );
        assert!(data.is_empty());
    }

    fn link_message(message_type: u8, flags: u32, entries: &[&[u8]]) -> Bytes {
        let header_length = LinkHeader::length_for(message_type).expect("interface message");
        let entries_length: usize = entries
            .iter()
            .map(|entry| abi::sockaddr_roundup(entry.len()))
            .sum();
        let header = LinkHeader {
            length: (header_length + entries_length) as u16,
            version: abi::RTM_VERSION,
            message_type,
            addrs: if entries.is_empty() {
                AddressFlags::empty()
            } else {
                AddressFlags::INTERFACE_LINK
            },
            flags: LinkFlags::from_bits_retain(flags),
            index: 4,
            link_type: 6,
            mtu: 1500,
            metric: 0,
        };

        let mut buffer = BytesMut::new();
        header.encode_to(&mut buffer).expect("growable buffer");
        for entry in entries {
            buffer.put_slice(entry);
            buffer.put_bytes(0, abi::sockaddr_roundup(entry.len()) - entry.len());
        }
        buffer.freeze()
    }

    fn link_address(name: &[u8]) -> Vec<u8> {
        let mut entry = vec![0u8; 20];
        entry[0] = 20;
        entry[1] = af::LINK;
        entry[2..4].copy_from_slice(&4u16.to_ne_bytes());
        entry[5] = name.len() as u8;
        entry[8..8 + name.len()].copy_from_slice(name);
        entry
    }

    #[test]
    fn interface_info() {
        let mut bytes = link_message(
            rtm::IFINFO,
            abi::iff::UP | abi::iff::RUNNING,
            &[&link_address(b"en0")[..]],
        );

        let KernelMessage::Link(message) = KernelMessage::decode(&mut bytes).expect("valid")
        else {
            panic!("expected a link message");
        };

        assert!(bytes.is_empty());
        assert_eq!(message.index(), 4);
        assert!(message.flags().is_up());
        assert!(message.flags().is_running());
        assert!(!message.header.is_extended());
        assert_eq!(message.header.mtu, 1500);
        assert_eq!(
            message
                .addrs
                .interface_link
                .as_ref()
                .and_then(SockAddr::link)
                .map(|link| link.name.as_str()),
            Some("en0")
        );
    }

    #[test]
    fn extended_interface_info() {
        let mut bytes = link_message(rtm::IFINFO2, abi::iff::UP, &[]);

        let message = KernelMessage::decode(&mut bytes).expect("valid");

        assert_eq!(message.index(), Some(4));
        assert!(matches!(
            message,
            KernelMessage::Link(ref link) if link.header.is_extended() && !link.flags().is_running()
        ));
        assert_eq!(message.addrs(), Some(&AddressSet::default()));
    }

    #[test]
    fn truncated_interface_info() {
        let mut data = BytesMut::new();
        data.put_u16_ne(8);
        data.put_u8(abi::RTM_VERSION);
        data.put_u8(rtm::IFINFO);
        data.put_u32(0);

        assert_eq!(
            KernelMessage::decode(&mut data),
            Err(DecodeError::MessageEmptyOrTruncated)
        );
        assert!(data.is_empty());
    }

    param_test! {
        address_message: [
            added: (rtm::NEWADDR, AddressOperation::Add),
            removed: (rtm::DELADDR, AddressOperation::Delete)
        ]
    }
    fn address_message(message_type: u8, operation: AddressOperation) {
        let netmask = [7u8, 0, 0, 0, 255, 255, 255];
        let address = sockaddr_in([192, 168, 1, 20]);
        let broadcast = sockaddr_in([192, 168, 1, 255]);
        let header = AddressHeader {
            length: (AddressHeader::LENGTH + 8 + 16 + 16) as u16,
            version: abi::RTM_VERSION,
            message_type,
            addrs: AddressFlags::NETMASK
                | AddressFlags::INTERFACE_ADDRESS
                | AddressFlags::BROADCAST,
            flags: RouteFlags::UP,
            index: 5,
            metric: 0,
        };
        let mut data = BytesMut::new();
        header.encode_to(&mut data).expect("growable buffer");
        data.put_slice(&netmask);
        data.put_u8(0);
        data.put_slice(&address);
        data.put_slice(&broadcast);

        let KernelMessage::Address(message) = KernelMessage::decode(&mut data).expect("valid")
        else {
            panic!("expected an address message");
        };

        assert_eq!(message.operation, operation);
        assert_eq!(message.index(), 5);
        assert!(message.flags().is_up());
        assert!(!message.flags().is_dead());
        assert_eq!(
            message.addrs.interface_address.as_ref().and_then(SockAddr::ipv4),
            Some(Ipv4Addr::new(192, 168, 1, 20))
        );
        assert_eq!(
            message.addrs.netmask.as_ref().and_then(SockAddr::ipv4),
            Some(Ipv4Addr::new(255, 255, 255, 0))
        );
        assert_eq!(
            message.addrs.broadcast.as_ref().and_then(SockAddr::ipv4),
            Some(Ipv4Addr::new(192, 168, 1, 255))
        );
    }

    #[test]
    fn declared_length_mismatch() {
        let message = kernel_route_message(rtm::DELETE, rta::DST, 1, &[&sockaddr_in([1; 4])]);
        let mut truncated = message.slice(..message.len() - 4);

        assert_eq!(
            KernelMessage::decode(&mut truncated),
            Err(DecodeError::LengthMismatch {
                declared: 108,
                actual: 104
            })
        );
    }

    #[test]
    fn unsupported_version() {
        let message = kernel_route_message(rtm::ADD, 0, 1, &[]);
        let mut data = BytesMut::from(message.as_ref());
        data[2] = 3;

        assert_eq!(
            KernelMessage::decode(&mut data),
            Err(DecodeError::UnsupportedVersion(3))
        );
        assert!(data.is_empty());
    }

    #[test]
    fn address_overruns_message() {
        // The bitmask announces a gateway that is not present.
        let mut data =
            kernel_route_message(rtm::GET, rta::DST | rta::GATEWAY, 1, &[&sockaddr_in([0; 4])]);

        assert_eq!(
            KernelMessage::decode(&mut data),
            Err(DecodeError::MessageEmptyOrTruncated)
        );
        assert!(data.is_empty());
    }

    #[test]
    fn empty_input() {
        let mut data = Bytes::new();
        assert_eq!(
            KernelMessage::decode(&mut data),
            Err(DecodeError::MessageEmptyOrTruncated)
        );
    }
}
