//! Socket addresses as carried in routing messages.
//!
//! Every address entry starts with a one-byte length (`sa_len`) followed by a one-byte
//! family (`sa_family`). Entries are laid out back to back, each rounded up to a multiple
//! of four bytes (see [`sockaddr_roundup`]).

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};

use bytes::{Buf, BufMut};

use crate::{
    abi::sockaddr_roundup,
    error::{DecodeError, InadequateBufferSize},
    message::AddressSlot,
    utils::encoded_type,
    wire_encoding::{WireDecode, WireEncode},
};

encoded_type! {
    /// The address family of a socket address, `sa_family`.
    pub enum AddressFamily(u8) {
        /// No family; used by the kernel for trimmed netmask entries.
        Unspec = 0 => "AF_UNSPEC",
        /// IPv4.
        Inet = 2 => "AF_INET",
        /// Data-link (interface) addresses.
        Link = 18 => "AF_LINK",
        /// IPv6.
        Inet6 = 30 => "AF_INET6";
        /// Any other family, which this library does not interpret.
        Other,
    }
}

/// An IPv4 socket address, `struct sockaddr_in`, as used in route requests.
///
/// The port is always zero: routing requests address networks and hosts, not services.
///
/// ```plain
///  1-byte  : sin_len (16)
///  1-byte  : sin_family (AF_INET)
///  2-bytes : sin_port (0)
///  4-bytes : sin_addr, network byte order
///  8-bytes : sin_zero
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SockAddrIn {
    /// The IPv4 address carried in `sin_addr`.
    pub address: Ipv4Addr,
}

impl SockAddrIn {
    /// The length of an encoded `sockaddr_in`.
    pub const LENGTH: usize = 16;

    /// Creates a new socket address for the given IPv4 address.
    pub const fn new(address: Ipv4Addr) -> Self {
        Self { address }
    }
}

impl From<Ipv4Addr> for SockAddrIn {
    fn from(address: Ipv4Addr) -> Self {
        Self::new(address)
    }
}

impl WireEncode for SockAddrIn {
    type Error = InadequateBufferSize;

    #[inline]
    fn encoded_length(&self) -> usize {
        Self::LENGTH
    }

    fn encode_to<T: BufMut>(&self, buffer: &mut T) -> Result<(), Self::Error> {
        if buffer.remaining_mut() < Self::LENGTH {
            return Err(InadequateBufferSize);
        }

        buffer.put_u8(Self::LENGTH as u8);
        buffer.put_u8(AddressFamily::Inet.into());
        buffer.put_u16(0);
        buffer.put_slice(&self.address.octets());
        buffer.put_bytes(0, 8);

        Ok(())
    }
}

impl<T: Buf> WireDecode<T> for SockAddrIn {
    type Error = DecodeError;

    fn decode(data: &mut T) -> Result<Self, Self::Error> {
        if data.remaining() < Self::LENGTH {
            return Err(DecodeError::MessageEmptyOrTruncated);
        }

        let length = data.get_u8();
        let family = AddressFamily::from(data.get_u8());

        if family != AddressFamily::Inet {
            return Err(DecodeError::UnexpectedAddressFamily(family));
        }
        if usize::from(length) != Self::LENGTH {
            return Err(DecodeError::InvalidSockaddrLength { family, length });
        }

        let _port = data.get_u16();
        let address = Ipv4Addr::from(data.get_u32());
        data.advance(8);

        Ok(Self { address })
    }
}

/// A data-link socket address, `struct sockaddr_dl`, identifying a network interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkAddr {
    /// The interface index, 0 if unspecified.
    pub index: u16,
    /// The interface type (`IFT_*`).
    pub link_type: u8,
    /// The interface name, such as `en0`.
    pub name: String,
    /// The link-level address, such as a MAC address.
    pub address: Vec<u8>,
}

impl LinkAddr {
    /// The length of the fixed fields preceding the name and address bytes.
    const FIXED_LENGTH: usize = 8;

    fn decode_from(entry: &[u8]) -> Result<Self, DecodeError> {
        if entry.len() < Self::FIXED_LENGTH {
            return Err(DecodeError::InvalidSockaddrLength {
                family: AddressFamily::Link,
                length: entry.len() as u8,
            });
        }

        let index = u16::from_ne_bytes([entry[2], entry[3]]);
        let link_type = entry[4];
        let name_length = usize::from(entry[5]);
        let address_length = usize::from(entry[6]);

        let data = &entry[Self::FIXED_LENGTH..];
        if name_length + address_length > data.len() {
            return Err(DecodeError::SockaddrTruncated(entry.len()));
        }

        Ok(Self {
            index,
            link_type,
            name: String::from_utf8_lossy(&data[..name_length]).into_owned(),
            address: data[name_length..name_length + address_length].to_vec(),
        })
    }
}

/// A socket address decoded from a kernel routing message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SockAddr {
    /// An IPv4 address, or an IPv4 mask in a mask slot.
    V4(SocketAddrV4),
    /// An IPv6 address, or an IPv6 mask in a mask slot.
    V6(SocketAddrV6),
    /// A data-link address.
    Link(LinkAddr),
    /// An address of a family that is not interpreted.
    Unknown(AddressFamily),
}

impl SockAddr {
    const SOCKADDR_IN6_LENGTH: usize = 28;
    const IPV4_OFFSET: usize = 4;
    const IPV6_OFFSET: usize = 8;

    /// Returns the IPv4 address, if this is an IPv4 entry.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        match self {
            SockAddr::V4(address) => Some(*address.ip()),
            _ => None,
        }
    }

    /// Returns the IPv6 address, if this is an IPv6 entry.
    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        match self {
            SockAddr::V6(address) => Some(*address.ip()),
            _ => None,
        }
    }

    /// Returns the link address, if this is a data-link entry.
    pub fn link(&self) -> Option<&LinkAddr> {
        match self {
            SockAddr::Link(link) => Some(link),
            _ => None,
        }
    }

    /// Decodes a single address entry occupying the given slot of a message.
    ///
    /// The buffer is advanced past the entry including its alignment padding. Returns
    /// `None` for a zero-length entry, which the kernel uses for an absent address in a
    /// slot that is nevertheless marked present.
    pub fn decode_entry(
        data: &mut impl Buf,
        slot: AddressSlot,
    ) -> Result<Option<Self>, DecodeError> {
        if !data.has_remaining() {
            return Err(DecodeError::MessageEmptyOrTruncated);
        }

        let length = usize::from(data.chunk()[0]);
        if length > data.remaining() {
            return Err(DecodeError::SockaddrTruncated(length));
        }

        let mut entry = vec![0u8; length];
        data.copy_to_slice(&mut entry);
        data.advance((sockaddr_roundup(length) - length).min(data.remaining()));

        if length == 0 {
            tracing::trace!(?slot, "empty address entry");
            return Ok(None);
        }

        let family = match entry.get(1) {
            Some(family) => AddressFamily::from(*family),
            None => AddressFamily::Unspec,
        };
        tracing::trace!(?slot, ?family, length, "decoding address entry");

        if slot.is_mask() && family != AddressFamily::Link {
            return Ok(Some(Self::decode_mask(&entry, family)));
        }

        let address = match family {
            AddressFamily::Inet => {
                if length < SockAddrIn::LENGTH {
                    return Err(DecodeError::InvalidSockaddrLength {
                        family,
                        length: length as u8,
                    });
                }
                let port = u16::from_be_bytes([entry[2], entry[3]]);
                SockAddr::V4(SocketAddrV4::new(ipv4_from(&entry, Self::IPV4_OFFSET), port))
            }
            AddressFamily::Inet6 => {
                if length < Self::SOCKADDR_IN6_LENGTH {
                    return Err(DecodeError::InvalidSockaddrLength {
                        family,
                        length: length as u8,
                    });
                }
                let port = u16::from_be_bytes([entry[2], entry[3]]);
                let flowinfo = u32::from_be_bytes([entry[4], entry[5], entry[6], entry[7]]);
                let scope_id = u32::from_ne_bytes([entry[24], entry[25], entry[26], entry[27]]);
                SockAddr::V6(SocketAddrV6::new(
                    ipv6_from(&entry, Self::IPV6_OFFSET),
                    port,
                    flowinfo,
                    scope_id,
                ))
            }
            AddressFamily::Link => SockAddr::Link(LinkAddr::decode_from(&entry)?),
            other => {
                tracing::debug!(family = %other, "skipping address of unsupported family");
                SockAddr::Unknown(other)
            }
        };

        Ok(Some(address))
    }

    /// Decodes a netmask entry.
    ///
    /// The kernel trims trailing zero bytes from mask entries and frequently leaves the
    /// family unset, so the family is inferred from the length when it is not explicit.
    fn decode_mask(entry: &[u8], family: AddressFamily) -> Self {
        let is_ipv6 = family == AddressFamily::Inet6
            || (family != AddressFamily::Inet && entry.len() > SockAddrIn::LENGTH / 2);

        if is_ipv6 {
            SockAddr::V6(SocketAddrV6::new(
                ipv6_from(entry, Self::IPV6_OFFSET),
                0,
                0,
                0,
            ))
        } else {
            SockAddr::V4(SocketAddrV4::new(ipv4_from(entry, Self::IPV4_OFFSET), 0))
        }
    }
}

/// Reads 4 address bytes at the offset, treating bytes past the end as zero.
fn ipv4_from(entry: &[u8], offset: usize) -> Ipv4Addr {
    let mut octets = [0u8; 4];
    copy_truncated(&mut octets, entry, offset);
    Ipv4Addr::from(octets)
}

/// Reads 16 address bytes at the offset, treating bytes past the end as zero.
fn ipv6_from(entry: &[u8], offset: usize) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    copy_truncated(&mut octets, entry, offset);
    Ipv6Addr::from(octets)
}

fn copy_truncated(target: &mut [u8], entry: &[u8], offset: usize) {
    if let Some(available) = entry.get(offset..) {
        let count = available.len().min(target.len());
        target[..count].copy_from_slice(&available[..count]);
    }
}
