//! Conditions on a single network interface, such as it gaining a routable address.

use std::net::{Ipv4Addr, Ipv6Addr};

use rtsock_proto::{
    message::{AddressOperation, KernelMessage},
    sockaddr::SockAddr,
    MessageType,
};

/// What must hold for an interface to be considered ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceCondition {
    /// The interface has an address that is neither loopback nor link-local.
    HasAddress,
    /// A route to a destination that is neither loopback nor link-local goes through the
    /// interface.
    HasRoute,
}

/// Identifies the interface to wait for.
///
/// Interface names are only carried by link addresses, so a name is resolved to an index
/// as soon as a message with a matching link address arrives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterfaceSpec {
    /// An interface index, as returned by `if_nametoindex(3)`.
    Index(u16),
    /// An interface name whose index is not yet known.
    Name(String),
}

impl InterfaceSpec {
    /// Looks up the index of the named interface.
    ///
    /// An interface that does not exist yet is kept by name, so that it can be recognized
    /// once it appears.
    #[cfg(unix)]
    pub fn resolve(name: &str) -> Self {
        match interface_index(name) {
            Ok(index) => {
                tracing::info!(interface = name, index, "found interface index");
                Self::Index(index)
            }
            Err(error) => {
                tracing::warn!(
                    interface = name,
                    %error,
                    "failed to look up interface index, watching for the interface to appear"
                );
                Self::Name(name.to_owned())
            }
        }
    }
}

/// Returns the index of the named interface.
///
/// # Errors
///
/// Fails if no interface of that name exists, or if the name contains a NUL byte.
#[cfg(unix)]
pub fn interface_index(name: &str) -> std::io::Result<u16> {
    use std::{ffi::CString, io};

    let c_name = CString::new(name)?;
    // SAFETY: `c_name` is a valid NUL-terminated string that outlives the call.
    let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
    if index == 0 {
        return Err(io::Error::last_os_error());
    }

    u16::try_from(index).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("index {index} of interface {name} is out of range"),
        )
    })
}

/// Returns true for IP addresses other than loopback and link-local ones.
///
/// Addresses of other families are never routable.
pub fn is_routable_address(address: &SockAddr) -> bool {
    match address {
        SockAddr::V4(address) => is_routable_ipv4(address.ip()),
        SockAddr::V6(address) => is_routable_ipv6(address.ip()),
        _ => false,
    }
}

fn is_routable_ipv4(address: &Ipv4Addr) -> bool {
    !(address.is_loopback() || address.is_link_local())
}

fn is_routable_ipv6(address: &Ipv6Addr) -> bool {
    // fe80::/10
    let is_link_local = address.segments()[0] & 0xffc0 == 0xfe80;
    !(address.is_loopback() || is_link_local)
}

/// Returns the index of the interface with the given name, if the message carries its
/// link address.
pub fn index_for_name(message: &KernelMessage, name: &str) -> Option<u16> {
    let link = message.addrs()?.interface_link.as_ref()?.link()?;
    (link.name == name).then_some(link.index)
}

/// Returns true if the message shows the interface with the given index meeting the
/// condition.
///
/// The message must first show the interface, or the address or route on it, as alive:
/// an interface report must be up and running, an added address must be up and not
/// dead, and an added or reported route must be up and lead to a routable destination.
/// The condition is then checked against the destination or interface address of the
/// message.
pub fn is_interface_ready(
    message: &KernelMessage,
    condition: InterfaceCondition,
    index: u16,
) -> bool {
    if message.index() != Some(index) {
        return false;
    }

    let is_alive = match message {
        KernelMessage::Link(link) => link.flags().is_up() && link.flags().is_running(),
        KernelMessage::Address(address) => {
            address.operation == AddressOperation::Add
                && address.flags().is_up()
                && !address.flags().is_dead()
        }
        KernelMessage::Route(route) => {
            matches!(
                route.operation(),
                Some(MessageType::Add | MessageType::Get)
            ) && route.errno().is_none()
                && route.flags().is_up()
                && route
                    .addrs
                    .destination
                    .as_ref()
                    .is_some_and(is_routable_address)
        }
        KernelMessage::Other { .. } => false,
    };
    tracing::trace!(index, is_alive, "checked interface message");
    if !is_alive {
        return false;
    }

    let Some(addrs) = message.addrs() else {
        return false;
    };
    let address = match condition {
        InterfaceCondition::HasRoute => addrs.destination.as_ref(),
        InterfaceCondition::HasAddress => addrs.interface_address.as_ref(),
    };
    address.is_some_and(is_routable_address)
}

#[cfg(test)]
mod tests {
    use std::net::{SocketAddrV4, SocketAddrV6};

    use rtsock_proto::{
        abi::{iff, rtf, rtm, RTM_VERSION},
        flags::{AddressFlags, LinkFlags, RouteFlags},
        header::RouteMetrics,
        message::{
            AddressHeader,
            AddressMessage,
            AddressSet,
            LinkHeader,
            LinkMessage,
            RouteMessage,
        },
        sockaddr::LinkAddr,
        MessageHeader,
    };
    use test_utils::param_test;

    use super::*;

    const INDEX: u16 = 4;

    fn v4(address: [u8; 4]) -> Option<SockAddr> {
        Some(SockAddr::V4(SocketAddrV4::new(Ipv4Addr::from(address), 0)))
    }

    fn en0() -> Option<SockAddr> {
        Some(SockAddr::Link(LinkAddr {
            index: INDEX,
            link_type: 6,
            name: "en0".to_owned(),
            address: vec![0x02, 0, 0, 0, 0, 1],
        }))
    }

    fn link(flags: u32) -> KernelMessage {
        KernelMessage::Link(LinkMessage {
            header: LinkHeader {
                length: 0,
                version: RTM_VERSION,
                message_type: rtm::IFINFO,
                addrs: AddressFlags::INTERFACE_LINK,
                flags: LinkFlags::from_bits_retain(flags),
                index: INDEX,
                link_type: 6,
                mtu: 1500,
                metric: 0,
            },
            addrs: AddressSet {
                interface_link: en0(),
                ..Default::default()
            },
        })
    }

    fn address(
        operation: AddressOperation,
        flags: u32,
        interface_address: [u8; 4],
    ) -> KernelMessage {
        KernelMessage::Address(AddressMessage {
            operation,
            header: AddressHeader {
                length: 0,
                version: RTM_VERSION,
                message_type: rtm::NEWADDR,
                addrs: AddressFlags::INTERFACE_ADDRESS,
                flags: RouteFlags::from_bits_retain(flags),
                index: INDEX,
                metric: 0,
            },
            addrs: AddressSet {
                interface_address: v4(interface_address),
                ..Default::default()
            },
        })
    }

    fn route(message_type: u8, flags: u32, destination: [u8; 4]) -> KernelMessage {
        KernelMessage::Route(RouteMessage {
            header: MessageHeader {
                length: 0,
                version: RTM_VERSION,
                message_type,
                index: INDEX,
                flags: RouteFlags::from_bits_retain(flags),
                addrs: AddressFlags::DESTINATION | AddressFlags::INTERFACE_ADDRESS,
                pid: 0,
                seq: 0,
                errno: 0,
                use_count: 0,
                inits: 0,
                metrics: RouteMetrics::default(),
            },
            addrs: AddressSet {
                destination: v4(destination),
                interface_link: en0(),
                interface_address: v4([192, 168, 1, 20]),
                ..Default::default()
            },
        })
    }

    param_test! {
        routable_addresses: [
            private: ("192.168.1.20", true),
            public: ("203.0.113.1", true),
            unspecified: ("0.0.0.0", true),
            loopback: ("127.0.0.1", false),
            loopback_network: ("127.255.0.1", false),
            link_local: ("169.254.10.1", false),
            ipv6_global: ("2001:db8::1", true),
            ipv6_loopback: ("::1", false),
            ipv6_link_local: ("fe80::1", false),
            ipv6_link_local_upper: ("febf::1", false),
            ipv6_site_local: ("fec0::1", true)
        ]
    }
    fn routable_addresses(address: &str, expected: bool) {
        let address = match address.parse().expect("valid address") {
            std::net::IpAddr::V4(ip) => SockAddr::V4(SocketAddrV4::new(ip, 0)),
            std::net::IpAddr::V6(ip) => SockAddr::V6(SocketAddrV6::new(ip, 0, 0, 0)),
        };

        assert_eq!(is_routable_address(&address), expected);
    }

    #[test]
    fn link_address_is_not_routable() {
        assert!(!is_routable_address(&en0().expect("link address")));
    }

    #[test]
    fn name_resolves_from_link_address() {
        assert_eq!(index_for_name(&link(iff::UP), "en0"), Some(INDEX));
        assert_eq!(index_for_name(&link(iff::UP), "en1"), None);
        assert_eq!(
            index_for_name(&route(rtm::ADD, rtf::UP, [0, 0, 0, 0]), "en0"),
            Some(INDEX)
        );
        assert_eq!(
            index_for_name(&address(AddressOperation::Add, rtf::UP, [10, 0, 0, 1]), "en0"),
            None
        );
    }

    param_test! {
        address_condition: [
            added: (AddressOperation::Add, rtf::UP, [192, 168, 1, 20], true),
            removed: (AddressOperation::Delete, rtf::UP, [192, 168, 1, 20], false),
            down: (AddressOperation::Add, 0, [192, 168, 1, 20], false),
            dead: (AddressOperation::Add, rtf::UP | rtf::DEAD, [192, 168, 1, 20], false),
            self_assigned: (AddressOperation::Add, rtf::UP, [169, 254, 3, 4], false),
            loopback: (AddressOperation::Add, rtf::UP, [127, 0, 0, 1], false)
        ]
    }
    fn address_condition(
        operation: AddressOperation,
        flags: u32,
        interface_address: [u8; 4],
        expected: bool,
    ) {
        let message = address(operation, flags, interface_address);

        assert_eq!(
            is_interface_ready(&message, InterfaceCondition::HasAddress, INDEX),
            expected
        );
        assert!(!is_interface_ready(&message, InterfaceCondition::HasRoute, INDEX));
    }

    param_test! {
        route_condition: [
            default_route: (rtm::ADD, rtf::UP, [0, 0, 0, 0], true),
            lookup: (rtm::GET, rtf::UP | rtf::IFSCOPE, [0, 0, 0, 0], true),
            network: (rtm::ADD, rtf::UP, [10, 0, 0, 0], true),
            change: (rtm::CHANGE, rtf::UP, [0, 0, 0, 0], false),
            deleted: (rtm::DELETE, rtf::UP, [0, 0, 0, 0], false),
            down: (rtm::ADD, 0, [0, 0, 0, 0], false),
            link_local: (rtm::ADD, rtf::UP, [169, 254, 0, 0], false)
        ]
    }
    fn route_condition(message_type: u8, flags: u32, destination: [u8; 4], expected: bool) {
        let message = route(message_type, flags, destination);

        assert_eq!(
            is_interface_ready(&message, InterfaceCondition::HasRoute, INDEX),
            expected
        );
        assert_eq!(
            is_interface_ready(&message, InterfaceCondition::HasAddress, INDEX),
            expected
        );
    }

    #[test]
    fn failed_lookup_is_not_ready() {
        let KernelMessage::Route(mut route) = route(rtm::GET, rtf::UP, [0, 0, 0, 0]) else {
            unreachable!()
        };
        route.header.errno = 3;

        assert!(!is_interface_ready(
            &KernelMessage::Route(route),
            InterfaceCondition::HasRoute,
            INDEX
        ));
    }

    #[test]
    fn other_interface() {
        let message = route(rtm::ADD, rtf::UP, [0, 0, 0, 0]);

        assert!(!is_interface_ready(&message, InterfaceCondition::HasRoute, INDEX + 1));
    }

    #[test]
    fn link_report_alone_is_not_ready() {
        let message = link(iff::UP | iff::RUNNING);

        assert!(!is_interface_ready(&message, InterfaceCondition::HasRoute, INDEX));
        assert!(!is_interface_ready(&message, InterfaceCondition::HasAddress, INDEX));
    }

    #[cfg(unix)]
    #[test]
    fn unknown_interface_index() {
        let err = interface_index("no-such-if0").expect_err("should fail");
        assert_ne!(err.kind(), std::io::ErrorKind::InvalidData);

        assert_eq!(
            InterfaceSpec::resolve("no-such-if0"),
            InterfaceSpec::Name("no-such-if0".to_owned())
        );
    }

    #[cfg(unix)]
    #[test]
    fn interface_name_with_nul() {
        let err = interface_index("en\0").expect_err("should fail");

        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
