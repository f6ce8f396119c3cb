//! Recognizing a default route that can carry traffic.

use rtsock_proto::{message::RouteMessage, sockaddr::SockAddr, MessageType};

/// Returns true if the message reports a default route that can carry traffic.
///
/// The route must be added, changed or reported by a lookup, be up, have a gateway, and
/// have the unspecified IPv4 or IPv6 address as its destination.
pub fn is_usable_default_route(route: &RouteMessage) -> bool {
    if !matches!(
        route.operation(),
        Some(MessageType::Add | MessageType::Change | MessageType::Get)
    ) {
        return false;
    }
    if route.errno().is_some() {
        return false;
    }
    if !route.flags().is_up() || route.addrs.gateway.is_none() {
        return false;
    }

    match &route.addrs.destination {
        Some(SockAddr::V4(address)) => address.ip().is_unspecified(),
        Some(SockAddr::V6(address)) => address.ip().is_unspecified(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr, SocketAddrV4, SocketAddrV6};

    use rtsock_proto::{
        abi::{rtf, rtm},
        flags::{AddressFlags, RouteFlags},
        header::RouteMetrics,
        message::AddressSet,
        MessageHeader,
    };
    use test_utils::param_test;

    use super::*;

    fn v4(octets: [u8; 4]) -> Option<SockAddr> {
        Some(SockAddr::V4(SocketAddrV4::new(Ipv4Addr::from(octets), 0)))
    }

    fn route(message_type: u8, flags: u32, errno: i32, addrs: AddressSet) -> RouteMessage {
        RouteMessage {
            header: MessageHeader {
                length: 0,
                version: rtsock_proto::abi::RTM_VERSION,
                message_type,
                index: 0,
                flags: RouteFlags::from_bits_retain(flags),
                addrs: AddressFlags::empty(),
                pid: 0,
                seq: 0,
                errno,
                use_count: 0,
                inits: 0,
                metrics: RouteMetrics::default(),
            },
            addrs,
        }
    }

    fn default_via_gateway() -> AddressSet {
        AddressSet {
            destination: v4([0, 0, 0, 0]),
            gateway: v4([192, 168, 1, 1]),
            netmask: v4([0, 0, 0, 0]),
            ..Default::default()
        }
    }

    param_test! {
        usable_by_operation: [
            add: (rtm::ADD, true),
            change: (rtm::CHANGE, true),
            get: (rtm::GET, true),
            delete: (rtm::DELETE, false),
            miss: (rtm::MISS, false),
            redirect: (rtm::REDIRECT, false)
        ]
    }
    fn usable_by_operation(message_type: u8, expected: bool) {
        let route = route(message_type, rtf::UP | rtf::GATEWAY, 0, default_via_gateway());

        assert_eq!(is_usable_default_route(&route), expected);
    }

    #[test]
    fn route_must_be_up() {
        let route = route(rtm::ADD, rtf::GATEWAY, 0, default_via_gateway());

        assert!(!is_usable_default_route(&route));
    }

    #[test]
    fn gateway_must_be_present() {
        let addrs = AddressSet {
            gateway: None,
            ..default_via_gateway()
        };

        assert!(!is_usable_default_route(&route(rtm::ADD, rtf::UP, 0, addrs)));
    }

    #[test]
    fn failed_lookup_is_not_usable() {
        let route = route(rtm::GET, rtf::UP | rtf::GATEWAY, 3, default_via_gateway());

        assert!(!is_usable_default_route(&route));
    }

    #[test]
    fn network_route_is_not_default() {
        let addrs = AddressSet {
            destination: v4([10, 0, 0, 0]),
            ..default_via_gateway()
        };

        assert!(!is_usable_default_route(&route(rtm::ADD, rtf::UP, 0, addrs)));
    }

    #[test]
    fn ipv6_default_route() {
        let addrs = AddressSet {
            destination: Some(SockAddr::V6(SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, 0, 0, 0))),
            gateway: Some(SockAddr::V6(SocketAddrV6::new(
                "fe80::1".parse().unwrap(),
                0,
                0,
                4,
            ))),
            ..Default::default()
        };

        assert!(is_usable_default_route(&route(rtm::ADD, rtf::UP, 0, addrs)));
    }

    #[test]
    fn missing_destination() {
        let addrs = AddressSet {
            destination: None,
            ..default_via_gateway()
        };

        assert!(!is_usable_default_route(&route(rtm::GET, rtf::UP, 0, addrs)));
    }
}
