//! Bit flags carried in routing-message headers.
//!
//! Flags read from the kernel are built with `from_bits_retain`, so bits this library does
//! not name survive decoding and re-encoding unchanged.

use bitflags::bitflags;

use crate::abi::{iff, rta, rtf};

bitflags! {
    /// Route flags, `rtm_flags`. Address messages carry the same bits in `ifam_flags`.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RouteFlags: u32 {
        /// Route usable.
        const UP = rtf::UP;
        /// Destination is a gateway.
        const GATEWAY = rtf::GATEWAY;
        /// Host entry (net otherwise).
        const HOST = rtf::HOST;
        /// Host or net unreachable.
        const REJECT = rtf::REJECT;
        /// Created dynamically (by redirect).
        const DYNAMIC = rtf::DYNAMIC;
        /// Modified dynamically (by redirect).
        const MODIFIED = rtf::MODIFIED;
        /// Message confirmed.
        const DONE = rtf::DONE;
        /// Delete cloned route.
        const DELCLONE = rtf::DELCLONE;
        /// Generate new routes on use.
        const CLONING = rtf::CLONING;
        /// External daemon resolves name.
        const XRESOLVE = rtf::XRESOLVE;
        /// Generated by link layer (e.g. ARP).
        const LLINFO = rtf::LLINFO;
        /// Manually added.
        const STATIC = rtf::STATIC;
        /// Just discard packets (during updates).
        const BLACKHOLE = rtf::BLACKHOLE;
        /// Not eligible for `RTF_IFREF`.
        const NOIFREF = rtf::NOIFREF;
        /// Protocol specific routing flag.
        const PROTO2 = rtf::PROTO2;
        /// Protocol specific routing flag.
        const PROTO1 = rtf::PROTO1;
        /// Protocol requires cloning.
        const PRCLONING = rtf::PRCLONING;
        /// Route generated through cloning.
        const WASCLONED = rtf::WASCLONED;
        /// Protocol specific routing flag.
        const PROTO3 = rtf::PROTO3;
        /// Route represents a local address.
        const LOCAL = rtf::LOCAL;
        /// Route represents a broadcast address.
        const BROADCAST = rtf::BROADCAST;
        /// Route represents a multicast address.
        const MULTICAST = rtf::MULTICAST;
        /// Has valid interface scope.
        const IFSCOPE = rtf::IFSCOPE;
        /// Defunct; no longer modifiable.
        const CONDEMNED = rtf::CONDEMNED;
        /// Route holds a reference to the interface.
        const IFREF = rtf::IFREF;
        /// Proxying, no interface scope.
        const PROXY = rtf::PROXY;
        /// Host is a router.
        const ROUTER = rtf::ROUTER;
        /// Route entry is being freed.
        const DEAD = rtf::DEAD;
    }
}

impl RouteFlags {
    /// Returns true if the route is usable.
    pub const fn is_up(&self) -> bool {
        self.contains(Self::UP)
    }

    /// Returns true if the destination is reached through a gateway.
    pub const fn is_gateway(&self) -> bool {
        self.contains(Self::GATEWAY)
    }

    /// Returns true for a host route.
    pub const fn is_host(&self) -> bool {
        self.contains(Self::HOST)
    }

    /// Returns true if the route was added manually.
    pub const fn is_static(&self) -> bool {
        self.contains(Self::STATIC)
    }

    /// Returns true if the route is scoped to an interface.
    pub const fn is_ifscope(&self) -> bool {
        self.contains(Self::IFSCOPE)
    }

    /// Returns true if the route represents a local address.
    pub const fn is_local(&self) -> bool {
        self.contains(Self::LOCAL)
    }

    /// Returns true if the entry is being freed.
    pub const fn is_dead(&self) -> bool {
        self.contains(Self::DEAD)
    }
}

bitflags! {
    /// The address bitmask, `rtm_addrs`, marking which address slots follow the header.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AddressFlags: u32 {
        /// `RTA_DST`
        const DESTINATION = rta::DST;
        /// `RTA_GATEWAY`
        const GATEWAY = rta::GATEWAY;
        /// `RTA_NETMASK`
        const NETMASK = rta::NETMASK;
        /// `RTA_GENMASK`
        const GENMASK = rta::GENMASK;
        /// `RTA_IFP`
        const INTERFACE_LINK = rta::IFP;
        /// `RTA_IFA`
        const INTERFACE_ADDRESS = rta::IFA;
        /// `RTA_AUTHOR`
        const AUTHOR = rta::AUTHOR;
        /// `RTA_BRD`
        const BROADCAST = rta::BRD;
    }
}

impl AddressFlags {
    /// Returns true if a destination address is present.
    pub const fn has_destination(&self) -> bool {
        self.contains(Self::DESTINATION)
    }

    /// Returns true if a gateway address is present.
    pub const fn has_gateway(&self) -> bool {
        self.contains(Self::GATEWAY)
    }

    /// Returns true if a netmask is present.
    pub const fn has_netmask(&self) -> bool {
        self.contains(Self::NETMASK)
    }

    /// Returns true if the link address of the interface is present.
    pub const fn has_interface_link(&self) -> bool {
        self.contains(Self::INTERFACE_LINK)
    }

    /// Returns true if the address of the interface is present.
    pub const fn has_interface_address(&self) -> bool {
        self.contains(Self::INTERFACE_ADDRESS)
    }

    /// Number of address entries marked present.
    pub const fn count(&self) -> u32 {
        (self.bits() & ((1 << rta::MAX) - 1)).count_ones()
    }
}

bitflags! {
    /// Interface flags, `ifm_flags`.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LinkFlags: u32 {
        /// Interface is up.
        const UP = iff::UP;
        /// Broadcast address valid.
        const BROADCAST = iff::BROADCAST;
        /// Turn on debugging.
        const DEBUG = iff::DEBUG;
        /// Is a loopback net.
        const LOOPBACK = iff::LOOPBACK;
        /// Interface is point-to-point link.
        const POINTOPOINT = iff::POINTOPOINT;
        /// Obsolete: avoid use of trailers.
        const NOTRAILERS = iff::NOTRAILERS;
        /// Resources allocated.
        const RUNNING = iff::RUNNING;
        /// No address resolution protocol.
        const NOARP = iff::NOARP;
        /// Receive all packets.
        const PROMISC = iff::PROMISC;
        /// Receive all multicast packets.
        const ALLMULTI = iff::ALLMULTI;
        /// Transmission in progress.
        const OACTIVE = iff::OACTIVE;
        /// Can't hear own transmissions.
        const SIMPLEX = iff::SIMPLEX;
        /// Supports multicast.
        const MULTICAST = iff::MULTICAST;
    }
}

impl LinkFlags {
    /// Returns true if the interface is administratively up.
    pub const fn is_up(&self) -> bool {
        self.contains(Self::UP)
    }

    /// Returns true if the interface has its resources allocated.
    pub const fn is_running(&self) -> bool {
        self.contains(Self::RUNNING)
    }

    /// Returns true for a loopback interface.
    pub const fn is_loopback(&self) -> bool {
        self.contains(Self::LOOPBACK)
    }

    /// Returns true for a point-to-point interface, such as a tunnel.
    pub const fn is_pointopoint(&self) -> bool {
        self.contains(Self::POINTOPOINT)
    }
}
