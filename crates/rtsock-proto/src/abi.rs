//! Constants of the Darwin routing-socket ABI.
//!
//! Values are taken from `<net/route.h>` and `<sys/socket.h>`. They are spelled out here
//! rather than imported from `libc` so that messages can be built and inspected on any
//! host, including ones without routing sockets.

/// Version of the routing message format understood by the kernel.
pub const RTM_VERSION: u8 = 5;

/// Message types, `rtm_type`.
pub mod rtm {
    /// Add route.
    pub const ADD: u8 = 0x1;
    /// Delete route.
    pub const DELETE: u8 = 0x2;
    /// Change metrics or flags.
    pub const CHANGE: u8 = 0x3;
    /// Report metrics.
    pub const GET: u8 = 0x4;
    /// Kernel suspects partitioning.
    pub const LOSING: u8 = 0x5;
    /// Told to use different route.
    pub const REDIRECT: u8 = 0x6;
    /// Lookup failed on this address.
    pub const MISS: u8 = 0x7;
    /// Fix specified metrics.
    pub const LOCK: u8 = 0x8;
    /// Caused by SIOCADDRT.
    pub const OLDADD: u8 = 0x9;
    /// Caused by SIOCDELRT.
    pub const OLDDEL: u8 = 0xa;
    /// Request to resolve dst to LL addr.
    pub const RESOLVE: u8 = 0xb;
    /// Address being added to iface.
    pub const NEWADDR: u8 = 0xc;
    /// Address being removed from iface.
    pub const DELADDR: u8 = 0xd;
    /// Iface going up/down etc.
    pub const IFINFO: u8 = 0xe;
    /// Multicast group membership being added to if.
    pub const NEWMADDR: u8 = 0xf;
    /// Multicast group membership being deleted.
    pub const DELMADDR: u8 = 0x10;
    /// Extended interface information.
    pub const IFINFO2: u8 = 0x12;
    /// Extended multicast membership.
    pub const NEWMADDR2: u8 = 0x13;
    /// Extended route report.
    pub const GET2: u8 = 0x14;
}

/// Bits of the address bitmask, `rtm_addrs`, in canonical slot order.
pub mod rta {
    /// Destination sockaddr present.
    pub const DST: u32 = 0x1;
    /// Gateway sockaddr present.
    pub const GATEWAY: u32 = 0x2;
    /// Netmask sockaddr present.
    pub const NETMASK: u32 = 0x4;
    /// Cloning mask sockaddr present.
    pub const GENMASK: u32 = 0x8;
    /// Interface name sockaddr present.
    pub const IFP: u32 = 0x10;
    /// Interface address sockaddr present.
    pub const IFA: u32 = 0x20;
    /// Sockaddr for author of redirect.
    pub const AUTHOR: u32 = 0x40;
    /// Broadcast or point-to-point destination address.
    pub const BRD: u32 = 0x80;

    /// Number of address slots defined by the ABI.
    pub const MAX: usize = 8;
}

/// Route flags, `rtm_flags`.
///
/// See [`crate::flags::RouteFlags`] for the meaning of each bit.
#[allow(missing_docs)]
pub mod rtf {
    pub const UP: u32 = 0x1;
    pub const GATEWAY: u32 = 0x2;
    pub const HOST: u32 = 0x4;
    pub const REJECT: u32 = 0x8;
    pub const DYNAMIC: u32 = 0x10;
    pub const MODIFIED: u32 = 0x20;
    pub const DONE: u32 = 0x40;
    pub const DELCLONE: u32 = 0x80;
    pub const CLONING: u32 = 0x100;
    pub const XRESOLVE: u32 = 0x200;
    pub const LLINFO: u32 = 0x400;
    pub const STATIC: u32 = 0x800;
    pub const BLACKHOLE: u32 = 0x1000;
    pub const NOIFREF: u32 = 0x2000;
    pub const PROTO2: u32 = 0x4000;
    pub const PROTO1: u32 = 0x8000;
    pub const PRCLONING: u32 = 0x10000;
    pub const WASCLONED: u32 = 0x20000;
    pub const PROTO3: u32 = 0x40000;
    pub const LOCAL: u32 = 0x200000;
    pub const BROADCAST: u32 = 0x400000;
    pub const MULTICAST: u32 = 0x800000;
    pub const IFSCOPE: u32 = 0x1000000;
    pub const CONDEMNED: u32 = 0x2000000;
    pub const IFREF: u32 = 0x4000000;
    pub const PROXY: u32 = 0x8000000;
    pub const ROUTER: u32 = 0x10000000;
    pub const DEAD: u32 = 0x20000000;
}

/// Bits of `rtm_inits` selecting which metrics a request initializes.
pub mod rtv {
    /// Init or lock `rmx_mtu`.
    pub const MTU: u32 = 0x1;
    /// Init or lock `rmx_hopcount`.
    pub const HOPCOUNT: u32 = 0x2;
}

/// Interface flags, `ifm_flags`, from `<net/if.h>`.
///
/// See [`crate::flags::LinkFlags`] for the meaning of each bit.
#[allow(missing_docs)]
pub mod iff {
    pub const UP: u32 = 0x1;
    pub const BROADCAST: u32 = 0x2;
    pub const DEBUG: u32 = 0x4;
    pub const LOOPBACK: u32 = 0x8;
    pub const POINTOPOINT: u32 = 0x10;
    pub const NOTRAILERS: u32 = 0x20;
    pub const RUNNING: u32 = 0x40;
    pub const NOARP: u32 = 0x80;
    pub const PROMISC: u32 = 0x100;
    pub const ALLMULTI: u32 = 0x200;
    pub const OACTIVE: u32 = 0x400;
    pub const SIMPLEX: u32 = 0x800;
    pub const MULTICAST: u32 = 0x8000;
}

/// Address families as used in `sa_family`.
#[allow(missing_docs)]
pub mod af {
    pub const UNSPEC: u8 = 0;
    pub const INET: u8 = 2;
    pub const LINK: u8 = 18;
    pub const INET6: u8 = 30;
}

/// Rounds a sockaddr length up to the alignment used between address entries.
///
/// A zero-length entry still occupies one alignment unit.
pub const fn sockaddr_roundup(length: usize) -> usize {
    const ALIGN: usize = 4;

    if length == 0 {
        ALIGN
    } else {
        1 + ((length - 1) | (ALIGN - 1))
    }
}

#[cfg(test)]
mod tests {
    use test_utils::param_test;

    use super::*;

    param_test! {
        roundup_to_four_bytes: [
            empty: (0, 4),
            one: (1, 4),
            mask_prefix: (5, 8),
            exact: (8, 8),
            sockaddr_in: (16, 16),
            sockaddr_dl: (20, 20),
            sockaddr_in6: (28, 28),
            odd_link: (23, 24)
        ]
    }
    fn roundup_to_four_bytes(length: usize, expected: usize) {
        assert_eq!(sockaddr_roundup(length), expected);
    }
}
