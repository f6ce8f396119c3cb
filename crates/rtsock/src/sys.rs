use std::io;

use tokio::net::UnixStream;

/// Opens a raw `PF_ROUTE` socket and registers it with the tokio reactor.
///
/// A routing socket is read and written with plain `read(2)` and `write(2)`, so it is
/// driven as a stream; each read returns exactly one message.
#[cfg(target_vendor = "apple")]
pub(crate) fn open_route_socket() -> io::Result<UnixStream> {
    use std::os::fd::{FromRawFd, OwnedFd};

    // SAFETY: `socket` has no preconditions; the result is checked below.
    let fd = unsafe { libc::socket(libc::PF_ROUTE, libc::SOCK_RAW, libc::AF_UNSPEC) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: the descriptor was just created and is owned by nothing else.
    let fd = unsafe { OwnedFd::from_raw_fd(fd) };
    tracing::trace!(?fd, "opened routing socket");

    let stream = std::os::unix::net::UnixStream::from(fd);
    stream.set_nonblocking(true)?;

    UnixStream::from_std(stream)
}

#[cfg(not(target_vendor = "apple"))]
pub(crate) fn open_route_socket() -> io::Result<UnixStream> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "routing sockets with the rt_msghdr layout are only available on Apple targets",
    ))
}
