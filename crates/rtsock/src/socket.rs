//! A routing socket driven by tokio, and the requests and waits built on it.

use std::{io, net::Ipv4Addr};

use bytes::{Bytes, BytesMut};
use rtsock_proto::{
    message::{KernelMessage, MessageParser, RouteMessage},
    wire_encoding::WireEncode,
    DecodeError,
    InterfaceInfoRequest,
    InvalidArgument,
    MessageType,
    RouteRequest,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    config::SocketConfig,
    default_route::is_usable_default_route,
    interface::{index_for_name, is_interface_ready, InterfaceCondition, InterfaceSpec},
};

/// Errors returned when writing a request to the socket.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Writing to the socket failed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The kernel rejected the request because the route does not exist.
    #[error("no such route")]
    NoSuchRoute,
}

/// Errors returned when receiving a message from the socket.
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    /// Reading from the socket failed, or the socket was closed.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The kernel sent a malformed message, which was dropped.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// No message arrived within the receive timeout.
    #[error("timed out waiting for a routing message")]
    Timeout,
    /// The reply to a request carried a non-zero `rtm_errno`.
    #[error("the kernel failed the request with errno {0}")]
    Kernel(i32),
}

/// Errors returned by a request that expects a reply.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request could not be built from the arguments.
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    /// The request could not be sent.
    #[error(transparent)]
    Send(#[from] SendError),
    /// The reply could not be received.
    #[error(transparent)]
    Receive(#[from] ReceiveError),
}

/// Errors returned while waiting for a network condition.
#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    /// No routing message arrived within the receive timeout.
    #[error("timed out waiting for a routing message")]
    Timeout,
    /// The kernel sent a malformed message.
    #[error("received a malformed routing message")]
    Decode(#[source] DecodeError),
    /// Reading from or writing to the socket failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ReceiveError> for WaitError {
    fn from(value: ReceiveError) -> Self {
        match value {
            ReceiveError::Io(err) => Self::Io(err),
            ReceiveError::Decode(err) => Self::Decode(err),
            ReceiveError::Timeout => Self::Timeout,
            ReceiveError::Kernel(errno) => Self::Io(io::Error::from_raw_os_error(errno)),
        }
    }
}

/// A routing socket, or any stream carrying routing messages.
///
/// Requests are written whole and replies are framed by their declared length, so the
/// stream may also be an in-memory pipe standing in for the kernel.
#[derive(Debug)]
pub struct RouteSocket<S> {
    inner: S,
    config: SocketConfig,
    sequence: i32,
    recv_buffer: BytesMut,
    parser: MessageParser,
}

#[cfg(unix)]
impl RouteSocket<tokio::net::UnixStream> {
    /// Opens a routing socket of the host.
    ///
    /// The socket receives every routing message of the system from the moment it is
    /// opened, so it should be opened before querying state that may change.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::Unsupported`] on hosts other than Apple platforms.
    pub async fn open(config: SocketConfig) -> io::Result<Self> {
        let stream = crate::sys::open_route_socket()?;
        Ok(Self::from_stream(stream, config))
    }
}

impl<S> RouteSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a stream that exchanges routing messages.
    pub fn from_stream(stream: S, config: SocketConfig) -> Self {
        Self {
            inner: stream,
            sequence: 0,
            recv_buffer: BytesMut::with_capacity(config.recv_buffer_len()),
            parser: MessageParser::new(),
            config,
        }
    }

    /// The configuration of the socket.
    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// The number of malformed messages received and discarded so far.
    pub fn dropped_messages(&self) -> u64 {
        self.parser.dropped()
    }

    /// Returns the next sequence number for a request on this socket.
    pub fn next_sequence(&mut self) -> i32 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Writes a request to the socket.
    pub async fn send(&mut self, request: &RouteRequest) -> Result<(), SendError> {
        tracing::trace!(
            message_type = ?request.message_type(),
            seq = request.sequence(),
            destination = %request.destination(),
            netmask = %request.netmask(),
            "sending route request"
        );
        let mut data = request.encode_to_bytes();
        self.write_request(&mut data).await
    }

    /// Sends a lookup of the route through the interface with the given index, returning
    /// the sequence number its reply will carry.
    ///
    /// The reply reports the link address and address of the interface. Fails with
    /// [`SendError::NoSuchRoute`] if no route goes through the interface.
    pub async fn request_interface_info(&mut self, index: u16) -> Result<i32, SendError> {
        let sequence = self.next_sequence();
        let request = InterfaceInfoRequest::new(index, sequence, self.config.pid());
        tracing::trace!(index, seq = sequence, "sending interface request");

        let mut data = request.encode_to_bytes();
        self.write_request(&mut data).await?;

        Ok(sequence)
    }

    async fn write_request(&mut self, data: &mut Bytes) -> Result<(), SendError> {
        match self.inner.write_all_buf(data).await {
            Err(err) if err.raw_os_error() == Some(libc::ESRCH) => Err(SendError::NoSuchRoute),
            Err(err) => Err(err.into()),
            Ok(()) => Ok(()),
        }
    }

    /// Sends a request of the given type, returning the sequence number its reply will
    /// carry.
    pub async fn request(
        &mut self,
        message_type: MessageType,
        destination: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<i32, RequestError> {
        let sequence = self.next_sequence();
        let request = RouteRequest::new(
            message_type,
            sequence,
            self.config.pid(),
            destination,
            netmask,
        )?;
        self.send(&request).await?;

        Ok(sequence)
    }

    /// Receives the next message from the socket.
    ///
    /// Fails with [`ReceiveError::Timeout`] if a receive timeout is configured and no
    /// message arrives in time. Any partially received message is retained for the next
    /// call.
    pub async fn receive(&mut self) -> Result<KernelMessage, ReceiveError> {
        match self.config.receive_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, self.receive_message())
                .await
                .map_err(|_| ReceiveError::Timeout)?,
            None => self.receive_message().await,
        }
    }

    async fn receive_message(&mut self) -> Result<KernelMessage, ReceiveError> {
        loop {
            if let Some(message) = self.parser.parse(&mut self.recv_buffer)? {
                return Ok(message);
            }

            // The kernel truncates a message that does not fit the space available.
            self.recv_buffer.reserve(self.config.recv_buffer_len());
            if let 0 = self.inner.read_buf(&mut self.recv_buffer).await? {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
        }
    }

    /// Receives messages until the reply to the request with the given sequence number
    /// arrives.
    ///
    /// Messages of other senders and other requests are discarded. The receive timeout
    /// applies to each message, not to the wait as a whole.
    pub async fn receive_reply(&mut self, sequence: i32) -> Result<RouteMessage, ReceiveError> {
        loop {
            let KernelMessage::Route(route) = self.receive().await? else {
                continue;
            };

            if route.header.pid != self.config.pid() || route.header.seq != sequence {
                tracing::trace!(
                    pid = route.header.pid,
                    seq = route.header.seq,
                    "skipping unrelated route message"
                );
                continue;
            }

            if let Some(errno) = route.errno() {
                return Err(ReceiveError::Kernel(errno));
            }
            return Ok(route);
        }
    }

    /// Looks up the route the kernel would use for the destination.
    pub async fn get_route(
        &mut self,
        destination: Ipv4Addr,
        netmask: Ipv4Addr,
    ) -> Result<RouteMessage, RequestError> {
        let sequence = self.request(MessageType::Get, destination, netmask).await?;
        Ok(self.receive_reply(sequence).await?)
    }

    /// Waits until a usable default route exists.
    ///
    /// The current default route is requested first; if there is none, route messages are
    /// watched until one is added. See [`is_usable_default_route`] for the conditions a
    /// route must meet.
    pub async fn wait_for_default_route(&mut self) -> Result<RouteMessage, WaitError> {
        let sequence = self.next_sequence();
        let request = RouteRequest::new(
            MessageType::Get,
            sequence,
            self.config.pid(),
            Ipv4Addr::UNSPECIFIED,
            Ipv4Addr::UNSPECIFIED,
        )
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        match self.send(&request).await {
            Ok(()) => tracing::debug!(seq = sequence, "requested the default route"),
            Err(SendError::NoSuchRoute) => tracing::debug!("no default route yet"),
            Err(SendError::Io(err)) => return Err(err.into()),
        }

        loop {
            let KernelMessage::Route(route) = self.receive().await? else {
                continue;
            };

            if is_usable_default_route(&route) {
                tracing::info!(gateway = ?route.addrs.gateway, "found default route");
                return Ok(route);
            }
            tracing::trace!(
                operation = ?route.operation(),
                flags = ?route.flags(),
                "route message does not describe a usable default route"
            );
        }
    }

    /// Waits until the interface meets the condition.
    ///
    /// If the index of the interface is known, the route through it is requested first.
    /// An interface given by name is recognized by the link address in any message about
    /// it, after which it is tracked by index. See [`is_interface_ready`] for the messages
    /// that satisfy the condition.
    pub async fn wait_for_interface(
        &mut self,
        condition: InterfaceCondition,
        mut interface: InterfaceSpec,
    ) -> Result<KernelMessage, WaitError> {
        match &interface {
            InterfaceSpec::Index(index) => match self.request_interface_info(*index).await {
                Ok(sequence) => tracing::debug!(index, seq = sequence, "requested interface"),
                Err(SendError::NoSuchRoute) => tracing::debug!(index, "no route on interface yet"),
                Err(SendError::Io(err)) => return Err(err.into()),
            },
            InterfaceSpec::Name(name) => {
                tracing::info!(interface = %name, "interface index unknown, watching messages")
            }
        }

        loop {
            let message = self.receive().await?;

            if let InterfaceSpec::Name(name) = &interface {
                if let Some(index) = index_for_name(&message, name) {
                    tracing::debug!(interface = %name, index, "resolved interface index");
                    interface = InterfaceSpec::Index(index);
                }
            }

            if let InterfaceSpec::Index(index) = interface {
                if is_interface_ready(&message, condition, index) {
                    tracing::info!(index, ?condition, "interface is ready");
                    return Ok(message);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_wraps_around() {
        let (stream, _peer) = tokio::io::duplex(64);
        let mut socket = RouteSocket::from_stream(stream, SocketConfig::default());
        socket.sequence = i32::MAX - 1;

        assert_eq!(socket.next_sequence(), i32::MAX);
        assert_eq!(socket.next_sequence(), i32::MIN);
        assert_eq!(socket.next_sequence(), i32::MIN + 1);
    }
}
