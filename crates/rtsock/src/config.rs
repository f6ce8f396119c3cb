//! Configuration of a [`RouteSocket`][crate::socket::RouteSocket].

use std::time::Duration;

/// Default capacity reserved for reading from the socket.
///
/// The kernel delivers one message per read and truncates messages that do not fit, so this
/// must exceed the largest message expected. Route messages carrying IPv6 and link
/// addresses stay well below 1 KiB.
pub const DEFAULT_RECV_BUFFER_LEN: usize = 2048;

/// Options applied when opening a routing socket.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use rtsock::config::SocketConfig;
/// let config = SocketConfig::default()
///     .with_receive_timeout(Duration::from_secs(5))
///     .with_pid(42);
///
/// assert_eq!(config.receive_timeout(), Some(Duration::from_secs(5)));
/// assert_eq!(config.pid(), 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConfig {
    receive_timeout: Option<Duration>,
    pid: i32,
    recv_buffer_len: usize,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            receive_timeout: None,
            pid: std::process::id() as i32,
            recv_buffer_len: DEFAULT_RECV_BUFFER_LEN,
        }
    }
}

impl SocketConfig {
    /// Fails a receive with [`ReceiveError::Timeout`][crate::socket::ReceiveError::Timeout]
    /// if no message arrives within the duration.
    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout = Some(timeout);
        self
    }

    /// Sets the process identifier written into requests and expected in replies.
    ///
    /// Defaults to the identifier of the current process.
    pub fn with_pid(mut self, pid: i32) -> Self {
        self.pid = pid;
        self
    }

    /// Sets the capacity reserved for each read from the socket.
    pub fn with_recv_buffer_len(mut self, length: usize) -> Self {
        self.recv_buffer_len = length.max(rtsock_proto::MessageHeader::LENGTH);
        self
    }

    /// The receive timeout, if any.
    pub fn receive_timeout(&self) -> Option<Duration> {
        self.receive_timeout
    }

    /// The process identifier used in requests.
    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// The capacity reserved for each read.
    pub fn recv_buffer_len(&self) -> usize {
        self.recv_buffer_len
    }
}
