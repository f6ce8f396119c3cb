use crate::sockaddr::AddressFamily;

/// Errors raised when failing to decode a routing message or one of its constituents.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum DecodeError {
    /// The provided bytes did not include the full message.
    #[error("the provided bytes did not include the full message")]
    MessageEmptyOrTruncated,
    /// The length declared by the message header does not match the data.
    #[error("declared message length {declared} does not match the {actual} bytes available")]
    LengthMismatch {
        /// The value of `rtm_msglen`.
        declared: u16,
        /// The number of bytes actually available for the message.
        actual: usize,
    },
    /// The header carried a version other than [`crate::abi::RTM_VERSION`].
    #[error("cannot decode message with unsupported version {0}")]
    UnsupportedVersion(u8),
    /// The message type is not valid in this context.
    #[error("unexpected routing message type {0}")]
    UnexpectedMessageType(u8),
    /// The address bitmask does not describe the expected address slots.
    #[error("unexpected address bitmask {0:#x}")]
    UnexpectedAddressBitmask(u32),
    /// A socket address declared a length that overruns the message.
    #[error("socket address of length {0} exceeds the remaining message")]
    SockaddrTruncated(usize),
    /// A socket address has a length inconsistent with its family.
    #[error("invalid socket address length {length} for family {family}")]
    InvalidSockaddrLength {
        /// The family of the socket address.
        family: AddressFamily,
        /// The declared `sa_len`.
        length: u8,
    },
    /// A socket address had a family other than the one expected in its slot.
    #[error("unexpected address family {0}")]
    UnexpectedAddressFamily(AddressFamily),
}

/// Raised if the buffer does not have sufficient capacity for encoding a message.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy, Default)]
#[error("the provided buffer did not have sufficient size")]
pub struct InadequateBufferSize;
