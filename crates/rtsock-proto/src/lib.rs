//! Types, parsing, and encoding of BSD routing-socket messages.
//!
//! The layouts follow the Darwin `rt_msghdr` ABI. All encoding is done field by field
//! through [`bytes`] buffers, so the produced bytes do not depend on the layout of any
//! Rust type.

pub mod abi;
pub mod error;
pub mod flags;
pub mod header;
pub mod message;
pub mod request;
pub mod sockaddr;
pub(crate) mod utils;
pub mod wire_encoding;

pub use error::{DecodeError, InadequateBufferSize};
pub use header::{MessageHeader, MessageType};
pub use request::{InterfaceInfoRequest, InvalidArgument, RouteRequest};
