//! Asynchronous access to BSD routing sockets: route requests, replies, and waiting for a
//! default route or for an interface to come up.

pub mod config;
pub mod default_route;
pub mod interface;
pub mod socket;
#[cfg(unix)]
mod sys;

#[cfg(unix)]
pub use interface::interface_index;
pub use config::SocketConfig;
pub use interface::{InterfaceCondition, InterfaceSpec};
pub use socket::{ReceiveError, RequestError, RouteSocket, SendError, WaitError};
