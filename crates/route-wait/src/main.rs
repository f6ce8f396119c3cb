//! Waits until the host has a usable default route, or until an interface gets a routable
//! address or route.
//!
//! The condition is given as `default-route` (the default), `if-gets-address=<interface>`
//! or `if-gets-route=<interface>`; a space or colon may stand in for the `=`.
//!
//! Exits with 0 once the condition holds, 1 on an I/O error, 2 if no routing message
//! arrived within the timeout, and 3 if the kernel sent a malformed message.

use std::{fmt, process::ExitCode, str::FromStr, time::Duration};

use clap::Parser;
use rtsock::{InterfaceCondition, InterfaceSpec, RouteSocket, SocketConfig, WaitError};
use tracing_subscriber::EnvFilter;

/// The condition to wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WaitFor {
    DefaultRoute,
    InterfaceAddress(String),
    InterfaceRoute(String),
}

/// Errors returned when parsing a wait condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum ParseConditionError {
    #[error("missing interface for wait condition {0}")]
    MissingInterface(String),
    #[error("invalid wait condition: {0}")]
    Unknown(String),
}

impl FromStr for WaitFor {
    type Err = ParseConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_terminator(&['=', ' ', ':'][..]);
        let key = parts.next().unwrap_or_default();
        let interface = parts.next().filter(|name| !name.is_empty()).map(str::to_owned);

        match (key, interface) {
            ("default-route", _) => Ok(Self::DefaultRoute),
            ("if-gets-address", Some(name)) => Ok(Self::InterfaceAddress(name)),
            ("if-gets-route", Some(name)) => Ok(Self::InterfaceRoute(name)),
            ("if-gets-address" | "if-gets-route", None) => {
                Err(ParseConditionError::MissingInterface(key.to_owned()))
            }
            _ => Err(ParseConditionError::Unknown(s.to_owned())),
        }
    }
}

impl fmt::Display for WaitFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultRoute => write!(f, "a default route"),
            Self::InterfaceAddress(name) => write!(f, "an address on {name}"),
            Self::InterfaceRoute(name) => write!(f, "a route through {name}"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// What to wait for: default-route, if-gets-address=<interface> or
    /// if-gets-route=<interface>
    #[arg(default_value = "default-route")]
    condition: WaitFor,
    /// Give up if no routing message arrives for this many seconds
    #[arg(short, long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn socket_config(&self) -> SocketConfig {
        let config = SocketConfig::default();
        match self.timeout_secs {
            Some(seconds) => config.with_receive_timeout(Duration::from_secs(seconds)),
            None => config,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(?args, "waiting for {}", args.condition);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "failed waiting for {}", args.condition);
            ExitCode::from(exit_status(&err))
        }
    }
}

async fn run(args: &Args) -> Result<(), WaitError> {
    let mut socket = RouteSocket::open(args.socket_config()).await?;

    let (condition, name) = match &args.condition {
        WaitFor::DefaultRoute => {
            let route = socket.wait_for_default_route().await?;
            tracing::info!(
                destination = ?route.addrs.destination,
                gateway = ?route.addrs.gateway,
                "default route is up"
            );
            return Ok(());
        }
        WaitFor::InterfaceAddress(name) => (InterfaceCondition::HasAddress, name),
        WaitFor::InterfaceRoute(name) => (InterfaceCondition::HasRoute, name),
    };

    let message = socket
        .wait_for_interface(condition, InterfaceSpec::resolve(name))
        .await?;
    let addrs = message.addrs();
    tracing::info!(
        interface = %name,
        destination = ?addrs.and_then(|addrs| addrs.destination.as_ref()),
        address = ?addrs.and_then(|addrs| addrs.interface_address.as_ref()),
        "interface is ready"
    );
    Ok(())
}

fn exit_status(err: &WaitError) -> u8 {
    match err {
        WaitError::Io(_) => 1,
        WaitError::Timeout => 2,
        WaitError::Decode(_) => 3,
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rtsock::ReceiveError;
    use rtsock_proto::DecodeError;
    use test_utils::param_test;

    use super::*;

    #[test]
    fn timeout_sets_receive_timeout() {
        let args = Args::try_parse_from(["route-wait", "--timeout-secs", "30"]).unwrap();

        assert_eq!(
            args.socket_config().receive_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn no_timeout_by_default() {
        let args = Args::try_parse_from(["route-wait"]).unwrap();

        assert_eq!(args.socket_config().receive_timeout(), None);
    }

    #[test]
    fn default_route_by_default() {
        let args = Args::try_parse_from(["route-wait"]).unwrap();

        assert_eq!(args.condition, WaitFor::DefaultRoute);
    }

    param_test! {
        parses_condition: [
            default_route: ("default-route", WaitFor::DefaultRoute),
            address: ("if-gets-address=en0", WaitFor::InterfaceAddress("en0".to_owned())),
            with_colon: ("if-gets-address:en1", WaitFor::InterfaceAddress("en1".to_owned())),
            route: ("if-gets-route=utun3", WaitFor::InterfaceRoute("utun3".to_owned())),
            with_space: ("if-gets-route bridge0", WaitFor::InterfaceRoute("bridge0".to_owned()))
        ]
    }
    fn parses_condition(argument: &str, expected: WaitFor) {
        let args = Args::try_parse_from(["route-wait", argument]).unwrap();

        assert_eq!(args.condition, expected);
    }

    param_test! {
        rejects_condition: [
            missing_interface: (
                "if-gets-address",
                ParseConditionError::MissingInterface("if-gets-address".to_owned())
            ),
            empty_interface: (
                "if-gets-route=",
                ParseConditionError::MissingInterface("if-gets-route".to_owned())
            ),
            unknown: (
                "default-gateway",
                ParseConditionError::Unknown("default-gateway".to_owned())
            )
        ]
    }
    fn rejects_condition(argument: &str, expected: ParseConditionError) {
        assert_eq!(argument.parse::<WaitFor>(), Err(expected));
        assert!(Args::try_parse_from(["route-wait", argument]).is_err());
    }

    #[test]
    fn condition_with_timeout() {
        let args =
            Args::try_parse_from(["route-wait", "-t", "5", "if-gets-address=en0"]).unwrap();

        assert_eq!(args.condition, WaitFor::InterfaceAddress("en0".to_owned()));
        assert_eq!(args.timeout_secs, Some(5));
    }

    #[test]
    fn rejects_negative_timeout() {
        assert!(Args::try_parse_from(["route-wait", "-t", "-1"]).is_err());
    }

    #[test]
    fn exit_statuses() {
        assert_eq!(exit_status(&WaitError::Io(io::ErrorKind::NotFound.into())), 1);
        assert_eq!(exit_status(&WaitError::Timeout), 2);
        assert_eq!(exit_status(&WaitError::from(ReceiveError::Timeout)), 2);
        assert_eq!(
            exit_status(&WaitError::from(ReceiveError::Decode(
                DecodeError::MessageEmptyOrTruncated
            ))),
            3
        );
    }
}
