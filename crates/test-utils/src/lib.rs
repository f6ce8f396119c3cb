//! Test utilities shared between the routing-socket crates.

/// Returns the offsets at which two encoded messages differ.
///
/// Bytes past the end of the shorter slice are reported as differing.
///
/// ```
/// # use test_utils::differing_offsets;
/// assert_eq!(differing_offsets(&[5, 1, 0, 0], &[5, 2, 0, 0]), vec![1]);
/// ```
pub fn differing_offsets(lhs: &[u8], rhs: &[u8]) -> Vec<usize> {
    (0..lhs.len().max(rhs.len()))
        .filter(|&offset| lhs.get(offset) != rhs.get(offset))
        .collect()
}

/// Macro for creating parametrized *synchronous* tests.
///
/// The `param_test!` macro accepts the name of an existing function, followed by a list of case
/// names and their arguments. It expands to a module with a `#[test]` function for each of the
/// cases. Each test case calls the existing, named function with their provided arguments.
///
/// See [`async_param_test`] for a similar macro that works with `async` function.
///
/// # Examples
///
/// ```
/// # use test_utils::param_test;
/// #
/// param_test! {
///     prefix_length: [
///         default_route: (0x0000_0000, 0),
///         class_c: (0xffff_ff00, 24),
///         host: (0xffff_ffff, 32)
///     ]
/// }
/// fn prefix_length(netmask: u32, expected: u32) {
///     assert_eq!(netmask.leading_ones(), expected);
/// }
/// ```
///
/// Test functions can also return a [`Result`], and attributes such as `#[ignore]` may be
/// added to individual cases:
///
/// ```
/// # use std::{error::Error, net::Ipv4Addr};
/// # use test_utils::param_test;
/// #
/// param_test! {
///     parses_netmask -> Result<(), Box<dyn Error>>: [
///         class_a: ("255.0.0.0", [255, 0, 0, 0]),
///         #[ignore] all_ones: ("255.255.255.255", [255; 4])
///     ]
/// }
/// fn parses_netmask(text: &str, octets: [u8; 4]) -> Result<(), Box<dyn Error>> {
///     assert_eq!(text.parse::<Ipv4Addr>()?.octets(), octets);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! param_test {
    ($func_name:ident -> $return_ty:ty: [
        $( $(#[$outer:meta])* $case_name:ident: ( $($args:expr),+ )  ),+$(,)?
    ]) => {
        mod $func_name {
            use super::*;

            $(
                #[test]
                $(#[$outer])*
                fn $case_name() -> $return_ty {
                    $func_name($($args),+)
                }
            )*
        }
    };
    ($func_name:ident: [
        $( $(#[$outer:meta])* $case_name:ident: ( $($args:expr),+ ) ),+$(,)?
    ]) => {
        param_test!($func_name -> (): [ $( $(#[$outer])* $case_name: ( $($args),+ ) ),+ ]);
    };
}

/// Macro for creating parametrized *asynchronous* tests.
///
/// This macro behaves similarly to the [`param_test`] macro, however it must be used with an
/// `async` function. Cases are expanded with the `#[tokio::test]` attribute. To use other
/// attributes, such as `#[tokio::test(start_paused = true)]` for tests relying on timeouts,
/// specify the test attribute on *every* case.
#[macro_export]
macro_rules! async_param_test {
    ($func_name:ident -> $return_ty:ty: [
        $( $(#[$outer:meta])+ $case_name:ident: ( $($args:expr),+ ) ),+$(,)?
    ]) => {
        mod $func_name {
            use super::*;

            $(
                $(#[$outer])+
                async fn $case_name() -> $return_ty {
                    $func_name($($args),+).await
                }
            )*
        }
    };
    ($func_name:ident: [
        $( $(#[$outer:meta])+ $case_name:ident: ( $($args:expr),+ ) ),+$(,)?
    ]) => {
        async_param_test!( $func_name -> (): [ $( $(#[$outer])+ $case_name: ($($args),+) ),* ] );
    };

    ($func_name:ident: [
        $( $case_name:ident: ( $($args:expr),+ ) ),+$(,)?
    ]) => {
        async_param_test!( $func_name -> (): [ $( #[tokio::test] $case_name: ($($args),+) ),* ] );
    };
    ($func_name:ident -> $return_ty:ty: [
        $( $case_name:ident: ( $($args:expr),+ ) ),+$(,)?
    ]) => {
        async_param_test!(
            $func_name -> $return_ty: [ $( #[tokio::test] $case_name: ( $($args),+ ) ),* ]
        );
    }
}
