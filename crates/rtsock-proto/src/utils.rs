//! Utils used internally in other modules.

/// Creates an enum for a field encoded as a short integer, such as `sa_family`.
///
/// Each named variant carries its raw value and the name of its C constant; all other
/// values map to the catch-all variant. The macro generates `const` conversions in both
/// directions, [`From`] implementations delegating to them, and a [`std::fmt::Display`]
/// implementation printing the constant name.
macro_rules! encoded_type {
    (
        $(#[$outer:meta])*
        pub enum $name:ident ($raw:ty) {
            $($(#[$doc:meta])* $variant:ident = $value:literal => $c_name:literal),*;
            $(#[$doc_other:meta])* $variant_other:ident,
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$doc])* $variant,)*
            $(#[$doc_other])* $variant_other($raw),
        }

        impl $name {
            /// Interprets a raw value.
            pub const fn from_raw(value: $raw) -> Self {
                match value {
                    $($value => Self::$variant,)*
                    other => Self::$variant_other(other),
                }
            }

            /// Returns the raw value.
            pub const fn to_raw(self) -> $raw {
                match self {
                    $(Self::$variant => $value,)*
                    Self::$variant_other(value) => value,
                }
            }
        }

        impl From<$raw> for $name {
            fn from(value: $raw) -> Self {
                Self::from_raw(value)
            }
        }

        impl From<$name> for $raw {
            fn from(value: $name) -> Self {
                value.to_raw()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($c_name),)*
                    Self::$variant_other(value) => write!(f, "{} {}", stringify!($name), value),
                }
            }
        }
    };
}
pub(crate) use encoded_type;
