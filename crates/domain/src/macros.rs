//! Display and FromStr for string-backed domain enums
//!
//! Settings files and environment variables carry enum values such as plan
//! tiers as plain strings. This macro gives those enums one canonical
//! spelling for output and case-insensitive parsing for input.
//!
//! # Example
//!
//! ```rust
//! use tickbridge_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Resolution {
//!     Day,
//!     Week,
//! }
//!
//! impl_domain_status_conversions!(Resolution {
//!     Day => "day",
//!     Week => "week",
//! });
//!
//! assert_eq!("WEEK".parse::<Resolution>(), Ok(Resolution::Week));
//! ```

/// Implements Display and FromStr traits for string-backed enums
///
/// Display writes the mapped string verbatim; FromStr lowercases its input
/// before matching, so mapped strings must be lowercase.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}
