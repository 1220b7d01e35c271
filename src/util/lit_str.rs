//! Unit types standing for one fixed string.
//!
//! [`lit_str!`](crate::lit_str) generates a zero-sized type that serializes as its literal
//! and refuses any other value on deserialization. Payloads carrying a constant tag
//! (like the `flow` marker of a degraded QRIS payment) use it instead of a `String`.
//!
//! ```
//! ovoid::lit_str!(LegacyFlow, "qris_v2_fallback_legacy");
//!
//! assert_eq!(LegacyFlow.to_string(), "qris_v2_fallback_legacy");
//! assert!("qris".parse::<LegacyFlow>().is_err());
//! ```

/// Creates a type that represents a specific string literal.
#[macro_export]
macro_rules! lit_str {
    ($struct_name:ident, $val:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $struct_name;

        impl $struct_name {
            pub const VALUE: &'static str = $val;
        }

        impl AsRef<str> for $struct_name {
            fn as_ref(&self) -> &str {
                Self::VALUE
            }
        }

        impl std::str::FromStr for $struct_name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s == Self::VALUE {
                    Ok($struct_name)
                } else {
                    Err(format!("expected '{}', got '{}'", Self::VALUE, s))
                }
            }
        }

        impl serde::Serialize for $struct_name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(Self::VALUE)
            }
        }

        impl<'de> serde::Deserialize<'de> for $struct_name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse::<$struct_name>().map_err(serde::de::Error::custom)
            }
        }

        impl std::fmt::Display for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(Self::VALUE)
            }
        }
    };
}
