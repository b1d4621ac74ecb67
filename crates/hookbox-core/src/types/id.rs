//! Newtype wrappers around the numeric identifiers stored in hook rows.
//!
//! Using distinct types prevents accidentally passing a receiver entity id
//! where a hook id is expected. When the `sqlx` feature is enabled each
//! wrapper is transparent over `BIGINT`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `i64`.
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the inner numeric value.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_numeric_id!(
    /// Auto-increment identifier of a hook row.
    HookId
);

define_numeric_id!(
    /// Identifier of the business entity a hook concerns (user, video, ...).
    ReceiverId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: HookId = " 42 ".parse().unwrap();
        assert_eq!(id, HookId(42));
        assert_eq!(id.to_string(), "42");
        assert!("abc".parse::<ReceiverId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&HookId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
