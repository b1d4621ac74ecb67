//! Fencing token proving current ownership of a claimed hook.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random lease token written to `lock_identifier` by a claim.
///
/// Every claim mints a fresh token, so a worker whose lease expired and was
/// reclaimed holds a token that no longer matches the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(transparent))]
#[serde(transparent)]
pub struct LockToken(pub Uuid);

impl LockToken {
    /// Mint a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LockToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for LockToken {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}
