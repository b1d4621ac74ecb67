//! Kind of business entity a hook concerns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use hookbox_core::AppError;

/// Business subject kind, stored as a `SMALLINT` next to the receiver id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum ReceiverKind {
    /// A platform user.
    User = 1,
    /// An uploaded video.
    Video = 2,
    /// An administrator account.
    Admin = 3,
    /// A creator channel.
    Channel = 4,
}

impl ReceiverKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Video => "video",
            Self::Admin => "admin",
            Self::Channel => "channel",
        }
    }
}

impl fmt::Display for ReceiverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReceiverKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "video" => Ok(Self::Video),
            "admin" => Ok(Self::Admin),
            "channel" => Ok(Self::Channel),
            _ => Err(AppError::validation(format!(
                "Invalid receiver kind: '{s}'. Expected one of: user, video, admin, channel"
            ))),
        }
    }
}
