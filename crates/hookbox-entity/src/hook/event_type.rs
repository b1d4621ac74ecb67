//! Event types and the delivery channels they belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use hookbox_core::AppError;

/// Delivery channel of an event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Email-campaign provider.
    Mail,
    /// Push-notification provider.
    Push,
    /// Outbound webhook subscribers.
    Webhook,
}

impl Channel {
    /// Return the channel as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "mail",
            Self::Push => "push",
            Self::Webhook => "webhook",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Discriminator selecting the handler for a hook.
///
/// Stored in the row as its dotted string form so that rows written by a
/// newer deployment still load; see [`crate::Hook::parsed_event_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Add or update a user in the email-campaign contact list.
    #[serde(rename = "mail.contact_sync")]
    MailContactSync,
    /// Send a templated transactional email.
    #[serde(rename = "mail.transactional")]
    MailTransactional,
    /// Send a push notification to a user's devices.
    #[serde(rename = "push.notification")]
    PushNotification,
    /// Notify subscribers that a video was published.
    #[serde(rename = "webhook.video_published")]
    WebhookVideoPublished,
    /// Notify subscribers that a video changed.
    #[serde(rename = "webhook.video_updated")]
    WebhookVideoUpdated,
}

impl EventType {
    /// Every event type. A dispatcher must cover all of them.
    pub const ALL: [EventType; 5] = [
        Self::MailContactSync,
        Self::MailTransactional,
        Self::PushNotification,
        Self::WebhookVideoPublished,
        Self::WebhookVideoUpdated,
    ];

    /// The channel that delivers this event type.
    pub fn channel(&self) -> Channel {
        match self {
            Self::MailContactSync | Self::MailTransactional => Channel::Mail,
            Self::PushNotification => Channel::Push,
            Self::WebhookVideoPublished | Self::WebhookVideoUpdated => Channel::Webhook,
        }
    }

    /// Return the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MailContactSync => "mail.contact_sync",
            Self::MailTransactional => "mail.transactional",
            Self::PushNotification => "push.notification",
            Self::WebhookVideoPublished => "webhook.video_published",
            Self::WebhookVideoUpdated => "webhook.video_updated",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == s)
            .ok_or_else(|| AppError::configuration(format!("Unknown event type: '{s}'")))
    }
}
