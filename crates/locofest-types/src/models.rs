use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Account tier stored on the user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Standard,
    Premium,
    Boss,
}

impl Role {
    /// Premium and boss accounts get the extended retention window.
    pub fn is_privileged(self) -> bool {
        matches!(self, Role::Premium | Role::Boss)
    }

    /// Moderators. Only they may issue chat blocks, and they cannot be blocked.
    pub fn is_elevated(self) -> bool {
        self == Role::Boss
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Premium => "premium",
            Role::Boss => "boss",
        }
    }

    /// Lenient conversion for stored values: anything unrecognised, including
    /// a missing role, is a standard account.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Role::Standard),
            "premium" => Ok(Role::Premium),
            "boss" => Ok(Role::Boss),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email_verified: bool,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

/// A public event, or an event nested in a private calendar when
/// `calendar_id` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub calendar_id: Option<String>,
    pub creator_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub owner_id: Option<String>,
    /// Older calendars only carry `user_id`.
    pub user_id: Option<String>,
}

impl Calendar {
    /// Empty ids count as unset, so a blank `owner_id` still falls back.
    pub fn owner(&self) -> Option<&str> {
        fn non_empty(id: &Option<String>) -> Option<&str> {
            id.as_deref().filter(|s| !s.is_empty())
        }
        non_empty(&self.owner_id).or_else(|| non_empty(&self.user_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub event_id: Option<String>,
    pub reporter_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// One row per (user, channel); re-blocking overwrites the expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub user_id: String,
    pub channel_id: String,
    pub blocked_until: DateTime<Utc>,
}

/// Analytics sub-collections hanging off every event.
pub const ANALYTICS_COLLECTIONS: [&str; 4] =
    ["views", "event_views", "event_participations", "event_shares"];

/// The two message channel kinds. They share the window trim and differ only
/// in where messages live and which column orders them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    CityChat,
    Canal,
}

impl ChannelKind {
    pub fn table(self) -> &'static str {
        match self {
            ChannelKind::CityChat => "city_messages",
            ChannelKind::Canal => "canal_messages",
        }
    }

    pub fn parent_column(self) -> &'static str {
        match self {
            ChannelKind::CityChat => "city_id",
            ChannelKind::Canal => "calendar_id",
        }
    }

    pub fn order_column(self) -> &'static str {
        match self {
            ChannelKind::CityChat => "timestamp",
            ChannelKind::Canal => "created_at",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::CityChat => f.write_str("city chat"),
            ChannelKind::Canal => f.write_str("canal"),
        }
    }
}
