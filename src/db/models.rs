use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = u64;
pub type MessageId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Offers blood.
    #[serde(alias = "donate")]
    Donor,
    /// Looking for blood.
    #[serde(alias = "need", alias = "requester")]
    Recipient,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donor" | "donate" => Ok(Role::Donor),
            "recipient" | "need" | "requester" => Ok(Role::Recipient),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Donor => f.write_str("donor"),
            Role::Recipient => f.write_str("recipient"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub credential_secret: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Trimmed, lowercased form used for every username comparison.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// A live session as handed to the client. The registry only keeps a digest
/// of `token`, never the token itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub owner_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// True when the unordered participant pair equals `{a, b}`.
    pub fn is_between(&self, a: UserId, b: UserId) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}
