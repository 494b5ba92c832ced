//! Shared types used across the application.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform identifier of a mention.
///
/// Opaque to the pipeline; only used to address replies and in log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentionId(pub String);

impl fmt::Display for MentionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MentionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An inbound message addressed to the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub id: MentionId,
    /// Author handle, without the leading `@`.
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Registration state of a charity on the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Active,
    Removed,
}

/// Canonical charity data, independent of the registry backend it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharityRecord {
    pub name: String,
    pub registration_number: String,
    pub status: RegistrationStatus,
    /// Four-digit year of registration, when known.
    pub registered_year: Option<String>,
    /// Website as reported by the registry; may be missing or lack a scheme.
    pub website: Option<String>,
}

impl CharityRecord {
    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Active
    }
}

/// A rendered reply, ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    pub in_reply_to: MentionId,
    /// Handle of the user being answered.
    pub recipient: String,
    pub text: String,
}

/// Compare two platform handles the way the platform does.
///
/// A leading `@` on either side is ignored.
pub fn same_handle(a: &str, b: &str) -> bool {
    a.trim_start_matches('@')
        .eq_ignore_ascii_case(b.trim_start_matches('@'))
}
