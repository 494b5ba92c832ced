//! Twitter REST API response shapes.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::common::{Mention, MentionId};

/// `created_at` format used by the v1.1 API: `Wed May 10 12:00:00 +0000 2017`.
pub const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

#[derive(Debug, Deserialize)]
pub struct ApiTweet {
    pub id_str: String,
    pub created_at: String,
    /// Present when requested with `tweet_mode=extended`.
    pub full_text: Option<String>,
    pub text: Option<String>,
    pub user: ApiUser,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
    pub screen_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrors {
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: Option<i64>,
    pub message: String,
}

impl ApiErrors {
    /// Human-readable summary of an error body.
    pub fn summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| match e.code {
                    Some(code) => format!("{} (code {})", e.message, code),
                    None => e.message.clone(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Parse a v1.1 `created_at` timestamp.
pub fn parse_created_at(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT).map(|dt| dt.with_timezone(&Utc))
}

impl ApiTweet {
    pub fn into_mention(self) -> Result<Mention, chrono::ParseError> {
        Ok(Mention {
            created_at: parse_created_at(&self.created_at)?,
            id: MentionId(self.id_str),
            author: self.user.screen_name,
            text: self.full_text.or(self.text).unwrap_or_default(),
        })
    }
}
