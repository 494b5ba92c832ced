//! Reply formatting.
//!
//! Renders a resolved charity (or a failed search) into one reply addressed
//! to the requesting user. Supports placeholders: %user, %name, %regno,
//! %registered, %website, %query, %link

use crate::common::CharityRecord;
use crate::config::types::RepliesConfig;

/// Reply for a charity still on the register.
pub const ACTIVE_FORMAT: &str = "@%user %name [%regno]%registered %website";

/// Reply for a charity that has been removed from the register.
pub const REMOVED_FORMAT: &str = "@%user %name [%regno removed charity] %website";

/// Reply for a search that found nothing.
pub const NOT_FOUND_FORMAT: &str = "@%user Nothing found for \"%query\" I'm afraid%link";

const ELLIPSIS: char = '…';

/// What the user asked for, which decides how a missing record is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind<'a> {
    /// A registration number found in the mention text.
    Number,
    /// An explicit search command with its query.
    Search(&'a str),
}

/// Builds reply text from lookup outcomes.
#[derive(Debug, Clone)]
pub struct ReplyFormatter {
    detail_url: String,
    search_url: Option<String>,
    max_length: usize,
}

impl Default for ReplyFormatter {
    fn default() -> Self {
        Self::new(&RepliesConfig::default())
    }
}

impl ReplyFormatter {
    pub fn new(config: &RepliesConfig) -> Self {
        Self {
            detail_url: config.detail_url.clone(),
            search_url: config.search_url.clone(),
            max_length: config.max_length,
        }
    }

    /// Render the reply for one lookup.
    ///
    /// Returns `None` when a bare number resolved to nothing; those are not
    /// worth answering. Every other case yields a non-empty reply within the
    /// configured length.
    pub fn format_reply(
        &self,
        record: Option<&CharityRecord>,
        user: &str,
        request: RequestKind<'_>,
    ) -> Option<String> {
        let user = user.trim_start_matches('@');
        match (record, request) {
            (Some(record), _) => Some(self.format_found(record, user)),
            (None, RequestKind::Search(query)) => Some(self.format_not_found(user, query)),
            (None, RequestKind::Number) => None,
        }
    }

    fn format_found(&self, record: &CharityRecord, user: &str) -> String {
        let registered = record
            .registered_year
            .as_deref()
            .map(|year| format!(" reg {}", year))
            .unwrap_or_default();
        let website = self.website_for(record);
        let template = if record.is_active() {
            ACTIVE_FORMAT
        } else {
            REMOVED_FORMAT
        };

        let render = |name: &str| {
            substitute(
                template,
                &[
                    ("user", user),
                    ("name", name),
                    ("regno", record.registration_number.as_str()),
                    ("registered", registered.as_str()),
                    ("website", website.as_str()),
                ],
            )
        };

        self.fit(&record.name, render)
    }

    fn format_not_found(&self, user: &str, query: &str) -> String {
        let link = self
            .search_url
            .as_ref()
            .map(|url| format!(" {}", url.replace("{query}", &urlencoding::encode(query))))
            .unwrap_or_default();

        let render = |query: &str| {
            substitute(
                NOT_FOUND_FORMAT,
                &[("user", user), ("query", query), ("link", link.as_str())],
            )
        };

        self.fit(query, render)
    }

    /// The charity's own website, or its register page when it has none.
    pub fn website_for(&self, record: &CharityRecord) -> String {
        match record.website.as_deref().map(str::trim) {
            Some(website) if !website.is_empty() => with_scheme(website),
            _ => self
                .detail_url
                .replace("{regno}", &record.registration_number),
        }
    }

    /// Render, shortening the one free-text value first if the reply is too long.
    fn fit(&self, value: &str, render: impl Fn(&str) -> String) -> String {
        let full = render(value);
        if char_len(&full) <= self.max_length {
            return full;
        }

        let overhead = char_len(&render(""));
        let available = self.max_length.saturating_sub(overhead);
        let shortened = if available == 0 {
            String::new()
        } else {
            let mut s: String = value.chars().take(available - 1).collect();
            s.push(ELLIPSIS);
            s
        };

        truncate_chars(&render(&shortened), self.max_length)
    }
}

/// Prefix `http://` when the website has no scheme.
fn with_scheme(website: &str) -> String {
    let lower = website.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        website.to_string()
    } else {
        format!("http://{}", website)
    }
}

/// Replace `%key` placeholders in a single pass.
///
/// Substituted values are never rescanned, so a charity name containing
/// `%regno` stays as written.
fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        // Longest key first so %registered wins over a shorter prefix
        let matched = values
            .iter()
            .filter(|(key, _)| after.starts_with(key))
            .max_by_key(|(key, _)| key.len());

        match matched {
            Some((key, value)) => {
                out.push_str(value);
                rest = &after[key.len()..];
            }
            None => {
                out.push('%');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `s` to at most `max` characters without splitting a character.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RegistrationStatus;

    fn record() -> CharityRecord {
        CharityRecord {
            name: "Example Trust".to_string(),
            registration_number: "1234567".to_string(),
            status: RegistrationStatus::Active,
            registered_year: None,
            website: Some("example.org".to_string()),
        }
    }

    #[test]
    fn test_active_reply() {
        let formatter = ReplyFormatter::default();
        let reply = formatter.format_reply(Some(&record()), "user", RequestKind::Number);
        assert_eq!(
            reply.as_deref(),
            Some("@user Example Trust [1234567] http://example.org")
        );
    }

    #[test]
    fn test_active_reply_with_year() {
        let formatter = ReplyFormatter::default();
        let mut record = record();
        record.registered_year = Some("1990".to_string());
        record.website = Some("https://example.org".to_string());

        let reply = formatter.format_reply(Some(&record), "@user", RequestKind::Number);
        assert_eq!(
            reply.as_deref(),
            Some("@user Example Trust [1234567] reg 1990 https://example.org")
        );
    }

    #[test]
    fn test_removed_reply_falls_back_to_register_page() {
        let formatter = ReplyFormatter::default();
        let mut record = record();
        record.status = RegistrationStatus::Removed;
        record.registered_year = Some("1990".to_string());
        record.website = None;

        let reply = formatter
            .format_reply(Some(&record), "user", RequestKind::Number)
            .unwrap();
        assert_eq!(
            reply,
            "@user Example Trust [1234567 removed charity] \
             http://beta.charitycommission.gov.uk/charity-details/?regid=1234567&subid=0"
        );
    }

    #[test]
    fn test_blank_website_uses_register_page() {
        let formatter = ReplyFormatter::default();
        let mut record = record();
        record.website = Some("   ".to_string());
        assert!(formatter.website_for(&record).contains("regid=1234567"));
    }

    #[test]
    fn test_missing_number_is_silent() {
        let formatter = ReplyFormatter::default();
        assert_eq!(formatter.format_reply(None, "user", RequestKind::Number), None);
    }

    #[test]
    fn test_failed_search_apologises() {
        let formatter = ReplyFormatter::default();
        let reply = formatter
            .format_reply(None, "user", RequestKind::Search("red cross"))
            .unwrap();
        assert!(reply.starts_with("@user Nothing found for \"red cross\" I'm afraid "));
        assert!(reply.ends_with("q=red%20cross"));
    }

    #[test]
    fn test_failed_search_without_link() {
        let formatter = ReplyFormatter::new(&RepliesConfig {
            search_url: None,
            ..RepliesConfig::default()
        });
        let reply = formatter.format_reply(None, "user", RequestKind::Search("red cross"));
        assert_eq!(
            reply.as_deref(),
            Some("@user Nothing found for \"red cross\" I'm afraid")
        );
    }

    #[test]
    fn test_search_hit_uses_charity_reply() {
        let formatter = ReplyFormatter::default();
        let reply = formatter.format_reply(Some(&record()), "user", RequestKind::Search("example"));
        assert_eq!(
            reply.as_deref(),
            Some("@user Example Trust [1234567] http://example.org")
        );
    }

    #[test]
    fn test_empty_record_still_replies() {
        let formatter = ReplyFormatter::default();
        let record = CharityRecord {
            name: String::new(),
            registration_number: String::new(),
            status: RegistrationStatus::Removed,
            registered_year: None,
            website: None,
        };
        let reply = formatter
            .format_reply(Some(&record), "user", RequestKind::Number)
            .unwrap();
        assert!(!reply.is_empty());
        assert!(reply.starts_with("@user"));
    }

    #[test]
    fn test_long_name_is_shortened() {
        let formatter = ReplyFormatter::new(&RepliesConfig {
            max_length: 60,
            ..RepliesConfig::default()
        });
        let mut record = record();
        record.name = "The Very Long Named Charitable Foundation For Everything".to_string();

        let reply = formatter
            .format_reply(Some(&record), "user", RequestKind::Number)
            .unwrap();
        assert_eq!(reply.chars().count(), 60);
        assert!(reply.contains('…'));
        assert!(reply.starts_with("@user The Very"));
        assert!(reply.ends_with("[1234567] http://example.org"));
    }

    #[test]
    fn test_long_query_is_shortened() {
        let formatter = ReplyFormatter::new(&RepliesConfig {
            max_length: 50,
            search_url: None,
            ..RepliesConfig::default()
        });
        let query = "ünïcödé ".repeat(20);
        let reply = formatter
            .format_reply(None, "user", RequestKind::Search(&query))
            .unwrap();
        assert!(reply.chars().count() <= 50);
        assert!(reply.ends_with("…\" I'm afraid"));
    }

    #[test]
    fn test_substitute_is_single_pass() {
        let out = substitute("%name [%regno]", &[("name", "100%regno"), ("regno", "1")]);
        assert_eq!(out, "100%regno [1]");
        assert_eq!(substitute("50% off", &[("user", "x")]), "50% off");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
    }
}
