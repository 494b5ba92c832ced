//! Registration number and search command extraction.
//!
//! Scans mention text for charity registration numbers (England & Wales
//! numbers are 6-7 digits, Scottish ones are `SC` plus 5-6 characters) and for
//! an explicit `@handle search: <query>` command at the start of a mention.

use fancy_regex::Regex;
use tracing::warn;

/// Registration numbers: 6-7 digits not starting with zero, or `SC` followed
/// by 5-6 digits. `O` is accepted among the digits since it is a common typo.
/// Six characters after `SC` are allowed so real Scottish numbers such as
/// `SC012345` match, not only the shorter five-character form.
const REGNO_PATTERN: &str = r"\b([1-9][0-9]{5,6}|SC[O0-9]{5,6})\b";

/// Everything a mention asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Registration numbers in order of appearance, duplicates kept.
    pub registration_numbers: Vec<String>,
    /// Free-text query from a search command.
    pub search_query: Option<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.registration_numbers.is_empty() && self.search_query.is_none()
    }
}

/// Extracts lookup requests from mention text.
#[derive(Debug, Clone)]
pub struct Extractor {
    regno: Regex,
    search: Regex,
}

impl Extractor {
    /// Create an extractor recognising search commands addressed to `handle`.
    ///
    /// The handle must already be a valid platform handle
    /// (see [`crate::config::validate::is_valid_handle`]).
    pub fn new(handle: &str) -> Result<Self, fancy_regex::Error> {
        let handle = handle.trim_start_matches('@');
        Ok(Self {
            regno: Regex::new(REGNO_PATTERN)?,
            search: Regex::new(&format!(r"^(?i:@{})\b search:?\s(.*)", handle))?,
        })
    }

    /// Run both extractions over the same text.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        ExtractionResult {
            registration_numbers: self.registration_numbers(text),
            search_query: self.search_query(text),
        }
    }

    /// All registration numbers in `text`, left to right.
    pub fn registration_numbers(&self, text: &str) -> Vec<String> {
        self.regno
            .find_iter(text)
            .filter_map(|m| match m {
                Ok(m) => Some(m.as_str().to_string()),
                Err(e) => {
                    warn!("Registration number match error: {}", e);
                    None
                }
            })
            .collect()
    }

    /// The query of a search command, if the text starts with one.
    pub fn search_query(&self, text: &str) -> Option<String> {
        let captures = match self.search.captures(text) {
            Ok(captures) => captures?,
            Err(e) => {
                warn!("Search command match error: {}", e);
                return None;
            }
        };

        let query = captures.get(1)?.as_str().trim();
        if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        }
    }
}
