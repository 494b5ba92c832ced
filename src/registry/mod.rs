//! Charity registry lookups.
//!
//! Two interchangeable backends answer the same two questions: which charity
//! has this registration number, and which charity best matches this text.
//! The dispatcher only sees the [`CharityResolver`] trait.

pub mod charitybase;
pub mod findthatcharity;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::common::error::ResolveResult;
use crate::common::CharityRecord;
use crate::config::types::{RegistryBackend, RegistryConfig};

pub use charitybase::CharityBaseResolver;
pub use findthatcharity::FindThatCharityResolver;

/// Outcome of a registry lookup that reached the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(CharityRecord),
    NotFound,
}

impl Resolution {
    pub fn into_record(self) -> Option<CharityRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }
}

impl From<Option<CharityRecord>> for Resolution {
    fn from(record: Option<CharityRecord>) -> Self {
        record.map_or(Self::NotFound, Self::Found)
    }
}

/// Resolves registration numbers and search text to charity records.
///
/// Implementations make exactly one request per call and never retry.
#[async_trait]
pub trait CharityResolver: Send + Sync {
    /// Backend name for log lines.
    fn name(&self) -> &'static str;

    async fn resolve_by_number(&self, registration_number: &str) -> ResolveResult<Resolution>;

    async fn resolve_by_search(&self, query: &str) -> ResolveResult<Resolution>;
}

#[async_trait]
impl<R: CharityResolver + ?Sized> CharityResolver for Arc<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn resolve_by_number(&self, registration_number: &str) -> ResolveResult<Resolution> {
        (**self).resolve_by_number(registration_number).await
    }

    async fn resolve_by_search(&self, query: &str) -> ResolveResult<Resolution> {
        (**self).resolve_by_search(query).await
    }
}

/// Build the resolver selected in configuration.
pub fn build_resolver(
    config: &RegistryConfig,
    timeout: Duration,
) -> Result<Arc<dyn CharityResolver>, reqwest::Error> {
    let client = http_client(timeout)?;
    let resolver: Arc<dyn CharityResolver> = match config.backend {
        RegistryBackend::CharityBase => Arc::new(CharityBaseResolver::new(
            client,
            config.base_url.clone(),
        )),
        RegistryBackend::FindThatCharity => Arc::new(FindThatCharityResolver::new(
            client,
            config.base_url.clone(),
        )),
    };
    Ok(resolver)
}

/// HTTP client shared by the registry backends.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("charitybot/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Send a lookup request and decode its JSON body.
///
/// Error statuses and undecodable bodies count as "nothing found"; only
/// failures to reach the registry are errors.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    backend: &'static str,
) -> ResolveResult<Option<T>> {
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        debug!(backend, status = status.as_u16(), "Registry returned error status");
        return Ok(None);
    }

    match response.json::<T>().await {
        Ok(body) => Ok(Some(body)),
        Err(e) if e.is_decode() => {
            warn!(backend, "Unreadable registry response: {}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Correct the common `SCO` for `SC0` typo in Scottish numbers.
pub fn normalize_registration_number(registration_number: &str) -> String {
    let trimmed = registration_number.trim();
    match trimmed.strip_prefix("SCO") {
        Some(rest) => format!("SC0{}", rest),
        None => trimmed.to_string(),
    }
}

/// Keep the four-digit year of a registry date such as `1962-01-17T00:00:00`.
pub(crate) fn year_of(date: &str) -> Option<String> {
    let year: String = date.chars().take(4).collect();
    if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
        Some(year)
    } else {
        None
    }
}

/// Treat blank strings as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
