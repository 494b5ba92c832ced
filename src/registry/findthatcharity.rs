//! Find that Charity backend.
//!
//! Both operations go through `GET /api/v1/charities`, either by `id` or by
//! free-text `q`, and return `{ "results": [ ... ] }`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{fetch_json, non_blank, normalize_registration_number, year_of};
use super::{CharityResolver, Resolution};
use crate::common::error::ResolveResult;
use crate::common::{CharityRecord, RegistrationStatus};

const DEFAULT_BASE_URL: &str = "https://findthatcharity.uk";

const CHARITIES_PATH: &str = "/api/v1/charities";

pub struct FindThatCharityResolver {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Vec<ApiOrganisation>>,
}

#[derive(Debug, Deserialize)]
struct ApiOrganisation {
    id: Option<String>,
    name: Option<String>,
    active: Option<bool>,
    date_registered: Option<String>,
    url: Option<String>,
}

impl ApiOrganisation {
    fn into_record(self, requested: Option<&str>) -> CharityRecord {
        let registration_number = self
            .id
            .or_else(|| requested.map(str::to_string))
            .unwrap_or_default();

        CharityRecord {
            name: non_blank(self.name).unwrap_or_else(|| registration_number.clone()),
            registration_number,
            // Records without an explicit flag are on the register
            status: match self.active {
                Some(false) => RegistrationStatus::Removed,
                _ => RegistrationStatus::Active,
            },
            registered_year: self.date_registered.as_deref().and_then(year_of),
            website: non_blank(self.url),
        }
    }
}

impl FindThatCharityResolver {
    pub fn new(client: reqwest::Client, base_url: Option<String>) -> Self {
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            client,
            url: format!("{}{}", base.trim_end_matches('/'), CHARITIES_PATH),
        }
    }

    fn first_record(response: Option<SearchResponse>, requested: Option<&str>) -> Resolution {
        response
            .and_then(|r| r.results)
            .and_then(|results| results.into_iter().next())
            .map(|org| org.into_record(requested))
            .into()
    }
}

#[async_trait]
impl CharityResolver for FindThatCharityResolver {
    fn name(&self) -> &'static str {
        "findthatcharity"
    }

    async fn resolve_by_number(&self, registration_number: &str) -> ResolveResult<Resolution> {
        let number = normalize_registration_number(registration_number);
        debug!(registration_number = %number, "Looking up charity on Find that Charity");

        let request = self
            .client
            .get(&self.url)
            .query(&[("id", number.as_str()), ("limit", "1")]);
        let response = fetch_json::<SearchResponse>(request, self.name()).await?;

        Ok(Self::first_record(response, Some(&number)))
    }

    async fn resolve_by_search(&self, query: &str) -> ResolveResult<Resolution> {
        debug!(query, "Searching Find that Charity");

        let request = self.client.get(&self.url).query(&[
            ("q", query),
            ("active", "true"),
            ("sort", "-income"),
            ("limit", "1"),
        ]);
        let response = fetch_json::<SearchResponse>(request, self.name()).await?;

        Ok(Self::first_record(response, None))
    }
}
