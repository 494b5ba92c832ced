//! CharityBase v0.2 backend.
//!
//! `GET /api/v0.2.0/charities` answers both number lookups and text searches,
//! returning `{ "charities": [ ... ] }` with the requested fields.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{fetch_json, non_blank, normalize_registration_number, year_of};
use super::{CharityResolver, Resolution};
use crate::common::error::ResolveResult;
use crate::common::{CharityRecord, RegistrationStatus};

const DEFAULT_BASE_URL: &str = "https://charitybase.uk/api/v0.2.0/charities";

const FIELDS: &str = "mainCharity,registration";

pub struct CharityBaseResolver {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct CharitiesResponse {
    charities: Option<Vec<ApiCharity>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCharity {
    charity_number: Option<String>,
    name: Option<String>,
    /// Missing or null means the charity is no longer registered.
    registered: Option<bool>,
    main_charity: Option<MainCharity>,
    registration: Option<Vec<Registration>>,
}

#[derive(Debug, Deserialize)]
struct MainCharity {
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Registration {
    reg_date: Option<String>,
}

impl ApiCharity {
    fn into_record(self, requested: Option<&str>) -> CharityRecord {
        let registration_number = self
            .charity_number
            .or_else(|| requested.map(str::to_string))
            .unwrap_or_default();

        CharityRecord {
            name: non_blank(self.name).unwrap_or_else(|| registration_number.clone()),
            registration_number,
            status: if self.registered.unwrap_or(false) {
                RegistrationStatus::Active
            } else {
                RegistrationStatus::Removed
            },
            registered_year: self
                .registration
                .as_deref()
                .and_then(<[Registration]>::first)
                .and_then(|r| r.reg_date.as_deref())
                .and_then(year_of),
            website: non_blank(self.main_charity.and_then(|m| m.website)),
        }
    }
}

impl CharityBaseResolver {
    pub fn new(client: reqwest::Client, base_url: Option<String>) -> Self {
        Self {
            client,
            url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn first_record(
        response: Option<CharitiesResponse>,
        requested: Option<&str>,
    ) -> Resolution {
        response
            .and_then(|r| r.charities)
            .and_then(|charities| charities.into_iter().next())
            .map(|c| c.into_record(requested))
            .into()
    }
}

#[async_trait]
impl CharityResolver for CharityBaseResolver {
    fn name(&self) -> &'static str {
        "charitybase"
    }

    async fn resolve_by_number(&self, registration_number: &str) -> ResolveResult<Resolution> {
        let number = normalize_registration_number(registration_number);
        debug!(registration_number = %number, "Looking up charity on CharityBase");

        let request = self.client.get(&self.url).query(&[
            ("charityNumber", number.as_str()),
            ("subNumber", "0"),
            ("fields", FIELDS),
            ("limit", "1"),
        ]);
        let response = fetch_json::<CharitiesResponse>(request, self.name()).await?;

        Ok(Self::first_record(response, Some(&number)))
    }

    async fn resolve_by_search(&self, query: &str) -> ResolveResult<Resolution> {
        debug!(query, "Searching CharityBase");

        let request = self.client.get(&self.url).query(&[
            ("registered", "true"),
            ("search", query),
            ("fields", FIELDS),
            ("sort", "-mainCharity.income"),
            ("limit", "1"),
        ]);
        let response = fetch_json::<CharitiesResponse>(request, self.name()).await?;

        Ok(Self::first_record(response, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CharitiesResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_full_record() {
        let response = parse(
            r#"{"charities": [{
                "charityNumber": "1234567",
                "name": "Example Trust",
                "registered": true,
                "mainCharity": {"website": "example.org"},
                "registration": [{"regDate": "1990-03-01T00:00:00.000Z", "remDate": null}]
            }]}"#,
        );

        let resolution = CharityBaseResolver::first_record(Some(response), Some("1234567"));
        assert_eq!(
            resolution,
            Resolution::Found(CharityRecord {
                name: "Example Trust".to_string(),
                registration_number: "1234567".to_string(),
                status: RegistrationStatus::Active,
                registered_year: Some("1990".to_string()),
                website: Some("example.org".to_string()),
            })
        );
    }

    #[test]
    fn test_removed_record_with_missing_fields() {
        let response = parse(
            r#"{"charities": [{
                "charityNumber": "202918",
                "name": "Old Charity",
                "registered": false,
                "mainCharity": {"website": ""}
            }]}"#,
        );

        let record = CharityBaseResolver::first_record(Some(response), None)
            .into_record()
            .unwrap();
        assert_eq!(record.status, RegistrationStatus::Removed);
        assert_eq!(record.registered_year, None);
        assert_eq!(record.website, None);
    }

    #[test]
    fn test_null_fields_decode_as_removed() {
        let response = parse(
            r#"{"charities": [{
                "charityNumber": "1234567",
                "name": "Example Trust",
                "registered": null,
                "mainCharity": null,
                "registration": null
            }]}"#,
        );

        let record = CharityBaseResolver::first_record(Some(response), None)
            .into_record()
            .unwrap();
        assert_eq!(record.name, "Example Trust");
        assert_eq!(record.status, RegistrationStatus::Removed);
        assert_eq!(record.registered_year, None);
        assert_eq!(record.website, None);

        let null_list = parse(r#"{"charities": null}"#);
        assert_eq!(
            CharityBaseResolver::first_record(Some(null_list), None),
            Resolution::NotFound
        );
    }

    #[test]
    fn test_missing_number_falls_back_to_request() {
        let response = parse(r#"{"charities": [{"name": "Scottish Trust", "registered": true}]}"#);

        let record = CharityBaseResolver::first_record(Some(response), Some("SC012345"))
            .into_record()
            .unwrap();
        assert_eq!(record.registration_number, "SC012345");
    }

    #[test]
    fn test_empty_and_missing_results_are_not_found() {
        let empty = parse(r#"{"charities": []}"#);
        assert_eq!(
            CharityBaseResolver::first_record(Some(empty), None),
            Resolution::NotFound
        );

        let no_key = parse(r#"{"error": "bad request"}"#);
        assert_eq!(
            CharityBaseResolver::first_record(Some(no_key), None),
            Resolution::NotFound
        );

        assert_eq!(CharityBaseResolver::first_record(None, None), Resolution::NotFound);
    }

    #[test]
    fn test_default_url() {
        let resolver = CharityBaseResolver::new(reqwest::Client::new(), None);
        assert_eq!(resolver.url, DEFAULT_BASE_URL);
    }
}
