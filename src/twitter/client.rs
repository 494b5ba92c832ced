//! Twitter REST client.
//!
//! Implements [`MentionSource`] over the v1.1 endpoints: mentions timeline,
//! status update and credential verification.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{ApiErrors, ApiTweet, ApiUser};
use super::oauth::{Credentials, Nonce};
use crate::common::error::{SourceError, SourceResult};
use crate::common::{Mention, MentionId};
use crate::config::types::TwitterConfig;
use crate::pipeline::MentionSource;

/// Mentions fetched per request (the API maximum).
const MENTIONS_PAGE_SIZE: &str = "200";

/// Legacy "Enhance Your Calm" rate-limit status.
const ENHANCE_YOUR_CALM: u16 = 420;

pub struct TwitterClient {
    client: reqwest::Client,
    api_base: String,
    credentials: Credentials,
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("charitybot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials: Credentials {
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
                access_token: config.access_token.clone(),
                access_token_secret: config.access_token_secret.clone(),
            },
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Send a signed request. GET parameters go in the query string, POST
    /// parameters in a form body.
    async fn send(&self, method: Method, path: &str, params: &[(&str, &str)]) -> SourceResult<Response> {
        let url = self.endpoint(path);
        let header = self.credentials.authorization_header(
            method.as_str(),
            &url,
            params,
            &Nonce::generate(),
        )?;

        let request = self
            .client
            .request(method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, header);
        let request = if method == Method::POST {
            request.form(params)
        } else {
            request.query(params)
        };

        debug!(%method, path, "Twitter request");
        let response = request.send().await?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> SourceResult<T> {
        let response = self.send(method, path, params).await?;
        response.json::<T>().await.map_err(|e| SourceError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

/// Map error statuses onto [`SourceError`].
async fn check_status(response: Response) -> SourceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if is_rate_limit(status) {
        return Err(SourceError::RateLimited);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SourceError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn is_rate_limit(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == ENHANCE_YOUR_CALM
}

/// Prefer the API's structured error list, fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrors>(body)
        .ok()
        .and_then(|errors| errors.summary())
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl MentionSource for TwitterClient {
    async fn fetch_mentions(&self) -> SourceResult<Vec<Mention>> {
        let tweets: Vec<ApiTweet> = self
            .send_json(
                Method::GET,
                "statuses/mentions_timeline.json",
                &[("count", MENTIONS_PAGE_SIZE), ("tweet_mode", "extended")],
            )
            .await?;

        tweets
            .into_iter()
            .map(|tweet| {
                let id = tweet.id_str.clone();
                tweet.into_mention().map_err(|e| SourceError::InvalidResponse {
                    message: format!("bad created_at on tweet {}: {}", id, e),
                })
            })
            .collect()
    }

    async fn post_reply(&self, text: &str, in_reply_to: &MentionId) -> SourceResult<()> {
        self.send(
            Method::POST,
            "statuses/update.json",
            &[("status", text), ("in_reply_to_status_id", in_reply_to.0.as_str())],
        )
        .await?;
        Ok(())
    }

    async fn authenticated_handle(&self) -> SourceResult<String> {
        let user: ApiUser = self
            .send_json(Method::GET, "account/verify_credentials.json", &[])
            .await?;
        Ok(user.screen_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::{closed_port, serve_once};

    fn client_at(api_base: String) -> TwitterClient {
        let mut config = TwitterConfig::default();
        config.api_base = api_base;
        TwitterClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    async fn status_of(status: &'static str, body: &'static str) -> SourceResult<Response> {
        let url = serve_once(status, body).await;
        let response = reqwest::get(url).await.unwrap();
        check_status(response).await
    }

    #[tokio::test]
    async fn test_check_status_maps_rate_limits() {
        let result = status_of("429 Too Many Requests", "{}").await;
        assert!(matches!(result, Err(SourceError::RateLimited)));

        let result = status_of("420 Enhance Your Calm", "").await;
        assert!(matches!(result, Err(SourceError::RateLimited)));
    }

    #[tokio::test]
    async fn test_check_status_rejects_other_errors() {
        let result = status_of(
            "403 Forbidden",
            r#"{"errors":[{"code":187,"message":"Status is a duplicate."}]}"#,
        )
        .await;
        match result {
            Err(SourceError::Rejected { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Status is a duplicate. (code 187)");
            }
            other => panic!("expected rejection, got {:?}", other.map(|r| r.status())),
        }

        assert!(status_of("200 OK", "[]").await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limited_fetch() {
        let url = serve_once("429 Too Many Requests", r#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#).await;
        let client = client_at(url);

        let result = client.fetch_mentions().await;
        assert!(matches!(result, Err(SourceError::RateLimited)));
    }

    #[tokio::test]
    async fn test_fetch_mentions_over_http() {
        let url = serve_once(
            "200 OK",
            r#"[{"id_str":"1","created_at":"Wed May 10 12:30:00 +0000 2017","full_text":"@CharityRandom 1234567","user":{"screen_name":"someone"}}]"#,
        )
        .await;
        let client = client_at(url);

        let mentions = client.fetch_mentions().await.unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].author, "someone");
        assert_eq!(mentions[0].text, "@CharityRandom 1234567");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        let client = client_at(closed_port().await);

        let result = client.post_reply("hello", &MentionId::from("1")).await;
        assert!(matches!(result, Err(SourceError::Transport { .. })));
    }

    #[test]
    fn test_rate_limit_statuses() {
        assert!(is_rate_limit(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_rate_limit(StatusCode::from_u16(420).unwrap()));
        assert!(!is_rate_limit(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"errors":[{"code":32,"message":"Could not authenticate you."}]}"#),
            "Could not authenticate you. (code 32)"
        );
        assert_eq!(error_message(" Over capacity \n"), "Over capacity");
    }

    #[test]
    fn test_endpoint_joins_base() {
        let mut config = TwitterConfig::default();
        config.api_base = "https://api.twitter.com/1.1/".to_string();
        let client = TwitterClient::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.endpoint("statuses/update.json"),
            "https://api.twitter.com/1.1/statuses/update.json"
        );
    }
}
