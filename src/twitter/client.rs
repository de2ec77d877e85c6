//! Authenticated access to the Twitter API v2 search endpoints.
//!
//! [`AuthenticatedClient`] is the capability every authentication scheme
//! provides. [`XApiClient`] implements it for all [`Credentials`] variants,
//! routing traffic through the first configured proxy.

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Proxy, Url};
use serde::de::DeserializeOwned;

use crate::config::Credentials;
use crate::error::ApiError;
use crate::oauth::{build_bearer_auth_header, build_oauth1_header, OAuth1Keys};
use crate::state::ConfigSnapshot;

use super::api::{error_for_payload, fetch_app_only_token, send_api_request};
use super::types::{SearchPage, SearchResponse, UserLookupResponse};

/// Upstream page size. Only the first page is ever fetched.
pub const PAGE_SIZE: &str = "10";

const TWEET_FIELDS: &str =
    "created_at,public_metrics,entities,geo,referenced_tweets,in_reply_to_user_id,author_id";

#[async_trait]
pub trait AuthenticatedClient: Send + Sync {
    /// Makes the client ready to issue searches.
    async fn authenticate(&mut self) -> Result<(), ApiError>;

    /// Fetches the most recent tweets posted by `username`.
    async fn search_by_user(&self, username: &str) -> Result<SearchPage, ApiError>;

    /// Fetches the most recent tweets matching `keyword`.
    async fn search_by_keyword(&self, keyword: &str) -> Result<SearchPage, ApiError>;
}

enum Authorizer {
    Bearer(String),
    OAuth1 {
        api_key: String,
        api_secret_key: String,
        access_token: String,
        access_token_secret: String,
    },
    AppOnly {
        api_key: String,
        api_secret_key: String,
        bearer_token: Option<String>,
    },
}

impl From<&Credentials> for Authorizer {
    fn from(credentials: &Credentials) -> Self {
        match credentials.clone() {
            Credentials::Bearer { bearer_token } => Authorizer::Bearer(bearer_token),
            Credentials::OAuth1 {
                api_key,
                api_secret_key,
                access_token,
                access_token_secret,
            } => Authorizer::OAuth1 {
                api_key,
                api_secret_key,
                access_token,
                access_token_secret,
            },
            Credentials::AppOnly {
                api_key,
                api_secret_key,
            } => Authorizer::AppOnly {
                api_key,
                api_secret_key,
                bearer_token: None,
            },
        }
    }
}

/// Twitter API v2 client bound to one configuration snapshot.
pub struct XApiClient {
    http: Client,
    base_url: String,
    auth: Authorizer,
    proxy: Option<String>,
}

impl XApiClient {
    /// Builds a client from the credentials and first proxy of `snapshot`.
    ///
    /// # Returns
    ///
    /// - `Err(ApiError::ConfigurationMissing)`: If no credentials are set
    /// - `Err(ApiError::UpstreamError)`: If the first proxy cannot be used
    pub fn from_snapshot(base_url: &str, snapshot: &ConfigSnapshot) -> Result<Self, ApiError> {
        let credentials = snapshot
            .credentials
            .as_ref()
            .ok_or(ApiError::ConfigurationMissing)?;
        let proxy = snapshot.active_proxy().map(str::to_string);

        Ok(Self {
            http: build_http_client(proxy.as_deref())?,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Authorizer::from(credentials),
            proxy,
        })
    }

    /// The proxy all requests of this client go through.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    fn authorization_for(&self, url: &Url) -> Result<String, ApiError> {
        match &self.auth {
            Authorizer::Bearer(token) => Ok(build_bearer_auth_header(token)),
            Authorizer::OAuth1 {
                api_key,
                api_secret_key,
                access_token,
                access_token_secret,
            } => build_oauth1_header(
                "GET",
                url,
                OAuth1Keys {
                    api_key,
                    api_secret_key,
                    access_token,
                    access_token_secret,
                },
            ),
            Authorizer::AppOnly {
                bearer_token: Some(token),
                ..
            } => Ok(build_bearer_auth_header(token)),
            Authorizer::AppOnly {
                bearer_token: None, ..
            } => Err(ApiError::UpstreamError(
                "app-only client used before authentication".into(),
            )),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        operation_name: &str,
    ) -> Result<T, ApiError> {
        let url = Url::parse_with_params(&format!("{}/{}", self.base_url, path), query)
            .map_err(|e| ApiError::UpstreamError(format!("invalid request URL: {}", e)))?;
        debug!("Request URL: {}", url);

        let auth_header = self.authorization_for(&url)?;
        let request_builder = self.http.get(url).header(AUTHORIZATION, auth_header);

        let body = send_api_request(request_builder, operation_name).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Resolves a username to its account id.
    async fn lookup_user_id(&self, username: &str) -> Result<String, ApiError> {
        info!("Looking up user by username: {}", username);

        let path = format!("2/users/by/username/{}", urlencoding::encode(username));
        let resp: UserLookupResponse = self.get_json(&path, &[], "lookup_user").await?;

        match resp.data {
            Some(user) => {
                info!("Found user {} (@{})", user.id, user.username);
                Ok(user.id)
            }
            None => Err(error_for_payload(
                resp.errors.as_deref().unwrap_or_default(),
                &format!("user {} not found", username),
            )),
        }
    }

    fn page_from(resp: SearchResponse) -> Result<SearchPage, ApiError> {
        if resp.data.is_none() {
            if let Some(errors) = resp.errors.as_deref().filter(|e| !e.is_empty()) {
                return Err(error_for_payload(errors, "no tweets returned"));
            }
        }
        Ok(SearchPage::from(resp))
    }
}

#[async_trait]
impl AuthenticatedClient for XApiClient {
    async fn authenticate(&mut self) -> Result<(), ApiError> {
        if let Authorizer::AppOnly {
            api_key,
            api_secret_key,
            bearer_token,
        } = &mut self.auth
        {
            if bearer_token.is_none() {
                info!("Exchanging API key pair for an app-only bearer token");
                let token =
                    fetch_app_only_token(&self.http, &self.base_url, api_key, api_secret_key)
                        .await?;
                *bearer_token = Some(token);
            }
        }
        Ok(())
    }

    async fn search_by_user(&self, username: &str) -> Result<SearchPage, ApiError> {
        let user_id = self.lookup_user_id(username).await?;

        let path = format!("2/users/{}/tweets", user_id);
        let query = [
            ("max_results", PAGE_SIZE),
            ("tweet.fields", TWEET_FIELDS),
            ("expansions", "author_id"),
            ("user.fields", "username"),
        ];
        let resp: SearchResponse = self.get_json(&path, &query, "user_tweets").await?;
        let page = Self::page_from(resp)?;
        info!("Fetched {} tweets for @{}", page.tweets.len(), username);
        Ok(page)
    }

    async fn search_by_keyword(&self, keyword: &str) -> Result<SearchPage, ApiError> {
        info!("Searching recent tweets for keyword: {}", keyword);

        let query = [
            ("query", keyword),
            ("max_results", PAGE_SIZE),
            ("tweet.fields", TWEET_FIELDS),
            ("expansions", "author_id"),
            ("user.fields", "username"),
        ];
        let resp: SearchResponse = self
            .get_json("2/tweets/search/recent", &query, "keyword_search")
            .await?;
        let page = Self::page_from(resp)?;
        info!("Fetched {} tweets for keyword '{}'", page.tweets.len(), keyword);
        Ok(page)
    }
}

/// Builds the HTTP client, routing every request through `proxy` when given.
///
/// Without a configured proxy, proxy environment variables are ignored so that
/// the configured list is the only source of proxies.
fn build_http_client(proxy: Option<&str>) -> Result<Client, ApiError> {
    let builder = match proxy {
        Some(uri) => {
            info!("Routing upstream requests through proxy {}", uri);
            let proxy = Proxy::all(uri)
                .map_err(|e| ApiError::UpstreamError(format!("invalid proxy '{}': {}", uri, e)))?;
            Client::builder().proxy(proxy)
        }
        None => Client::builder().no_proxy(),
    };
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_regex, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn snapshot(credentials: Option<Credentials>, proxies: &[&str]) -> ConfigSnapshot {
        ConfigSnapshot {
            credentials,
            proxies: proxies.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn bearer() -> Option<Credentials> {
        Some(Credentials::Bearer {
            bearer_token: "test-token".into(),
        })
    }

    #[test]
    fn test_missing_credentials() {
        let err = XApiClient::from_snapshot("http://localhost", &snapshot(None, &[])).err();
        assert_eq!(err, Some(ApiError::ConfigurationMissing));
    }

    #[test]
    fn test_only_first_proxy_is_used() {
        let client = XApiClient::from_snapshot(
            "http://localhost",
            &snapshot(bearer(), &["http://p1:8080", "http://p2:8080"]),
        )
        .unwrap();
        assert_eq!(client.proxy(), Some("http://p1:8080"));

        let client =
            XApiClient::from_snapshot("http://localhost", &snapshot(bearer(), &[])).unwrap();
        assert_eq!(client.proxy(), None);
    }

    #[test]
    fn test_unusable_proxy_is_an_upstream_error() {
        let err = XApiClient::from_snapshot("http://localhost", &snapshot(bearer(), &["::not a uri::"]))
            .err();
        assert!(matches!(err, Some(ApiError::UpstreamError(_))));
    }

    #[tokio::test]
    async fn test_search_by_user_resolves_id_first() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2/users/by/username/alice"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"id": "100", "name": "Alice", "username": "alice"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/2/users/100/tweets"))
            .and(query_param("max_results", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "1", "text": "hi"}, {"id": "2", "text": "there"}],
                "meta": {"result_count": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = XApiClient::from_snapshot(&server.uri(), &snapshot(bearer(), &[])).unwrap();
        let page = client.search_by_user("alice").await.unwrap();
        assert_eq!(page.tweets.len(), 2);
        assert_eq!(page.tweets[0].text, "hi");
    }

    #[tokio::test]
    async fn test_suspended_user_is_forbidden() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2/users/by/username/bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "errors": [{"title": "Forbidden", "detail": "User has been suspended: [bad]."}]
            })))
            .mount(&server)
            .await;

        let client = XApiClient::from_snapshot(&server.uri(), &snapshot(bearer(), &[])).unwrap();
        let err = client.search_by_user("bad").await.unwrap_err();
        assert!(matches!(err, ApiError::UpstreamForbidden(_)));
    }

    #[tokio::test]
    async fn test_keyword_search_with_no_results() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2/tweets/search/recent"))
            .and(query_param("query", "#rustlang"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"meta": {"result_count": 0}})),
            )
            .mount(&server)
            .await;

        let client = XApiClient::from_snapshot(&server.uri(), &snapshot(bearer(), &[])).unwrap();
        let page = client.search_by_keyword("#rustlang").await.unwrap();
        assert!(page.tweets.is_empty());
    }

    #[tokio::test]
    async fn test_oauth1_requests_are_signed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2/tweets/search/recent"))
            .and(header_regex("authorization", r#"^OAuth .*oauth_signature=""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = Credentials::OAuth1 {
            api_key: "key".into(),
            api_secret_key: "secret".into(),
            access_token: "token".into(),
            access_token_secret: "token-secret".into(),
        };
        let mut client =
            XApiClient::from_snapshot(&server.uri(), &snapshot(Some(credentials), &[])).unwrap();
        client.authenticate().await.unwrap();
        client.search_by_keyword("rust").await.unwrap();
    }

    #[tokio::test]
    async fn test_app_only_exchanges_token_once() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "bearer",
                "access_token": "exchanged"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/2/tweets/search/recent"))
            .and(header("authorization", "Bearer exchanged"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(2)
            .mount(&server)
            .await;

        let credentials = Credentials::AppOnly {
            api_key: "key".into(),
            api_secret_key: "secret".into(),
        };
        let mut client =
            XApiClient::from_snapshot(&server.uri(), &snapshot(Some(credentials), &[])).unwrap();
        client.authenticate().await.unwrap();
        client.authenticate().await.unwrap();
        client.search_by_keyword("a").await.unwrap();
        client.search_by_keyword("b").await.unwrap();
    }

    #[tokio::test]
    async fn test_app_only_rejected_key_pair() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "errors": [{"code": 99, "message": "Unable to verify your credentials"}]
            })))
            .mount(&server)
            .await;

        let credentials = Credentials::AppOnly {
            api_key: "key".into(),
            api_secret_key: "wrong".into(),
        };
        let mut client =
            XApiClient::from_snapshot(&server.uri(), &snapshot(Some(credentials), &[])).unwrap();
        let err = client.authenticate().await.unwrap_err();
        assert!(matches!(err, ApiError::UpstreamForbidden(ref m) if m.contains("Unable to verify")));
    }
}
