//! HTTP route handlers for the tweetlens service.
//!
//! This module contains all the HTTP route handler functions that process
//! incoming requests and return appropriate responses.

use axum::{
    extract::{RawQuery, State},
    response::Json,
};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Credentials;
use crate::error::ApiError;
use crate::search::{run_batch, BatchResults, SearchKind};
use crate::state::AppState;
use crate::twitter::{AuthenticatedClient, XApiClient};

/// Body of `POST /account_manage`.
///
/// `auth_type` selects the scheme explicitly; without it the scheme is
/// inferred from which fields are present.
#[derive(Debug, Default, Deserialize)]
pub struct AccountManageRequest {
    #[serde(default)]
    pub auth_type: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_secret_key: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

impl AccountManageRequest {
    /// Turns the request into validated credentials.
    pub fn into_credentials(self) -> Result<Credentials, ApiError> {
        let auth_type = match self.auth_type.as_deref() {
            Some(explicit) => explicit.to_ascii_lowercase(),
            None if self.bearer_token.is_some() => "bearer".to_string(),
            None if self.access_token.is_some() || self.access_token_secret.is_some() => {
                "oauth1".to_string()
            }
            None if self.api_key.is_some() || self.api_secret_key.is_some() => "app".to_string(),
            None => {
                return Err(ApiError::InvalidCredentials(
                    "no credential fields provided".into(),
                ))
            }
        };

        let credentials = match auth_type.as_str() {
            "bearer" => Credentials::Bearer {
                bearer_token: self.bearer_token.unwrap_or_default(),
            },
            "oauth1" => Credentials::OAuth1 {
                api_key: self.api_key.unwrap_or_default(),
                api_secret_key: self.api_secret_key.unwrap_or_default(),
                access_token: self.access_token.unwrap_or_default(),
                access_token_secret: self.access_token_secret.unwrap_or_default(),
            },
            "app" => Credentials::AppOnly {
                api_key: self.api_key.unwrap_or_default(),
                api_secret_key: self.api_secret_key.unwrap_or_default(),
            },
            other => {
                return Err(ApiError::InvalidCredentials(format!(
                    "unknown auth_type '{}', expected bearer, oauth1 or app",
                    other
                )))
            }
        };

        credentials.validate()?;
        Ok(credentials)
    }
}

/// Body of `POST /proxy_config`.
#[derive(Debug, Deserialize)]
pub struct ProxyConfigRequest {
    #[serde(alias = "proxy_list")]
    pub proxies: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsersSearchRequest {
    pub usernames: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsSearchRequest {
    pub keywords: Vec<String>,
}

/// Handles GET requests to the `/health` endpoint.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "service": "tweetlens",
///   "credentials_configured": true
/// }
/// ```
pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let configured = state.config.snapshot().credentials.is_some();
    Json(json!({
        "status": "healthy",
        "service": "tweetlens",
        "credentials_configured": configured,
    }))
}

/// Handles POST requests to the `/account_manage` endpoint.
///
/// Replaces the stored credentials. Nothing is sent upstream; bad values show
/// up as errors on the next search.
///
/// # Success Response
///
/// ```json
/// {
///   "message": "Twitter authentication updated",
///   "auth_type": "bearer"
/// }
/// ```
pub async fn handle_account_manage(
    State(state): State<AppState>,
    Json(request): Json<AccountManageRequest>,
) -> Result<Json<Value>, ApiError> {
    let credentials = request.into_credentials().map_err(|e| {
        warn!("Rejected credential update: {}", e);
        e
    })?;
    let auth_type = credentials.auth_type();
    info!("Updating Twitter credentials: {:?}", credentials);

    state.config.replace_credentials(credentials);

    Ok(Json(json!({
        "message": "Twitter authentication updated",
        "auth_type": auth_type,
    })))
}

/// Handles POST requests to the `/proxy_config` endpoint.
///
/// The list is stored verbatim, including when empty. Only its first entry
/// is used for upstream requests.
pub async fn handle_proxy_config(
    State(state): State<AppState>,
    Json(request): Json<ProxyConfigRequest>,
) -> Json<Value> {
    info!("Updating proxy configuration with {} entries", request.proxies.len());
    state.config.replace_proxies(request.proxies.clone());

    Json(json!({
        "message": "Proxy configuration updated",
        "proxies": request.proxies,
    }))
}

/// Handles POST requests to the `/users_search` endpoint.
///
/// # Success Response
///
/// A map from username to either its normalized tweets or an error entry:
///
/// ```json
/// {
///   "alice": [{"tweet_text": "hi", "likes": 5, "...": "..."}],
///   "locked": {"error": "Twitter API denied access: ...", "status": 403}
/// }
/// ```
pub async fn handle_users_search(
    State(state): State<AppState>,
    Json(request): Json<UsersSearchRequest>,
) -> Result<Json<BatchResults>, ApiError> {
    run_search(&state, SearchKind::Users, &request.usernames).await
}

/// Handles GET requests to `/users_search?usernames=a&usernames=b`.
pub async fn handle_users_search_query(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<BatchResults>, ApiError> {
    let usernames = repeated_param(query.as_deref(), "usernames");
    run_search(&state, SearchKind::Users, &usernames).await
}

/// Handles POST requests to the `/keywords_search` endpoint.
pub async fn handle_keywords_search(
    State(state): State<AppState>,
    Json(request): Json<KeywordsSearchRequest>,
) -> Result<Json<BatchResults>, ApiError> {
    run_search(&state, SearchKind::Keywords, &request.keywords).await
}

/// Handles GET requests to `/keywords_search?keywords=a&keywords=b`.
pub async fn handle_keywords_search_query(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<BatchResults>, ApiError> {
    let keywords = repeated_param(query.as_deref(), "keywords");
    run_search(&state, SearchKind::Keywords, &keywords).await
}

/// Takes one configuration snapshot, authenticates and runs the batch.
async fn run_search(
    state: &AppState,
    kind: SearchKind,
    items: &[String],
) -> Result<Json<BatchResults>, ApiError> {
    let snapshot = state.config.snapshot();
    let mut client = XApiClient::from_snapshot(&state.api_base_url, &snapshot).map_err(|e| {
        warn!("Cannot build Twitter client: {}", e);
        e
    })?;
    client.authenticate().await?;

    Ok(Json(run_batch(&client, kind, items).await))
}

/// Collects every value of a repeated query parameter, in order.
fn repeated_param(query: Option<&str>, name: &str) -> Vec<String> {
    url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_is_inferred_from_fields() {
        let bearer = AccountManageRequest {
            bearer_token: Some("AAAA".into()),
            ..Default::default()
        };
        assert_eq!(bearer.into_credentials().unwrap().auth_type(), "bearer");

        let oauth1 = AccountManageRequest {
            api_key: Some("k".into()),
            api_secret_key: Some("s".into()),
            access_token: Some("t".into()),
            access_token_secret: Some("ts".into()),
            ..Default::default()
        };
        assert_eq!(oauth1.into_credentials().unwrap().auth_type(), "oauth1");

        let app = AccountManageRequest {
            api_key: Some("k".into()),
            api_secret_key: Some("s".into()),
            ..Default::default()
        };
        assert_eq!(app.into_credentials().unwrap().auth_type(), "app");
    }

    #[test]
    fn test_incomplete_or_unknown_credentials_are_rejected() {
        let missing_secret = AccountManageRequest {
            api_key: Some("k".into()),
            api_secret_key: Some("s".into()),
            access_token: Some("t".into()),
            ..Default::default()
        };
        assert_eq!(
            missing_secret.into_credentials().unwrap_err(),
            ApiError::InvalidCredentials("access_token_secret cannot be empty".into())
        );

        let unknown = AccountManageRequest {
            auth_type: Some("kerberos".into()),
            ..Default::default()
        };
        assert!(matches!(
            unknown.into_credentials(),
            Err(ApiError::InvalidCredentials(_))
        ));

        assert!(AccountManageRequest::default().into_credentials().is_err());
    }

    #[test]
    fn test_proxy_list_alias() {
        let a: ProxyConfigRequest = serde_json::from_str(r#"{"proxies": ["http://p1"]}"#).unwrap();
        let b: ProxyConfigRequest =
            serde_json::from_str(r#"{"proxy_list": ["http://p1"]}"#).unwrap();
        assert_eq!(a.proxies, b.proxies);
    }

    #[test]
    fn test_repeated_param() {
        assert_eq!(
            repeated_param(Some("usernames=alice&usernames=bob&x=1"), "usernames"),
            vec!["alice", "bob"]
        );
        assert_eq!(
            repeated_param(Some("keywords=%23rust&keywords=hello+world"), "keywords"),
            vec!["#rust", "hello world"]
        );
        assert!(repeated_param(None, "usernames").is_empty());
    }
}
