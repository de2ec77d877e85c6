//! OAuth authentication module for Twitter/X API integration.
//!
//! This module builds Authorization headers for the three supported schemes:
//! OAuth 2.0 Bearer Token (app-only), OAuth 1.0a user context (HMAC-SHA1
//! signed requests) and the Basic credentials used to exchange an API key pair
//! for an app-only bearer token.

use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use reqwest::Url;
use sha1::Sha1;

use crate::error::ApiError;

type HmacSha1 = Hmac<Sha1>;

/// Builds the Authorization header for OAuth 2.0 Bearer Token authentication.
///
/// # Example
///
/// ```rust
/// use tweetlens::build_bearer_auth_header;
///
/// let header = build_bearer_auth_header("your_bearer_token");
/// assert_eq!(header, "Bearer your_bearer_token");
/// ```
pub fn build_bearer_auth_header(bearer_token: &str) -> String {
    format!("Bearer {}", bearer_token)
}

/// OAuth 1.0a consumer and token secrets for one user context.
#[derive(Clone, Copy)]
pub struct OAuth1Keys<'a> {
    pub api_key: &'a str,
    pub api_secret_key: &'a str,
    pub access_token: &'a str,
    pub access_token_secret: &'a str,
}

/// Builds the Authorization header for an OAuth 1.0a signed request.
///
/// The signature covers the HTTP method, the URL without its query string and
/// every query parameter of `url`, so the header is only valid for that exact
/// request.
///
/// # Parameters
///
/// - `method`: HTTP method, e.g. `GET`
/// - `url`: The full request URL including query parameters
/// - `keys`: Consumer and access token key pairs
///
/// # Returns
///
/// A header value of the form `OAuth oauth_consumer_key="...", ...`.
pub fn build_oauth1_header(method: &str, url: &Url, keys: OAuth1Keys<'_>) -> Result<String, ApiError> {
    let nonce = generate_nonce();
    let timestamp = chrono::Utc::now().timestamp().to_string();
    sign_oauth1(method, url, keys, &nonce, &timestamp)
}

fn sign_oauth1(
    method: &str,
    url: &Url,
    keys: OAuth1Keys<'_>,
    nonce: &str,
    timestamp: &str,
) -> Result<String, ApiError> {
    let oauth_params: Vec<(&str, &str)> = vec![
        ("oauth_consumer_key", keys.api_key),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", keys.access_token),
        ("oauth_version", "1.0"),
    ];

    let mut encoded: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .chain(
            oauth_params
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        )
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let signature_base = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(&base_string_uri(url)),
        percent_encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        percent_encode(keys.api_secret_key),
        percent_encode(keys.access_token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| ApiError::UpstreamError(format!("failed to sign request: {}", e)))?;
    mac.update(signature_base.as_bytes());
    let signature =
        base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    let header_params = oauth_params
        .iter()
        .map(|(k, v)| (*k, *v))
        .chain(std::iter::once(("oauth_signature", signature.as_str())))
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!("OAuth {}", header_params))
}

/// Scheme, host, explicit non-default port and path of `url`.
fn base_string_uri(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// RFC 3986 encoding: everything but `A-Z a-z 0-9 - . _ ~` is escaped.
pub(crate) fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn generate_nonce() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}
