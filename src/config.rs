//! Configuration module for the tweetlens service.
//!
//! This module contains the credential types accepted by the service and the
//! environment variable handling for the server address, the upstream base URL
//! and the fallback credentials used before any `/account_manage` call.

use log::{debug, info, warn};
use std::env;
use std::fmt;

use crate::error::ApiError;

/// Default upstream base URL for the Twitter/X API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Credentials used to authenticate against the Twitter/X API.
///
/// The variant decides the authentication scheme. Values live in process
/// memory only and are replaced wholesale on every configuration call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// App-only OAuth 2.0 bearer token, sent verbatim.
    Bearer { bearer_token: String },
    /// OAuth 1.0a user context. Every request is signed with HMAC-SHA1.
    OAuth1 {
        api_key: String,
        api_secret_key: String,
        access_token: String,
        access_token_secret: String,
    },
    /// OAuth 2.0 client credentials. The key pair is exchanged for a bearer
    /// token when the client authenticates.
    AppOnly {
        api_key: String,
        api_secret_key: String,
    },
}

impl Credentials {
    /// Name of the authentication scheme, as accepted in `auth_type`.
    pub fn auth_type(&self) -> &'static str {
        match self {
            Credentials::Bearer { .. } => "bearer",
            Credentials::OAuth1 { .. } => "oauth1",
            Credentials::AppOnly { .. } => "app",
        }
    }

    /// Checks that every field the scheme needs is non-empty.
    ///
    /// Nothing else is validated here; bad values surface as upstream errors
    /// on first use.
    pub fn validate(&self) -> Result<(), ApiError> {
        let fields: Vec<(&str, &str)> = match self {
            Credentials::Bearer { bearer_token } => vec![("bearer_token", bearer_token.as_str())],
            Credentials::OAuth1 {
                api_key,
                api_secret_key,
                access_token,
                access_token_secret,
            } => vec![
                ("api_key", api_key.as_str()),
                ("api_secret_key", api_secret_key.as_str()),
                ("access_token", access_token.as_str()),
                ("access_token_secret", access_token_secret.as_str()),
            ],
            Credentials::AppOnly {
                api_key,
                api_secret_key,
            } => vec![
                ("api_key", api_key.as_str()),
                ("api_secret_key", api_secret_key.as_str()),
            ],
        };

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ApiError::InvalidCredentials(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Loads fallback credentials from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TWITTER_BEARER_TOKEN`: selects bearer authentication
    /// - `TWITTER_API_KEY`, `TWITTER_API_SECRET_KEY`, `TWITTER_ACCESS_TOKEN`,
    ///   `TWITTER_ACCESS_TOKEN_SECRET`: all four select OAuth 1.0a, the key pair
    ///   alone selects app-only client credentials
    ///
    /// # Returns
    ///
    /// - `Some(Credentials)`: If a complete set was found (bearer wins)
    /// - `None`: If nothing usable is set; searches then fail until
    ///   `/account_manage` is called
    pub fn from_env() -> Option<Self> {
        info!("Loading fallback Twitter credentials from environment variables");

        if let Some(bearer_token) = read_secret_var("TWITTER_BEARER_TOKEN") {
            info!("Using bearer token credentials from environment");
            return Some(Credentials::Bearer { bearer_token });
        }

        let api_key = read_secret_var("TWITTER_API_KEY");
        let api_secret_key = read_secret_var("TWITTER_API_SECRET_KEY");
        let access_token = read_secret_var("TWITTER_ACCESS_TOKEN");
        let access_token_secret = read_secret_var("TWITTER_ACCESS_TOKEN_SECRET");

        match (api_key, api_secret_key, access_token, access_token_secret) {
            (Some(api_key), Some(api_secret_key), Some(access_token), Some(access_token_secret)) => {
                info!("Using OAuth 1.0a credentials from environment");
                Some(Credentials::OAuth1 {
                    api_key,
                    api_secret_key,
                    access_token,
                    access_token_secret,
                })
            }
            (Some(api_key), Some(api_secret_key), None, None) => {
                info!("Using app-only client credentials from environment");
                Some(Credentials::AppOnly {
                    api_key,
                    api_secret_key,
                })
            }
            (None, None, None, None) => {
                info!("No Twitter credentials found in environment variables");
                None
            }
            _ => {
                warn!("Incomplete Twitter credentials in environment - ignoring them");
                None
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer { bearer_token } => f
                .debug_struct("Bearer")
                .field("bearer_token", &mask_secret(bearer_token))
                .finish(),
            Credentials::OAuth1 {
                api_key,
                access_token,
                ..
            } => f
                .debug_struct("OAuth1")
                .field("api_key", &mask_secret(api_key))
                .field("access_token", &mask_secret(access_token))
                .finish_non_exhaustive(),
            Credentials::AppOnly { api_key, .. } => f
                .debug_struct("AppOnly")
                .field("api_key", &mask_secret(api_key))
                .finish_non_exhaustive(),
        }
    }
}

/// Masks a secret for logging, keeping at most the first and last 8 characters.
///
/// Secrets of 16 characters or fewer keep only a 4-character prefix.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let len = chars.len();
    if len > 16 {
        let prefix: String = chars[..8].iter().collect();
        let suffix: String = chars[len - 8..].iter().collect();
        format!("{}...{}", prefix, suffix)
    } else {
        let prefix: String = chars[..len.min(4)].iter().collect();
        format!("{}...", prefix)
    }
}

/// Reads a non-empty environment variable, logging only its masked value.
fn read_secret_var(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            info!(
                "Found {} environment variable with length: {}",
                name,
                value.len()
            );
            debug!("{} (masked): {}", name, mask_secret(&value));
            Some(value)
        }
        Ok(_) => {
            warn!("{} is set but empty - ignoring it", name);
            None
        }
        Err(_) => None,
    }
}

/// Gets the server port from the `PORT` environment variable, defaulting to 8000.
///
/// An unparsable value is logged and replaced by the default.
///
/// # Example
///
/// ```rust
/// use tweetlens::get_server_port;
///
/// // With no PORT set
/// let port = get_server_port(); // Returns 8000
/// ```
pub fn get_server_port() -> u16 {
    match env::var("PORT") {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!(
                "PORT '{}' is not a valid port number, using {}",
                value, DEFAULT_PORT
            );
            DEFAULT_PORT
        }),
        Err(_) => DEFAULT_PORT,
    }
}

/// Gets the bind host from the `HOST` environment variable, defaulting to `0.0.0.0`.
pub fn get_server_host() -> String {
    env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string())
}

/// Gets the upstream base URL from `TWITTER_API_BASE_URL`.
///
/// Trailing slashes are stripped so paths can be appended directly.
pub fn get_api_base_url() -> String {
    let base = env::var("TWITTER_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());
    base.trim_end_matches('/').to_string()
}
