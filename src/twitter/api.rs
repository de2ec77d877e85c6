//! Core Twitter API utilities.
//!
//! This module contains the low-level helpers shared by the client adapter:
//! sending a prepared request, mapping upstream failures onto [`ApiError`],
//! and the OAuth 2.0 client-credentials token exchange.

use log::{debug, error, info, warn};
use reqwest::{Client, StatusCode};

use crate::error::ApiError;
use crate::oauth::percent_encode;

use super::types::{ApiProblem, TokenResponse};

/// Sanitizes text for safe logging by truncating and escaping control characters.
///
/// This function:
/// - Truncates long text to prevent log flooding
/// - Replaces control characters that could manipulate log output
/// - Escapes newlines to prevent log injection
pub(crate) fn sanitize_for_logging(text: &str, max_len: usize) -> String {
    let sanitized: String = text
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => '?',
            c => c,
        })
        .collect();

    if sanitized.chars().count() > max_len {
        let truncated: String = sanitized.chars().take(max_len).collect();
        format!(
            "{}... [truncated, {} total bytes]",
            truncated,
            text.len()
        )
    } else {
        sanitized
    }
}

/// Sends a prepared, already authorized request and returns the response body.
///
/// # Parameters
///
/// - `request_builder`: A configured reqwest::RequestBuilder ready to send
/// - `operation_name`: Human-readable name for the operation (for logging)
///
/// # Returns
///
/// - `Ok(String)`: The API response body on a 2xx status
/// - `Err(ApiError::UpstreamForbidden)`: On a 403 status
/// - `Err(ApiError::UpstreamError)`: On network errors and every other status
pub(crate) async fn send_api_request(
    request_builder: reqwest::RequestBuilder,
    operation_name: &str,
) -> Result<String, ApiError> {
    info!("Sending request for operation: {}", operation_name);

    let response = request_builder.send().await.map_err(|e| {
        error!("Request for operation '{}' failed: {}", operation_name, e);
        ApiError::UpstreamError(e.to_string())
    })?;

    let status = response.status();
    info!(
        "Received response with status: {} for operation: {}",
        status, operation_name
    );

    let body = response.text().await?;

    if status.is_success() {
        debug!(
            "Response summary for '{}': {} bytes received",
            operation_name,
            body.len()
        );
        return Ok(body);
    }

    error!("Operation '{}' failed - Status: {}", operation_name, status);
    debug!(
        "Error response for '{}': {}",
        operation_name,
        sanitize_for_logging(&body, 200)
    );
    Err(error_for_status(status, &body))
}

/// Maps a non-success upstream status and body onto an [`ApiError`].
pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    let detail = problem_from_body(body)
        .map(|p| p.describe())
        .unwrap_or_else(|| sanitize_for_logging(body, 200));
    let message = format!("{} ({})", detail, status);

    if status == StatusCode::FORBIDDEN {
        ApiError::UpstreamForbidden(message)
    } else {
        ApiError::UpstreamError(message)
    }
}

/// Extracts the first problem from a v2 problem body, a v2 `errors` array or a
/// v1.1-style `{"errors": [{"message": ..}]}` body.
fn problem_from_body(body: &str) -> Option<ApiProblem> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    if let Some(first) = value
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|a| a.first())
    {
        return serde_json::from_value(first.clone()).ok();
    }
    let problem: ApiProblem = serde_json::from_value(value).ok()?;
    if problem.title.is_none() && problem.detail.is_none() && problem.message.is_none() {
        None
    } else {
        Some(problem)
    }
}

/// Converts the `errors` array of a 200 response without `data` into an error.
///
/// The v2 API reports suspended or protected accounts and unknown users this
/// way instead of with a status code.
pub(crate) fn error_for_payload(errors: &[ApiProblem], fallback: &str) -> ApiError {
    let Some(first) = errors.first() else {
        return ApiError::UpstreamError(fallback.to_string());
    };

    for problem in errors {
        warn!("Twitter API error: {}", problem.describe());
    }

    if let Some(forbidden) = errors.iter().find(|p| p.is_forbidden()) {
        ApiError::UpstreamForbidden(forbidden.describe())
    } else {
        ApiError::UpstreamError(first.describe())
    }
}

/// Exchanges an API key pair for an app-only bearer token.
///
/// Uses the OAuth 2.0 client-credentials grant at `POST /oauth2/token`. The key
/// and secret are RFC 3986 encoded before being sent as Basic credentials.
///
/// # Returns
///
/// - `Ok(String)`: The bearer token
/// - `Err(ApiError)`: If the exchange is rejected or the response is malformed
pub(crate) async fn fetch_app_only_token(
    http: &Client,
    base_url: &str,
    api_key: &str,
    api_secret_key: &str,
) -> Result<String, ApiError> {
    let url = format!("{}/oauth2/token", base_url);
    let request_builder = http
        .post(&url)
        .basic_auth(percent_encode(api_key), Some(percent_encode(api_secret_key)))
        .form(&[("grant_type", "client_credentials")]);

    let body = send_api_request(request_builder, "app_only_token").await?;
    let token: TokenResponse = serde_json::from_str(&body)?;

    if !token.token_type.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::UpstreamError(format!(
            "unexpected token type '{}'",
            token.token_type
        )));
    }

    info!("Obtained app-only bearer token");
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_for_logging() {
        assert_eq!(sanitize_for_logging("a\nb\tc", 50), "a b c");
        assert_eq!(sanitize_for_logging("bell\u{7}", 50), "bell?");

        let long = "x".repeat(20);
        assert_eq!(
            sanitize_for_logging(&long, 5),
            "xxxxx... [truncated, 20 total bytes]"
        );
    }

    #[test]
    fn test_forbidden_status_maps_to_forbidden() {
        let body = r#"{"title":"Forbidden","detail":"Your client app is not configured","status":403}"#;
        let err = error_for_status(StatusCode::FORBIDDEN, body);
        assert!(matches!(err, ApiError::UpstreamForbidden(ref m) if m.contains("not configured")));
    }

    #[test]
    fn test_other_status_maps_to_upstream_error() {
        let body = r#"{"errors":[{"message":"Rate limit exceeded","code":88}]}"#;
        let err = error_for_status(StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(
            err,
            ApiError::UpstreamError("Rate limit exceeded (429 Too Many Requests)".into())
        );

        let err = error_for_status(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(matches!(err, ApiError::UpstreamError(ref m) if m.contains("<html>oops</html>")));
    }

    #[test]
    fn test_payload_errors() {
        let not_found = ApiProblem {
            title: Some("Not Found Error".into()),
            detail: Some("Could not find user with username: [ghost].".into()),
            message: None,
        };
        assert_eq!(
            error_for_payload(&[not_found], "fallback"),
            ApiError::UpstreamError(
                "Not Found Error: Could not find user with username: [ghost].".into()
            )
        );

        let suspended = ApiProblem {
            title: Some("Forbidden".into()),
            detail: Some("User has been suspended: [bad].".into()),
            message: None,
        };
        assert!(matches!(
            error_for_payload(&[suspended], "fallback"),
            ApiError::UpstreamForbidden(_)
        ));

        assert_eq!(
            error_for_payload(&[], "fallback"),
            ApiError::UpstreamError("fallback".into())
        );
    }
}
