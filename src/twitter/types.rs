//! Serde models for the subset of Twitter API v2 payloads the service reads.
//!
//! Every field the upstream may omit is optional so that sparse responses
//! still deserialize.

use serde::{Deserialize, Serialize};

/// Response of the timeline and recent-search endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<Vec<RawTweet>>,
    #[serde(default)]
    pub includes: Option<Includes>,
    #[serde(default)]
    pub errors: Option<Vec<ApiProblem>>,
}

/// Response of `GET /2/users/by/username/:username`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLookupResponse {
    #[serde(default)]
    pub data: Option<User>,
    #[serde(default)]
    pub errors: Option<Vec<ApiProblem>>,
}

/// Response of `POST /oauth2/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
}

/// One tweets page with its expansions, as returned by the client adapter.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub tweets: Vec<RawTweet>,
    pub includes: Includes,
}

impl From<SearchResponse> for SearchPage {
    fn from(resp: SearchResponse) -> Self {
        Self {
            tweets: resp.data.unwrap_or_default(),
            includes: resp.includes.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Option<Vec<User>>,
}

impl Includes {
    /// Looks up an expanded user's handle by id.
    pub fn username_for(&self, user_id: &str) -> Option<&str> {
        self.users
            .as_deref()?
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// An entry of the v2 `errors` array, or a top-level problem body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiProblem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiProblem {
    pub fn describe(&self) -> String {
        match (&self.title, &self.detail, &self.message) {
            (Some(title), Some(detail), _) => format!("{}: {}", title, detail),
            (_, Some(detail), _) => detail.clone(),
            (_, _, Some(message)) => message.clone(),
            (Some(title), None, None) => title.clone(),
            (None, None, None) => "unknown error".to_string(),
        }
    }

    /// Whether the problem denies access rather than reporting a missing resource.
    pub fn is_forbidden(&self) -> bool {
        self.title
            .as_deref()
            .map(|t| t.contains("Forbidden") || t.contains("Authorization Error"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTweet {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub in_reply_to_user_id: Option<String>,
    #[serde(default)]
    pub public_metrics: Option<PublicMetrics>,
    #[serde(default)]
    pub entities: Option<Entities>,
    #[serde(default)]
    pub referenced_tweets: Option<Vec<ReferencedTweet>>,
    #[serde(default)]
    pub geo: Option<Geo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub retweet_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencedTweet {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub hashtags: Option<Vec<HashtagEntity>>,
    #[serde(default)]
    pub mentions: Option<Vec<MentionEntity>>,
    #[serde(default)]
    pub urls: Option<Vec<UrlEntity>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashtagEntity {
    pub tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentionEntity {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlEntity {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub expanded_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Geo {
    #[serde(default)]
    pub place_id: Option<String>,
}
