//! Batch search over usernames or keywords.
//!
//! Items are processed one after another. A failing item is recorded in its
//! own slot and the remaining items still run.

use log::{error, info};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::twitter::{normalize_tweet, AuthenticatedClient, NormalizedTweet, QueryOrigin};

/// What the items of a batch are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Users,
    Keywords,
}

/// Outcome of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ItemResult {
    Tweets(Vec<NormalizedTweet>),
    Failed { error: String, status: u16 },
}

impl From<ApiError> for ItemResult {
    fn from(e: ApiError) -> Self {
        ItemResult::Failed {
            status: e.status_code().as_u16(),
            error: e.to_string(),
        }
    }
}

/// Results keyed by username or keyword.
pub type BatchResults = BTreeMap<String, ItemResult>;

/// Runs a whole batch against an authenticated client.
pub async fn run_batch<C>(client: &C, kind: SearchKind, items: &[String]) -> BatchResults
where
    C: AuthenticatedClient + ?Sized,
{
    info!("Running {:?} search for {} items", kind, items.len());

    let mut results = BatchResults::new();
    for item in items {
        let result = match search_one(client, kind, item).await {
            Ok(tweets) => ItemResult::Tweets(tweets),
            Err(e) => {
                error!("Search for '{}' failed: {}", item, e);
                ItemResult::from(e)
            }
        };
        results.insert(item.clone(), result);
    }
    results
}

async fn search_one<C>(
    client: &C,
    kind: SearchKind,
    item: &str,
) -> Result<Vec<NormalizedTweet>, ApiError>
where
    C: AuthenticatedClient + ?Sized,
{
    let (page, origin) = match kind {
        SearchKind::Users => (client.search_by_user(item).await?, QueryOrigin::User(item)),
        SearchKind::Keywords => (client.search_by_keyword(item).await?, QueryOrigin::Keyword),
    };

    Ok(page
        .tweets
        .iter()
        .map(|tweet| normalize_tweet(tweet, origin, &page.includes))
        .collect())
}
