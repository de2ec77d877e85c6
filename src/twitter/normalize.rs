//! Flattening of upstream tweets into the service's response records.

use serde::{Deserialize, Serialize};

use super::types::{Includes, RawTweet};

/// Kind of tweet, derived from its references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweetType {
    Original,
    Retweet,
    Quote,
    Reply,
}

/// Classifies a tweet. The first matching rule wins:
/// retweeted reference, quoted reference, reply, then original.
///
/// A quote that is also a reply is therefore a `Quote`.
pub fn classify_tweet(tweet: &RawTweet) -> TweetType {
    let has_reference = |kind: &str| {
        tweet
            .referenced_tweets
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|r| r.kind == kind)
    };

    if has_reference("retweeted") {
        TweetType::Retweet
    } else if has_reference("quoted") {
        TweetType::Quote
    } else if tweet.in_reply_to_user_id.is_some() || has_reference("replied_to") {
        TweetType::Reply
    } else {
        TweetType::Original
    }
}

/// What produced a tweet: which query, and so which author is known up front.
#[derive(Debug, Clone, Copy)]
pub enum QueryOrigin<'a> {
    /// Timeline of the given username.
    User(&'a str),
    /// Recent search; the author comes from the expansions.
    Keyword,
}

/// The fixed record returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTweet {
    pub tweet_id: String,
    pub tweet_text: String,
    pub tweet_time: Option<String>,
    pub likes: u64,
    pub retweets: u64,
    pub tweet_type: TweetType,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub links: Vec<String>,
    pub username: Option<String>,
    pub user_id: Option<String>,
    pub geo: Option<String>,
    pub tweet_link: String,
}

/// Builds the permalink of a tweet.
///
/// Without a known author handle, the handle-less `/i/web/status/` form is used.
pub fn tweet_permalink(username: Option<&str>, tweet_id: &str) -> String {
    match username {
        Some(name) => format!("https://twitter.com/{}/status/{}", name, tweet_id),
        None => format!("https://twitter.com/i/web/status/{}", tweet_id),
    }
}

pub fn normalize_tweet(tweet: &RawTweet, origin: QueryOrigin<'_>, includes: &Includes) -> NormalizedTweet {
    let (username, user_id) = match origin {
        QueryOrigin::User(username) => (Some(username.to_string()), tweet.author_id.clone()),
        QueryOrigin::Keyword => (
            tweet
                .author_id
                .as_deref()
                .and_then(|id| includes.username_for(id))
                .map(str::to_string),
            tweet.author_id.clone(),
        ),
    };

    let metrics = tweet.public_metrics.clone().unwrap_or_default();
    let entities = tweet.entities.clone().unwrap_or_default();

    NormalizedTweet {
        tweet_id: tweet.id.clone(),
        tweet_text: tweet.text.clone(),
        tweet_time: tweet.created_at.clone(),
        likes: metrics.like_count.unwrap_or(0),
        retweets: metrics.retweet_count.unwrap_or(0),
        tweet_type: classify_tweet(tweet),
        hashtags: entities
            .hashtags
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.tag)
            .collect(),
        mentions: entities
            .mentions
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.username)
            .collect(),
        links: entities
            .urls
            .unwrap_or_default()
            .into_iter()
            .filter_map(|u| u.expanded_url.or(u.url))
            .collect(),
        geo: tweet.geo.as_ref().and_then(|g| g.place_id.clone()),
        tweet_link: tweet_permalink(username.as_deref(), &tweet.id),
        username,
        user_id,
    }
}
