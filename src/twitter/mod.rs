//! Twitter/X API integration module.
//!
//! This module contains the authenticated client for the v2 search endpoints,
//! the serde models of the upstream payloads, and the normalizer that turns
//! upstream tweets into the service's response records.

mod api;
mod client;
mod normalize;
mod types;

// Re-export public API
pub use client::{AuthenticatedClient, XApiClient, PAGE_SIZE};
pub use normalize::{classify_tweet, normalize_tweet, tweet_permalink, NormalizedTweet, QueryOrigin, TweetType};
pub use types::{Includes, RawTweet, SearchPage};

