//! YouTube Data API channel lookup.

use std::time::Duration;

use async_trait::async_trait;
use proofmint_core::{FetchFailure, ResourceApi, ResourceSnapshot, ResourceStatistics};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::OAuthClientError;

pub use proofmint_core::YOUTUBE_API_BASE;

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    description: Option<String>,
    custom_url: Option<String>,
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best(self) -> Option<String> {
        [self.high, self.medium, self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url)
            .find(|url| !url.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// YouTube reports counts as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    subscriber_count: Option<String>,
    video_count: Option<String>,
    #[serde(default)]
    hidden_subscriber_count: bool,
}

impl Statistics {
    fn parse(self) -> ResourceStatistics {
        let count = |s: Option<String>| s.and_then(|v| v.parse::<u64>().ok());
        ResourceStatistics {
            subscriber_count: count(self.subscriber_count),
            view_count: count(self.view_count),
            video_count: count(self.video_count),
            hidden_subscriber_count: self.hidden_subscriber_count,
        }
    }
}

impl Channel {
    fn into_snapshot(self) -> ResourceSnapshot {
        let Snippet {
            title,
            description,
            custom_url,
            published_at,
            thumbnails,
        } = self.snippet;

        ResourceSnapshot {
            id: self.id,
            title,
            description: description.filter(|d| !d.is_empty()),
            custom_url,
            published_at,
            statistics: self.statistics.parse(),
            image: thumbnails.best(),
        }
    }
}

/// Fetches the authenticated user's channel.
#[derive(Clone)]
pub struct YoutubeChannelApi {
    http_client: reqwest::Client,
    api_base: String,
}

impl YoutubeChannelApi {
    /// Creates a client against `api_base` (e.g. [`YOUTUBE_API_BASE`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, OAuthClientError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http_client(api_base, http_client))
    }

    #[must_use]
    pub fn with_http_client(api_base: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl ResourceApi for YoutubeChannelApi {
    async fn fetch_snapshot(&self, access_token: &str) -> Result<ResourceSnapshot, FetchFailure> {
        let url = format!("{}/channels", self.api_base);
        let response = self
            .http_client
            .get(&url)
            .query(&[("part", "snippet,contentDetails,statistics"), ("mine", "true")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| FetchFailure::Failed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, "Channel request rejected");
            return Err(FetchFailure::Unauthorized(format!("HTTP {status} - {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Failed(format!("HTTP {status} - {body}")));
        }

        let list: ChannelListResponse = response
            .json()
            .await
            .map_err(|e| FetchFailure::Failed(format!("invalid channel response: {e}")))?;

        let channel = list.items.into_iter().next().ok_or(FetchFailure::NoResource)?;
        Ok(channel.into_snapshot())
    }
}
