//! Protected-resource snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The literal state of the protected resource (a YouTube channel) at fetch
/// time. Built once by the resource API and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSnapshot {
    /// Resource identifier (channel ID).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Vanity handle, e.g. `@example`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,

    /// Creation timestamp as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,

    /// Numeric statistics.
    #[serde(default)]
    pub statistics: ResourceStatistics,

    /// Image reference (thumbnail URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ResourceSnapshot {
    /// Creates a snapshot with only an identifier and title.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            custom_url: None,
            published_at: None,
            statistics: ResourceStatistics::default(),
            image: None,
        }
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the statistics.
    #[must_use]
    pub fn with_statistics(mut self, statistics: ResourceStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Returns the value of a named field, if present.
    #[must_use]
    pub fn field(&self, field: SnapshotField) -> Option<String> {
        match field {
            SnapshotField::Id => Some(self.id.clone()),
            SnapshotField::Title => Some(self.title.clone()),
            SnapshotField::Description => self.description.clone(),
            SnapshotField::CustomUrl => self.custom_url.clone(),
            SnapshotField::PublishedAt => self.published_at.clone(),
            SnapshotField::SubscriberCount => {
                if self.statistics.hidden_subscriber_count {
                    None
                } else {
                    self.statistics.subscriber_count.map(|n| n.to_string())
                }
            }
            SnapshotField::ViewCount => self.statistics.view_count.map(|n| n.to_string()),
            SnapshotField::VideoCount => self.statistics.video_count.map(|n| n.to_string()),
            SnapshotField::Image => self.image.clone(),
        }
        .filter(|v| !v.is_empty())
    }
}

/// Channel statistics. Counts are absent when the provider hides them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatistics {
    /// Subscriber count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<u64>,

    /// Total view count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,

    /// Number of public videos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_count: Option<u64>,

    /// The owner chose to hide the subscriber count.
    #[serde(default)]
    pub hidden_subscriber_count: bool,
}

/// Addressable fields of a [`ResourceSnapshot`], used by metadata templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotField {
    Id,
    Title,
    Description,
    CustomUrl,
    PublishedAt,
    SubscriberCount,
    ViewCount,
    VideoCount,
    Image,
}

impl fmt::Display for SnapshotField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Description => "description",
            Self::CustomUrl => "customUrl",
            Self::PublishedAt => "publishedAt",
            Self::SubscriberCount => "subscriberCount",
            Self::ViewCount => "viewCount",
            Self::VideoCount => "videoCount",
            Self::Image => "image",
        };
        f.write_str(name)
    }
}
