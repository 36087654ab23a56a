//! Request and response records for the YouTube Data API v3 endpoints we use

use serde::{Deserialize, Serialize};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Thumbnail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<Thumbnail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<Thumbnail>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistContentDetails {
    #[serde(default)]
    pub item_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStatus {
    pub privacy_status: String,
}

/// A playlist owned by the signed-in user
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<PlaylistContentDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlaylistStatus>,
}

impl Playlist {
    pub fn title(&self) -> &str {
        self.snippet
            .as_ref()
            .map(|s| s.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or("(untitled)")
    }

    pub fn description(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .map(|s| s.description.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn item_count(&self) -> u32 {
        self.content_details.as_ref().map(|c| c.item_count).unwrap_or(0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl ResourceId {
    pub fn video(video_id: &str) -> Self {
        Self {
            kind: "youtube#video".to_string(),
            video_id: Some(video_id.to_string()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(default)]
    pub playlist_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_owner_channel_title: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    #[serde(default)]
    pub video_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_published_at: Option<String>,
}

/// One entry of a playlist
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<PlaylistItemSnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_details: Option<PlaylistItemContentDetails>,
}

impl PlaylistItem {
    pub fn title(&self) -> &str {
        self.snippet
            .as_ref()
            .map(|s| s.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or("(untitled)")
    }

    pub fn description(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .map(|s| s.description.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn channel(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .and_then(|s| s.video_owner_channel_title.as_deref())
    }

    /// Video id from contentDetails, falling back to the snippet's resourceId
    pub fn video_id(&self) -> Option<&str> {
        self.content_details
            .as_ref()
            .map(|c| c.video_id.as_str())
            .filter(|id| !id.is_empty())
            .or_else(|| {
                self.snippet
                    .as_ref()
                    .and_then(|s| s.resource_id.as_ref())
                    .and_then(|r| r.video_id.as_deref())
            })
    }

    pub fn watch_url(&self) -> Option<String> {
        self.video_id().map(|id| format!("{}{}", WATCH_URL, id))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total_results: u32,
    #[serde(default)]
    pub results_per_page: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistListResponse {
    #[serde(default)]
    pub items: Option<Vec<Playlist>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

/// A single page of playlist items
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Option<Vec<PlaylistItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
}

impl PlaylistItemListResponse {
    pub fn items(&self) -> &[PlaylistItem] {
        self.items.as_deref().unwrap_or(&[])
    }

    pub fn total_results(&self) -> Option<u32> {
        self.page_info.as_ref().map(|p| p.total_results)
    }
}

/// Body of `playlists.insert`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaylistInsert {
    pub snippet: PlaylistSnippet,
    pub status: PlaylistStatus,
}

impl PlaylistInsert {
    pub fn private(title: &str, description: &str, tags: &[String]) -> Self {
        Self {
            snippet: PlaylistSnippet {
                title: title.to_string(),
                description: description.to_string(),
                tags: Some(tags.to_vec()),
                default_language: Some("en".to_string()),
                ..Default::default()
            },
            status: PlaylistStatus {
                privacy_status: "private".to_string(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemInsertSnippet {
    pub playlist_id: String,
    pub resource_id: ResourceId,
}

/// Body of `playlistItems.insert`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaylistItemInsert {
    pub snippet: PlaylistItemInsertSnippet,
}

impl PlaylistItemInsert {
    pub fn video(playlist_id: &str, video_id: &str) -> Self {
        Self {
            snippet: PlaylistItemInsertSnippet {
                playlist_id: playlist_id.to_string(),
                resource_id: ResourceId::video(video_id),
            },
        }
    }
}
