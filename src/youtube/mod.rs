//! YouTube Data API access
//!
//! - `types`: request/response records
//! - `client`: reqwest-backed implementation of [`PlaylistApi`]

mod client;
mod types;

use async_trait::async_trait;

use crate::error::ApiResult;

pub use client::YoutubeClient;
pub use types::{
    PageInfo, Playlist, PlaylistContentDetails, PlaylistInsert, PlaylistItem,
    PlaylistItemContentDetails, PlaylistItemInsert, PlaylistItemListResponse,
    PlaylistItemSnippet, PlaylistListResponse, PlaylistSnippet, PlaylistStatus, ResourceId,
    Thumbnail, Thumbnails,
};

/// The playlist operations the application uses.
///
/// Each call is exactly one round trip; nothing is retried or validated locally.
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    /// One page (25 items) of a playlist
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<PlaylistItemListResponse>;

    async fn insert_playlist_item(&self, playlist_id: &str, video_id: &str) -> ApiResult<PlaylistItem>;

    async fn delete_playlist_item(&self, item_id: &str) -> ApiResult<()>;

    /// One page (25 playlists) of the signed-in user's playlists
    async fn list_playlists(&self, page_token: Option<&str>) -> ApiResult<PlaylistListResponse>;

    /// Creates a private, English-language playlist
    async fn insert_playlist(
        &self,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> ApiResult<Playlist>;

    async fn delete_playlist(&self, playlist_id: &str) -> ApiResult<()>;
}
