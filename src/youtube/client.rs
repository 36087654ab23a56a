//! reqwest client for the YouTube Data API v3

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

use super::types::{
    Playlist, PlaylistInsert, PlaylistItem, PlaylistItemInsert, PlaylistItemListResponse,
    PlaylistListResponse,
};
use super::PlaylistApi;
use crate::auth::AuthClient;
use crate::config::{API_BASE_URL, PAGE_SIZE};
use crate::error::{ApiError, ApiResult};
use crate::{log_api_request, log_api_result};

#[derive(Clone)]
pub struct YoutubeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    auth: Arc<AuthClient>,
}

impl YoutubeClient {
    /// Configure the client with the static API key; OAuth tokens come from `auth`
    pub fn load(http: reqwest::Client, api_key: &str, auth: Arc<AuthClient>) -> Self {
        Self {
            http,
            base_url: API_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            auth,
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn request(&self, method: Method, resource: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/{}", self.base_url, resource))
            .query(&[("key", self.api_key.as_str())]);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn playlist_items_list_request(
        &self,
        token: Option<&str>,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> RequestBuilder {
        let builder = self
            .request(Method::GET, "playlistItems", token)
            .query(&[("part", "snippet,contentDetails"), ("playlistId", playlist_id)])
            .query(&[("maxResults", PAGE_SIZE)]);
        match page_token {
            Some(page_token) => builder.query(&[("pageToken", page_token)]),
            None => builder,
        }
    }

    fn playlist_items_insert_request(
        &self,
        token: Option<&str>,
        playlist_id: &str,
        video_id: &str,
    ) -> RequestBuilder {
        self.request(Method::POST, "playlistItems", token)
            .query(&[("part", "snippet")])
            .json(&PlaylistItemInsert::video(playlist_id, video_id))
    }

    fn playlist_items_delete_request(&self, token: Option<&str>, item_id: &str) -> RequestBuilder {
        self.request(Method::DELETE, "playlistItems", token)
            .query(&[("id", item_id)])
    }

    fn playlists_list_request(&self, token: Option<&str>, page_token: Option<&str>) -> RequestBuilder {
        let builder = self
            .request(Method::GET, "playlists", token)
            .query(&[("part", "snippet,contentDetails"), ("mine", "true")])
            .query(&[("maxResults", PAGE_SIZE)]);
        match page_token {
            Some(page_token) => builder.query(&[("pageToken", page_token)]),
            None => builder,
        }
    }

    fn playlists_insert_request(
        &self,
        token: Option<&str>,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> RequestBuilder {
        self.request(Method::POST, "playlists", token)
            .query(&[("part", "snippet,status")])
            .json(&PlaylistInsert::private(title, description, tags))
    }

    fn playlists_delete_request(&self, token: Option<&str>, playlist_id: &str) -> RequestBuilder {
        self.request(Method::DELETE, "playlists", token)
            .query(&[("id", playlist_id)])
    }

    /// Fetch an access token and send the built request. Token failures come
    /// back as the call's result so they are logged like any other failure.
    async fn authorized_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        build: impl FnOnce(&str) -> RequestBuilder + Send,
    ) -> ApiResult<T> {
        let token = self.auth.access_token().await?;
        Self::send_json(operation, build(&token)).await
    }

    async fn authorized_empty(
        &self,
        operation: &'static str,
        build: impl FnOnce(&str) -> RequestBuilder + Send,
    ) -> ApiResult<()> {
        let token = self.auth.access_token().await?;
        Self::send_empty(operation, build(&token)).await
    }

    async fn send_json<T: DeserializeOwned>(
        operation: &'static str,
        builder: RequestBuilder,
    ) -> ApiResult<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { operation, source })
    }

    async fn send_empty(operation: &'static str, builder: RequestBuilder) -> ApiResult<()> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PlaylistApi for YoutubeClient {
    async fn list_playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> ApiResult<PlaylistItemListResponse> {
        log_api_request!("playlistItems.list", playlist_id, page_token = ?page_token);
        let result = self
            .authorized_json("playlistItems.list", |token| {
                self.playlist_items_list_request(Some(token), playlist_id, page_token)
            })
            .await;
        log_api_result!("playlistItems.list", result);
        result
    }

    async fn insert_playlist_item(&self, playlist_id: &str, video_id: &str) -> ApiResult<PlaylistItem> {
        log_api_request!("playlistItems.insert", playlist_id, video_id);
        let result = self
            .authorized_json("playlistItems.insert", |token| {
                self.playlist_items_insert_request(Some(token), playlist_id, video_id)
            })
            .await;
        log_api_result!("playlistItems.insert", result);
        result
    }

    async fn delete_playlist_item(&self, item_id: &str) -> ApiResult<()> {
        log_api_request!("playlistItems.delete", item_id);
        let result = self
            .authorized_empty("playlistItems.delete", |token| {
                self.playlist_items_delete_request(Some(token), item_id)
            })
            .await;
        log_api_result!("playlistItems.delete", result);
        result
    }

    async fn list_playlists(&self, page_token: Option<&str>) -> ApiResult<PlaylistListResponse> {
        log_api_request!("playlists.list", page_token = ?page_token);
        let result = self
            .authorized_json("playlists.list", |token| {
                self.playlists_list_request(Some(token), page_token)
            })
            .await;
        log_api_result!("playlists.list", result);
        result
    }

    async fn insert_playlist(
        &self,
        title: &str,
        description: &str,
        tags: &[String],
    ) -> ApiResult<Playlist> {
        log_api_request!("playlists.insert", title);
        let result = self
            .authorized_json("playlists.insert", |token| {
                self.playlists_insert_request(Some(token), title, description, tags)
            })
            .await;
        log_api_result!("playlists.insert", result);
        result
    }

    async fn delete_playlist(&self, playlist_id: &str) -> ApiResult<()> {
        log_api_request!("playlists.delete", playlist_id);
        let result = self
            .authorized_empty("playlists.delete", |token| {
                self.playlists_delete_request(Some(token), playlist_id)
            })
            .await;
        log_api_result!("playlists.delete", result);
        result
    }
}
