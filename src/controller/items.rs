//! Playlist detail controller methods (page fetcher, pagination, deletion)

use tokio::task::JoinHandle;

use super::AppController;
use crate::model::{ConfirmAction, PageQuery, PromptKind};

impl AppController {
    /// Fetch a page every time the page query changes
    pub fn spawn_page_fetcher(&self) -> JoinHandle<()> {
        let mut queries = self.model.subscribe_page_query();
        let controller = self.clone();
        tokio::spawn(async move {
            while queries.changed().await.is_ok() {
                let query = queries.borrow_and_update().clone();
                if let Some(query) = query {
                    let controller = controller.clone();
                    tokio::spawn(async move {
                        controller.fetch_page(query).await;
                    });
                }
            }
        })
    }

    pub(crate) async fn fetch_page(&self, query: PageQuery) {
        let PageQuery {
            playlist_id,
            page_token,
            generation,
        } = query;

        match self
            .api
            .list_playlist_items(&playlist_id, page_token.as_deref())
            .await
        {
            Ok(page) => {
                let count = page.items().len();
                if self.model.apply_page(generation, page).await {
                    tracing::info!(%playlist_id, ?page_token, count, "Loaded playlist page");
                }
            }
            Err(e) => {
                tracing::error!(%playlist_id, ?page_token, error = %e, "Failed to load playlist page");
                self.model.page_failed(generation).await;
                let error_msg = Self::format_error(&e);
                self.model.set_error(error_msg).await;
            }
        }
    }

    pub async fn next_page(&self) {
        if let Some(token) = self.model.pagination().await.next_token {
            self.model.set_page_token(Some(token)).await;
        }
    }

    pub async fn prev_page(&self) {
        if let Some(token) = self.model.pagination().await.prev_token {
            self.model.set_page_token(Some(token)).await;
        }
    }

    pub async fn request_delete_playlist(&self) {
        if let Some(playlist) = self.model.selected_playlist().await {
            self.model
                .request_confirm(ConfirmAction::DeletePlaylist {
                    id: playlist.id.clone(),
                    title: playlist.title().to_string(),
                })
                .await;
        }
    }

    pub async fn request_delete_item(&self) {
        if let Some(item) = self.model.item_under_cursor().await {
            self.model
                .request_confirm(ConfirmAction::DeletePlaylistItem {
                    id: item.id.clone(),
                    title: item.title().to_string(),
                })
                .await;
        }
    }

    /// Run the action the confirmation dialog was asking about
    pub async fn confirm(&self) {
        match self.model.take_confirm().await {
            Some(ConfirmAction::DeletePlaylist { id, title }) => self.delete_playlist(&id, &title).await,
            Some(ConfirmAction::DeletePlaylistItem { id, title }) => self.delete_item(&id, &title).await,
            None => {}
        }
    }

    pub async fn cancel_confirm(&self) {
        if let Some(action) = self.model.take_confirm().await {
            tracing::debug!(?action, "Confirmation declined");
        }
    }

    /// Delete a playlist. The collection and selection are left as they are.
    pub async fn delete_playlist(&self, playlist_id: &str, title: &str) {
        match self.api.delete_playlist(playlist_id).await {
            Ok(()) => {
                tracing::info!(playlist_id, title, "Deleted playlist");
                self.model
                    .set_status(format!("Deleted \"{}\". Press r to reload.", title))
                    .await;
            }
            Err(e) => {
                tracing::error!(playlist_id, error = %e, "Failed to delete playlist");
                let error_msg = Self::format_error(&e);
                self.model.set_error(error_msg).await;
            }
        }
    }

    pub async fn delete_item(&self, item_id: &str, title: &str) {
        match self.api.delete_playlist_item(item_id).await {
            Ok(()) => {
                tracing::info!(item_id, title, "Removed playlist item");
                self.model.set_status(format!("Removed \"{}\".", title)).await;
            }
            Err(e) => {
                tracing::error!(item_id, error = %e, "Failed to remove playlist item");
                let error_msg = Self::format_error(&e);
                self.model.set_error(error_msg).await;
            }
        }
    }

    pub async fn open_add_video_prompt(&self) {
        if let Some(playlist) = self.model.selected_playlist().await {
            self.model
                .open_prompt(PromptKind::AddVideo {
                    playlist_id: playlist.id,
                })
                .await;
        }
    }

    pub async fn add_video(&self, playlist_id: &str, video_id: &str) {
        let video_id = video_id.trim();
        if video_id.is_empty() {
            return;
        }

        match self.api.insert_playlist_item(playlist_id, video_id).await {
            Ok(item) => {
                tracing::info!(playlist_id, video_id, item_id = %item.id, "Added video to playlist");
                self.model
                    .set_status(format!("Added {}. Press r to reload.", video_id))
                    .await;
            }
            Err(e) => {
                tracing::error!(playlist_id, video_id, error = %e, "Failed to add video");
                let error_msg = Self::format_error(&e);
                self.model.set_error(error_msg).await;
            }
        }
    }

    /// Reload the playlist collection and the resident page
    pub async fn reload(&self) {
        self.mount_playlists().await;
        if self.model.selected_playlist().await.is_some() {
            let token = self.model.page_token().await;
            self.model.set_page_token(token).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::controller::test_support::{controller, page, playlist, settle, ApiCall, MockApi};
    use crate::youtube::PlaylistListResponse;

    fn list_items(playlist_id: &str, token: Option<&str>) -> ApiCall {
        ApiCall::ListItems {
            playlist_id: playlist_id.into(),
            page_token: token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn list_select_and_paginate() {
        let api = Arc::new(
            MockApi::default()
                .with_playlists(PlaylistListResponse {
                    items: Some(vec![playlist("A", "Mix", 3)]),
                    ..Default::default()
                })
                .with_page("A", None, page(&["i1", "i2"], Some("T2"), None))
                .with_page("A", Some("T2"), page(&["i3"], None, Some("T1"))),
        );
        let c = controller(api.clone());
        c.spawn_page_fetcher();

        c.mount_playlists().await;
        assert_eq!(c.model.playlists().await.len(), 1);

        c.select_playlist_under_cursor().await;
        settle().await;

        let resident = c.model.page().await.unwrap();
        assert_eq!(resident.items().len(), 2);
        let controls = c.model.pagination().await;
        assert!(controls.next_enabled());
        assert!(!controls.prev_enabled());

        c.next_page().await;
        settle().await;

        assert_eq!(c.model.page().await.unwrap().items()[0].id, "i3");
        assert_eq!(
            api.calls(),
            vec![
                ApiCall::ListPlaylists(None),
                list_items("A", None),
                list_items("A", Some("T2")),
            ]
        );
        let controls = c.model.pagination().await;
        assert!(controls.prev_enabled());
        assert!(!controls.next_enabled());
    }

    #[tokio::test]
    async fn disabled_controls_issue_no_request() {
        let api = Arc::new(MockApi::default().with_page("A", None, page(&["i1"], None, None)));
        let c = controller(api.clone());
        c.spawn_page_fetcher();

        c.select_playlist(playlist("A", "Mix", 1)).await;
        settle().await;
        c.prev_page().await;
        c.next_page().await;
        settle().await;

        assert_eq!(api.calls(), vec![list_items("A", None)]);
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_selection() {
        let api = Arc::new(MockApi::default());
        let c = controller(api);

        let a = c.model.select_playlist(playlist("A", "Mix", 5)).await;
        let b = c.model.select_playlist(playlist("B", "Other", 1)).await;

        // B answers first, then the late response for A arrives
        assert!(c.model.apply_page(b.generation, page(&["b1"], None, None)).await);
        assert!(!c.model.apply_page(a.generation, page(&["a1", "a2"], Some("T2"), None)).await);

        let resident = c.model.page().await.unwrap();
        assert_eq!(resident.items()[0].id, "b1");
        assert!(!c.model.pagination().await.next_enabled());
    }

    #[tokio::test]
    async fn failed_first_fetch_shows_no_page_and_reports() {
        let api = Arc::new(MockApi::default());
        api.fail_with(404);
        let c = controller(api);
        c.spawn_page_fetcher();

        c.select_playlist(playlist("A", "Mix", 1)).await;
        settle().await;

        let state = c.model.get_view_state().await;
        assert!(state.page.page.is_none());
        assert!(!state.page.is_loading);
        assert!(state.ui.error_message.unwrap().contains("Not found"));
    }

    #[tokio::test]
    async fn failed_next_keeps_previous_page_usable() {
        let api = Arc::new(MockApi::default().with_page("A", None, page(&["i1", "i2"], Some("T2"), None)));
        let c = controller(api.clone());
        c.spawn_page_fetcher();

        c.select_playlist(playlist("A", "Mix", 3)).await;
        settle().await;

        api.fail_with(500);
        c.next_page().await;
        settle().await;

        let state = c.model.get_view_state().await;
        assert_eq!(state.page.page.as_ref().unwrap().items().len(), 2);
        assert!(!state.page.is_loading);
        assert!(state.ui.error_message.is_some());
        assert!(c.model.pagination().await.next_enabled());

        // Retrying Next asks for the same page again
        c.next_page().await;
        settle().await;
        assert_eq!(api.calls().len(), 3);
        assert_eq!(api.calls()[2], list_items("A", Some("T2")));
    }

    #[tokio::test]
    async fn confirmed_delete_removes_playlist_once() {
        let api = Arc::new(MockApi::default());
        let c = controller(api.clone());
        c.model.set_playlists(vec![playlist("A", "Mix", 3)]).await;
        c.model.select_playlist(playlist("A", "Mix", 3)).await;

        c.request_delete_playlist().await;
        assert!(c.model.is_confirm_open().await);
        c.confirm().await;

        assert_eq!(api.calls(), vec![ApiCall::DeletePlaylist("A".into())]);
        assert!(!c.model.is_confirm_open().await);
        assert_eq!(c.model.playlists().await.len(), 1);
        assert_eq!(c.model.selected_playlist().await.unwrap().id, "A");
    }

    #[tokio::test]
    async fn declined_delete_issues_nothing() {
        let api = Arc::new(MockApi::default());
        let c = controller(api.clone());
        c.model.select_playlist(playlist("A", "Mix", 3)).await;

        c.request_delete_playlist().await;
        c.cancel_confirm().await;
        c.confirm().await;

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn item_delete_and_add_target_selected_playlist() {
        let api = Arc::new(MockApi::default().with_page("A", None, page(&["i1"], None, None)));
        let c = controller(api.clone());
        c.spawn_page_fetcher();
        c.select_playlist(playlist("A", "Mix", 1)).await;
        settle().await;

        c.request_delete_item().await;
        c.confirm().await;
        c.add_video("A", " dQw4w9WgXcQ ").await;

        assert_eq!(
            api.calls()[1..],
            [
                ApiCall::DeleteItem("i1".into()),
                ApiCall::InsertItem {
                    playlist_id: "A".into(),
                    video_id: "dQw4w9WgXcQ".into()
                },
            ]
        );
    }
}
