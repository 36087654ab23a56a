//! Playlist list controller methods (mount, select, create)

use super::AppController;
use crate::model::{ActiveSection, PromptKind};
use crate::youtube::Playlist;

impl AppController {
    /// Load the signed-in user's playlists with a single list call
    pub async fn mount_playlists(&self) {
        match self.api.list_playlists(None).await {
            Ok(response) => {
                let playlists = response.items.unwrap_or_default();
                tracing::info!(count = playlists.len(), "Loaded playlists");
                self.model.set_playlists(playlists).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load playlists");
                let error_msg = Self::format_error(&e);
                self.model.set_error(error_msg).await;
            }
        }
    }

    pub async fn select_playlist_under_cursor(&self) {
        if let Some(playlist) = self.model.playlist_under_cursor().await {
            self.select_playlist(playlist).await;
        }
    }

    pub async fn select_playlist(&self, playlist: Playlist) {
        tracing::debug!(playlist_id = %playlist.id, title = playlist.title(), "Selecting playlist");
        self.model.select_playlist(playlist).await;
        self.model.set_active_section(ActiveSection::Items).await;
    }

    pub async fn open_new_playlist_prompt(&self) {
        self.model.open_prompt(PromptKind::NewPlaylist).await;
    }

    /// Create a private playlist. The list is not refreshed; `r` reloads it.
    pub async fn create_playlist(&self, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }

        match self.api.insert_playlist(title, "", &[]).await {
            Ok(playlist) => {
                tracing::info!(playlist_id = %playlist.id, title, "Created playlist");
                self.model
                    .set_status(format!("Created \"{}\". Press r to reload.", title))
                    .await;
            }
            Err(e) => {
                tracing::error!(title, error = %e, "Failed to create playlist");
                let error_msg = Self::format_error(&e);
                self.model.set_error(error_msg).await;
            }
        }
    }
}
