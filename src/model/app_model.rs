//! Main application model with state management
//!
//! Owns the session, the playlist collection, the selected playlist and the
//! resident page. All mutation goes through the methods below.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};

use super::page::{PageQuery, PageState, PaginationControls};
use super::types::{ActiveSection, ConfirmAction, Prompt, PromptKind, Session, UiState};
use crate::youtube::{Playlist, PlaylistItem, PlaylistItemListResponse};

const ERROR_DISPLAY_SECS: u64 = 5;

/// Snapshot handed to the view each frame
#[derive(Clone, Debug)]
pub struct ViewState {
    pub session: Session,
    pub playlists: Vec<Playlist>,
    pub selected_playlist: Option<Playlist>,
    pub page: PageState,
    pub ui: UiState,
}

pub struct AppModel {
    session: Arc<Mutex<Session>>,
    playlists: Arc<Mutex<Vec<Playlist>>>,
    selected_playlist: Arc<Mutex<Option<Playlist>>>,
    page_state: Arc<Mutex<PageState>>,
    page_query: watch::Sender<Option<PageQuery>>,
    ui_state: Arc<Mutex<UiState>>,
    should_quit: Arc<Mutex<bool>>,
}

impl AppModel {
    pub fn new() -> Self {
        let (page_query, _) = watch::channel(None);
        Self {
            session: Arc::new(Mutex::new(Session::Unknown)),
            playlists: Arc::new(Mutex::new(Vec::new())),
            selected_playlist: Arc::new(Mutex::new(None)),
            page_state: Arc::new(Mutex::new(PageState::default())),
            page_query,
            ui_state: Arc::new(Mutex::new(UiState::default())),
            should_quit: Arc::new(Mutex::new(false)),
        }
    }

    // ========================================================================
    // Session
    // ========================================================================

    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    /// Replace the session, returning the previous one
    pub async fn set_session(&self, session: Session) -> Session {
        let mut current = self.session.lock().await;
        std::mem::replace(&mut *current, session)
    }

    // ========================================================================
    // Playlist collection & selection
    // ========================================================================

    pub async fn playlists(&self) -> Vec<Playlist> {
        self.playlists.lock().await.clone()
    }

    pub async fn set_playlists(&self, playlists: Vec<Playlist>) {
        let len = playlists.len();
        *self.playlists.lock().await = playlists;

        let mut ui = self.ui_state.lock().await;
        ui.playlist_cursor = ui.playlist_cursor.min(len.saturating_sub(1));
    }

    pub async fn selected_playlist(&self) -> Option<Playlist> {
        self.selected_playlist.lock().await.clone()
    }

    /// Select a playlist and request its first page.
    ///
    /// The previous playlist's page is dropped; it never answers for this one.
    pub async fn select_playlist(&self, playlist: Playlist) -> PageQuery {
        let mut selected = self.selected_playlist.lock().await;
        let mut page_state = self.page_state.lock().await;
        let playlist_id = playlist.id.clone();
        *selected = Some(playlist);
        page_state.page_token = None;
        page_state.page = None;
        self.publish_query(&mut page_state, playlist_id)
    }

    pub async fn page_token(&self) -> Option<String> {
        self.page_state.lock().await.page_token.clone()
    }

    /// Move to another page of the selected playlist; no-op without a selection.
    ///
    /// The current page stays resident until the new one arrives, so a failed
    /// fetch leaves it in place.
    pub async fn set_page_token(&self, page_token: Option<String>) -> Option<PageQuery> {
        let selected = self.selected_playlist.lock().await;
        let playlist_id = selected.as_ref()?.id.clone();
        let mut page_state = self.page_state.lock().await;
        page_state.page_token = page_token;
        Some(self.publish_query(&mut page_state, playlist_id))
    }

    fn publish_query(&self, page_state: &mut PageState, playlist_id: String) -> PageQuery {
        page_state.generation += 1;
        page_state.is_loading = true;
        let query = PageQuery {
            playlist_id,
            page_token: page_state.page_token.clone(),
            generation: page_state.generation,
        };
        tracing::debug!(
            playlist_id = %query.playlist_id,
            page_token = ?query.page_token,
            generation = query.generation,
            "Page query changed"
        );
        self.page_query.send_replace(Some(query.clone()));
        query
    }

    pub fn subscribe_page_query(&self) -> watch::Receiver<Option<PageQuery>> {
        self.page_query.subscribe()
    }

    /// Store a fetched page if it answers the latest query
    pub async fn apply_page(&self, generation: u64, page: PlaylistItemListResponse) -> bool {
        let mut page_state = self.page_state.lock().await;
        if page_state.generation != generation {
            tracing::debug!(
                generation,
                latest = page_state.generation,
                "Discarding stale playlist page"
            );
            return false;
        }
        page_state.page = Some(page);
        page_state.is_loading = false;
        drop(page_state);

        self.ui_state.lock().await.item_cursor = 0;
        true
    }

    /// Stop showing the loading state after a failed fetch of the latest query
    pub async fn page_failed(&self, generation: u64) {
        let mut page_state = self.page_state.lock().await;
        if page_state.generation == generation {
            page_state.is_loading = false;
        }
    }

    pub async fn page(&self) -> Option<PlaylistItemListResponse> {
        self.page_state.lock().await.page.clone()
    }

    pub async fn pagination(&self) -> PaginationControls {
        self.page_state.lock().await.pagination()
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub async fn get_ui_state(&self) -> UiState {
        self.ui_state.lock().await.clone()
    }

    pub async fn cycle_section_forward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.next();
    }

    pub async fn cycle_section_backward(&self) {
        let mut state = self.ui_state.lock().await;
        state.active_section = state.active_section.prev();
    }

    pub async fn set_active_section(&self, section: ActiveSection) {
        self.ui_state.lock().await.active_section = section;
    }

    pub async fn move_selection_up(&self) {
        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Playlists => state.playlist_cursor = state.playlist_cursor.saturating_sub(1),
            ActiveSection::Items => state.item_cursor = state.item_cursor.saturating_sub(1),
        }
    }

    pub async fn move_selection_down(&self) {
        let section = self.ui_state.lock().await.active_section;
        let max = match section {
            ActiveSection::Playlists => self.playlists.lock().await.len(),
            ActiveSection::Items => self
                .page_state
                .lock()
                .await
                .page
                .as_ref()
                .map(|p| p.items().len())
                .unwrap_or(0),
        };

        let mut state = self.ui_state.lock().await;
        match state.active_section {
            ActiveSection::Playlists => {
                if state.playlist_cursor < max.saturating_sub(1) {
                    state.playlist_cursor += 1;
                }
            }
            ActiveSection::Items => {
                if state.item_cursor < max.saturating_sub(1) {
                    state.item_cursor += 1;
                }
            }
        }
    }

    /// Playlist under the sidebar cursor
    pub async fn playlist_under_cursor(&self) -> Option<Playlist> {
        let cursor = self.ui_state.lock().await.playlist_cursor;
        self.playlists.lock().await.get(cursor).cloned()
    }

    /// Item under the detail-view cursor
    pub async fn item_under_cursor(&self) -> Option<PlaylistItem> {
        let cursor = self.ui_state.lock().await.item_cursor;
        let page_state = self.page_state.lock().await;
        page_state.page.as_ref().and_then(|p| p.items().get(cursor).cloned())
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    pub async fn set_error(&self, message: String) {
        let mut state = self.ui_state.lock().await;
        state.error_message = Some(message);
        state.error_timestamp = Some(Instant::now());
    }

    pub async fn clear_error(&self) {
        let mut state = self.ui_state.lock().await;
        state.error_message = None;
        state.error_timestamp = None;
    }

    pub async fn has_error(&self) -> bool {
        self.ui_state.lock().await.error_message.is_some()
    }

    pub async fn auto_clear_old_errors(&self) {
        let mut state = self.ui_state.lock().await;
        if let Some(timestamp) = state.error_timestamp {
            if timestamp.elapsed().as_secs() > ERROR_DISPLAY_SECS {
                state.error_message = None;
                state.error_timestamp = None;
            }
        }
    }

    pub async fn set_status(&self, message: impl Into<String>) {
        self.ui_state.lock().await.status_message = Some(message.into());
    }

    // ========================================================================
    // Dialogs
    // ========================================================================

    pub async fn request_confirm(&self, action: ConfirmAction) {
        self.ui_state.lock().await.confirm = Some(action);
    }

    pub async fn is_confirm_open(&self) -> bool {
        self.ui_state.lock().await.confirm.is_some()
    }

    /// Close the confirmation dialog, returning what it was asking about
    pub async fn take_confirm(&self) -> Option<ConfirmAction> {
        self.ui_state.lock().await.confirm.take()
    }

    pub async fn open_prompt(&self, kind: PromptKind) {
        self.ui_state.lock().await.prompt = Some(Prompt {
            kind,
            input: String::new(),
        });
    }

    pub async fn is_prompt_open(&self) -> bool {
        self.ui_state.lock().await.prompt.is_some()
    }

    pub async fn prompt_push(&self, c: char) {
        if let Some(prompt) = self.ui_state.lock().await.prompt.as_mut() {
            prompt.input.push(c);
        }
    }

    pub async fn prompt_backspace(&self) {
        if let Some(prompt) = self.ui_state.lock().await.prompt.as_mut() {
            prompt.input.pop();
        }
    }

    pub async fn take_prompt(&self) -> Option<Prompt> {
        self.ui_state.lock().await.prompt.take()
    }

    pub async fn show_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = true;
    }

    pub async fn hide_help_popup(&self) {
        self.ui_state.lock().await.show_help_popup = false;
    }

    pub async fn is_help_popup_open(&self) -> bool {
        self.ui_state.lock().await.show_help_popup
    }

    pub async fn set_sign_in_url(&self, url: Option<String>) {
        self.ui_state.lock().await.sign_in_url = url;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub async fn should_quit(&self) -> bool {
        *self.should_quit.lock().await
    }

    pub async fn set_should_quit(&self, quit: bool) {
        *self.should_quit.lock().await = quit;
    }

    pub async fn get_view_state(&self) -> ViewState {
        ViewState {
            session: self.session().await,
            playlists: self.playlists().await,
            selected_playlist: self.selected_playlist().await,
            page: self.page_state.lock().await.clone(),
            ui: self.get_ui_state().await,
        }
    }
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new()
    }
}
