//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, scrollable lists, popups)
//! - `layout`: Top bar, playlist sidebar, status line, loading and sign-in screens
//! - `content`: Playlist detail (header, page controls, items)
//! - `overlays`: Modal overlays (error, confirmation, prompt, help)

mod content;
mod layout;
mod overlays;
mod utils;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{Session, ViewState};

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, state: &ViewState) {
        match &state.session {
            Session::Unknown => layout::render_loading(frame, frame.area()),
            Session::SignedOut => layout::render_sign_in(frame, frame.area(), &state.ui),
            Session::SignedIn(user) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3), // Title + account
                        Constraint::Min(0),    // Sidebar + detail
                        Constraint::Length(1), // Status line
                    ])
                    .split(frame.area());

                layout::render_top_bar(frame, chunks[0], user);

                let main_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(35), // Playlists
                        Constraint::Percentage(65), // Selected playlist
                    ])
                    .split(chunks[1]);

                layout::render_sidebar(frame, main_chunks[0], &state.playlists, &state.ui);
                content::render_main_content(
                    frame,
                    main_chunks[1],
                    state.selected_playlist.as_ref(),
                    &state.page,
                    &state.ui,
                );
                layout::render_status_line(frame, chunks[2], &state.ui);
            }
        }

        if let Some(prompt) = &state.ui.prompt {
            overlays::render_prompt(frame, prompt);
        }

        if let Some(action) = &state.ui.confirm {
            overlays::render_confirm(frame, action);
        }

        if state.ui.show_help_popup {
            overlays::render_help_popup(frame);
        }

        // Error notification overlay (if there's an error)
        if state.ui.error_message.is_some() {
            overlays::render_error_notification(frame, &state.ui);
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::auth::UserHandle;
    use crate::model::{ConfirmAction, PageState, UiState};
    use crate::youtube::{
        Playlist, PlaylistContentDetails, PlaylistItem, PlaylistItemListResponse, PlaylistItemSnippet,
        PlaylistSnippet,
    };

    fn state(session: Session) -> ViewState {
        ViewState {
            session,
            playlists: Vec::new(),
            selected_playlist: None,
            page: PageState::default(),
            ui: UiState::default(),
        }
    }

    fn draw(state: &ViewState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| AppView::render(frame, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn mix() -> Playlist {
        Playlist {
            id: "A".into(),
            snippet: Some(PlaylistSnippet {
                title: "Mix".into(),
                ..Default::default()
            }),
            content_details: Some(PlaylistContentDetails { item_count: 3 }),
            status: None,
        }
    }

    fn signed_in() -> Session {
        Session::SignedIn(UserHandle::signed_in(chrono::Utc::now()))
    }

    #[test]
    fn unknown_session_shows_loading() {
        assert!(draw(&state(Session::Unknown)).contains("Loading..."));
    }

    #[test]
    fn signed_out_shows_sign_in_prompt() {
        let screen = draw(&state(Session::SignedOut));
        assert!(screen.contains("Sign in"));
        assert!(!screen.contains("Playlists"));
    }

    #[test]
    fn pending_sign_in_shows_address_and_cancel_hint() {
        let mut view = state(Session::SignedOut);
        view.ui.sign_in_url = Some("https://accounts.test/auth".into());
        let screen = draw(&view);
        assert!(screen.contains("https://accounts.test/auth"));
        assert!(screen.contains("Esc cancel"));
        assert!(!screen.contains("Enter sign in"));
    }

    #[test]
    fn shell_lists_playlists_with_counts() {
        let mut view = state(signed_in());
        view.playlists = vec![mix()];
        let screen = draw(&view);
        assert!(screen.contains("Mix (3)"));
        assert!(screen.contains("Select a playlist"));
    }

    #[test]
    fn detail_shows_items_of_resident_page() {
        let mut view = state(signed_in());
        view.playlists = vec![mix()];
        view.selected_playlist = Some(mix());
        view.page.page = Some(PlaylistItemListResponse {
            items: Some(vec![PlaylistItem {
                id: "i1".into(),
                snippet: Some(PlaylistItemSnippet {
                    title: "First video".into(),
                    ..Default::default()
                }),
                content_details: None,
            }]),
            next_page_token: Some("T2".into()),
            ..Default::default()
        });

        let screen = draw(&view);
        assert!(screen.contains("Mix (3 videos)"));
        assert!(screen.contains("First video"));
        assert!(screen.contains("Next"));
    }

    #[test]
    fn confirm_dialog_asks_before_delete() {
        let mut view = state(signed_in());
        view.ui.confirm = Some(ConfirmAction::DeletePlaylist {
            id: "A".into(),
            title: "Mix".into(),
        });
        assert!(draw(&view).contains("Really delete Mix?"));
    }
}
