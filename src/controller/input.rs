//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::AppController;
use crate::model::{ActiveSection, PromptKind, Session};

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.model.set_should_quit(true).await;
            return Ok(());
        }

        // Handle error message first (blocks all other interactions)
        if self.model.has_error().await {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                self.model.clear_error().await;
            }
            return Ok(());
        }

        if self.model.is_confirm_open().await {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.confirm().await,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => self.cancel_confirm().await,
                _ => {}
            }
            return Ok(());
        }

        if self.model.is_prompt_open().await {
            match key.code {
                KeyCode::Enter => self.submit_prompt().await,
                KeyCode::Esc => {
                    self.model.take_prompt().await;
                }
                KeyCode::Backspace => self.model.prompt_backspace().await,
                KeyCode::Char(c) => self.model.prompt_push(c).await,
                _ => {}
            }
            return Ok(());
        }

        if self.model.is_help_popup_open().await {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')
            ) {
                self.model.hide_help_popup().await;
            }
            return Ok(());
        }

        match self.model.session().await {
            Session::Unknown => {
                if key.code == KeyCode::Char('q') {
                    self.model.set_should_quit(true).await;
                }
            }
            Session::SignedOut => match key.code {
                KeyCode::Enter => self.sign_in().await,
                KeyCode::Esc => self.cancel_sign_in().await,
                KeyCode::Char('q') => self.model.set_should_quit(true).await,
                _ => {}
            },
            Session::SignedIn(_) => self.handle_shell_key(key).await,
        }

        Ok(())
    }

    async fn handle_shell_key(&self, key: KeyEvent) {
        let section = self.model.get_ui_state().await.active_section;

        match key.code {
            KeyCode::Char('q') => self.model.set_should_quit(true).await,
            KeyCode::Tab => self.model.cycle_section_forward().await,
            KeyCode::BackTab => self.model.cycle_section_backward().await,
            KeyCode::Up => self.model.move_selection_up().await,
            KeyCode::Down => self.model.move_selection_down().await,
            KeyCode::Char('h') | KeyCode::Char('H') => self.model.show_help_popup().await,
            KeyCode::Char('r') => self.reload().await,
            KeyCode::Char('c') => self.open_new_playlist_prompt().await,
            KeyCode::Char('o') => self.sign_out().await,
            _ => match section {
                ActiveSection::Playlists => {
                    if key.code == KeyCode::Enter {
                        self.select_playlist_under_cursor().await;
                    }
                }
                ActiveSection::Items => match key.code {
                    KeyCode::Left | KeyCode::Char('p') => self.prev_page().await,
                    KeyCode::Right | KeyCode::Char('n') => self.next_page().await,
                    KeyCode::Char('D') => self.request_delete_playlist().await,
                    KeyCode::Char('x') => self.request_delete_item().await,
                    KeyCode::Char('a') => self.open_add_video_prompt().await,
                    KeyCode::Esc => self.model.set_active_section(ActiveSection::Playlists).await,
                    _ => {}
                },
            },
        }
    }

    async fn submit_prompt(&self) {
        let Some(prompt) = self.model.take_prompt().await else {
            return;
        };
        match prompt.kind {
            PromptKind::NewPlaylist => self.create_playlist(&prompt.input).await,
            PromptKind::AddVideo { playlist_id } => self.add_video(&playlist_id, &prompt.input).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use crate::auth::UserHandle;
    use crate::controller::test_support::{controller, page, playlist, settle, ApiCall, MockApi};
    use crate::controller::AppController;
    use crate::model::{ActiveSection, Session};

    async fn press(c: &AppController, code: KeyCode) {
        c.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .await
            .unwrap();
    }

    async fn signed_in_controller(api: Arc<MockApi>) -> AppController {
        let c = controller(api);
        c.model
            .set_session(Session::SignedIn(UserHandle::signed_in(
                chrono::Utc::now() + chrono::Duration::hours(1),
            )))
            .await;
        c
    }

    #[tokio::test]
    async fn unknown_session_ignores_shell_keys() {
        let api = Arc::new(MockApi::default());
        let c = controller(api.clone());
        press(&c, KeyCode::Char('r')).await;
        press(&c, KeyCode::Enter).await;
        assert!(api.calls().is_empty());
        assert!(!c.model.should_quit().await);

        press(&c, KeyCode::Char('q')).await;
        assert!(c.model.should_quit().await);
    }

    static OPENED: Mutex<Vec<String>> = Mutex::new(Vec::new());

    fn record_open(url: &str) -> io::Result<()> {
        OPENED.lock().unwrap().push(url.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn esc_cancels_pending_sign_in_so_it_can_restart() {
        let c = controller(Arc::new(MockApi::default())).with_browser(record_open);
        c.model.set_session(Session::SignedOut).await;

        press(&c, KeyCode::Enter).await;
        let first = c.model.get_ui_state().await.sign_in_url;
        assert!(first.is_some());
        assert_eq!(OPENED.lock().unwrap().last(), first.as_ref());

        press(&c, KeyCode::Esc).await;
        assert_eq!(c.model.get_ui_state().await.sign_in_url, None);

        // The redirect listener was released, so binding it again succeeds
        press(&c, KeyCode::Enter).await;
        let state = c.model.get_ui_state().await;
        assert_eq!(state.error_message, None);
        let second = state.sign_in_url.unwrap();
        assert_ne!(Some(second), first);

        press(&c, KeyCode::Esc).await;
    }

    #[tokio::test]
    async fn error_overlay_blocks_input_until_dismissed() {
        let api = Arc::new(MockApi::default());
        let c = signed_in_controller(api.clone()).await;
        c.model.set_error("boom".into()).await;

        press(&c, KeyCode::Char('r')).await;
        assert!(api.calls().is_empty());

        press(&c, KeyCode::Esc).await;
        assert!(!c.model.has_error().await);
    }

    #[tokio::test]
    async fn detail_keys_paginate_and_confirm_delete() {
        let api = Arc::new(MockApi::default().with_page("A", None, page(&["i1"], Some("T2"), None)));
        let c = signed_in_controller(api.clone()).await;
        c.spawn_page_fetcher();
        c.model.set_playlists(vec![playlist("A", "Mix", 2)]).await;

        press(&c, KeyCode::Enter).await;
        settle().await;
        assert_eq!(c.model.get_ui_state().await.active_section, ActiveSection::Items);

        press(&c, KeyCode::Right).await;
        settle().await;
        press(&c, KeyCode::Char('D')).await;
        press(&c, KeyCode::Char('y')).await;

        let calls = api.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[1],
            ApiCall::ListItems {
                playlist_id: "A".into(),
                page_token: Some("T2".into())
            }
        );
        assert_eq!(calls[2], ApiCall::DeletePlaylist("A".into()));
    }

    #[tokio::test]
    async fn prompt_captures_typed_title() {
        let api = Arc::new(MockApi::default());
        let c = signed_in_controller(api.clone()).await;

        press(&c, KeyCode::Char('c')).await;
        for ch in "qx".chars() {
            press(&c, KeyCode::Char(ch)).await;
        }
        press(&c, KeyCode::Backspace).await;
        press(&c, KeyCode::Enter).await;

        assert!(!c.model.should_quit().await);
        assert_eq!(
            api.calls(),
            vec![ApiCall::InsertPlaylist {
                title: "q".into(),
                description: String::new(),
                tags: vec![],
            }]
        );
    }
}
