//! Sign-in status handling: the root view's loading / signed-out / signed-in switch

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::AppController;
use crate::auth::UserHandle;
use crate::model::Session;

impl AppController {
    /// Apply every delivered status to the session.
    ///
    /// A one-shot re-check reads the current status after `recheck_after`
    /// unless a normal delivery arrives first.
    pub fn spawn_session_watcher(
        &self,
        mut status: watch::Receiver<UserHandle>,
        recheck_after: Duration,
    ) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move {
            let recheck = tokio::time::sleep(recheck_after);
            tokio::pin!(recheck);
            let mut recheck_pending = true;

            loop {
                tokio::select! {
                    changed = status.changed() => {
                        if changed.is_err() {
                            tracing::debug!("Sign-in status channel closed");
                            break;
                        }
                        if recheck_pending {
                            tracing::debug!("Sign-in status delivered, cancelling re-check");
                            recheck_pending = false;
                        }
                        let user = status.borrow_and_update().clone();
                        controller.apply_user(&user).await;
                    }
                    _ = &mut recheck, if recheck_pending => {
                        recheck_pending = false;
                        let user = status.borrow().clone();
                        tracing::debug!(signed_in = user.is_signed_in(), "Re-checking sign-in status");
                        controller.apply_user(&user).await;
                    }
                }
            }
        })
    }

    pub(crate) async fn apply_user(&self, user: &UserHandle) {
        let session = Session::from_user(user);
        let signed_in = session.is_signed_in();
        let previous = self.model.set_session(session).await;

        if signed_in && !previous.is_signed_in() {
            tracing::info!("User signed in");
            self.model.set_sign_in_url(None).await;
            // The detail view starts over from the first page, as on first selection
            if let Some(playlist) = self.model.selected_playlist().await {
                self.model.select_playlist(playlist).await;
            }
            let controller = self.clone();
            tokio::spawn(async move {
                controller.mount_playlists().await;
            });
        } else if !signed_in && previous.is_signed_in() {
            tracing::info!("User signed out");
        }
    }

    pub async fn sign_in(&self) {
        if self.auth.current_user().is_signed_in() || self.model.get_ui_state().await.sign_in_url.is_some() {
            return;
        }

        let request = match self.auth.begin_sign_in().await {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "Could not start sign-in");
                self.model.set_error(format!("Sign-in failed: {}", e)).await;
                return;
            }
        };

        tracing::info!("Waiting for browser sign-in");
        if let Err(e) = (self.browser)(&request.url) {
            tracing::warn!(error = %e, "Could not open a browser, showing the sign-in URL instead");
        }
        self.model.set_sign_in_url(Some(request.url.clone())).await;

        let controller = self.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = controller.auth.complete_sign_in(request).await {
                tracing::error!(error = %e, "Sign-in failed");
                controller.model.set_sign_in_url(None).await;
                controller.model.set_error(format!("Sign-in failed: {}", e)).await;
            }
        });
        *self.sign_in_task.lock().await = Some(task);
    }

    /// Abandon a pending browser sign-in, releasing the redirect listener
    pub async fn cancel_sign_in(&self) {
        let pending = self.sign_in_task.lock().await.take();
        if let Some(task) = pending {
            task.abort();
            // Wait for the task to be dropped so the listener port is free again
            let _ = task.await;
            tracing::info!("Browser sign-in cancelled");
        }
        self.model.set_sign_in_url(None).await;
    }

    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::controller::test_support::{controller, page, playlist, settle, ApiCall, MockApi};

    const RECHECK: Duration = Duration::from_secs(10);

    fn signed_in() -> UserHandle {
        UserHandle::signed_in(chrono::Utc::now() + chrono::Duration::hours(1))
    }

    #[tokio::test(start_paused = true)]
    async fn session_tracks_delivered_status() {
        let api = Arc::new(MockApi::default());
        let c = controller(api.clone());
        let (tx, rx) = watch::channel(UserHandle::signed_out());
        c.spawn_session_watcher(rx, RECHECK);

        assert_eq!(c.model.session().await, Session::Unknown);

        tx.send_replace(UserHandle::signed_out());
        settle().await;
        assert_eq!(c.model.session().await, Session::SignedOut);

        tx.send_replace(signed_in());
        settle().await;
        assert!(c.model.session().await.is_signed_in());

        tx.send_replace(UserHandle::signed_out());
        settle().await;
        assert_eq!(c.model.session().await, Session::SignedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn recheck_applies_status_after_delay() {
        let c = controller(Arc::new(MockApi::default()));
        let (_tx, rx) = watch::channel(UserHandle::signed_out());
        c.spawn_session_watcher(rx, RECHECK);

        tokio::time::sleep(Duration::from_secs(9)).await;
        settle().await;
        assert_eq!(c.model.session().await, Session::Unknown);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(c.model.session().await, Session::SignedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn delivery_cancels_recheck() {
        let c = controller(Arc::new(MockApi::default()));
        let (tx, rx) = watch::channel(UserHandle::signed_out());
        c.spawn_session_watcher(rx, RECHECK);

        tx.send_replace(signed_in());
        settle().await;
        assert!(c.model.session().await.is_signed_in());

        // A pending re-check would overwrite this with the channel's value
        c.model.set_session(Session::Unknown).await;
        tokio::time::sleep(Duration::from_secs(11)).await;
        settle().await;
        assert_eq!(c.model.session().await, Session::Unknown);
    }

    #[tokio::test(start_paused = true)]
    async fn signing_in_again_refetches_selected_playlist_from_first_page() {
        let api = Arc::new(
            MockApi::default()
                .with_page("A", None, page(&["i1"], Some("T2"), None))
                .with_page("A", Some("T2"), page(&["i2"], None, Some("T1"))),
        );
        let c = controller(api.clone());
        let (tx, rx) = watch::channel(UserHandle::signed_out());
        c.spawn_session_watcher(rx, RECHECK);
        c.spawn_page_fetcher();

        tx.send_replace(signed_in());
        settle().await;
        c.select_playlist(playlist("A", "Mix", 2)).await;
        settle().await;
        c.next_page().await;
        settle().await;
        assert_eq!(c.model.page_token().await.as_deref(), Some("T2"));

        tx.send_replace(UserHandle::signed_out());
        settle().await;
        tx.send_replace(signed_in());
        settle().await;

        let list_items: Vec<_> = api
            .calls()
            .into_iter()
            .filter(|call| matches!(call, ApiCall::ListItems { .. }))
            .collect();
        assert_eq!(list_items.len(), 3);
        assert_eq!(
            list_items[2],
            ApiCall::ListItems {
                playlist_id: "A".into(),
                page_token: None
            }
        );
        assert_eq!(c.model.page_token().await, None);
        assert_eq!(c.model.page().await.unwrap().items()[0].id, "i1");
    }

    #[tokio::test(start_paused = true)]
    async fn playlists_mount_once_per_sign_in() {
        let api = Arc::new(MockApi::default());
        let c = controller(api.clone());
        let (tx, rx) = watch::channel(UserHandle::signed_out());
        c.spawn_session_watcher(rx, RECHECK);

        tx.send_replace(signed_in());
        settle().await;
        tx.send_replace(signed_in());
        settle().await;
        assert_eq!(api.calls(), vec![ApiCall::ListPlaylists(None)]);

        tx.send_replace(UserHandle::signed_out());
        settle().await;
        tx.send_replace(signed_in());
        settle().await;
        assert_eq!(api.calls().len(), 2);
    }
}
