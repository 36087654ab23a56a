//! Controller module - Application logic and event handling
//!
//! - `input`: Key event handling
//! - `session`: Sign-in status watcher, sign in / sign out
//! - `playlists`: Playlist list view (mount, select, create)
//! - `items`: Playlist detail view (page fetcher, pagination, deletion)

mod input;
mod items;
mod playlists;
mod session;

use std::io;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::auth::AuthClient;
use crate::error::ApiError;
use crate::model::AppModel;
use crate::youtube::PlaylistApi;

/// Opens a URL in the user's browser
pub type BrowserLauncher = fn(&str) -> io::Result<()>;

fn open_in_browser(url: &str) -> io::Result<()> {
    open::that_detached(url)
}

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<AppModel>,
    pub(crate) api: Arc<dyn PlaylistApi>,
    pub(crate) auth: Arc<AuthClient>,
    /// Pending browser sign-in, aborted on cancel
    pub(crate) sign_in_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    pub(crate) browser: BrowserLauncher,
}

impl AppController {
    pub fn new(model: Arc<AppModel>, api: Arc<dyn PlaylistApi>, auth: Arc<AuthClient>) -> Self {
        Self {
            model,
            api,
            auth,
            sign_in_task: Arc::new(Mutex::new(None)),
            browser: open_in_browser,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_browser(mut self, browser: BrowserLauncher) -> Self {
        self.browser = browser;
        self
    }

    pub(crate) fn format_error(error: &ApiError) -> String {
        match error.status() {
            Some(401) => "Authentication expired. Please sign in again.".to_string(),
            Some(403) => "Action forbidden. Check account permissions or API quota.".to_string(),
            Some(404) => "Not found. It may already have been deleted.".to_string(),
            Some(429) => "Rate limited. Please wait a moment.".to_string(),
            _ => match error {
                ApiError::NotSignedIn => "Not signed in.".to_string(),
                _ => format!("Error: {}", error),
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes_to_messages() {
        let status = |status| ApiError::Status {
            operation: "playlists.list",
            status,
            body: String::new(),
        };
        assert!(AppController::format_error(&status(401)).contains("sign in again"));
        assert!(AppController::format_error(&status(429)).contains("Rate limited"));
        assert_eq!(
            AppController::format_error(&status(500)),
            "Error: playlists.list returned HTTP 500: "
        );
        assert_eq!(AppController::format_error(&ApiError::NotSignedIn), "Not signed in.");
    }
}
