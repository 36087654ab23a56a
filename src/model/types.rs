//! Core type definitions for the application

use std::time::Instant;

use crate::auth::UserHandle;

/// Which pane of the signed-in shell has focus
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ActiveSection {
    #[default]
    Playlists,
    Items,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Playlists => ActiveSection::Items,
            ActiveSection::Items => ActiveSection::Playlists,
        }
    }

    pub fn prev(self) -> Self {
        // Two sections, so both directions toggle
        self.next()
    }
}

/// What the application believes about the user's authentication
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Session {
    #[default]
    Unknown,
    SignedOut,
    SignedIn(UserHandle),
}

impl Session {
    /// Signed-in iff the delivered handle says so at delivery time
    pub fn from_user(user: &UserHandle) -> Self {
        if user.is_signed_in() {
            Session::SignedIn(user.clone())
        } else {
            Session::SignedOut
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Session::SignedIn(_))
    }
}

/// A destructive action waiting for a yes/no answer
#[derive(Clone, Debug, PartialEq)]
pub enum ConfirmAction {
    DeletePlaylist { id: String, title: String },
    DeletePlaylistItem { id: String, title: String },
}

impl ConfirmAction {
    pub fn question(&self) -> String {
        match self {
            ConfirmAction::DeletePlaylist { title, .. } => format!("Really delete {}", title),
            ConfirmAction::DeletePlaylistItem { title, .. } => {
                format!("Really remove {} from the playlist", title)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PromptKind {
    NewPlaylist,
    AddVideo { playlist_id: String },
}

impl PromptKind {
    pub fn label(&self) -> &'static str {
        match self {
            PromptKind::NewPlaylist => " New playlist title ",
            PromptKind::AddVideo { .. } => " Video id to add ",
        }
    }
}

/// Single-line text input overlay
#[derive(Clone, Debug, PartialEq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

/// UI state for the application
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub active_section: ActiveSection,
    pub playlist_cursor: usize,
    pub item_cursor: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub status_message: Option<String>,
    pub confirm: Option<ConfirmAction>,
    pub prompt: Option<Prompt>,
    pub show_help_popup: bool,
    pub sign_in_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_follows_signed_in_predicate() {
        let signed_in = UserHandle::signed_in(chrono::Utc::now());
        assert!(Session::from_user(&signed_in).is_signed_in());
        assert_eq!(Session::from_user(&UserHandle::signed_out()), Session::SignedOut);
    }

    #[test]
    fn delete_question_names_the_playlist() {
        let action = ConfirmAction::DeletePlaylist {
            id: "A".into(),
            title: "Mix".into(),
        };
        assert_eq!(action.question(), "Really delete Mix");
    }
}
