//! Playlist page state for the detail view

use crate::youtube::PlaylistItemListResponse;

/// The inputs of one items fetch, tagged with the generation it was issued at
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageQuery {
    pub playlist_id: String,
    pub page_token: Option<String>,
    pub generation: u64,
}

/// Resident page of the selected playlist
#[derive(Clone, Debug, Default)]
pub struct PageState {
    pub page_token: Option<String>,
    pub page: Option<PlaylistItemListResponse>,
    /// Bumped on every new query; responses from older generations are dropped
    pub generation: u64,
    pub is_loading: bool,
}

impl PageState {
    /// Controls are disabled while a fetch is outstanding
    pub fn pagination(&self) -> PaginationControls {
        if self.is_loading {
            return PaginationControls::default();
        }
        PaginationControls::from_page(self.page.as_ref())
    }
}

/// Prev/Next targets taken from the most recent response
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationControls {
    pub prev_token: Option<String>,
    pub next_token: Option<String>,
}

impl PaginationControls {
    pub fn from_page(page: Option<&PlaylistItemListResponse>) -> Self {
        Self {
            prev_token: page.and_then(|p| p.prev_page_token.clone()),
            next_token: page.and_then(|p| p.next_page_token.clone()),
        }
    }

    pub fn prev_enabled(&self) -> bool {
        self.prev_token.is_some()
    }

    pub fn next_enabled(&self) -> bool {
        self.next_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controls_disabled_without_tokens() {
        let controls = PaginationControls::from_page(None);
        assert!(!controls.prev_enabled());
        assert!(!controls.next_enabled());

        let page = PlaylistItemListResponse {
            next_page_token: Some("T2".into()),
            ..Default::default()
        };
        let controls = PaginationControls::from_page(Some(&page));
        assert!(!controls.prev_enabled());
        assert!(controls.next_enabled());
    }
}
