//! Model module - Application state and data types
//!
//! - `types`: sections, session, dialogs and UI state
//! - `page`: resident playlist page and pagination controls
//! - `app_model`: the state container and its setters

mod app_model;
mod page;
mod types;

pub use types::{ActiveSection, ConfirmAction, Prompt, PromptKind, Session, UiState};

pub use page::{PageQuery, PageState, PaginationControls};

pub use app_model::{AppModel, ViewState};
