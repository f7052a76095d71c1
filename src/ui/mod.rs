//! Terminal UI components.

pub mod error;
pub mod interview;

pub use error::{show_error, ErrorScreen};
pub use interview::{InterviewTui, SessionView, UiAction};
