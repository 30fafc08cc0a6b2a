//! Contracts for the view-side collaborators this crate drives.

use std::collections::HashMap;

use shared::error::ValidationCode;

pub mod keys {
    pub const ERROR: &str = "error";
    pub const SENDING_MESSAGE: &str = "sending_message";
    pub const MESSAGE_SUBMIT_FAILED: &str = "error_message_submit_failed";
    pub const MESSAGE_SENT: &str = "message_sent_successfully";
    pub const MESSAGE_SENT_DESCRIPTION: &str = "message_sent_successfully_description";
    pub const FILE_NOT_FOUND: &str = "error_file_not_found";
    pub const LOADING_RESUME: &str = "loading_resume";
    pub const DOWNLOAD_RESUME: &str = "download_resume";
}

/// Localized string lookup keyed by opaque identifiers.
pub trait StringLookup: Send + Sync {
    fn get(&self, key: &str) -> String;
}

pub trait BusyIndicator: Send + Sync {
    fn set_busy(&self, visible: bool, scope_id: &str, message: Option<&str>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str, severity: Severity);
}

pub trait Navigation: Send + Sync {
    fn scroll_to_top(&self);
}

pub trait Viewport: Send + Sync {
    /// Items per row for the named breakpoint configuration, if one applies.
    fn items_per_row(&self, breakpoints: &str) -> Option<usize>;
}

/// The view hosting a form; only its title region is controlled from here.
pub trait HostView: Send + Sync {
    fn set_title_hidden(&self, hidden: bool);
}

/// In-memory string table. Unknown keys resolve to the key itself.
#[derive(Debug, Clone, Default)]
pub struct StaticStrings {
    entries: HashMap<String, String>,
}

impl StaticStrings {
    pub fn english() -> Self {
        let entries = [
            (keys::ERROR, "Error"),
            (keys::SENDING_MESSAGE, "Sending message..."),
            (
                keys::MESSAGE_SUBMIT_FAILED,
                "Your message could not be sent. Please try again later.",
            ),
            (keys::MESSAGE_SENT, "Message sent successfully!"),
            (
                keys::MESSAGE_SENT_DESCRIPTION,
                "Thanks for reaching out. I will reply to {email} as soon as possible.",
            ),
            (
                ValidationCode::RequiredFields.message_key(),
                "Please fill in every field. {x}",
            ),
            (
                ValidationCode::InvalidEmail.message_key(),
                "Invalid email address. {x}",
            ),
            (keys::FILE_NOT_FOUND, "The requested file could not be found."),
            (keys::LOADING_RESUME, "Loading resume..."),
            (keys::DOWNLOAD_RESUME, "Download resume"),
        ];
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }
}

impl StringLookup for StaticStrings {
    fn get(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
