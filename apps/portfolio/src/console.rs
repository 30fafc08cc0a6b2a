use client_core::ui::{BusyIndicator, HostView, Navigation, Notifier, Severity, Viewport};
use tracing::debug;

/// Terminal stand-in for the browser-side collaborators.
pub struct ConsoleUi {
    columns: usize,
}

impl ConsoleUi {
    pub fn new() -> Self {
        let columns = std::env::var("COLUMNS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(80);
        Self { columns }
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl BusyIndicator for ConsoleUi {
    fn set_busy(&self, visible: bool, scope_id: &str, message: Option<&str>) {
        if visible {
            eprintln!("{}", message.unwrap_or("..."));
        }
        debug!(visible, scope_id, "busy indicator");
    }
}

impl Notifier for ConsoleUi {
    fn notify(&self, title: &str, body: &str, severity: Severity) {
        let tag = match severity {
            Severity::Info => "info",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {title}: {body}");
    }
}

impl Navigation for ConsoleUi {
    fn scroll_to_top(&self) {}
}

impl HostView for ConsoleUi {
    fn set_title_hidden(&self, hidden: bool) {
        debug!(hidden, "contact title visibility");
    }
}

impl Viewport for ConsoleUi {
    fn items_per_row(&self, _breakpoints: &str) -> Option<usize> {
        Some(match self.columns {
            0..=79 => 1,
            80..=139 => 2,
            _ => 3,
        })
    }
}
