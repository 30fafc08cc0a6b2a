use serde_json::Value;
use shared::protocol::Envelope;
use tracing::warn;
use url::Url;

use crate::{
    gateway::{CmsGateway, RequestOptions},
    ui::{keys, Notifier, Severity, StringLookup},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeAction {
    /// The résumé record is still loading.
    Pending,
    /// The record has no file URL.
    Missing,
    Download(String),
}

/// Resolves a file path against the site base URL. Absolute and
/// protocol-relative URLs are returned as-is.
pub fn resolve_path(path: &str, site_base_url: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//") {
        return path.to_string();
    }

    match Url::parse(site_base_url).and_then(|base| base.join(path)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) if path.starts_with('/') => path.to_string(),
        Err(_) => {
            if site_base_url.ends_with('/') {
                format!("{site_base_url}{path}")
            } else {
                format!("{site_base_url}/{path}")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResumeDownloader {
    site_base_url: String,
    loading: bool,
    record: Option<Value>,
}

impl ResumeDownloader {
    pub fn new(site_base_url: impl Into<String>) -> Self {
        Self {
            site_base_url: site_base_url.into(),
            loading: false,
            record: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Stores the fetched record. A failed fetch leaves no record behind.
    pub fn finish_loading(&mut self, envelope: Envelope<Option<Value>>) {
        self.loading = false;
        if envelope.success {
            self.record = envelope.data;
        } else {
            warn!(error = ?envelope.error, "error loading resume");
        }
    }

    pub async fn load(&mut self, gateway: &CmsGateway, options: &RequestOptions) {
        self.begin_loading();
        let envelope = gateway.fetch_resume(options).await;
        self.finish_loading(envelope);
    }

    pub fn file_url(&self) -> Option<&str> {
        self.record
            .as_ref()?
            .get("my_cv")?
            .get("url")?
            .as_str()
            .filter(|url| !url.is_empty())
    }

    pub fn click(&self) -> ResumeAction {
        if self.loading {
            return ResumeAction::Pending;
        }
        match self.file_url() {
            Some(url) => ResumeAction::Download(resolve_path(url, &self.site_base_url)),
            None => ResumeAction::Missing,
        }
    }

    /// Like [`click`](Self::click), reporting the non-download outcomes
    /// through the notifier.
    pub fn click_with_feedback(
        &self,
        notifier: &dyn Notifier,
        strings: &dyn StringLookup,
    ) -> ResumeAction {
        let action = self.click();
        match &action {
            ResumeAction::Pending => notifier.notify(
                &strings.get(keys::ERROR),
                &strings.get(keys::LOADING_RESUME),
                Severity::Info,
            ),
            ResumeAction::Missing => notifier.notify(
                &strings.get(keys::ERROR),
                &strings.get(keys::FILE_NOT_FOUND),
                Severity::Error,
            ),
            ResumeAction::Download(_) => {}
        }
        action
    }
}

#[cfg(test)]
#[path = "tests/resume_tests.rs"]
mod tests;
