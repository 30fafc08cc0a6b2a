use std::{fs, path::Path, time::Duration};

use client_core::contact_form::{ContactFormOptions, DEFAULT_FORM_ID, DEFAULT_VALIDATION_DELAY};
use serde::Deserialize;
use toml::{Table, Value};
use tracing::warn;

pub const SETTINGS_FILE: &str = "portfolio.toml";
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub cms_base_url: String,
    pub media_host: String,
    pub site_base_url: String,
    pub session_database_url: String,
    pub session_id: String,
    pub contact_form_id: String,
    pub validation_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cms_base_url: "https://refined-peace-3dcd962811.strapiapp.com/api".into(),
            media_host: "https://refined-peace-3dcd962811.media.strapiapp.com".into(),
            site_base_url: "/".into(),
            session_database_url: "sqlite://./data/session.db".into(),
            session_id: DEFAULT_SESSION_ID.into(),
            contact_form_id: DEFAULT_FORM_ID.into(),
            validation_delay_ms: DEFAULT_VALIDATION_DELAY.as_millis() as u64,
        }
    }
}

impl Settings {
    pub fn contact_form_options(&self) -> ContactFormOptions {
        ContactFormOptions {
            form_id: self.contact_form_id.clone(),
            scope_id: self.contact_form_id.clone(),
            validation_delay: Duration::from_millis(self.validation_delay_ms),
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// File values override the defaults; environment values override both.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match raw.parse::<Table>() {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "ignoring unparsable settings file"
            ),
        }
    }

    if let Some(v) = env("CMS_BASE_URL") {
        settings.cms_base_url = v;
    }
    if let Some(v) = env("APP__CMS_BASE_URL") {
        settings.cms_base_url = v;
    }

    if let Some(v) = env("MEDIA_HOST") {
        settings.media_host = v;
    }
    if let Some(v) = env("SITE_BASE_URL") {
        settings.site_base_url = v;
    }

    if let Some(v) = env("SESSION_DATABASE_URL") {
        settings.session_database_url = v;
    }
    if let Some(v) = env("SESSION_ID").filter(|v| !v.trim().is_empty()) {
        settings.session_id = v;
    }

    if let Some(v) = env("APP__CONTACT_FORM_ID") {
        settings.contact_form_id = v;
    }
    if let Some(v) = env("APP__VALIDATION_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.validation_delay_ms = parsed;
        }
    }

    settings.session_database_url = normalize_database_url(&settings.session_database_url);
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &Table) {
    let text = |key: &str| match file_cfg.get(key) {
        Some(Value::String(v)) => Some(v.clone()),
        Some(other) => {
            warn!(key, value = %other, "expected a string in settings file");
            None
        }
        None => None,
    };

    if let Some(v) = text("cms_base_url") {
        settings.cms_base_url = v;
    }
    if let Some(v) = text("media_host") {
        settings.media_host = v;
    }
    if let Some(v) = text("site_base_url") {
        settings.site_base_url = v;
    }
    if let Some(v) = text("session_database_url") {
        settings.session_database_url = v;
    }
    if let Some(v) = text("session_id").filter(|v| !v.trim().is_empty()) {
        settings.session_id = v;
    }
    if let Some(v) = text("contact_form_id") {
        settings.contact_form_id = v;
    }

    if let Some(raw) = file_cfg.get("validation_delay_ms") {
        let parsed = match raw {
            Value::Integer(ms) => u64::try_from(*ms).ok(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        };
        match parsed {
            Some(ms) => settings.validation_delay_ms = ms,
            None => warn!(value = %raw, "invalid validation_delay_ms in settings file"),
        }
    }
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().session_database_url;
    }

    if raw_database_url.starts_with("sqlite:") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
