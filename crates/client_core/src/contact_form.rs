//! Contact form submission state machine.
//!
//! `Idle -> Submitting -> Submitted`, and `Submitted -> Idle` on reset. The
//! terminal `Submitted` state is mirrored into the session store so a reload
//! within the same session shows the success view again.

use std::{sync::Arc, time::Duration};

use once_cell::sync::Lazy;
use regex::Regex;
use shared::{
    error::{ValidationCode, ValidationError},
    protocol::ContactFields,
};
use storage::SessionStore;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    gateway::ContactSubmitter,
    ui::{keys, BusyIndicator, HostView, Navigation, Notifier, Severity, StringLookup},
};

pub const DEFAULT_FORM_ID: &str = "contact-form";
pub const DEFAULT_VALIDATION_DELAY: Duration = Duration::from_millis(300);
const EMAIL_PLACEHOLDER: &str = "your email";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Submitted,
}

impl SubmissionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "waiting-for-submission",
            Self::Submitting => "submitting",
            Self::Submitted => "submitted",
        }
    }

    pub fn from_stored(raw: &str) -> Option<Self> {
        match raw {
            "waiting-for-submission" => Some(Self::Idle),
            "submitting" => Some(Self::Submitting),
            "submitted" => Some(Self::Submitted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form was not idle; nothing happened.
    Ignored,
    Rejected(ValidationError),
    Submitted,
    Failed(String),
}

/// Checks the fields in order and returns their trimmed values.
pub fn validate(fields: &ContactFields) -> Result<ContactFields, ValidationError> {
    if !fields.all_present() {
        return Err(ValidationError::new(ValidationCode::RequiredFields));
    }
    let trimmed = fields.trimmed();
    if !EMAIL_PATTERN.is_match(&trimmed.email) {
        return Err(ValidationError::new(ValidationCode::InvalidEmail));
    }
    Ok(trimmed)
}

#[derive(Debug, Clone)]
pub struct ContactFormOptions {
    pub form_id: String,
    /// Scope passed to the busy indicator.
    pub scope_id: String,
    /// Minimum time a validation failure keeps the busy indicator up.
    pub validation_delay: Duration,
}

impl Default for ContactFormOptions {
    fn default() -> Self {
        Self {
            form_id: DEFAULT_FORM_ID.into(),
            scope_id: DEFAULT_FORM_ID.into(),
            validation_delay: DEFAULT_VALIDATION_DELAY,
        }
    }
}

impl ContactFormOptions {
    fn status_key(&self) -> String {
        self.form_id.clone()
    }

    fn email_key(&self) -> String {
        format!("{}-email", self.form_id)
    }
}

#[derive(Clone)]
pub struct FormCollaborators {
    pub gateway: Arc<dyn ContactSubmitter>,
    pub store: Arc<dyn SessionStore>,
    pub strings: Arc<dyn StringLookup>,
    pub busy: Arc<dyn BusyIndicator>,
    pub notifier: Arc<dyn Notifier>,
    pub navigation: Arc<dyn Navigation>,
    pub host: Arc<dyn HostView>,
}

#[derive(Debug, Default)]
struct FormState {
    status: SubmissionState,
    fields: ContactFields,
    validation_error: Option<ValidationError>,
    submitted_email: Option<String>,
    /// Bumped whenever validation passes or the form resets. A pending
    /// rejection only lands if it is unchanged.
    generation: u64,
}

pub struct ContactFormController {
    options: ContactFormOptions,
    deps: FormCollaborators,
    inner: Mutex<FormState>,
}

impl ContactFormController {
    /// Builds the controller, re-entering `Submitted` when the session store
    /// says the form was already sent in this session.
    pub async fn restore(options: ContactFormOptions, deps: FormCollaborators) -> Self {
        let stored_status = read_key(deps.store.as_ref(), &options.status_key()).await;
        let status = match stored_status.as_deref().and_then(SubmissionState::from_stored) {
            Some(SubmissionState::Submitted) => SubmissionState::Submitted,
            _ => SubmissionState::Idle,
        };

        let submitted_email = if status == SubmissionState::Submitted {
            read_key(deps.store.as_ref(), &options.email_key()).await
        } else {
            None
        };

        if status == SubmissionState::Submitted {
            info!(form_id = %options.form_id, "restored submitted contact form from session");
            deps.host.set_title_hidden(true);
        }

        Self {
            options,
            deps,
            inner: Mutex::new(FormState {
                status,
                submitted_email,
                ..FormState::default()
            }),
        }
    }

    pub async fn status(&self) -> SubmissionState {
        self.inner.lock().await.status
    }

    pub async fn fields(&self) -> ContactFields {
        self.inner.lock().await.fields.clone()
    }

    /// Replaces the field bundle. Ignored unless the form is idle, since the
    /// inputs are disabled in every other state.
    pub async fn set_fields(&self, fields: ContactFields) {
        let mut inner = self.inner.lock().await;
        if inner.status == SubmissionState::Idle {
            inner.fields = fields;
        }
    }

    pub async fn validation_error(&self) -> Option<ValidationError> {
        self.inner.lock().await.validation_error.clone()
    }

    pub async fn submitted_email(&self) -> Option<String> {
        self.inner.lock().await.submitted_email.clone()
    }

    pub async fn error_message(&self) -> Option<String> {
        let error = self.validation_error().await?;
        Some(
            self.deps
                .strings
                .get(error.code.message_key())
                .replace("{x}", &error.detail),
        )
    }

    pub async fn success_message(&self) -> Option<String> {
        let inner = self.inner.lock().await;
        if inner.status != SubmissionState::Submitted {
            return None;
        }
        let email = inner
            .submitted_email
            .as_deref()
            .filter(|email| !email.is_empty())
            .unwrap_or(EMAIL_PLACEHOLDER);
        Some(
            self.deps
                .strings
                .get(keys::MESSAGE_SENT_DESCRIPTION)
                .replace("{email}", email),
        )
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let (checked, generation) = {
            let mut inner = self.inner.lock().await;
            if inner.status != SubmissionState::Idle {
                debug!(status = inner.status.as_str(), "submit ignored");
                return SubmitOutcome::Ignored;
            }
            let checked = validate(&inner.fields);
            if checked.is_ok() {
                inner.validation_error = None;
                inner.status = SubmissionState::Submitting;
                inner.generation += 1;
            }
            (checked, inner.generation)
        };

        self.deps.navigation.scroll_to_top();

        let fields = match checked {
            Ok(fields) => fields,
            Err(error) => return self.reject(error, generation).await,
        };

        debug!(form_id = %self.options.form_id, "contact form submitting");
        self.show_busy();
        let response = self.deps.gateway.submit(&fields).await;
        self.hide_busy();

        match response {
            Ok(envelope) if envelope.success => {
                self.complete(fields.email).await;
                SubmitOutcome::Submitted
            }
            Ok(envelope) => {
                let reason = envelope
                    .error
                    .unwrap_or_else(|| "submission rejected".to_string());
                self.fail(reason).await
            }
            Err(error) => self.fail(error.to_string()).await,
        }
    }

    /// Returns to `Idle` from `Submitted`. Any other state is left alone.
    pub async fn reset(&self) -> bool {
        if self.status().await != SubmissionState::Submitted {
            return false;
        }

        self.remove_key(&self.options.status_key()).await;
        self.remove_key(&self.options.email_key()).await;

        {
            let mut inner = self.inner.lock().await;
            *inner = FormState {
                status: SubmissionState::Idle,
                generation: inner.generation + 1,
                ..FormState::default()
            };
        }

        debug!(form_id = %self.options.form_id, "contact form reset");
        self.deps.host.set_title_hidden(false);
        true
    }

    async fn reject(&self, error: ValidationError, generation: u64) -> SubmitOutcome {
        debug!(code = ?error.code, "contact form validation failed");
        self.show_busy();
        tokio::time::sleep(self.options.validation_delay).await;

        let current = {
            let mut inner = self.inner.lock().await;
            let current =
                inner.status == SubmissionState::Idle && inner.generation == generation;
            if current {
                inner.validation_error = Some(error.clone());
            }
            current
        };
        if current {
            self.hide_busy();
        } else {
            debug!(code = ?error.code, "validation result superseded");
        }
        SubmitOutcome::Rejected(error)
    }

    async fn complete(&self, email: String) {
        self.write_key(
            &self.options.status_key(),
            SubmissionState::Submitted.as_str(),
        )
        .await;
        self.write_key(&self.options.email_key(), &email).await;

        {
            let mut inner = self.inner.lock().await;
            inner.status = SubmissionState::Submitted;
            inner.submitted_email = Some(email);
        }

        info!(form_id = %self.options.form_id, "contact message submitted");
        self.deps.host.set_title_hidden(true);
    }

    async fn fail(&self, reason: String) -> SubmitOutcome {
        self.inner.lock().await.status = SubmissionState::Idle;
        warn!(form_id = %self.options.form_id, %reason, "contact message submission failed");
        self.deps.notifier.notify(
            &self.deps.strings.get(keys::ERROR),
            &self.deps.strings.get(keys::MESSAGE_SUBMIT_FAILED),
            Severity::Error,
        );
        SubmitOutcome::Failed(reason)
    }

    fn show_busy(&self) {
        let message = self.deps.strings.get(keys::SENDING_MESSAGE);
        self.deps
            .busy
            .set_busy(true, &self.options.scope_id, Some(&message));
    }

    fn hide_busy(&self) {
        self.deps.busy.set_busy(false, &self.options.scope_id, None);
    }

    async fn write_key(&self, key: &str, value: &str) {
        if let Err(error) = self.deps.store.set(key, value).await {
            warn!(key, %error, "failed to persist contact form state");
        }
    }

    async fn remove_key(&self, key: &str) {
        if let Err(error) = self.deps.store.remove(key).await {
            warn!(key, %error, "failed to clear contact form state");
        }
    }
}

async fn read_key(store: &dyn SessionStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(error) => {
            warn!(key, %error, "failed to read contact form state");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/contact_form_tests.rs"]
mod tests;
