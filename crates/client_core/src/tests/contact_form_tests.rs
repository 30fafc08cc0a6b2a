use super::*;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    },
    time::Instant,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use shared::protocol::Envelope;
use storage::MemorySessionStore;
use tokio::sync::Notify;

use crate::ui::StaticStrings;

#[derive(Clone, Copy)]
enum Reply {
    Accept,
    Reject,
    Error,
}

struct FakeSubmitter {
    reply: Reply,
    calls: AtomicUsize,
    received: StdMutex<Vec<ContactFields>>,
    gate: Option<Arc<Notify>>,
}

impl FakeSubmitter {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            received: StdMutex::new(Vec::new()),
            gate: None,
        }
    }

    fn gated(reply: Reply, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(reply)
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContactSubmitter for FakeSubmitter {
    async fn submit(&self, fields: &ContactFields) -> Result<Envelope<Option<Value>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().expect("lock").push(fields.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.reply {
            Reply::Accept => Ok(Envelope::ok(Some(json!({ "id": 1 })), Map::new())),
            Reply::Reject => Ok(Envelope::failure("HTTP error! status: 400", None)),
            Reply::Error => Err(anyhow!("connection reset")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum UiCall {
    Busy(bool),
    Notify(String, String, Severity),
    ScrollTop,
    TitleHidden(bool),
}

#[derive(Default)]
struct RecordingUi {
    calls: StdMutex<Vec<UiCall>>,
}

impl RecordingUi {
    fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().expect("lock").clone()
    }

    fn record(&self, call: UiCall) {
        self.calls.lock().expect("lock").push(call);
    }

    fn notifications(&self) -> Vec<UiCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, UiCall::Notify(..)))
            .collect()
    }
}

impl BusyIndicator for RecordingUi {
    fn set_busy(&self, visible: bool, _scope_id: &str, _message: Option<&str>) {
        self.record(UiCall::Busy(visible));
    }
}

impl Notifier for RecordingUi {
    fn notify(&self, title: &str, body: &str, severity: Severity) {
        self.record(UiCall::Notify(title.into(), body.into(), severity));
    }
}

impl Navigation for RecordingUi {
    fn scroll_to_top(&self) {
        self.record(UiCall::ScrollTop);
    }
}

impl HostView for RecordingUi {
    fn set_title_hidden(&self, hidden: bool) {
        self.record(UiCall::TitleHidden(hidden));
    }
}

struct Harness {
    submitter: Arc<FakeSubmitter>,
    store: Arc<MemorySessionStore>,
    ui: Arc<RecordingUi>,
    options: ContactFormOptions,
}

impl Harness {
    fn new(submitter: FakeSubmitter) -> Self {
        Self::with_store(submitter, Arc::new(MemorySessionStore::new()))
    }

    fn with_store(submitter: FakeSubmitter, store: Arc<MemorySessionStore>) -> Self {
        Self {
            submitter: Arc::new(submitter),
            store,
            ui: Arc::new(RecordingUi::default()),
            options: ContactFormOptions {
                validation_delay: Duration::from_millis(20),
                ..ContactFormOptions::default()
            },
        }
    }

    fn collaborators(&self) -> FormCollaborators {
        FormCollaborators {
            gateway: self.submitter.clone(),
            store: self.store.clone(),
            strings: Arc::new(StaticStrings::english()),
            busy: self.ui.clone(),
            notifier: self.ui.clone(),
            navigation: self.ui.clone(),
            host: self.ui.clone(),
        }
    }

    async fn controller(&self) -> ContactFormController {
        ContactFormController::restore(self.options.clone(), self.collaborators()).await
    }
}

fn valid_fields() -> ContactFields {
    ContactFields::new(" Ada ", " ada@example.test ", "Hello", " A message ")
}

#[test]
fn validate_checks_required_fields_before_email() {
    let missing = ContactFields::new("", "not-an-email", "S", "M");
    assert_eq!(
        validate(&missing).expect_err("missing name").code,
        ValidationCode::RequiredFields
    );

    let blank = ContactFields::new("A", "a@b.co", "   ", "M");
    assert_eq!(
        validate(&blank).expect_err("blank subject").code,
        ValidationCode::RequiredFields
    );

    for email in ["not-an-email", "a@b", "a b@c.d", "@b.co", "a@@b.co"] {
        let fields = ContactFields::new("A", email, "S", "M");
        assert_eq!(
            validate(&fields).expect_err(email).code,
            ValidationCode::InvalidEmail,
            "{email}"
        );
    }

    let trimmed = validate(&valid_fields()).expect("valid");
    assert_eq!(trimmed.email, "ada@example.test");
    assert_eq!(trimmed.message, "A message");
}

#[test]
fn submission_state_round_trips_through_storage_strings() {
    for state in [
        SubmissionState::Idle,
        SubmissionState::Submitting,
        SubmissionState::Submitted,
    ] {
        assert_eq!(SubmissionState::from_stored(state.as_str()), Some(state));
    }
    assert_eq!(SubmissionState::from_stored("bogus"), None);
}

#[tokio::test]
async fn empty_message_is_rejected_after_minimum_delay_without_network() {
    let mut harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    harness.options.validation_delay = DEFAULT_VALIDATION_DELAY;
    let controller = harness.controller().await;
    controller
        .set_fields(ContactFields::new("Ada", "ada@example.test", "Hi", ""))
        .await;

    let started = Instant::now();
    let outcome = controller.submit().await;

    assert!(started.elapsed() >= DEFAULT_VALIDATION_DELAY);
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(ValidationError::new(ValidationCode::RequiredFields))
    );
    assert_eq!(harness.submitter.calls(), 0);
    assert_eq!(controller.status().await, SubmissionState::Idle);
    assert_eq!(
        controller.validation_error().await.map(|error| error.code),
        Some(ValidationCode::RequiredFields)
    );
    assert_eq!(
        harness.ui.calls(),
        vec![UiCall::ScrollTop, UiCall::Busy(true), UiCall::Busy(false)]
    );
}

#[tokio::test]
async fn invalid_email_is_rejected_without_network() {
    let harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    let controller = harness.controller().await;
    controller
        .set_fields(ContactFields::new("A", "not-an-email", "S", "M"))
        .await;

    let outcome = controller.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Rejected(ValidationError::new(ValidationCode::InvalidEmail))
    );
    assert_eq!(harness.submitter.calls(), 0);
    assert!(harness.ui.notifications().is_empty());
    assert!(harness.store.snapshot().await.is_empty());
}

#[tokio::test]
async fn error_message_substitutes_detail() {
    let harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    let controller = harness.controller().await;
    assert_eq!(controller.error_message().await, None);

    controller.submit().await;

    assert_eq!(
        controller.error_message().await.as_deref(),
        Some("Please fill in every field. All fields are required")
    );
}

#[tokio::test]
async fn successful_submit_persists_and_survives_reload() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::new(FakeSubmitter::gated(Reply::Accept, gate.clone()));
    let controller = Arc::new(harness.controller().await);
    controller.set_fields(valid_fields()).await;

    let task = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });

    while harness.submitter.calls() == 0 {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.status().await, SubmissionState::Submitting);
    assert_eq!(controller.submit().await, SubmitOutcome::Ignored);

    gate.notify_one();
    let outcome = task.await.expect("submit task");

    assert_eq!(outcome, SubmitOutcome::Submitted);
    assert_eq!(controller.status().await, SubmissionState::Submitted);
    assert_eq!(harness.submitter.calls(), 1);
    assert_eq!(
        harness.submitter.received.lock().expect("lock")[0],
        ContactFields::new("Ada", "ada@example.test", "Hello", "A message")
    );

    let stored = harness.store.snapshot().await;
    assert_eq!(stored.get("contact-form").map(String::as_str), Some("submitted"));
    assert_eq!(
        stored.get("contact-form-email").map(String::as_str),
        Some("ada@example.test")
    );
    assert_eq!(
        harness.ui.calls(),
        vec![
            UiCall::ScrollTop,
            UiCall::Busy(true),
            UiCall::Busy(false),
            UiCall::TitleHidden(true),
        ]
    );
    assert!(harness.ui.notifications().is_empty());

    let reloaded = Harness::with_store(FakeSubmitter::new(Reply::Accept), harness.store.clone());
    let restored = reloaded.controller().await;
    assert_eq!(restored.status().await, SubmissionState::Submitted);
    assert_eq!(
        restored.submitted_email().await.as_deref(),
        Some("ada@example.test")
    );
    assert_eq!(reloaded.ui.calls(), vec![UiCall::TitleHidden(true)]);
    assert!(restored
        .success_message()
        .await
        .expect("success message")
        .contains("ada@example.test"));
}

#[tokio::test]
async fn rejected_submission_returns_to_idle_and_notifies() {
    let harness = Harness::new(FakeSubmitter::new(Reply::Reject));
    let controller = harness.controller().await;
    controller.set_fields(valid_fields()).await;

    let outcome = controller.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Failed("HTTP error! status: 400".to_string())
    );
    assert_eq!(controller.status().await, SubmissionState::Idle);
    assert_eq!(controller.fields().await, valid_fields());
    assert_eq!(
        harness.ui.notifications(),
        vec![UiCall::Notify(
            "Error".into(),
            "Your message could not be sent. Please try again later.".into(),
            Severity::Error,
        )]
    );
    assert!(harness.store.snapshot().await.is_empty());
    assert!(!harness.ui.calls().contains(&UiCall::TitleHidden(true)));
}

#[tokio::test]
async fn transport_error_is_reported_as_failure() {
    let harness = Harness::new(FakeSubmitter::new(Reply::Error));
    let controller = harness.controller().await;
    controller.set_fields(valid_fields()).await;

    let outcome = controller.submit().await;

    assert_eq!(outcome, SubmitOutcome::Failed("connection reset".to_string()));
    assert_eq!(controller.status().await, SubmissionState::Idle);
    assert_eq!(harness.ui.notifications().len(), 1);
    assert!(harness.store.snapshot().await.is_empty());

    // The form can be retried once idle again.
    controller.submit().await;
    assert_eq!(harness.submitter.calls(), 2);
}

#[tokio::test]
async fn submitted_form_ignores_submit_and_edits() {
    let harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    let controller = harness.controller().await;
    controller.set_fields(valid_fields()).await;
    assert_eq!(controller.submit().await, SubmitOutcome::Submitted);

    controller
        .set_fields(ContactFields::new("Other", "other@example.test", "S", "M"))
        .await;
    assert_eq!(controller.fields().await, valid_fields());
    assert_eq!(controller.submit().await, SubmitOutcome::Ignored);
    assert_eq!(harness.submitter.calls(), 1);
}

#[tokio::test]
async fn reset_clears_session_and_shows_title() {
    let harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    let controller = harness.controller().await;

    assert!(!controller.reset().await);

    controller.set_fields(valid_fields()).await;
    controller.submit().await;
    assert!(controller.reset().await);

    assert_eq!(controller.status().await, SubmissionState::Idle);
    assert_eq!(controller.fields().await, ContactFields::default());
    assert_eq!(controller.submitted_email().await, None);
    assert_eq!(controller.success_message().await, None);
    assert!(harness.store.snapshot().await.is_empty());
    assert_eq!(harness.ui.calls().last(), Some(&UiCall::TitleHidden(false)));

    let reloaded = Harness::with_store(FakeSubmitter::new(Reply::Accept), harness.store.clone());
    assert_eq!(
        reloaded.controller().await.status().await,
        SubmissionState::Idle
    );
}

#[tokio::test]
async fn restore_ignores_non_terminal_stored_status() {
    let store = Arc::new(MemorySessionStore::new());
    store
        .set("contact-form", SubmissionState::Submitting.as_str())
        .await
        .expect("set");
    store
        .set("contact-form-email", "ada@example.test")
        .await
        .expect("set");

    let harness = Harness::with_store(FakeSubmitter::new(Reply::Accept), store);
    let controller = harness.controller().await;

    assert_eq!(controller.status().await, SubmissionState::Idle);
    assert_eq!(controller.submitted_email().await, None);
    assert!(harness.ui.calls().is_empty());
}

#[tokio::test]
async fn success_message_falls_back_to_placeholder() {
    let store = Arc::new(MemorySessionStore::new());
    store
        .set("contact-form", SubmissionState::Submitted.as_str())
        .await
        .expect("set");

    let harness = Harness::with_store(FakeSubmitter::new(Reply::Accept), store);
    let controller = harness.controller().await;

    assert_eq!(
        controller.success_message().await.as_deref(),
        Some("Thanks for reaching out. I will reply to your email as soon as possible.")
    );
}

struct BrokenStore;

#[async_trait]
impl SessionStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(anyhow!("disk unavailable"))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(anyhow!("disk unavailable"))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(anyhow!("disk unavailable"))
    }
}

#[tokio::test]
async fn store_errors_do_not_block_transitions() {
    let harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    let mut deps = harness.collaborators();
    deps.store = Arc::new(BrokenStore);
    let controller = ContactFormController::restore(harness.options.clone(), deps).await;

    assert_eq!(controller.status().await, SubmissionState::Idle);
    controller.set_fields(valid_fields()).await;
    assert_eq!(controller.submit().await, SubmitOutcome::Submitted);
    assert!(controller.reset().await);
    assert_eq!(controller.status().await, SubmissionState::Idle);
}

#[tokio::test]
async fn custom_form_id_scopes_storage_keys() {
    let mut harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    harness.options.form_id = "footer-form".into();
    let controller = harness.controller().await;
    controller.set_fields(valid_fields()).await;
    controller.submit().await;

    let stored = harness.store.snapshot().await;
    assert_eq!(stored.get("footer-form").map(String::as_str), Some("submitted"));
    assert!(stored.contains_key("footer-form-email"));
    assert!(!stored.contains_key("contact-form"));
}

mod against_cms {
    use super::*;
    use axum::{body::Bytes, routing::post, Router};
    use tokio::net::TcpListener;

    use crate::gateway::CmsGateway;

    #[tokio::test]
    async fn submits_through_gateway_and_persists_in_sqlite() {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let received = Arc::new(StdMutex::new(None::<Value>));
        let app = Router::new().route(
            "/contacts",
            post({
                let received = received.clone();
                move |body: Bytes| {
                    let received = received.clone();
                    async move {
                        let parsed: Value = serde_json::from_slice(&body).expect("json body");
                        *received.lock().expect("lock") = Some(parsed);
                        axum::Json(json!({ "data": { "id": 9 }, "meta": {} }))
                    }
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let store = Arc::new(
            storage::SqliteSessionStore::new("sqlite::memory:", "session-1")
                .await
                .expect("store"),
        );
        let ui = Arc::new(RecordingUi::default());
        let deps = FormCollaborators {
            gateway: Arc::new(CmsGateway::new(
                format!("http://{addr}"),
                shared::normalize::Normalizer::new(""),
            )),
            store: store.clone(),
            strings: Arc::new(StaticStrings::english()),
            busy: ui.clone(),
            notifier: ui.clone(),
            navigation: ui.clone(),
            host: ui.clone(),
        };
        let controller = ContactFormController::restore(
            ContactFormOptions {
                validation_delay: Duration::ZERO,
                ..ContactFormOptions::default()
            },
            deps.clone(),
        )
        .await;
        controller.set_fields(valid_fields()).await;

        assert_eq!(controller.submit().await, SubmitOutcome::Submitted);
        assert_eq!(
            received.lock().expect("lock").clone(),
            Some(json!({
                "data": {
                    "name": "Ada",
                    "email": "ada@example.test",
                    "subject": "Hello",
                    "message": "A message"
                }
            }))
        );

        let restored = ContactFormController::restore(ContactFormOptions::default(), deps).await;
        assert_eq!(restored.status().await, SubmissionState::Submitted);
        assert_eq!(
            store.get("contact-form-email").await.expect("get").as_deref(),
            Some("ada@example.test")
        );
    }
}

#[tokio::test]
async fn pending_rejection_does_not_override_later_success() {
    let mut harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    harness.options.validation_delay = Duration::from_millis(200);
    let controller = Arc::new(harness.controller().await);
    controller
        .set_fields(ContactFields::new("A", "not-an-email", "S", "M"))
        .await;

    let rejected = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    controller.set_fields(valid_fields()).await;
    assert_eq!(controller.submit().await, SubmitOutcome::Submitted);
    assert_eq!(
        rejected.await.expect("rejected task"),
        SubmitOutcome::Rejected(ValidationError::new(ValidationCode::InvalidEmail))
    );

    assert_eq!(controller.status().await, SubmissionState::Submitted);
    assert_eq!(controller.validation_error().await, None);
    assert_eq!(controller.error_message().await, None);
    assert_eq!(
        harness.ui.calls(),
        vec![
            UiCall::ScrollTop,
            UiCall::Busy(true),
            UiCall::ScrollTop,
            UiCall::Busy(true),
            UiCall::Busy(false),
            UiCall::TitleHidden(true),
        ]
    );
}

#[tokio::test]
async fn pending_rejection_still_lands_when_form_stays_idle() {
    let mut harness = Harness::new(FakeSubmitter::new(Reply::Accept));
    harness.options.validation_delay = Duration::from_millis(100);
    let controller = Arc::new(harness.controller().await);

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller
        .set_fields(ContactFields::new("A", "not-an-email", "S", "M"))
        .await;
    controller.submit().await;
    first.await.expect("first task");

    assert_eq!(controller.status().await, SubmissionState::Idle);
    assert!(controller.validation_error().await.is_some());
    assert_eq!(harness.submitter.calls(), 0);
}
