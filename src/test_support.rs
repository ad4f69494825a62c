//! Shared fixtures for router tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    auth,
    config::Config,
    create_app,
    db::models::{BlogPost, ContactMessage, NewBlogPost, NewContactMessage, NewService, Service},
    mailer::{MailError, Mailer, OutgoingEmail},
    newsletter::NewsletterClient,
    state::{AppState, SharedState},
    store::{
        AccessMode, ContentStore, ListQuery, MessageSort, Page, PostSort, ServiceSort,
        StoreAccess, StoreError,
    },
};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "s3cure-test-pass";

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Every call fails as a backend outage would.
pub struct FailingStore;

fn outage() -> StoreError {
    StoreError::Backend("connection refused".to_string())
}

#[async_trait]
impl ContentStore for FailingStore {
    async fn ping(&self) -> Result<Duration, StoreError> {
        Err(outage())
    }
    async fn list_posts(&self, _: &ListQuery<PostSort>) -> Result<Page<BlogPost>, StoreError> {
        Err(outage())
    }
    async fn find_post(&self, _: Uuid) -> Result<Option<BlogPost>, StoreError> {
        Err(outage())
    }
    async fn find_post_by_slug(&self, _: &str) -> Result<Option<BlogPost>, StoreError> {
        Err(outage())
    }
    async fn insert_post(&self, _: NewBlogPost) -> Result<BlogPost, StoreError> {
        Err(outage())
    }
    async fn save_post(&self, _: &BlogPost) -> Result<BlogPost, StoreError> {
        Err(outage())
    }
    async fn delete_post(&self, _: Uuid) -> Result<bool, StoreError> {
        Err(outage())
    }
    async fn list_services(&self, _: &ListQuery<ServiceSort>) -> Result<Page<Service>, StoreError> {
        Err(outage())
    }
    async fn find_service(&self, _: Uuid) -> Result<Option<Service>, StoreError> {
        Err(outage())
    }
    async fn insert_service(&self, _: NewService) -> Result<Service, StoreError> {
        Err(outage())
    }
    async fn save_service(&self, _: &Service) -> Result<Service, StoreError> {
        Err(outage())
    }
    async fn delete_service(&self, _: Uuid) -> Result<bool, StoreError> {
        Err(outage())
    }
    async fn list_messages(
        &self,
        _: &ListQuery<MessageSort>,
    ) -> Result<Page<ContactMessage>, StoreError> {
        Err(outage())
    }
    async fn find_message(&self, _: Uuid) -> Result<Option<ContactMessage>, StoreError> {
        Err(outage())
    }
    async fn insert_message(&self, _: NewContactMessage) -> Result<ContactMessage, StoreError> {
        Err(outage())
    }
    async fn save_message(&self, _: &ContactMessage) -> Result<ContactMessage, StoreError> {
        Err(outage())
    }
    async fn delete_message(&self, _: Uuid) -> Result<bool, StoreError> {
        Err(outage())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: SharedState,
    pub mailer: Arc<RecordingMailer>,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(StoreAccess::memory())
    }

    pub fn failing() -> Self {
        Self::with_store(StoreAccess::new(AccessMode::Scoped, Arc::new(FailingStore)))
    }

    pub fn with_store(store: StoreAccess) -> Self {
        Self::configured(store, |_| {})
    }

    pub fn configured(store: StoreAccess, adjust: impl FnOnce(&mut Config)) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = Config {
            admin_email: ADMIN_EMAIL.to_string(),
            admin_password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).unwrap(),
            login_max_attempts: 1000,
            upload_dir: uploads.path().to_path_buf(),
            ..Config::default()
        };
        adjust(&mut config);
        let mailer = Arc::new(RecordingMailer::default());
        let newsletter = NewsletterClient::new(None, None).unwrap();
        let state = AppState::with_parts(config, store, mailer.clone(), newsletter);
        Self {
            router: create_app(state.clone()),
            state,
            mailer,
            uploads,
        }
    }

    pub fn session_cookie(&self) -> String {
        let (token, _) = auth::issue_token(&self.state.config, ADMIN_EMAIL).unwrap();
        format!("{}={}", auth::SESSION_COOKIE, token)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    pub async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Authenticated JSON request.
    pub fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::COOKIE, self.session_cookie());
        with_json(builder, body)
    }
}

pub fn public(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    with_json(Request::builder().method(method).uri(uri), body)
}

fn with_json(builder: axum::http::request::Builder, body: Option<Value>) -> Request<Body> {
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub const BOUNDARY: &str = "sentinel-test-boundary";

/// multipart/form-data body with an optional `folder` field and one `file`.
pub fn multipart_body(folder: Option<&str>, filename: &str, mime: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(folder) = folder {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\n{folder}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];
