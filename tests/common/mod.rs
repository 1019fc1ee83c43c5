//! Shared fixtures for the HTTP integration tests.
//!
//! Every test gets its own router over a fresh in-memory store and a
//! temporary upload root.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use vendor_onboarding_server::{
    AppState, build_router,
    config::Config,
    models::submission::FormVariant,
    repository::memory::MemoryStore,
    services::notification_service::Notifier,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "Abcd1234";

const BOUNDARY: &str = "vendor-test-boundary-7d1f";
const BODY_LIMIT: usize = 64 * 1024 * 1024;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    // Keeps the upload root alive for the duration of the test
    pub upload_dir: TempDir,
}

pub fn test_app() -> TestApp {
    test_app_with_variant(FormVariant::Stock)
}

pub fn test_app_with_variant(variant: FormVariant) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("temp upload dir");
    let config = Config {
        upload_dir: upload_dir.path().to_path_buf(),
        session_secret: Some("integration-test-secret".into()),
        bcrypt_cost: 4,
        form_variant: variant,
        ..Config::default()
    };

    let store = Arc::new(MemoryStore::new());
    let state = AppState::with_stores(config, store.clone(), store, Notifier::disabled())
        .expect("app state");

    TestApp {
        router: build_router(state.clone()),
        state,
        upload_dir,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }

    /// `name=value` of the session cookie set by this response.
    pub fn session_cookie(&self) -> Option<String> {
        self.set_cookie()
            .and_then(|cookie| cookie.split(';').next().map(str::to_string))
    }

    pub fn set_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("vendor_session="))
            .map(str::to_string)
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("read body")
            .to_vec();

        TestResponse {
            status,
            headers,
            bytes,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, cookie, Body::empty())).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(request("DELETE", uri, cookie, Body::empty())).await
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        let mut request = request("POST", uri, cookie, Body::from(body.to_string()));
        request.headers_mut().insert(
            header::CONTENT_TYPE,
            "application/json".parse().expect("content type"),
        );
        self.send(request).await
    }

    pub async fn post_multipart(&self, form: MultipartForm) -> TestResponse {
        let (content_type, body) = form.finish();
        let mut request = request("POST", "/api/submissions", None, Body::from(body));
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.parse().expect("content type"));
        self.send(request).await
    }

    /// Run setup with the default credentials and return the session cookie.
    pub async fn setup_admin(&self) -> String {
        let response = self
            .post_json(
                "/api/auth/setup",
                serde_json::json!({
                    "username": ADMIN_USERNAME,
                    "password": ADMIN_PASSWORD,
                    "confirmPassword": ADMIN_PASSWORD,
                }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "setup failed: {:?}", response.json());
        response.session_cookie().expect("setup sets a session cookie")
    }

    /// Submit a valid stock-variant form and return the new id.
    pub async fn submit_valid(&self, designer: &str) -> String {
        let response = self.post_multipart(valid_form(designer)).await;
        assert_eq!(response.status, StatusCode::OK, "intake failed: {:?}", response.json());
        response.json()["data"]["id"]
            .as_str()
            .expect("id in response")
            .to_string()
    }

    /// Number of files currently stored beneath the upload root.
    pub fn stored_files(&self) -> usize {
        walk(self.upload_dir.path())
    }
}

fn walk(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| {
                    let path = entry.path();
                    if path.is_dir() { walk(&path) } else { 1 }
                })
                .sum()
        })
        .unwrap_or(0)
}

pub fn request(method: &str, uri: &str, cookie: Option<&str>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(body).expect("valid request")
}

/// Minimal `multipart/form-data` encoder.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={BOUNDARY}"), self.body)
    }
}

/// Text fields shared by every variant.
pub fn common_fields(designer: &str) -> MultipartForm {
    MultipartForm::new()
        .text("designerName", designer)
        .text("email", "layla@example.com")
        .text("city", "Riyadh")
        .text("category", "fashion")
        .text("brandName", "Sadu House")
        .text("phoneNumber", "+966 500 000 000")
        .text("storeLink", "")
        .text(
            "brandStory",
            "A family workshop weaving Sadu textiles for modern homes since 1998.",
        )
        .text("fulfillmentMethod", "self")
}

pub fn with_required_files(form: MultipartForm) -> MultipartForm {
    form.file("logo", "logo.png", "image/png", b"\x89PNG fake image")
        .file("bankDetails", "bank.pdf", "application/pdf", b"%PDF-1.4 bank")
        .file("commercialRegister", "cr.pdf", "application/pdf", b"%PDF-1.4 register")
}

/// A complete, valid stock-variant submission.
pub fn valid_form(designer: &str) -> MultipartForm {
    with_required_files(
        common_fields(designer)
            .text("stockAvailability", "in-stock")
            .text("branchCount", "3"),
    )
}
