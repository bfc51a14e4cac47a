//! Common test utilities for in-process API tests.
//!
//! The fixture wires the real SQLite item store and filesystem cover
//! storage into a temporary directory, so requests exercise the full
//! stack without a listening socket.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use comicshelf_core::{
    auth::hash_password,
    config::{AuthConfig, CatalogConfig, DatabaseConfig, ServerConfig, StorageConfig, TokenConfig},
    create_account_service, create_authenticator, create_token_issuer, AssetLifecycle, AuthMethod,
    CatalogService, Config, FsAssetStorage, ItemStore, Role, SqliteItemStore,
};
use comicshelf_server::{create_router, AppState};

pub const API_KEY: &str = "test-api-key";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const TOKEN_SECRET: &str = "test-secret-that-is-at-least-32-bytes";

const BOUNDARY: &str = "comicshelf-test-boundary";

/// Test fixture wrapping an in-process router.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_item_creation() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/api/v1/items", json!({
///         "title": "Saga", "issue_number": "1", "publisher": "Image"
///     })).await;
///
///     assert_eq!(response.status, 201);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub state: Arc<AppState>,
    /// Directory the cover files are written to
    pub covers_dir: PathBuf,
    /// Bearer credential attached to every request, if any
    pub bearer: Option<String>,
    /// Temporary directory for the database and covers
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    /// Raw body, for non-JSON responses
    pub text: String,
}

/// One part of a multipart request.
pub enum Part<'a> {
    Text {
        name: &'a str,
        value: &'a str,
    },
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        bytes: &'a [u8],
    },
}

impl TestFixture {
    /// Fixture with auth disabled (every caller is the owner).
    pub fn new() -> Self {
        Self::with_auth(AuthConfig {
            method: AuthMethod::None,
            api_key: None,
            token: None,
        })
    }

    /// Fixture requiring the shared API key.
    pub fn with_api_key() -> Self {
        Self::with_auth(AuthConfig {
            method: AuthMethod::ApiKey,
            api_key: Some(API_KEY.to_string()),
            token: None,
        })
    }

    /// Fixture with signed-token auth; the admin account is seeded.
    pub fn with_token_auth() -> Self {
        Self::with_auth(AuthConfig {
            method: AuthMethod::Token,
            api_key: None,
            token: Some(TokenConfig {
                secret: TOKEN_SECRET.to_string(),
                ttl_secs: 3600,
                admin_username: "admin".to_string(),
                admin_full_name: "Administrator".to_string(),
                admin_password_hash: hash_password(ADMIN_PASSWORD)
                    .expect("Failed to hash admin password"),
            }),
        })
    }

    pub fn with_auth(auth: AuthConfig) -> Self {
        Self::build(auth, StorageConfig::default().max_upload_bytes)
    }

    /// Fixture with auth disabled and a small upload limit.
    pub fn with_max_upload_bytes(max_upload_bytes: usize) -> Self {
        Self::build(
            AuthConfig {
                method: AuthMethod::None,
                api_key: None,
                token: None,
            },
            max_upload_bytes,
        )
    }

    fn build(auth: AuthConfig, max_upload_bytes: usize) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let covers_dir = temp_dir.path().join("uploads");

        let config = Config {
            auth,
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig { path: db_path },
            storage: StorageConfig {
                root: covers_dir.clone(),
                public_prefix: "/files/".to_string(),
                max_upload_bytes,
            },
            catalog: CatalogConfig::default(),
        };

        let authenticator = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );
        let token_issuer =
            create_token_issuer(&config.auth).expect("Failed to create token issuer");
        let accounts = create_account_service(&config.auth, &config.database.path)
            .expect("Failed to create account store");

        let item_store: Arc<dyn ItemStore> = Arc::new(
            SqliteItemStore::new(&config.database.path).expect("Failed to create item store"),
        );
        let storage = Arc::new(
            FsAssetStorage::from_config(&config.storage).expect("Failed to create cover storage"),
        );
        let assets = AssetLifecycle::new(storage).with_max_upload_bytes(max_upload_bytes);
        let catalog = Arc::new(
            CatalogService::new(item_store, assets).with_max_tags(config.catalog.max_tags),
        );

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            token_issuer,
            accounts,
            catalog,
        ));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            covers_dir,
            bearer: None,
            temp_dir,
        }
    }

    /// Attach `Authorization: Bearer <credential>` to later requests.
    pub fn authorize(&mut self, credential: impl Into<String>) {
        self.bearer = Some(credential.into());
    }

    pub fn clear_authorization(&mut self) {
        self.bearer = None;
    }

    /// Register a `user` account and return its token.
    pub async fn register_user(&self, username: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/v1/auth/register",
                serde_json::json!({
                    "username": username,
                    "password": password,
                    "fullName": "Test Reader",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body["token"]
            .as_str()
            .expect("register response without token")
            .to_string()
    }

    /// Issue a token for `subject` directly, bypassing login.
    pub fn token_for(&self, subject: &str, role: Role) -> String {
        self.state
            .token_issuer()
            .expect("token auth not configured")
            .issue(subject, role)
            .expect("Failed to issue token")
            .token
    }

    /// Filesystem path behind a public cover path.
    pub fn cover_file(&self, image_url: &str) -> PathBuf {
        let name = image_url
            .strip_prefix("/files/")
            .expect("cover path outside /files/");
        self.covers_dir.join(name)
    }

    pub fn cover_count(&self) -> usize {
        std::fs::read_dir(&self.covers_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn covers_dir(&self) -> &Path {
        &self.covers_dir
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a PATCH request with JSON body.
    pub async fn patch(&self, path: &str, body: Value) -> TestResponse {
        self.request("PATCH", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body.as_bytes().to_vec(), "application/json")
            .await
    }

    /// Send a multipart POST request.
    pub async fn post_multipart(&self, path: &str, parts: &[Part<'_>]) -> TestResponse {
        self.multipart("POST", path, parts).await
    }

    /// Send a multipart PUT request.
    pub async fn put_multipart(&self, path: &str, parts: &[Part<'_>]) -> TestResponse {
        self.multipart("PUT", path, parts).await
    }

    async fn multipart(&self, method: &str, path: &str, parts: &[Part<'_>]) -> TestResponse {
        let content_type = format!("multipart/form-data; boundary={}", BOUNDARY);
        self.request_raw(method, path, multipart_body(parts), &content_type)
            .await
    }

    /// Send a request with a raw body and custom content type.
    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> TestResponse {
        let request = self
            .builder(method, path)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = self.builder(method, path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    fn builder(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.bearer {
            Some(credential) => {
                builder.header(header::AUTHORIZATION, format!("Bearer {}", credential))
            }
            None => builder,
        }
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).into_owned();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}

/// Encode parts as a `multipart/form-data` body.
fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, file_name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status, $response.status, $response.text
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
