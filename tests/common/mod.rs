// Shared helpers for integration tests.
//
// Each test gets its own router over a fresh MemoryStore, so tests run in
// parallel without a database or a spawned server process.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use zoning_api::app::{router, AppState};
use zoning_api::auth::{hash_password, issue_session_token};
use zoning_api::config::{AppConfig, StorageBackend};
use zoning_api::database::models::{NewUser, ZoningRule};
use zoning_api::database::{MemoryStore, Store, UserStore};
use zoning_api::services::mailer::MailError;
use zoning_api::services::{Mailer, OutgoingMail};
use zoning_api::types::Role;

pub const PASSWORD: &str = "Passw0rd!";

/// Keeps every message instead of delivering it
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_zoning_rules(Vec::new())
    }

    pub fn with_zoning_rules(rules: Vec<ZoningRule>) -> Self {
        let mut config = AppConfig::development();
        config.database.backend = StorageBackend::Memory;
        config.database.run_migrations = false;
        config.api.enable_request_logging = false;
        config.security.bcrypt_cost = 4;
        config.storage.upload_dir = scratch_dir();

        let store = Arc::new(MemoryStore::with_zoning_rules(rules));
        let mailer = Arc::new(RecordingMailer::default());

        let dyn_store: Arc<dyn Store> = store.clone();
        let dyn_mailer: Arc<dyn Mailer> = mailer.clone();
        let router = router(AppState::new(config.clone(), dyn_store, dyn_mailer));

        Self {
            router,
            store,
            mailer,
            config,
        }
    }

    /// Insert a user straight into the store and mint a session token for it
    pub async fn user_token(&self, email: &str, role: Role) -> Result<(i64, String)> {
        let password_hash = hash_password(PASSWORD, self.config.security.bcrypt_cost).await?;
        let id = self
            .store
            .create_user(NewUser {
                full_name: "Test User".to_string(),
                email: email.to_string(),
                password_hash,
                contact_number: None,
                role,
            })
            .await?;

        let user = self
            .store
            .find_user(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user {} vanished", id))?;
        let token = issue_session_token(&user, &self.config.security)?;
        Ok((id, token))
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(json_request(Method::GET, uri, token, None)?).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(json_request(Method::POST, uri, token, Some(body))?).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(json_request(Method::PATCH, uri, token, Some(body))?).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(json_request(Method::PUT, uri, token, Some(body))?).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(json_request(Method::DELETE, uri, token, None)?).await
    }

    /// POST /api/properties and return the new id
    pub async fn create_property(&self, token: &str, body: Value) -> Result<i64> {
        let (status, json) = self.post("/api/properties", Some(token), body).await?;
        anyhow::ensure!(status == StatusCode::OK, "create property returned {}: {}", status, json);
        json["property_id"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("no property_id in {}", json))
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };
    Ok(request)
}

/// Single-part multipart body carrying `contents` in field `file`
pub fn multipart_request(uri: &str, token: &str, filename: &str, contents: &[u8]) -> Result<Request<Body>> {
    let boundary = "zoning-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Ok(Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))?)
}

pub fn zoning_rule(id: i64, zone_code: &str, city: &str) -> ZoningRule {
    ZoningRule {
        id,
        zone_code: zone_code.to_string(),
        city: Some(city.to_string()),
        use_name: Some("Single Family".to_string()),
        max_height: Some(30.0),
        ..ZoningRule::default()
    }
}

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("zoning-api-test-{}", uuid::Uuid::new_v4()))
}
