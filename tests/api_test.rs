use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tower::ServiceExt;

use cv_master::{
    config::Config,
    database::{blob::LocalBlobStore, Gateway},
    render::{Artifact, ArtifactError, ArtifactKind, ArtifactRenderer, LayoutDocument},
    routes::build_router,
    services::ai_service::{AiError, TextGenerator},
    AppState,
};

struct OfflineModel;

#[async_trait]
impl TextGenerator for OfflineModel {
    async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
        Err(AiError::Api {
            status: 503,
            message: "model offline".into(),
        })
    }
}

struct StubRenderer;

#[async_trait]
impl ArtifactRenderer for StubRenderer {
    async fn render(
        &self,
        _doc: &LayoutDocument,
        kind: ArtifactKind,
    ) -> Result<Artifact, ArtifactError> {
        Ok(Artifact {
            kind,
            bytes: Bytes::from_static(b"%PDF-1.7 stub"),
        })
    }
}

fn test_config(upload_dir: &str) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: "test_secret_key".into(),
        jwt_ttl_hours: 1,
        webhook_secret: "whsec_test".into(),
        gemini_api_key: "unused".into(),
        gemini_api_url: "http://localhost/unused".into(),
        public_base_url: "http://localhost:8080".into(),
        upload_dir: upload_dir.into(),
        libreoffice_bin: "libreoffice".into(),
        pdftoppm_bin: "pdftoppm".into(),
        pdftotext_bin: "pdftotext".into(),
        ai_rps: 100,
        max_free_cvs: 1,
    }
}

fn setup_app() -> Router {
    let upload_dir = std::env::temp_dir().join(format!("cv_master_test_{}", uuid::Uuid::new_v4()));
    let upload_dir = upload_dir.to_string_lossy().to_string();
    let config = Arc::new(test_config(&upload_dir));
    let blobs = Arc::new(LocalBlobStore::new(&upload_dir, &config.public_base_url).expect("blobs"));
    let gateway = Gateway::in_memory(blobs);
    let state = AppState::from_parts(
        config,
        gateway,
        Arc::new(OfflineModel),
        Arc::new(StubRenderer),
    );
    build_router(state)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, email: &str) -> (String, String) {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": "password123", "display_name": "Ana Silva" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

async fn filled_draft(app: &Router, token: &str) -> String {
    let (status, draft) = call(app, "POST", "/api/drafts", Some(token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = draft["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        app,
        "POST",
        &format!("/api/drafts/{}/template", id),
        Some(token),
        Some(json!({ "choice": "without_photo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for (field, value) in [
        ("full_name", "Ana Silva"),
        ("email", "ana@example.com"),
        ("phone", "+55 11 9999-0000"),
        ("address", "São Paulo"),
    ] {
        let (status, _) = call(
            app,
            "PATCH",
            &format!("/api/drafts/{}", id),
            Some(token),
            Some(json!({ "op": "set_personal", "field": field, "value": value })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, edit) = call(
        app,
        "PATCH",
        &format!("/api/drafts/{}", id),
        Some(token),
        Some(json!({ "op": "add_skill", "name": "Rust" })),
    )
    .await;
    assert_eq!(edit["changed"], true);
    id
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = setup_app();
    let (status, body) = call(&app, "GET", "/api/cvs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, _) = call(&app, "GET", "/api/cvs", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn wizard_save_and_read_back() {
    let app = setup_app();
    let (token, _) = register(&app, "ana@example.com").await;
    let id = filled_draft(&app, &token).await;

    let (_, nav) = call(&app, "POST", &format!("/api/drafts/{}/advance", id), Some(&token), None).await;
    assert_eq!(nav["moved"], true);
    assert_eq!(nav["draft"]["current_step"], "skills");

    let (status, html) = {
        let req = Request::builder()
            .uri(format!("/api/drafts/{}/preview.html", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    };
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("ANA SILVA"));

    let (status, saved) = call(&app, "POST", &format!("/api/drafts/{}/save", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["image_saved"], true);
    let cv_id = saved["cv"]["id"].as_str().unwrap().to_string();

    let (status, cv) = call(&app, "GET", &format!("/api/cvs/{}", cv_id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cv["template_id"], "classic-navy");
    assert_eq!(cv["personal_info"]["full_name"], "Ana Silva");
    assert_eq!(cv["skills"][0]["name"], "Rust");
    assert!(cv["image_url"].as_str().unwrap().contains("/uploads/cv-images/"));

    // saving again updates the same record
    let (status, again) = call(&app, "POST", &format!("/api/drafts/{}/save", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["cv"]["id"], cv_id.as_str());

    let (_, state) = call(&app, "GET", "/api/requests/save_cv", Some(&token), None).await;
    assert_eq!(state["state"], "settled");
    assert_eq!(state["ok"], true);

    // free accounts keep one CV
    let second = filled_draft(&app, &token).await;
    let (status, _) = call(&app, "POST", &format!("/api/drafts/{}/save", second), Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn other_users_cannot_see_drafts_or_cvs() {
    let app = setup_app();
    let (owner, _) = register(&app, "owner@example.com").await;
    let (intruder, _) = register(&app, "intruder@example.com").await;
    let id = filled_draft(&app, &owner).await;

    let (status, _) = call(&app, "GET", &format!("/api/drafts/{}", id), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, saved) = call(&app, "POST", &format!("/api/drafts/{}/save", id), Some(&owner), None).await;
    let cv_id = saved["cv"]["id"].as_str().unwrap().to_string();
    let (status, _) = call(&app, "GET", &format!("/api/cvs/{}", cv_id), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_returns_an_attachment() {
    let app = setup_app();
    let (token, _) = register(&app, "export@example.com").await;
    let id = filled_draft(&app, &token).await;

    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/drafts/{}/export", id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "file_name": "Ana CV" }).to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Ana CV.pdf\""
    );

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/drafts/{}/export", id),
        Some(&token),
        Some(json!({ "file_name": "../.." })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scan_falls_back_when_model_is_down() {
    let app = setup_app();
    let (token, _) = register(&app, "scan@example.com").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/scans",
        Some(&token),
        Some(json!({ "text": "Ana Silva, Rust developer" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
    assert!(body["reason"].as_str().unwrap().contains("model offline"));
    assert_eq!(body["ad_required"], true);

    let (_, history) = call(&app, "GET", "/api/scans", Some(&token), None).await;
    assert_eq!(history.as_array().unwrap().len(), 0);

    let (status, _) = call(&app, "POST", "/api/scans", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subscription_webhook_unlocks_job_match() {
    let app = setup_app();
    let (token, user_id) = register(&app, "premium@example.com").await;
    let job = json!({ "text": "Rust developer", "job_description": "Senior Rust engineer" });

    let (status, _) = call(&app, "POST", "/api/job-match", Some(&token), Some(job.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let event = json!({
        "user_id": user_id,
        "status": "premium",
        "expires_at": chrono::Utc::now() + chrono::Duration::days(30),
    });
    let (status, _) = call(&app, "POST", "/api/webhook/subscription", None, Some(event.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/api/webhook/subscription")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-webhook-secret", "whsec_test")
        .body(Body::from(event.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, me) = call(&app, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(me["is_premium"], true);

    let (status, body) = call(&app, "POST", "/api/job-match", Some(&token), Some(job)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
}
