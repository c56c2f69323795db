// REST surface tests - routing, admin privilege and prompt validation
//
// Requests go straight through the router with `tower::ServiceExt::oneshot`;
// no socket is bound.

mod common;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use common::{ScriptedProvider, TOKEN, fast_transport};
use directus_mcp_agent::config::{
    AgentSettings, LlmConfig, ServerConfig, SettingsStore, SettingsUpdate,
};
use directus_mcp_agent::model::{ModelError, ModelProvider, ProviderFactory};
use directus_mcp_agent::server::{ServerState, build_router};
use directus_mcp_agent::tooling::{ConnectionStatus, McpSession};
use directus_mcp_agent::types::ChatMessage;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_KEY: &str = "s3cret-admin";

// ============================================================================
// Harness
// ============================================================================

struct ScriptedFactory(Arc<ScriptedProvider>);

impl ProviderFactory for ScriptedFactory {
    fn create(&self, _settings: &AgentSettings) -> Result<Arc<dyn ModelProvider>, ModelError> {
        Ok(self.0.clone())
    }
}

struct Harness {
    _dir: TempDir,
    settings: Arc<SettingsStore>,
    session: Arc<McpSession>,
    provider: Arc<ScriptedProvider>,
    router: Router,
}

impl Harness {
    fn new(admin_key: Option<&str>) -> Self {
        Self::with_server(admin_key, ServerConfig::default())
    }

    fn with_server(admin_key: Option<&str>, server: ServerConfig) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Arc::new(SettingsStore::open(dir.path().join("settings.toml")));
        let session = Arc::new(McpSession::new(server, fast_transport()));
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(ChatMessage::assistant(
            "All done.",
        ))]));
        let state = Arc::new(ServerState::new(
            Arc::clone(&settings),
            Arc::clone(&session),
            Arc::new(ScriptedFactory(Arc::clone(&provider))),
            LlmConfig::default(),
            admin_key.map(str::to_string),
        ));
        let router = build_router(state, &[]);
        Self {
            _dir: dir,
            settings,
            session,
            provider,
            router,
        }
    }

    fn settings_path(&self) -> PathBuf {
        self.settings.path().to_path_buf()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }
}

fn get(path: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }
    builder.body(Body::empty()).expect("request")
}

fn post(path: &str, key: Option<&str>, body: Value) -> Request<Body> {
    post_raw(path, key, body.to_string())
}

fn post_raw(path: &str, key: Option<&str>, body: impl Into<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = key {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
    }
    builder
        .body(Body::from(body.into()))
        .expect("request")
}

// ============================================================================
// Admin privilege
// ============================================================================

#[tokio::test]
async fn settings_require_admin_key() {
    let harness = Harness::new(Some(ADMIN_KEY));

    let (status, body) = harness.send(get("/settings", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Admin access required to view settings");

    let (status, body) = harness.send(get("/settings", Some("wrong"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required to view settings");

    let (status, body) = harness
        .send(post("/settings", None, json!({"ai_model": "gpt-4o"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required to update settings");
    assert!(!harness.settings_path().exists());

    let (status, body) = harness
        .send(post("/prompt", None, json!({"prompt": "hi"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required to use AI Agent");
}

#[tokio::test]
async fn without_configured_key_everything_privileged_is_refused() {
    let harness = Harness::new(None);

    let (status, _) = harness.send(get("/settings", Some(ADMIN_KEY))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = harness.send(get("/settings", Some(""))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn get_settings_returns_defaults_before_any_save() {
    let harness = Harness::new(Some(ADMIN_KEY));

    let (status, body) = harness.send(get("/settings", Some(ADMIN_KEY))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["directus_url"], "http://localhost:8055");
    assert_eq!(body["data"]["ai_model"], "gpt-3.5-turbo");
    assert_eq!(body["data"]["ai_base_url"], "https://api.openai.com/v1");
}

#[tokio::test]
async fn post_settings_persists_partial_update() {
    let harness = Harness::new(Some(ADMIN_KEY));

    let (status, body) = harness
        .send(post(
            "/settings",
            Some(ADMIN_KEY),
            json!({"admin_token": TOKEN, "ai_api_key": "sk-test"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Settings saved");
    assert_eq!(body["data"]["admin_token"], TOKEN);
    assert_eq!(body["data"]["ai_model"], "gpt-3.5-turbo");
    assert!(body["data"]["updated_at"].is_string());
    assert!(harness.settings_path().exists());

    let (_, body) = harness.send(get("/settings", Some(ADMIN_KEY))).await;
    assert_eq!(body["data"]["ai_api_key"], "sk-test");

    // A fresh store reads the persisted record back.
    let reopened = SettingsStore::open(harness.settings_path());
    assert!(reopened.is_loaded());
    assert_eq!(reopened.load().await.admin_token, TOKEN);
}

// ============================================================================
// Prompt validation
// ============================================================================

#[tokio::test]
async fn prompt_is_required() {
    let harness = Harness::new(Some(ADMIN_KEY));

    let (status, body) = harness.send(post("/prompt", Some(ADMIN_KEY), json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt is required");

    let (status, body) = harness
        .send(post("/prompt", Some(ADMIN_KEY), json!({"prompt": "   "})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt is required");
}

#[tokio::test]
async fn prompt_needs_api_key_before_connecting() {
    let harness = Harness::new(Some(ADMIN_KEY));
    harness
        .settings
        .upsert(SettingsUpdate {
            admin_token: Some(TOKEN.into()),
            ..SettingsUpdate::default()
        })
        .await
        .expect("save");

    let (status, body) = harness
        .send(post("/prompt", Some(ADMIN_KEY), json!({"prompt": "list"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "AI API Key is required in settings");
    assert_eq!(harness.session.connect_attempts(), 0);
    assert_eq!(harness.provider.call_count(), 0);
}

#[tokio::test]
async fn prompt_without_directus_token_is_a_server_error() {
    let harness = Harness::new(Some(ADMIN_KEY));
    harness
        .settings
        .upsert(SettingsUpdate {
            ai_api_key: Some("sk-test".into()),
            ..SettingsUpdate::default()
        })
        .await
        .expect("save");

    let (status, body) = harness
        .send(post("/prompt", Some(ADMIN_KEY), json!({"prompt": "list"})))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Admin token not set! Please go to settings.");
    assert_eq!(harness.session.connect_attempts(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn prompt_runs_agent_over_live_tool_server() {
    let fake = common::FakeServer::new(common::ECHO_SERVER);
    let harness = Harness::with_server(Some(ADMIN_KEY), fake.config.clone());
    harness
        .settings
        .upsert(SettingsUpdate {
            admin_token: Some(TOKEN.into()),
            ai_api_key: Some("sk-test".into()),
            ..SettingsUpdate::default()
        })
        .await
        .expect("save");

    let (status, body) = harness
        .send(post("/prompt", Some(ADMIN_KEY), json!({"prompt": "status?"})))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "All done.");
    assert_eq!(body["iterations"], 1);
    assert_eq!(body["cap_reached"], false);
    assert!(harness.session.is_connected());

    let (_, health) = harness.send(get("/health", None)).await;
    assert_eq!(health["mcp_connected"], true);
    assert_eq!(health["mcp_status"], "ready");

    // Saving settings drops the connection.
    let (status, _) = harness
        .send(post("/settings", Some(ADMIN_KEY), json!({"ai_model": "gpt-4o"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(harness.session.status(), ConnectionStatus::Idle);
    assert_eq!(fake.spawn_count(), 1);
}

// ============================================================================
// Malformed bodies
// ============================================================================

#[tokio::test]
async fn unparsable_prompt_body_is_a_structured_error() {
    let harness = Harness::new(Some(ADMIN_KEY));

    let (status, body) = harness
        .send(post_raw("/prompt", Some(ADMIN_KEY), "not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert_eq!(harness.provider.call_count(), 0);
}

#[tokio::test]
async fn mistyped_settings_field_is_a_structured_error() {
    let harness = Harness::new(Some(ADMIN_KEY));

    let (status, body) = harness
        .send(post("/settings", Some(ADMIN_KEY), json!({"ai_model": 5})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some_and(|e| e.contains("ai_model")));
    assert!(!harness.settings_path().exists());
}

#[tokio::test]
async fn missing_content_type_is_a_structured_error() {
    let harness = Harness::new(Some(ADMIN_KEY));
    let request = Request::builder()
        .method("POST")
        .uri("/prompt")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_KEY}"))
        .body(Body::from(r#"{"prompt":"hi"}"#))
        .expect("request");

    let (status, body) = harness.send(request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Health and docs
// ============================================================================

#[tokio::test]
async fn health_needs_no_privilege() {
    let harness = Harness::new(Some(ADMIN_KEY));

    let (status, body) = harness.send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "ok",
            "mcp_connected": false,
            "settings_loaded": false,
            "mcp_status": "idle",
        })
    );
}

#[tokio::test]
async fn openapi_document_lists_routes() {
    let harness = Harness::new(None);

    let (status, body) = harness.send(get("/api-doc/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    for path in ["/settings", "/prompt", "/health"] {
        assert!(body["paths"].get(path).is_some(), "missing {path}");
    }
    assert!(body["components"]["securitySchemes"]["admin_key"].is_object());
}
