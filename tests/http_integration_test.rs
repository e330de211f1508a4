use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use trade_journal::config::app_config::AuthConfig;
use trade_journal::domain::ports::AdviceProvider;
use trade_journal::http::auth::TokenSigner;
use trade_journal::http::{router, AppState};
use trade_journal::store::SqliteStore;

#[derive(Default)]
struct RecordingAdvisor {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl AdviceProvider for RecordingAdvisor {
    async fn advise(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("tips") {
            "tip: follow the plan".to_string()
        } else {
            "lesson: size down".to_string()
        }
    }
}

struct TestApp {
    router: Router,
    advisor: Arc<RecordingAdvisor>,
    tokens: TokenSigner,
}

async fn test_app() -> TestApp {
    let store = SqliteStore::in_memory().await.unwrap();
    let advisor = Arc::new(RecordingAdvisor::default());
    let auth = AuthConfig {
        jwt_secret: "integration-secret".to_string(),
        token_ttl_secs: None,
    };
    let state = AppState::new(Arc::new(store), advisor.clone(), TokenSigner::new(&auth));

    TestApp {
        router: router(state),
        advisor,
        tokens: TokenSigner::new(&auth),
    }
}

struct Reply {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> Reply {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    Reply {
        status,
        location,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

fn form(uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>, accept_json: bool) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if accept_json {
        builder = builder.header(header::ACCEPT, "application/json");
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &TestApp, username: &str) -> String {
    let reply = send(app, form("/register", None, &format!("username={username}&password=pw"))).await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(reply.location.as_deref(), Some("/login"));

    let reply = send(app, form("/login", None, &format!("username={username}&password=pw"))).await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.json()["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_reports_tables_and_users() {
    let app = test_app().await;
    register_and_login(&app, "alice").await;

    let reply = send(&app, get("/health", None, false)).await;
    assert_eq!(reply.status, StatusCode::OK);

    let body = reply.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["user_count"], 1);
    let tables: Vec<&str> = body["database"]["tables"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    for table in ["daily_trade", "transaction", "user"] {
        assert!(tables.contains(&table), "missing table {table}");
    }
}

#[tokio::test]
async fn test_index_redirects_to_dashboard() {
    let app = test_app().await;
    let reply = send(&app, get("/", None, false)).await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(reply.location.as_deref(), Some("/dashboard"));
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let app = test_app().await;
    register_and_login(&app, "bob").await;

    let reply = send(&app, form("/register", None, "username=bob&password=other")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "Username already exists");
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = test_app().await;
    register_and_login(&app, "carol").await;

    let reply = send(&app, form("/login", None, "username=carol&password=nope")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["error"], "Bad credentials");

    let reply = send(&app, form("/login", None, "username=nobody&password=pw")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let app = test_app().await;

    let reply = send(&app, get("/dashboard", None, true)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["error"], "Missing/invalid Authorization header");

    let reply = send(&app, get("/dashboard", Some("garbage"), true)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["error"], "Invalid token");

    // Well-signed token for a user that does not exist
    let orphan = app.tokens.issue(999).unwrap();
    let reply = send(&app, form("/deposit", Some(&orphan), "amount=10")).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["error"], "Invalid token");
}

#[tokio::test]
async fn test_deposit_rejects_bad_amounts() {
    let app = test_app().await;
    let token = register_and_login(&app, "dave").await;

    for body in ["amount=abc", "amount=0", "amount=-5", "other=1"] {
        let reply = send(&app, form("/deposit", Some(&token), body)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "body {body}");
        assert!(reply.json()["error"].is_string());
    }
}

#[tokio::test]
async fn test_daily_rejects_invalid_date() {
    let app = test_app().await;
    let token = register_and_login(&app, "erin").await;

    let reply = send(&app, get("/daily/2024-13-01", Some(&token), false)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = send(
        &app,
        form("/daily/2024-03-01", Some(&token), "profit=1&loss=0&reason_profit=x"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_daily_upsert_and_dashboard_summary() {
    let app = test_app().await;
    let token = register_and_login(&app, "frank").await;

    assert_eq!(send(&app, form("/deposit", Some(&token), "amount=1000")).await.json()["status"], "ok");
    assert_eq!(send(&app, form("/withdraw", Some(&token), "amount=200.50")).await.json()["status"], "ok");

    let reply = send(
        &app,
        form(
            "/daily/2024-03-01",
            Some(&token),
            "profit=50&loss=&reason_profit=Breakout+entry&reason_loss=",
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert_eq!(reply.location.as_deref(), Some("/dashboard"));

    // Second post for the same day replaces the first
    send(
        &app,
        form(
            "/daily/2024-03-01",
            Some(&token),
            "profit=75&loss=10&reason_profit=Breakout+entry&reason_loss=Chased",
        ),
    )
    .await;
    send(
        &app,
        form("/daily/2024-03-02", Some(&token), "profit=&loss=5&reason_profit=&reason_loss="),
    )
    .await;

    let page = send(&app, get("/daily/2024-03-01", Some(&token), false)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains(r#"value="75.00""#));
    assert!(page.body.contains("Chased"));

    let reply = send(&app, get("/dashboard", Some(&token), true)).await;
    assert_eq!(reply.status, StatusCode::OK);
    let summary = reply.json();
    assert_eq!(summary["deposit_amount"], 1000.0);
    assert_eq!(summary["withdraw_amount"], 200.5);
    assert_eq!(summary["total_pl"], 60.0);
    assert_eq!(summary["active_balance"], 859.5);
    assert_eq!(summary["tips"], "tip: follow the plan");
    assert_eq!(summary["lessons"], "lesson: size down");

    let prompts = app.advisor.prompts.lock().unwrap().clone();
    assert!(prompts.contains(&"Generate trading tips from these profit reasons:\nBreakout entry".to_string()));
    assert!(prompts.contains(&"Generate trading lessons from these loss reasons:\nChased".to_string()));
}

#[tokio::test]
async fn test_dashboard_renders_html_by_default() {
    let app = test_app().await;
    let token = register_and_login(&app, "grace").await;

    let reply = send(&app, get("/dashboard", Some(&token), false)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("<h1>Dashboard</h1>"));
    assert!(reply.body.contains("Signed in as grace"));
}
