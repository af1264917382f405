#![allow(dead_code)]
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use verlo_admin_lib::session::SessionStore;
use verlo_admin_lib::AdminApp;

static INIT: Once = Once::new();

pub const PASSWORD: &str = "secret";
pub const REFRESH_TOKEN: &str = "refresh-1";
pub const PAGE_SIZE: usize = 2;

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("verlo_admin_lib=debug".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

fn now_secs() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

pub fn make_token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp, "user_id": 1 }).to_string());
    format!("{header}.{payload}.sig")
}

pub fn fresh_token() -> String {
    make_token(now_secs() + 3600)
}

pub fn expired_token() -> String {
    make_token(now_secs() - 60)
}

/// In-memory backend mirroring the admin API envelopes.
#[derive(Default)]
pub struct MockState {
    pub refresh_calls: AtomicUsize,
    pub refresh_fails: AtomicBool,
    pub authorization: Mutex<Vec<String>>,
    pub countries: Mutex<Vec<Value>>,
    pub next_id: AtomicI64,
    pub failing_metric: Mutex<Option<String>>,
    pub users: Mutex<Vec<Value>>,
    pub regions: Mutex<Vec<Value>>,
    pub writes: Mutex<Vec<RecordedWrite>>,
}

/// A mutating request as the backend received it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub method: String,
    pub path: String,
    pub body: Value,
}

impl MockState {
    fn seeded() -> Self {
        let state = Self::default();
        {
            let mut countries = state.countries.lock().unwrap();
            countries.push(json!({"id": 1, "name": "Cameroon", "code": "CM"}));
            countries.push(json!({"id": 2, "name": "Nigeria", "code": "NG"}));
            countries.push(json!({"id": 3, "name": "Kenya", "code": "KE"}));
        }
        {
            let mut users = state.users.lock().unwrap();
            users.push(json!({
                "id": 1,
                "username": "amina",
                "email": "amina@verlo.io",
                "is_identity_verified": "pending"
            }));
            users.push(json!({
                "id": 2,
                "username": "tunde",
                "email": "tunde@verlo.io",
                "is_identity_verified": "completed"
            }));
        }
        {
            let mut regions = state.regions.lock().unwrap();
            regions.push(json!({"id": 1, "name": "Littoral", "country": 1, "country_name": "Cameroon"}));
            regions.push(json!({"id": 2, "name": "Centre", "country": 1, "country_name": "Cameroon"}));
            regions.push(json!({"id": 3, "name": "Lagos", "country": 2, "country_name": "Nigeria"}));
        }
        state.next_id.store(4, Ordering::SeqCst);
        state
    }

    pub fn last_write(&self) -> Option<RecordedWrite> {
        self.writes.lock().unwrap().last().cloned()
    }

    pub fn user(&self, id: i64) -> Option<Value> {
        self.users.lock().unwrap().iter().find(|u| u["id"] == id).cloned()
    }

    fn record_write(&self, method: &Method, uri: &Uri, body: &Value) {
        self.writes.lock().unwrap().push(RecordedWrite {
            method: method.to_string(),
            path: uri.path().to_string(),
            body: body.clone(),
        });
    }

    pub fn country_count(&self) -> usize {
        self.countries.lock().unwrap().len()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.authorization.lock().unwrap().last().cloned()
    }

    fn record_auth(&self, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.authorization.lock().unwrap().push(value);
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        self.record_auth(headers);
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Bearer "))
    }
}

type Shared = Arc<MockState>;

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if body["password"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "FAILED", "error": ["Invalid credentials"]})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "SUCCESS",
            "data": {
                "access": fresh_token(),
                "refresh": REFRESH_TOKEN,
                "user": {"id": 1, "username": username, "is_staff": true}
            }
        })),
    )
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    // Long enough for concurrent callers to pile up behind the first refresh.
    tokio::time::sleep(Duration::from_millis(100)).await;
    if state.refresh_fails.load(Ordering::SeqCst) || body["refresh"] != REFRESH_TOKEN {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "FAILED", "error": ["Token is invalid or expired"]})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"status": "SUCCESS", "data": {"access": fresh_token()}})),
    )
}

async fn list_countries(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let countries = state.countries.lock().unwrap();
    let results: Vec<Value> = countries
        .iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect();
    (
        StatusCode::OK,
        Json(json!({
            "status": "SUCCESS",
            "data": {"count": countries.len(), "results": results}
        })),
    )
}

fn validate_country(body: &Value) -> Option<(StatusCode, Json<Value>)> {
    let mut errors = vec![];
    if body["name"].as_str().unwrap_or_default().trim().is_empty() {
        errors.push("Name is required");
    }
    if body["code"].as_str().unwrap_or_default().trim().is_empty() {
        errors.push("Code is required");
    }
    if errors.is_empty() {
        None
    } else {
        Some((
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "FAILED", "error": errors})),
        ))
    }
}

async fn create_country(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if let Some(rejection) = validate_country(&body) {
        return rejection;
    }
    let id = state.next_id.fetch_add(1, Ordering::SeqCst);
    let record = json!({"id": id, "name": body["name"], "code": body["code"]});
    state.countries.lock().unwrap().push(record.clone());
    (
        StatusCode::CREATED,
        Json(json!({"status": "SUCCESS", "data": record})),
    )
}

async fn update_country(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if let Some(rejection) = validate_country(&body) {
        return rejection;
    }
    let mut countries = state.countries.lock().unwrap();
    match countries.iter_mut().find(|c| c["id"] == id) {
        Some(existing) => {
            *existing = json!({"id": id, "name": body["name"], "code": body["code"]});
            // Updates answer with the bare record, no envelope.
            (StatusCode::OK, Json(existing.clone()))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))),
    }
}

async fn delete_country(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let mut countries = state.countries.lock().unwrap();
    let before = countries.len();
    countries.retain(|c| c["id"] != id);
    if countries.len() == before {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."})));
    }
    (StatusCode::OK, Json(json!({"status": "SUCCESS"})))
}

async fn list_users(State(state): State<Shared>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let users = state.users.lock().unwrap().clone();
    (
        StatusCode::OK,
        Json(json!({"status": "SUCCESS", "data": {"count": users.len(), "results": users}})),
    )
}

fn apply_user_patch(
    state: &MockState,
    id: i64,
    fields: &Value,
) -> (StatusCode, Json<Value>) {
    let mut users = state.users.lock().unwrap();
    let Some(user) = users.iter_mut().find(|u| u["id"] == id) else {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."})));
    };
    if let (Some(user), Some(fields)) = (user.as_object_mut(), fields.as_object()) {
        for (key, value) in fields {
            user.insert(key.clone(), value.clone());
        }
    }
    (
        StatusCode::OK,
        Json(json!({"status": "SUCCESS", "data": user.clone()})),
    )
}

async fn patch_user(
    State(state): State<Shared>,
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record_write(&method, &uri, &body);
    apply_user_patch(&state, id, &body)
}

async fn set_identity_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    method: Method,
    uri: Uri,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    state.record_write(&method, &uri, &body);
    let status = body["is_identity_verified"].as_str().unwrap_or_default();
    if !matches!(status, "pending" | "completed" | "rejected") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "FAILED", "error": [format!("\"{status}\" is not a valid choice.")]})),
        );
    }
    apply_user_patch(&state, id, &json!({"is_identity_verified": status}))
}

async fn regions_by_country(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(country): Path<i64>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let results: Vec<Value> = state
        .regions
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r["country"] == country)
        .cloned()
        .collect();
    // This endpoint answers without the `data` wrapper.
    (
        StatusCode::OK,
        Json(json!({"count": results.len(), "results": results})),
    )
}

async fn metric(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> (StatusCode, Json<Value>) {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if state.failing_metric.lock().unwrap().as_deref() == Some(name.as_str()) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "boom"})),
        );
    }
    if name == "dashboard_data" {
        return (
            StatusCode::OK,
            Json(json!({
                "status": "SUCCESS",
                "data": {
                    "total_users": 2,
                    "users_per_day": [
                        {"day": "2026-03-02T00:00:00Z", "count": 3},
                        {"day": "2026-03-01T00:00:00Z", "count": 1}
                    ],
                    "trips_per_day": [
                        {"day": "2026-03-02T00:00:00Z", "count": 5}
                    ],
                    "requests_per_day": [
                        {"day": "2026-03-04T00:00:00Z", "count": 2}
                    ]
                }
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"status": "SUCCESS", "data": {"count": 42}})),
    )
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/users/login/", post(login))
        .route("/api/users/token/refresh/", post(refresh))
        .route("/api/listings/countries/", get(list_countries).post(create_country))
        .route(
            "/api/listings/countries/{id}/",
            put(update_country).delete(delete_country),
        )
        .route("/api/users/", get(list_users))
        .route("/api/users/{id}/", patch(patch_user))
        .route("/api/users/{id}/identity-status/", patch(set_identity_status))
        .route("/api/listings/regions/by-country/{country}/", get(regions_by_country))
        .route("/api/admin/metrics/{name}/", get(metric))
        .with_state(state)
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Shared,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        setup_tracing();
        let state = Arc::new(MockState::seeded());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn app(&self, store: Arc<dyn SessionStore>) -> AdminApp {
        AdminApp::new(reqwest::Client::new(), &self.base_url, store)
    }
}
