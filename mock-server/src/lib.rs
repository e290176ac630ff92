//! In-memory stand-in for the remote user-directory API.
//!
//! Every route requires the `x-api-key` header when a key is configured.
//! `/users` routes also require a bearer token previously issued by
//! `/register`. Failures answer `{"error": "..."}`, or `{}` for a missing
//! record.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

pub const API_KEY: &str = "reqres-free-v1";
pub const DEFAULT_PER_PAGE: u32 = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
    pub total: u32,
    pub total_pages: u32,
    pub data: Vec<User>,
}

#[derive(Deserialize)]
pub struct Register {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub job: String,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub job: Option<String>,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Default)]
pub struct Db {
    users: BTreeMap<u64, User>,
    next_id: u64,
    tokens: HashSet<String>,
}

const SEED: [(&str, &str); 12] = [
    ("George", "Bluth"),
    ("Janet", "Weaver"),
    ("Emma", "Wong"),
    ("Eve", "Holt"),
    ("Charles", "Morris"),
    ("Tracey", "Ramos"),
    ("Michael", "Lawson"),
    ("Lindsay", "Ferguson"),
    ("Tobias", "Funke"),
    ("Byron", "Fields"),
    ("George", "Edwards"),
    ("Rachel", "Howell"),
];

impl Db {
    /// The twelve demo users, ids 1 through 12.
    pub fn seeded() -> Self {
        let mut db = Db::default();
        for (first, last) in SEED {
            db.insert(
                first,
                last,
                &format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
            );
        }
        db
    }

    fn insert(&mut self, first_name: &str, last_name: &str, email: &str) -> User {
        self.next_id += 1;
        let user = User {
            id: self.next_id,
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            avatar: format!("https://reqres.in/img/faces/{}-image.jpg", self.next_id),
        };
        self.users.insert(user.id, user.clone());
        user
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Db>>,
    api_key: Option<String>,
}

impl AppState {
    pub fn new(db: Db, api_key: Option<&str>) -> Self {
        Self {
            db: Arc::new(RwLock::new(db)),
            api_key: api_key.map(str::to_string),
        }
    }
}

/// A failure status with an optional `error` message.
pub struct ApiFailure(StatusCode, Option<&'static str>);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = match self.1 {
            Some(message) => serde_json::json!({ "error": message }),
            None => serde_json::json!({}),
        };
        (self.0, Json(body)).into_response()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn split_name(name: &str) -> (String, String) {
    match name.trim().split_once(' ') {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (name.trim().to_string(), String::new()),
    }
}

pub fn app() -> Router {
    router(AppState::new(Db::seeded(), Some(API_KEY)))
}

pub fn router(state: AppState) -> Router {
    let users = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(register))
        .merge(users)
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    if let Some(expected) = &state.api_key {
        let given = request
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            return Err(ApiFailure(StatusCode::UNAUTHORIZED, Some("Missing API key")));
        }
    }
    Ok(next.run(request).await)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiFailure> {
    let known = match bearer(request.headers()) {
        Some(token) => state.db.read().await.tokens.contains(token),
        None => false,
    };
    if !known {
        return Err(ApiFailure(
            StatusCode::UNAUTHORIZED,
            Some("Missing or invalid token"),
        ));
    }
    Ok(next.run(request).await)
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<Register>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let email = input
        .email
        .filter(|e| !e.is_empty())
        .ok_or(ApiFailure(StatusCode::BAD_REQUEST, Some("Missing email or username")))?;
    if input.password.as_deref().unwrap_or("").is_empty() {
        return Err(ApiFailure(StatusCode::BAD_REQUEST, Some("Missing password")));
    }

    let mut db = state.db.write().await;
    let id = db
        .users
        .values()
        .find(|u| u.email == email)
        .map(|u| u.id)
        .ok_or(ApiFailure(
            StatusCode::BAD_REQUEST,
            Some("Note: Only defined users succeed registration"),
        ))?;
    let token = Uuid::new_v4().simple().to_string();
    db.tokens.insert(token.clone());
    info!(id, "issued token");
    Ok(Json(serde_json::json!({ "id": id, "token": token })))
}

async fn list_users(State(state): State<AppState>, Query(params): Query<ListParams>) -> Json<Page> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PER_PAGE);

    let db = state.db.read().await;
    let total = db.users.len() as u32;
    let data = db
        .users
        .values()
        .skip((page - 1).saturating_mul(per_page) as usize)
        .take(per_page as usize)
        .cloned()
        .collect();
    Json(Page {
        page,
        per_page,
        total,
        total_pages: total.div_ceil(per_page),
        data,
    })
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let db = state.db.read().await;
    let user = db
        .users
        .get(&id)
        .ok_or(ApiFailure(StatusCode::NOT_FOUND, None))?;
    Ok(Json(serde_json::json!({ "data": user })))
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUser>,
) -> (StatusCode, Json<serde_json::Value>) {
    let (first, last) = split_name(&input.name);
    let user = state.db.write().await.insert(&first, &last, &input.job);
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "name": input.name,
            "job": input.job,
            "id": user.id.to_string(),
            "createdAt": now(),
        })),
    )
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<UpdateUser>,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let mut db = state.db.write().await;
    let user = db
        .users
        .get_mut(&id)
        .ok_or(ApiFailure(StatusCode::NOT_FOUND, None))?;
    if let Some(name) = &input.name {
        (user.first_name, user.last_name) = split_name(name);
    }
    if let Some(job) = &input.job {
        user.email = job.clone();
    }

    let mut body = serde_json::Map::new();
    if let Some(name) = input.name {
        body.insert("name".to_string(), name.into());
    }
    if let Some(job) = input.job {
        body.insert("job".to_string(), job.into());
    }
    body.insert("updatedAt".to_string(), now().into());
    Ok(Json(body.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiFailure> {
    let mut db = state.db.write().await;
    db.users
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ApiFailure(StatusCode::NOT_FOUND, None))
}
