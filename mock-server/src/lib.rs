//! A stand-in for the site backend: every default rule endpoint plus a few
//! routes that exercise the client's status handling. All JSON is
//! snake_case.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub mod config;

pub const WRONG_CREDENTIALS: &str = "auth.signin.wrong-credentials";
pub const INVALID_EMAIL: &str = "newsletter.invalid-email";
pub const ALREADY_SUBSCRIBED: &str = "newsletter.already-subscribed";

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "hunter2";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub comment_id: u32,
    pub author_name: String,
    pub text: String,
    pub tag_list: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscription {
    pub subscription_id: Uuid,
    pub email: String,
}

#[derive(Deserialize)]
pub struct Subscribe {
    pub email: String,
}

#[derive(Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not signed in")]
    Unauthorized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[derive(Default)]
pub struct Site {
    pub subscribers: HashSet<String>,
    pub comments: Vec<Comment>,
}

pub type Db = Arc<RwLock<Site>>;

fn application_error(code: &str, message: &str) -> Json<Value> {
    Json(json!({"error": {"code": code, "message": message}}))
}

fn seed() -> Site {
    let comment = |id, author: &str, text: &str, tags: &[&str]| Comment {
        comment_id: id,
        author_name: author.to_string(),
        text: text.to_string(),
        tag_list: tags.iter().map(|t| t.to_string()).collect(),
    };
    Site {
        subscribers: HashSet::new(),
        comments: vec![
            comment(1, "ada", "Ownership finally clicked", &["rust", "learning"]),
            comment(2, "linus", "Tabs are eight spaces", &["style"]),
            comment(3, "grace", "Rust borrow checker saved me again", &["rust"]),
        ],
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/newsletter/", post(subscribe))
        .route("/search-topic/", get(search_topic))
        .route("/api/search-comments/", get(search_comments))
        .route("/api/filter-comments/", get(filter_comments))
        .route("/api/get-pulse/", get(get_pulse))
        .route("/api/get-pulse-videos/", get(get_pulse_videos))
        .route("/api/get-roulette-link/", get(get_roulette_link))
        .route("/auth/signin/", post(sign_in))
        .route("/users/{id}", post(echo_user))
        .route("/private/", get(private))
        .route("/broken/", get(broken))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!("mock server listening on {addr}");
    }
    axum::serve(listener, app()).await
}

async fn subscribe(State(db): State<Db>, Json(input): Json<Subscribe>) -> Response {
    if !input.email.contains('@') {
        return application_error(INVALID_EMAIL, "Please enter a valid email.").into_response();
    }
    let mut site = db.write().await;
    if !site.subscribers.insert(input.email.clone()) {
        return application_error(ALREADY_SUBSCRIBED, "This email is already subscribed.").into_response();
    }
    debug!(email = %input.email, "new subscriber");
    let subscription = Subscription {
        subscription_id: Uuid::new_v4(),
        email: input.email,
    };
    (StatusCode::CREATED, Json(subscription)).into_response()
}

async fn search_topic(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let query = params.get("query").cloned().unwrap_or_default();
    Json(json!({
        "query": query,
        "topic_list": [{"topic_id": 1, "topic_title": format!("All about {query}")}]
    }))
}

fn comment_page(comments: Vec<Comment>) -> Json<Value> {
    Json(json!({"total_count": comments.len(), "comment_list": comments}))
}

/// `query` matches comment text, `tags` is a comma-separated list that must
/// all be present.
async fn search_comments(State(db): State<Db>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let needle = params.get("query").map(|q| q.to_lowercase());
    let tags: Vec<&str> = params
        .get("tags")
        .map(|t| t.split(',').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let site = db.read().await;
    let found = site
        .comments
        .iter()
        .filter(|c| needle.as_ref().map_or(true, |n| c.text.to_lowercase().contains(n)))
        .filter(|c| tags.iter().all(|t| c.tag_list.iter().any(|ct| ct == t)))
        .cloned()
        .collect();
    comment_page(found)
}

async fn filter_comments(State(db): State<Db>, Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let site = db.read().await;
    let found = site
        .comments
        .iter()
        .filter(|c| params.get("author_name").map_or(true, |a| &c.author_name == a))
        .cloned()
        .collect();
    comment_page(found)
}

async fn get_pulse() -> Json<Value> {
    Json(json!({"pulse_id": 1, "view_count": 1024, "is_live": true}))
}

async fn get_pulse_videos(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    Json(json!({
        "page": page,
        "video_list": [{"video_id": page * 10 + 1, "video_url": "https://videos.example.com/1.mp4"}]
    }))
}

async fn get_roulette_link() -> Json<Value> {
    Json(json!({"link_url": "https://example.com/random"}))
}

async fn sign_in(Json(input): Json<SignIn>) -> Json<Value> {
    if input.email == DEMO_EMAIL && input.password == DEMO_PASSWORD {
        Json(json!({"user_id": 1, "display_name": "Demo User"}))
    } else {
        application_error(WRONG_CREDENTIALS, "Invalid credentials")
    }
}

/// Echoes what arrived so tests can check URL, header and body formatting.
async fn echo_user(
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let received: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "user_id": id,
        "query_params": params,
        "received_accept": header_value(header::ACCEPT),
        "received_content_type": header_value(header::CONTENT_TYPE),
        "received_body": received
    }))
}

async fn private() -> Result<Json<Value>, AppError> {
    Err(AppError::Unauthorized)
}

async fn broken() -> Result<Json<Value>, AppError> {
    Err(AppError::Internal("database unavailable".to_string()))
}
