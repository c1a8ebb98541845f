//! Test helpers for relay integration tests.
//!
//! Provides mock selfoss and Discord HTTP servers on ephemeral ports that
//! record every request they receive.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use selfoss_discord::discord::types::{CreateChannel, CreateMessage};
use selfoss_discord::Config;

/// Bot token the mock Discord server accepts.
pub const TOKEN: &str = "test-token";

/// Guild id the mock Discord server knows.
pub const GUILD_ID: &str = "123";

/// Everything the mock servers saw.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Query parameters of each `GET /items`.
    pub item_queries: Vec<HashMap<String, String>>,
    /// Form bodies of each `POST /mark`.
    pub marks: Vec<HashMap<String, String>>,
    /// Number of Discord requests of any kind.
    pub discord_requests: usize,
    /// Names of channels created.
    pub created_channels: Vec<String>,
    /// Delivered messages as (channel id, body).
    pub messages: Vec<(String, CreateMessage)>,
    /// Message posts attempted, including rejected ones.
    pub send_attempts: usize,
}

/// Shared state and knobs of both mock servers.
#[derive(Clone)]
pub struct MockState {
    pub items_status: u16,
    pub items_body: Arc<String>,
    /// Status codes for successive `POST /mark` calls; 200 once exhausted.
    pub mark_statuses: Arc<Mutex<VecDeque<u16>>>,
    pub channels: Arc<Mutex<Vec<Value>>>,
    pub reject_messages: bool,
    pub recorded: Arc<Mutex<Recorded>>,
}

impl MockState {
    /// Serve the given items from `GET /items`.
    pub fn with_items(items: Value) -> Self {
        Self {
            items_status: 200,
            items_body: Arc::new(items.to_string()),
            mark_statuses: Arc::new(Mutex::new(VecDeque::new())),
            channels: Arc::new(Mutex::new(Vec::new())),
            reject_messages: false,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    /// Serve a raw body and status from `GET /items`.
    pub fn with_raw_items(status: u16, body: &str) -> Self {
        let mut state = Self::with_items(json!([]));
        state.items_status = status;
        state.items_body = Arc::new(body.to_string());
        state
    }

    /// Pre-existing guild channel.
    pub fn add_channel(&self, id: &str, name: &str, kind: u8) {
        self.channels
            .lock()
            .unwrap()
            .push(json!({"id": id, "name": name, "type": kind}));
    }

    /// Queue status codes for mark-as-read calls.
    pub fn set_mark_statuses(&self, statuses: &[u16]) {
        *self.mark_statuses.lock().unwrap() = statuses.iter().copied().collect();
    }

    pub fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

/// Start both mock servers and return (selfoss URL, Discord API URL).
pub async fn start_servers(state: MockState) -> (String, String) {
    let selfoss = spawn(selfoss_router(state.clone())).await;
    let discord = spawn(discord_router(state)).await;
    (selfoss, discord)
}

/// Build a run configuration pointing at the mock servers.
pub fn test_config(selfoss_url: &str, discord_url: &str, watermark_file: Option<&Path>) -> Config {
    let mut config = Config::default();
    config.selfoss.base_url = selfoss_url.to_string();
    config.discord.token = TOKEN.to_string();
    config.discord.server_id = GUILD_ID.to_string();
    config.discord.api_base_url = discord_url.to_string();
    config.watermark.file = watermark_file.map(|p| p.to_string_lossy().into_owned());
    config
}

/// A selfoss item as JSON.
pub fn item_json(id: u64, datetime: &str, source: &str) -> Value {
    json!({
        "id": id,
        "datetime": datetime,
        "title": format!("Item {id}"),
        "link": format!("https://example.com/{id}"),
        "content": format!("<p>Body of item {id}</p>"),
        "sourcetitle": source,
        "icon": "tech.png",
        "unread": true,
        "starred": false
    })
}

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

// ----------------------------------------------------------------------------
// selfoss
// ----------------------------------------------------------------------------

fn selfoss_router(state: MockState) -> Router {
    Router::new()
        .route("/items", get(list_items))
        .route("/mark", post(mark_read))
        .with_state(state)
}

async fn list_items(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.recorded().item_queries.push(query);
    (
        status(state.items_status),
        [("content-type", "application/json")],
        state.items_body.as_str().to_owned(),
    )
        .into_response()
}

async fn mark_read(
    State(state): State<MockState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.recorded().marks.push(form);
    let code = state.mark_statuses.lock().unwrap().pop_front().unwrap_or(200);
    if code == 200 {
        Json(json!({"success": true})).into_response()
    } else {
        (status(code), "database is locked").into_response()
    }
}

// ----------------------------------------------------------------------------
// Discord
// ----------------------------------------------------------------------------

fn discord_router(state: MockState) -> Router {
    Router::new()
        .route("/users/@me", get(current_user))
        .route("/guilds/:guild_id", get(guild))
        .route("/guilds/:guild_id/channels", get(list_channels).post(create_channel))
        .route("/channels/:channel_id/messages", post(create_message))
        .with_state(state)
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    state.recorded().discord_requests += 1;
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bot {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "401: Unauthorized", "code": 0})),
    )
        .into_response()
}

async fn current_user(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    Json(json!({"id": "1", "username": "relay-bot"})).into_response()
}

async fn guild(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(guild_id): UrlPath<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    if guild_id != GUILD_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Unknown Guild", "code": 10004})),
        )
            .into_response();
    }
    Json(json!({"id": GUILD_ID, "name": "Test Server"})).into_response()
}

async fn list_channels(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(_guild_id): UrlPath<String>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let channels = state.channels.lock().unwrap().clone();
    Json(Value::Array(channels)).into_response()
}

async fn create_channel(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(_guild_id): UrlPath<String>,
    Json(body): Json<CreateChannel>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut channels = state.channels.lock().unwrap();
    let channel = json!({
        "id": format!("c{}", channels.len() + 1),
        "name": body.name,
        "type": body.kind,
    });
    channels.push(channel.clone());
    state.recorded().created_channels.push(body.name);
    Json(channel).into_response()
}

async fn create_message(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(channel_id): UrlPath<String>,
    Json(body): Json<CreateMessage>,
) -> Response {
    if !authorized(&state, &headers) {
        return unauthorized();
    }
    let mut recorded = state.recorded();
    recorded.send_attempts += 1;
    if state.reject_messages {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"message": "Missing Permissions", "code": 50013})),
        )
            .into_response();
    }
    recorded.messages.push((channel_id, body));
    Json(json!({"id": format!("m{}", recorded.messages.len())})).into_response()
}
