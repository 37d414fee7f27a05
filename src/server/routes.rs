use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, ImageStore, RemoveBgClient, ServerConfig};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: ImageStore,
    pub remove_bg: RemoveBgClient,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            store: ImageStore::new(config.web_root.clone()),
            remove_bg: RemoveBgClient::new(config.upstream.clone()),
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let limit = state.config.upload_limit;
    Router::new()
        .route("/api/image/remove-bg", post(remove_bg).layer(DefaultBodyLimit::max(limit)))
        .route("/api/image/upload", post(upload).layer(DefaultBodyLimit::max(limit)))
        .route("/api/image/save", post(save).layer(DefaultBodyLimit::disable()))
        .route("/:dir/:name", get(stored_file))
        .with_state(state)
}

/// First multipart field named `file`, as (file name, bytes)
async fn file_field(mut multipart: Multipart) -> Result<Option<(String, Vec<u8>)>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field.bytes().await.map_err(|err| ApiError::BadRequest(err.body_text()))?;
        return Ok(Some((name, bytes.to_vec())));
    }
    Ok(None)
}

fn no_file() -> ApiError {
    ApiError::BadRequest("No file uploaded.".to_owned())
}

async fn remove_bg(State(state): State<AppState>, multipart: Multipart) -> Result<Json<Value>, ApiError> {
    let (name, bytes) = file_field(multipart).await?.ok_or_else(no_file)?;
    log::debug!("Forwarding {} ({} bytes) to {}", name, bytes.len(), state.remove_bg.endpoint());
    let image = state.remove_bg.remove_background(&name, bytes).await?;
    Ok(Json(json!({ "image": image })))
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<Json<Value>, ApiError> {
    let (name, bytes) = file_field(multipart).await?.ok_or_else(no_file)?;
    let url = state.store.save_upload(&name, &bytes).await?;
    Ok(Json(json!({ "url": url })))
}

#[derive(Debug, Deserialize)]
struct SaveRequest {
    #[serde(default)]
    image: Option<String>,
}

async fn save(State(state): State<AppState>, Json(request): Json<SaveRequest>) -> Result<Json<Value>, ApiError> {
    let url = state.store.save_data_url(request.image.as_deref().unwrap_or_default()).await?;
    Ok(Json(json!({ "url": url })))
}

async fn stored_file(State(state): State<AppState>, Path((dir, name)): Path<(String, String)>) -> Response {
    match state.store.read(&dir, &name).await {
        Some(bytes) => ([(header::CONTENT_TYPE, content_type(&name))], bytes).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
