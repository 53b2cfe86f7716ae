/// HTTP backing API.
///
/// Serves the WhatsApp and YouTube routes the failover client calls, plus
/// the health endpoints it probes. Everything under `/api/whatsapp` and
/// `/api/youtube` requires the shared secret in `x-secret`.
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use subtle::ConstantTimeEq;
use tracing::{debug, error, info, warn};

use crate::client::SECRET_HEADER;
use crate::errors::ServiceError;
use crate::health::HealthService;
use crate::models::{
    ApiError, CreatePlaylistRequest, MessageEnvelope, QrCode, SendMessageRequest, SongRequest,
};
use crate::whatsapp::WhatsAppService;
use crate::youtube::YouTubeService;

/// Request bodies above this are rejected (1 MB).
const MAX_BODY_SIZE: usize = 1_048_576;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub whatsapp: WhatsAppService,
    pub youtube: Arc<YouTubeService>,
    pub health: Arc<HealthService>,
    /// Expected `x-secret`. `None` rejects every protected request.
    pub secret: Option<Arc<str>>,
}

/// A service failure rendered as `{ "error": ... }`.
struct ApiFailure(StatusCode, String);

impl From<ServiceError> for ApiFailure {
    fn from(err: ServiceError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self(status, err.to_string())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(ApiError { error: self.1 })).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiFailure>;

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ApiError {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Decode a JSON body, treating an empty body as `{}`.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> std::result::Result<T, ServiceError> {
    if body.len() > MAX_BODY_SIZE {
        return Err(ServiceError::InvalidInput("Request body too large".into()));
    }
    let raw: &[u8] = if body.is_empty() { b"{}" } else { body };
    serde_json::from_slice(raw)
        .map_err(|e| ServiceError::InvalidInput(format!("Invalid request body: {}", e)))
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/whatsapp/missedMessages/{phone_number}/{count}",
            get(missed_messages_handler),
        )
        .route(
            "/api/whatsapp/lookupContact/{contact_name}",
            get(lookup_contact_handler),
        )
        .route(
            "/api/whatsapp/sendMessage/{phone_number}",
            post(send_message_handler),
        )
        .route("/api/whatsapp/getAllContacts", get(all_contacts_handler))
        .route("/api/whatsapp/getAllChats", get(all_chats_handler))
        .route("/api/whatsapp/status", get(status_handler))
        .route("/api/whatsapp/qr", get(qr_handler))
        .route(
            "/api/youtube/playlist",
            get(playlists_handler).post(create_playlist_handler),
        )
        .route(
            "/api/youtube/playlist/{playlist_id}/songs",
            get(playlist_songs_handler),
        )
        .route(
            "/api/youtube/playlist/{playlist_id}/add-song",
            post(add_song_handler),
        )
        .route(
            "/api/youtube/playlist/{playlist_id}/delete-song",
            post(delete_song_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_secret,
        ));

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/health/detailed", get(detailed_health_handler))
        .merge(protected)
        .with_state(state)
}

/// Constant-time check of the `x-secret` header.
async fn require_secret(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.secret.as_deref().filter(|s| !s.is_empty()) else {
        error!("request rejected: no shared secret configured");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
        );
    };
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        warn!("unauthorized request to {}", request.uri().path());
        return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    next.run(request).await
}

/// GET /api/health
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.check_system();
    let status = if report.status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// GET /api/health/detailed
async fn detailed_health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.detailed(&state.whatsapp);
    let status = if report.overall.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

async fn missed_messages_handler(
    State(state): State<AppState>,
    Path((phone_number, count)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let count: u32 = count.parse().map_err(|_| {
        ServiceError::InvalidInput(format!(
            "numberOfRecords must be a positive integer, got '{}'",
            count
        ))
    })?;
    let messages = state.whatsapp.get_messages(&phone_number, count).await?;
    debug!(
        "returned {} messages for {}",
        messages.messages.len(),
        phone_number
    );
    Ok(Json(messages))
}

async fn lookup_contact_handler(
    State(state): State<AppState>,
    Path(contact_name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.whatsapp.lookup_contact(&contact_name).await?))
}

async fn send_message_handler(
    State(state): State<AppState>,
    Path(phone_number): Path<String>,
    body: Bytes,
) -> ApiResult<String> {
    let request: SendMessageRequest = parse_body(&body)?;
    if request.message.is_empty() {
        return Err(ServiceError::InvalidInput("Message is required".into()).into());
    }
    Ok(state
        .whatsapp
        .send_message(&phone_number, &request.message)
        .await?)
}

async fn all_contacts_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.whatsapp.get_all_contacts().await?))
}

async fn all_chats_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.whatsapp.get_all_chats().await?))
}

async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.whatsapp.status())
}

async fn qr_handler(State(state): State<AppState>) -> Response {
    match state.whatsapp.qr_code() {
        Some(qr_code) => Json(QrCode { qr_code }).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "QR code not available"),
    }
}

async fn playlists_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.youtube.get_playlists().await?))
}

async fn create_playlist_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<MessageEnvelope>> {
    let request: CreatePlaylistRequest = parse_body(&body)?;
    let message = state
        .youtube
        .create_playlist(&request.playlist_name, &request.description)
        .await?;
    Ok(Json(MessageEnvelope { message }))
}

async fn playlist_songs_handler(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.youtube.get_playlist_songs(&playlist_id).await?))
}

async fn add_song_handler(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<MessageEnvelope>> {
    let request: SongRequest = parse_body(&body)?;
    let message = state
        .youtube
        .add_song(&playlist_id, &request.song_name)
        .await?;
    Ok(Json(MessageEnvelope { message }))
}

async fn delete_song_handler(
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<MessageEnvelope>> {
    let request: SongRequest = parse_body(&body)?;
    let message = state
        .youtube
        .delete_song(&playlist_id, &request.song_name)
        .await?;
    Ok(Json(MessageEnvelope { message }))
}

/// Bind `host:port` and serve until `shutdown` resolves. Returns the
/// server task and the bound address (useful with port 0).
pub async fn start(
    host: &str,
    port: u16,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(tokio::task::JoinHandle<()>, SocketAddr)> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let local = listener.local_addr()?;
    info!("backing API listening on http://{}", local);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("backing API server error: {}", e);
        }
    });
    Ok((handle, local))
}
