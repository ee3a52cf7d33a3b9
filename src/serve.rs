use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc as StdArc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::config::ServeConfig;
use crate::constants::PLACEHOLDER_RECORDING_DURATION_SECS;
use crate::credentials;
use crate::recording::{playback_url, HttpRecordingApi, RecordingCoordinator};
use crate::storage::StorageClient;
use crate::store::MeetingStore;

// State for API handlers
pub struct AppState {
    pub store: MeetingStore,
    pub recording: StdArc<RecordingCoordinator>,
    pub storage: Option<StorageClient>,
    pub rtc_app_id: String,
    pub s3_bucket_fallback: String,
}

/// Build the API router with CORS for a prepared state
pub fn build_router(state: StdArc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/meetings", post(create_meeting_handler))
        .route("/api/meetings/{id}", get(get_meeting_handler))
        .route("/api/meetings/{id}/join", post(join_meeting_handler))
        .route("/api/recording/start", post(recording_start_handler))
        .route("/api/recording/stop", post(recording_stop_handler))
        .route("/api/recording/{meeting_id}/info", get(recording_info_handler))
        .route("/api/upload", post(upload_handler))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server for a validated config
pub fn serve(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Starting meeting API server");
    println!("Database: {}", config.db_path.display());
    println!("Listening on: http://[::]:{} (IPv4 + IPv6)", config.api_port);
    println!("Endpoints:");
    println!("  GET  /health  - Health check");
    println!("  POST /api/meetings  - Create a meeting");
    println!("  GET  /api/meetings/:id  - Fetch a meeting record");
    println!("  POST /api/meetings/:id/join  - Add a participant");
    println!("  POST /api/recording/start  - Start cloud recording");
    println!("  POST /api/recording/stop  - Stop cloud recording");
    println!("  GET  /api/recording/:meeting_id/info  - Recording playback info");
    println!("  POST /api/upload  - Upload a file to object storage");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let pool = crate::db::open_database(&config.db_path)
            .await
            .map_err(|e| format!("Failed to open database: {}", e))?;
        crate::db::init_database_schema(&pool)
            .await
            .map_err(|e| format!("Failed to initialize database schema: {}", e))?;
        crate::db::check_database_version(&pool)
            .await
            .map_err(|e| format!("Database version check failed: {}", e))?;

        let recording_api = StdArc::new(HttpRecordingApi::new(&config.recording.base_url));
        let app_state = StdArc::new(AppState {
            store: MeetingStore::new(pool),
            recording: StdArc::new(RecordingCoordinator::new(recording_api)),
            storage: config.storage.as_ref().map(StorageClient::new),
            rtc_app_id: config.rtc.app_id.clone(),
            s3_bucket_fallback: config.recording.s3_bucket.clone(),
        });

        let app = build_router(app_state);

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", config.api_port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", config.api_port, e))?;
        axum::serve(listener, app)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[derive(Deserialize)]
pub struct CreateMeetingRequest {
    #[serde(default)]
    pub title: String,
    /// Optional caller-chosen meeting id; a random one is generated when absent
    pub custom_id: Option<String>,
    pub host_id: String,
    #[serde(default)]
    pub host_name: String,
}

async fn create_meeting_handler(
    State(state): State<StdArc<AppState>>,
    Json(request): Json<CreateMeetingRequest>,
) -> impl IntoResponse {
    if request.host_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "host_id is required").into_response();
    }

    match state
        .store
        .create_meeting(
            &request.title,
            request.custom_id.as_deref(),
            &request.host_id,
            &request.host_name,
            &state.rtc_app_id,
        )
        .await
    {
        Ok(meeting) => (StatusCode::CREATED, Json(meeting)).into_response(),
        Err(e) if e.to_string().contains("already exists") => {
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
        Err(e) => {
            error!("Failed to create meeting: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create meeting").into_response()
        }
    }
}

async fn get_meeting_handler(
    State(state): State<StdArc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_meeting(&id).await {
        Ok(Some(meeting)) => Json(meeting).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Meeting not found").into_response(),
        Err(e) => {
            error!("Failed to fetch meeting '{}': {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch meeting").into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct JoinMeetingRequest {
    pub user_id: String,
}

async fn join_meeting_handler(
    State(state): State<StdArc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<JoinMeetingRequest>,
) -> impl IntoResponse {
    if request.user_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "user_id is required").into_response();
    }

    match state.store.add_participant(&id, &request.user_id).await {
        Ok(meeting) => Json(meeting).into_response(),
        Err(e) if e.to_string().contains("not found") => {
            (StatusCode::NOT_FOUND, "Meeting not found").into_response()
        }
        Err(e) => {
            error!("Failed to join meeting '{}': {}", id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to join meeting").into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct RecordingStartRequest {
    pub meeting_id: String,
    pub uid: String,
}

#[derive(Serialize)]
pub struct RecordingStartResponse {
    pub resource_id: String,
    pub sid: String,
}

async fn recording_start_handler(
    State(state): State<StdArc<AppState>>,
    Json(request): Json<RecordingStartRequest>,
) -> impl IntoResponse {
    if request.meeting_id.trim().is_empty() || request.uid.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "meeting_id and uid are required").into_response();
    }

    match state
        .recording
        .start(&state.store, &request.meeting_id, &request.uid)
        .await
    {
        Ok(handle) => Json(RecordingStartResponse {
            resource_id: handle.resource_id,
            sid: handle.sid,
        })
        .into_response(),
        Err(e) if e.to_string().contains("not found") => {
            (StatusCode::NOT_FOUND, "Meeting not found").into_response()
        }
        Err(e) => {
            error!(
                "Failed to start recording for meeting '{}': {}",
                request.meeting_id, e
            );
            (StatusCode::BAD_GATEWAY, "Failed to start recording").into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct RecordingStopRequest {
    pub meeting_id: String,
    pub uid: String,
}

#[derive(Serialize)]
pub struct RecordingInfoResponse {
    pub url: String,
    pub duration: u32,
}

async fn recording_stop_handler(
    State(state): State<StdArc<AppState>>,
    Json(request): Json<RecordingStopRequest>,
) -> impl IntoResponse {
    if request.meeting_id.trim().is_empty() || request.uid.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "meeting_id and uid are required").into_response();
    }

    let bucket = match credentials::s3_bucket(&state.s3_bucket_fallback) {
        Ok(bucket) => bucket,
        Err(e) => {
            error!("Recording stop misconfigured: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Recording storage not configured")
                .into_response();
        }
    };

    match state
        .recording
        .stop(&state.store, &request.meeting_id, &request.uid, &bucket)
        .await
    {
        Ok(entry) => Json(RecordingInfoResponse {
            url: entry.url,
            duration: entry.duration_secs,
        })
        .into_response(),
        Err(e) if e.to_string().contains("No active recording") => {
            (StatusCode::BAD_REQUEST, "No active recording for this meeting").into_response()
        }
        Err(e) if e.to_string().contains("not found") => {
            (StatusCode::NOT_FOUND, "Meeting not found").into_response()
        }
        Err(e) => {
            error!(
                "Failed to stop recording for meeting '{}': {}",
                request.meeting_id, e
            );
            (StatusCode::BAD_GATEWAY, "Failed to stop recording").into_response()
        }
    }
}

async fn recording_info_handler(
    State(state): State<StdArc<AppState>>,
    Path(meeting_id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_meeting(&meeting_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "Meeting not found").into_response(),
        Err(e) => {
            error!("Failed to fetch meeting '{}': {}", meeting_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch meeting").into_response();
        }
    }

    let bucket = match credentials::s3_bucket(&state.s3_bucket_fallback) {
        Ok(bucket) => bucket,
        Err(e) => {
            error!("Recording info misconfigured: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Recording storage not configured")
                .into_response();
        }
    };

    // The playback URL follows the vendor's fixed object layout and the
    // duration is a placeholder; neither is derived from recording metadata.
    Json(RecordingInfoResponse {
        url: playback_url(&bucket, &meeting_id),
        duration: PLACEHOLDER_RECORDING_DURATION_SECS,
    })
    .into_response()
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

async fn upload_handler(
    State(state): State<StdArc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let storage = match &state.storage {
        Some(storage) => storage,
        None => {
            warn!("Upload rejected: object storage is not configured");
            return (StatusCode::SERVICE_UNAVAILABLE, "Object storage not configured")
                .into_response();
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, format!("Invalid multipart body: {}", e))
                    .into_response()
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|name| name.to_string())
            .unwrap_or_else(|| "upload.bin".to_string());
        let content_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                return (StatusCode::BAD_REQUEST, format!("Failed to read upload: {}", e))
                    .into_response()
            }
        };

        let path = format!("uploads/{}_{}", Uuid::new_v4(), filename);
        return match storage.upload(&path, &content_type, bytes).await {
            Ok(url) => Json(UploadResponse { url }).into_response(),
            Err(e) => {
                error!("Failed to upload '{}': {}", path, e);
                (StatusCode::BAD_GATEWAY, "Failed to upload file").into_response()
            }
        };
    }

    (StatusCode::BAD_REQUEST, "Missing 'file' field in multipart body").into_response()
}
