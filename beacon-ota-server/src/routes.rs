// HTTP handlers and routing.

use std::{
    io::{self, ErrorKind},
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use axum::{
    Json, Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::get,
};
use beacon_ota_domain::{
    firmware::{ArtifactInfo, FirmwareArtifact, FirmwareImage},
    request::{Outcome, RequestRecord},
    uptime::format_uptime,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub artifact: Arc<FirmwareArtifact>,
    pub records: mpsc::Sender<RequestRecord>,
    pub started: DateTime<Utc>,
    pub served: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(artifact: FirmwareArtifact, records: mpsc::Sender<RequestRecord>) -> AppState {
        AppState {
            artifact: Arc::new(artifact),
            records,
            started: Utc::now(),
            served: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queues the record for the sink task; never waits on the sink.
    fn record(&self, client: SocketAddr, method: &Method, uri: &Uri, outcome: Outcome) {
        let record = RequestRecord::new(Utc::now(), client, method.as_str(), uri.path(), outcome);
        match self.records.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => warn!("request log queue full, dropped: {record}"),
            Err(TrySendError::Closed(record)) => warn!("request log closed, dropped: {record}"),
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    firmware: Option<ArtifactInfo>,
    uptime: String,
    requests_served: u64,
}

/// `/health` and `/status` are operator endpoints and are not recorded.
/// Every other request ends up in `firmware` and is recorded exactly once.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .fallback(firmware)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health() -> &'static str {
    "OK"
}

async fn status(State(app_state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        firmware: app_state.artifact.stat().await.ok(),
        uptime: format_uptime(app_state.started, Utc::now()),
        requests_served: app_state.served.load(Ordering::Relaxed),
    })
}

enum Reply {
    NotModified(ArtifactInfo),
    Head(ArtifactInfo),
    Full(FirmwareImage),
}

/// Anything that is not a built-in route. Only `GET`/`HEAD` of the configured
/// firmware name is served; the file is read fresh on every request.
async fn firmware(
    State(app_state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let artifact = &app_state.artifact;
    if uri.path().strip_prefix('/') != Some(artifact.name()) {
        app_state.record(client, &method, &uri, Outcome::Rejected { status: 404 });
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    if method != Method::GET && method != Method::HEAD {
        app_state.record(client, &method, &uri, Outcome::Rejected { status: 405 });
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, HeaderValue::from_static("GET, HEAD"))],
            "Method Not Allowed",
        )
            .into_response();
    }

    let (outcome, response) = match reply(artifact, &method, if_modified_since(&headers)).await {
        Ok(Reply::NotModified(info)) => (
            Outcome::NotModified,
            (StatusCode::NOT_MODIFIED, validators(&info)).into_response(),
        ),
        Ok(Reply::Head(info)) => (
            Outcome::Served { bytes: 0 },
            firmware_response(artifact, &info, Body::empty()),
        ),
        Ok(Reply::Full(image)) => {
            app_state.served.fetch_add(1, Ordering::Relaxed);
            (
                Outcome::Served {
                    bytes: image.info.size,
                },
                firmware_response(artifact, &image.info, Body::from(image.bytes)),
            )
        }
        Err(e) if e.kind() == ErrorKind::NotFound => (
            Outcome::NotFound,
            (StatusCode::NOT_FOUND, "Firmware not found").into_response(),
        ),
        Err(e) => (
            Outcome::Failed {
                reason: format!("{}: {e}", artifact.path().display()),
            },
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read firmware").into_response(),
        ),
    };

    app_state.record(client, &method, &uri, outcome);
    response
}

/// Only a stat is needed for HEAD and for conditional requests that turn out
/// unchanged.
async fn reply(
    artifact: &FirmwareArtifact,
    method: &Method,
    since: Option<DateTime<Utc>>,
) -> io::Result<Reply> {
    if method == Method::HEAD || since.is_some() {
        let info = artifact.stat().await?;
        if not_modified(&info, since) {
            return Ok(Reply::NotModified(info));
        }
        if method == Method::HEAD {
            return Ok(Reply::Head(info));
        }
    }
    Ok(Reply::Full(artifact.read().await?))
}

fn if_modified_since(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let value = headers.get(header::IF_MODIFIED_SINCE)?.to_str().ok()?;
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|since| since.with_timezone(&Utc))
}

/// HTTP dates have whole-second precision.
fn not_modified(info: &ArtifactInfo, since: Option<DateTime<Utc>>) -> bool {
    match (info.modified, since) {
        (Some(modified), Some(since)) => modified.timestamp() <= since.timestamp(),
        _ => false,
    }
}

fn http_date(date_time: DateTime<Utc>) -> String {
    date_time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn validators(info: &ArtifactInfo) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(value) = info
        .modified
        .and_then(|modified| HeaderValue::from_str(&http_date(modified)).ok())
    {
        headers.insert(header::LAST_MODIFIED, value);
    }
    headers
}

fn firmware_response(artifact: &FirmwareArtifact, info: &ArtifactInfo, body: Body) -> Response {
    let disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", artifact.name()))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
    let mut headers = validators(info);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(info.size));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    (StatusCode::OK, headers, body).into_response()
}
