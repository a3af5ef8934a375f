//! Unroll request handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info};
use unroller_core::source::TRANSACTION_ID_HEADER;
use unroller_core::{Content, UnrollEvent};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{ContentKind, validate};

/// The four unroll operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /content`
    Content,
    /// `POST /content-preview`
    ContentPreview,
    /// `POST /internalcontent`
    InternalContent,
    /// `POST /internalcontent-preview`
    InternalContentPreview,
}

impl Operation {
    /// Route path.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Content => "/content",
            Self::ContentPreview => "/content-preview",
            Self::InternalContent => "/internalcontent",
            Self::InternalContentPreview => "/internalcontent-preview",
        }
    }

    /// Which fields the request must carry.
    pub const fn kind(self) -> ContentKind {
        match self {
            Self::Content | Self::ContentPreview => ContentKind::Content,
            Self::InternalContent | Self::InternalContentPreview => ContentKind::InternalContent,
        }
    }
}

/// The transaction id of a request, or a fresh one.
pub fn transaction_id(headers: &HeaderMap) -> String {
    headers
        .get(TRANSACTION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|tid| !tid.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("tid_{}", Uuid::new_v4().simple()))
}

/// `POST /content`
pub async fn unroll_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, &headers, &body, Operation::Content).await
}

/// `POST /content-preview`
pub async fn unroll_content_preview(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, &headers, &body, Operation::ContentPreview).await
}

/// `POST /internalcontent`
pub async fn unroll_internal_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, &headers, &body, Operation::InternalContent).await
}

/// `POST /internalcontent-preview`
pub async fn unroll_internal_content_preview(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(&state, &headers, &body, Operation::InternalContentPreview).await
}

async fn handle(state: &AppState, headers: &HeaderMap, body: &[u8], op: Operation) -> Response {
    let tid = transaction_id(headers);
    info!(%tid, path = op.path(), "Transaction started");

    let mut response = match unroll(state, &tid, body, op).await {
        Ok(content) => (StatusCode::OK, Json(content)).into_response(),
        Err(e) => {
            if matches!(e, ApiError::Unroll(_)) {
                error!(%tid, path = op.path(), "{e}");
            } else {
                info!(%tid, path = op.path(), "Rejected request: {e}");
            }
            e.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&tid) {
        response.headers_mut().insert(TRANSACTION_ID_HEADER, value);
    }
    info!(
        %tid,
        path = op.path(),
        status = response.status().as_u16(),
        "Transaction finished"
    );
    response
}

async fn unroll(
    state: &AppState,
    tid: &str,
    body: &[u8],
    op: Operation,
) -> Result<Content, ApiError> {
    let content: Content = serde_json::from_slice(body).map_err(unroller_core::Error::from)?;
    let uuid = validate(&content, op.kind())?;
    let event = UnrollEvent::new(content, tid, uuid);

    let unroller = &state.unroller;
    let unrolled = match op {
        Operation::Content => unroller.unroll_content(&event).await?,
        Operation::ContentPreview => unroller.unroll_content_preview(&event).await?,
        Operation::InternalContent => unroller.unroll_internal_content(&event).await?,
        Operation::InternalContentPreview => {
            unroller.unroll_internal_content_preview(&event).await?
        }
    };
    Ok(unrolled)
}
