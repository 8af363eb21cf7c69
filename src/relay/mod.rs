pub mod client;

use std::io::ErrorKind;

use axum::body::{self, Body};
use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;

use crate::error::AppError;
use crate::message::Reply;
use crate::pages;
use crate::state::SharedState;

pub use self::client::{RelayClient, RelayError};

/// Forward a form body to the store and redirect home once it is stored.
pub async fn submit(
    State(state): State<SharedState>,
    request: Request,
) -> Result<Response, AppError> {
    let limit = state.config.max_body_size;

    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .ok_or(AppError::LengthRequired)?
        .to_str()
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| AppError::BadRequest("Invalid Content-Length header.".to_string()))?;

    if declared > limit {
        return Err(AppError::PayloadTooLarge(limit));
    }

    let payload = body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|_| AppError::PayloadTooLarge(limit))?;

    match state.relay.round_trip(&payload).await {
        Ok(Reply::Ack) => Ok((StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()),
        Ok(Reply::Malformed) => Err(AppError::BadRequest(
            "The message could not be read. Every field needs a name and a value.".to_string(),
        )),
        Ok(Reply::StorageFailed) => Err(AppError::Internal(
            "store failed to persist the message".to_string(),
        )),
        Err(RelayError::Timeout) => Err(AppError::GatewayTimeout),
        Err(RelayError::UnexpectedReply(reply)) => {
            Err(AppError::BadGateway(format!("unexpected store reply {reply:?}")))
        }
        Err(RelayError::Io(err)) if err.kind() == ErrorKind::ConnectionRefused => Err(
            AppError::BadGateway(format!("store at {} is unreachable", state.relay.store_addr())),
        ),
        Err(err) => Err(AppError::Internal(err.to_string())),
    }
}

/// Any other path: POST is a submission, everything else is a static file
/// under the web root or the 404 page.
pub async fn fallback(State(state): State<SharedState>, request: Request) -> Response {
    if request.method() == Method::POST {
        return submit(State(state), request).await.into_response();
    }

    match state.static_files.clone().oneshot(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => pages::not_found().await,
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}
