use crate::{AppState, Error};
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use domain::relay as RelayApi;
use domain::RelayRequest;
use log::*;

/// POST a request to the upstream inference service and stream its output back
///
/// The body is forwarded verbatim. The upstream's status is passed through and
/// its chunks are relayed as they arrive, error bodies included. The
/// `application/json` content type is a label only; individual chunks are raw
/// fragments of the upstream output.
#[utoipa::path(
    post,
    path = "/api/ai",
    request_body(content = Object, description = "Opaque payload forwarded to the upstream", content_type = "application/json"),
    responses(
        (status = 200, description = "Upstream output, streamed as it is produced", content_type = "application/json"),
        (status = "4XX", description = "Upstream rejected the request; its error body is relayed", content_type = "application/json"),
        (status = 415, description = "Request body is not JSON"),
        (status = 422, description = "Request body is not a JSON object"),
        (status = 502, description = "The upstream could not be reached or refused the call")
    )
)]
pub async fn relay(
    State(app_state): State<AppState>,
    Json(request): Json<RelayRequest>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST relay request with {} top-level field(s)", request.len());

    let relayed = RelayApi::relay(&app_state.inference_client, request).await?;

    Ok((
        relayed.status,
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(relayed.chunks),
    ))
}
