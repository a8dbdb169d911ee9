use crate::controller::{health_check_controller, relay_controller};
use crate::{ws, AppState};
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Inference Gateway API"
        ),
        paths(
            health_check_controller::health_check,
            relay_controller::relay,
        ),
        tags(
            (name = "inference_gateway", description = "Chat sessions and streaming inference relay")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(relay_routes(app_state.clone()))
        .merge(chat_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn relay_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/ai", post(relay_controller::relay))
        .with_state(app_state)
}

fn chat_routes(app_state: AppState) -> Router {
    Router::new()
        // The upgrade happens in the handler; every other method is rejected
        .route("/api/ws/{client_id}", get(ws::handler::ws_handler))
        .with_state(app_state)
}
