use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use domain::InferenceClient;
use log::*;
use service::config::Config;
use session::Manager;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
pub mod router;
mod ws;

pub use error::{Error, Result};

/// State shared by every handler: the configuration, the chat session
/// registry and the upstream inference client.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session_manager: Arc<Manager>,
    pub inference_client: Arc<InferenceClient>,
}

impl AppState {
    pub fn new(config: Config) -> core::result::Result<Self, domain::error::Error> {
        let inference_client = Arc::new(InferenceClient::new(&config)?);

        Ok(Self {
            config,
            session_manager: Arc::new(Manager::new()),
            inference_client,
        })
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let host = app_state.config.interface().to_string();
    let port = app_state.config.port;
    let server_url = format!("{host}:{port}");

    info!(
        "Starting gateway on {server_url} ({}), relaying to {}",
        app_state.config.runtime_env(),
        app_state.config.upstream_base_url()
    );

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin `{origin}`: {e}");
                None
            }
        })
        .collect();

    info!("allowed_origins: {:#?}", allowed_origins);

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(allowed_origins);

    let listener = TcpListener::bind(&server_url).await?;

    axum::serve(
        listener,
        router::define_routes(app_state).layer(cors_layer),
    )
    .await
}
