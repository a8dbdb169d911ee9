//! HTTP client for the upstream inference service.
//!
//! The upstream is treated as an opaque streaming endpoint: the request body
//! is forwarded as-is and the response body is handed back unread so the
//! caller can stream it.

use crate::error::Error;
use log::*;
use serde_json::{Map, Value};
use service::config::Config;
use std::time::Duration;
use url::Url;

/// Client for the single configured upstream endpoint.
///
/// The underlying `reqwest::Client` pools connections and is shared; each
/// call to [`InferenceClient::open_stream`] gets its own response.
pub struct InferenceClient {
    client: reqwest::Client,
    endpoint: Url,
    first_byte_timeout: Duration,
}

impl InferenceClient {
    /// Create a client for the upstream named in the configuration
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::from_parts(
            config.upstream_base_url().clone(),
            config.upstream_connect_timeout(),
            config.upstream_first_byte_timeout(),
        )
    }

    pub fn from_parts(
        endpoint: Url,
        connect_timeout: Duration,
        first_byte_timeout: Duration,
    ) -> Result<Self, Error> {
        // No overall request timeout: a healthy stream may run for minutes.
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            first_byte_timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// POST `payload` to the upstream and wait for its response headers.
    ///
    /// Anything that stops the call from getting that far is reported as
    /// `UpstreamUnavailable`: connection or DNS failure, or the connect or
    /// first-byte timeout. Once headers arrive the call is established,
    /// whatever its status; an error status comes back with its body unread
    /// so the caller can relay the upstream's explanation.
    pub async fn open_stream(&self, payload: &Map<String, Value>) -> Result<reqwest::Response, Error> {
        debug!(
            "Opening upstream stream to {} ({} top-level field(s))",
            self.endpoint,
            payload.len()
        );

        let request = self
            .client
            .post(self.endpoint.clone())
            .json(payload)
            .send();

        let response = match tokio::time::timeout(self.first_byte_timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Failed to reach upstream {}: {e:?}", self.endpoint);
                return Err(Error::upstream_unavailable(Some(Box::new(e))));
            }
            Err(elapsed) => {
                warn!(
                    "Upstream {} did not respond within {:?}",
                    self.endpoint, self.first_byte_timeout
                );
                return Err(Error::upstream_unavailable(Some(Box::new(elapsed))));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Upstream {} accepted the stream ({})", self.endpoint, status);
        } else {
            warn!("Upstream {} answered with {}", self.endpoint, status);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn client_for(endpoint: &str) -> InferenceClient {
        InferenceClient::from_parts(
            Url::parse(endpoint).unwrap(),
            Duration::from_secs(2),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn payload() -> Map<String, Value> {
        json!({ "model": "llama3", "stream": true, "messages": [{ "role": "user", "content": "hi" }] })
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_new_uses_configured_upstream() {
        let config = Config::try_parse_from([
            "gateway",
            "--upstream-base-url",
            "http://inference.internal:11434/api/chat",
        ])
        .unwrap();

        let client = InferenceClient::new(&config).unwrap();

        assert_eq!(
            client.endpoint().as_str(),
            "http://inference.internal:11434/api/chat"
        );
    }

    #[tokio::test]
    async fn test_open_stream_forwards_payload_verbatim() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "model": "llama3",
                "stream": true,
                "messages": [{ "role": "user", "content": "hi" }]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&format!("{}/api/chat", server.url()));
        let response = client.open_stream(&payload()).await.unwrap();

        assert!(response.status().is_success());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_stream_hands_back_error_status_with_body() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(503)
            .with_body("model is loading")
            .create_async()
            .await;

        let client = client_for(&format!("{}/", server.url()));
        let response = client.open_stream(&payload()).await.unwrap();

        assert_eq!(response.status().as_u16(), 503);
        assert_eq!(response.text().await.unwrap(), "model is loading");
    }

    #[tokio::test]
    async fn test_open_stream_maps_refused_connection_to_upstream_unavailable() {
        // Grab a free port, then release it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}/"));
        let err = client.open_stream(&payload()).await.unwrap_err();

        assert!(err.is_upstream_unavailable());
    }

    #[tokio::test]
    async fn test_open_stream_times_out_waiting_for_headers() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            // Accept and hold the socket without ever answering
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let client = InferenceClient::from_parts(
            Url::parse(&format!("http://{addr}/")).unwrap(),
            Duration::from_secs(2),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = client.open_stream(&payload()).await.unwrap_err();

        assert!(err.is_upstream_unavailable());
        silent.abort();
    }
}
