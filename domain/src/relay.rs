//! Streaming relay from one inbound request to one upstream call.
//!
//! [`relay`] opens the upstream call and returns the upstream's status with a
//! lazy stream of its body chunks. Nothing is buffered beyond the chunk in
//! flight. An error status is relayed like any other: its body usually says
//! what the upstream didn't like.
//! The upstream response is owned by the stream, so dropping the stream (the
//! downstream consumer went away) releases the upstream connection.

use crate::error::Error;
use crate::gateway::inference::InferenceClient;
use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::*;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use std::pin::Pin;
use url::Url;

/// Opaque request body forwarded unmodified to the upstream.
pub type RelayRequest = Map<String, Value>;

/// Upstream body chunks in arrival order. Ends when the upstream closes the
/// stream; yields a single `UpstreamStreamInterrupted` error and ends if it
/// breaks part way.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// An established upstream call: the status it answered with and its body.
pub struct RelayStream {
    pub status: StatusCode,
    pub chunks: ChunkStream,
}

/// Relay `request` to the upstream and stream its output back.
///
/// Fails with `UpstreamUnavailable` before producing anything when the
/// upstream call can't be established. Makes exactly one attempt.
pub async fn relay(gateway: &InferenceClient, request: RelayRequest) -> Result<RelayStream, Error> {
    let response = gateway.open_stream(&request).await?;
    let status = response.status();
    let lease = UpstreamLease::new(gateway.endpoint().clone());

    Ok(RelayStream {
        status,
        chunks: Box::pin(forward_chunks(response, lease)),
    })
}

fn forward_chunks(
    response: reqwest::Response,
    mut lease: UpstreamLease,
) -> impl Stream<Item = Result<Bytes, Error>> + Send {
    stream! {
        let mut upstream = response.bytes_stream();

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    lease.chunks += 1;
                    yield Ok(bytes);
                }
                Err(e) => {
                    warn!(
                        "Upstream {} broke after {} chunk(s): {e:?}",
                        lease.endpoint, lease.chunks
                    );
                    lease.outcome = Outcome::Interrupted;
                    yield Err(Error::upstream_stream_interrupted(Some(Box::new(e))));
                    break;
                }
            }
        }

        if lease.outcome == Outcome::Open {
            lease.outcome = Outcome::Completed;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Open,
    Completed,
    Interrupted,
}

/// Tracks one upstream call for the lifetime of its chunk stream and reports
/// how it ended when dropped.
struct UpstreamLease {
    endpoint: Url,
    chunks: usize,
    outcome: Outcome,
}

impl UpstreamLease {
    fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            chunks: 0,
            outcome: Outcome::Open,
        }
    }
}

impl Drop for UpstreamLease {
    fn drop(&mut self) {
        match self.outcome {
            Outcome::Completed => debug!(
                "Upstream {} stream completed after {} chunk(s)",
                self.endpoint, self.chunks
            ),
            Outcome::Interrupted => debug!(
                "Released interrupted upstream {} stream after {} chunk(s)",
                self.endpoint, self.chunks
            ),
            Outcome::Open => info!(
                "Consumer went away; released upstream {} stream after {} chunk(s)",
                self.endpoint, self.chunks
            ),
        }
    }
}
