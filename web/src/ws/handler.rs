use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use domain::chat as ChatApi;
use futures::{SinkExt, StreamExt};
use log::*;
use session::{ClientId, Error as SessionError, Manager};
use std::sync::Arc;
use tokio::sync::mpsc;

/// WebSocket handler for a client's chat session. The client id comes from
/// the path and is not required to be unique.
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<ClientId>,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    debug!("Upgrading WebSocket connection for client {client_id}");

    let manager = app_state.session_manager.clone();
    ws.on_upgrade(move |socket| run_session(socket, client_id, manager))
}

/// Runs one session from the completed handshake until disconnect.
///
/// The socket is split: a writer task drains the connection's outbound
/// channel into the socket while the reader loop acknowledges inbound
/// frames. Whichever side ends first ends the session, after which the
/// connection is deregistered and the departure is announced to everyone
/// else.
async fn run_session(socket: WebSocket, client_id: ClientId, manager: Arc<Manager>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection_id = manager.register_connection(client_id.clone(), tx);

    let mut writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            ws_tx.send(Message::Text(text.into())).await?;
        }
        Ok::<(), axum::Error>(())
    });

    let mut reader = {
        let manager = manager.clone();
        let client_id = client_id.clone();
        let connection_id = connection_id.clone();

        tokio::spawn(async move {
            while let Some(frame) = ws_rx.next().await {
                match frame {
                    Ok(Message::Text(text)) => acknowledge(&manager, &client_id, text.as_str()),
                    Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                        Ok(text) => acknowledge(&manager, &client_id, text),
                        Err(_) => debug!(
                            "Ignoring non-UTF-8 binary frame ({} bytes) from client {client_id}",
                            data.len()
                        ),
                    },
                    Ok(Message::Close(_)) => {
                        debug!("Client {client_id} sent close frame");
                        return None;
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Err(e) => return Some(SessionError::transport_disconnect(&connection_id, e)),
                }
            }
            None
        })
    };

    let disconnect = tokio::select! {
        outcome = &mut reader => outcome.ok().flatten(),
        outcome = &mut writer => match outcome {
            Ok(Err(e)) => Some(SessionError::transport_disconnect(&connection_id, e)),
            _ => None,
        },
    };

    match disconnect {
        Some(e) => warn!("{e}"),
        None => debug!(
            "Client {client_id} closed connection {}",
            connection_id.as_str()
        ),
    }

    // Deregister before stopping the writer; a send must never be accepted
    // into a channel nobody drains.
    let departure = ChatApi::depart(&manager, &connection_id, &client_id);
    writer.abort();
    reader.abort();

    match departure {
        Ok(delivery) => info!(
            "Client {client_id} left ({delivery:?}, {} connection(s) remain)",
            manager.connection_count()
        ),
        Err(e) => warn!("Client {client_id} left but the departure was not announced: {e}"),
    }
}

fn acknowledge(manager: &Manager, client_id: &str, text: &str) {
    if let Err(e) = ChatApi::acknowledge(manager, client_id, text) {
        debug!("Dropped acknowledgement for client {client_id}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use crate::{router::define_routes, AppState};
    use clap::Parser;
    use futures::{SinkExt, StreamExt};
    use service::config::Config;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn spawn_gateway() -> SocketAddr {
        let config =
            Config::try_parse_from(["gateway", "--upstream-base-url", "http://127.0.0.1:9/"])
                .unwrap();
        let app = define_routes(AppState::new(config).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn connect(addr: SocketAddr, client_id: &str) -> Client {
        let (client, _) = connect_async(format!("ws://{addr}/api/ws/{client_id}"))
            .await
            .unwrap();
        client
    }

    async fn next_text(client: &mut Client) -> Option<String> {
        loop {
            match tokio::time::timeout(Duration::from_secs(2), client.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => return Some(text.to_string()),
                Ok(Some(Ok(_))) => continue,
                _ => return None,
            }
        }
    }

    async fn nothing_within(client: &mut Client, wait: Duration) -> bool {
        !matches!(
            tokio::time::timeout(wait, client.next()).await,
            Ok(Some(Ok(Message::Text(_))))
        )
    }

    #[tokio::test]
    async fn test_frame_is_acknowledged_and_departure_broadcast() {
        let addr = spawn_gateway().await;
        let mut seven = connect(addr, "7").await;
        let mut eight = connect(addr, "8").await;

        // A round trip proves each connection is registered
        eight.send(Message::Text("ping".into())).await.unwrap();
        assert_eq!(next_text(&mut eight).await.as_deref(), Some("You wrote: ping"));

        seven.send(Message::Text("hello".into())).await.unwrap();
        assert_eq!(
            next_text(&mut seven).await.as_deref(),
            Some("You wrote: hello")
        );

        seven.close(None).await.unwrap();

        assert_eq!(
            next_text(&mut eight).await.as_deref(),
            Some("Client #7 left the chat")
        );
    }

    #[tokio::test]
    async fn test_duplicate_client_id_acknowledges_on_earliest_connection() {
        let addr = spawn_gateway().await;
        let mut first = connect(addr, "7").await;
        first.send(Message::Text("hello".into())).await.unwrap();
        assert_eq!(
            next_text(&mut first).await.as_deref(),
            Some("You wrote: hello")
        );

        let mut second = connect(addr, "7").await;
        second.send(Message::Text("hi".into())).await.unwrap();

        assert_eq!(next_text(&mut first).await.as_deref(), Some("You wrote: hi"));
        assert!(nothing_within(&mut second, Duration::from_millis(200)).await);
    }

    #[tokio::test]
    async fn test_closed_connection_hands_client_id_to_next_connection() {
        let addr = spawn_gateway().await;
        let mut first = connect(addr, "7").await;
        first.send(Message::Text("hello".into())).await.unwrap();
        assert_eq!(
            next_text(&mut first).await.as_deref(),
            Some("You wrote: hello")
        );

        // Acknowledged on the first connection, but only once the second is registered
        let mut second = connect(addr, "7").await;
        second.send(Message::Text("hi".into())).await.unwrap();
        assert_eq!(next_text(&mut first).await.as_deref(), Some("You wrote: hi"));

        first.close(None).await.unwrap();

        // The departure reaching the second connection means the first is gone
        assert_eq!(
            next_text(&mut second).await.as_deref(),
            Some("Client #7 left the chat")
        );

        second.send(Message::Text("still here".into())).await.unwrap();
        assert_eq!(
            next_text(&mut second).await.as_deref(),
            Some("You wrote: still here")
        );
    }

    #[tokio::test]
    async fn test_acknowledgements_keep_send_order() {
        let addr = spawn_gateway().await;
        let mut client = connect(addr, "42").await;

        for text in ["one", "two", "three"] {
            client.send(Message::Text(text.into())).await.unwrap();
        }

        assert_eq!(next_text(&mut client).await.as_deref(), Some("You wrote: one"));
        assert_eq!(next_text(&mut client).await.as_deref(), Some("You wrote: two"));
        assert_eq!(
            next_text(&mut client).await.as_deref(),
            Some("You wrote: three")
        );
    }

    #[tokio::test]
    async fn test_dropped_connection_is_announced() {
        let addr = spawn_gateway().await;
        let mut watcher = connect(addr, "1").await;
        watcher.send(Message::Text("ping".into())).await.unwrap();
        assert_eq!(next_text(&mut watcher).await.as_deref(), Some("You wrote: ping"));

        let mut leaver = connect(addr, "2").await;
        leaver.send(Message::Text("ping".into())).await.unwrap();
        assert_eq!(next_text(&mut leaver).await.as_deref(), Some("You wrote: ping"));

        // No close handshake, just gone
        drop(leaver);

        assert_eq!(
            next_text(&mut watcher).await.as_deref(),
            Some("Client #2 left the chat")
        );
    }
}
