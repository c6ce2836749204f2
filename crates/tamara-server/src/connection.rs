//! Per-connection handler: register, then pump frames both ways.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::app::AppContext;
use crate::protocol::ServerEvent;
use crate::session::ConnectionSession;

const OUTBOUND_BUFFER: usize = 256;

/// Handle a single WebSocket connection until it closes.
pub async fn handle_connection(ws: WebSocketStream<TcpStream>, addr: SocketAddr, ctx: AppContext) {
    let (mut sink, mut stream) = ws.split();

    let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);
    let session = ConnectionSession::new(&ctx, tx.clone());
    let id = session.id().clone();
    ctx.connections.register(id.clone(), addr, tx).await;

    loop {
        tokio::select! {
            _ = ctx.shutdown.cancelled() => break,

            // Turn events and broadcasts → this client's WebSocket
            Some(event) = rx.recv() => {
                if sink.send(Message::Text(event.to_json().into())).await.is_err() {
                    break;
                }
            }

            frame = stream.next() => {
                let reply = match frame {
                    Some(Ok(Message::Text(text))) => session.handle_text(&text).await,
                    Some(Ok(Message::Binary(_))) => {
                        Some(ServerEvent::error("Binary frames are not supported"))
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                        None
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    _ => None,
                };
                if let Some(event) = reply {
                    if sink.send(Message::Text(event.to_json().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    session.shutdown();
    ctx.connections.unregister(&id).await;
}
