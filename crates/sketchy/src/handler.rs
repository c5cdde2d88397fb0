//! Per-connection tasks: decode inbound frames, encode outbound messages.
//!
//! Each accepted connection is split in two. The reader half runs in the
//! handler task and forwards decoded [`ClientMessage`]s to the game loop.
//! The writer half runs in its own task and drains the connection's
//! outbound queue, which the game loop's hub fills.

use sketchy_protocol::{ClientMessage, Codec, ConnectionId, ServerMessage};
use sketchy_transport::{ConnectionReader, ConnectionWriter, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ServerError;
use crate::game_loop::Inbound;

/// Tells the game loop the connection is gone when the handler exits,
/// whichever way it exits.
struct DisconnectGuard {
    conn: ConnectionId,
    inbound: mpsc::UnboundedSender<Inbound>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        // Fails only if the loop already stopped, and then nobody cares.
        let _ = self.inbound.send(Inbound::Disconnected { conn: self.conn });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    inbound: mpsc::UnboundedSender<Inbound>,
    codec: C,
) -> Result<(), ServerError>
where
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (writer, mut reader) = conn.split();
    let (outbound, queue) = mpsc::unbounded_channel();

    inbound
        .send(Inbound::Connected {
            conn: conn_id,
            sender: outbound.clone(),
        })
        .map_err(|_| ServerError::LoopClosed)?;
    let guard = DisconnectGuard {
        conn: conn_id,
        inbound: inbound.clone(),
    };

    let writer_task = tokio::spawn(write_outbound(writer, queue, codec.clone()));

    let result = read_inbound(&mut reader, &inbound, &outbound, &codec).await;

    // The writer stops once both the hub's sender and ours are gone.
    drop(outbound);
    drop(guard);
    if let Err(e) = writer_task.await {
        tracing::debug!(%conn_id, error = %e, "writer task failed");
    }

    result
}

/// Forwards decoded messages until the peer closes.
async fn read_inbound<C: Codec>(
    reader: &mut ConnectionReader,
    inbound: &mpsc::UnboundedSender<Inbound>,
    outbound: &mpsc::UnboundedSender<ServerMessage>,
    codec: &C,
) -> Result<(), ServerError> {
    let conn = reader.id();

    loop {
        let frame = match reader.recv().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                tracing::info!(%conn, "connection closed cleanly");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(%conn, error = %e, "recv error");
                return Err(e.into());
            }
        };

        let msg: ClientMessage = match codec.decode(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "failed to decode client message");
                let _ = outbound.send(ServerMessage::Error {
                    message: e.to_string(),
                });
                continue;
            }
        };

        inbound
            .send(Inbound::Message { conn, msg })
            .map_err(|_| ServerError::LoopClosed)?;
    }
}

/// Drains the outbound queue onto the socket, then closes it.
async fn write_outbound<C: Codec>(
    mut writer: ConnectionWriter,
    mut queue: mpsc::UnboundedReceiver<ServerMessage>,
    codec: C,
) {
    let conn = writer.id();

    while let Some(msg) = queue.recv().await {
        let frame = match codec.encode(&msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(%conn, error = %e, "failed to encode server message");
                continue;
            }
        };
        if let Err(e) = writer.send_text(&frame).await {
            tracing::debug!(%conn, error = %e, "send failed, dropping writer");
            return;
        }
    }

    let _ = writer.close().await;
}
