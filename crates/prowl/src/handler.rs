//! Per-connection handler: decode, dispatch, deliver.
//!
//! Each accepted connection gets its own task. The connection id doubles
//! as the player id for its whole lifetime. Inbound payloads are decoded
//! into [`ClientEvent`]s and pushed through the coordinator lock; the
//! resulting broadcasts are fanned out through per-connection outboxes,
//! one of which this task drains back onto its own socket.

use std::sync::Arc;

use prowl_protocol::{ClientEvent, Codec, PlayerId, ServerEvent};
use prowl_transport::{Connection, WsConnection};
use tokio::sync::mpsc;

use crate::ProwlError;
use crate::server::{ServerState, encode_event};

/// Drop guard: fires the coordinator disconnect exactly once when the
/// handler exits, panics included. `Drop` is synchronous, so the async
/// cleanup runs in a spawned task.
struct DisconnectGuard {
    player_id: PlayerId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.clients.lock().await.remove(&player_id);
            let outcome =
                state.coordinator.lock().await.handle_disconnect(player_id);
            state.deliver(outcome.deliveries).await;
            tracing::info!(%player_id, "connection cleaned up");
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WsConnection,
    state: Arc<ServerState>,
) -> Result<(), ProwlError> {
    let player_id = PlayerId(conn.id().into_inner());
    tracing::debug!(%player_id, "handling new connection");

    let (outbox, mut inbox) = mpsc::unbounded_channel();
    state.clients.lock().await.insert(player_id, outbox);
    let _guard = DisconnectGuard {
        player_id,
        state: Arc::clone(&state),
    };

    loop {
        tokio::select! {
            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%player_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%player_id, error = %e, "recv error");
                        break;
                    }
                };

                let event: ClientEvent = match state.codec.decode(&data) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(
                            %player_id, error = %e, "undecodable payload"
                        );
                        let reply = ServerEvent::Error {
                            code: 400,
                            message: format!("invalid event: {e}"),
                        };
                        conn.send(&encode_event(&state.codec, &reply)?).await?;
                        continue;
                    }
                };

                // Mutation and broadcast resolution happen inside the
                // lock; delivery happens after it is released.
                let outcome = state
                    .coordinator
                    .lock()
                    .await
                    .handle_event(player_id, event);

                if let Some(reply) = outcome.reply {
                    conn.send(&encode_event(&state.codec, &reply)?).await?;
                }
                state.deliver(outcome.deliveries).await;
                if outcome.close {
                    break;
                }
            }

            Some(event) = inbox.recv() => {
                conn.send(&encode_event(&state.codec, &event)?).await?;
            }
        }
    }

    // _guard drops here → disconnect cascade fires.
    Ok(())
}
