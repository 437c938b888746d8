use crate::subscription::protocol::{ClientMessage, ServerMessage};
use crate::surface::MarkerCommand;
use crate::transport::{OutboundEvent, TrackerHandle};
use axum::extract::ws::{Message, WebSocket};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Manages a single map viewer connection.
///
/// Streams draw commands and response events to the viewer and forwards
/// pushed events to the tracker.
pub struct ConnectionManager {
    tracker: TrackerHandle,
}

impl ConnectionManager {
    pub fn new(tracker: TrackerHandle) -> Self {
        Self { tracker }
    }

    /// Handle WebSocket connection lifecycle
    pub async fn handle(self, mut socket: WebSocket, mut event_rx: broadcast::Receiver<OutboundEvent>) {
        info!("Viewer connection established");

        // Draw commands after the replay come from the receiver taken
        // with it; anything earlier is already in the replay.
        let mut render_rx = match self.send_replay(&mut socket).await {
            Ok(rx) => rx,
            Err(e) => {
                error!(error = %e, "Failed to send initial scene");
                return;
            }
        };

        loop {
            tokio::select! {
                // Handle incoming client messages
                Some(msg) = socket.recv() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            if let Err(e) = self.handle_client_message(&mut socket, &mut render_rx, &text).await {
                                error!(error = %e, "Error handling client message");
                                break;
                            }
                        }
                        Ok(Message::Close(_)) => {
                            info!("Viewer disconnected");
                            break;
                        }
                        Ok(Message::Ping(data)) => {
                            if let Err(e) = socket.send(Message::Pong(data)).await {
                                error!(error = %e, "Failed to send pong");
                                break;
                            }
                        }
                        Ok(_) => {
                            // Ignore binary, pong messages
                        }
                        Err(e) => {
                            warn!(error = %e, "WebSocket error");
                            break;
                        }
                    }
                }

                // Forward draw commands
                result = render_rx.recv() => {
                    match result {
                        Ok(command) => {
                            if let Err(e) = send(&mut socket, &ServerMessage::from(command)).await {
                                error!(error = %e, "Failed to send draw command");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Missed commands leave the viewer's scene stale: rebuild it
                            warn!(skipped = skipped, "Viewer lagged, resyncing scene");
                            match self.send_replay(&mut socket).await {
                                Ok(rx) => render_rx = rx,
                                Err(e) => {
                                    error!(error = %e, "Failed to resync scene");
                                    break;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("Draw command channel closed");
                            break;
                        }
                    }
                }

                // Forward response events
                result = event_rx.recv() => {
                    match result {
                        Ok(event) => {
                            if let Err(e) = send(&mut socket, &ServerMessage::from(event)).await {
                                error!(error = %e, "Failed to send event");
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped = skipped, "Viewer lagged, skipped events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            error!("Event channel closed");
                            break;
                        }
                    }
                }

                else => {
                    break;
                }
            }
        }

        info!("Viewer connection closed");
    }

    /// Handle client message (push/resync)
    async fn handle_client_message(
        &self,
        socket: &mut WebSocket,
        render_rx: &mut broadcast::Receiver<MarkerCommand>,
        text: &str,
    ) -> anyhow::Result<()> {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "Malformed client message");
                return send(socket, &ServerMessage::error(format!("invalid message: {}", e))).await;
            }
        };

        let Some(mut event) = msg.into_event() else {
            *render_rx = self.send_replay(socket).await?;
            return Ok(());
        };

        if let Err(e) = event.validate_and_prepare() {
            return send(socket, &ServerMessage::error(e.to_string())).await;
        }

        debug!(event = %event.event, "Viewer pushed event");
        if let Err(e) = self.tracker.push(event) {
            return send(socket, &ServerMessage::error(e.to_string())).await;
        }

        Ok(())
    }

    /// Send the current scene and return the receiver that continues it
    async fn send_replay(
        &self,
        socket: &mut WebSocket,
    ) -> anyhow::Result<broadcast::Receiver<MarkerCommand>> {
        let snapshot = self.tracker.replay().await?;
        debug!(commands = snapshot.commands.len(), "Replaying scene to viewer");
        for command in snapshot.commands {
            send(socket, &ServerMessage::from(command)).await?;
        }
        Ok(snapshot.updates)
    }
}

async fn send(socket: &mut WebSocket, msg: &ServerMessage) -> anyhow::Result<()> {
    let json = serde_json::to_string(msg)?;
    socket.send(Message::Text(json)).await?;
    Ok(())
}
