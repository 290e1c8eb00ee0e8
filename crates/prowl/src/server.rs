//! `ProwlServer` builder and server loop.
//!
//! Ties the layers together: connection layer → protocol → coordinator.
//! One task per connection feeds decoded events through the coordinator
//! lock; two background loops (session tick, maintenance sweep) enqueue
//! their work onto the same lock. Outbound events travel through
//! per-connection channels, so delivery never blocks a mutation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use prowl_protocol::{Codec, JsonCodec, PlayerId, ServerEvent};
use prowl_room::DirectoryConfig;
use prowl_game::GameConfig;
use prowl_tick::TickLoop;
use prowl_transport::{Listener, WsListener};
use tokio::sync::{Mutex, mpsc};

use crate::coordinator::{Audience, Coordinator, CoordinatorConfig, Delivery};
use crate::handler::handle_connection;
use crate::ProwlError;

/// Per-connection outbound channel. Unbounded: the coordinator must
/// never block on a slow client.
pub(crate) type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) coordinator: Mutex<Coordinator>,
    /// Outboxes for every live connection, keyed by player id.
    pub(crate) clients: Mutex<HashMap<PlayerId, Outbox>>,
    pub(crate) codec: JsonCodec,
}

impl ServerState {
    /// Fans resolved deliveries out to their audiences. Dead outboxes
    /// are skipped; the owning handler cleans them up on exit.
    pub(crate) async fn deliver(&self, deliveries: Vec<Delivery>) {
        if deliveries.is_empty() {
            return;
        }
        let clients = self.clients.lock().await;
        for delivery in deliveries {
            match delivery.audience {
                Audience::All => {
                    for outbox in clients.values() {
                        let _ = outbox.send(delivery.event.clone());
                    }
                }
                Audience::Players(ids) => {
                    for id in ids {
                        if let Some(outbox) = clients.get(&id) {
                            let _ = outbox.send(delivery.event.clone());
                        }
                    }
                }
            }
        }
    }
}

/// Builder for configuring and starting a Prowl server.
///
/// # Example
///
/// ```rust,ignore
/// let server = ProwlServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ProwlServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    directory_config: DirectoryConfig,
    tick_rate_hz: u32,
    sweep_period: Duration,
}

impl ProwlServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
            directory_config: DirectoryConfig::default(),
            tick_rate_hz: 10,
            sweep_period: Duration::from_secs(5 * 60),
        }
    }

    /// Sets the address to bind the WebSocket listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    pub fn directory_config(mut self, config: DirectoryConfig) -> Self {
        self.directory_config = config;
        self
    }

    /// Session tick rate in Hz (win-condition checks, inactivity prune).
    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz;
        self
    }

    /// Period of the stale-room maintenance sweep.
    pub fn sweep_period(mut self, period: Duration) -> Self {
        self.sweep_period = period;
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build(self) -> Result<ProwlServer, ProwlError> {
        let listener = WsListener::bind(&self.bind_addr).await?;

        let coordinator = Coordinator::new(CoordinatorConfig {
            game: self.game_config,
            rooms: self.directory_config,
        });
        let state = Arc::new(ServerState {
            coordinator: Mutex::new(coordinator),
            clients: Mutex::new(HashMap::new()),
            codec: JsonCodec,
        });

        Ok(ProwlServer {
            listener,
            state,
            tick_rate_hz: self.tick_rate_hz,
            sweep_period: self.sweep_period,
        })
    }
}

impl Default for ProwlServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Prowl coordinator server.
///
/// Call [`run()`](Self::run) to start the tick loops and the accept loop.
pub struct ProwlServer {
    listener: WsListener,
    state: Arc<ServerState>,
    tick_rate_hz: u32,
    sweep_period: Duration,
}

impl ProwlServer {
    pub fn builder() -> ProwlServerBuilder {
        ProwlServerBuilder::new()
    }

    /// The bound local address.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ProwlError> {
        self.listener.local_addr().map_err(ProwlError::Transport)
    }

    /// Runs the server until the process is terminated.
    ///
    /// Starts the session tick and maintenance sweep tasks, then accepts
    /// connections forever, spawning a handler task per connection. Both
    /// periodic tasks resolve their broadcasts inside the coordinator
    /// lock and deliver them after releasing it.
    pub async fn run(mut self) -> Result<(), ProwlError> {
        tracing::info!(
            tick_hz = self.tick_rate_hz,
            sweep = ?self.sweep_period,
            "prowl server running"
        );

        let tick_state = Arc::clone(&self.state);
        let mut ticker = TickLoop::with_rate(self.tick_rate_hz);
        tokio::spawn(async move {
            loop {
                ticker.wait_for_tick().await;
                let deliveries = tick_state.coordinator.lock().await.tick();
                tick_state.deliver(deliveries).await;
            }
        });

        let sweep_state = Arc::clone(&self.state);
        let mut sweeper = TickLoop::with_period(self.sweep_period);
        tokio::spawn(async move {
            loop {
                sweeper.wait_for_tick().await;
                let deliveries = sweep_state.coordinator.lock().await.sweep();
                sweep_state.deliver(deliveries).await;
            }
        });

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Aggregate counts for the status surface.
    pub async fn stats(&self) -> prowl_protocol::StatsSnapshot {
        self.state.coordinator.lock().await.stats()
    }
}

/// Encodes one event with the server codec.
pub(crate) fn encode_event(
    codec: &JsonCodec,
    event: &ServerEvent,
) -> Result<Vec<u8>, ProwlError> {
    codec.encode(event).map_err(ProwlError::Protocol)
}
