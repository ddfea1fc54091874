//! Websocket transport to the media server.
//!
//! Commands go out as JSON text frames of [`CommandEnvelope`]; every inbound
//! text frame is handed to the [`EventBus`] for routing.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::bus::EventBus;
use crate::channel::CommandChannel;
use crate::client::stats::Stats;
use crate::error::TransportError;
use crate::lock;
use crate::registry::CorrelationRegistry;
use crate::types::{Command, CommandEnvelope, LegId};
use crate::voice::Voice;

pub mod config;
pub mod consts;
mod stats;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use stats::Stats as ClientStats;

pub type CommandTx = tokio::sync::mpsc::Sender<CommandEnvelope>;

/// The tasks pumping one websocket. When the receive task ends it stops the
/// send task, so later posts fail with [`TransportError::Closed`].
pub struct Connection {
    pub(crate) send_handle: tokio::task::JoinHandle<()>,
    pub(crate) recv_handle: tokio::task::JoinHandle<()>,
}

impl Connection {
    fn is_finished(&self) -> bool {
        self.send_handle.is_finished() || self.recv_handle.is_finished()
    }

    fn abort(&self) {
        self.send_handle.abort();
        self.recv_handle.abort();
    }
}

pub struct Client {
    capacity: usize,
    config: Config,
    c_tx: Option<CommandTx>,
    connection: Option<Connection>,
    bus: EventBus,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(bus: EventBus, config: Config) -> Self {
        Self {
            capacity: config.capacity(),
            config,
            c_tx: None,
            connection: None,
            bus,
            stats: Arc::new(Mutex::new(Stats::default())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        tracing::info!("connected to media server at {}", self.config.url());

        let (mut write, mut read) = ws_stream.split();
        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel::<CommandEnvelope>(self.capacity);

        let stats = self.stats.clone();
        let send_handle = tokio::spawn(async move {
            while let Some(envelope) = c_rx.recv().await {
                match serde_json::to_string(&envelope) {
                    Ok(text) => {
                        tracing::debug!(
                            "sending command: {}, leg={}",
                            envelope.command().verb(),
                            envelope.leg_id()
                        );
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send command: {}", e);
                            break;
                        }
                        lock(&stats).record_command();
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize command: {}", e);
                    }
                }
            }
        });

        let stats = self.stats.clone();
        let bus = self.bus.clone();
        let sender = send_handle.abort_handle();
        let recv_handle = tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        lock(&stats).record_frame();
                        if let Err(e) = bus.ingest(&text) {
                            lock(&stats).record_unparseable();
                            tracing::error!(
                                "failed to deserialize event: {}, text=> {:?}",
                                e,
                                text
                            );
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        break;
                    }
                    _ => {}
                }
            }
            sender.abort();
        });

        self.c_tx = Some(c_tx);
        self.connection = Some(Connection {
            send_handle,
            recv_handle,
        });
        Ok(())
    }

    /// Drops the current connection, if any, and opens a new one.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.disconnect();
        self.connect().await
    }

    /// Stops both websocket tasks. Verbs already waiting keep waiting until
    /// their own deadline.
    pub fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.abort();
            tracing::info!("disconnected from media server at {}", self.config.url());
        }
        self.c_tx = None;
    }

    /// `false` once either websocket task has ended.
    pub fn is_connected(&self) -> bool {
        self.connection
            .as_ref()
            .is_some_and(|connection| !connection.is_finished())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn stats(&self) -> ClientStats {
        lock(&self.stats).clone()
    }

    /// Verbs for `leg` posted through this connection, using the configured
    /// verb timeout.
    pub fn voice(self: &Arc<Self>, leg: LegId, registry: CorrelationRegistry) -> Voice {
        Voice::new(leg, self.clone(), registry).with_timeout(self.config.verb_timeout())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.abort();
        }
    }
}

#[async_trait]
impl CommandChannel for Client {
    async fn post(&self, leg: &LegId, command: Command) -> Result<(), TransportError> {
        match self.c_tx {
            Some(ref tx) => tx.post(leg, command).await,
            None => Err(TransportError::NotConnected),
        }
    }
}

/// Connects to the media server described by `config`, feeding inbound events
/// into `bus`.
pub async fn connect_with_config(bus: EventBus, config: Config) -> Result<Client> {
    let mut client = Client::new(bus, config);
    client.connect().await?;
    Ok(client)
}

/// Connects using [`Config::new`], which reads the environment.
pub async fn connect(bus: EventBus) -> Result<Client> {
    connect_with_config(bus, Config::new()).await
}
