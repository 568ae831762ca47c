use crate::types;
use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use types::events::client::{CallStartRequestEvent, CallStopRequestEvent};

pub mod config;
mod consts;
mod stats;
mod utils;

pub use stats::Stats;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<types::ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

/// The control surface of a gateway connection.
///
/// Adapters are written against this trait rather than `Client` so they can
/// be exercised with a mock in tests.
#[async_trait]
pub trait CallClient: Send {
    /// Asks the gateway to dial the given assistant or workflow.
    async fn start_call(&mut self, request: CallStartRequestEvent) -> Result<()>;

    /// Asks the gateway to hang up the current call.
    async fn stop_call(&mut self) -> Result<()>;

    /// Returns a fresh receiver for server events.
    async fn server_events(&mut self) -> Result<ServerRx>;
}

// Contains the capacity for channels, client/server transmitters, configuration,
// and stats guarded by a Mutex.
pub struct Client {
    capacity: usize,
    config: config::Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(capacity: usize, config: config::Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());

        // Writer: serialize queued client events onto the socket.
        tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
        });

        let stats = self.stats.clone();
        // Reader: parse gateway frames and broadcast them in arrival order.
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => match serde_json::from_str::<types::ServerEvent>(&text) {
                        Ok(event) => {
                            tracing::debug!("received gateway event: {:?}", event);
                            if let Ok(mut stats_guard) = stats.lock() {
                                stats_guard.record(&event);
                            } else {
                                tracing::error!("failed to update stats");
                            }
                            if let Err(e) = s_tx.send(event) {
                                tracing::debug!("no subscribers for gateway event: {}", e);
                            }
                        }
                        Err(e) => {
                            tracing::warn!("failed to deserialize event: {}, text=> {:?}", e, text);
                        }
                    },
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Message::Close(reason) => {
                        tracing::info!("connection closed: {:?}", reason);
                        let close_event = types::ServerEvent::Close {
                            reason: reason.map(|v| format!("{:?}", v)),
                        };
                        if let Err(e) = s_tx.send(close_event) {
                            tracing::debug!("no subscribers for close event: {}", e);
                        }
                        break;
                    }
                    _ => {}
                }
            }
            drop(c_tx);
            drop(s_tx);
        });
        Ok(())
    }

    pub fn stats(&self) -> Result<Stats> {
        if let Ok(stats_guard) = self.stats.lock() {
            Ok(stats_guard.clone())
        } else {
            Err(anyhow::anyhow!("failed to get stats"))
        }
    }

    async fn send_client_event(&mut self, event: types::ClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }
}

#[async_trait]
impl CallClient for Client {
    async fn start_call(&mut self, request: CallStartRequestEvent) -> Result<()> {
        self.send_client_event(types::ClientEvent::CallStart(request))
            .await
    }

    async fn stop_call(&mut self) -> Result<()> {
        self.send_client_event(types::ClientEvent::CallStop(CallStopRequestEvent::new()))
            .await
    }

    async fn server_events(&mut self) -> Result<ServerRx> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }
}

pub async fn connect_with_config(capacity: usize, config: config::Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}

pub async fn connect() -> Result<Client> {
    let config = config::Config::new();
    connect_with_config(consts::DEFAULT_CHANNEL_CAPACITY, config).await
}
