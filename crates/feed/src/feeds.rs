//! WebSocket event source

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use pairwatch_core::FeedConfig;

use crate::events::{decode_event, EventItem, FeedEvent};

/// Event feed configuration
#[derive(Debug, Clone)]
pub struct WsFeedConfig {
    pub url: String,
    pub reconnect_delay: Duration,
    /// 0 = retry forever
    pub max_reconnects: u32,
}

impl From<&FeedConfig> for WsFeedConfig {
    fn from(config: &FeedConfig) -> Self {
        Self {
            url: config.events_url.clone(),
            reconnect_delay: config.reconnect_delay(),
            max_reconnects: config.max_reconnects,
        }
    }
}

/// How a listen pass ended
#[derive(Debug, PartialEq, Eq)]
enum Listen {
    ServerClosed,
    ConsumerGone,
}

/// Push event feed over a WebSocket. Emits `Connected`/`Disconnected`
/// around every connection and reconnects until the consumer goes away.
pub struct WsEventFeed {
    config: WsFeedConfig,
    connected: bool,
}

impl WsEventFeed {
    pub fn new(config: WsFeedConfig) -> Self {
        Self {
            config,
            connected: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub async fn run(&mut self, events_tx: mpsc::Sender<EventItem>) {
        let mut reconnect_count = 0;

        loop {
            let result = self.connect_and_listen(&events_tx).await;

            if self.connected {
                self.connected = false;
                reconnect_count = 0;
                if events_tx.send(Ok(FeedEvent::Disconnected)).await.is_err() {
                    break;
                }
            }

            match result {
                Ok(Listen::ConsumerGone) => {
                    debug!("Event consumer dropped, stopping feed");
                    break;
                }
                Ok(Listen::ServerClosed) => {
                    info!("Event feed closed by server");
                }
                Err(e) => {
                    error!("Event feed error: {}", e);
                }
            }

            reconnect_count += 1;
            if self.config.max_reconnects > 0 && reconnect_count > self.config.max_reconnects {
                error!("Max reconnects reached for {}", self.config.url);
                break;
            }

            warn!(
                "Reconnecting to {} in {:?} (attempt {})",
                self.config.url, self.config.reconnect_delay, reconnect_count
            );

            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
                _ = events_tx.closed() => break,
            }
        }
    }

    async fn connect_and_listen(
        &mut self,
        events_tx: &mpsc::Sender<EventItem>,
    ) -> anyhow::Result<Listen> {
        info!("Connecting to event feed at {}", self.config.url);

        let (ws_stream, _) = connect_async(self.config.url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        self.connected = true;
        if events_tx.send(Ok(FeedEvent::Connected)).await.is_err() {
            return Ok(Listen::ConsumerGone);
        }

        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let item = decode_event(&text);
                    if let Err(e) = &item {
                        debug!("Undecodable frame: {}", e);
                    }
                    if events_tx.send(item).await.is_err() {
                        return Ok(Listen::ConsumerGone);
                    }
                }
                Ok(Message::Ping(data)) => {
                    write.send(Message::Pong(data)).await?;
                }
                Ok(Message::Close(_)) => {
                    return Ok(Listen::ServerClosed);
                }
                Err(e) => {
                    return Err(e.into());
                }
                _ => {}
            }
        }

        Ok(Listen::ServerClosed)
    }
}
