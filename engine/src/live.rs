//! Live Chat Channel
//!
//! A long-lived WebSocket to the assistant backend carrying unstructured text
//! frames. Inbound text frames are forwarded verbatim; outbound frames are the
//! raw text the user typed.
//!
//! Features:
//! - Optional auto-reconnect with a fixed delay
//! - Server pings answered with pongs
//! - Frames submitted while disconnected are dropped with a warning
//! - Closed when the outbound sender is dropped

use futures::stream::StreamExt;
use futures::SinkExt;
use rxassist_sdk::AssistantError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{error, info, warn};

use crate::config::LiveConfig;

/// Channel receiver for inbound text frames
pub type FrameReceiver = mpsc::Receiver<String>;

/// Channel sender for outbound text frames
pub type FrameSender = mpsc::Sender<String>;

/// Start the live channel.
///
/// Spawns the connection loop in the background. Returns a receiver for
/// inbound frames and a sender for outbound frames. Dropping the sender
/// closes the connection.
pub fn start(config: LiveConfig) -> (FrameReceiver, FrameSender) {
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(64);
    let (outbound_tx, outbound_rx) = mpsc::channel::<String>(64);

    tokio::spawn(connection_loop(config, inbound_tx, outbound_rx));

    (inbound_rx, outbound_tx)
}

/// How a connection ended
enum Disconnect {
    /// Server closed or the socket failed
    Lost,
    /// The session dropped its end
    Shutdown,
}

async fn connection_loop(
    config: LiveConfig,
    inbound_tx: mpsc::Sender<String>,
    mut outbound_rx: mpsc::Receiver<String>,
) {
    loop {
        info!("Live channel connecting to {}", config.url);

        match tokio_tungstenite::connect_async(config.url.as_str()).await {
            Ok((ws_stream, _response)) => {
                info!("Live channel connected to {}", config.url);
                let ended = run_connection(ws_stream, &inbound_tx, &mut outbound_rx).await;
                if let Disconnect::Shutdown = ended {
                    info!("Live channel closed");
                    return;
                }
            }
            Err(e) => {
                let error =
                    AssistantError::LiveChannel(format!("connect to {} failed: {}", config.url, e));
                error!("{}", error);
            }
        }

        if !config.reconnect {
            warn!("Live channel disconnected, reconnect disabled");
            return;
        }

        info!(
            "Live channel reconnecting in {}s...",
            config.reconnect_delay_secs
        );
        if !wait_dropping_frames(
            Duration::from_secs(config.reconnect_delay_secs),
            &mut outbound_rx,
        )
        .await
        {
            return;
        }
    }
}

/// Pump frames both ways until the connection ends
async fn run_connection<S>(
    ws_stream: S,
    inbound_tx: &mpsc::Sender<String>,
    outbound_rx: &mut mpsc::Receiver<String>,
) -> Disconnect
where
    S: futures::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + futures::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        if inbound_tx.send(text).await.is_err() {
                            // Nobody is listening any more
                            let _ = write.send(WsMessage::Close(None)).await;
                            return Disconnect::Shutdown;
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = write.send(WsMessage::Pong(data)).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Live channel closed by server");
                        return Disconnect::Lost;
                    }
                    Some(Err(e)) => {
                        warn!("Live channel read error: {}", e);
                        return Disconnect::Lost;
                    }
                    _ => {} // Binary, Pong, Frame
                }
            }
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if let Err(e) = write.send(WsMessage::Text(text)).await {
                            warn!("Failed to send live frame: {}", e);
                            return Disconnect::Lost;
                        }
                    }
                    None => {
                        let _ = write.send(WsMessage::Close(None)).await;
                        return Disconnect::Shutdown;
                    }
                }
            }
        }
    }
}

/// Sleep for `delay`, discarding frames submitted meanwhile
///
/// Returns false if the outbound sender was dropped.
async fn wait_dropping_frames(delay: Duration, outbound_rx: &mut mpsc::Receiver<String>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            outbound = outbound_rx.recv() => match outbound {
                Some(text) => warn!(
                    "Live channel disconnected, dropping frame ({} chars)",
                    text.chars().count()
                ),
                None => return false,
            },
        }
    }
}
