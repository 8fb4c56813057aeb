//! WebSocket transport for the session.
//!
//! Each link runs as one tokio task that dials the endpoint, then multiplexes
//! outbound frames (fed through an unbounded channel by [`WsLink::send_text`])
//! and inbound frames (forwarded as [`LinkEvent`]s). The task never touches
//! console state; it only emits events stamped with its generation.

use crate::session::connection::{Connector, Link, LinkEnvelope, LinkEvent};
use crate::session::error::TransportError;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Dials `endpoint` for every new link and reports on `events`.
pub struct WebSocketConnector {
    endpoint: String,
    events: mpsc::UnboundedSender<LinkEnvelope>,
}

impl WebSocketConnector {
    pub fn new(endpoint: impl Into<String>, events: mpsc::UnboundedSender<LinkEnvelope>) -> Self {
        Self {
            endpoint: endpoint.into(),
            events,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, generation: u64) -> Box<dyn Link> {
        Box::new(WsLink::spawn(
            self.endpoint.clone(),
            generation,
            self.events.clone(),
        ))
    }
}

pub struct WsLink {
    outbound: mpsc::UnboundedSender<Message>,
    task: JoinHandle<()>,
}

impl WsLink {
    /// Start the link task. Must be called from within a tokio runtime.
    pub fn spawn(
        endpoint: String,
        generation: u64,
        events: mpsc::UnboundedSender<LinkEnvelope>,
    ) -> Self {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_link(endpoint, generation, outbound_rx, events));
        Self { outbound, task }
    }
}

impl Link for WsLink {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(Message::Text(text))
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn close(&mut self) {
        self.task.abort();
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_link(
    endpoint: String,
    generation: u64,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
    events: mpsc::UnboundedSender<LinkEnvelope>,
) {
    let emit = |event: LinkEvent| {
        // The console may already be gone during shutdown.
        let _ = events.send(LinkEnvelope::new(generation, event));
    };

    info!(%endpoint, generation, "dialing companion");
    let stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(%endpoint, generation, error = %err, "companion connect failed");
            emit(LinkEvent::Errored(TransportError::from(err).to_string()));
            return;
        }
    };
    emit(LinkEvent::Opened);

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outgoing = outbound_rx.recv() => match outgoing {
                Some(message) => {
                    if let Err(err) = write.send(message).await {
                        warn!(generation, error = %err, "companion write failed");
                        emit(LinkEvent::Errored(TransportError::from(err).to_string()));
                        return;
                    }
                }
                None => {
                    let _ = write.close().await;
                    return;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => emit(LinkEvent::Text(text)),
                Some(Ok(Message::Close(frame))) => {
                    debug!(generation, ?frame, "companion closed the connection");
                    emit(LinkEvent::Closed);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(generation, error = %err, "companion read failed");
                    emit(LinkEvent::Errored(TransportError::from(err).to_string()));
                    return;
                }
                None => {
                    emit(LinkEvent::Closed);
                    return;
                }
            },
        }
    }
}
