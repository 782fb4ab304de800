use futures_util::future::BoxFuture;
use futures_util::{stream, Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use thiserror::Error;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Raw payload events from one live connection. The stream ends when the
/// connection closes; a transport error is yielded once and then ends it.
pub type StreamEvents = Pin<Box<dyn Stream<Item = Result<Value, StreamError>> + Send>>;

/// The push source the connection manager draws from, addressed per drone.
pub trait StreamSource: Send + Sync {
    fn open(&self, drone_id: &str) -> BoxFuture<'static, Result<StreamEvents, StreamError>>;
}

/// WebSocket stream source; the URL template carries an `{id}` placeholder.
pub struct WsStreamSource {
    url_template: String,
}

impl WsStreamSource {
    pub fn new(url_template: String) -> Self {
        WsStreamSource { url_template }
    }
}

impl StreamSource for WsStreamSource {
    fn open(&self, drone_id: &str) -> BoxFuture<'static, Result<StreamEvents, StreamError>> {
        let url = self.url_template.replace("{id}", drone_id);
        Box::pin(async move {
            let (ws, _response) = connect_async(url.as_str())
                .await
                .map_err(|e| StreamError::Connect(e.to_string()))?;

            let events = stream::unfold(Some(ws), |state| async move {
                let mut ws = state?;
                loop {
                    match ws.next().await {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<Value>(text.as_str()) {
                                Ok(value) => return Some((Ok(value), Some(ws))),
                                // Malformed frames are dropped without
                                // disturbing the connection.
                                Err(_) => continue,
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => return None,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            return Some((Err(StreamError::Transport(e.to_string())), None));
                        }
                    }
                }
            });

            Ok(Box::pin(events) as StreamEvents)
        })
    }
}
