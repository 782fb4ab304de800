mod backoff;
mod manager;
mod source;
mod state;

pub use backoff::reconnect_delay;
pub use manager::{StreamConfig, StreamManager};
pub use source::{StreamError, StreamEvents, StreamSource, WsStreamSource};
pub use state::{ConnectionPhase, ConnectionStatus};
