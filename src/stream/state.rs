use serde::Serialize;
use utoipa::ToSchema;

/// Lifecycle phase of one drone's stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionPhase {
    Idle,
    Connecting,
    Open,
    Closed,
}

/// Per-drone connection state: phase, retry counter for backoff, and the
/// latest transport error retained for display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConnectionStatus {
    pub phase: ConnectionPhase,
    pub retries: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ConnectionStatus {
    pub fn new() -> Self {
        ConnectionStatus {
            phase: ConnectionPhase::Idle,
            retries: 0,
            last_error: None,
        }
    }

    pub fn begin_connect(&mut self) {
        self.phase = ConnectionPhase::Connecting;
    }

    pub fn mark_open(&mut self) {
        self.phase = ConnectionPhase::Open;
        self.retries = 0;
        self.last_error = None;
    }

    /// Errors are recorded but do not advance the phase; the close that
    /// follows drives the retry.
    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    pub fn mark_closed(&mut self) {
        self.phase = ConnectionPhase::Closed;
        self.retries += 1;
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::new()
    }
}
