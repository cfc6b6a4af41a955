use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast;

/// Capacity of the event channel. A subscriber lagging more than this many
/// events behind loses the oldest ones.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Events observable while operations run.
#[derive(Debug, Clone, PartialEq)]
pub enum CliEvent {
    /// A progress payload emitted by the running external process,
    /// forwarded verbatim in emission order.
    Progress(Value),
    /// Every tracked process was signalled to stop.
    Aborted,
}

/// Typed view over a progress payload.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub increment: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressEvent {
    /// Parse a typed view from a raw progress payload.
    pub fn parse(payload: &Value) -> Option<ProgressEvent> {
        serde_json::from_value(payload.clone()).ok()
    }
}

/// Broadcast fan-out for progress and abort notifications.
///
/// Every subscriber receives every event emitted after it attached, in
/// emission order.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CliEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Attach a new subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<CliEvent> {
        self.tx.subscribe()
    }

    /// Forward one progress payload to all current subscribers.
    pub fn emit_progress(&self, payload: Value) {
        let _ = self.tx.send(CliEvent::Progress(payload));
    }

    /// Tell all current subscribers that running processes were signalled.
    pub fn emit_abort(&self) {
        let _ = self.tx.send(CliEvent::Aborted);
    }
}
