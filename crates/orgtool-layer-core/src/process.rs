use crate::error::CliError;
use crate::events::EventBus;
use crate::response::ToolOutcome;
use crate::state::OperationTracker;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

/// Operating-system identifier of a spawned process.
pub type ProcessId = u32;

/// Everything needed to start one external tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSpec {
    /// Registry key for the invocation, unique per operation kind.
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            working_directory: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<S: Into<String>, I: IntoIterator<Item = S>>(mut self, args: I) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append `flag value` when a value is present.
    pub fn opt(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    /// Append a bare flag when `enabled`.
    pub fn flag(self, flag: &str, enabled: bool) -> Self {
        if enabled { self.arg(flag) } else { self }
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }
}

/// Result of signalling one process.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminationResult {
    /// The signal was delivered.
    Signalled,
    /// The process was already gone.
    ProcessNotFound,
    /// The caller may not signal this process.
    PermissionDenied,
    /// Delivery failed for another reason.
    Failed(String),
}

/// Best-effort kill capability, implemented per platform.
///
/// Killing is signal delivery only; the process may still be exiting when
/// the call returns.
pub trait ProcessKiller: Send + Sync {
    fn kill(&self, pid: ProcessId) -> TerminationResult;
}

/// Context handed to a [`ToolRunner`] for the duration of one invocation.
pub struct RunContext<'a> {
    tracker: &'a OperationTracker,
    events: &'a EventBus,
}

impl<'a> RunContext<'a> {
    pub fn new(tracker: &'a OperationTracker, events: &'a EventBus) -> Self {
        Self { tracker, events }
    }

    /// Record the spawned pid so an abort can reach it.
    pub fn register(&self, name: &str, pid: ProcessId) {
        self.tracker.track(name, pid);
    }

    /// Forward one progress payload to subscribers.
    pub fn progress(&self, payload: Value) {
        self.events.emit_progress(payload);
    }

    /// True once the manager was told to abort its processes.
    pub fn is_aborted(&self) -> bool {
        self.tracker.is_aborted()
    }
}

/// Spawns one external tool invocation and waits for its final payload.
///
/// The facade crate provides the real implementation on top of
/// `tokio::process`; tests substitute the external tool through this seam.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, spec: ProcessSpec, ctx: RunContext<'_>) -> Result<ToolOutcome, CliError>;
}
