use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for every operation exposed by the layer.
#[derive(Error, Debug)]
pub enum CliError {
    /// Another operation is already running on this manager.
    #[error("another operation is already in progress")]
    OperationInProgress,

    #[error("operation not supported: {0}")]
    OperationNotSupported(String),

    #[error("data not found: {0}")]
    NotFound(String),

    #[error("wrong datatype: {0}")]
    WrongDatatype(String),

    #[error("invalid metadata selection: {0}")]
    InvalidSelection(String),

    #[error("wrong path: {0}")]
    WrongPath(String),

    #[error("path not found: {}", .path.display())]
    PathNotFound { path: PathBuf },

    #[error("not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("not a file: {}", .path.display())]
    NotAFile { path: PathBuf },

    /// The external tool reported a failure. Carries the tool's message when
    /// it provided one, otherwise the whole report object.
    #[error("{}", render_report(.0))]
    ToolReported(Value),

    #[error("the tool returned an unexpected payload: {0}")]
    UnexpectedPayload(String),

    #[error("operating system not supported: {0}")]
    UnsupportedOs(String),

    #[error("failed to launch process: {0}")]
    Launch(#[from] std::io::Error),

    #[error("process error: {0}")]
    Process(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// True for errors raised before any process is spawned.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CliError::WrongDatatype(_)
                | CliError::InvalidSelection(_)
                | CliError::WrongPath(_)
                | CliError::PathNotFound { .. }
                | CliError::NotADirectory { .. }
                | CliError::NotAFile { .. }
        )
    }

    /// True when the operation gate rejected the call.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CliError::OperationInProgress)
    }

    /// The verbatim message carried by a tool-reported failure, if the tool
    /// provided one.
    pub fn tool_message(&self) -> Option<&str> {
        match self {
            CliError::ToolReported(Value::String(message)) => Some(message),
            _ => None,
        }
    }
}

fn render_report(report: &Value) -> String {
    match report {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}
