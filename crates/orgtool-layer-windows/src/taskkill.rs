use orgtool_layer_core::{ProcessId, ProcessKiller, TerminationResult};
use std::process::Command;
use tracing::warn;

/// Terminates a process tree with `taskkill /T /F`.
///
/// The node-based external tool spawns its own children on Windows, so a
/// tree kill is required to actually stop the work.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsProcessKiller;

impl ProcessKiller for WindowsProcessKiller {
    fn kill(&self, pid: ProcessId) -> TerminationResult {
        let output = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .output();
        match output {
            Ok(out) if out.status.success() => TerminationResult::Signalled,
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                if stderr.contains("not found") {
                    TerminationResult::ProcessNotFound
                } else if stderr.contains("Access is denied") {
                    TerminationResult::PermissionDenied
                } else {
                    warn!(pid, stderr = %stderr.trim(), "taskkill failed");
                    TerminationResult::Failed(stderr.trim().to_string())
                }
            }
            Err(err) => TerminationResult::Failed(err.to_string()),
        }
    }
}
