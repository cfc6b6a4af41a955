use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use orgtool_layer_core::{ProcessId, ProcessKiller, TerminationResult};
use tracing::warn;

/// Signals processes with SIGTERM, escalating once to SIGKILL when delivery
/// fails. Never waits for the process to exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixProcessKiller;

impl ProcessKiller for UnixProcessKiller {
    fn kill(&self, pid: ProcessId) -> TerminationResult {
        let nix_pid = NixPid::from_raw(pid as i32);
        match signal::kill(nix_pid, Signal::SIGTERM) {
            Ok(()) => TerminationResult::Signalled,
            Err(Errno::ESRCH) => TerminationResult::ProcessNotFound,
            Err(Errno::EPERM) => TerminationResult::PermissionDenied,
            Err(err) => {
                warn!(pid, error = %err, "SIGTERM failed, escalating to SIGKILL");
                match signal::kill(nix_pid, Signal::SIGKILL) {
                    Ok(()) => TerminationResult::Signalled,
                    Err(Errno::ESRCH) => TerminationResult::ProcessNotFound,
                    Err(Errno::EPERM) => TerminationResult::PermissionDenied,
                    Err(err) => TerminationResult::Failed(err.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn signals_a_live_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let killer = UnixProcessKiller;
        assert_eq!(killer.kill(child.id()), TerminationResult::Signalled);
        let status = child.wait().unwrap();
        assert!(!status.success());
    }

    #[test]
    fn reaped_children_report_process_not_found() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        let killer = UnixProcessKiller;
        // The pid is free again once the child was reaped.
        assert_eq!(killer.kill(pid), TerminationResult::ProcessNotFound);
    }
}
