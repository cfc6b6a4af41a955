use orgtool_layer_core::ProcessKiller;
use std::sync::Arc;

/// The process killer for the current platform, selected at compile time.
#[cfg(unix)]
pub fn default_process_killer() -> Arc<dyn ProcessKiller> {
    Arc::new(orgtool_layer_unix::UnixProcessKiller)
}

#[cfg(windows)]
pub fn default_process_killer() -> Arc<dyn ProcessKiller> {
    Arc::new(orgtool_layer_windows::WindowsProcessKiller)
}

#[cfg(not(any(unix, windows)))]
pub fn default_process_killer() -> Arc<dyn ProcessKiller> {
    use orgtool_layer_core::{ProcessId, TerminationResult};

    struct UnsupportedKiller;

    impl ProcessKiller for UnsupportedKiller {
        fn kill(&self, _pid: ProcessId) -> TerminationResult {
            TerminationResult::Failed(format!(
                "no process killer for {}",
                std::env::consts::OS
            ))
        }
    }

    Arc::new(UnsupportedKiller)
}
