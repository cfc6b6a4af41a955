use crate::error::CliError;
use crate::process::{ProcessId, ProcessKiller, TerminationResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Per-manager operation state: the busy flag, the abort flag, and the
/// registry of running external processes.
///
/// All mutation goes through this type; operations never touch the fields
/// directly.
pub struct OperationTracker {
    state: Mutex<TrackerState>,
    killer: Arc<dyn ProcessKiller>,
}

#[derive(Default)]
struct TrackerState {
    in_progress: bool,
    aborted: bool,
    processes: HashMap<String, ProcessId>,
}

impl OperationTracker {
    pub fn new(killer: Arc<dyn ProcessKiller>) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            killer,
        }
    }

    /// Mark the start of an operation.
    ///
    /// Fails when one is already running, unless `allow_concurrence`. On
    /// success the abort flag is cleared, the registry reset, and the
    /// returned guard releases the gate when dropped - on success, failure,
    /// or unwind alike.
    pub fn begin(&self, allow_concurrence: bool) -> Result<OperationGuard<'_>, CliError> {
        let mut state = self.state.lock().unwrap();
        if state.in_progress && !allow_concurrence {
            return Err(CliError::OperationInProgress);
        }
        state.in_progress = true;
        state.aborted = false;
        state.processes.clear();
        Ok(OperationGuard { tracker: self })
    }

    fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.in_progress = false;
        state.processes.clear();
    }

    pub fn in_progress(&self) -> bool {
        self.state.lock().unwrap().in_progress
    }

    pub fn is_aborted(&self) -> bool {
        self.state.lock().unwrap().aborted
    }

    /// Record a spawned process under its operation name.
    pub fn track(&self, name: &str, pid: ProcessId) {
        self.state
            .lock()
            .unwrap()
            .processes
            .insert(name.to_string(), pid);
    }

    /// Number of processes currently registered.
    pub fn tracked(&self) -> usize {
        self.state.lock().unwrap().processes.len()
    }

    /// Signal every registered process and drop it from the registry.
    /// A no-op when nothing is registered. Returns how many processes were
    /// signalled; delivery is best effort and never waits for exit.
    pub fn kill_all(&self) -> usize {
        let drained: Vec<(String, ProcessId)> = {
            let mut state = self.state.lock().unwrap();
            state.processes.drain().collect()
        };
        for (name, pid) in &drained {
            match self.killer.kill(*pid) {
                TerminationResult::Signalled => {
                    debug!(process = %name, pid, "kill signal delivered");
                }
                TerminationResult::ProcessNotFound => {
                    debug!(process = %name, pid, "process already gone");
                }
                other => {
                    warn!(process = %name, pid, result = ?other, "kill signal failed");
                }
            }
        }
        drained.len()
    }

    /// Flag the manager as aborted, then signal everything in the registry.
    pub fn abort(&self) -> usize {
        self.state.lock().unwrap().aborted = true;
        self.kill_all()
    }
}

/// Releases the operation gate when dropped.
#[must_use = "dropping the guard releases the operation gate"]
pub struct OperationGuard<'a> {
    tracker: &'a OperationTracker,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}
