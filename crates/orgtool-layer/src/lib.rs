//! orgtool-layer - a process-managing facade over the `orgtool` CLI.
//!
//! The external tool owns all the heavy lifting (metadata comparison,
//! package XML generation, dependency repair, XML compression); this crate
//! spawns it, streams its progress notifications, and translates its
//! JSON/text responses into typed results. One [`CliManager`] runs at most
//! one operation at a time unless concurrence is explicitly allowed.

mod factory;
mod manager;
mod platform;
mod results;
mod runner;

pub use factory::{DeleteOrder, PackageKind};
pub use manager::CliManager;
pub use platform::default_process_killer;
pub use results::*;
pub use runner::TokioToolRunner;

pub use orgtool_layer_core::{
    CliConfig, CliConfigBuilder, CliError, CliEvent, EventBus, OperationTracker, ProcessId,
    ProcessKiller, ProcessSpec, ProgressEvent, RunContext, SelectionInput, TerminationResult,
    ToolOutcome, ToolRunner, transform_selection,
};
