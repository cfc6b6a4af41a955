//! Unix process signalling for the orgtool layer.

#[cfg(unix)]
mod signal_killer;

#[cfg(unix)]
pub use signal_killer::UnixProcessKiller;
