//! Windows process termination for the orgtool layer.

#[cfg(windows)]
mod taskkill;

#[cfg(windows)]
pub use taskkill::WindowsProcessKiller;
