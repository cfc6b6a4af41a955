//! OrgTool Layer Core - platform-independent building blocks
//!
//! This crate provides the configuration, error types, response
//! normalization, event relay, selection transformer, and operation-state
//! primitives shared by the platform crates and the `orgtool-layer` facade.

mod config;
mod error;
mod events;
mod paths;
mod process;
mod response;
mod selection;
mod state;

pub use config::*;
pub use error::*;
pub use events::*;
pub use paths::*;
pub use process::*;
pub use response::*;
pub use selection::*;
pub use state::*;
