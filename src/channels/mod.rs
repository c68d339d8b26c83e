//! Channel abstraction for message I/O.

pub mod channel;
pub mod cli;
pub mod commands;
pub mod render;

pub use channel::*;
pub use cli::CliChannel;
pub use commands::Command;
