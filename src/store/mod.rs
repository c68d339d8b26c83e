//! Persistence layer — two-lifetime flag storage.

pub mod flags;
pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use flags::{FlagSnapshot, FlagStore, keys};
pub use libsql_backend::LibSqlBackend;
pub use memory::MemoryBackend;
pub use traits::{FlagBackend, FlagValue, Lifetime};
