//! Session store implementations.
//!
//! - `file`: JSON file in the user's data directory (durable)
//! - `inmemory`: process-local store, used when persistence is disabled

pub mod file;
pub mod inmemory;

pub use file::FileSessionStore;
pub use inmemory::InMemorySessionStore;
