//! Terminal user interface.
//!
//! - `command`: parsing of prompt lines
//! - `formatter`: rendering of the form and the conversation
//! - `prompt`: rustyline input thread
//! - `runner`: event loop tying the session to the terminal

pub mod command;
pub mod formatter;
pub mod prompt;
pub mod runner;

pub use command::Command;
pub use formatter::TerminalView;
pub use runner::run_client;
