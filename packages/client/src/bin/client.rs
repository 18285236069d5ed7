//! Terminal client for the registration assistant.
//!
//! Connects to the registration service, shows the form and the chat, and
//! keeps both in sync with the assistant.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin vitalink-client
//! cargo run --bin vitalink-client -- --url ws://localhost:5001/api/chat --no-persist
//! ```

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use vitalink_client::config::{
    ClientConfig, DEFAULT_DEBOUNCE_MS, DEFAULT_REPLY_TIMEOUT_SECS, DEFAULT_URL, SessionConfig,
    SessionPersistence,
};
use vitalink_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "vitalink-client")]
#[command(about = "Patient registration form with a chat assistant", long_about = None)]
struct Args {
    /// WebSocket endpoint of the registration service
    #[arg(short = 'u', long, default_value = DEFAULT_URL)]
    url: String,

    /// Quiet period before a form edit is sent (milliseconds)
    #[arg(long, default_value_t = DEFAULT_DEBOUNCE_MS)]
    debounce_ms: u64,

    /// How long to wait for an assistant reply (seconds)
    #[arg(long, default_value_t = DEFAULT_REPLY_TIMEOUT_SECS)]
    reply_timeout_secs: u64,

    /// File that keeps the session identifier between runs
    #[arg(long, conflicts_with = "no_persist")]
    session_file: Option<PathBuf>,

    /// Do not remember the session identifier after exit
    #[arg(long)]
    no_persist: bool,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let persistence = if self.no_persist {
            SessionPersistence::Disabled
        } else if let Some(path) = self.session_file {
            SessionPersistence::File(path)
        } else {
            SessionPersistence::DefaultFile
        };

        ClientConfig {
            url: self.url,
            session: SessionConfig {
                debounce: Duration::from_millis(self.debounce_ms),
                reply_timeout: Duration::from_secs(self.reply_timeout_secs),
            },
            persistence,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = Args::parse().into_config();

    if let Err(e) = vitalink_client::ui::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
