//! Line input on a dedicated thread.
//!
//! rustyline blocks, so it runs on its own OS thread and forwards every
//! non-empty line through an mpsc channel. The channel closes on Ctrl+C,
//! Ctrl+D or a terminal error.

use std::io::Write;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{mpsc, oneshot};

use crate::error::ClientError;

pub const PROMPT: &str = "> ";

/// Start the input thread.
///
/// # Errors
///
/// Returns `ClientError::Terminal` when the line editor cannot be created.
pub async fn spawn_prompt(
    prompt: &'static str,
) -> Result<mpsc::UnboundedReceiver<String>, ClientError> {
    let (line_tx, line_rx) = mpsc::unbounded_channel::<String>();
    let (ready_tx, ready_rx) = oneshot::channel::<Result<(), String>>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => {
                let _ = ready_tx.send(Ok(()));
                rl
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
        };

        loop {
            match rl.readline(prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if line_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    match ready_rx.await {
        Ok(Ok(())) => Ok(line_rx),
        Ok(Err(e)) => Err(ClientError::Terminal(e)),
        Err(_) => Err(ClientError::Terminal(
            "input thread exited during start-up".to_string(),
        )),
    }
}

/// Redisplay the prompt after asynchronous output
pub fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}
