//! Debouncer: delays a changing value until it has been stable for a while.
//!
//! Values are pushed into a background task that keeps only the newest one.
//! It is emitted on the output stream once no newer value arrived for
//! `delay`. Dropping the [`Debouncer`] aborts the task, so nothing is emitted
//! after teardown.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

enum DebounceInput<T> {
    Value(T),
    Cancel,
}

/// Handle to a running debounce task.
pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<DebounceInput<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the debounce task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Returns
    ///
    /// The debouncer handle and the receiver of settled values
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce_loop(delay, input_rx, output_tx));

        (
            Self {
                input: input_tx,
                task,
            },
            output_rx,
        )
    }

    /// Record a new value and restart the wait.
    pub fn push(&self, value: T) {
        if self.input.send(DebounceInput::Value(value)).is_err() {
            tracing::debug!("Debounce task has stopped, value dropped");
        }
    }

    /// Discard the pending value, if any, without stopping the task.
    pub fn cancel(&self) {
        let _ = self.input.send(DebounceInput::Cancel);
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce_loop<T>(
    delay: Duration,
    mut input: mpsc::UnboundedReceiver<DebounceInput<T>>,
    output: mpsc::UnboundedSender<T>,
) {
    let mut pending: Option<T> = None;

    loop {
        match pending.take() {
            None => match input.recv().await {
                Some(DebounceInput::Value(value)) => pending = Some(value),
                Some(DebounceInput::Cancel) => {}
                None => return,
            },
            Some(value) => {
                tokio::select! {
                    next = input.recv() => match next {
                        Some(DebounceInput::Value(newer)) => pending = Some(newer),
                        Some(DebounceInput::Cancel) => {}
                        // Input closed: drop the pending value
                        None => return,
                    },
                    _ = tokio::time::sleep(delay) => {
                        if output.send(value).is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}
