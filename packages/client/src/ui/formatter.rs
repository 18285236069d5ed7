//! Rendering of the session for the terminal.

use vitalink_shared::time::{Clock, SystemClock, timestamp_to_ict_clock};

use crate::domain::{ChannelState, ChatMessage, FormField, RegistrationForm, Sender, SessionId};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";
const EMPTY_VALUE: &str = "-";

/// Terminal view of a registration session
pub struct TerminalView<C: Clock = SystemClock> {
    clock: C,
}

impl TerminalView<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for TerminalView<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TerminalView<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    fn now(&self) -> String {
        timestamp_to_ict_clock(self.clock.now_millis())
    }

    pub fn format_welcome(&self, url: &str) -> String {
        format!(
            "\nVitalink patient registration ({})\n\
             Type a message to talk to the assistant, or /help for commands.\n\n",
            url
        )
    }

    /// Form pane: one line per field in display order
    pub fn format_form(&self, form: &RegistrationForm) -> String {
        let width = FormField::ALL
            .iter()
            .map(|field| field.label().chars().count())
            .max()
            .unwrap_or(0);

        let mut output = String::new();
        output.push_str(&format!("\n{}\nRegistration form\n{}\n", RULE, THIN_RULE));
        for field in FormField::ALL {
            let value = form.get(field);
            let value = if value.is_empty() { EMPTY_VALUE } else { value };
            output.push_str(&format!(
                "{:<width$} : {}\n",
                field.label(),
                value,
                width = width
            ));
        }
        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Fields that a remote patch changed
    pub fn format_form_patched(&self, fields: &[FormField], form: &RegistrationForm) -> String {
        let mut output = format!("\n[{}] form updated by the assistant:\n", self.now());
        for field in fields {
            let value = form.get(*field);
            let value = if value.is_empty() { EMPTY_VALUE } else { value };
            output.push_str(&format!("  {} = {}\n", field.label(), value));
        }
        output
    }

    pub fn format_field_set(&self, field: FormField, value: &str) -> String {
        if value.is_empty() {
            format!("{} cleared\n", field.label())
        } else {
            format!("{} = {}\n", field.label(), value)
        }
    }

    pub fn format_message(&self, message: &ChatMessage) -> String {
        let who = match message.sender() {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        format!("\n[{}] {}: {}\n", self.now(), who, message.text())
    }

    /// Whole conversation, oldest first
    pub fn format_history(&self, messages: &[ChatMessage]) -> String {
        let mut output = format!("\n{}\n", THIN_RULE);
        if messages.is_empty() {
            output.push_str("(No messages yet)\n");
        }
        for message in messages {
            let who = match message.sender() {
                Sender::User => "you",
                Sender::Bot => "bot",
            };
            output.push_str(&format!("{}: {}\n", who, message.text()));
        }
        output.push_str(THIN_RULE);
        output.push('\n');
        output
    }

    pub fn format_thinking(&self) -> String {
        "bot is thinking...\n".to_string()
    }

    pub fn format_reply_timeout(&self) -> String {
        format!(
            "\n[{}] no reply from the assistant, you can try again\n",
            self.now()
        )
    }

    pub fn format_tests(&self, tests: &[String]) -> String {
        let mut output = String::from("\nRecommended tests:\n");
        for test in tests {
            output.push_str(&format!("  - {}\n", test));
        }
        output
    }

    pub fn format_state(&self, state: ChannelState) -> String {
        let note = match state {
            ChannelState::Connecting => "connecting to the registration service",
            ChannelState::Open => "connected",
            ChannelState::Errored => "connection error",
            ChannelState::Closed => "disconnected; edits now stay local, /quit to exit",
        };
        format!("\n[{}] {}\n", self.now(), note)
    }

    pub fn format_status(
        &self,
        state: ChannelState,
        session_id: Option<&SessionId>,
        form: &RegistrationForm,
    ) -> String {
        let session = session_id.map(SessionId::as_str).unwrap_or("(not assigned)");
        format!(
            "channel: {}\nsession: {}\nform: {}/{} fields filled\n",
            state,
            session,
            form.filled_fields().len(),
            FormField::ALL.len()
        )
    }

    pub fn format_history_replaced(&self, count: usize) -> String {
        format!("\n[{}] conversation restored ({} messages)\n", self.now(), count)
    }

    pub fn format_error(&self, error: &dyn std::error::Error) -> String {
        format!("error: {}\n", error)
    }

    pub fn format_help(&self) -> String {
        let fields = FormField::ALL
            .iter()
            .map(|field| field.key())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Commands:\n  \
             <text>                 send a message to the assistant\n  \
             /set <field> <value>   edit a form field (no value clears it)\n  \
             /form                  show the registration form\n  \
             /history               show the conversation\n  \
             /status                show the connection state\n  \
             /help                  show this help\n  \
             /quit                  exit\n\
             Fields: {}\n",
            fields
        )
    }
}
