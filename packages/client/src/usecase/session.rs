//! UseCase: registration session (form + chat kept in sync with the service)
//!
//! `RegistrationSession` is the single owner of the form store, the
//! conversation log and the channel. Every state transition goes through one
//! of its methods, which the runner calls from a single task:
//!
//! - user input: `set_field`, `submit_chat`
//! - debounce timer: `flush_form`
//! - channel traffic: `handle_channel_event`
//! - reply deadline: `expire_pending`
//!
//! Only local edits are pushed into the debouncer. Remote form patches are
//! merged without scheduling a sync, so they never echo back to the service.

use tokio::{
    sync::mpsc,
    time::{Duration, Instant},
};

use crate::{
    config::SessionConfig,
    debounce::Debouncer,
    domain::{
        ChannelEvent, ChannelState, ChatMessage, ConversationLog, FormField, FormStore,
        InboundEvent, LocalEdit, RegistrationForm, SessionChannel, SessionId,
    },
};

/// What changed after handling an event, for the view to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    StateChanged(ChannelState),
    SessionAssigned(SessionId),
    MessageAppended(ChatMessage),
    /// The whole conversation was replaced; carries the new length
    HistoryReplaced(usize),
    /// Fields changed by a remote patch
    FormPatched(Vec<FormField>),
    TestsRecommended(Vec<String>),
    PendingCleared,
    ReplyTimedOut,
}

/// Registration session bound to one channel
pub struct RegistrationSession<C: SessionChannel> {
    channel: C,
    form: FormStore,
    conversation: ConversationLog,
    debouncer: Debouncer<LocalEdit>,
    session_id: Option<SessionId>,
    recommended_tests: Vec<String>,
    reply_timeout: Duration,
    reply_deadline: Option<Instant>,
}

impl<C: SessionChannel> RegistrationSession<C> {
    /// Create a session around an already opened channel.
    ///
    /// # Returns
    ///
    /// The session and the stream of settled local edits; feed each one
    /// back into [`RegistrationSession::flush_form`].
    pub fn new(channel: C, config: SessionConfig) -> (Self, mpsc::UnboundedReceiver<LocalEdit>) {
        let (debouncer, settled) = Debouncer::new(config.debounce);
        (
            Self {
                channel,
                form: FormStore::new(),
                conversation: ConversationLog::new(),
                debouncer,
                session_id: None,
                recommended_tests: Vec::new(),
                reply_timeout: config.reply_timeout,
                reply_deadline: None,
            },
            settled,
        )
    }

    pub fn form(&self) -> &RegistrationForm {
        self.form.form()
    }

    pub fn conversation(&self) -> &ConversationLog {
        &self.conversation
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn recommended_tests(&self) -> &[String] {
        &self.recommended_tests
    }

    /// When the pending reply indicator will be given up on
    pub fn reply_deadline(&self) -> Option<Instant> {
        self.reply_deadline
    }

    /// Local edit: update the store and (re)start the debounce wait
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let edit = self.form.set_field(field, value);
        tracing::debug!("Local edit of '{}' (revision {})", field, edit.revision);
        self.debouncer.push(edit);
    }

    /// Debounce fired: push the current form to the service.
    ///
    /// The current snapshot is sent, so remote patches merged since the edit
    /// are included. Returns whether an update was queued.
    pub fn flush_form(&mut self, edit: LocalEdit) -> bool {
        tracing::debug!("Syncing form at revision {}", edit.revision);
        self.channel.send_form_update(self.form.form())
    }

    /// Send a chat message.
    ///
    /// Whitespace-only text or a channel that is not open leaves everything
    /// untouched. On success the message is appended to the log and the
    /// reply indicator is raised.
    pub fn submit_chat(&mut self, text: &str) -> Option<ChatMessage> {
        if !self.channel.send_chat(text, self.session_id.as_ref()) {
            return None;
        }

        let message = self.conversation.append_local(text).clone();
        self.conversation.mark_pending();
        self.reply_deadline = Some(Instant::now() + self.reply_timeout);
        Some(message)
    }

    /// Apply one event from the channel
    pub fn handle_channel_event(&mut self, event: ChannelEvent) -> Vec<SessionUpdate> {
        match event {
            ChannelEvent::StateChanged(state) => {
                tracing::debug!("Channel is now {}", state);
                vec![SessionUpdate::StateChanged(state)]
            }
            ChannelEvent::Received(events) => self.handle_inbound(events),
        }
    }

    fn handle_inbound(&mut self, events: Vec<InboundEvent>) -> Vec<SessionUpdate> {
        let mut updates = Vec::new();

        for event in events {
            match event {
                InboundEvent::SessionAssigned(session_id) => {
                    tracing::info!("Session identifier assigned: {}", session_id);
                    self.session_id = Some(session_id.clone());
                    updates.push(SessionUpdate::SessionAssigned(session_id));
                }
                InboundEvent::HistoryReplaced(entries) => {
                    self.conversation.replace_all(entries);
                    updates.push(SessionUpdate::HistoryReplaced(self.conversation.len()));
                }
                InboundEvent::IncrementalUpdate { reply, form } => {
                    if let Some(reply) = reply {
                        let message = self.conversation.append_remote(reply).clone();
                        updates.push(SessionUpdate::MessageAppended(message));
                    }
                    if let Some(patch) = form {
                        let changed = self.form.merge_remote(&patch);
                        if !changed.is_empty() {
                            updates.push(SessionUpdate::FormPatched(changed));
                        }
                    }
                }
                InboundEvent::TestsRecommended(tests) => {
                    self.recommended_tests = tests.clone();
                    updates.push(SessionUpdate::TestsRecommended(tests));
                }
            }
        }

        // Any inbound message ends the wait, even an undecodable one
        self.reply_deadline = None;
        if self.conversation.clear_pending() {
            updates.push(SessionUpdate::PendingCleared);
        }

        updates
    }

    /// Reply deadline reached: drop the indicator.
    pub fn expire_pending(&mut self) -> Option<SessionUpdate> {
        let deadline = self.reply_deadline?;
        if Instant::now() < deadline {
            return None;
        }

        self.reply_deadline = None;
        if self.conversation.clear_pending() {
            tracing::warn!(
                "No reply from the assistant within {:?}",
                self.reply_timeout
            );
            return Some(SessionUpdate::ReplyTimedOut);
        }
        None
    }

    /// Teardown: cancel the pending sync and close the channel
    pub fn shutdown(&mut self) {
        self.debouncer.cancel();
        self.channel.close();
    }

    /// Give the channel back, e.g. to wait for its close to complete
    pub fn into_channel(self) -> C {
        self.channel
    }
}
