//! Session channel capability.
//!
//! The channel owns one bidirectional connection to the registration
//! service. Outbound traffic goes through [`SessionChannel`]; inbound traffic
//! is decoded once at the boundary into [`InboundEvent`]s and delivered as a
//! stream of [`ChannelEvent`]s returned when the channel is opened.

use std::fmt;

use super::{ChannelError, ChatMessage, FormPatch, RegistrationForm, SessionId};

/// Reply the service sends to acknowledge a form update with no chat content.
pub const FORM_ACK_SENTINEL: &str = "Cập nhật form thành công.";

/// Connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Errored,
    Closed,
}

impl ChannelState {
    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// `Closed` is terminal. `Errored` only ever leads to `Closed`.
    pub fn can_transition_to(self, next: ChannelState) -> bool {
        use ChannelState::*;
        matches!(
            (self, next),
            (Connecting, Open)
                | (Connecting, Errored)
                | (Connecting, Closed)
                | (Open, Errored)
                | (Open, Closed)
                | (Errored, Closed)
        )
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Errored => "errored",
            ChannelState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Messages sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// First message on a fresh connection
    Init { session_id: Option<SessionId> },
    /// Full snapshot of the form
    FormUpdate { form: RegistrationForm },
    /// User chat input
    Chat {
        message: String,
        session_id: Option<SessionId>,
    },
}

/// Inbound payload after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The service issued (or confirmed) the session identifier
    SessionAssigned(SessionId),
    /// Authoritative replacement of the whole conversation
    HistoryReplaced(Vec<ChatMessage>),
    /// Reply and/or form patch; the sentinel reply is already filtered out
    IncrementalUpdate {
        reply: Option<String>,
        form: Option<FormPatch>,
    },
    /// Examinations suggested for the reported symptoms
    TestsRecommended(Vec<String>),
}

/// What the channel reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    StateChanged(ChannelState),
    /// One inbound text frame. Empty when the frame could not be decoded.
    Received(Vec<InboundEvent>),
}

/// Capability interface of a session channel: `send` and `close`, with the
/// `connect` side handled by the implementation's constructor and inbound
/// messages delivered as a [`ChannelEvent`] stream.
pub trait SessionChannel: Send {
    fn state(&self) -> ChannelState;

    /// Queue a message. Fails unless the channel is open.
    fn send(&self, message: OutboundMessage) -> Result<(), ChannelError>;

    /// Close the connection. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Best-effort form sync. Returns whether the update was queued.
    fn send_form_update(&self, form: &RegistrationForm) -> bool {
        if !self.is_open() {
            tracing::debug!("Skipping form update: channel is {}", self.state());
            return false;
        }
        match self.send(OutboundMessage::FormUpdate { form: form.clone() }) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Form update dropped: {}", e);
                false
            }
        }
    }

    /// Send a chat message if it has content and the channel is open.
    fn send_chat(&self, text: &str, session_id: Option<&SessionId>) -> bool {
        if text.trim().is_empty() {
            tracing::debug!("Ignoring empty chat message");
            return false;
        }
        if !self.is_open() {
            tracing::debug!("Skipping chat message: channel is {}", self.state());
            return false;
        }
        let message = OutboundMessage::Chat {
            message: text.to_string(),
            session_id: session_id.cloned(),
        };
        match self.send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Chat message dropped: {}", e);
                false
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingChannel;
    use super::*;

    #[test]
    fn test_state_transitions_follow_lifecycle() {
        // テスト項目: 状態遷移はライフサイクルに従ったものだけが許可される
        // given (前提条件):
        use ChannelState::*;

        // when (操作) / then (期待する結果):
        assert!(Connecting.can_transition_to(Open));
        assert!(Open.can_transition_to(Errored));
        assert!(Errored.can_transition_to(Closed));
        assert!(Open.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Errored.can_transition_to(Open));
        assert!(!Open.can_transition_to(Connecting));
    }

    #[test]
    fn test_send_form_update_when_open() {
        // テスト項目: 接続中はフォーム更新が送信される
        // given (前提条件):
        let channel = RecordingChannel::new(ChannelState::Open);
        let mut form = RegistrationForm::default();
        form.name = "Alice".to_string();

        // when (操作):
        let sent = channel.send_form_update(&form);

        // then (期待する結果):
        assert!(sent);
        assert_eq!(channel.sent(), vec![OutboundMessage::FormUpdate { form }]);
    }

    #[test]
    fn test_send_form_update_is_noop_when_not_open() {
        // テスト項目: 未接続の場合フォーム更新は黙って破棄される
        // given (前提条件):
        let channel = RecordingChannel::new(ChannelState::Connecting);

        // when (操作):
        let sent = channel.send_form_update(&RegistrationForm::default());

        // then (期待する結果):
        assert!(!sent);
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_send_chat_ignores_whitespace_only_text() {
        // テスト項目: 空白のみのチャットは送信されない
        // given (前提条件):
        let channel = RecordingChannel::new(ChannelState::Open);

        // when (操作):
        let sent = channel.send_chat("   ", None);

        // then (期待する結果):
        assert!(!sent);
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_send_chat_is_noop_when_closed() {
        // テスト項目: 切断後のチャットは送信されない
        // given (前提条件):
        let channel = RecordingChannel::new(ChannelState::Closed);

        // when (操作):
        let sent = channel.send_chat("xin chào", None);

        // then (期待する結果):
        assert!(!sent);
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_send_chat_carries_text_verbatim_and_session() {
        // テスト項目: チャットは本文をそのまま、セッション ID 付きで送信される
        // given (前提条件):
        let channel = RecordingChannel::new(ChannelState::Open);
        let session_id = SessionId::new("abc").unwrap();

        // when (操作):
        let sent = channel.send_chat(" đau đầu ", Some(&session_id));

        // then (期待する結果):
        assert!(sent);
        assert_eq!(
            channel.sent(),
            vec![OutboundMessage::Chat {
                message: " đau đầu ".to_string(),
                session_id: Some(session_id),
            }]
        );
    }
}
