//! Client execution logic.
//!
//! One task owns the [`RegistrationSession`] and multiplexes four sources:
//! prompt lines, settled form edits, channel events and the reply deadline.

use std::ops::ControlFlow;

use tokio::time::{Instant, sleep_until};
use vitalink_shared::time::Clock;

use crate::{
    config::ClientConfig,
    domain::SessionChannel,
    error::ClientError,
    infrastructure::channel::WebSocketChannel,
    usecase::{RegistrationSession, SessionUpdate},
};

use super::{
    command::Command,
    formatter::TerminalView,
    prompt::{PROMPT, redisplay_prompt, spawn_prompt},
};

/// Run the registration client until the user quits
///
/// # Errors
///
/// Fails when the session store or the terminal cannot be set up. Transport
/// failures are not errors: the channel closes and the form stays editable.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let store = config.session_store()?;
    let view = TerminalView::new();
    let mut lines = spawn_prompt(PROMPT).await?;

    let (channel, mut channel_events) = WebSocketChannel::open(config.url.as_str(), store);
    let (mut session, mut settled) = RegistrationSession::new(channel, config.session);

    print!("{}", view.format_welcome(&config.url));
    redisplay_prompt(PROMPT);

    let mut channel_events_open = true;

    loop {
        let deadline = session.reply_deadline();

        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    break;
                };
                match execute_line(&mut session, &view, &line) {
                    ControlFlow::Continue(output) => {
                        print!("{}", output);
                        redisplay_prompt(PROMPT);
                    }
                    ControlFlow::Break(()) => break,
                }
            }
            Some(edit) = settled.recv() => {
                session.flush_form(edit);
            }
            event = channel_events.recv(), if channel_events_open => match event {
                Some(event) => {
                    let updates = session.handle_channel_event(event);
                    print_updates(&session, &view, &updates);
                }
                None => channel_events_open = false,
            },
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(update) = session.expire_pending() {
                    print_updates(&session, &view, &[update]);
                }
            }
        }
    }

    tracing::info!("Shutting down");
    session.shutdown();
    session.into_channel().join().await;

    Ok(())
}

fn print_updates<C: SessionChannel, K: Clock>(
    session: &RegistrationSession<C>,
    view: &TerminalView<K>,
    updates: &[SessionUpdate],
) {
    let output: String = updates
        .iter()
        .filter_map(|update| render_update(session, view, update))
        .collect();
    if !output.is_empty() {
        print!("{}", output);
        redisplay_prompt(PROMPT);
    }
}

/// Text for one session update, if it is worth showing
pub fn render_update<C: SessionChannel, K: Clock>(
    session: &RegistrationSession<C>,
    view: &TerminalView<K>,
    update: &SessionUpdate,
) -> Option<String> {
    match update {
        SessionUpdate::StateChanged(state) => Some(view.format_state(*state)),
        SessionUpdate::SessionAssigned(_) | SessionUpdate::PendingCleared => None,
        SessionUpdate::MessageAppended(message) => Some(view.format_message(message)),
        SessionUpdate::HistoryReplaced(count) => Some(format!(
            "{}{}",
            view.format_history_replaced(*count),
            view.format_history(session.conversation().messages())
        )),
        SessionUpdate::FormPatched(fields) => {
            Some(view.format_form_patched(fields, session.form()))
        }
        SessionUpdate::TestsRecommended(tests) if tests.is_empty() => None,
        SessionUpdate::TestsRecommended(tests) => Some(view.format_tests(tests)),
        SessionUpdate::ReplyTimedOut => Some(view.format_reply_timeout()),
    }
}

/// Apply one prompt line.
///
/// Returns the text to print, or `Break` when the user asked to quit.
pub fn execute_line<C: SessionChannel, K: Clock>(
    session: &mut RegistrationSession<C>,
    view: &TerminalView<K>,
    line: &str,
) -> ControlFlow<(), String> {
    let command = match Command::parse(line) {
        Ok(command) => command,
        Err(e) => return ControlFlow::Continue(view.format_error(&e)),
    };

    let output = match command {
        Command::Chat(text) => match session.submit_chat(&text) {
            Some(message) => format!(
                "{}{}",
                view.format_message(&message),
                view.format_thinking()
            ),
            None if text.trim().is_empty() => String::new(),
            None => format!(
                "not sent: the channel is {}\n",
                session.channel_state()
            ),
        },
        Command::Set { field, value } => {
            let output = view.format_field_set(field, &value);
            session.set_field(field, value);
            output
        }
        Command::ShowForm => view.format_form(session.form()),
        Command::ShowHistory => view.format_history(session.conversation().messages()),
        Command::Status => {
            let mut output = view.format_status(
                session.channel_state(),
                session.session_id(),
                session.form(),
            );
            if session.conversation().is_pending() {
                output.push_str(&view.format_thinking());
            }
            output
        }
        Command::Help => view.format_help(),
        Command::Quit => return ControlFlow::Break(()),
    };

    ControlFlow::Continue(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SessionConfig,
        domain::{
            ChannelEvent, ChannelState, FormField, InboundEvent, OutboundMessage,
            channel::testing::RecordingChannel,
        },
    };
    use vitalink_shared::time::FixedClock;

    const NOW: i64 = 1672540215000;

    fn setup(state: ChannelState) -> (RegistrationSession<RecordingChannel>, RecordingChannel) {
        let channel = RecordingChannel::new(state);
        let (session, _settled) = RegistrationSession::new(channel.clone(), SessionConfig::default());
        (session, channel)
    }

    fn view() -> TerminalView<FixedClock> {
        TerminalView::with_clock(FixedClock::new(NOW))
    }

    #[tokio::test]
    async fn test_chat_line_is_sent_and_echoed() {
        // テスト項目: チャット行は送信され、送信内容と待機表示が出力される
        // given (前提条件):
        let (mut session, channel) = setup(ChannelState::Open);

        // when (操作):
        let result = execute_line(&mut session, &view(), "đau đầu");

        // then (期待する結果):
        assert_eq!(
            result,
            ControlFlow::Continue("\n[09:30:15] you: đau đầu\nbot is thinking...\n".to_string())
        );
        assert_eq!(channel.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_line_while_disconnected_is_reported() {
        // テスト項目: 未接続時のチャットは送信されずに通知される
        // given (前提条件):
        let (mut session, channel) = setup(ChannelState::Closed);

        // when (操作):
        let result = execute_line(&mut session, &view(), "hello");

        // then (期待する結果):
        assert_eq!(
            result,
            ControlFlow::Continue("not sent: the channel is closed\n".to_string())
        );
        assert!(channel.sent().is_empty());
        assert!(session.conversation().is_empty());
    }

    #[tokio::test]
    async fn test_set_line_edits_form() {
        // テスト項目: /set 行でフォームが編集される
        // given (前提条件):
        let (mut session, _channel) = setup(ChannelState::Open);

        // when (操作):
        let result = execute_line(&mut session, &view(), "/set province Hà Nội");

        // then (期待する結果):
        assert!(matches!(result, ControlFlow::Continue(_)));
        assert_eq!(session.form().get(FormField::Province), "Hà Nội");
    }

    #[tokio::test]
    async fn test_invalid_command_prints_error() {
        // テスト項目: 不正なコマンドはエラーとして表示され、状態は変わらない
        // given (前提条件):
        let (mut session, channel) = setup(ChannelState::Open);

        // when (操作):
        let result = execute_line(&mut session, &view(), "/set weight 60");

        // then (期待する結果):
        assert_eq!(
            result,
            ControlFlow::Continue("error: Unknown form field 'weight'\n".to_string())
        );
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_quit_breaks() {
        // テスト項目: /quit でループを抜ける
        // given (前提条件):
        let (mut session, _channel) = setup(ChannelState::Open);

        // when (操作):
        let result = execute_line(&mut session, &view(), "/quit");

        // then (期待する結果):
        assert_eq!(result, ControlFlow::Break(()));
    }

    #[tokio::test]
    async fn test_render_history_replacement_shows_conversation() {
        // テスト項目: 履歴の置き換えで会話全体が表示される
        // given (前提条件):
        let (mut session, _channel) = setup(ChannelState::Open);
        let updates = session.handle_channel_event(ChannelEvent::Received(vec![
            InboundEvent::HistoryReplaced(vec![crate::domain::ChatMessage::bot("Xin chào")]),
        ]));

        // when (操作):
        let rendered: Vec<_> = updates
            .iter()
            .filter_map(|update| render_update(&session, &view(), update))
            .collect();

        // then (期待する結果):
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("conversation restored (1 messages)"));
        assert!(rendered[0].contains("bot: Xin chào"));
    }

    #[tokio::test]
    async fn test_render_skips_silent_updates() {
        // テスト項目: 表示不要な更新は何も出力しない
        // given (前提条件):
        let (session, _channel) = setup(ChannelState::Open);

        // when (操作):
        let cleared = render_update(&session, &view(), &SessionUpdate::PendingCleared);
        let no_tests = render_update(&session, &view(), &SessionUpdate::TestsRecommended(vec![]));

        // then (期待する結果):
        assert_eq!(cleared, None);
        assert_eq!(no_tests, None);
    }

    #[tokio::test]
    async fn test_status_shows_channel_and_pending() {
        // テスト項目: /status で接続状態と待機中であることが表示される
        // given (前提条件):
        let (mut session, channel) = setup(ChannelState::Open);
        execute_line(&mut session, &view(), "hello");

        // when (操作):
        let result = execute_line(&mut session, &view(), "/status");

        // then (期待する結果):
        assert_eq!(
            result,
            ControlFlow::Continue(
                "channel: open\nsession: (not assigned)\nform: 0/11 fields filled\nbot is thinking...\n".to_string()
            )
        );
        assert_eq!(
            channel.sent(),
            vec![OutboundMessage::Chat {
                message: "hello".to_string(),
                session_id: None,
            }]
        );
    }
}
