//! WebSocket implementation of the session channel.
//!
//! ## Tasks
//!
//! `WebSocketChannel::open` spawns one connection task that
//!
//! 1. connects,
//! 2. loads the cached session identifier once and sends `init`,
//! 3. multiplexes outbound messages, inbound frames and the close signal.
//!
//! A close during steps 1 or 2 abandons the connection: no `init` goes out
//! and the only state reported is `Closed`.
//!
//! The owner only talks to the task through channels: an mpsc queue for
//! outbound messages, a oneshot for close, a `watch` for the state and an
//! mpsc stream of [`ChannelEvent`]s back.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::{
    domain::{
        ChannelError, ChannelEvent, ChannelState, InboundEvent, OutboundMessage, SessionChannel,
        SessionStore,
    },
    infrastructure::dto::conversion::{decode_inbound, encode_outbound},
};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;
type WsSink = futures_util::stream::SplitSink<WsStream, Message>;

/// Session channel over a WebSocket connection
pub struct WebSocketChannel {
    state: watch::Receiver<ChannelState>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WebSocketChannel {
    /// Open a channel to `url`.
    ///
    /// Returns immediately in the `Connecting` state; progress is reported
    /// on the returned event stream. Must be called within a Tokio runtime.
    pub fn open(
        url: impl Into<String>,
        store: Arc<dyn SessionStore>,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let url = url.into();
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let connection = Connection {
            url,
            store,
            state: StateCell::new(state_tx, event_tx.clone()),
            events: event_tx,
        };
        let task = tokio::spawn(connection.run(outbound_rx, shutdown_rx));

        (
            Self {
                state: state_rx,
                outbound: outbound_tx,
                shutdown: Some(shutdown_tx),
                task: Some(task),
            },
            event_rx,
        )
    }

    /// Wait until the connection task has finished.
    ///
    /// Call after [`SessionChannel::close`] to let the close frame go out.
    pub async fn join(mut self) {
        self.close();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!("Channel task ended abnormally: {}", e);
        }
    }
}

impl SessionChannel for WebSocketChannel {
    fn state(&self) -> ChannelState {
        if self.shutdown.is_none() {
            return ChannelState::Closed;
        }
        *self.state.borrow()
    }

    fn send(&self, message: OutboundMessage) -> Result<(), ChannelError> {
        let state = self.state();
        if state != ChannelState::Open {
            return Err(ChannelError::NotOpen(state.to_string()));
        }
        self.outbound
            .send(message)
            .map_err(|_| ChannelError::Closed)
    }

    fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            tracing::debug!("Closing session channel");
            let _ = shutdown.send(());
        }
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        // Dropping the oneshot sender also stops the task; be explicit.
        self.close();
    }
}

/// Applies lifecycle transitions and reports them to the owner
struct StateCell {
    state: watch::Sender<ChannelState>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl StateCell {
    fn new(state: watch::Sender<ChannelState>, events: mpsc::UnboundedSender<ChannelEvent>) -> Self {
        Self { state, events }
    }

    fn set(&self, next: ChannelState) {
        let current = *self.state.borrow();
        if !current.can_transition_to(next) {
            tracing::debug!("Ignoring channel transition {} -> {}", current, next);
            return;
        }
        self.state.send_replace(next);
        tracing::debug!("Channel state {} -> {}", current, next);
        let _ = self.events.send(ChannelEvent::StateChanged(next));
    }

    /// Transport failure: `Errored` then `Closed`
    fn fail(&self) {
        self.set(ChannelState::Errored);
        self.set(ChannelState::Closed);
    }
}

struct Connection {
    url: String,
    store: Arc<dyn SessionStore>,
    state: StateCell,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl Connection {
    async fn run(
        self,
        mut outbound: mpsc::UnboundedReceiver<OutboundMessage>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        tracing::info!("Connecting to {}", self.url);

        let ws_stream = tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::debug!("Channel closed before the connection was established");
                self.state.set(ChannelState::Closed);
                return;
            }
            result = connect_async(self.url.as_str()) => match result {
                Ok((ws_stream, _response)) => ws_stream,
                Err(e) => {
                    tracing::error!("Failed to connect to {}: {}", self.url, e);
                    self.state.fail();
                    return;
                }
            },
        };

        let (mut write, mut read) = ws_stream.split();

        // Close still wins while the session is loaded and init is sent
        let init = tokio::select! {
            biased;
            _ = &mut shutdown => None,
            result = self.send_init(&mut write) => Some(result),
        };
        match init {
            None => {
                tracing::debug!("Channel closed before init was sent");
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!("Failed to send close frame: {}", e);
                }
                self.state.set(ChannelState::Closed);
                return;
            }
            Some(Err(e)) => {
                tracing::error!("Failed to send init message: {}", e);
                self.state.fail();
                return;
            }
            Some(Ok(())) => {}
        }

        self.state.set(ChannelState::Open);
        tracing::info!("Connected to {}", self.url);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    if let Err(e) = write.send(Message::Close(None)).await {
                        tracing::debug!("Failed to send close frame: {}", e);
                    }
                    self.state.set(ChannelState::Closed);
                    tracing::info!("Connection closed");
                    break;
                }
                Some(message) = outbound.recv() => {
                    if let Err(e) = send_message(&mut write, &message).await {
                        tracing::warn!("Failed to send message: {}", e);
                        self.state.fail();
                        break;
                    }
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        self.handle_text(text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Server closed the connection");
                        self.state.set(ChannelState::Closed);
                        break;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!("Ignoring {} bytes of binary data", data.len());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket read error: {}", e);
                        self.state.fail();
                        break;
                    }
                },
            }
        }
    }

    /// Read the cached session identifier (once per connection) and send `init`
    async fn send_init(&self, write: &mut WsSink) -> Result<(), ChannelError> {
        let session_id = match self.store.load().await {
            Ok(session_id) => session_id,
            Err(e) => {
                tracing::warn!("Could not read cached session identifier: {}", e);
                None
            }
        };
        if session_id.is_some() {
            tracing::info!("Resuming previous session");
        }

        send_message(write, &OutboundMessage::Init { session_id }).await
    }

    async fn handle_text(&self, text: &str) {
        tracing::debug!("Received: {}", text);

        let events = match decode_inbound(text) {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!("Failed to parse inbound message: {}", e);
                Vec::new()
            }
        };

        for event in &events {
            if let InboundEvent::SessionAssigned(session_id) = event
                && let Err(e) = self.store.save(session_id).await
            {
                tracing::warn!("Failed to persist session identifier: {}", e);
            }
        }

        let _ = self.events.send(ChannelEvent::Received(events));
    }
}

async fn send_message(write: &mut WsSink, message: &OutboundMessage) -> Result<(), ChannelError> {
    let json = encode_outbound(message).map_err(|e| ChannelError::Serialize(e.to_string()))?;
    tracing::debug!("Sending: {}", json);
    write
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| {
            tracing::debug!("WebSocket write error: {}", e);
            ChannelError::Closed
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockSessionStore, SessionId, StoreError},
        infrastructure::session_store::InMemorySessionStore,
    };
    use async_trait::async_trait;
    use tokio::{
        io::AsyncReadExt,
        sync::Notify,
        time::{Duration, timeout},
    };

    const WAIT: Duration = Duration::from_secs(5);

    /// Store whose load signals that it started and then hangs
    struct StallingSessionStore {
        loading: Arc<Notify>,
    }

    #[async_trait]
    impl SessionStore for StallingSessionStore {
        async fn load(&self) -> Result<Option<SessionId>, StoreError> {
            self.loading.notify_one();
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn save(&self, _session_id: &SessionId) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Every event until the connection task has finished
    async fn drain_events(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> Vec<ChannelEvent> {
        let mut drained = Vec::new();
        while let Some(event) = timeout(WAIT, events.recv()).await.unwrap() {
            drained.push(event);
        }
        drained
    }

    #[tokio::test]
    async fn test_connect_failure_ends_in_closed() {
        // テスト項目: 接続に失敗した場合 errored を経て closed になる
        // given (前提条件):
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let store = Arc::new(InMemorySessionStore::new());

        // when (操作):
        let (channel, mut events) = WebSocketChannel::open(format!("ws://{}/api/chat", addr), store);
        let first = events.recv().await;
        let second = events.recv().await;

        // then (期待する結果):
        assert_eq!(first, Some(ChannelEvent::StateChanged(ChannelState::Errored)));
        assert_eq!(second, Some(ChannelEvent::StateChanged(ChannelState::Closed)));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    #[tokio::test]
    async fn test_send_before_open_is_rejected() {
        // テスト項目: 接続確立前の送信は拒否される
        // given (前提条件):
        let store = Arc::new(InMemorySessionStore::new());
        let (channel, _events) = WebSocketChannel::open("ws://127.0.0.1:9/api/chat", store);

        // when (操作):
        let result = channel.send(OutboundMessage::Init { session_id: None });

        // then (期待する結果):
        assert!(matches!(result, Err(ChannelError::NotOpen(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        // テスト項目: close は何度呼んでも安全で、状態は closed になる
        // given (前提条件):
        let store = Arc::new(InMemorySessionStore::new());
        let (mut channel, _events) = WebSocketChannel::open("ws://127.0.0.1:9/api/chat", store);

        // when (操作):
        channel.close();
        channel.close();

        // then (期待する結果):
        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(!channel.is_open());
        channel.join().await;
    }

    #[tokio::test]
    async fn test_store_failure_falls_back_to_fresh_session() {
        // テスト項目: セッション ID の読み込みに失敗しても新規セッションとして接続し、発行された ID を保存する
        // given (前提条件):
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let init = ws.next().await.unwrap().unwrap();
            let greeting = r#"{"user_id":"issued-1","chat_history":[]}"#.to_string();
            ws.send(Message::Text(greeting.into())).await.unwrap();
            init.into_text().unwrap().as_str().to_string()
        });

        let mut store = MockSessionStore::new();
        store
            .expect_load()
            .times(1)
            .returning(|| Err(StoreError::NoDataDir));
        store
            .expect_save()
            .withf(|session_id| session_id.as_str() == "issued-1")
            .times(1)
            .returning(|_| Ok(()));

        // when (操作):
        let (channel, mut events) = WebSocketChannel::open(format!("ws://{}", addr), Arc::new(store));
        let init = server.await.unwrap();
        let received = loop {
            match events.recv().await {
                Some(ChannelEvent::Received(received)) => break received,
                Some(ChannelEvent::StateChanged(_)) => continue,
                None => panic!("channel event stream ended"),
            }
        };

        // then (期待する結果):
        assert_eq!(init, r#"{"type":"init"}"#);
        assert_eq!(
            received,
            vec![
                InboundEvent::SessionAssigned(SessionId::new("issued-1").unwrap()),
                InboundEvent::HistoryReplaced(Vec::new()),
            ]
        );
        channel.join().await;
    }

    #[tokio::test]
    async fn test_close_during_session_load_sends_no_init() {
        // テスト項目: セッション ID の読み込み中に close した場合、init は送信されず open にもならない
        // given (前提条件):
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let mut frames = Vec::new();
            while let Some(Ok(frame)) = ws.next().await {
                frames.push(frame);
            }
            frames
        });
        let loading = Arc::new(Notify::new());
        let store = Arc::new(StallingSessionStore {
            loading: loading.clone(),
        });
        let (mut channel, mut events) = WebSocketChannel::open(format!("ws://{}", addr), store);
        timeout(WAIT, loading.notified()).await.unwrap();

        // when (操作):
        channel.close();
        channel.close();
        timeout(WAIT, channel.join()).await.unwrap();

        // then (期待する結果):
        let frames = timeout(WAIT, server).await.unwrap().unwrap();
        assert!(
            !frames.iter().any(Message::is_text),
            "unexpected frames: {:?}",
            frames
        );
        assert_eq!(
            drain_events(&mut events).await,
            vec![ChannelEvent::StateChanged(ChannelState::Closed)]
        );
    }

    #[tokio::test]
    async fn test_close_during_handshake_abandons_connection() {
        // テスト項目: WebSocket ハンドシェイク中に close した場合、接続は破棄され closed のみが通知される
        // given (前提条件):
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (accepted_tx, accepted_rx) = oneshot::channel();
        let server = tokio::spawn(async move {
            // Accepts TCP but never answers the upgrade request
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = accepted_tx.send(());
            let mut received = Vec::new();
            let _ = stream.read_to_end(&mut received).await;
            received
        });
        let store = Arc::new(InMemorySessionStore::new());
        let (mut channel, mut events) = WebSocketChannel::open(format!("ws://{}", addr), store);
        timeout(WAIT, accepted_rx).await.unwrap().unwrap();

        // when (操作):
        channel.close();
        channel.close();
        timeout(WAIT, channel.join()).await.unwrap();

        // then (期待する結果):
        assert_eq!(
            drain_events(&mut events).await,
            vec![ChannelEvent::StateChanged(ChannelState::Closed)]
        );
        let received = timeout(WAIT, server).await.unwrap().unwrap();
        let bytes_after_request = match received.windows(4).position(|w| w == b"\r\n\r\n") {
            Some(end) => received.len() - (end + 4),
            None => 0,
        };
        assert_eq!(bytes_after_request, 0);
    }
}
