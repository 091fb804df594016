//! 视频通话信令通道
//!
//! One STOMP session over a WebSocket. The socket is owned by a driver task;
//! the channel hands it frames through an unbounded queue, so subscribe/send/
//! unsubscribe never block. Inbound MESSAGE frames are dispatched to room
//! callbacks on the driver task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dancing_config::SignalingConfig;
use dashmap::DashMap;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};

use crate::frame::{decode_all, Command, Frame, FrameError};

/// Broker topic prefix for room broadcasts
pub const ROOM_TOPIC_PREFIX: &str = "/topic/room/";
/// Application destination for outgoing signals
pub const SIGNAL_DESTINATION: &str = "/app/video-call/signal";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Room message callback
pub type SignalCallback = Arc<dyn Fn(Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    #[error("A connect attempt is already in progress")]
    ConnectInProgress,

    #[error("Invalid signaling endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// Broker answered CONNECT with an ERROR frame.
    #[error("Broker rejected connection: {0}")]
    Rejected(String),

    #[error("Connection closed before CONNECTED")]
    Closed,

    #[error("Connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Outgoing heart-beat we offer; zero disables heart-beats.
    pub heartbeat: Duration,
    /// Skip certificate checks on `wss://` (self-signed dev backends)
    pub accept_invalid_certs: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::from(&SignalingConfig::default())
    }
}

impl From<&SignalingConfig> for ChannelConfig {
    fn from(config: &SignalingConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_seconds),
            heartbeat: Duration::from_millis(config.heartbeat_ms),
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }
}

/// Broker-side subscription for one room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: String,
    room_id: String,
}

impl SubscriptionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn destination(&self) -> String {
        format!("{}{}", ROOM_TOPIC_PREFIX, self.room_id)
    }
}

enum DriverCommand {
    Frame(Frame),
    Close,
}

struct Shared {
    config: ChannelConfig,
    state: RwLock<ChannelState>,
    /// room id → current handle
    subscriptions: DashMap<String, SubscriptionHandle>,
    /// subscription id → callback
    routes: DashMap<String, SignalCallback>,
    commands: Mutex<Option<mpsc::UnboundedSender<DriverCommand>>>,
    next_subscription: AtomicU64,
    /// Bumped on every disconnect so stale connects and drivers stand down.
    epoch: AtomicU64,
}

impl Shared {
    fn send(&self, frame: Frame) -> bool {
        match self.commands.lock().as_ref() {
            Some(tx) => tx.send(DriverCommand::Frame(frame)).is_ok(),
            None => false,
        }
    }

    fn connection_lost(&self, epoch: u64) {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        self.commands.lock().take();
        self.subscriptions.clear();
        self.routes.clear();
        *self.state.write() = ChannelState::Disconnected;
    }
}

/// STOMP signaling channel. Clones share one connection.
#[derive(Clone)]
pub struct SignalingChannel {
    shared: Arc<Shared>,
}

impl SignalingChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: RwLock::new(ChannelState::Disconnected),
                subscriptions: DashMap::new(),
                routes: DashMap::new(),
                commands: Mutex::new(None),
                next_subscription: AtomicU64::new(0),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.shared.config
    }

    pub fn state(&self) -> ChannelState {
        *self.shared.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    /// Current handle for a room, if subscribed
    pub fn subscription(&self, room_id: &str) -> Option<SubscriptionHandle> {
        self.shared.subscriptions.get(room_id).map(|h| h.clone())
    }

    /// Broker subscriptions still dispatching, including overwritten ones.
    pub fn active_routes(&self) -> usize {
        self.shared.routes.len()
    }

    /// Open the socket and complete the STOMP handshake.
    ///
    /// Resolves immediately when already connected. No automatic retry.
    pub async fn connect(&self, token: &str) -> Result<(), SignalingError> {
        {
            let mut state = self.shared.state.write();
            match *state {
                ChannelState::Connected => return Ok(()),
                ChannelState::Connecting => return Err(SignalingError::ConnectInProgress),
                ChannelState::Disconnected => *state = ChannelState::Connecting,
            }
        }
        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        let mut pending = ConnectingGuard {
            shared: &self.shared,
            epoch,
            armed: true,
        };
        let timeout = self.shared.config.connect_timeout;

        let result = match tokio::time::timeout(timeout, self.handshake(token)).await {
            Ok(result) => result,
            Err(_) => Err(SignalingError::Timeout(timeout)),
        };

        let (sink, source, heartbeat) = match result {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!("Signaling connect failed: {}", e);
                return Err(e);
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.shared.state.write();
            if self.shared.epoch.load(Ordering::SeqCst) != epoch
                || *state != ChannelState::Connecting
            {
                // disconnect() ran while we were handshaking
                drop(state);
                tokio::spawn(close_quietly(sink));
                return Err(SignalingError::Closed);
            }
            *self.shared.commands.lock() = Some(tx);
            *state = ChannelState::Connected;
            pending.armed = false;
        }

        tokio::spawn(drive(Arc::clone(&self.shared), sink, source, rx, heartbeat, epoch));
        tracing::info!("Signaling channel connected to {}", self.shared.config.endpoint);
        Ok(())
    }

    async fn handshake(
        &self,
        token: &str,
    ) -> Result<(WsSink, WsSource, Option<Duration>), SignalingError> {
        let endpoint = &self.shared.config.endpoint;
        let uri: Uri = endpoint
            .parse()
            .map_err(|_| SignalingError::InvalidEndpoint(endpoint.clone()))?;
        let host = uri
            .host()
            .ok_or_else(|| SignalingError::InvalidEndpoint(endpoint.clone()))?
            .to_string();

        let connector = crate::tls::connector(self.shared.config.accept_invalid_certs)?;

        tracing::debug!("Opening signaling socket to {}", endpoint);
        let (ws, _) = connect_async_tls_with_config(endpoint.as_str(), None, false, connector)
            .await
            .map_err(|e| SignalingError::WebSocket(e.to_string()))?;
        let (mut sink, mut source) = ws.split();

        let offered = self.shared.config.heartbeat.as_millis();
        let connect = Frame::new(Command::Connect)
            .header("accept-version", "1.1,1.2")
            .header("host", host)
            .header("heart-beat", format!("{},0", offered))
            .header("Authorization", token);
        sink.send(Message::Text(connect.encode()))
            .await
            .map_err(|e| SignalingError::WebSocket(e.to_string()))?;

        while let Some(message) = source.next().await {
            let text = match message.map_err(|e| SignalingError::WebSocket(e.to_string()))? {
                Message::Text(text) => text,
                Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Message::Close(_) => return Err(SignalingError::Closed),
                _ => continue,
            };

            for frame in decode_all(&text)? {
                match frame.command {
                    Command::Connected => {
                        let heartbeat = negotiate_heartbeat(offered, frame.get("heart-beat"));
                        tracing::debug!(
                            "STOMP session established (version {:?}, heart-beat {:?})",
                            frame.get("version"),
                            heartbeat
                        );
                        return Ok((sink, source, heartbeat));
                    }
                    Command::Error => {
                        let message = frame.get("message").unwrap_or_default().to_string();
                        let detail = if frame.body.is_empty() {
                            message
                        } else {
                            format!("{} {}", message, frame.body).trim().to_string()
                        };
                        return Err(SignalingError::Rejected(detail));
                    }
                    other => tracing::debug!("Ignoring {} before CONNECTED", other),
                }
            }
        }

        Err(SignalingError::Closed)
    }

    /// Subscribe to `/topic/room/{room_id}`.
    ///
    /// Returns `None` when not connected. A second subscribe for the same room
    /// replaces the tracked handle; the earlier broker subscription is left
    /// running until [`disconnect`](Self::disconnect).
    pub fn subscribe_to_room<F>(&self, room_id: &str, callback: F) -> Option<SubscriptionHandle>
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let _span = dancing_observability::create_room_span(room_id).entered();

        if !self.is_connected() {
            tracing::error!("WebSocket未连接, cannot subscribe");
            return None;
        }

        let id = format!(
            "sub-{}",
            self.shared.next_subscription.fetch_add(1, Ordering::SeqCst)
        );
        let handle = SubscriptionHandle {
            id: id.clone(),
            room_id: room_id.to_string(),
        };

        self.shared.routes.insert(id.clone(), Arc::new(callback));
        let frame = Frame::new(Command::Subscribe)
            .header("id", id.as_str())
            .header("destination", handle.destination());
        if !self.shared.send(frame) {
            tracing::error!("Signaling driver is gone, subscribe dropped");
            self.shared.routes.remove(&id);
            return None;
        }

        let replaced = self
            .shared
            .subscriptions
            .insert(room_id.to_string(), handle.clone());
        if let Some(previous) = replaced {
            tracing::warn!(
                "Room already subscribed as {}, replacing with {}",
                previous.id,
                handle.id
            );
        }
        tracing::info!("Subscribed to {}", handle.destination());
        Some(handle)
    }

    /// Publish a signal to the room. `roomId` is merged into the payload;
    /// non-object payloads are wrapped under `payload`.
    ///
    /// `true` means queued for the socket, not delivered.
    pub fn send_signal(&self, room_id: &str, message: Value) -> bool {
        let _span = dancing_observability::create_room_span(room_id).entered();

        if !self.is_connected() {
            tracing::error!("WebSocket未连接, signal dropped");
            return false;
        }

        let payload = with_room_id(room_id, message);
        let frame = Frame::new(Command::Send)
            .header("destination", SIGNAL_DESTINATION)
            .header("content-type", "application/json")
            .body(payload.to_string());

        let queued = self.shared.send(frame);
        if !queued {
            tracing::error!("Signaling driver is gone, signal dropped");
        }
        queued
    }

    /// Drop the tracked subscription for a room. No-op when none is tracked.
    pub fn unsubscribe_from_room(&self, room_id: &str) {
        let Some((_, handle)) = self.shared.subscriptions.remove(room_id) else {
            return;
        };
        self.shared.routes.remove(&handle.id);
        self.shared
            .send(Frame::new(Command::Unsubscribe).header("id", handle.id.as_str()));
        tracing::info!("Unsubscribed from {}", handle.destination());
    }

    /// Unsubscribe everything, send DISCONNECT and close the socket.
    /// Always leaves the channel Disconnected; safe to call repeatedly.
    pub fn disconnect(&self) {
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);

        let handles: Vec<SubscriptionHandle> = self
            .shared
            .subscriptions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        for handle in &handles {
            self.shared
                .send(Frame::new(Command::Unsubscribe).header("id", handle.id.as_str()));
        }
        self.shared.subscriptions.clear();
        self.shared.routes.clear();

        if let Some(tx) = self.shared.commands.lock().take() {
            let _ = tx.send(DriverCommand::Close);
            tracing::info!("Signaling channel disconnecting");
        }

        *self.shared.state.write() = ChannelState::Disconnected;
    }
}

/// Puts a half-finished connect back to Disconnected when it fails or its
/// future is dropped mid-handshake.
struct ConnectingGuard<'a> {
    shared: &'a Shared,
    epoch: u64,
    armed: bool,
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || self.shared.epoch.load(Ordering::SeqCst) != self.epoch {
            return;
        }
        let mut state = self.shared.state.write();
        if *state == ChannelState::Connecting {
            *state = ChannelState::Disconnected;
        }
    }
}

fn with_room_id(room_id: &str, message: Value) -> Value {
    match message {
        Value::Object(mut map) => {
            map.insert("roomId".to_string(), Value::String(room_id.to_string()));
            Value::Object(map)
        }
        other => json!({ "payload": other, "roomId": room_id }),
    }
}

/// Outgoing heart-beat period: zero on either side disables it, otherwise the
/// larger of what we offer and what the broker wants.
fn negotiate_heartbeat(offered_ms: u128, server: Option<&str>) -> Option<Duration> {
    let wanted_ms = server
        .and_then(|h| h.split(',').nth(1))
        .and_then(|v| v.trim().parse::<u128>().ok())
        .unwrap_or(0);

    if offered_ms == 0 || wanted_ms == 0 {
        return None;
    }
    let ms = offered_ms.max(wanted_ms);
    Some(Duration::from_millis(u64::try_from(ms).unwrap_or(u64::MAX)))
}

async fn close_quietly(mut sink: WsSink) {
    let _ = sink
        .send(Message::Text(Frame::new(Command::Disconnect).encode()))
        .await;
    let _ = sink.close().await;
}

async fn drive(
    shared: Arc<Shared>,
    mut sink: WsSink,
    mut source: WsSource,
    mut commands: mpsc::UnboundedReceiver<DriverCommand>,
    heartbeat: Option<Duration>,
    epoch: u64,
) {
    let period = heartbeat.unwrap_or(Duration::from_secs(3600));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(DriverCommand::Frame(frame)) => {
                    tracing::trace!("→ {}", frame.command);
                    if let Err(e) = sink.send(Message::Text(frame.encode())).await {
                        tracing::error!("Failed to write signaling frame: {}", e);
                        break;
                    }
                }
                Some(DriverCommand::Close) | None => {
                    close_quietly(sink).await;
                    tracing::info!("Signaling socket closed");
                    return;
                }
            },

            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if !dispatch(&shared, &text) {
                        break;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    if !dispatch(&shared, &String::from_utf8_lossy(&bytes)) {
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = sink.send(Message::Pong(data)).await {
                        tracing::error!("Failed to send pong: {}", e);
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::warn!("Signaling socket closed by server");
                    break;
                }
                Some(Err(e)) => {
                    tracing::error!("Signaling socket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },

            _ = ticker.tick(), if heartbeat.is_some() => {
                if let Err(e) = sink.send(Message::Text("\n".to_string())).await {
                    tracing::error!("Failed to send heart-beat: {}", e);
                    break;
                }
            }
        }
    }

    shared.connection_lost(epoch);
}

/// Route inbound frames. Returns false when the session is over.
fn dispatch(shared: &Shared, text: &str) -> bool {
    let frames = match decode_all(text) {
        Ok(frames) => frames,
        Err(e) => {
            tracing::warn!("Dropping undecodable STOMP payload: {}", e);
            return true;
        }
    };

    for frame in frames {
        match frame.command {
            Command::Message => {
                let Some(subscription) = frame.get("subscription") else {
                    tracing::warn!("MESSAGE without subscription header dropped");
                    continue;
                };
                let Some(callback) = shared.routes.get(subscription).map(|c| Arc::clone(c.value()))
                else {
                    tracing::debug!("No route for subscription {}", subscription);
                    continue;
                };

                match serde_json::from_str::<Value>(&frame.body) {
                    Ok(value) => callback(value),
                    Err(e) => tracing::warn!("解析消息失败: {}", e),
                }
            }
            Command::Error => {
                tracing::error!(
                    "Broker error: {} {}",
                    frame.get("message").unwrap_or_default(),
                    frame.body
                );
                return false;
            }
            Command::Receipt => {
                tracing::debug!("Receipt {:?}", frame.get("receipt-id"));
            }
            other => tracing::debug!("Ignoring {} frame", other),
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_room_id_merges_objects() {
        let merged = with_room_id("r1", json!({"type": "offer", "roomId": "stale"}));
        assert_eq!(merged, json!({"type": "offer", "roomId": "r1"}));

        let wrapped = with_room_id("r1", json!("hello"));
        assert_eq!(wrapped, json!({"payload": "hello", "roomId": "r1"}));
    }

    #[test]
    fn test_negotiate_heartbeat() {
        assert_eq!(negotiate_heartbeat(10_000, Some("0,0")), None);
        assert_eq!(negotiate_heartbeat(0, Some("0,5000")), None);
        assert_eq!(negotiate_heartbeat(10_000, None), None);
        assert_eq!(
            negotiate_heartbeat(10_000, Some("0,20000")),
            Some(Duration::from_millis(20_000))
        );
        assert_eq!(
            negotiate_heartbeat(10_000, Some("4000, 5000")),
            Some(Duration::from_millis(10_000))
        );
    }

    #[tokio::test]
    async fn test_operations_while_disconnected() {
        let channel = SignalingChannel::new(ChannelConfig::default());
        assert_eq!(channel.state(), ChannelState::Disconnected);

        assert!(channel.subscribe_to_room("r1", |_| {}).is_none());
        assert!(!channel.send_signal("r1", json!({"type": "offer"})));
        channel.unsubscribe_from_room("r1");

        channel.disconnect();
        channel.disconnect();
        assert_eq!(channel.state(), ChannelState::Disconnected);
        assert_eq!(channel.active_routes(), 0);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_resets_state() {
        let channel = SignalingChannel::new(ChannelConfig {
            endpoint: "not a url".into(),
            connect_timeout: Duration::from_secs(1),
            heartbeat: Duration::ZERO,
            accept_invalid_certs: false,
        });

        let err = channel.connect("t").await.unwrap_err();
        assert!(matches!(err, SignalingError::InvalidEndpoint(_)));
        assert_eq!(channel.state(), ChannelState::Disconnected);
    }
}
