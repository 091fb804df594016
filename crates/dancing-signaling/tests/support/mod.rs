//! In-process STOMP broker for channel tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dancing_signaling::{Command, Frame};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
pub enum Mode {
    /// Answer CONNECT with CONNECTED
    Accept,
    /// Answer CONNECT with ERROR and close
    Reject(String),
    /// Never answer CONNECT
    Silent,
}

pub struct Broker {
    pub url: String,
    frames: Arc<Mutex<Vec<Frame>>>,
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
}

impl Broker {
    pub async fn start(mode: Mode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let outbound = Arc::new(Mutex::new(None));

        let task_frames = frames.clone();
        let task_outbound = outbound.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let frames = task_frames.clone();
                let outbound = task_outbound.clone();
                let mode = mode.clone();
                tokio::spawn(async move {
                    serve(stream, mode, frames, outbound).await;
                });
            }
        });

        Self {
            url: format!("ws://{}/ws/video-call/websocket", addr),
            frames,
            outbound,
        }
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.frames.lock().clone()
    }

    pub fn frames_of(&self, command: Command) -> Vec<Frame> {
        self.frames()
            .into_iter()
            .filter(|f| f.command == command)
            .collect()
    }

    /// Write raw text to the connected client
    pub fn push(&self, raw: impl Into<String>) {
        if let Some(tx) = self.outbound.lock().as_ref() {
            let _ = tx.send(raw.into());
        }
    }

    pub fn push_message(&self, subscription: &str, body: &str) {
        let frame = Frame::new(Command::Message)
            .header("subscription", subscription)
            .header("message-id", "pushed")
            .header("destination", "/topic/room/pushed")
            .body(body);
        self.push(frame.encode());
    }

    /// Poll until `count` frames of `command` were seen
    pub async fn wait_for(&self, command: Command, count: usize) -> Vec<Frame> {
        wait_until(|| self.frames_of(command).len() >= count).await;
        self.frames_of(command)
    }
}

pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached in time");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn serve(
    stream: tokio::net::TcpStream,
    mode: Mode,
    frames: Arc<Mutex<Vec<Frame>>>,
    outbound: Arc<Mutex<Option<mpsc::UnboundedSender<String>>>>,
) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    *outbound.lock() = Some(tx.clone());

    let mut subscriptions: Vec<(String, String)> = Vec::new();
    let mut message_id = 0u64;

    loop {
        tokio::select! {
            Some(raw) = rx.recv() => {
                if sink.send(Message::Text(raw)).await.is_err() {
                    return;
                }
            }
            incoming = source.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                    Some(Ok(_)) => continue,
                };
                let Ok(decoded) = dancing_signaling::frame::decode_all(&text) else {
                    continue;
                };

                for frame in decoded {
                    frames.lock().push(frame.clone());
                    match frame.command {
                        Command::Connect => match &mode {
                            Mode::Accept => {
                                let connected = Frame::new(Command::Connected)
                                    .header("version", "1.2")
                                    .header("heart-beat", "0,0");
                                let _ = tx.send(connected.encode());
                            }
                            Mode::Reject(message) => {
                                let error = Frame::new(Command::Error)
                                    .header("message", message.as_str())
                                    .body("access denied");
                                let _ = sink.send(Message::Text(error.encode())).await;
                                let _ = sink.close().await;
                                return;
                            }
                            Mode::Silent => {}
                        },
                        Command::Subscribe => {
                            let id = frame.get("id");
                            if let (Some(id), Some(dest)) = (id, frame.get("destination")) {
                                subscriptions.push((id.to_string(), dest.to_string()));
                            }
                        }
                        Command::Unsubscribe => {
                            if let Some(id) = frame.get("id") {
                                subscriptions.retain(|(sub, _)| sub != id);
                            }
                        }
                        Command::Send => {
                            let room = serde_json::from_str::<serde_json::Value>(&frame.body)
                                .ok()
                                .and_then(|v| v.get("roomId")?.as_str().map(str::to_string));
                            let Some(room) = room else { continue };
                            let destination = format!("/topic/room/{}", room);

                            for (id, dest) in &subscriptions {
                                if *dest != destination {
                                    continue;
                                }
                                message_id += 1;
                                let message = Frame::new(Command::Message)
                                    .header("subscription", id.as_str())
                                    .header("message-id", message_id.to_string())
                                    .header("destination", dest.as_str())
                                    .header("content-type", "application/json")
                                    .body(frame.body.clone());
                                let _ = tx.send(message.encode());
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
