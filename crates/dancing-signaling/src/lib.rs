//! # dancing-signaling
//!
//! Video-call signaling over STOMP on a WebSocket.
//!
//! ```no_run
//! use dancing_signaling::{ChannelConfig, SignalingChannel};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), dancing_signaling::SignalingError> {
//! let channel = SignalingChannel::new(ChannelConfig::default());
//! channel.connect("token").await?;
//!
//! channel.subscribe_to_room("room_1", |message| {
//!     println!("signal: {}", message);
//! });
//! channel.send_signal("room_1", json!({"type": "offer", "sdp": "..."}));
//!
//! channel.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod frame;
pub mod signal;
mod tls;

pub use channel::{
    ChannelConfig, ChannelState, SignalCallback, SignalingChannel, SignalingError,
    SubscriptionHandle, ROOM_TOPIC_PREFIX, SIGNAL_DESTINATION,
};
pub use frame::{Command, Frame, FrameError};
pub use signal::{PresenceNotice, SignalKind};
