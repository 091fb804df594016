//! Signal payload helpers
//!
//! 信令消息本身不做校验；这里只按 `type` 字段粗分类，方便调用方分发。

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    UserJoined,
    UserLeft,
    Other(String),
    /// No string `type` field
    Untyped,
}

impl SignalKind {
    pub fn of(message: &Value) -> Self {
        match message.get("type").and_then(Value::as_str) {
            Some("offer") => SignalKind::Offer,
            Some("answer") => SignalKind::Answer,
            Some("ice-candidate") | Some("candidate") => SignalKind::IceCandidate,
            Some("user-joined") | Some("join") => SignalKind::UserJoined,
            Some("user-left") | Some("leave") => SignalKind::UserLeft,
            Some(other) => SignalKind::Other(other.to_string()),
            None => SignalKind::Untyped,
        }
    }
}

/// Presence notice the backend broadcasts when someone leaves a room
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceNotice {
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl PresenceNotice {
    pub fn from_value(message: &Value) -> Option<Self> {
        match SignalKind::of(message) {
            SignalKind::UserJoined | SignalKind::UserLeft => {
                serde_json::from_value(message.clone()).ok()
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signal_kinds() {
        assert_eq!(SignalKind::of(&json!({"type": "offer", "sdp": "v=0"})), SignalKind::Offer);
        assert_eq!(SignalKind::of(&json!({"type": "ice-candidate"})), SignalKind::IceCandidate);
        assert_eq!(
            SignalKind::of(&json!({"type": "hangup"})),
            SignalKind::Other("hangup".into())
        );
        assert_eq!(SignalKind::of(&json!({"type": 3})), SignalKind::Untyped);
        assert_eq!(SignalKind::of(&json!([1, 2])), SignalKind::Untyped);
    }

    #[test]
    fn test_user_left_notice() {
        let message = json!({
            "type": "user-left",
            "userId": 2,
            "username": "bob",
            "timestamp": 1718000000000i64,
            "roomId": "r1"
        });
        let notice = PresenceNotice::from_value(&message).unwrap();
        assert_eq!(notice.user_id, 2);
        assert_eq!(notice.username, "bob");

        assert!(PresenceNotice::from_value(&json!({"type": "offer"})).is_none());
    }
}
