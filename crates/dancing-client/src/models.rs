//! Payload types carried inside [`Envelope`](crate::envelope::Envelope)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// `data` of a successful login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginData {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub uploader_id: Option<i64>,
    #[serde(default)]
    pub uploader_name: Option<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// 帖子评论
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub video_id: Option<i64>,
    #[serde(default)]
    pub post_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// 好友管理页数据
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FriendOverview {
    #[serde(default)]
    pub friends: Vec<User>,
    /// 别人发给我的申请
    #[serde(default)]
    pub pending_requests: Vec<User>,
    /// 我发出的申请
    #[serde(default)]
    pub sent_requests: Vec<User>,
    #[serde(default)]
    pub pending_count: i64,
}

/// `data` of create-room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoin {
    pub room_id: String,
    pub user_id: i64,
    pub username: String,
    #[serde(default)]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub is_creator: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: String,
    #[serde(default)]
    pub creator_id: Option<i64>,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub target_user_id: Option<i64>,
    /// Epoch milliseconds
    #[serde(default)]
    pub created_at: Option<i64>,
}

// Request bodies

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Registration<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProfileUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FriendTarget {
    pub friend_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Keyword<'a> {
    pub keyword: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CommentDraft<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PostDraft<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// Body of create-room. Both fields optional: no room id creates a fresh room.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RoomRef<'a> {
    pub room_id: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ignores_password_and_parses_local_datetime() {
        let json = r#"{"id":1,"username":"alice","password":null,"email":"a@x.io","createdAt":"2024-05-01T12:30:00"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email.as_deref(), Some("a@x.io"));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_post_defaults() {
        let json = r#"{"id":5,"title":"hello","content":"world","likesCount":3,"isLiked":true}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.likes_count, 3);
        assert!(post.is_liked);
        assert!(post.updated_at.is_none());
    }

    #[test]
    fn test_room_request_skips_missing_fields() {
        let body = serde_json::to_value(RoomRequest::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));

        let body = serde_json::to_value(RoomRequest {
            room_id: None,
            target_user_id: Some(9),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"targetUserId": 9}));
    }
}
