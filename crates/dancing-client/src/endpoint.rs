//! REST endpoint catalogue and its public/protected classification

use std::fmt;

use reqwest::Method;

/// Paths callable without a token. Matched exactly against [`Endpoint::path`].
pub const PUBLIC_PATHS: &[&str] = &["/user/register", "/user/login", "/user/current"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
}

/// Every backend call the client makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    // 用户
    Register,
    Login,
    Logout,
    UpdateUser,
    CurrentUser,

    // 视频
    VideoList,
    VideoUpload,
    VideoDetail(i64),
    MyVideos,
    VideoDelete(i64),
    VideoSearch,
    /// 视频文件流，`path` 走查询参数
    VideoFile,

    // 好友
    FriendSearch,
    FriendSendRequest,
    FriendAccept,
    FriendReject,
    FriendDelete,
    FriendManage,
    FriendPending,

    // 帖子
    PostList,
    PostCreate,
    PostDetail(i64),
    MyPosts,
    UserPosts(i64),
    PostUpdate(i64),
    PostDelete(i64),
    PostToggleLike(i64),
    PostLikes(i64),
    PostSearch,

    // 评论
    PostComments(i64),
    PostComment(i64),
    CommentDelete(i64),

    // 视频通话
    CreateRoom,
    RoomInfo(String),
    LeaveRoom,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        use Endpoint::*;
        match self {
            CurrentUser | VideoList | VideoDetail(_) | MyVideos | VideoSearch | FriendManage
            | FriendPending | PostList | PostDetail(_) | MyPosts | UserPosts(_) | PostLikes(_)
            | PostSearch | RoomInfo(_) | VideoFile | PostComments(_) => Method::GET,
            PostUpdate(_) => Method::PUT,
            VideoDelete(_) | PostDelete(_) | CommentDelete(_) => Method::DELETE,
            _ => Method::POST,
        }
    }

    /// Path relative to the API base URL
    pub fn path(&self) -> String {
        use Endpoint::*;
        match self {
            Register => "/user/register".into(),
            Login => "/user/login".into(),
            Logout => "/user/logout".into(),
            UpdateUser => "/user/update".into(),
            CurrentUser => "/user/current".into(),

            VideoList => "/videos".into(),
            VideoUpload => "/videos/upload".into(),
            VideoDetail(id) | VideoDelete(id) => format!("/videos/{}", id),
            MyVideos => "/videos/my".into(),
            VideoSearch => "/videos/search".into(),
            VideoFile => "/files/video".into(),

            FriendSearch => "/friends/search".into(),
            FriendSendRequest => "/friends/send-request".into(),
            FriendAccept => "/friends/accept".into(),
            FriendReject => "/friends/reject".into(),
            FriendDelete => "/friends/delete".into(),
            FriendManage => "/friends/manage".into(),
            FriendPending => "/friends/pending".into(),

            PostList => "/posts/list".into(),
            PostCreate => "/posts/create".into(),
            PostDetail(id) | PostUpdate(id) | PostDelete(id) => format!("/posts/{}", id),
            MyPosts => "/posts/my".into(),
            UserPosts(user_id) => format!("/posts/user/{}", user_id),
            PostToggleLike(id) => format!("/posts/{}/like", id),
            PostLikes(id) => format!("/posts/{}/likes", id),
            PostSearch => "/posts/search".into(),

            PostComments(post_id) | PostComment(post_id) => format!("/posts/{}/comments", post_id),
            CommentDelete(id) => format!("/comments/{}", id),

            CreateRoom => "/video-call/create-room".into(),
            RoomInfo(room_id) => format!("/video-call/room/{}", room_id),
            LeaveRoom => "/video-call/leave-room".into(),
        }
    }

    pub fn access(&self) -> Access {
        let path = self.path();
        if PUBLIC_PATHS.contains(&path.as_str()) {
            Access::Public
        } else {
            Access::Protected
        }
    }

    pub fn is_public(&self) -> bool {
        self.access() == Access::Public
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_endpoints() {
        assert!(Endpoint::Register.is_public());
        assert!(Endpoint::Login.is_public());
        assert!(Endpoint::CurrentUser.is_public());
    }

    #[test]
    fn test_lookalike_paths_are_protected() {
        // substring matches used to leak these into the public set
        assert_eq!(Endpoint::Logout.access(), Access::Protected);
        assert_eq!(Endpoint::UpdateUser.access(), Access::Protected);
        assert_eq!(Endpoint::RoomInfo("user/login".into()).access(), Access::Protected);
    }

    #[test]
    fn test_methods_and_paths() {
        assert_eq!(Endpoint::PostUpdate(7).method(), Method::PUT);
        assert_eq!(Endpoint::PostUpdate(7).path(), "/posts/7");
        assert_eq!(Endpoint::VideoDelete(3).method(), Method::DELETE);
        assert_eq!(Endpoint::PostToggleLike(9).path(), "/posts/9/like");
        assert_eq!(Endpoint::FriendSearch.method(), Method::POST);
        assert_eq!(Endpoint::VideoSearch.method(), Method::GET);
        assert_eq!(Endpoint::RoomInfo("r1".into()).to_string(), "GET /video-call/room/r1");
    }

    #[test]
    fn test_comment_and_file_endpoints() {
        assert_eq!(Endpoint::PostComments(4).to_string(), "GET /posts/4/comments");
        assert_eq!(Endpoint::PostComment(4).to_string(), "POST /posts/4/comments");
        assert_eq!(Endpoint::CommentDelete(8).to_string(), "DELETE /comments/8");
        assert_eq!(Endpoint::VideoFile.to_string(), "GET /files/video");

        assert!(!Endpoint::PostComments(4).is_public());
        assert!(!Endpoint::VideoFile.is_public());
    }
}
