use crate::endpoint::Endpoint;
use crate::envelope::{Ack, Envelope};
use crate::error::ClientResult;
use crate::models::{Comment, CommentDraft, Post, PostDraft, User};
use crate::transport::{Payload, Transport};

/// 帖子相关接口
#[derive(Clone)]
pub struct PostApi {
    transport: Transport,
}

impl PostApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> ClientResult<Envelope<Vec<Post>>> {
        self.transport.get(Endpoint::PostList).await
    }

    pub async fn create(&self, title: &str, content: &str) -> ClientResult<Ack> {
        self.transport
            .send_json(Endpoint::PostCreate, &PostDraft { title, content })
            .await
    }

    pub async fn detail(&self, id: i64) -> ClientResult<Envelope<Post>> {
        self.transport.get(Endpoint::PostDetail(id)).await
    }

    pub async fn mine(&self) -> ClientResult<Envelope<Vec<Post>>> {
        self.transport.get(Endpoint::MyPosts).await
    }

    pub async fn by_user(&self, user_id: i64) -> ClientResult<Envelope<Vec<Post>>> {
        self.transport.get(Endpoint::UserPosts(user_id)).await
    }

    pub async fn update(&self, id: i64, title: &str, content: &str) -> ClientResult<Ack> {
        self.transport
            .send_json(Endpoint::PostUpdate(id), &PostDraft { title, content })
            .await
    }

    pub async fn delete(&self, id: i64) -> ClientResult<Ack> {
        self.transport.ack(Endpoint::PostDelete(id), Payload::Empty).await
    }

    /// 点赞/取消点赞
    pub async fn toggle_like(&self, id: i64) -> ClientResult<Ack> {
        self.transport.ack(Endpoint::PostToggleLike(id), Payload::Empty).await
    }

    pub async fn likes(&self, id: i64) -> ClientResult<Envelope<Vec<User>>> {
        self.transport.get(Endpoint::PostLikes(id)).await
    }

    pub async fn search(&self, keyword: &str) -> ClientResult<Envelope<Vec<Post>>> {
        self.transport
            .request(
                Endpoint::PostSearch,
                Payload::Query(vec![("keyword", keyword.to_string())]),
            )
            .await
    }

    pub async fn comments(&self, post_id: i64) -> ClientResult<Envelope<Vec<Comment>>> {
        self.transport.get(Endpoint::PostComments(post_id)).await
    }

    pub async fn comment(&self, post_id: i64, content: &str) -> ClientResult<Ack> {
        self.transport
            .send_json(Endpoint::PostComment(post_id), &CommentDraft { content })
            .await
    }

    /// 只能删除自己的评论，否则返回 403 码
    pub async fn delete_comment(&self, comment_id: i64) -> ClientResult<Ack> {
        self.transport
            .ack(Endpoint::CommentDelete(comment_id), Payload::Empty)
            .await
    }
}
