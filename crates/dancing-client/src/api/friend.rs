use crate::endpoint::Endpoint;
use crate::envelope::{Ack, Envelope};
use crate::error::ClientResult;
use crate::models::{FriendOverview, FriendTarget, Keyword, User};
use crate::transport::Transport;

/// 好友相关接口
#[derive(Clone)]
pub struct FriendApi {
    transport: Transport,
}

impl FriendApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn search(&self, keyword: &str) -> ClientResult<Envelope<Vec<User>>> {
        self.transport
            .send_json(Endpoint::FriendSearch, &Keyword { keyword })
            .await
    }

    pub async fn send_request(&self, friend_id: i64) -> ClientResult<Ack> {
        self.act(Endpoint::FriendSendRequest, friend_id).await
    }

    pub async fn accept(&self, friend_id: i64) -> ClientResult<Ack> {
        self.act(Endpoint::FriendAccept, friend_id).await
    }

    pub async fn reject(&self, friend_id: i64) -> ClientResult<Ack> {
        self.act(Endpoint::FriendReject, friend_id).await
    }

    pub async fn delete(&self, friend_id: i64) -> ClientResult<Ack> {
        self.act(Endpoint::FriendDelete, friend_id).await
    }

    /// Friends plus incoming and outgoing requests
    pub async fn overview(&self) -> ClientResult<Envelope<FriendOverview>> {
        self.transport.get(Endpoint::FriendManage).await
    }

    pub async fn pending(&self) -> ClientResult<Envelope<Vec<User>>> {
        self.transport.get(Endpoint::FriendPending).await
    }

    async fn act(&self, endpoint: Endpoint, friend_id: i64) -> ClientResult<Ack> {
        self.transport
            .send_json(endpoint, &FriendTarget { friend_id })
            .await
    }
}
