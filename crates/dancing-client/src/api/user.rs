use crate::endpoint::Endpoint;
use crate::envelope::{Ack, Envelope};
use crate::error::ClientResult;
use crate::models::{Credentials, LoginData, ProfileUpdate, Registration, User};
use crate::transport::{Payload, Transport};

/// 用户相关接口
#[derive(Clone)]
pub struct UserApi {
    transport: Transport,
}

impl UserApi {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> ClientResult<Ack> {
        let body = Registration {
            username,
            password,
            email,
        };
        self.transport.send_json(Endpoint::Register, &body).await
    }

    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Envelope<LoginData>> {
        let body = Credentials { username, password };
        self.transport.send_json(Endpoint::Login, &body).await
    }

    pub async fn current(&self) -> ClientResult<Envelope<User>> {
        self.transport.get(Endpoint::CurrentUser).await
    }

    pub async fn logout(&self) -> ClientResult<Ack> {
        self.transport.ack(Endpoint::Logout, Payload::Empty).await
    }

    pub async fn update(&self, username: &str, email: &str) -> ClientResult<Ack> {
        let body = ProfileUpdate { username, email };
        self.transport.send_json(Endpoint::UpdateUser, &body).await
    }
}
