//! Client facade
//!
//! One shared [`Transport`] and [`SessionStore`], plus the typed APIs.

use std::sync::Arc;

use dancing_config::{ApiConfig, Config};

use crate::api::{FriendApi, PostApi, UserApi, VideoApi, VideoCallApi};
use crate::error::{ClientError, ClientResult};
use crate::navigator::{MemoryNavigator, Navigator};
use crate::routes::{GuardPolicy, Router};
use crate::session::SessionStore;
use crate::storage::{FileTokenStore, TokenStore};
use crate::transport::Transport;

#[derive(Clone)]
pub struct DancingClient {
    transport: Transport,
    session: SessionStore,
}

impl DancingClient {
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let transport = Transport::new(config, tokens, navigator)?;
        let session = SessionStore::new(transport.clone());
        Ok(Self { transport, session })
    }

    /// File-backed token at `storage.token_path`, in-memory navigator
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let tokens = FileTokenStore::from_config(&config.storage).ok_or_else(|| {
            ClientError::Config(format!("Cannot resolve token path {}", config.storage.token_path))
        })?;
        tracing::debug!("Using token file {:?}", tokens.path());

        Self::new(&config.api, Arc::new(tokens), Arc::new(MemoryNavigator::new()))
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn navigator(&self) -> Arc<dyn Navigator> {
        Arc::clone(self.transport.navigator())
    }

    pub fn router(&self, policy: GuardPolicy) -> Router {
        Router::new(self.navigator()).with_policy(policy)
    }

    pub fn users(&self) -> UserApi {
        UserApi::new(self.transport.clone())
    }

    pub fn videos(&self) -> VideoApi {
        VideoApi::new(self.transport.clone())
    }

    pub fn friends(&self) -> FriendApi {
        FriendApi::new(self.transport.clone())
    }

    pub fn posts(&self) -> PostApi {
        PostApi::new(self.transport.clone())
    }

    pub fn video_call(&self) -> VideoCallApi {
        VideoCallApi::new(self.transport.clone())
    }
}
