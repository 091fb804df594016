//! Authenticated REST transport
//!
//! 所有请求都经过这里：
//! - 受保护接口在没有 token 时直接在本地拒绝，不发网络请求
//! - 有 token 时原样放进 `Authorization` 头（不带 `Bearer` 前缀）
//! - HTTP 401 清除 token 并跳转登录页（已在登录/注册页时不跳）

use std::sync::Arc;
use std::time::Duration;

use dancing_config::ApiConfig;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Instrument;

use crate::endpoint::{Access, Endpoint};
use crate::envelope::{Ack, Envelope};
use crate::error::{ClientError, ClientResult};
use crate::navigator::{redirect_to_login, Navigator};
use crate::storage::TokenStore;

/// Message attached to locally rejected requests
pub const NOT_LOGGED_IN: &str = "未登录，请先登录";

/// Request body / query
pub enum Payload {
    Empty,
    Json(serde_json::Value),
    Query(Vec<(&'static str, String)>),
    Multipart(reqwest::multipart::Form),
}

impl Payload {
    pub fn json<B: Serialize>(body: &B) -> ClientResult<Self> {
        serde_json::to_value(body)
            .map(Payload::Json)
            .map_err(|e| ClientError::Decode(format!("Failed to encode request body: {}", e)))
    }

    fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(&body),
            Payload::Query(params) => builder.query(&params),
            Payload::Multipart(form) => builder.multipart(form),
        }
    }
}

/// REST client bound to one API base URL
#[derive(Clone)]
pub struct Transport {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
}

impl Transport {
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
            navigator,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Token from storage; a broken store counts as "no token".
    pub async fn stored_token(&self) -> Option<String> {
        match self.tokens.load().await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read stored token: {}", e);
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> ClientResult<Envelope<T>> {
        self.request(endpoint, Payload::Empty).await
    }

    pub async fn send_json<T, B>(&self, endpoint: Endpoint, body: &B) -> ClientResult<Envelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        self.request(endpoint, Payload::json(body)?).await
    }

    /// Call that only cares about `code` and `message`
    pub async fn ack(&self, endpoint: Endpoint, payload: Payload) -> ClientResult<Ack> {
        self.request(endpoint, payload).await
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        payload: Payload,
    ) -> ClientResult<Envelope<T>> {
        let path = endpoint.path();
        let span = dancing_observability::create_request_span(endpoint.method().as_str(), &path);
        self.execute(endpoint, payload).instrument(span).await
    }

    /// Raw response body, for endpoints that stream files instead of envelopes
    pub async fn bytes(&self, endpoint: Endpoint, payload: Payload) -> ClientResult<Vec<u8>> {
        let path = endpoint.path();
        let span = dancing_observability::create_request_span(endpoint.method().as_str(), &path);
        self.send(&endpoint, payload).instrument(span).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        payload: Payload,
    ) -> ClientResult<Envelope<T>> {
        let body = self.send(&endpoint, payload).await?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!("Undecodable response from {}: {}", endpoint, e);
            ClientError::Decode(e.to_string())
        })
    }

    /// Auth checks, request and status mapping. Returns the 2xx body.
    async fn send(&self, endpoint: &Endpoint, payload: Payload) -> ClientResult<Vec<u8>> {
        let token = self.stored_token().await;

        if endpoint.access() == Access::Protected && token.is_none() {
            tracing::warn!("Rejected {} locally: no token", endpoint);
            redirect_to_login(self.navigator.as_ref());
            return Err(ClientError::Unauthorized {
                code: 401,
                message: NOT_LOGGED_IN.to_string(),
                local: true,
            });
        }

        let url = format!("{}{}", self.base_url, endpoint.path());
        let mut builder = self.http.request(endpoint.method(), &url);
        if let Some(token) = &token {
            builder = builder.header(header::AUTHORIZATION, token.as_str());
        }
        builder = payload.apply(builder);

        tracing::debug!("→ {}", endpoint);
        let response = builder.send().await.map_err(|e| {
            tracing::error!("{} failed: {}", endpoint, e);
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        tracing::debug!("← {} {}", status.as_u16(), endpoint);

        if status == StatusCode::UNAUTHORIZED {
            return Err(self.handle_unauthorized(&body).await);
        }

        if !status.is_success() {
            let message = server_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            tracing::warn!("{} returned HTTP {}: {}", endpoint, status.as_u16(), message);
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body.to_vec())
    }

    async fn handle_unauthorized(&self, body: &[u8]) -> ClientError {
        tracing::warn!("Server answered 401, clearing stored token");
        if let Err(e) = self.tokens.clear().await {
            tracing::error!("Failed to clear stored token: {}", e);
        }
        redirect_to_login(self.navigator.as_ref());

        let envelope = serde_json::from_slice::<Ack>(body).ok();
        ClientError::Unauthorized {
            code: envelope.as_ref().map(|e| e.code).unwrap_or(401),
            message: envelope
                .map(|e| e.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "Unauthorized".to_string()),
            local: false,
        }
    }
}

fn server_message(body: &[u8]) -> Option<String> {
    if let Ok(envelope) = serde_json::from_slice::<Ack>(body) {
        if !envelope.message.is_empty() {
            return Some(envelope.message);
        }
    }
    let text = String::from_utf8_lossy(body).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_prefers_envelope() {
        let body = br#"{"code":500,"message":"boom"}"#;
        assert_eq!(server_message(body).as_deref(), Some("boom"));
        assert_eq!(server_message(b"plain failure").as_deref(), Some("plain failure"));
        assert_eq!(server_message(b"  "), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ApiConfig {
            base_url: "http://localhost:8080/api/".into(),
            ..ApiConfig::default()
        };
        let transport = Transport::new(
            &config,
            Arc::new(crate::storage::MemoryTokenStore::new()),
            Arc::new(crate::navigator::MemoryNavigator::new()),
        )
        .unwrap();
        assert_eq!(transport.base_url(), "http://localhost:8080/api");
    }
}
