#![allow(dead_code)]

use std::sync::Arc;

use dancing_client::{DancingClient, MemoryNavigator, MemoryTokenStore};
use dancing_config::ApiConfig;

pub struct Harness {
    pub client: DancingClient,
    pub tokens: Arc<MemoryTokenStore>,
    pub navigator: Arc<MemoryNavigator>,
}

pub fn api_config(server: &mockito::ServerGuard) -> ApiConfig {
    ApiConfig {
        base_url: format!("{}/api", server.url()),
        timeout_seconds: 5,
        accept_invalid_certs: false,
    }
}

pub fn harness(server: &mockito::ServerGuard, token: Option<&str>, at: &str) -> Harness {
    let tokens = Arc::new(match token {
        Some(token) => MemoryTokenStore::with_token(token),
        None => MemoryTokenStore::new(),
    });
    let navigator = Arc::new(MemoryNavigator::starting_at(at));
    let client =
        DancingClient::new(&api_config(server), tokens.clone(), navigator.clone()).unwrap();

    Harness {
        client,
        tokens,
        navigator,
    }
}

pub fn ok_body(message: &str, data: serde_json::Value) -> String {
    serde_json::json!({
        "code": 200,
        "message": message,
        "data": data,
        "timestamp": 1718000000000i64,
    })
    .to_string()
}

pub fn user_json(id: i64, username: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "username": username,
        "email": format!("{}@dancing.test", username),
        "createdAt": "2024-05-01T12:30:00",
    })
}
