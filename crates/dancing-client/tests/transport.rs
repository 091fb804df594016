mod support;

use std::sync::Arc;

use dancing_client::{ClientError, DancingClient, MemoryNavigator, MemoryTokenStore, Navigator};
use dancing_config::ApiConfig;
use mockito::Matcher;
use serde_json::json;

use support::{harness, ok_body, user_json};

#[tokio::test]
async fn test_protected_request_without_token_stays_local() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/videos/my")
        .expect(0)
        .create_async()
        .await;

    let h = harness(&server, None, "/videos/my");
    let err = h.client.videos().mine().await.unwrap_err();

    match &err {
        ClientError::Unauthorized { code, message, local } => {
            assert_eq!(*code, 401);
            assert_eq!(message, "未登录，请先登录");
            assert!(*local);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.status(), Some(401));
    assert_eq!(h.navigator.current_path(), "/login");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_local_rejection_on_register_page_does_not_redirect() {
    let server = mockito::Server::new_async().await;
    let h = harness(&server, None, "/register");

    let err = h.client.posts().create("t", "c").await.unwrap_err();
    assert!(err.is_local());
    assert_eq!(h.navigator.redirect_count(), 0);
}

#[tokio::test]
async fn test_token_sent_as_raw_authorization_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/videos/my")
        .match_header("authorization", "abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ok_body("success", json!([])))
        .create_async()
        .await;

    let h = harness(&server, Some("abc"), "/videos/my");
    let videos = h.client.videos().mine().await.unwrap().into_data().unwrap();
    assert!(videos.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_public_endpoint_without_token_has_no_authorization() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/user/current")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"code":401,"message":"未登录"}"#)
        .create_async()
        .await;

    let h = harness(&server, None, "/");
    let envelope = h.client.users().current().await.unwrap();
    assert!(!envelope.is_success());
    assert_eq!(h.navigator.redirect_count(), 0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_401_clears_token_and_redirects() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/friends/manage")
        .with_status(401)
        .with_header("content-type", "application/json;charset=UTF-8")
        .with_body(r#"{"code":401,"message":"Token无效或已过期"}"#)
        .create_async()
        .await;

    let h = harness(&server, Some("stale"), "/friends");
    let err = h.client.friends().overview().await.unwrap_err();

    match err {
        ClientError::Unauthorized { message, local, .. } => {
            assert_eq!(message, "Token无效或已过期");
            assert!(!local);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(h.tokens.peek().is_none());
    assert_eq!(h.navigator.current_path(), "/login");
}

#[tokio::test]
async fn test_http_401_on_login_page_clears_without_redirect() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/user/logout")
        .with_status(401)
        .create_async()
        .await;

    let h = harness(&server, Some("stale"), "/login");
    let err = h.client.users().logout().await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(h.tokens.peek().is_none());
    assert_eq!(h.navigator.history(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_server_error_surfaces_status_and_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/api/videos/3")
        .with_status(500)
        .with_body(r#"{"code":500,"message":"删除失败"}"#)
        .create_async()
        .await;

    let h = harness(&server, Some("abc"), "/videos/my");
    let err = h.client.videos().delete(3).await.unwrap_err();

    match err {
        ClientError::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "删除失败");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(h.tokens.peek().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_undecodable_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/posts/list")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let h = harness(&server, Some("abc"), "/posts");
    let err = h.client.posts().list().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1/api".to_string(),
        timeout_seconds: 2,
        accept_invalid_certs: false,
    };
    let client = DancingClient::new(
        &config,
        Arc::new(MemoryTokenStore::with_token("abc")),
        Arc::new(MemoryNavigator::new()),
    )
    .unwrap();

    let err = client.posts().mine().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_envelope_user_payload() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/user/current")
        .match_header("authorization", "abc")
        .with_status(200)
        .with_body(ok_body("success", user_json(4, "dora")))
        .create_async()
        .await;

    let h = harness(&server, Some("abc"), "/profile");
    let user = h.client.users().current().await.unwrap().into_data().unwrap();
    assert_eq!(user.id, 4);
    assert_eq!(user.email.as_deref(), Some("dora@dancing.test"));
}
