//! End-to-end user operations against a mock Validic API.
//!
//! Wires up: `ValidicConfig` → `Validic::new()` → `HttpTransport` → mock server,
//! and checks the exact method, path, query and body of every operation.

use httpmock::prelude::*;
use serde_json::json;
use validic_sdk::{
    SecretString, UserOptions, UserQuery, UserStatus, Validic, ValidicConfig, ValidicError,
};

const ORG: &str = "51aca5a06dedda916400002b";
const TOKEN: &str = "ENTERPRISE_KEY";

fn client_for(server: &MockServer) -> Validic {
    Validic::new(ValidicConfig {
        base_url: server.base_url(),
        organization_id: Some(ORG.to_owned()),
        access_token: Some(SecretString::new(Box::from(TOKEN))),
        allow_insecure_http: true,
        ..ValidicConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn list_users_with_filters() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/organizations/{ORG}/users.json"))
            .query_param("status", "active")
            .query_param("limit", "10")
            .query_param("access_token", TOKEN)
            .header("accept", "application/json");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "summary": {"status": 200, "results": 1, "limit": 10},
                "users": [{"_id": "51552cd7fded0807c4000017", "uid": "abc"}]
            }));
    });

    let result = client_for(&server)
        .users()
        .list_users(&UserQuery::new().status(UserStatus::Active).limit(10))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result["users"][0]["uid"], "abc");
    mock.assert_calls(1);
}

#[tokio::test]
async fn me_resolves_user_from_authentication_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/me.json")
            .query_param("authentication_token", "user-auth-token");
        then.status(200)
            .json_body(json!({"me": {"_id": "51552cd7fded0807c4000017"}}));
    });

    let result = client_for(&server)
        .users()
        .me("user-auth-token")
        .await
        .unwrap();

    assert_eq!(
        result,
        Some(json!({"me": {"_id": "51552cd7fded0807c4000017"}}))
    );
    mock.assert_calls(1);
}

#[tokio::test]
async fn provision_user_posts_profile() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/v1/organizations/{ORG}/users.json"))
            .header("content-type", "application/json")
            .json_body(json!({
                "access_token": TOKEN,
                "user": {
                    "uid": "patient-17",
                    "profile": {"height": 180, "gender": "F", "location": null, "weight": null}
                }
            }));
        then.status(201).json_body(json!({
            "code": 201,
            "user": {"_id": "5196a9ee6dedda8b1b000001", "access_token": "user-token"}
        }));
    });

    let result = client_for(&server)
        .users()
        .provision_user(
            "patient-17",
            &UserOptions::new().height(180).gender("F").birth_year("1980"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result["user"]["_id"], "5196a9ee6dedda8b1b000001");
    mock.assert_calls(1);
}

#[tokio::test]
async fn update_user_puts_full_profile() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PUT)
            .path(format!("/v1/organizations/{ORG}/users/u1.json"))
            .json_body(json!({
                "access_token": TOKEN,
                "user": {
                    "uid": "newUid",
                    "profile": {
                        "gender": null,
                        "location": "NC",
                        "country": "US",
                        "birth_year": "1980",
                        "height": null,
                        "weight": null
                    }
                }
            }));
        then.status(200).json_body(json!({"code": 200}));
    });

    let options = UserOptions::new()
        .uid("newUid")
        .location("NC")
        .country("US")
        .birth_year("1980");
    let result = client_for(&server)
        .users()
        .update_user("u1", &options)
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"code": 200})));
    mock.assert_calls(1);
}

#[tokio::test]
async fn suspend_then_unsuspend() {
    let server = MockServer::start();
    let path = format!("/v1/organizations/{ORG}/users/42.json");
    let suspend = server.mock(|when, then| {
        when.method(PUT)
            .path(path.clone())
            .json_body(json!({"suspend": 1, "access_token": TOKEN}));
        then.status(200).json_body(json!({"message": "The user has been suspended."}));
    });
    let unsuspend = server.mock(|when, then| {
        when.method(PUT)
            .path(path.clone())
            .json_body(json!({"suspend": 0, "access_token": TOKEN}));
        then.status(200).json_body(json!({"message": "The user has been unsuspended."}));
    });

    let users = client_for(&server).users();
    users.suspend_user("42", &UserOptions::new()).await.unwrap();
    users.unsuspend_user("42", &UserOptions::new()).await.unwrap();

    suspend.assert_calls(1);
    unsuspend.assert_calls(1);
}

#[tokio::test]
async fn refresh_token_gets_new_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path(format!("/v1/organizations/{ORG}/users/42/refresh_token.json"))
            .query_param("access_token", "override");
        then.status(200)
            .json_body(json!({"user": {"authentication_token": "fresh"}}));
    });

    let result = client_for(&server)
        .users()
        .refresh_token("42", &UserOptions::new().access_token("override"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result["user"]["authentication_token"], "fresh");
    mock.assert_calls(1);
}

#[tokio::test]
async fn delete_user_with_explicit_credentials() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/v1/organizations/org1/users/42.json")
            .query_param("access_token", "tok");
        then.status(200).json_body(json!({"code": 200, "message": "Ok"}));
    });

    let options = UserOptions::new().organization_id("org1").access_token("tok");
    let result = client_for(&server)
        .users()
        .delete_user("42", &options)
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"code": 200, "message": "Ok"})));
    mock.assert_calls(1);
}

#[tokio::test]
async fn empty_success_body_is_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(DELETE).path(format!("/v1/organizations/{ORG}/users/42.json"));
        then.status(204);
    });

    let result = client_for(&server)
        .users()
        .delete_user("42", &UserOptions::new())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn remote_rejection_is_returned_as_http_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(format!("/v1/organizations/{ORG}/users.json"));
        then.status(409)
            .header("content-type", "application/json")
            .body(r#"{"code":409,"message":"Uid already exists"}"#);
    });

    let err = client_for(&server)
        .users()
        .provision_user("dup", &UserOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ValidicError::Http(_)));
    assert_eq!(err.status(), Some(validic_sdk::StatusCode::CONFLICT));
    assert!(err.body_preview().unwrap().contains("Uid already exists"));
}

#[tokio::test]
async fn user_agent_comes_from_config() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/me.json")
            .header("user-agent", "care-portal/3.1");
        then.status(200).json_body(json!({}));
    });

    let validic = Validic::new(ValidicConfig {
        base_url: server.base_url(),
        user_agent: "care-portal/3.1".to_owned(),
        allow_insecure_http: true,
        ..ValidicConfig::default()
    })
    .unwrap();
    validic.users().me("t").await.unwrap();
    mock.assert_calls(1);
}

#[derive(Clone, Default)]
struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn request_logs_never_contain_tokens() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::util::SubscriberInitExt;

    let logs = LogBuffer::default();
    let writer = logs.clone();
    let _guard = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("validic_sdk=debug"))
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish()
        .set_default();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("/v1/organizations/{ORG}/users.json"));
        then.status(200).json_body(json!({"users": []}));
    });

    client_for(&server)
        .users()
        .list_users(&UserQuery::new())
        .await
        .unwrap();

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("validic response"), "missing request log: {output}");
    assert!(!output.contains(TOKEN));
}

#[tokio::test]
async fn stalled_response_body_times_out() {
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 2048];
        socket.read(&mut buf).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"me\":")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let validic = Validic::new(ValidicConfig {
        base_url: format!("http://{addr}"),
        request_timeout: Duration::from_millis(500),
        allow_insecure_http: true,
        ..ValidicConfig::default()
    })
    .unwrap();

    let started = Instant::now();
    let err = validic.users().me("t").await.unwrap_err();
    assert!(matches!(
        err,
        ValidicError::Http(validic_sdk::HttpError::Timeout(_))
    ));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn path_traversal_ids_never_reach_other_resources() {
    let server = MockServer::start();
    let other_org = server.mock(|when, then| {
        when.method(DELETE)
            .path("/v1/organizations/other-org/users/43.json");
        then.status(200).json_body(json!({"deleted": "other-org/43"}));
    });
    let truncated = server.mock(|when, then| {
        when.method(DELETE)
            .path(format!("/v1/organizations/{ORG}/users/42"));
        then.status(200).json_body(json!({"deleted": "42"}));
    });

    let users = client_for(&server).users();
    let escaped = users
        .delete_user("../../other-org/users/43", &UserOptions::new())
        .await;
    let with_query = users.delete_user("42?x=1", &UserOptions::new()).await;
    let refused = users.delete_user("..", &UserOptions::new()).await;

    assert_eq!(
        escaped.unwrap_err().status(),
        Some(validic_sdk::StatusCode::NOT_FOUND)
    );
    assert_eq!(
        with_query.unwrap_err().status(),
        Some(validic_sdk::StatusCode::NOT_FOUND)
    );
    assert!(matches!(refused, Err(ValidicError::InvalidUrl { .. })));
    other_org.assert_calls(0);
    truncated.assert_calls(0);
}
