mod common;

use std::sync::Arc;
use std::time::Duration;

use catclient_lib::core::auth::{AuthSession, SessionState, CLIENT_IDENTIFIER};
use catclient_lib::core::config::ConfigStore;
use catclient_lib::core::error::AuthError;
use catclient_lib::core::http::{build_http_client, HttpTimeouts};
use common::StubServer;

const SIGNED_IN: &str = r#"{
    "accessToken": "access-123",
    "clientToken": "ignored",
    "selectedProfile": {"id": "4566e69fc90748ee8d71d7ba5aa00d20", "name": "Notch"}
}"#;

fn session(stub: &StubServer, dir: &tempfile::TempDir) -> (AuthSession, Arc<ConfigStore>) {
    let config = Arc::new(ConfigStore::new(dir.path().join("catclient_config.json")));
    let client = build_http_client(HttpTimeouts::default()).unwrap();
    let session = AuthSession::new(client, stub.url("/authenticate"), config.clone());
    (session, config)
}

#[tokio::test]
async fn successful_exchange_exposes_identity_and_sends_durable_token() {
    let stub = StubServer::start().await;
    stub.route("/authenticate", 200, SIGNED_IN);
    let dir = tempfile::tempdir().unwrap();
    let (session, config) = session(&stub, &dir);

    let identity = session.authenticate("notch@example.com", "hunter2").await.unwrap();
    assert_eq!(identity.access_token, "access-123");
    assert_eq!(identity.profile_id, "4566e69fc90748ee8d71d7ba5aa00d20");
    assert_eq!(identity.profile_name, "Notch");
    assert!(identity.signed_in);
    assert_eq!(session.current_identity().await, Some(identity.clone()));
    assert!(matches!(session.state().await, SessionState::SignedIn(_)));

    let settings = config.load().await.unwrap();
    let request = &stub.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.headers["user-agent"], CLIENT_IDENTIFIER);
    let body = request.json();
    assert_eq!(body["username"], "notch@example.com");
    assert_eq!(body["password"], "hunter2");
    assert_eq!(body["clientToken"], settings.client_token());
    assert_eq!(body["requestUser"], true);

    // The server's echoed clientToken never replaces the durable one.
    session.authenticate("notch@example.com", "hunter2").await.unwrap();
    let second = stub.requests()[1].json();
    assert_eq!(second["clientToken"], settings.client_token());
    assert_eq!(config.load().await.unwrap().client_token(), settings.client_token());
}

#[tokio::test]
async fn rejection_carries_status_and_body() {
    let stub = StubServer::start().await;
    stub.route(
        "/authenticate",
        403,
        r#"{"error":"ForbiddenOperationException","errorMessage":"Invalid credentials."}"#,
    );
    let dir = tempfile::tempdir().unwrap();
    let (session, _) = session(&stub, &dir);

    let err = session.authenticate("notch", "wrong").await.unwrap_err();
    match err {
        AuthError::Rejected { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("Invalid credentials."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.current_identity().await.is_none());
    match session.state().await {
        SessionState::SignedOut { last_error } => assert!(last_error.is_some()),
        other => panic!("unexpected state: {other:?}"),
    }
}

#[tokio::test]
async fn failed_exchange_clears_previous_identity() {
    let stub = StubServer::start().await;
    stub.route("/authenticate", 200, SIGNED_IN);
    let dir = tempfile::tempdir().unwrap();
    let (session, _) = session(&stub, &dir);
    session.authenticate("notch", "hunter2").await.unwrap();

    stub.route("/authenticate", 200, r#"{"accessToken": "", "selectedProfile": {"id": "x", "name": "y"}}"#);
    let err = session.authenticate("notch", "hunter2").await.unwrap_err();
    assert!(matches!(err, AuthError::MalformedResponse(_)));
    assert!(session.current_identity().await.is_none());
}

#[tokio::test]
async fn missing_profile_is_malformed() {
    let stub = StubServer::start().await;
    stub.route("/authenticate", 200, r#"{"accessToken": "access-123"}"#);
    let dir = tempfile::tempdir().unwrap();
    let (session, _) = session(&stub, &dir);

    let err = session.authenticate("notch", "hunter2").await.unwrap_err();
    assert!(matches!(err, AuthError::MalformedResponse(_)));
}

#[tokio::test]
async fn sign_out_forgets_identity_locally() {
    let stub = StubServer::start().await;
    stub.route("/authenticate", 200, SIGNED_IN);
    let dir = tempfile::tempdir().unwrap();
    let (session, _) = session(&stub, &dir);
    session.authenticate("notch", "hunter2").await.unwrap();

    session.sign_out().await;
    assert!(session.current_identity().await.is_none());
    assert_eq!(stub.hits("/authenticate"), 1);
}

#[tokio::test]
async fn sign_out_during_exchange_discards_the_result() {
    let stub = StubServer::start().await;
    stub.route_delayed("/authenticate", 200, SIGNED_IN, Duration::from_millis(300));
    let dir = tempfile::tempdir().unwrap();
    let (session, _) = session(&stub, &dir);
    let session = Arc::new(session);

    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.authenticate("notch", "hunter2").await })
    };
    while stub.hits("/authenticate") == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(session.state().await, SessionState::Authenticating);
    session.sign_out().await;

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, AuthError::Cancelled));
    assert!(session.current_identity().await.is_none());
    assert_eq!(session.state().await, SessionState::SignedOut { last_error: None });

    // A fresh exchange after the sign-out is unaffected.
    stub.route("/authenticate", 200, SIGNED_IN);
    session.authenticate("notch", "hunter2").await.unwrap();
    assert!(session.current_identity().await.is_some());
}
