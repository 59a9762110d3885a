mod common;

use catclient_lib::core::error::CatalogError;
use catclient_lib::core::http::{build_http_client, HttpTimeouts};
use catclient_lib::core::version::VersionCatalog;
use common::{StubServer, MANIFEST};

fn catalog(stub: &StubServer) -> VersionCatalog {
    let client = build_http_client(HttpTimeouts::default()).unwrap();
    VersionCatalog::new(client, stub.url("/manifest.json"))
}

#[tokio::test]
async fn refresh_indexes_versions_in_manifest_order() {
    let stub = StubServer::start().await;
    stub.route("/manifest.json", 200, MANIFEST);
    let catalog = catalog(&stub);

    assert!(catalog.is_empty().await);
    catalog.refresh().await.unwrap();

    assert_eq!(catalog.list_ids().await, vec!["1.20.1", "23w31a", "1.8.9"]);
    let descriptor = catalog.resolve("1.20.1").await.unwrap();
    assert_eq!(descriptor.metadata_url, "https://example.invalid/1.20.1.json");
    assert_eq!(descriptor.kind.as_deref(), Some("release"));
    assert!(catalog.resolve("9.9.9").await.is_none());
    assert_eq!(catalog.default_selection().await.as_deref(), Some("1.20.1"));

    let request = &stub.requests()[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/manifest.json");
}

#[tokio::test]
async fn failed_refresh_keeps_previous_catalog() {
    let stub = StubServer::start().await;
    stub.route("/manifest.json", 200, MANIFEST);
    let catalog = catalog(&stub);
    catalog.refresh().await.unwrap();

    stub.route("/manifest.json", 500, "boom");
    let err = catalog.refresh().await.unwrap_err();
    assert!(matches!(err, CatalogError::BadResponse { status: 500, .. }));
    assert_eq!(catalog.list_ids().await.len(), 3);

    stub.route("/manifest.json", 200, "{\"versions\": [ {\"id\": ");
    let err = catalog.refresh().await.unwrap_err();
    assert!(matches!(err, CatalogError::DecodeError(_)));
    assert!(catalog.resolve("23w31a").await.is_some());
}

#[tokio::test]
async fn second_refresh_replaces_the_index_wholesale() {
    let stub = StubServer::start().await;
    stub.route("/manifest.json", 200, MANIFEST);
    let catalog = catalog(&stub);
    catalog.refresh().await.unwrap();

    stub.route(
        "/manifest.json",
        200,
        r#"{"versions": [{"id": "1.21", "type": "release", "url": "https://example.invalid/1.21.json"}]}"#,
    );
    catalog.refresh().await.unwrap();

    assert_eq!(catalog.list_ids().await, vec!["1.21"]);
    assert!(catalog.resolve("1.20.1").await.is_none());
    assert_eq!(catalog.default_selection().await.as_deref(), Some("1.21"));
    assert_eq!(stub.hits("/manifest.json"), 2);
}

#[tokio::test]
async fn unreachable_manifest_is_reported() {
    let closed_port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = build_http_client(HttpTimeouts::default()).unwrap();
    let catalog = VersionCatalog::new(client, format!("http://127.0.0.1:{closed_port}/manifest.json"));

    let err = catalog.refresh().await.unwrap_err();
    assert!(matches!(err, CatalogError::Unreachable { .. }));
    assert!(catalog.is_empty().await);
}
