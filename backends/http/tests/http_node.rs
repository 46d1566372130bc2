//! Request shape and response handling of `HttpNode` against a mock node.

use serde_json::json;
use sitepin_backend_http::HttpNode;
use sitepin_core::{
    ApiError, ContentAddress, ContentStore, KeyId, KeyStore, NameRecord, NameService, NodeInfo,
};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn node_for(server: &MockServer) -> HttpNode {
    let url = server.uri().parse().unwrap();
    HttpNode::new(reqwest::Client::new(), &url).unwrap()
}

fn remote_error(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(500).set_body_json(json!({
        "Message": message,
        "Code": 0,
        "Type": "error",
    }))
}

#[tokio::test]
async fn identity_reads_id_and_agent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ID": "12D3KooWnode",
            "AgentVersion": "kubo/0.30.0",
            "Addresses": [],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = node_for(&server).identity().await.unwrap();
    assert_eq!(identity.id, "12D3KooWnode");
    assert_eq!(identity.agent_version.as_deref(), Some("kubo/0.30.0"));
}

#[tokio::test]
async fn unreachable_node_is_a_transport_error() {
    let url = "http://127.0.0.1:1".parse().unwrap();
    let node = HttpNode::new(reqwest::Client::new(), &url).unwrap();
    let err = node.identity().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn forbidden_is_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/id"))
        .respond_with(ResponseTemplate::new(403).set_body_string("client certificate required"))
        .mount(&server)
        .await;

    let err = node_for(&server).identity().await.unwrap_err();
    assert_eq!(
        err,
        ApiError::PermissionDenied("client certificate required".into())
    );
}

#[tokio::test]
async fn key_list_maps_names_and_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/key/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Keys": [
                {"Name": "self", "Id": "k51self"},
                {"Name": "site", "Id": "k51site"},
            ]
        })))
        .mount(&server)
        .await;

    let keys = node_for(&server).list_keys().await.unwrap();
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[1].name, "site");
    assert_eq!(keys[1].id, KeyId::new("k51site"));
}

#[tokio::test]
async fn resolve_strips_the_ipfs_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/name/resolve"))
        .and(query_param("arg", "k51site"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Path": "/ipfs/bafyold"})),
        )
        .mount(&server)
        .await;

    let address = node_for(&server)
        .resolve(&KeyId::new("k51site"))
        .await
        .unwrap();
    assert_eq!(address, ContentAddress::new("bafyold"));
}

#[tokio::test]
async fn resolve_without_record_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/name/resolve"))
        .respond_with(remote_error("could not resolve name"))
        .mount(&server)
        .await;

    let err = node_for(&server)
        .resolve(&KeyId::new("k51site"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn resolve_stopped_at_another_name_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/name/resolve"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Path": "/ipns/k51other"})),
        )
        .mount(&server)
        .await;

    let err = node_for(&server)
        .resolve(&KeyId::new("k51site"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn pin_unpin_and_remove_send_the_address() {
    let server = MockServer::start().await;
    for command in ["pin/add", "pin/rm"] {
        Mock::given(method("POST"))
            .and(path(format!("/api/v0/{command}")))
            .and(query_param("arg", "bafyx"))
            .and(query_param("recursive", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Pins": ["bafyx"]})))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/api/v0/files/rm"))
        .and(query_param("arg", "bafyx"))
        .and(query_param("recursive", "true"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let node = node_for(&server);
    let address = ContentAddress::new("bafyx");
    node.pin(&address).await.unwrap();
    node.unpin(&address).await.unwrap();
    node.remove(&address, true).await.unwrap();
}

#[tokio::test]
async fn pin_failure_carries_the_node_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/pin/add"))
        .respond_with(remote_error("pin: context deadline exceeded"))
        .mount(&server)
        .await;

    let err = node_for(&server)
        .pin(&ContentAddress::new("bafyx"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ApiError::Remote {
            status: 500,
            message: "pin: context deadline exceeded".into()
        }
    );
}

#[tokio::test]
async fn add_directory_uploads_the_tree_and_returns_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("dist");
    std::fs::create_dir_all(site.join("css")).unwrap();
    std::fs::write(site.join("index.html"), "<h1>hello</h1>").unwrap();
    std::fs::write(site.join("css/site.css"), "body {}").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .and(query_param("recursive", "true"))
        .and(query_param("pin", "false"))
        .and(body_string_contains("filename=\"dist%2Fcss%2Fsite.css\""))
        .and(body_string_contains("application/x-directory"))
        .and(body_string_contains("<h1>hello</h1>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
            "{\"Name\":\"dist/css/site.css\",\"Hash\":\"bafycss\",\"Size\":\"15\"}\n",
            "{\"Name\":\"dist/index.html\",\"Hash\":\"bafyindex\",\"Size\":\"22\"}\n",
            "{\"Name\":\"dist/css\",\"Hash\":\"bafycssdir\",\"Size\":\"70\"}\n",
            "{\"Name\":\"dist\",\"Hash\":\"bafyroot\",\"Size\":\"150\"}\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let address = node_for(&server).add_directory(&site).await.unwrap();
    assert_eq!(address, ContentAddress::new("bafyroot"));
}

#[cfg(unix)]
#[tokio::test]
async fn add_directory_sends_symlinks_as_their_target() {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("dist");
    std::fs::create_dir(&site).unwrap();
    std::fs::write(site.join("index.html"), "<h1>hello</h1>").unwrap();
    std::os::unix::fs::symlink("index.html", site.join("latest")).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .and(body_string_contains(
            "filename=\"dist%2Flatest\"\r\nContent-Type: application/symlink\r\n\r\nindex.html",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
            "{\"Name\":\"dist/index.html\",\"Hash\":\"bafyindex\",\"Size\":\"22\"}\n",
            "{\"Name\":\"dist/latest\",\"Hash\":\"bafylink\",\"Size\":\"18\"}\n",
            "{\"Name\":\"dist\",\"Hash\":\"bafyroot\",\"Size\":\"120\"}\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let address = node_for(&server).add_directory(&site).await.unwrap();
    assert_eq!(address, ContentAddress::new("bafyroot"));
}

#[tokio::test]
async fn add_cut_short_before_the_root_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("dist");
    std::fs::create_dir(&site).unwrap();
    std::fs::write(site.join("index.html"), "<h1>hello</h1>").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "{\"Name\":\"dist/index.html\",\"Hash\":\"bafyindex\",\"Size\":\"22\"}\n",
        ))
        .mount(&server)
        .await;

    let err = node_for(&server).add_directory(&site).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn add_missing_directory_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = node_for(&server)
        .add_directory(&dir.path().join("dist"))
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn publish_sends_validity_ttl_and_resolve_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v0/name/publish"))
        .and(query_param("arg", "/ipfs/bafynew"))
        .and(query_param("key", "k51site"))
        .and(query_param("lifetime", "86400s"))
        .and(query_param("ttl", "86400s"))
        .and(query_param("resolve", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Name": "k51site",
            "Value": "/ipfs/bafynew",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let day = Duration::from_secs(24 * 60 * 60);
    let record = NameRecord {
        key: KeyId::new("k51site"),
        address: ContentAddress::new("bafynew"),
        validity: day,
        ttl: day,
        verify_resolvable: true,
    };
    let published = node_for(&server).publish(&record).await.unwrap();
    assert_eq!(published, record);
}
